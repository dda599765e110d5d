//! Natural language query parser.
//!
//! Turns `rg sp prunella in animals from home since may 2021` into a
//! [`Query`]. Words before the first keyword form the implicit `of` clause.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use super::dates::{parse_date, DatePreference};
use super::macros;
use super::model::{ControlledTermQuery, DateArg, Query, TaxonQuery};
use super::ranks::normalize_rank;
use super::tokenizer::{phrase_words, tokenize, unquote};
use super::urls::taxon_id_from_url;
use crate::error::QueryError;

const KEYWORDS: &[&str] = &[
    "of",
    "in",
    "by",
    "not-by",
    "id-by",
    "except-by",
    "from",
    "in-prj",
    "with",
    "per",
    "opt",
    "rank",
    "since",
    "until",
    "on",
    "added-since",
    "added-until",
    "added-on",
];

static WHO_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|\s)(id|not|except)\s?by(\s|$)").expect("valid regex"));
static PROJECT_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|\s)in\s?prj(\s|$)").expect("valid regex"));
static ADDED_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|\s)added\s?(on|since|until)(\s|$)").expect("valid regex")
});

/// Join multi-word keywords with hyphens so they tokenize as one word.
fn normalize_keywords(input: &str) -> String {
    let text = WHO_KEYWORDS.replace_all(input, |caps: &Captures| {
        format!("{}{}-by{}", &caps[1], caps[2].to_lowercase(), &caps[3])
    });
    let text = PROJECT_KEYWORD.replace_all(&text, |caps: &Captures| {
        format!("{}in-prj{}", &caps[1], &caps[2])
    });
    ADDED_KEYWORDS
        .replace_all(&text, |caps: &Captures| {
            format!("{}added-{}{}", &caps[1], caps[2].to_lowercase(), &caps[3])
        })
        .into_owned()
}

fn keyword(token: &str) -> Option<&'static str> {
    if token.starts_with('"') {
        return None;
    }
    let lower = token.to_lowercase();
    let bare = lower.strip_prefix("--").unwrap_or(&lower);
    KEYWORDS.iter().find(|kw| **kw == bare).copied()
}

/// Terms, phrases, code and id detected in the words of a taxon clause.
fn detect_taxon(tokens: &[String]) -> TaxonQuery {
    let terms: Vec<String> = tokens
        .iter()
        .flat_map(|token| {
            unquote(token)
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    let phrases: Vec<Vec<String>> = tokens.iter().filter_map(|t| phrase_words(t)).collect();

    let mut query = TaxonQuery {
        terms,
        phrases,
        ..TaxonQuery::default()
    };
    if query.phrases.is_empty() && query.terms.len() == 1 {
        let term = &query.terms[0];
        if !term.is_empty() && term.chars().all(|c| c.is_ascii_digit()) {
            query.taxon_id = term.parse().ok();
        } else if term.chars().count() == 4 {
            query.code = Some(term.to_uppercase());
        } else {
            query.taxon_id = taxon_id_from_url(term);
        }
    }
    query
}

fn joined(tokens: &[String]) -> String {
    tokens.iter().map(|t| unquote(t)).collect::<Vec<_>>().join(" ")
}

/// Expansions collected from macros, applied after explicit clauses unless an
/// explicit keyword of the same kind follows the macro.
#[derive(Default)]
struct PendingMacros {
    of: Option<&'static str>,
    by: Option<&'static str>,
    not_by: Option<&'static str>,
    from: Option<&'static str>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalParser;

impl NaturalParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, input: &str) -> Result<Query, QueryError> {
        let tokens = tokenize(&normalize_keywords(input))?;

        let mut clauses: HashMap<&'static str, Vec<String>> = HashMap::new();
        let mut options: Vec<String> = Vec::new();
        let mut pending = PendingMacros::default();
        let mut current: Option<&'static str> = None;
        let mut of_started = false;
        let mut suppress_macro = false;

        for token in tokens {
            if let Some(kw) = keyword(&token).filter(|kw| !(*kw == "of" && of_started)) {
                match kw {
                    "of" => {
                        of_started = true;
                        pending.of = None;
                    }
                    "by" => pending.by = None,
                    "not-by" => pending.not_by = None,
                    "from" => pending.from = None,
                    _ => {}
                }
                suppress_macro = kw != "of";
                if kw == "opt" {
                    clauses.entry(kw).or_default();
                } else {
                    clauses.insert(kw, Vec::new());
                }
                current = Some(kw);
                continue;
            }

            if !suppress_macro && !token.starts_with('"') {
                if let Some(expansion) = macros::lookup(&token) {
                    options.extend(expansion.opt.iter().map(|o| o.to_string()));
                    pending.of = expansion.of.or(pending.of);
                    pending.by = expansion.by.or(pending.by);
                    pending.not_by = expansion.not_by.or(pending.not_by);
                    pending.from = expansion.from.or(pending.from);
                    continue;
                }
            }

            let clause = match current {
                Some(kw) => kw,
                None => {
                    of_started = true;
                    pending.of = None;
                    current = Some("of");
                    "of"
                }
            };
            if clause == "opt" {
                options.push(token);
            } else {
                clauses.entry(clause).or_default().push(token);
            }
            suppress_macro = false;
        }

        let mut apply = |kw: &'static str, value: Option<&'static str>| {
            if let Some(value) = value {
                clauses.insert(kw, vec![value.to_string()]);
            }
        };
        apply("by", pending.by);
        apply("not-by", pending.not_by);
        apply("from", pending.from);
        apply("of", pending.of);

        build_query(clauses, options)
    }
}

fn build_query(
    mut clauses: HashMap<&'static str, Vec<String>>,
    options: Vec<String>,
) -> Result<Query, QueryError> {
    for (kw, args) in &clauses {
        if args.is_empty() && !(*kw == "opt" && !options.is_empty()) {
            return Err(QueryError::MissingArgument(kw.to_string()));
        }
    }

    let mut ranks: Vec<String> = Vec::new();
    let mut main_words: Vec<String> = Vec::new();
    for word in clauses.remove("of").unwrap_or_default() {
        match normalize_rank(&word).filter(|_| !word.starts_with('"')) {
            Some(rank) => ranks.push(rank.to_string()),
            None => main_words.push(word),
        }
    }
    for word in clauses.remove("rank").unwrap_or_default() {
        let rank = normalize_rank(&word)
            .map(str::to_string)
            .unwrap_or_else(|| unquote(&word).to_lowercase());
        ranks.push(rank);
    }

    let ancestor_words = clauses.remove("in").unwrap_or_default();

    let main = if main_words.is_empty() && ranks.is_empty() {
        None
    } else {
        let mut main = detect_taxon(&main_words);
        if main.taxon_id.is_some() {
            if !ranks.is_empty() {
                return Err(QueryError::IdWithRanks);
            }
            if !ancestor_words.is_empty() {
                return Err(QueryError::IdWithAncestor);
            }
        }
        main.ranks = ranks;
        Some(main)
    };

    let ancestor = if ancestor_words.is_empty() {
        None
    } else {
        if main.is_none() {
            return Err(QueryError::AncestorWithoutMain);
        }
        Some(detect_taxon(&ancestor_words))
    };

    let mut text = |kw: &str| clauses.remove(kw).map(|words| joined(&words));
    let user = text("by");
    let place = text("from");
    let project = text("in-prj");
    let unobserved_by = text("not-by");
    let except_by = text("except-by");
    let id_by = text("id-by");
    let per = text("per");

    let controlled_term = clauses.remove("with").map(|words| {
        let term = unquote(&words[0]);
        let value = joined(&words[1..]);
        ControlledTermQuery { term, value }
    });

    let mut date = |kw: &str, prefer: DatePreference| -> Result<Option<DateArg>, QueryError> {
        clauses
            .remove(kw)
            .map(|words| {
                let words: Vec<String> = words.iter().map(|w| unquote(w)).collect();
                parse_date(&words, prefer)
            })
            .transpose()
    };
    let obs_d1 = date("since", DatePreference::First)?;
    let obs_d2 = date("until", DatePreference::Last)?;
    let obs_on = date("on", DatePreference::First)?;
    let added_d1 = date("added-since", DatePreference::First)?;
    let added_d2 = date("added-until", DatePreference::Last)?;
    let added_on = date("added-on", DatePreference::First)?;

    let query = Query {
        main,
        ancestor,
        user,
        place,
        project,
        controlled_term,
        unobserved_by,
        except_by,
        id_by,
        per,
        options,
        obs_d1,
        obs_d2,
        obs_on,
        added_d1,
        added_d2,
        added_on,
    };
    if query.is_empty() {
        return Err(QueryError::Empty);
    }
    Ok(query)
}
