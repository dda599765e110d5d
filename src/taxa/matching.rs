//! Scoring of taxon search results against a query

use regex::Regex;

use crate::models::Taxon;
use crate::query::TaxonQuery;

/// Which name fields of a record matched a pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NameMatch {
    term: bool,
    name: bool,
    common: bool,
}

impl NameMatch {
    fn any(&self) -> bool {
        self.term || self.name || self.common
    }

    fn or(self, other: NameMatch) -> NameMatch {
        NameMatch {
            term: self.term || other.term,
            name: self.name || other.name,
            common: self.common || other.common,
        }
    }
}

/// Restricts which names of a record are considered.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchScope<'a> {
    /// Only the scientific name.
    pub scientific_name: bool,
    /// Only valid names in this locale (prefix match, e.g. `fr` or `fr-CA`).
    pub locale: Option<&'a str>,
}

fn match_pat(record: &Taxon, pat: &Regex, scope: MatchScope<'_>) -> NameMatch {
    if scope.scientific_name {
        return NameMatch {
            name: pat.is_match(&record.name),
            ..NameMatch::default()
        };
    }
    if let Some(locale) = scope.locale {
        let locale = locale.to_lowercase();
        let mut names: Vec<_> = record
            .names
            .iter()
            .filter(|n| n.is_valid && n.locale.to_lowercase().starts_with(&locale))
            .collect();
        names.sort_by_key(|n| n.position);
        let found = names.iter().any(|n| pat.is_match(&n.name));
        return NameMatch {
            term: found,
            common: found,
            ..NameMatch::default()
        };
    }
    NameMatch {
        term: pat.is_match(record.term()),
        name: pat.is_match(&record.name),
        common: record
            .preferred_common_name
            .as_deref()
            .is_some_and(|common| pat.is_match(common)),
    }
}

/// Every pattern has to match some field; the result ORs the fields matched.
fn match_pat_list(record: &Taxon, pats: &[Regex], scope: MatchScope<'_>) -> NameMatch {
    let mut matched = NameMatch::default();
    for pat in pats {
        let this_match = match_pat(record, pat, scope);
        if !this_match.any() {
            return NameMatch::default();
        }
        matched = matched.or(this_match);
    }
    matched
}

fn score_match(
    query: &TaxonQuery,
    record: &Taxon,
    all_terms: &Regex,
    pats: &[Regex],
    scope: MatchScope<'_>,
) -> i32 {
    if query.taxon_id.is_some() {
        return 1000;
    }

    let matched = if pats.is_empty() {
        NameMatch::default()
    } else {
        match_pat_list(record, pats, scope)
    };

    if scope.scientific_name {
        return if matched.name { 200 } else { -1 };
    }
    if scope.locale.is_some() {
        return if matched.term { 200 } else { -1 };
    }

    let all_matched = match_pat(record, all_terms, scope);
    if query.code.is_some() && query.code.as_deref() == record.matched_term.as_deref() {
        300
    } else if matched.name || matched.common {
        210
    } else if matched.term {
        200
    } else if all_matched.name || all_matched.common {
        120
    } else if all_matched.term {
        110
    } else {
        100
    }
}

fn word_pattern(words: &str, trailing_boundary: bool) -> Option<Regex> {
    let boundary = if trailing_boundary { r"\b" } else { "" };
    Regex::new(&format!(r"(?i)\b{}{}", regex::escape(words), boundary)).ok()
}

/// Pick the best of `records` for `query`.
///
/// A score of 200 or more is an exact match on a phrase, the code or the
/// whole query; lower scores are fuzzy matches the API returned for the
/// terms. When the query has phrases only exact matches are accepted.
pub fn match_taxon<'a>(
    query: &TaxonQuery,
    records: &'a [Taxon],
    scope: MatchScope<'_>,
) -> Option<&'a Taxon> {
    if records.is_empty() {
        return None;
    }
    if !query.ranks.is_empty() && query.terms.is_empty() {
        return records.first();
    }

    let all_terms = Regex::new(&format!(r"(?i)^{}$", regex::escape(&query.terms.join(" ")))).ok()?;
    let pats: Vec<Regex> = if !query.phrases.is_empty() {
        query
            .phrases
            .iter()
            .filter_map(|phrase| word_pattern(&phrase.join(" "), true))
            .collect()
    } else if scope.scientific_name || scope.locale.is_some() {
        query
            .terms
            .iter()
            .filter_map(|term| word_pattern(term, false))
            .collect()
    } else {
        Vec::new()
    };

    let mut best: Option<(i32, &Taxon)> = None;
    for record in records {
        let score = score_match(query, record, &all_terms, &pats, scope);
        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, record));
        }
    }

    let (best_score, best_record) = best?;
    let min_score_met = best_score >= 0 && (query.phrases.is_empty() || best_score >= 200);
    min_score_met.then_some(best_record)
}
