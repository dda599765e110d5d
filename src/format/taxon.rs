//! Taxon names, hierarchies and the taxon embed

use super::{format_count, obs_url, truncate, Embed, MAX_EMBED_DESCRIPTION_LEN};
use crate::models::{Taxon, WWW_BASE_URL};
use crate::query::ranks::{rank_level, trinomial_abbr, PRIMARY_RANKS};

const LIST_DELIMITER: &str = ", ";
const HIERARCHY_DELIMITER: &str = " > ";

pub const TAXON_COUNTS_HEADER: &str = "__obs# (spp#) by user:__";
pub const TAXON_PLACES_HEADER: &str = "__obs# (spp#) from place:__";
pub const TAXON_IDBY_HEADER: &str = "__obs# (spp#) identified by user:__";
pub const TAXON_NOTBY_HEADER: &str = "__obs# (spp#) unobserved by user:__";

/// Options for [`format_name`].
#[derive(Debug, Clone, Copy)]
pub struct NameOptions<'a> {
    /// Show the matched term instead of the common name when it is neither.
    pub with_term: bool,
    /// Item of a hierarchy list: primary ranks bolded, no rank prefix.
    pub hierarchy: bool,
    /// Prefix ranks above species, e.g. `Genus`.
    pub with_rank: bool,
    pub with_common: bool,
    /// Prefer a common name in this locale.
    pub lang: Option<&'a str>,
}

impl Default for NameOptions<'_> {
    fn default() -> Self {
        Self {
            with_term: false,
            hierarchy: false,
            with_rank: true,
            with_common: true,
            lang: None,
        }
    }
}

impl NameOptions<'_> {
    pub fn with_term() -> Self {
        Self {
            with_term: true,
            ..Self::default()
        }
    }

    pub fn hierarchy() -> Self {
        Self {
            hierarchy: true,
            ..Self::default()
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Name in the style of iNaturalist taxon pages: `Rank Scientific name
/// (Common name)`.
///
/// - no rank prefix at species level and below
/// - italic scientific name at genus level and below
/// - trinomials get an unitalicized abbreviation before the third word,
///   e.g. `*Anser anser* var. *domesticus*`
pub fn format_name(taxon: &Taxon, options: NameOptions<'_>) -> String {
    let common = if options.with_common {
        let preferred = taxon.common_name(options.lang);
        if options.with_term {
            let term = taxon.term();
            if term != taxon.name && Some(term) != preferred {
                Some(term)
            } else {
                preferred
            }
        } else if options.hierarchy {
            None
        } else {
            preferred
        }
    } else {
        None
    };

    let mut name = taxon.name.clone();
    if let Some(level) = rank_level(&taxon.rank) {
        let genus = rank_level("genus").unwrap_or(20.0);
        let species = rank_level("species").unwrap_or(10.0);
        if level <= genus {
            name = format!("*{name}*");
        }
        if level > species {
            if options.hierarchy {
                if PRIMARY_RANKS.contains(&taxon.rank.as_str()) {
                    name = format!("\n> **{name}**");
                }
            } else if options.with_rank {
                name = format!("{} {name}", capitalize(&taxon.rank));
            }
        } else if let Some(abbr) = trinomial_abbr(&taxon.rank) {
            let words: Vec<&str> = name.split(' ').collect();
            if let [first, second, third] = words.as_slice() {
                // already italicized: close and reopen around the abbreviation
                name = format!("{first} {second}* {abbr} *{third}");
            }
        }
    }

    let mut full_name = match common {
        Some(common) => format!("{name} ({common})"),
        None => name,
    };
    if !taxon.is_active {
        full_name.push_str(" :exclamation: Inactive Taxon");
    }
    full_name
}

fn more(count: usize) -> String {
    format!("and {count} more")
}

/// Keep as many names as fit in `max_len` characters once joined, replacing
/// the rest with `and N more`.
fn fit_names(names: Vec<String>, delimiter: &str, max_len: usize) -> Vec<String> {
    let total = names.len();
    let mut fit: Vec<String> = Vec::new();
    let formatted_len = |fit: &[String], name: &str| -> usize {
        fit.iter()
            .map(|item| item.chars().count() + delimiter.chars().count())
            .sum::<usize>()
            + name.chars().count()
    };

    for name in names {
        if formatted_len(&fit, &name) > max_len {
            let mut unprocessed = total - fit.len();
            while formatted_len(&fit, &more(unprocessed)) > max_len && fit.pop().is_some() {
                unprocessed += 1;
            }
            fit.push(more(unprocessed));
            break;
        }
        fit.push(name);
    }
    fit
}

/// Join formatted taxon names with `, `, or with ` > ` as a hierarchy.
/// `max_len` of 0 means unlimited.
pub fn format_taxon_names(
    taxa: &[Taxon],
    options: NameOptions<'_>,
    max_len: usize,
) -> String {
    let delimiter = if options.hierarchy {
        HIERARCHY_DELIMITER
    } else {
        LIST_DELIMITER
    };
    let names: Vec<String> = taxa.iter().map(|t| format_name(t, options)).collect();
    let names = if max_len > 0 {
        fit_names(names, delimiter, max_len)
    } else {
        names
    };
    names.join(delimiter)
}

/// Observation and species counts for one user or place under a taxon embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountsLine {
    pub label: String,
    pub observations: u64,
    pub species: u64,
    pub url: String,
}

impl CountsLine {
    /// `[obs (spp)](url) label`; species counts are omitted for taxa at or
    /// below species level.
    pub fn format(&self, taxon: Option<&Taxon>) -> String {
        let species_level = rank_level("species").unwrap_or(10.0);
        let at_or_below_species = taxon
            .and_then(|t| rank_level(&t.rank))
            .is_some_and(|level| level <= species_level);
        if at_or_below_species {
            format!("[{}]({}) {}", format_count(self.observations), self.url, self.label)
        } else {
            format!(
                "[{} ({})]({}) {}",
                format_count(self.observations),
                format_count(self.species),
                self.url,
                self.label
            )
        }
    }
}

/// Taxon display: title, link, observation count, ancestry and optional
/// per-user or per-place counts under `counts_header`.
pub fn taxon_embed(
    taxon: &Taxon,
    lang: Option<&str>,
    counts_header: Option<&str>,
    counts: &[CountsLine],
) -> Embed {
    let title = format_name(
        taxon,
        NameOptions {
            with_term: true,
            lang,
            ..NameOptions::default()
        },
    );
    let observations_url = obs_url(&[("taxon_id".to_string(), taxon.id.to_string())]);
    let mut description = format!(
        "is {} {} with [{}]({}) observations",
        article(&taxon.rank),
        taxon.rank,
        format_count(taxon.observations_count),
        observations_url
    );

    if !taxon.ancestors.is_empty() {
        let formatted = format_taxon_names(&taxon.ancestors, NameOptions::hierarchy(), 0);
        let hierarchy = match formatted.find('>') {
            Some(start) => &formatted[start..],
            None => formatted.as_str(),
        };
        description.push_str(" in:\n");
        description.push_str(hierarchy);
    }

    if let (Some(header), false) = (counts_header, counts.is_empty()) {
        description.push('\n');
        description.push_str(header);
        for line in counts {
            description.push('\n');
            description.push_str(&line.format(Some(taxon)));
        }
    }

    Embed::new(title)
        .url(taxon.url())
        .description(truncate(&description, MAX_EMBED_DESCRIPTION_LEN))
        .thumbnail(taxon.thumbnail())
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Closest common ancestor of several taxa.
pub fn related_embed(taxa: &[Taxon], ancestor: &Taxon, missing: &[String]) -> Embed {
    let names = format_taxon_names(taxa, NameOptions::with_term(), MAX_EMBED_DESCRIPTION_LEN / 2);
    let ids: Vec<String> = taxa.iter().map(|t| t.id.to_string()).collect();
    let description = format!(
        "**The taxa:** {names}\n**are related by {}**: {}\n\n\
         [Species observations]({WWW_BASE_URL}/observations?taxon_ids={}&view=species)",
        ancestor.rank,
        format_name(ancestor, NameOptions::default()),
        ids.join(",")
    );
    let embed = Embed::new("Closest related taxon").description(description);
    if missing.is_empty() {
        embed
    } else {
        embed.footer(format!(
            "Some taxa could not be found and were ignored: {}",
            missing.join(",")
        ))
    }
}

/// Plain-text list of names matching a query, for `tname`.
pub fn name_line(taxon: &Taxon) -> String {
    format_name(
        taxon,
        NameOptions {
            with_common: false,
            with_rank: false,
            ..NameOptions::default()
        },
    )
}
