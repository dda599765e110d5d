//! iNaturalist rank table and rank keyword normalization

/// Rank levels as defined by iNaturalist's taxon model.
///
/// `unranked` has no level in the site database; it is placed just below
/// `stateofmatter` so that parent checks keep working.
pub const RANK_LEVELS: &[(&str, f64)] = &[
    ("stateofmatter", 100.0),
    ("unranked", 90.0),
    ("kingdom", 70.0),
    ("phylum", 60.0),
    ("subphylum", 57.0),
    ("superclass", 53.0),
    ("class", 50.0),
    ("subclass", 47.0),
    ("infraclass", 45.0),
    ("subterclass", 44.0),
    ("superorder", 43.0),
    ("order", 40.0),
    ("suborder", 37.0),
    ("infraorder", 35.0),
    ("parvorder", 34.5),
    ("zoosection", 34.0),
    ("zoosubsection", 33.5),
    ("superfamily", 33.0),
    ("epifamily", 32.0),
    ("family", 30.0),
    ("subfamily", 27.0),
    ("supertribe", 26.0),
    ("tribe", 25.0),
    ("subtribe", 24.0),
    ("genus", 20.0),
    ("genushybrid", 20.0),
    ("subgenus", 15.0),
    ("section", 13.0),
    ("subsection", 12.0),
    ("complex", 11.0),
    ("species", 10.0),
    ("hybrid", 10.0),
    ("subspecies", 5.0),
    ("variety", 5.0),
    ("form", 5.0),
    ("infrahybrid", 5.0),
];

/// Alternate spellings and abbreviations accepted for ranks.
pub const RANK_EQUIVALENTS: &[(&str, &str)] = &[
    ("division", "phylum"),
    ("sub-class", "subclass"),
    ("super-order", "superorder"),
    ("sub-order", "suborder"),
    ("super-family", "superfamily"),
    ("sub-family", "subfamily"),
    ("gen", "genus"),
    ("sp", "species"),
    ("spp", "species"),
    ("infraspecies", "subspecies"),
    ("ssp", "subspecies"),
    ("sub-species", "subspecies"),
    ("subsp", "subspecies"),
    ("trinomial", "subspecies"),
    ("var", "variety"),
];

/// Ranks bolded and broken onto a new line in a hierarchy listing.
pub const PRIMARY_RANKS: &[&str] = &["kingdom", "phylum", "class", "order", "family"];

/// Abbreviation inserted between the 2nd and 3rd word of a trinomial.
pub fn trinomial_abbr(rank: &str) -> Option<&'static str> {
    match rank {
        "variety" => Some("var."),
        "subspecies" => Some("ssp."),
        "form" => Some("f."),
        _ => None,
    }
}

pub fn rank_level(rank: &str) -> Option<f64> {
    RANK_LEVELS
        .iter()
        .find(|(name, _)| *name == rank)
        .map(|(_, level)| *level)
}

/// Canonical rank name for a keyword, or `None` if it isn't a rank keyword.
pub fn normalize_rank(keyword: &str) -> Option<&'static str> {
    let lower = keyword.to_lowercase();
    if let Some((name, _)) = RANK_LEVELS.iter().find(|(name, _)| *name == lower) {
        return Some(name);
    }
    RANK_EQUIVALENTS
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, name)| *name)
}

pub fn is_rank_keyword(word: &str) -> bool {
    normalize_rank(word).is_some()
}
