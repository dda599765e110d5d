//! Query macros: single words that expand to other query clauses

/// Expansion of one macro. Empty fields leave the query untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Macro {
    pub of: Option<&'static str>,
    pub by: Option<&'static str>,
    pub not_by: Option<&'static str>,
    pub from: Option<&'static str>,
    pub opt: &'static [&'static str],
}

const NONE: Macro = Macro {
    of: None,
    by: None,
    not_by: None,
    from: None,
    opt: &[],
};

/// Macro table: `my` → `by me`, `home` → `from home`, etc.
///
/// `spp`/`species` are not macros here: both are rank keywords.
pub const MACROS: &[(&str, Macro)] = &[
    ("my", Macro { by: Some("me"), ..NONE }),
    ("home", Macro { from: Some("home"), ..NONE }),
    (
        "unseen",
        Macro {
            not_by: Some("me"),
            from: Some("home"),
            ..NONE
        },
    ),
    ("rg", Macro { opt: &["quality_grade=research"], ..NONE }),
    ("nid", Macro { opt: &["quality_grade=needs_id"], ..NONE }),
    (
        "oldest",
        Macro {
            opt: &["order_by=observed_on", "order=asc"],
            ..NONE
        },
    ),
    (
        "newest",
        Macro {
            opt: &["order_by=observed_on", "order=desc"],
            ..NONE
        },
    ),
    ("faves", Macro { opt: &["popular", "order_by=votes"], ..NONE }),
    ("herps", Macro { opt: &["taxon_ids=20978,26036"], ..NONE }),
    (
        "lichenish",
        Macro {
            opt: &[
                "taxon_ids=152028,54743,152030,175541,127378,117881,117869,175246",
                "without_taxon_id=372831,1040687,1040689,352459",
            ],
            ..NONE
        },
    ),
    (
        "mothsonly",
        Macro {
            of: Some("lepidoptera"),
            opt: &["without_taxon_id=47224"],
            ..NONE
        },
    ),
    (
        "unknown",
        Macro {
            opt: &["iconic_taxa=unknown", "without_taxon_id=67333,151817,131236"],
            ..NONE
        },
    ),
    (
        "waspsonly",
        Macro {
            of: Some("apocrita"),
            opt: &["without_taxon_id=47336,630955"],
            ..NONE
        },
    ),
    (
        "nonflowering",
        Macro {
            of: Some("plantae"),
            opt: &["without_taxon_id=47125"],
            ..NONE
        },
    ),
    (
        "nonvascular",
        Macro {
            of: Some("plantae"),
            opt: &["without_taxon_id=211194"],
            ..NONE
        },
    ),
    (
        "inverts",
        Macro {
            of: Some("animalia"),
            opt: &["without_taxon_id=355675"],
            ..NONE
        },
    ),
    (
        "roachesonly",
        Macro {
            of: Some("blattodea"),
            opt: &["without_taxon_id=118903"],
            ..NONE
        },
    ),
    (
        "seaslugs",
        Macro {
            opt: &["taxon_ids=130687,775798,775804,49784,500752,47113,775801,775833,775805,495793,47801,801507"],
            ..NONE
        },
    ),
    ("allfish", Macro { opt: &["taxon_ids=47178,47273,797045,85497"], ..NONE }),
];

pub fn lookup(word: &str) -> Option<&'static Macro> {
    let lower = word.to_lowercase();
    MACROS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, expansion)| expansion)
}
