//! Unit tests for taxon match scoring

use fieldnotes::models::{Taxon, TaxonName};
use fieldnotes::query::TaxonQuery;
use fieldnotes::taxa::{match_taxon, MatchScope};

fn taxon(id: u64, name: &str, common: Option<&str>, term: &str) -> Taxon {
    Taxon {
        id,
        name: name.to_string(),
        rank: "species".to_string(),
        preferred_common_name: common.map(str::to_string),
        matched_term: Some(term.to_string()),
        ..Taxon::default()
    }
}

#[test]
fn test_code_match_wins() {
    let records = vec![
        taxon(1, "Zonotrichia leucophrys", Some("White-crowned Sparrow"), "White-crowned Sparrow"),
        taxon(2, "Zonotrichia albicollis", Some("White-throated Sparrow"), "WTSP"),
    ];
    let query = TaxonQuery {
        code: Some("WTSP".to_string()),
        ..TaxonQuery::from_terms(["wtsp"])
    };
    let found = match_taxon(&query, &records, MatchScope::default()).unwrap();
    assert_eq!(found.id, 2);
}

#[test]
fn test_phrase_requires_exact_match() {
    let records = vec![taxon(
        1,
        "Melospiza lincolnii",
        Some("Lincoln's Sparrow"),
        "Lincoln's Sparrow",
    )];
    let query = TaxonQuery {
        phrases: vec![vec!["song".to_string(), "sparrow".to_string()]],
        ..TaxonQuery::from_terms(["song", "sparrow"])
    };
    assert!(match_taxon(&query, &records, MatchScope::default()).is_none());

    let records = vec![
        taxon(1, "Melospiza lincolnii", Some("Lincoln's Sparrow"), "Lincoln's Sparrow"),
        taxon(2, "Melospiza melodia", Some("Song Sparrow"), "Song Sparrow"),
    ];
    let found = match_taxon(&query, &records, MatchScope::default()).unwrap();
    assert_eq!(found.id, 2);
}

#[test]
fn test_rank_only_query_takes_first_record() {
    let records = vec![
        taxon(10, "Aves", None, "Aves"),
        taxon(11, "Mammalia", None, "Mammalia"),
    ];
    let query = TaxonQuery::default().with_ranks(["class"]);
    let found = match_taxon(&query, &records, MatchScope::default()).unwrap();
    assert_eq!(found.id, 10);
}

#[test]
fn test_scientific_name_scope_ignores_common_names() {
    let records = vec![
        taxon(1, "Turdus migratorius", Some("American Robin"), "robin"),
        taxon(2, "Petroica boodang", Some("Scarlet Robin"), "Petroica"),
    ];
    let query = TaxonQuery::from_terms(["petroica"]);
    let scope = MatchScope {
        scientific_name: true,
        locale: None,
    };
    let found = match_taxon(&query, &records, scope).unwrap();
    assert_eq!(found.id, 2);

    let query = TaxonQuery::from_terms(["robin"]);
    assert!(match_taxon(&query, &records, scope).is_none());
}

#[test]
fn test_locale_scope_matches_localized_names() {
    let mut robin = taxon(1, "Erithacus rubecula", Some("European Robin"), "European Robin");
    robin.names = vec![TaxonName {
        name: "Rougegorge familier".to_string(),
        locale: "fr".to_string(),
        is_valid: true,
        ..TaxonName::default()
    }];
    let records = vec![
        taxon(2, "Turdus migratorius", Some("American Robin"), "Merle d'Amérique"),
        robin,
    ];
    let query = TaxonQuery::from_terms(["rougegorge"]);
    let scope = MatchScope {
        scientific_name: false,
        locale: Some("fr"),
    };
    let found = match_taxon(&query, &records, scope).unwrap();
    assert_eq!(found.id, 1);
}

#[test]
fn test_no_records() {
    let query = TaxonQuery::from_terms(["anything"]);
    assert!(match_taxon(&query, &[], MatchScope::default()).is_none());
}
