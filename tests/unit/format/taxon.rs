//! Unit tests for taxon and report formatting

use fieldnotes::format::ebird::{hybrids_report, DEFAULT_DATETIME_FORMAT};
use fieldnotes::format::taxon::{name_line, related_embed, taxon_embed, CountsLine};
use fieldnotes::format::{format_taxon_names, paginate_lines, NameOptions};
use fieldnotes::models::{EbirdObservation, Taxon};

fn taxon(id: u64, name: &str, rank: &str, common: Option<&str>) -> Taxon {
    Taxon {
        id,
        name: name.to_string(),
        rank: rank.to_string(),
        preferred_common_name: common.map(str::to_string),
        ..Taxon::default()
    }
}

fn cardinal() -> Taxon {
    Taxon {
        observations_count: 1234,
        ancestors: vec![
            taxon(48460, "Life", "stateofmatter", None),
            taxon(1, "Animalia", "kingdom", Some("Animals")),
            taxon(3, "Aves", "class", Some("Birds")),
            taxon(12704, "Cardinalis", "genus", None),
        ],
        ..taxon(9083, "Cardinalis cardinalis", "species", Some("Northern Cardinal"))
    }
}

#[test]
fn test_taxon_embed_title_and_link() {
    let embed = taxon_embed(&cardinal(), None, None, &[]);
    assert_eq!(
        embed.title.as_deref(),
        Some("*Cardinalis cardinalis* (Northern Cardinal)")
    );
    assert_eq!(
        embed.url.as_deref(),
        Some("https://www.inaturalist.org/taxa/9083")
    );
}

#[test]
fn test_taxon_embed_description_has_count_and_hierarchy() {
    let embed = taxon_embed(&cardinal(), None, None, &[]);
    let description = embed.description.unwrap();
    assert!(description.starts_with(
        "is a species with [1,234](https://www.inaturalist.org/observations?taxon_id=9083) observations in:\n"
    ));
    assert!(description.contains("**Animalia**"), "{description}");
    assert!(description.contains("**Aves**"), "{description}");
    assert!(description.contains("*Cardinalis*"), "{description}");
    assert!(!description.contains("Life"), "{description}");
}

#[test]
fn test_taxon_embed_counts_section() {
    let lines = vec![CountsLine {
        label: "ben".to_string(),
        observations: 12,
        species: 1,
        url: "https://www.inaturalist.org/observations?taxon_id=9083&user_id=5".to_string(),
    }];
    let embed = taxon_embed(&cardinal(), None, Some("__obs# (spp#) by user:__"), &lines);
    let description = embed.description.unwrap();
    assert!(description.ends_with(
        "__obs# (spp#) by user:__\n[12](https://www.inaturalist.org/observations?taxon_id=9083&user_id=5) ben"
    ));
}

#[test]
fn test_counts_line_includes_species_above_species_level() {
    let line = CountsLine {
        label: "Nova Scotia".to_string(),
        observations: 2500,
        species: 12,
        url: "https://example.org".to_string(),
    };
    let genus = taxon(12704, "Cardinalis", "genus", None);
    assert_eq!(
        line.format(Some(&genus)),
        "[2,500 (12)](https://example.org) Nova Scotia"
    );
    assert_eq!(
        line.format(Some(&cardinal())),
        "[2,500](https://example.org) Nova Scotia"
    );
}

#[test]
fn test_hierarchy_names() {
    let taxa = vec![
        taxon(1, "Animalia", "kingdom", Some("Animals")),
        taxon(2, "Passeridae", "family", None),
        taxon(3, "Passer", "genus", None),
    ];
    assert_eq!(
        format_taxon_names(&taxa, NameOptions::hierarchy(), 0),
        "\n> **Animalia** > \n> **Passeridae** > *Passer*"
    );
}

#[test]
fn test_related_embed_lists_ancestor_and_missing() {
    let taxa = vec![
        taxon(9083, "Cardinalis cardinalis", "species", Some("Northern Cardinal")),
        taxon(13858, "Passer domesticus", "species", Some("House Sparrow")),
    ];
    let ancestor = taxon(7251, "Passeriformes", "order", Some("Perching Birds"));
    let embed = related_embed(&taxa, &ancestor, &["xyzzy".to_string()]);
    let description = embed.description.unwrap();
    assert!(description.contains("**are related by order**: Order Passeriformes (Perching Birds)"));
    assert!(description.contains("observations?taxon_ids=9083,13858&view=species"));
    assert_eq!(
        embed.footer.as_deref(),
        Some("Some taxa could not be found and were ignored: xyzzy")
    );
}

#[test]
fn test_name_line_has_no_common_name() {
    let genus = taxon(12704, "Cardinalis", "genus", Some("Cardinals"));
    assert_eq!(name_line(&genus), "*Cardinalis*");
}

#[test]
fn test_hybrids_report_paginates() {
    let records: Vec<EbirdObservation> = (0..60)
        .map(|i| EbirdObservation {
            species_code: format!("x{i:05}"),
            com_name: "Mallard x American Black Duck (hybrid)".to_string(),
            sci_name: "Anas platyrhynchos x rubripes".to_string(),
            loc_name: format!("Pond {i}"),
            obs_dt: "2021-01-05".to_string(),
            how_many: None,
        })
        .collect();
    let lines = hybrids_report(&records, 30, DEFAULT_DATETIME_FORMAT);
    assert_eq!(lines.len(), 60);
    assert!(lines[0].contains("; X observed at 2021-01-05, from Pond 0"));

    let pages = paginate_lines(&lines, 2000);
    assert!(pages.len() > 1);
    assert!(pages.iter().all(|page| page.chars().count() <= 2000));
    assert_eq!(
        pages.iter().map(|page| page.lines().count()).sum::<usize>(),
        60
    );
}
