//! Integration tests for taxon lookups against a mocked iNaturalist API

use fieldnotes::query::NaturalParser;
use fieldnotes::services::INatClient;
use fieldnotes::taxa::{MatchOptions, TaxonLookup};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sparrow(id: u64, name: &str, common: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "rank": "species",
        "matched_term": common,
        "preferred_common_name": common,
    })
}

async fn lookup() -> (MockServer, TaxonLookup) {
    let server = MockServer::start().await;
    let lookup = TaxonLookup::new(Arc::new(INatClient::new(server.uri())));
    (server, lookup)
}

async fn serve(server: &MockServer, route: &str, page: Option<&str>, body: Value) {
    let mock = Mock::given(method("GET")).and(path(route));
    let mock = match page {
        Some(page) => mock.and(query_param("page", page)),
        None => mock,
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn exact_phrase_is_found_on_a_later_page() {
    let (server, lookup) = lookup().await;
    serve(
        &server,
        "/v1/taxa/autocomplete",
        None,
        json!({
            "total_results": 3,
            "results": [sparrow(9135, "Melospiza lincolnii", "Lincoln's Sparrow")],
        }),
    )
    .await;
    serve(
        &server,
        "/v1/taxa",
        Some("1"),
        json!({
            "total_results": 3,
            "results": [
                sparrow(9100, "Melospiza georgiana", "Swamp Sparrow"),
                sparrow(9100 + 35, "Melospiza melodia", "Song Sparrow"),
            ],
        }),
    )
    .await;

    let query = NaturalParser::new().parse("\"song sparrow\"").unwrap();
    let taxon = lookup
        .maybe_match_taxon_compound(&query, &MatchOptions::default())
        .await
        .unwrap();
    assert_eq!(taxon.name, "Melospiza melodia");
}

#[tokio::test]
async fn unmatched_phrase_reports_records_read() {
    let (server, lookup) = lookup().await;
    serve(
        &server,
        "/v1/taxa/autocomplete",
        None,
        json!({
            "total_results": 250,
            "results": [sparrow(9135, "Melospiza lincolnii", "Lincoln's Sparrow")],
        }),
    )
    .await;
    serve(
        &server,
        "/v1/taxa",
        Some("1"),
        json!({
            "total_results": 250,
            "results": [
                sparrow(9100, "Melospiza georgiana", "Swamp Sparrow"),
                sparrow(9152, "Passerella iliaca", "Fox Sparrow"),
            ],
        }),
    )
    .await;
    serve(
        &server,
        "/v1/taxa",
        Some("2"),
        json!({ "total_results": 250, "results": [] }),
    )
    .await;

    let query = NaturalParser::new().parse("\"song sparrow\"").unwrap();
    let err = lookup
        .maybe_match_taxon_compound(&query, &MatchOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No exact match found in 2 of 250 total records containing those terms."
    );
}

#[tokio::test]
async fn missing_ancestor_suggests_other_keywords() {
    let (server, lookup) = lookup().await;
    serve(&server, "/v1/taxa/9999", None, json!({ "total_results": 0, "results": [] })).await;

    let query = NaturalParser::new().parse("sparrows in 9999").unwrap();
    let err = lookup
        .maybe_match_taxon_compound(&query, &MatchOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No matching taxon found.\n\
         Perhaps instead of `in` (ancestor), you meant\n\
         `from` (place) or `in prj` (project)?\n\n\
         Ancestor taxon not found."
    );
}

#[tokio::test]
async fn child_rank_must_be_below_ancestor() {
    let (server, lookup) = lookup().await;
    serve(
        &server,
        "/v1/taxa/autocomplete",
        None,
        json!({
            "total_results": 1,
            "results": [{
                "id": 7251,
                "name": "Passeriformes",
                "rank": "order",
                "preferred_common_name": "Perching Birds",
            }],
        }),
    )
    .await;

    let query = NaturalParser::new().parse("class birds in passeriformes").unwrap();
    let err = lookup
        .maybe_match_taxon_compound(&query, &MatchOptions::default())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(
        message.starts_with("Child rank: `class` must be below ancestor rank: `order`\n"),
        "{message}"
    );
    assert!(
        message.ends_with("Ancestor taxon: Order Passeriformes (Perching Birds)"),
        "{message}"
    );
}

#[tokio::test]
async fn api_errors_are_reported_with_status() {
    let (server, lookup) = lookup().await;
    Mock::given(method("GET"))
        .and(path("/v1/taxa/1"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "error": "Unprocessable", "status": 422 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = NaturalParser::new().parse("1").unwrap();
    let err = lookup
        .maybe_match_taxon_compound(&query, &MatchOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Lookup failed: Unprocessable (422)");
}

#[tokio::test]
async fn unavailable_api_is_retried_then_reported() {
    let (server, lookup) = lookup().await;
    Mock::given(method("GET"))
        .and(path("/v1/taxa/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&server)
        .await;

    let query = NaturalParser::new().parse("1").unwrap();
    let err = lookup
        .maybe_match_taxon_compound(&query, &MatchOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "iNat not responding after 6 attempts. Please try again later."
    );
}

#[tokio::test]
async fn ancestor_at_rank_uses_ancestor_ids() {
    let (server, lookup) = lookup().await;
    serve(
        &server,
        "/v1/taxa/9083",
        None,
        json!({
            "results": [{
                "id": 9083,
                "name": "Cardinalis cardinalis",
                "rank": "species",
                "ancestor_ids": [48460, 1, 3, 7251, 9079, 12704, 9083],
                "ancestors": [
                    { "id": 1, "name": "Animalia", "rank": "kingdom" },
                    { "id": 3, "name": "Aves", "rank": "class" },
                    { "id": 7251, "name": "Passeriformes", "rank": "order" },
                    { "id": 9079, "name": "Cardinalidae", "rank": "family" },
                    { "id": 12704, "name": "Cardinalis", "rank": "genus" },
                ],
            }],
        }),
    )
    .await;
    serve(
        &server,
        "/v1/taxa/9079",
        None,
        json!({ "results": [{ "id": 9079, "name": "Cardinalidae", "rank": "family" }] }),
    )
    .await;

    let species = lookup
        .client()
        .get_taxon(9083, &Vec::new())
        .await
        .unwrap()
        .unwrap();
    let family = lookup
        .get_taxon_ancestor(&species, "family")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(family.id, 9079);
    assert!(lookup
        .get_taxon_ancestor(&species, "subspecies")
        .await
        .unwrap()
        .is_none());
}
