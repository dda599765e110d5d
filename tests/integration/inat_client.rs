//! Integration tests for the iNaturalist client's caches and request paths

use fieldnotes::services::INatClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_place(server: &MockServer, expected_requests: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/places/6853"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_results": 1,
            "results": [{"id": 6853, "name": "Nova Scotia", "display_name": "Nova Scotia, CA"}],
        })))
        .expect(expected_requests)
        .mount(server)
        .await;
}

#[tokio::test]
async fn places_are_cached_by_id() {
    let server = MockServer::start().await;
    serve_place(&server, 1).await;
    let client = INatClient::new(server.uri());

    for _ in 0..3 {
        let place = client.get_place("6853").await.unwrap().unwrap();
        assert_eq!(place.display_name, "Nova Scotia, CA");
    }
    server.verify().await;
}

#[tokio::test]
async fn cached_places_expire() {
    let server = MockServer::start().await;
    serve_place(&server, 2).await;
    let client = INatClient::new(server.uri()).with_cache_ttl(Duration::from_millis(50));

    client.get_place("6853").await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    client.get_place("6853").await.unwrap().unwrap();
    server.verify().await;
}

#[tokio::test]
async fn users_are_cached_by_login_and_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users/benarmstrong"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_results": 1,
            "results": [{"id": 545640, "login": "benarmstrong", "name": "Ben Armstrong"}],
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = INatClient::new(server.uri());

    client.get_user("benarmstrong").await.unwrap().unwrap();
    let by_login = client.get_user("BenArmstrong").await.unwrap().unwrap();
    let by_id = client.get_user("545640").await.unwrap().unwrap();
    assert_eq!(by_login.id, 545640);
    assert_eq!(by_id.login, "benarmstrong");
    server.verify().await;
}

#[tokio::test]
async fn user_text_never_changes_the_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_results": 1,
            "results": [{"id": 1, "login": "someone"}],
        })))
        .expect(0)
        .mount(&server)
        .await;
    let client = INatClient::new(server.uri());

    for key in ["foo?x=1", "../taxa", "a/b", "x#y", "me and you"] {
        assert!(client.get_user(key).await.unwrap().is_none(), "{key}");
        assert!(client.get_place(key).await.unwrap().is_none(), "{key}");
        assert!(client.get_project(key).await.unwrap().is_none(), "{key}");
    }
    server.verify().await;
}
