//! Test utilities for API server integration tests

use axum_test::TestServer;
use fieldnotes::commands::{CommandContext, CommandDispatcher};
use fieldnotes::core::http::{create_router, AppState};
use fieldnotes::metrics::Metrics;
use fieldnotes::services::{EbirdClient, INatClient};
use fieldnotes::settings::MemorySettings;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EBIRD_KEY: &str = "test-key";
pub const API_TOKEN: &str = "test-token";

/// Test helper for API server integration tests
#[allow(dead_code)]
pub struct TestApiServer {
    pub server: TestServer,
    pub metrics: Arc<Metrics>,
    pub settings: Arc<MemorySettings>,
    pub inat: MockServer,
    pub ebird: MockServer,
}

impl TestApiServer {
    pub async fn new() -> Self {
        Self::with_ebird_key(Some(EBIRD_KEY)).await
    }

    pub async fn with_ebird_key(api_key: Option<&str>) -> Self {
        let inat = MockServer::start().await;
        let ebird = MockServer::start().await;
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let settings = Arc::new(MemorySettings::new());

        let dispatcher = CommandDispatcher::new(
            ",",
            Arc::new(INatClient::new(inat.uri()).with_metrics(metrics.clone())),
            Arc::new(EbirdClient::new(ebird.uri(), api_key.map(str::to_string)).with_metrics(metrics.clone())),
            settings.clone(),
        )
        .with_metrics(metrics.clone());

        let state = AppState::new(Arc::new(dispatcher), metrics.clone())
            .with_api_token(Some(API_TOKEN.to_string()));
        let app = create_router(state);
        let server = TestServer::new(app).expect("start test server");

        Self {
            server,
            metrics,
            settings,
            inat,
            ebird,
        }
    }

    /// Serve `body` for GET `route` on the iNat mock.
    pub async fn mock_inat(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.inat)
            .await;
    }

    /// POST a command line as a trusted caller and return the JSON body.
    pub async fn command(&self, command: &str, context: &CommandContext) -> Value {
        self.command_with_token(command, context, Some(API_TOKEN)).await
    }

    /// POST a command line with the given bearer token, or none.
    pub async fn command_with_token(
        &self,
        command: &str,
        context: &CommandContext,
        token: Option<&str>,
    ) -> Value {
        let mut request = self
            .server
            .post("/api/commands")
            .json(&json!({ "command": command, "context": context }));
        if let Some(token) = token {
            request = request.authorization_bearer(token);
        }
        let response = request.await;
        assert_eq!(response.status_code(), 200, "{}", response.text());
        response.json()
    }

    /// POST an ordinary message and return the JSON body.
    pub async fn message(&self, content: &str, context: &CommandContext) -> Value {
        let response = self
            .server
            .post("/api/messages")
            .authorization_bearer(API_TOKEN)
            .json(&json!({ "content": content, "context": context }))
            .await;
        assert_eq!(response.status_code(), 200, "{}", response.text());
        response.json()
    }
}

/// One page of results in the iNat v1 response shape.
pub fn page(results: Vec<Value>) -> Value {
    json!({
        "total_results": results.len(),
        "page": 1,
        "per_page": results.len(),
        "results": results,
    })
}

pub fn taxon(id: u64, name: &str, rank: &str, common: Option<&str>, ancestor_ids: &[u64]) -> Value {
    json!({
        "id": id,
        "name": name,
        "rank": rank,
        "is_active": true,
        "preferred_common_name": common,
        "observations_count": 1234,
        "ancestor_ids": ancestor_ids,
    })
}

/// Northern Cardinal with its ancestry, as `/v1/taxa/9083` returns it.
pub fn cardinal() -> Value {
    let mut record = taxon(
        9083,
        "Cardinalis cardinalis",
        "species",
        Some("Northern Cardinal"),
        &[48460, 1, 3, 7251, 9079, 12704, 9083],
    );
    record["ancestors"] = json!([
        taxon(48460, "Life", "stateofmatter", Some("Life"), &[48460]),
        taxon(1, "Animalia", "kingdom", Some("Animals"), &[48460, 1]),
        taxon(3, "Aves", "class", Some("Birds"), &[48460, 1, 3]),
        taxon(7251, "Passeriformes", "order", Some("Perching Birds"), &[48460, 1, 3, 7251]),
        taxon(9079, "Cardinalidae", "family", Some("Cardinals and Allies"), &[48460, 1, 3, 7251, 9079]),
        taxon(12704, "Cardinalis", "genus", None, &[48460, 1, 3, 7251, 9079, 12704]),
    ]);
    record
}

pub fn manager() -> CommandContext {
    CommandContext {
        guild_id: Some(1),
        channel_id: 10,
        author_id: 100,
        is_admin: true,
        ..CommandContext::default()
    }
}

pub fn member() -> CommandContext {
    CommandContext {
        is_admin: false,
        author_id: 200,
        ..manager()
    }
}

/// Text of the only text reply in a response body.
pub fn only_text(body: &Value) -> String {
    let replies = body["replies"].as_array().expect("replies array");
    assert_eq!(replies.len(), 1, "{body}");
    assert_eq!(replies[0]["type"], "text", "{body}");
    replies[0]["content"].as_str().expect("text content").to_string()
}

/// The only embed reply in a response body.
pub fn only_embed(body: &Value) -> Value {
    let replies = body["replies"].as_array().expect("replies array");
    assert_eq!(replies.len(), 1, "{body}");
    assert_eq!(replies[0]["type"], "embed", "{body}");
    replies[0]["content"].clone()
}
