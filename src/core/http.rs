//! HTTP endpoint server using Axum

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, error, info, warn, Level};

use crate::commands::{CommandContext, CommandDispatcher, Reply};
use crate::listeners::{on_message, IncomingMessage};
use crate::metrics::Metrics;

const SERVICE_NAME: &str = "fieldnotes";

/// Shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub dispatcher: Arc<CommandDispatcher>,
    /// Bearer token that lets a caller act as owner or admin. Without one,
    /// every request runs as an ordinary member.
    pub api_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(dispatcher: Arc<CommandDispatcher>, metrics: Arc<Metrics>) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics,
            start_time: Arc::new(Instant::now()),
            dispatcher,
            api_token: None,
        }
    }

    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token.map(Arc::from);
        self
    }

    /// Whether the request carries `Authorization: Bearer <api_token>`.
    fn is_trusted(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.api_token.as_deref() else {
            return false;
        };
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected)
    }

    /// The caller's context, with owner and admin rights dropped unless the
    /// request is authenticated.
    fn caller_context(&self, headers: &HeaderMap, mut context: CommandContext) -> CommandContext {
        if !self.is_trusted(headers) && (context.is_owner || context.is_admin) {
            warn!(
                author_id = context.author_id,
                "Unauthenticated request claimed owner or admin rights"
            );
            context.is_owner = false;
            context.is_admin = false;
        }
        context
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub service: String,
    /// Command prefix the dispatcher answers to.
    pub prefix: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.health.read().await.status.clone();
    Json(HealthResponse {
        status,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        service: SERVICE_NAME.to_string(),
        prefix: state.dispatcher.prefix().to_string(),
    })
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.export().map_err(|e| {
        error!(error = %e, "Metrics export failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Request count, latency and in-flight gauge for every route
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let metrics = &state.metrics;
    metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    metrics.http_requests_in_flight.dec();

    let status = response.status();
    let elapsed = start.elapsed();
    metrics.http_requests_total.inc();
    metrics
        .http_request_duration_seconds
        .observe(elapsed.as_secs_f64());

    let duration_ms = elapsed.as_millis() as u64;
    if status.is_server_error() {
        error!(%method, %path, %status, duration_ms, "HTTP request failed");
    } else if status.is_client_error() {
        debug!(%method, %path, %status, duration_ms, "HTTP request rejected");
    }

    response
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    /// A command line, with or without the prefix.
    pub command: String,
    #[serde(default)]
    pub context: CommandContext,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
    #[serde(default)]
    pub author_is_bot: bool,
    #[serde(default)]
    pub context: CommandContext,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepliesResponse {
    pub replies: Vec<Reply>,
}

/// Run a command line through the dispatcher
async fn run_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CommandRequest>,
) -> Result<Json<RepliesResponse>, StatusCode> {
    let context = state.caller_context(&headers, request.context);
    let dispatcher = &state.dispatcher;
    let line = request.command.trim();
    let line = if dispatcher.split_command(line).is_some() {
        line.to_string()
    } else {
        format!("{}{line}", dispatcher.prefix())
    };

    match dispatcher.dispatch(&context, &line).await {
        Some(replies) => Ok(Json(RepliesResponse { replies })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Run the listeners over an ordinary message
async fn run_listeners(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<MessageRequest>,
) -> Json<RepliesResponse> {
    let context = state.caller_context(&headers, request.context);
    let message = IncomingMessage {
        content: &request.content,
        author_is_bot: request.author_is_bot,
    };
    let replies = on_message(&state.dispatcher, &context, &message).await;
    Json(RepliesResponse { replies })
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/commands", post(run_command))
        .route("/api/messages", post(run_listeners))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(
    port: u16,
    dispatcher: Arc<CommandDispatcher>,
    metrics: Arc<Metrics>,
    api_token: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if api_token.is_none() {
        warn!("API_TOKEN is not set; owner and admin commands are disabled over HTTP");
    }
    let app = create_router(AppState::new(dispatcher, metrics).with_api_token(api_token));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port, "HTTP server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
