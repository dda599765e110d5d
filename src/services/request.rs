//! Request plumbing shared by the API clients: retries on transient
//! failures and mapping error responses to [`ApiError`].

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::error::ApiError;
use crate::metrics::Metrics;

/// Total attempts per request: the first try plus five retries at
/// 0.1s, 0.2s, 0.4s, 0.8s and 1.6s.
pub const MAX_ATTEMPTS: usize = 6;

/// Timeouts and connection failures are worth retrying; anything else
/// reqwest reports is not.
pub fn send_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        ApiError::Transient(e.to_string())
    } else {
        ApiError::Http(e)
    }
}

/// Decode a response body as JSON.
///
/// 502, 503 and 504 are transient. Any other failure becomes
/// `LookupFailed("<message> (<status>)")`, where `describe` pulls the
/// message out of the API's error body.
pub async fn read_json(
    service: &'static str,
    url: &str,
    response: Response,
    describe: fn(&Value, StatusCode) -> Option<String>,
) -> Result<Value, ApiError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Transient(format!("invalid JSON: {e}")));
    }
    if matches!(status.as_u16(), 502..=504) {
        return Err(ApiError::Transient(status.to_string()));
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| describe(&body, status))
        .unwrap_or_else(|| {
            format!(
                "{} ({})",
                status.canonical_reason().unwrap_or("Error"),
                status.as_u16()
            )
        });
    error!(service, url = %url, status = %status, "Lookup failed: {}", message);
    Err(ApiError::LookupFailed(message))
}

/// Run `attempt` until it succeeds, fails permanently, or has been tried
/// [`MAX_ATTEMPTS`] times. Exhausted retries become
/// [`ApiError::Unavailable`].
pub async fn with_retries<F, Fut>(
    service: &'static str,
    url: &str,
    metrics: Option<&Metrics>,
    attempt: F,
) -> Result<Value, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>>,
{
    let result = attempt
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(100))
                .with_max_times(MAX_ATTEMPTS - 1),
        )
        .when(ApiError::is_transient)
        .notify(|err, dur| {
            warn!(
                service,
                url = %url,
                error = %err,
                retry_in_ms = dur.as_millis() as u64,
                "Retrying request"
            );
        })
        .await;

    if let Some(metrics) = metrics {
        metrics.record_api_request(&service.to_lowercase(), result.is_ok());
    }

    result.map_err(|e| match e {
        ApiError::Transient(_) => ApiError::Unavailable {
            service,
            attempts: MAX_ATTEMPTS,
        },
        other => other,
    })
}
