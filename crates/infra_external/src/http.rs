//! Shared HTTP plumbing for the REST adapters

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use core_kernel::{CoreError, PortError};

const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Builds a client with a per-request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client, CoreError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CoreError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Prefixes a bare host with `https://` and strips any trailing slash
pub(crate) fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Sends `request` and decodes a JSON body of type `R`
pub(crate) async fn send_json<R: DeserializeOwned>(
    request: RequestBuilder,
    service: &str,
    timeout: Duration,
) -> Result<R, PortError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(service, timeout, e))?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        warn!(service, status = status.as_u16(), "External service returned an error status");
        return Err(status_error(service, status, retry_after, &body));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(service, timeout, e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| PortError::malformed(format!("{} response: {}", service, e)))
}

/// Maps a non-success status to a port error
pub(crate) fn status_error(
    service: &str,
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> PortError {
    let detail = body.chars().take(200).collect::<String>();
    match status.as_u16() {
        404 => PortError::not_found(service, detail),
        401 | 403 => PortError::Unauthorized {
            message: format!("{} rejected the credentials ({})", service, status),
        },
        429 => PortError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        500..=599 => PortError::unavailable(format!("{} ({})", service, status)),
        _ => PortError::internal(format!("{} returned {}: {}", service, status, detail)),
    }
}

/// Maps a transport failure to a port error
pub(crate) fn transport_error(service: &str, timeout: Duration, error: reqwest::Error) -> PortError {
    if error.is_timeout() {
        PortError::Timeout {
            operation: service.to_string(),
            duration_ms: timeout.as_millis() as u64,
        }
    } else if error.is_connect() {
        PortError::Connection {
            message: format!("Failed to reach {}", service),
            source: Some(Box::new(error)),
        }
    } else if error.is_decode() {
        PortError::malformed(format!("{} response: {}", service, error))
    } else {
        PortError::Internal {
            message: format!("{} request failed", service),
            source: Some(Box::new(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(status_error("svc", StatusCode::NOT_FOUND, None, "").is_not_found());
        assert!(matches!(
            status_error("svc", StatusCode::FORBIDDEN, None, ""),
            PortError::Unauthorized { .. }
        ));
        assert!(matches!(
            status_error("svc", StatusCode::TOO_MANY_REQUESTS, Some(30), ""),
            PortError::RateLimited { retry_after_secs: 30 }
        ));
        assert!(matches!(
            status_error("svc", StatusCode::BAD_GATEWAY, None, ""),
            PortError::ServiceUnavailable { .. }
        ));
        assert!(matches!(
            status_error("svc", StatusCode::BAD_REQUEST, None, "bad"),
            PortError::Internal { .. }
        ));
    }

    #[test]
    fn test_only_server_and_throttle_errors_are_transient() {
        assert!(status_error("svc", StatusCode::SERVICE_UNAVAILABLE, None, "").is_transient());
        assert!(status_error("svc", StatusCode::TOO_MANY_REQUESTS, None, "").is_transient());
        assert!(!status_error("svc", StatusCode::UNAUTHORIZED, None, "").is_transient());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("idx-123.svc.pinecone.io/"), "https://idx-123.svc.pinecone.io");
        assert_eq!(normalize_base_url("http://127.0.0.1:9000"), "http://127.0.0.1:9000");
    }
}
