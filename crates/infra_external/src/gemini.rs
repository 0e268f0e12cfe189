//! Gemini Reasoning Adapter
//!
//! Sends each prompt as a single user turn to
//! `{base_url}/v1beta/models/{model}:generateContent` and returns the text
//! parts of the first candidate, concatenated.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{AdapterHealth, CoreError, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::ReasoningPort;

use crate::http::{build_client, normalize_base_url, send_json};

const SERVICE: &str = "gemini";

/// Configuration for the Gemini adapter
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Model name, e.g. `gemini-2.0-flash`
    pub model: String,
    pub base_url: String,
    /// Sampling temperature sent with every request
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.5,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, PortError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| PortError::malformed("gemini response contained no candidates"))?;

        Ok(candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default())
    }
}

/// `ReasoningPort` backed by the Gemini REST API
#[derive(Debug)]
pub struct GeminiReasoningAdapter {
    client: Client,
    config: GeminiConfig,
    base_url: String,
}

impl GeminiReasoningAdapter {
    /// Creates the adapter
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` when the API key is blank or the
    /// HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, CoreError> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::configuration("Gemini API key is not set"));
        }
        let client = build_client(Duration::from_secs(config.timeout_secs))?;
        let base_url = normalize_base_url(&config.base_url);
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    pub fn temperature(&self) -> f32 {
        self.config.temperature
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.config.model)
    }

    fn generate_url(&self) -> String {
        format!("{}:generateContent", self.model_url())
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

impl DomainPort for GeminiReasoningAdapter {}

#[async_trait]
impl ReasoningPort for GeminiReasoningAdapter {
    async fn complete(&self, prompt: &str) -> Result<String, PortError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let request = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body);

        let response: GenerateContentResponse = send_json(request, SERVICE, self.timeout()).await?;
        let text = response.into_text()?;
        debug!(model = %self.config.model, reply_len = text.len(), "Gemini reply received");
        Ok(text)
    }
}

#[async_trait]
impl HealthCheckable for GeminiReasoningAdapter {
    /// Fetches the model description to confirm the key and model are usable
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let request = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.config.api_key);

        let result: Result<serde_json::Value, PortError> = send_json(request, SERVICE, self.timeout()).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, format!("Model {} reachable", self.config.model)),
            Err(e) => (AdapterHealth::Unhealthy, e.to_string()),
        };
        HealthCheckResult::new("gemini-reasoning", status, Some(message)).with_latency(latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> GeminiReasoningAdapter {
        GeminiReasoningAdapter::new(GeminiConfig {
            api_key: "key".to_string(),
            base_url: "https://example.test/".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_blank_key_is_configuration_error() {
        let err = GeminiReasoningAdapter::new(GeminiConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_generate_url() {
        assert_eq!(
            adapter().generate_url(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig { temperature: 0.5 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_reply_parts_are_concatenated() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "Hello, world");
    }

    #[test]
    fn test_no_candidates_is_malformed() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(matches!(response.into_text(), Err(PortError::Transformation { .. })));
    }

    #[test]
    fn test_candidate_without_content_is_empty_reply() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(response.into_text().unwrap(), "");
    }
}
