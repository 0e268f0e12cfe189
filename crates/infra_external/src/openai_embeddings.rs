//! OpenAI embeddings client
//!
//! Used only by the Pinecone adapter: queries and policy passages are embedded
//! with the same model so they share one vector space.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{CoreError, PortError};

use crate::http::{build_client, normalize_base_url, send_json};

const SERVICE: &str = "openai-embeddings";

/// Configuration for the embeddings client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "text-embedding-ada-002".to_string(),
            base_url: "https://api.openai.com".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Orders vectors by input index and checks one came back per input
    fn into_vectors(mut self, expected: usize) -> Result<Vec<Vec<f32>>, PortError> {
        if self.data.len() != expected {
            return Err(PortError::malformed(format!(
                "{} returned {} embeddings for {} inputs",
                SERVICE,
                self.data.len(),
                expected
            )));
        }
        self.data.sort_by_key(|d| d.index);
        Ok(self.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Client for the `/v1/embeddings` endpoint
#[derive(Debug)]
pub struct OpenAiEmbeddings {
    client: Client,
    config: OpenAiConfig,
    base_url: String,
}

impl OpenAiEmbeddings {
    /// Creates the client
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` when the API key is blank.
    pub fn new(config: OpenAiConfig) -> Result<Self, CoreError> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::configuration("OpenAI API key is not set"));
        }
        let client = build_client(Duration::from_secs(config.timeout_secs))?;
        let base_url = normalize_base_url(&config.base_url);
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Embeds `inputs`, returning one vector per input in input order
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PortError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input: inputs,
            });

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let response: EmbeddingResponse = send_json(request, SERVICE, timeout).await?;
        let vectors = response.into_vectors(inputs.len())?;
        debug!(inputs = inputs.len(), model = %self.config.model, "Embeddings received");
        Ok(vectors)
    }

    /// Embeds a single text
    pub async fn embed_one(&self, input: &str) -> Result<Vec<f32>, PortError> {
        self.embed(&[input.to_string()])
            .await?
            .pop()
            .ok_or_else(|| PortError::malformed(format!("{} returned no embedding", SERVICE)))
    }
}
