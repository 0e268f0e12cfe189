//! Pinecone Retrieval Adapter
//!
//! Queries a Pinecone index host with an embedded query and returns the
//! passage text stored in each match's metadata. `ingest` fills the index
//! from policy passages.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use core_kernel::{AdapterHealth, CoreError, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::RetrievalPort;

use crate::http::{build_client, normalize_base_url, send_json};
use crate::openai_embeddings::OpenAiEmbeddings;

const SERVICE: &str = "pinecone";
const UPSERT_BATCH: usize = 100;

/// Configuration for the Pinecone adapter
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    /// Data-plane host of the index, e.g. `insurance-policies-abc123.svc.aped-4627-b74a.pinecone.io`
    pub index_host: String,
    pub namespace: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_host: String::new(),
            namespace: None,
            timeout_secs: 30,
        }
    }
}

/// A passage to be stored in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassageRecord {
    pub id: String,
    pub source: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct MatchMetadata {
    text: Option<String>,
}

impl QueryResponse {
    fn into_passages(self) -> Vec<String> {
        self.matches
            .into_iter()
            .filter_map(|m| m.metadata.and_then(|meta| meta.text))
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<Vector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Vector<'a> {
    id: &'a str,
    values: Vec<f32>,
    metadata: VectorMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct VectorMetadata<'a> {
    text: &'a str,
    source: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

/// `RetrievalPort` backed by a Pinecone index
#[derive(Debug)]
pub struct PineconeRetrievalAdapter {
    client: Client,
    config: PineconeConfig,
    host: String,
    embeddings: OpenAiEmbeddings,
}

impl PineconeRetrievalAdapter {
    /// Creates the adapter for an existing index. The index is never created
    /// here; it must have the embedding model's dimension.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` when the API key or index host is blank.
    pub fn new(config: PineconeConfig, embeddings: OpenAiEmbeddings) -> Result<Self, CoreError> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::configuration("Pinecone API key is not set"));
        }
        if config.index_host.trim().is_empty() {
            return Err(CoreError::configuration("Pinecone index host is not set"));
        }
        let client = build_client(Duration::from_secs(config.timeout_secs))?;
        let host = normalize_base_url(&config.index_host);
        Ok(Self {
            client,
            config,
            host,
            embeddings,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Embeds and upserts passages in batches, returning the upserted count
    pub async fn ingest(&self, passages: &[PassageRecord]) -> Result<usize, PortError> {
        let mut upserted = 0;
        for batch in passages.chunks(UPSERT_BATCH) {
            let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
            let vectors = self.embeddings.embed(&texts).await?;

            let body = UpsertRequest {
                vectors: batch
                    .iter()
                    .zip(vectors)
                    .map(|(passage, values)| Vector {
                        id: &passage.id,
                        values,
                        metadata: VectorMetadata {
                            text: &passage.text,
                            source: &passage.source,
                        },
                    })
                    .collect(),
                namespace: self.config.namespace.as_deref(),
            };

            let request = self
                .client
                .post(format!("{}/vectors/upsert", self.host))
                .header("Api-Key", &self.config.api_key)
                .json(&body);
            let response: UpsertResponse = send_json(request, SERVICE, self.timeout()).await?;
            upserted += response.upserted_count;
        }

        info!(passages = passages.len(), upserted, "Policy passages ingested");
        Ok(upserted)
    }
}

impl DomainPort for PineconeRetrievalAdapter {}

#[async_trait]
impl RetrievalPort for PineconeRetrievalAdapter {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, PortError> {
        let vector = self.embeddings.embed_one(query).await?;
        let body = QueryRequest {
            vector,
            top_k: k,
            include_metadata: true,
            namespace: self.config.namespace.as_deref(),
        };

        let request = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.config.api_key)
            .json(&body);
        let response: QueryResponse = send_json(request, SERVICE, self.timeout()).await?;
        let passages = response.into_passages();
        debug!(k, returned = passages.len(), "Pinecone policy search");
        Ok(passages)
    }
}

#[async_trait]
impl HealthCheckable for PineconeRetrievalAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let request = self
            .client
            .post(format!("{}/describe_index_stats", self.host))
            .header("Api-Key", &self.config.api_key)
            .json(&serde_json::json!({}));

        let result: Result<Value, PortError> = send_json(request, SERVICE, self.timeout()).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(stats) => {
                let count = stats.get("totalVectorCount").and_then(Value::as_u64).unwrap_or(0);
                if count == 0 {
                    (AdapterHealth::Degraded, "Index is empty".to_string())
                } else {
                    (AdapterHealth::Healthy, format!("{} vectors indexed", count))
                }
            }
            Err(e) => (AdapterHealth::Unhealthy, e.to_string()),
        };
        HealthCheckResult::new("pinecone-retrieval", status, Some(message)).with_latency(latency_ms)
    }
}
