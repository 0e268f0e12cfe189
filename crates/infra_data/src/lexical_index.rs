//! In-process policy retrieval
//!
//! Ranks policy passages by cosine similarity of term-frequency vectors.
//! No network and no embeddings: this is the default retrieval backend and the
//! one used in tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::RetrievalPort;

use crate::error::DataError;
use crate::policy_docs::{load_policy_docs, PolicyChunk, TextSplitter};

#[derive(Debug)]
struct IndexedChunk {
    chunk: PolicyChunk,
    terms: HashMap<String, f64>,
    norm: f64,
}

/// Term-frequency index over policy passages
#[derive(Debug, Default)]
pub struct LexicalPolicyIndex {
    chunks: Vec<IndexedChunk>,
}

impl LexicalPolicyIndex {
    pub fn new(chunks: Vec<PolicyChunk>) -> Self {
        let chunks = chunks
            .into_iter()
            .map(|chunk| {
                let terms = term_frequencies(&chunk.text);
                let norm = norm(&terms);
                IndexedChunk { chunk, terms, norm }
            })
            .collect();
        Self { chunks }
    }

    /// Loads and indexes every policy document in `dir` with the default splitter
    ///
    /// # Errors
    ///
    /// Returns `DataError::Io` if the directory cannot be read.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, DataError> {
        Ok(Self::new(load_policy_docs(dir, &TextSplitter::default())?))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns up to `k` passages with a positive score, best first. Ties keep
    /// document order.
    pub fn rank(&self, query: &str, k: usize) -> Vec<&PolicyChunk> {
        let query_terms = term_frequencies(query);
        let query_norm = norm(&query_terms);
        if query_norm == 0.0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &PolicyChunk)> = self
            .chunks
            .iter()
            .filter(|indexed| indexed.norm > 0.0)
            .map(|indexed| {
                let dot: f64 = query_terms
                    .iter()
                    .filter_map(|(term, weight)| indexed.terms.get(term).map(|w| w * weight))
                    .sum();
                (dot / (indexed.norm * query_norm), &indexed.chunk)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(k).map(|(_, chunk)| chunk).collect()
    }
}

fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut terms = HashMap::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
    {
        *terms.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    terms
}

fn norm(terms: &HashMap<String, f64>) -> f64 {
    terms.values().map(|w| w * w).sum::<f64>().sqrt()
}

impl DomainPort for LexicalPolicyIndex {}

#[async_trait]
impl RetrievalPort for LexicalPolicyIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, PortError> {
        let passages: Vec<String> = self.rank(query, k).into_iter().map(|c| c.text.clone()).collect();
        debug!(k, returned = passages.len(), "Lexical policy search");
        Ok(passages)
    }
}

#[async_trait]
impl HealthCheckable for LexicalPolicyIndex {
    async fn health_check(&self) -> HealthCheckResult {
        if self.chunks.is_empty() {
            return HealthCheckResult::new(
                "lexical-policy-index",
                AdapterHealth::Degraded,
                Some("No policy passages indexed".to_string()),
            );
        }
        HealthCheckResult::new(
            "lexical-policy-index",
            AdapterHealth::Healthy,
            Some(format!("{} passages indexed", self.chunks.len())),
        )
    }
}
