//! API configuration
//!
//! Every field has a default so the server starts with only a Gemini key set.
//! Values come from `CLAIMS_*` environment variables, e.g.
//! `CLAIMS_PORT=9090` or `CLAIMS_RETRIEVAL_BACKEND=pinecone`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};
use rust_decimal::Decimal;
use serde::Deserialize;

use core_kernel::{CallPolicy, CoreError};
use domain_claims::{FraudPolicy, TerminationMode, WorkflowConfig};
use infra_external::{GeminiConfig, OpenAiConfig, PineconeConfig};

/// Where policy evidence passages come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalBackend {
    /// In-process lexical index over the policy docs directory
    #[default]
    Lexical,
    /// Pinecone index queried with OpenAI embeddings
    Pinecone,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Directory holding the three CSV tables
    pub data_dir: String,
    /// Directory holding the `*.txt` policy documents
    pub policy_docs_dir: String,

    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Temperature for eligibility and policy evidence prompts
    pub eligibility_temperature: f32,
    /// Temperature for explanation prompts
    pub explanation_temperature: f32,

    /// Per-attempt timeout for external calls
    pub call_timeout_ms: u64,
    pub call_max_retries: u32,
    pub call_retry_delay_ms: u64,

    pub retrieval_backend: RetrievalBackend,
    pub pinecone_api_key: String,
    pub pinecone_index_host: String,
    pub pinecone_namespace: Option<String>,
    /// Embed and upsert the policy docs into Pinecone before serving
    pub pinecone_ingest_on_start: bool,
    pub openai_api_key: String,
    pub embedding_model: String,

    pub evidence_top_k: usize,
    pub fraud_high_amount_threshold: Decimal,
    pub fraud_outlier_factor: Decimal,
    pub termination_mode: TerminationMode,
    pub evidence_when_disqualified: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let gemini = GeminiConfig::default();
        let openai = OpenAiConfig::default();
        let call = CallPolicy::default();
        let workflow = WorkflowConfig::default();

        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            data_dir: "data".to_string(),
            policy_docs_dir: "data/policyDocs".to_string(),
            gemini_api_key: String::new(),
            gemini_model: gemini.model,
            gemini_base_url: gemini.base_url,
            eligibility_temperature: 0.5,
            explanation_temperature: 0.7,
            call_timeout_ms: call.timeout_ms,
            call_max_retries: call.max_retries,
            call_retry_delay_ms: call.retry_delay_ms,
            retrieval_backend: RetrievalBackend::default(),
            pinecone_api_key: String::new(),
            pinecone_index_host: String::new(),
            pinecone_namespace: None,
            pinecone_ingest_on_start: false,
            openai_api_key: String::new(),
            embedding_model: openai.model,
            evidence_top_k: workflow.evidence_top_k,
            fraud_high_amount_threshold: workflow.fraud.high_amount_threshold,
            fraud_outlier_factor: workflow.fraud.outlier_factor,
            termination_mode: workflow.termination,
            evidence_when_disqualified: workflow.evidence_when_disqualified,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `CLAIMS_*` environment variables, falling back
    /// to the provider-standard key variables when a key is not set
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_builder(config::Config::builder())?;
        config.apply_key_fallbacks(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Adds the environment source to `builder` and deserializes
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(Environment::with_prefix("CLAIMS").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Fills blank API keys from `GOOGLE_API_KEY`, `PINECONE_API_KEY`, `OPENAI_API_KEY`
    pub fn apply_key_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |slot: &mut String, name: &str| {
            if slot.trim().is_empty() {
                if let Some(value) = lookup(name) {
                    *slot = value;
                }
            }
        };
        fill(&mut self.gemini_api_key, "GOOGLE_API_KEY");
        fill(&mut self.pinecone_api_key, "PINECONE_API_KEY");
        fill(&mut self.openai_api_key, "OPENAI_API_KEY");
    }

    /// Rejects values the workflow cannot run with
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("eligibility_temperature", self.eligibility_temperature),
            ("explanation_temperature", self.explanation_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(CoreError::validation(format!("{} must be within 0.0-2.0, got {}", name, value)));
            }
        }
        if self.evidence_top_k == 0 {
            return Err(CoreError::validation("evidence_top_k must be at least 1"));
        }
        if self.fraud_high_amount_threshold <= Decimal::ZERO || self.fraud_outlier_factor <= Decimal::ZERO {
            return Err(CoreError::validation("fraud thresholds must be positive"));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn call_policy(&self) -> CallPolicy {
        CallPolicy {
            timeout_ms: self.call_timeout_ms,
            max_retries: self.call_max_retries,
            retry_delay_ms: self.call_retry_delay_ms,
        }
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            termination: self.termination_mode,
            evidence_when_disqualified: self.evidence_when_disqualified,
            evidence_top_k: self.evidence_top_k,
            fraud: FraudPolicy {
                high_amount_threshold: self.fraud_high_amount_threshold,
                outlier_factor: self.fraud_outlier_factor,
            },
            reasoning_call: self.call_policy(),
            retrieval_call: self.call_policy(),
        }
    }

    /// Gemini settings at the given temperature
    pub fn gemini(&self, temperature: f32) -> GeminiConfig {
        GeminiConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
            temperature,
            timeout_secs: self.call_timeout_ms.div_ceil(1000),
        }
    }

    pub fn pinecone(&self) -> PineconeConfig {
        PineconeConfig {
            api_key: self.pinecone_api_key.clone(),
            index_host: self.pinecone_index_host.clone(),
            namespace: self.pinecone_namespace.clone(),
            ..Default::default()
        }
    }

    pub fn openai(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.openai_api_key.clone(),
            model: self.embedding_model.clone(),
            ..Default::default()
        }
    }
}
