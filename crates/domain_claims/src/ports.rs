//! Claims Domain Ports
//!
//! The decision stages depend only on these traits. Adapters live in
//! `infra_data` (CSV snapshot, in-process policy index) and `infra_external`
//! (Gemini, Pinecone); tests use the doubles in `test_utils`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_claims::{ClaimWorkflow, WorkflowConfig};
//! use std::sync::Arc;
//!
//! let snapshot = Arc::new(infra_data::load_snapshot("data")?);
//! let reasoning = Arc::new(GeminiReasoningAdapter::new(gemini_config)?);
//! let retrieval = Arc::new(LexicalPolicyIndex::from_dir("data/policyDocs")?);
//!
//! let workflow = ClaimWorkflow::new(snapshot, reasoning, retrieval, WorkflowConfig::default());
//! let state = workflow.run_workflow("C20003").await;
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, PortError};

use crate::records::{ClaimRecord, CoverageRule, PatientRecord};

/// Read-only access to the three source tables
///
/// Implementations are loaded once per process and shared across runs, so
/// every method is a synchronous lookup against memory.
pub trait ClaimDataStore: DomainPort {
    /// Looks up a claim by id
    fn get_claim(&self, claim_id: &str) -> Option<&ClaimRecord>;

    /// Looks up a patient by id
    fn get_patient(&self, patient_id: &str) -> Option<&PatientRecord>;

    /// Looks up the coverage rule for an exact (plan, procedure) key
    fn get_rule(&self, plan_id: &str, procedure_code: &str) -> Option<&CoverageRule>;

    /// Every claim in source order
    fn all_claims(&self) -> &[ClaimRecord];
}

/// An opaque natural-language completion provider
///
/// Replies may be empty or malformed; callers must never assume structure.
#[async_trait]
pub trait ReasoningPort: DomainPort {
    /// Sends one prompt and returns the raw reply text
    async fn complete(&self, prompt: &str) -> Result<String, PortError>;
}

/// An opaque semantic-search provider over policy document passages
#[async_trait]
pub trait RetrievalPort: DomainPort {
    /// Returns up to `k` passage texts, most relevant first
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, PortError>;
}
