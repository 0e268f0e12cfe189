//! Claims Decision Domain
//!
//! This crate routes a claim identifier through a fixed chain of decision stages
//! and accumulates every stage result into one [`WorkflowState`].
//!
//! # Stage Chain
//!
//! ```text
//! Validate -> Eligibility -> Policy Evidence -> Fraud Screen -> Explain
//!    |             |                                |
//!    v             v                                v
//! Rejected      Denied                   Flagged for Fraud / Approved
//! ```
//!
//! Validation and fraud screening are pure functions of the data snapshot.
//! Eligibility, policy evidence, and explanation delegate their judgment to an
//! external reasoning service (and, for evidence, a retrieval service) behind
//! the port traits in [`ports`].

pub mod records;
pub mod ports;
pub mod snapshot;
pub mod error;
pub mod validation;
pub mod eligibility;
pub mod evidence;
pub mod fraud;
pub mod explanation;
pub mod state;
pub mod workflow;

pub use records::{ClaimRecord, PatientRecord, CoverageRule};
pub use ports::{ClaimDataStore, ReasoningPort, RetrievalPort};
pub use snapshot::DataSnapshot;
pub use error::{ValidationFailure, CodeKind};
pub use validation::{ValidationResult, validate_claim};
pub use eligibility::{EligibilityDecision, EligibilityResult, EligibilityResolver, ReplyParse};
pub use evidence::{PolicyEvidence, PolicyEvidenceResolver};
pub use fraud::{FraudPolicy, FraudResult, screen_claim};
pub use explanation::Explainer;
pub use state::{ClaimStatus, WorkflowState, StageKind, StageOutcome, StageTrace};
pub use workflow::{ClaimWorkflow, TerminationMode, WorkflowConfig};
