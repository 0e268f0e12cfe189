//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_claims::{
    ClaimRecord, EligibilityDecision, EligibilityResult, FraudResult, StageTrace, ValidationResult, WorkflowState,
};

/// Row of the claim list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub claim_id: String,
    pub patient_id: Option<String>,
    pub procedure_code: Option<String>,
    pub claim_amount: Option<Decimal>,
    pub date: Option<String>,
    pub provider: Option<String>,
}

impl From<&ClaimRecord> for ClaimSummary {
    fn from(claim: &ClaimRecord) -> Self {
        Self {
            claim_id: claim.claim_id.to_string(),
            patient_id: claim.patient_id.as_ref().map(|p| p.to_string()),
            procedure_code: claim.procedure_code.clone(),
            claim_amount: claim.claim_amount,
            date: claim.date.clone(),
            provider: claim.provider.clone(),
        }
    }
}

/// Eligibility section of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityReport {
    /// `parsed`, `unparsed`, `not_found`, or `service_unavailable`
    pub outcome: String,
    /// The decision the workflow acted on
    pub decision: EligibilityDecision,
}

impl From<&EligibilityResult> for EligibilityReport {
    fn from(result: &EligibilityResult) -> Self {
        let outcome = match result {
            EligibilityResult::Parsed(_) => "parsed",
            EligibilityResult::Unparsed { .. } => "unparsed",
            EligibilityResult::NotFound { .. } => "not_found",
            EligibilityResult::ServiceUnavailable { .. } => "service_unavailable",
        };
        Self {
            outcome: outcome.to_string(),
            decision: result.decision(),
        }
    }
}

/// Display report of one workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub run_id: Uuid,
    pub claim_id: String,
    /// Status label, or `In Progress` when no stage set one
    pub status: String,
    pub explanation: Option<String>,
    pub validation_result: Option<ValidationResult>,
    pub eligibility_result: Option<EligibilityReport>,
    /// Policy evidence text; empty when evidence was unavailable
    pub policy_response: Option<String>,
    pub fraud_result: Option<FraudResult>,
    pub trace: Vec<StageTrace>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<WorkflowState> for WorkflowReport {
    fn from(state: WorkflowState) -> Self {
        Self {
            run_id: state.run_id,
            claim_id: state.claim_id.to_string(),
            status: state.status_label().to_string(),
            eligibility_result: state.eligibility_result.as_ref().map(EligibilityReport::from),
            policy_response: state.policy_evidence.as_ref().map(|e| e.text().to_string()),
            explanation: state.explanation,
            validation_result: state.validation_result,
            fraud_result: state.fraud_result,
            trace: state.trace,
            started_at: state.started_at,
            completed_at: state.completed_at,
        }
    }
}
