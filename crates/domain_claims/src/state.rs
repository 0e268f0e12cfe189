//! Shared workflow state
//!
//! `WorkflowState` is the single record threaded through every stage of one
//! run. Every stage result is an explicit `Option`: `None` means the stage has
//! not written (it was skipped or has not run yet).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::ClaimId;

use crate::eligibility::EligibilityResult;
use crate::evidence::PolicyEvidence;
use crate::fraud::FraudResult;
use crate::validation::ValidationResult;

/// Terminal status of a claim, in the order each can first be set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    #[serde(rename = "Rejected - Invalid Data")]
    RejectedInvalidData,
    #[serde(rename = "Denied - Not Eligible")]
    DeniedNotEligible,
    #[serde(rename = "Flagged for Fraud")]
    FlaggedForFraud,
    #[serde(rename = "Approved")]
    Approved,
}

impl ClaimStatus {
    /// Statuses that end the decision chain when halting on disqualification
    pub fn is_disqualifying(&self) -> bool {
        matches!(self, ClaimStatus::RejectedInvalidData | ClaimStatus::DeniedNotEligible)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClaimStatus::RejectedInvalidData => "Rejected - Invalid Data",
            ClaimStatus::DeniedNotEligible => "Denied - Not Eligible",
            ClaimStatus::FlaggedForFraud => "Flagged for Fraud",
            ClaimStatus::Approved => "Approved",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stages of the chain, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Validation,
    Eligibility,
    PolicyEvidence,
    FraudScreen,
    Explanation,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Validation => "validation",
            StageKind::Eligibility => "eligibility",
            StageKind::PolicyEvidence => "policy_evidence",
            StageKind::FraudScreen => "fraud_screen",
            StageKind::Explanation => "explanation",
        };
        f.write_str(name)
    }
}

/// What happened to a stage during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Ran and produced a normal result
    Completed,
    /// Ran, but an external failure or malformed reply forced a fallback
    Degraded,
    /// Did not run
    Skipped,
}

/// One entry of the per-run stage trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTrace {
    pub stage: StageKind,
    pub outcome: StageOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The mutable record a single workflow run accumulates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Correlates log lines of one run
    pub run_id: Uuid,
    pub claim_id: ClaimId,
    /// Last written terminal status; `None` while in progress
    pub status: Option<ClaimStatus>,
    pub validation_result: Option<ValidationResult>,
    pub eligibility_result: Option<EligibilityResult>,
    pub policy_evidence: Option<PolicyEvidence>,
    pub fraud_result: Option<FraudResult>,
    pub explanation: Option<String>,
    pub trace: Vec<StageTrace>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowState {
    /// Creates a fresh state holding only the claim id
    pub fn new(claim_id: impl Into<ClaimId>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            claim_id: claim_id.into(),
            status: None,
            validation_result: None,
            eligibility_result: None,
            policy_evidence: None,
            fraud_result: None,
            explanation: None,
            trace: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// True once validation or eligibility has disqualified the claim
    pub fn is_disqualified(&self) -> bool {
        self.status.is_some_and(|s| s.is_disqualifying())
    }

    /// Status label for display and prompts
    pub fn status_label(&self) -> &'static str {
        self.status.map_or("In Progress", |s| s.label())
    }

    /// Appends a trace entry
    pub fn record(&mut self, stage: StageKind, outcome: StageOutcome, message: Option<String>) {
        self.trace.push(StageTrace {
            stage,
            outcome,
            message,
        });
    }

    /// Returns the trace entry for a stage, if it was recorded
    pub fn trace_for(&self, stage: StageKind) -> Option<&StageTrace> {
        self.trace.iter().find(|t| t.stage == stage)
    }

    /// Marks the run finished
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }
}
