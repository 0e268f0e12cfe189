//! Claim workflow orchestration
//!
//! A strictly sequential chain over one [`WorkflowState`]:
//!
//! ```text
//! 1. Validate           invalid    -> Rejected - Invalid Data
//! 2. Resolve eligibility ineligible -> Denied - Not Eligible
//! 3. Policy evidence    writes evidence text, never status
//! 4. Fraud screen       flagged    -> Flagged for Fraud, else Approved
//! 5. Explain            always runs with whatever the state holds
//! ```
//!
//! # Termination
//!
//! The chain can either run every stage and let fraud screening overwrite an
//! earlier status ([`TerminationMode::LastWriterWins`]), or stop making
//! decisions once validation or eligibility has disqualified the claim
//! ([`TerminationMode::HaltOnDisqualification`], the default). In the halting
//! mode policy evidence for a disqualified claim is only gathered when
//! `evidence_when_disqualified` is set. Explanation runs in both modes.
//!
//! The orchestrator has no error path: every stage failure is folded into the
//! state as a degraded result and a trace entry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};

use core_kernel::CallPolicy;

use crate::eligibility::{EligibilityResolver, EligibilityResult};
use crate::evidence::{PolicyEvidence, PolicyEvidenceResolver, DEFAULT_TOP_K};
use crate::explanation::Explainer;
use crate::fraud::{screen_claim, FraudPolicy, FraudResult};
use crate::ports::{ClaimDataStore, ReasoningPort, RetrievalPort};
use crate::state::{ClaimStatus, StageKind, StageOutcome, WorkflowState};
use crate::validation::{validate_claim, ValidationResult};

/// How the chain behaves after a disqualifying status is set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationMode {
    /// Run every stage; the last stage to write the status wins
    LastWriterWins,
    /// Skip the remaining decision stages once rejected or denied
    #[default]
    HaltOnDisqualification,
}

/// Workflow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub termination: TerminationMode,
    /// Gather policy evidence for rejected/denied claims when halting
    pub evidence_when_disqualified: bool,
    /// Passages retrieved for policy evidence
    pub evidence_top_k: usize,
    pub fraud: FraudPolicy,
    /// Timeout/retry for reasoning service calls
    pub reasoning_call: CallPolicy,
    /// Timeout/retry for retrieval service calls
    pub retrieval_call: CallPolicy,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            termination: TerminationMode::default(),
            evidence_when_disqualified: false,
            evidence_top_k: DEFAULT_TOP_K,
            fraud: FraudPolicy::default(),
            reasoning_call: CallPolicy::default(),
            retrieval_call: CallPolicy::default(),
        }
    }
}

/// The claim decision workflow
///
/// Holds no per-run state; one instance is shared across concurrent runs.
pub struct ClaimWorkflow {
    store: Arc<dyn ClaimDataStore>,
    eligibility: EligibilityResolver,
    evidence: PolicyEvidenceResolver,
    explainer: Explainer,
    config: WorkflowConfig,
}

impl ClaimWorkflow {
    /// Creates a workflow that uses one reasoning service for every stage
    pub fn new(
        store: Arc<dyn ClaimDataStore>,
        reasoning: Arc<dyn ReasoningPort>,
        retrieval: Arc<dyn RetrievalPort>,
        config: WorkflowConfig,
    ) -> Self {
        let eligibility = EligibilityResolver::new(store.clone(), reasoning.clone(), config.reasoning_call);
        let evidence = PolicyEvidenceResolver::new(store.clone(), reasoning.clone(), retrieval)
            .with_top_k(config.evidence_top_k)
            .with_call_policies(config.reasoning_call, config.retrieval_call);
        let explainer = Explainer::new(reasoning, config.reasoning_call);

        Self {
            store,
            eligibility,
            evidence,
            explainer,
            config,
        }
    }

    /// Uses a separate reasoning service for explanations
    pub fn with_explainer_reasoning(mut self, reasoning: Arc<dyn ReasoningPort>) -> Self {
        self.explainer = Explainer::new(reasoning, self.config.reasoning_call);
        self
    }

    pub fn store(&self) -> &Arc<dyn ClaimDataStore> {
        &self.store
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Runs only the validation stage
    pub fn validate(&self, claim_id: &str) -> ValidationResult {
        validate_claim(self.store.as_ref(), claim_id)
    }

    /// Runs only the fraud screen
    pub fn screen(&self, claim_id: &str) -> FraudResult {
        screen_claim(self.store.as_ref(), claim_id, &self.config.fraud)
    }

    /// Runs the full chain for one claim. Always returns a state.
    pub async fn run_workflow(&self, claim_id: &str) -> WorkflowState {
        let state = WorkflowState::new(claim_id);
        let span = info_span!("claim_workflow", claim_id, run_id = %state.run_id);
        self.run_stages(state).instrument(span).await
    }

    async fn run_stages(&self, mut state: WorkflowState) -> WorkflowState {
        let claim_id = state.claim_id.to_string();
        info!(mode = ?self.config.termination, "Workflow started");

        // 1. Validation
        let validation = self.validate(&claim_id);
        if !validation.valid {
            state.status = Some(ClaimStatus::RejectedInvalidData);
        }
        state.record(StageKind::Validation, StageOutcome::Completed, validation.error.clone());
        state.validation_result = Some(validation);

        // 2. Eligibility
        if self.halts(&state) {
            self.skip(&mut state, StageKind::Eligibility);
        } else {
            let result = self.eligibility.resolve(&claim_id).await;
            if !result.is_eligible() {
                state.status = Some(ClaimStatus::DeniedNotEligible);
            }
            let (outcome, message) = match &result {
                EligibilityResult::Parsed(_) => (StageOutcome::Completed, None),
                EligibilityResult::NotFound { message } => (StageOutcome::Completed, Some(message.clone())),
                EligibilityResult::Unparsed { .. } => {
                    (StageOutcome::Degraded, Some("Reply was not the expected JSON object".to_string()))
                }
                EligibilityResult::ServiceUnavailable { message } => (StageOutcome::Degraded, Some(message.clone())),
            };
            state.record(StageKind::Eligibility, outcome, message);
            state.eligibility_result = Some(result);
        }

        // 3. Policy evidence
        if self.halts(&state) && !self.config.evidence_when_disqualified {
            self.skip(&mut state, StageKind::PolicyEvidence);
        } else {
            let evidence = self
                .evidence
                .resolve(&claim_id, state.eligibility_result.as_ref())
                .await;
            let (outcome, message) = match &evidence {
                PolicyEvidence::Retrieved { .. } => (StageOutcome::Completed, None),
                PolicyEvidence::Unavailable { reason } => (StageOutcome::Degraded, Some(reason.clone())),
            };
            state.record(StageKind::PolicyEvidence, outcome, message);
            state.policy_evidence = Some(evidence);
        }

        // 4. Fraud screen
        if self.halts(&state) {
            self.skip(&mut state, StageKind::FraudScreen);
        } else {
            let fraud = self.screen(&claim_id);
            state.status = Some(if fraud.fraud_flag {
                ClaimStatus::FlaggedForFraud
            } else {
                ClaimStatus::Approved
            });
            state.record(StageKind::FraudScreen, StageOutcome::Completed, fraud.reason.clone());
            state.fraud_result = Some(fraud);
        }

        // 5. Explanation
        match self.explainer.explain(&state).await {
            Ok(text) => {
                state.explanation = Some(text);
                state.record(StageKind::Explanation, StageOutcome::Completed, None);
            }
            Err(error) => {
                warn!(error = %error, "Explanation unavailable");
                state.record(StageKind::Explanation, StageOutcome::Degraded, Some(error.to_string()));
            }
        }

        state.complete();
        info!(status = state.status_label(), "Workflow complete");
        state
    }

    fn halts(&self, state: &WorkflowState) -> bool {
        self.config.termination == TerminationMode::HaltOnDisqualification && state.is_disqualified()
    }

    fn skip(&self, state: &mut WorkflowState, stage: StageKind) {
        let message = format!("Skipped: claim already {}", state.status_label());
        info!(%stage, "Stage skipped after disqualification");
        state.record(stage, StageOutcome::Skipped, Some(message));
    }
}
