//! Decision explanation
//!
//! Summarises the accumulated state for a human claims officer through the
//! reasoning service.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use core_kernel::{call_with_retry, CallPolicy, PortError};

use crate::ports::ReasoningPort;
use crate::state::WorkflowState;

/// Produces plain-English explanations of workflow outcomes
pub struct Explainer {
    reasoning: Arc<dyn ReasoningPort>,
    call_policy: CallPolicy,
}

impl Explainer {
    pub fn new(reasoning: Arc<dyn ReasoningPort>, call_policy: CallPolicy) -> Self {
        Self {
            reasoning,
            call_policy,
        }
    }

    /// Explains the state as it currently stands. The reply is returned trimmed.
    ///
    /// # Errors
    ///
    /// Returns the port error once the call policy is exhausted.
    pub async fn explain(&self, state: &WorkflowState) -> Result<String, PortError> {
        let prompt = build_prompt(state);
        let reply = call_with_retry("explanation.complete", &self.call_policy, || {
            self.reasoning.complete(&prompt)
        })
        .await?;

        info!(claim_id = %state.claim_id, chars = reply.len(), "Explanation produced");
        Ok(reply.trim().to_string())
    }
}

fn section<T: serde::Serialize>(value: &Option<T>) -> String {
    match value {
        Some(v) => serde_json::to_string(v).unwrap_or_default(),
        None => Value::Null.to_string(),
    }
}

fn build_prompt(state: &WorkflowState) -> String {
    let policy = state
        .policy_evidence
        .as_ref()
        .map(|evidence| evidence.text())
        .unwrap_or_default();

    format!(
        r#"You are an expert insurance claims explainer.
Summarize the claim decision for a claims officer in plain English.

Claim ID: {claim_id}
Final Status: {status}

Validation Result: {validation}
Eligibility Result: {eligibility}
Policy Reference: {policy}
Fraud Result: {fraud}

Task:
- Explain the decision in a clear, human-friendly way.
- Cite relevant policy document snippets from the Policy Reference section.
- Provide both the decision and supporting justification.
- Keep it professional and concise.
"#,
        claim_id = state.claim_id,
        status = state.status_label(),
        validation = section(&state.validation_result),
        eligibility = section(&state.eligibility_result),
        fraud = section(&state.fraud_result),
    )
}
