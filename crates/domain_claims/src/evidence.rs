//! Policy evidence retrieval
//!
//! Retrieves the policy passages closest to the claim and asks the reasoning
//! service to turn them into cited supporting text. The reply is opaque prose:
//! it is stored verbatim and only read by the explainer and the final report.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::{call_with_retry, CallPolicy};

use crate::eligibility::EligibilityResult;
use crate::ports::{ClaimDataStore, ReasoningPort, RetrievalPort};

/// Number of passages retrieved per claim unless configured otherwise
pub const DEFAULT_TOP_K: usize = 3;

/// Result of the policy evidence stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PolicyEvidence {
    /// Supporting text produced from `passages` retrieved passages
    Retrieved { text: String, passages: usize },
    /// No evidence could be produced
    Unavailable { reason: String },
}

impl PolicyEvidence {
    /// Evidence text; empty when unavailable
    pub fn text(&self) -> &str {
        match self {
            PolicyEvidence::Retrieved { text, .. } => text,
            PolicyEvidence::Unavailable { .. } => "",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PolicyEvidence::Retrieved { .. })
    }
}

/// Produces policy evidence text for claims
pub struct PolicyEvidenceResolver {
    store: Arc<dyn ClaimDataStore>,
    reasoning: Arc<dyn ReasoningPort>,
    retrieval: Arc<dyn RetrievalPort>,
    top_k: usize,
    reasoning_policy: CallPolicy,
    retrieval_policy: CallPolicy,
}

impl PolicyEvidenceResolver {
    pub fn new(
        store: Arc<dyn ClaimDataStore>,
        reasoning: Arc<dyn ReasoningPort>,
        retrieval: Arc<dyn RetrievalPort>,
    ) -> Self {
        Self {
            store,
            reasoning,
            retrieval,
            top_k: DEFAULT_TOP_K,
            reasoning_policy: CallPolicy::default(),
            retrieval_policy: CallPolicy::default(),
        }
    }

    /// Sets how many passages are retrieved
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the timeout/retry policies for the two external calls
    pub fn with_call_policies(mut self, reasoning: CallPolicy, retrieval: CallPolicy) -> Self {
        self.reasoning_policy = reasoning;
        self.retrieval_policy = retrieval;
        self
    }

    /// Produces evidence for one claim given the eligibility decision so far.
    pub async fn resolve(&self, claim_id: &str, eligibility: Option<&EligibilityResult>) -> PolicyEvidence {
        let Some(query) = self.build_query(claim_id, eligibility) else {
            return PolicyEvidence::Unavailable {
                reason: format!("Claim {} not found", claim_id),
            };
        };

        let passages = match call_with_retry("evidence.search", &self.retrieval_policy, || {
            self.retrieval.search(&query, self.top_k)
        })
        .await
        {
            Ok(passages) => passages,
            Err(error) => {
                warn!(claim_id, error = %error, "Policy retrieval failed");
                return PolicyEvidence::Unavailable {
                    reason: format!("Policy retrieval failed: {}", error),
                };
            }
        };

        let context = passages.join("\n");
        let prompt = format!(
            "Answer the question based on the following policy documents:\n{}\n\nQuestion: {}\nAnswer:",
            context, query
        );

        match call_with_retry("evidence.complete", &self.reasoning_policy, || {
            self.reasoning.complete(&prompt)
        })
        .await
        {
            Ok(text) => {
                info!(claim_id, passages = passages.len(), "Policy evidence produced");
                PolicyEvidence::Retrieved {
                    text,
                    passages: passages.len(),
                }
            }
            Err(error) => {
                warn!(claim_id, error = %error, "Policy reasoning failed");
                PolicyEvidence::Unavailable {
                    reason: format!("Policy reasoning failed: {}", error),
                }
            }
        }
    }

    /// Builds the retrieval query, `None` if the claim does not exist
    fn build_query(&self, claim_id: &str, eligibility: Option<&EligibilityResult>) -> Option<String> {
        let claim = self.store.get_claim(claim_id)?;
        let plan = claim
            .patient_id
            .as_ref()
            .and_then(|id| self.store.get_patient(id.as_str()))
            .and_then(|patient| patient.plan_id.as_ref())
            .map(|plan| plan.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let procedure_code = claim.procedure_code.as_deref().unwrap_or("Unknown");
        let procedure_name = claim.procedure_name.as_deref().unwrap_or_default();

        let decision = match eligibility {
            Some(result) => {
                let decision = result.decision();
                let label = if decision.eligible { "Eligible" } else { "Not eligible" };
                format!("{} ({})", label, decision.reason)
            }
            None => "Not assessed".to_string(),
        };

        Some(format!(
            "Claim ID: {claim_id}\n\
             Plan: {plan}\n\
             Procedure: {procedure_code} ({procedure_name})\n\
             \n\
             The eligibility stage marked this claim as: {decision}\n\
             \n\
             Task:\n\
             - Provide supporting excerpts from the policy documents related to this plan and procedure.\n\
             - Include any coverage notes, limitations, and prior authorization requirements.\n\
             - Format the response as a list of key excerpts."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_text_is_empty() {
        let evidence = PolicyEvidence::Unavailable {
            reason: "down".to_string(),
        };
        assert_eq!(evidence.text(), "");
        assert!(!evidence.is_available());
    }

    #[test]
    fn test_retrieved_text_is_verbatim() {
        let evidence = PolicyEvidence::Retrieved {
            text: "  - Excerpt 1\n".to_string(),
            passages: 3,
        };
        assert_eq!(evidence.text(), "  - Excerpt 1\n");
    }
}
