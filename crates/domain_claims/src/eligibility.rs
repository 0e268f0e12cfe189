//! Eligibility resolution
//!
//! Joins claim → patient → coverage rule and asks the reasoning service for a
//! coverage decision. The reply is parsed into a tagged [`ReplyParse`]; anything
//! that is not exactly the expected JSON object degrades to a conservative denial
//! carrying the raw reply as its reason.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use core_kernel::{call_with_retry, CallPolicy};

use crate::ports::{ClaimDataStore, ReasoningPort};
use crate::records::{ClaimRecord, CoverageRule, PatientRecord};

/// The three-key decision the reasoning service is asked to return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub reason: String,
    pub prior_auth_required: bool,
}

impl EligibilityDecision {
    /// A denial that requires no prior authorization
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason: reason.into(),
            prior_auth_required: false,
        }
    }
}

/// A reasoning reply, either in the expected shape or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyParse {
    Parsed(EligibilityDecision),
    Unparsed(String),
}

impl ReplyParse {
    /// Parses a raw reply. A single surrounding Markdown code fence is tolerated.
    pub fn parse(reply: &str) -> Self {
        match serde_json::from_str::<EligibilityDecision>(strip_code_fence(reply)) {
            Ok(decision) => ReplyParse::Parsed(decision),
            Err(_) => ReplyParse::Unparsed(reply.trim().to_string()),
        }
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    match body.find('\n') {
        Some(newline) if body[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
            body[newline + 1..].trim()
        }
        _ => body.trim(),
    }
}

/// Result of the eligibility stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EligibilityResult {
    /// The service replied with a well-formed decision
    Parsed(EligibilityDecision),
    /// The service replied, but not in the expected shape
    Unparsed { raw_reply: String },
    /// Claim, patient, or coverage rule missing; no service call was made
    NotFound { message: String },
    /// The service could not be reached after retrying
    ServiceUnavailable { message: String },
}

impl EligibilityResult {
    /// The decision the workflow acts on; every non-parsed outcome is a denial
    pub fn decision(&self) -> EligibilityDecision {
        match self {
            EligibilityResult::Parsed(decision) => decision.clone(),
            EligibilityResult::Unparsed { raw_reply } => EligibilityDecision::denied(raw_reply.clone()),
            EligibilityResult::NotFound { message } => EligibilityDecision::denied(message.clone()),
            EligibilityResult::ServiceUnavailable { message } => {
                EligibilityDecision::denied(format!("Eligibility service unavailable: {}", message))
            }
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, EligibilityResult::Parsed(decision) if decision.eligible)
    }

    /// True when the result came from a fallback rather than a parsed reply
    pub fn is_degraded(&self) -> bool {
        !matches!(self, EligibilityResult::Parsed(_))
    }
}

impl From<ReplyParse> for EligibilityResult {
    fn from(parse: ReplyParse) -> Self {
        match parse {
            ReplyParse::Parsed(decision) => EligibilityResult::Parsed(decision),
            ReplyParse::Unparsed(raw_reply) => EligibilityResult::Unparsed { raw_reply },
        }
    }
}

/// Resolves coverage eligibility for claims
pub struct EligibilityResolver {
    store: Arc<dyn ClaimDataStore>,
    reasoning: Arc<dyn ReasoningPort>,
    call_policy: CallPolicy,
}

impl EligibilityResolver {
    pub fn new(
        store: Arc<dyn ClaimDataStore>,
        reasoning: Arc<dyn ReasoningPort>,
        call_policy: CallPolicy,
    ) -> Self {
        Self {
            store,
            reasoning,
            call_policy,
        }
    }

    /// Resolves eligibility for one claim. Never fails; see [`EligibilityResult`].
    pub async fn resolve(&self, claim_id: &str) -> EligibilityResult {
        let (claim, patient, rule) = match self.join(claim_id) {
            Ok(rows) => rows,
            Err(message) => {
                info!(claim_id, %message, "Eligibility lookup incomplete");
                return EligibilityResult::NotFound { message };
            }
        };

        let prompt = build_prompt(claim, patient, rule);
        debug!(claim_id, prompt_len = prompt.len(), "Requesting eligibility decision");

        let reply = call_with_retry("eligibility.complete", &self.call_policy, || {
            self.reasoning.complete(&prompt)
        })
        .await;

        let result = match reply {
            Ok(text) => EligibilityResult::from(ReplyParse::parse(&text)),
            Err(error) => {
                warn!(claim_id, error = %error, "Eligibility service failed, denying conservatively");
                EligibilityResult::ServiceUnavailable {
                    message: error.to_string(),
                }
            }
        };

        if let EligibilityResult::Unparsed { .. } = result {
            warn!(claim_id, "Eligibility reply was not the expected JSON object");
        }
        info!(claim_id, eligible = result.is_eligible(), "Eligibility resolved");
        result
    }

    fn join(&self, claim_id: &str) -> Result<(&ClaimRecord, &PatientRecord, &CoverageRule), String> {
        let claim = self
            .store
            .get_claim(claim_id)
            .ok_or_else(|| format!("Claim ID {} not found", claim_id))?;

        let patient_id = claim.patient_id.as_ref().map(|p| p.as_str()).unwrap_or_default();
        let patient = self
            .store
            .get_patient(patient_id)
            .ok_or_else(|| format!("Patient ID {} not found", patient_id))?;

        let plan_id = patient.plan_id.as_ref().map(|p| p.as_str()).unwrap_or_default();
        let procedure_code = claim.procedure_code.as_deref().unwrap_or_default();
        let rule = self.store.get_rule(plan_id, procedure_code).ok_or_else(|| {
            format!(
                "No insurance rule found for plan {} and procedure {}",
                plan_id, procedure_code
            )
        })?;

        Ok((claim, patient, rule))
    }
}

fn build_prompt(claim: &ClaimRecord, patient: &PatientRecord, rule: &CoverageRule) -> String {
    let claim_json = serde_json::to_string_pretty(claim).unwrap_or_default();
    let patient_json = serde_json::to_string_pretty(patient).unwrap_or_default();
    let rule_json = serde_json::to_string_pretty(rule).unwrap_or_default();

    format!(
        r#"You are an insurance eligibility checker.

Claim:
{claim_json}

Patient:
{patient_json}

Insurance Rule:
{rule_json}

Task:
- Decide if this claim is eligible for coverage.
- Check patient age, gender, plan, and procedure rules.
- State whether prior authorization is required.
- Reply with exactly one JSON object and nothing else, using these keys:
  {{"eligible": true or false, "reason": "explanation", "prior_auth_required": true or false}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let reply = r#"{"eligible": true, "reason": "Covered under Part B", "prior_auth_required": false}"#;
        assert_eq!(
            ReplyParse::parse(reply),
            ReplyParse::Parsed(EligibilityDecision {
                eligible: true,
                reason: "Covered under Part B".to_string(),
                prior_auth_required: false,
            })
        );
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "```json\n{\"eligible\": false, \"reason\": \"Age\", \"prior_auth_required\": true}\n```";
        assert!(matches!(ReplyParse::parse(reply), ReplyParse::Parsed(d) if !d.eligible && d.prior_auth_required));
    }

    #[test]
    fn test_prose_reply_is_unparsed_and_trimmed() {
        let parse = ReplyParse::parse("  The claim looks eligible.\n");
        assert_eq!(parse, ReplyParse::Unparsed("The claim looks eligible.".to_string()));
    }

    #[test]
    fn test_extra_keys_are_rejected() {
        let reply = r#"{"eligible": true, "reason": "ok", "prior_auth_required": false, "confidence": 0.9}"#;
        assert!(matches!(ReplyParse::parse(reply), ReplyParse::Unparsed(_)));
    }

    #[test]
    fn test_string_booleans_are_rejected() {
        let reply = r#"{"eligible": "true", "reason": "ok", "prior_auth_required": false}"#;
        assert!(matches!(ReplyParse::parse(reply), ReplyParse::Unparsed(_)));
    }

    #[test]
    fn test_unparsed_degrades_to_denial() {
        let result = EligibilityResult::from(ReplyParse::Unparsed("maybe".to_string()));
        assert!(!result.is_eligible());
        assert!(result.is_degraded());
        assert_eq!(result.decision(), EligibilityDecision::denied("maybe"));
    }

    #[test]
    fn test_result_serializes_with_outcome_tag() {
        let result = EligibilityResult::NotFound {
            message: "Claim ID C9 not found".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "not_found");
        assert_eq!(json["message"], "Claim ID C9 not found");

        let parsed = EligibilityResult::Parsed(EligibilityDecision::denied("no"));
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["outcome"], "parsed");
        assert_eq!(json["eligible"], false);
    }
}
