//! Custom Test Assertions
//!
//! Assertion helpers for workflow states that print the whole trace on failure.

use domain_claims::{ClaimStatus, StageKind, StageOutcome, WorkflowState};

fn describe(state: &WorkflowState) -> String {
    let trace: Vec<String> = state
        .trace
        .iter()
        .map(|t| format!("{}={:?}({})", t.stage, t.outcome, t.message.as_deref().unwrap_or("")))
        .collect();
    format!("claim={} status={} trace=[{}]", state.claim_id, state.status_label(), trace.join(", "))
}

/// Asserts the final status of a run
pub fn assert_status(state: &WorkflowState, expected: ClaimStatus) {
    assert_eq!(
        state.status,
        Some(expected),
        "Unexpected status: {}",
        describe(state)
    );
}

/// Asserts how a stage ended
pub fn assert_stage(state: &WorkflowState, stage: StageKind, expected: StageOutcome) {
    let actual = state.trace_for(stage).map(|t| t.outcome);
    assert_eq!(
        actual,
        Some(expected),
        "Unexpected outcome for stage {}: {}",
        stage,
        describe(state)
    );
}

/// Asserts every stage of the chain was recorded exactly once, in order
pub fn assert_full_trace(state: &WorkflowState) {
    let stages: Vec<StageKind> = state.trace.iter().map(|t| t.stage).collect();
    assert_eq!(
        stages,
        vec![
            StageKind::Validation,
            StageKind::Eligibility,
            StageKind::PolicyEvidence,
            StageKind::FraudScreen,
            StageKind::Explanation,
        ],
        "Trace incomplete: {}",
        describe(state)
    );
}

/// Asserts the validation error names `needle`
pub fn assert_validation_error_contains(state: &WorkflowState, needle: &str) {
    let error = state
        .validation_result
        .as_ref()
        .and_then(|v| v.error.as_deref())
        .unwrap_or_default();
    assert!(
        error.contains(needle),
        "Validation error {:?} does not mention {:?}: {}",
        error,
        needle,
        describe(state)
    );
}
