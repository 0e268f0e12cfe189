//! HTTP tests for interface_api

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, CallPolicy, HealthCheckResult, HealthCheckable};
use domain_claims::{
    ClaimWorkflow, FraudResult, ReasoningPort, StageKind, StageOutcome, TerminationMode, ValidationResult,
    WorkflowConfig,
};
use interface_api::config::ApiConfig;
use interface_api::dto::claims::{ClaimSummary, WorkflowReport};
use interface_api::error::ErrorResponse;
use interface_api::handlers::health::{HealthResponse, ReadinessResponse};
use interface_api::{create_router, AppState};

use test_utils::{
    ClaimIds, FailingReasoning, PassageFixtures, ReplyFixtures, ScriptedReasoning, SnapshotFixtures, StaticRetrieval,
};

struct DownAdapter;

#[async_trait]
impl HealthCheckable for DownAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::new("reasoning", AdapterHealth::Unhealthy, Some("unreachable".to_string()))
    }
}

fn workflow_config(termination: TerminationMode) -> WorkflowConfig {
    let fast = CallPolicy {
        timeout_ms: 1_000,
        max_retries: 1,
        retry_delay_ms: 1,
    };
    WorkflowConfig {
        termination,
        reasoning_call: fast,
        retrieval_call: fast,
        ..WorkflowConfig::default()
    }
}

fn server_with(
    reasoning: Arc<dyn ReasoningPort>,
    termination: TerminationMode,
    health_checks: Vec<Arc<dyn HealthCheckable>>,
) -> TestServer {
    let retrieval = Arc::new(StaticRetrieval::new(PassageFixtures::standard()));
    let workflow = ClaimWorkflow::new(SnapshotFixtures::shared(), reasoning, retrieval, workflow_config(termination));
    let state = AppState::new(workflow, health_checks, ApiConfig::default());
    TestServer::new(create_router(state)).unwrap()
}

fn server(reasoning: Arc<dyn ReasoningPort>) -> TestServer {
    let snapshot: Arc<dyn HealthCheckable> = SnapshotFixtures::shared();
    server_with(reasoning, TerminationMode::HaltOnDisqualification, vec![snapshot])
}

fn approving() -> Arc<ScriptedReasoning> {
    Arc::new(
        ScriptedReasoning::sequence([ReplyFixtures::eligible(), ReplyFixtures::evidence()])
            .then_always(ReplyFixtures::explanation()),
    )
}

// ============================================================================
// Health Tests
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_version() {
        let response = server(approving()).get("/health").await;
        response.assert_status_ok();
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_ready_when_adapters_are_healthy() {
        let response = server(approving()).get("/health/ready").await;
        response.assert_status_ok();
        let body: ReadinessResponse = response.json();
        assert_eq!(body.status, "ready");
        assert_eq!(body.claims_loaded, 9);
        assert_eq!(body.adapters.len(), 1);
        assert_eq!(body.adapters[0].adapter_id, "data-snapshot");
    }

    #[tokio::test]
    async fn test_unhealthy_adapter_fails_readiness() {
        let snapshot: Arc<dyn HealthCheckable> = SnapshotFixtures::shared();
        let server = server_with(
            approving(),
            TerminationMode::HaltOnDisqualification,
            vec![snapshot, Arc::new(DownAdapter)],
        );

        let response = server.get("/health/ready").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: ReadinessResponse = response.json();
        assert_eq!(body.status, "unavailable");
        assert_eq!(body.adapters[1].status, AdapterHealth::Unhealthy);
    }
}

// ============================================================================
// Claims Tests
// ============================================================================

mod claims_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_claims_in_source_order() {
        let response = server(approving()).get("/api/v1/claims").await;
        response.assert_status_ok();
        let claims: Vec<ClaimSummary> = response.json();
        assert_eq!(claims.len(), 9);
        assert_eq!(claims[0].claim_id, ClaimIds::CLEAN);
        assert_eq!(claims[0].claim_amount, Some(dec!(100)));
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let response = server(approving()).get("/api/v1/claims").await;
        assert!(response.headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_validation_endpoint() {
        let server = server(approving());

        let valid: ValidationResult = server
            .get(&format!("/api/v1/claims/{}/validation", ClaimIds::CLEAN))
            .await
            .json();
        assert!(valid.valid);

        let invalid: ValidationResult = server
            .get(&format!("/api/v1/claims/{}/validation", ClaimIds::MISSING_DIAGNOSIS))
            .await
            .json();
        assert!(!invalid.valid);
        assert!(invalid.error.unwrap().contains("diagnosis_code"));
    }

    #[tokio::test]
    async fn test_fraud_endpoint() {
        let response = server(approving())
            .get(&format!("/api/v1/claims/{}/fraud", ClaimIds::HIGH_AMOUNT))
            .await;
        response.assert_status_ok();
        let fraud: FraudResult = response.json();
        assert!(fraud.fraud_flag);
        assert!(fraud.reason.is_some());
    }

    #[tokio::test]
    async fn test_unknown_claim_is_404_on_stage_endpoints() {
        let server = server(approving());
        for stage in ["validation", "fraud"] {
            let response = server
                .get(&format!("/api/v1/claims/{}/{}", ClaimIds::MISSING, stage))
                .await;
            response.assert_status(StatusCode::NOT_FOUND);
            let body: ErrorResponse = response.json();
            assert_eq!(body.error, "not_found");
            assert!(body.message.contains(ClaimIds::MISSING));
        }
    }

    #[tokio::test]
    async fn test_error_body_has_only_error_and_message() {
        let response = server(approving())
            .get(&format!("/api/v1/claims/{}/fraud", ClaimIds::MISSING))
            .await;
        let body: serde_json::Value = response.json();
        let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["error", "message"]);
    }

    #[tokio::test]
    async fn test_blank_claim_id_is_bad_request() {
        let response = server(approving()).post("/api/v1/claims/%20/workflow").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Workflow Tests
// ============================================================================

mod workflow_tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_claim_report() {
        let response = server(approving())
            .post(&format!("/api/v1/claims/{}/workflow", ClaimIds::CLEAN))
            .await;
        response.assert_status_ok();

        let report: WorkflowReport = response.json();
        assert_eq!(report.claim_id, ClaimIds::CLEAN);
        assert_eq!(report.status, "Approved");
        assert!(report.validation_result.unwrap().valid);
        let eligibility = report.eligibility_result.unwrap();
        assert_eq!(eligibility.outcome, "parsed");
        assert!(eligibility.decision.eligible);
        assert_eq!(report.policy_response.as_deref(), Some(ReplyFixtures::evidence().as_str()));
        assert!(!report.fraud_result.unwrap().fraud_flag);
        assert_eq!(report.explanation.as_deref(), Some(ReplyFixtures::explanation().as_str()));
        assert_eq!(report.trace.len(), 5);
        assert!(report.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_claim_report_is_rejected() {
        let response = server(approving())
            .post(&format!("/api/v1/claims/{}/workflow", ClaimIds::MISSING))
            .await;
        response.assert_status_ok();

        let report: WorkflowReport = response.json();
        assert_eq!(report.status, "Rejected - Invalid Data");
        let validation = report.validation_result.unwrap();
        assert!(!validation.valid);
        assert!(validation.error.unwrap().contains(ClaimIds::MISSING));
        assert!(report.eligibility_result.is_none());
        assert!(report.fraud_result.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_reasoning_degrades_report() {
        let snapshot: Arc<dyn HealthCheckable> = SnapshotFixtures::shared();
        let server = server_with(
            Arc::new(FailingReasoning::new()),
            TerminationMode::HaltOnDisqualification,
            vec![snapshot],
        );

        let response = server
            .post(&format!("/api/v1/claims/{}/workflow", ClaimIds::CLEAN))
            .await;
        response.assert_status_ok();

        let report: WorkflowReport = response.json();
        assert_eq!(report.status, "Denied - Not Eligible");
        assert_eq!(report.eligibility_result.unwrap().outcome, "service_unavailable");
        assert!(report.explanation.is_none());
        let explanation = report.trace.iter().find(|t| t.stage == StageKind::Explanation).unwrap();
        assert_eq!(explanation.outcome, StageOutcome::Degraded);
    }

    #[tokio::test]
    async fn test_last_writer_wins_lets_fraud_overwrite() {
        let reasoning = Arc::new(ScriptedReasoning::always(ReplyFixtures::ineligible()));
        let snapshot: Arc<dyn HealthCheckable> = SnapshotFixtures::shared();
        let server = server_with(reasoning, TerminationMode::LastWriterWins, vec![snapshot]);

        let report: WorkflowReport = server
            .post(&format!("/api/v1/claims/{}/workflow", ClaimIds::CLEAN))
            .await
            .json();
        assert_eq!(report.status, "Approved");
        assert!(!report.eligibility_result.unwrap().decision.eligible);
    }
}
