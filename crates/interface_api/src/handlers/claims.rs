//! Claims handlers

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use domain_claims::{FraudResult, ValidationResult};

use crate::dto::claims::{ClaimSummary, WorkflowReport};
use crate::{error::ApiError, AppState};

fn claim_id(raw: &str) -> Result<&str, ApiError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("Claim ID must not be blank".to_string()));
    }
    Ok(id)
}

/// Lists claims from the loaded snapshot
pub async fn list_claims(State(state): State<AppState>) -> Json<Vec<ClaimSummary>> {
    let claims = state.workflow.store().all_claims();
    Json(claims.iter().map(ClaimSummary::from).collect())
}

/// Runs the full workflow for a claim
///
/// Unknown claims are not an HTTP error: the report carries the validation failure.
pub async fn run_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowReport>, ApiError> {
    let id = claim_id(&id)?;
    let result = state.workflow.run_workflow(id).await;
    info!(claim_id = id, run_id = %result.run_id, status = result.status_label(), "Workflow report served");
    Ok(Json(WorkflowReport::from(result)))
}

/// Runs only validation for a claim
pub async fn get_validation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ValidationResult>, ApiError> {
    let id = claim_id(&id)?;
    if state.workflow.store().get_claim(id).is_none() {
        return Err(ApiError::claim_not_found(id));
    }
    Ok(Json(state.workflow.validate(id)))
}

/// Runs only the fraud screen for a claim
pub async fn get_fraud_screen(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FraudResult>, ApiError> {
    let id = claim_id(&id)?;
    if state.workflow.store().get_claim(id).is_none() {
        return Err(ApiError::claim_not_found(id));
    }
    Ok(Json(state.workflow.screen(id)))
}
