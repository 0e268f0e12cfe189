//! HTTP API Layer
//!
//! This crate exposes the claim decision workflow over REST using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Workflow runs, single-stage inspection, health
//! - **Middleware**: Request ids, tracing, audit logging
//! - **DTOs**: The serialisable workflow report and claim summaries
//! - **Error Handling**: Consistent JSON error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(workflow, health_checks, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_claims::ClaimWorkflow;

use crate::config::ApiConfig;
use crate::handlers::{claims, health};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<ClaimWorkflow>,
    /// Adapters reported by the readiness endpoint
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(workflow: ClaimWorkflow, health_checks: Vec<Arc<dyn HealthCheckable>>, config: ApiConfig) -> Self {
        Self {
            workflow: Arc::new(workflow),
            health_checks,
            config,
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Workflow, health checks, and configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claims_routes = Router::new()
        .route("/", get(claims::list_claims))
        .route("/:id/workflow", post(claims::run_workflow))
        .route("/:id/validation", get(claims::get_validation))
        .route("/:id/fraud", get(claims::get_fraud_screen));

    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
