//! Core Kernel - Foundational types shared by every crate in the claims workflow
//!
//! This crate provides the building blocks used across the domain and adapter crates:
//! - Strongly-typed string identifiers for claims, patients, and plans
//! - The unified `PortError` returned by every external collaborator
//! - Health-check contracts for adapters
//! - A timeout + retry wrapper for calls to external services

pub mod identifiers;
pub mod error;
pub mod ports;
pub mod resilience;

pub use identifiers::{ClaimId, PatientId, PlanId};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use resilience::{CallPolicy, call_with_retry};
