//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! claims workflow test suite.
//!
//! # Modules
//!
//! - `fixtures`: A small, fixed data snapshot with one claim per outcome
//! - `builders`: Builder patterns for records
//! - `mocks`: Scripted reasoning and retrieval services
//! - `assertions`: Custom assertion helpers for workflow states
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod mocks;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use mocks::*;
pub use assertions::*;
pub use generators::*;
