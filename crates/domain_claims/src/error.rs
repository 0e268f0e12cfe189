//! Claims domain errors

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which code column failed the format check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Procedure,
    Diagnosis,
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeKind::Procedure => write!(f, "procedure"),
            CodeKind::Diagnosis => write!(f, "diagnosis"),
        }
    }
}

/// Reasons a claim fails validation, in gate order
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("Claim {claim_id} not found")]
    NotFound { claim_id: String },

    #[error("Missing or empty mandatory fields: {}", .fields.join(", "))]
    MissingField { fields: Vec<String> },

    #[error("Invalid {code_kind} code: {code}")]
    InvalidCode { code_kind: CodeKind, code: String },

    #[error("Patient ID {patient_id} not found")]
    UnknownPatient { patient_id: String },

    #[error("Invalid claim amount: {amount}")]
    InvalidAmount { amount: Decimal },
}
