//! Claim validation
//!
//! Five hard gates evaluated in order; the first failure ends the check:
//!
//! 1. The claim exists
//! 2. Mandatory fields are present and non-blank
//! 3. Procedure and diagnosis codes carry a recognised prefix
//! 4. The patient exists
//! 5. The amount is strictly positive

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CodeKind, ValidationFailure};
use crate::ports::ClaimDataStore;
use crate::records::ClaimRecord;

const PROCEDURE_PREFIXES: [&str; 2] = ["CPT_", "HCPCS_"];
const DIAGNOSIS_PREFIX: &str = "ICD10_";

/// Outcome of validating one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Human readable reason, `None` when valid
    pub error: Option<String>,
    /// Structured reason, `None` when valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ValidationFailure>,
}

impl ValidationResult {
    /// Creates a passing result
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
            failure: None,
        }
    }

    /// Creates a failing result
    pub fn fail(failure: ValidationFailure) -> Self {
        Self {
            valid: false,
            error: Some(failure.to_string()),
            failure: Some(failure),
        }
    }
}

impl From<Result<(), ValidationFailure>> for ValidationResult {
    fn from(result: Result<(), ValidationFailure>) -> Self {
        match result {
            Ok(()) => ValidationResult::ok(),
            Err(failure) => ValidationResult::fail(failure),
        }
    }
}

/// Validates a claim against the snapshot.
///
/// Pure: reads the store, never mutates it, never calls out.
pub fn validate_claim(store: &dyn ClaimDataStore, claim_id: &str) -> ValidationResult {
    check_claim(store, claim_id).into()
}

fn check_claim(store: &dyn ClaimDataStore, claim_id: &str) -> Result<(), ValidationFailure> {
    let claim = store.get_claim(claim_id).ok_or_else(|| ValidationFailure::NotFound {
        claim_id: claim_id.to_string(),
    })?;

    check_mandatory_fields(claim)?;
    check_codes(claim)?;
    check_patient(store, claim)?;
    check_amount(claim)?;
    Ok(())
}

fn check_mandatory_fields(claim: &ClaimRecord) -> Result<(), ValidationFailure> {
    fn blank(value: Option<&str>) -> bool {
        value.map_or(true, |v| v.trim().is_empty())
    }

    let checks = [
        ("claim_id", blank(Some(claim.claim_id.as_str()))),
        ("patient_id", blank(claim.patient_id.as_ref().map(|p| p.as_str()))),
        ("procedure_code", blank(claim.procedure_code.as_deref())),
        ("diagnosis_code", blank(claim.diagnosis_code.as_deref())),
        ("claim_amount", claim.claim_amount.is_none()),
        ("date", blank(claim.date.as_deref())),
        ("provider", blank(claim.provider.as_deref())),
    ];

    let fields: Vec<String> = checks
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name.to_string())
        .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure::MissingField { fields })
    }
}

fn check_codes(claim: &ClaimRecord) -> Result<(), ValidationFailure> {
    let procedure = claim.procedure_code.as_deref().unwrap_or_default();
    if !PROCEDURE_PREFIXES.iter().any(|prefix| procedure.starts_with(prefix)) {
        return Err(ValidationFailure::InvalidCode {
            code_kind: CodeKind::Procedure,
            code: procedure.to_string(),
        });
    }

    let diagnosis = claim.diagnosis_code.as_deref().unwrap_or_default();
    if !diagnosis.starts_with(DIAGNOSIS_PREFIX) {
        return Err(ValidationFailure::InvalidCode {
            code_kind: CodeKind::Diagnosis,
            code: diagnosis.to_string(),
        });
    }

    Ok(())
}

fn check_patient(store: &dyn ClaimDataStore, claim: &ClaimRecord) -> Result<(), ValidationFailure> {
    let patient_id = claim.patient_id.as_ref().map(|p| p.as_str()).unwrap_or_default();
    if store.get_patient(patient_id).is_none() {
        return Err(ValidationFailure::UnknownPatient {
            patient_id: patient_id.to_string(),
        });
    }
    Ok(())
}

fn check_amount(claim: &ClaimRecord) -> Result<(), ValidationFailure> {
    let amount = claim.claim_amount.unwrap_or_default();
    if amount <= Decimal::ZERO {
        return Err(ValidationFailure::InvalidAmount { amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PatientRecord;
    use crate::snapshot::DataSnapshot;
    use core_kernel::{PatientId, PlanId};
    use rust_decimal_macros::dec;

    fn valid_claim() -> ClaimRecord {
        ClaimRecord {
            patient_id: Some(PatientId::new("P1")),
            procedure_code: Some("CPT_99213".to_string()),
            procedure_name: Some("Office visit".to_string()),
            diagnosis_code: Some("ICD10_J45".to_string()),
            claim_amount: Some(dec!(150)),
            date: Some("2024-03-01".to_string()),
            provider: Some("City Clinic".to_string()),
            ..ClaimRecord::new("C1")
        }
    }

    fn store_with(claim: ClaimRecord) -> DataSnapshot {
        let patient = PatientRecord {
            patient_id: PatientId::new("P1"),
            name: Some("Ada".to_string()),
            age: Some(67),
            gender: Some("F".to_string()),
            plan_id: Some(PlanId::new("MedicareB")),
        };
        DataSnapshot::new(vec![claim], vec![patient], vec![])
    }

    #[test]
    fn test_valid_claim_passes() {
        let store = store_with(valid_claim());
        assert_eq!(validate_claim(&store, "C1"), ValidationResult::ok());
    }

    #[test]
    fn test_unknown_claim() {
        let store = store_with(valid_claim());
        let result = validate_claim(&store, "C404");
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Claim C404 not found"));
    }

    #[test]
    fn test_lists_every_missing_field() {
        let mut claim = valid_claim();
        claim.diagnosis_code = None;
        claim.provider = Some("   ".to_string());
        let result = validate_claim(&store_with(claim), "C1");

        assert_eq!(
            result.failure,
            Some(ValidationFailure::MissingField {
                fields: vec!["diagnosis_code".to_string(), "provider".to_string()],
            })
        );
        assert_eq!(
            result.error.as_deref(),
            Some("Missing or empty mandatory fields: diagnosis_code, provider")
        );
    }

    #[test]
    fn test_hcpcs_procedure_accepted() {
        let mut claim = valid_claim();
        claim.procedure_code = Some("HCPCS_E0601".to_string());
        assert!(validate_claim(&store_with(claim), "C1").valid);
    }

    #[test]
    fn test_bad_diagnosis_prefix() {
        let mut claim = valid_claim();
        claim.diagnosis_code = Some("ICD9_493".to_string());
        let result = validate_claim(&store_with(claim), "C1");
        assert_eq!(result.error.as_deref(), Some("Invalid diagnosis code: ICD9_493"));
    }

    #[test]
    fn test_code_check_runs_before_patient_check() {
        let mut claim = valid_claim();
        claim.procedure_code = Some("99213".to_string());
        claim.patient_id = Some(PatientId::new("P404"));
        let result = validate_claim(&store_with(claim), "C1");
        assert!(matches!(result.failure, Some(ValidationFailure::InvalidCode { code_kind: CodeKind::Procedure, .. })));
    }

    #[test]
    fn test_unknown_patient() {
        let mut claim = valid_claim();
        claim.patient_id = Some(PatientId::new("P404"));
        let result = validate_claim(&store_with(claim), "C1");
        assert_eq!(result.error.as_deref(), Some("Patient ID P404 not found"));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut claim = valid_claim();
        claim.claim_amount = Some(dec!(0));
        let result = validate_claim(&store_with(claim), "C1");
        assert!(matches!(result.failure, Some(ValidationFailure::InvalidAmount { .. })));
    }
}
