//! Source table records
//!
//! Records mirror the columns of the three flat tables. Every column except the
//! primary key is optional: a claim row with a blank diagnosis code must still
//! load so that validation can report it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, PatientId, PlanId};

/// A single reimbursement request from the claims table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Claim identifier
    pub claim_id: ClaimId,
    /// Patient the claim was filed for
    #[serde(default)]
    pub patient_id: Option<PatientId>,
    /// Procedure code (CPT_ or HCPCS_ prefixed)
    #[serde(default)]
    pub procedure_code: Option<String>,
    /// Human readable procedure name
    #[serde(default)]
    pub procedure_name: Option<String>,
    /// Diagnosis code (ICD10_ prefixed)
    #[serde(default)]
    pub diagnosis_code: Option<String>,
    /// Billed amount
    #[serde(default)]
    pub claim_amount: Option<Decimal>,
    /// Date of service as recorded in the source
    #[serde(default)]
    pub date: Option<String>,
    /// Billing provider
    #[serde(default)]
    pub provider: Option<String>,
}

impl ClaimRecord {
    /// Creates a claim with only its identifier set
    pub fn new(claim_id: impl Into<ClaimId>) -> Self {
        Self {
            claim_id: claim_id.into(),
            patient_id: None,
            procedure_code: None,
            procedure_name: None,
            diagnosis_code: None,
            claim_amount: None,
            date: None,
            provider: None,
        }
    }

    /// Returns true when `other` bills the same patient, procedure, provider and
    /// date under a different claim id. Missing values never match.
    pub fn is_duplicate_of(&self, other: &ClaimRecord) -> bool {
        fn same<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
            matches!((a, b), (Some(x), Some(y)) if x == y)
        }

        self.claim_id != other.claim_id
            && same(&self.patient_id, &other.patient_id)
            && same(&self.procedure_code, &other.procedure_code)
            && same(&self.provider, &other.provider)
            && same(&self.date, &other.date)
    }
}

/// A patient from the patients table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: PatientId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Insurance plan the patient is enrolled in
    #[serde(default)]
    pub plan_id: Option<PlanId>,
}

/// Coverage terms for one (plan, procedure) pair
///
/// Terms are kept as the source wrote them; they are only ever read by the
/// reasoning service, never interpreted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRule {
    pub plan_id: PlanId,
    pub procedure_code: String,
    #[serde(default)]
    pub covered: Option<String>,
    #[serde(default)]
    pub prior_auth_required: Option<String>,
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn claim(id: &str) -> ClaimRecord {
        ClaimRecord {
            patient_id: Some(PatientId::new("P1")),
            procedure_code: Some("CPT_99213".to_string()),
            claim_amount: Some(dec!(100)),
            date: Some("2024-03-01".to_string()),
            provider: Some("City Clinic".to_string()),
            ..ClaimRecord::new(id)
        }
    }

    #[test]
    fn test_duplicate_requires_different_id() {
        let a = claim("C1");
        assert!(!a.is_duplicate_of(&a.clone()));
        assert!(a.is_duplicate_of(&claim("C2")));
    }

    #[test]
    fn test_missing_values_never_match() {
        let mut a = claim("C1");
        let mut b = claim("C2");
        a.provider = None;
        b.provider = None;
        assert!(!a.is_duplicate_of(&b));
    }

    #[test]
    fn test_different_date_is_not_duplicate() {
        let a = claim("C1");
        let mut b = claim("C2");
        b.date = Some("2024-03-02".to_string());
        assert!(!a.is_duplicate_of(&b));
    }
}
