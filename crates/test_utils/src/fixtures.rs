//! Pre-built Test Fixtures
//!
//! A small snapshot where each claim is built to drive one workflow outcome.
//! Claim ids are exported as constants so tests read as intent.

use std::sync::Arc;

use domain_claims::DataSnapshot;
use rust_decimal_macros::dec;

use crate::builders::{ClaimRecordBuilder, CoverageRuleBuilder, PatientRecordBuilder};

/// Claim ids in [`SnapshotFixtures::standard`]
pub struct ClaimIds;

impl ClaimIds {
    /// Valid, covered, unremarkable
    pub const CLEAN: &'static str = "C1";
    /// Blank diagnosis code
    pub const MISSING_DIAGNOSIS: &'static str = "C2";
    /// Procedure code without a recognised prefix
    pub const BAD_PROCEDURE_CODE: &'static str = "C3";
    /// Patient absent from the patients table
    pub const UNKNOWN_PATIENT: &'static str = "C4";
    /// Zero amount
    pub const ZERO_AMOUNT: &'static str = "C5";
    /// Amount above the high amount threshold
    pub const HIGH_AMOUNT: &'static str = "C6";
    /// Duplicate of [`ClaimIds::DUPLICATE_B`]
    pub const DUPLICATE_A: &'static str = "C7";
    /// Duplicate of [`ClaimIds::DUPLICATE_A`]
    pub const DUPLICATE_B: &'static str = "C8";
    /// Patient on a plan with no rule for the procedure
    pub const NO_RULE: &'static str = "C9";
    /// Not present at all
    pub const MISSING: &'static str = "C404";
}

/// Fixture snapshots
pub struct SnapshotFixtures;

impl SnapshotFixtures {
    /// Builds the standard snapshot
    ///
    /// Patients `P1` (PLAN_GOLD), `P2` (PLAN_SILVER), `P3` (PLAN_BRONZE).
    /// PLAN_BRONZE has no coverage rules.
    pub fn standard() -> DataSnapshot {
        let claims = vec![
            ClaimRecordBuilder::new(ClaimIds::CLEAN).build(),
            ClaimRecordBuilder::new(ClaimIds::MISSING_DIAGNOSIS)
                .without("diagnosis_code")
                .with_date("2024-03-02")
                .build(),
            ClaimRecordBuilder::new(ClaimIds::BAD_PROCEDURE_CODE)
                .with_procedure("XYZ_123")
                .with_date("2024-03-03")
                .build(),
            ClaimRecordBuilder::new(ClaimIds::UNKNOWN_PATIENT)
                .with_patient("P404")
                .build(),
            ClaimRecordBuilder::new(ClaimIds::ZERO_AMOUNT)
                .with_amount(dec!(0))
                .with_date("2024-03-05")
                .build(),
            ClaimRecordBuilder::new(ClaimIds::HIGH_AMOUNT)
                .with_patient("P2")
                .with_procedure("CPT_99215")
                .with_amount(dec!(75000))
                .with_provider("Metro Hospital")
                .build(),
            ClaimRecordBuilder::new(ClaimIds::DUPLICATE_A)
                .with_patient("P2")
                .with_procedure("CPT_99214")
                .with_amount(dec!(250))
                .with_date("2024-04-10")
                .build(),
            ClaimRecordBuilder::new(ClaimIds::DUPLICATE_B)
                .with_patient("P2")
                .with_procedure("CPT_99214")
                .with_amount(dec!(250))
                .with_date("2024-04-10")
                .build(),
            ClaimRecordBuilder::new(ClaimIds::NO_RULE)
                .with_patient("P3")
                .with_amount(dec!(180))
                .build(),
        ];

        let patients = vec![
            PatientRecordBuilder::new("P1").build(),
            PatientRecordBuilder::new("P2")
                .with_age(67)
                .with_gender("M")
                .with_plan("PLAN_SILVER")
                .build(),
            PatientRecordBuilder::new("P3")
                .with_age(30)
                .with_gender("M")
                .with_plan("PLAN_BRONZE")
                .build(),
        ];

        let rules = vec![
            CoverageRuleBuilder::new("PLAN_GOLD", "CPT_99213").build(),
            CoverageRuleBuilder::new("PLAN_SILVER", "CPT_99214").build(),
            CoverageRuleBuilder::new("PLAN_SILVER", "CPT_99215")
                .requiring_prior_auth()
                .with_notes("Extended visits need documentation")
                .build(),
        ];

        DataSnapshot::new(claims, patients, rules)
    }

    /// The standard snapshot behind an `Arc`, ready for a workflow
    pub fn shared() -> Arc<DataSnapshot> {
        Arc::new(Self::standard())
    }
}

/// Canned reasoning replies
pub struct ReplyFixtures;

impl ReplyFixtures {
    pub fn eligible() -> String {
        r#"{"eligible": true, "reason": "Procedure covered under plan", "prior_auth_required": false}"#.to_string()
    }

    pub fn ineligible() -> String {
        r#"{"eligible": false, "reason": "Procedure not covered under plan", "prior_auth_required": false}"#.to_string()
    }

    pub fn evidence() -> String {
        "- Section 4.2: Office visits are covered in full.".to_string()
    }

    pub fn explanation() -> String {
        "The claim was reviewed against the policy and a decision was reached.".to_string()
    }
}

/// Canned policy passages
pub struct PassageFixtures;

impl PassageFixtures {
    pub fn standard() -> Vec<String> {
        vec![
            "Office visits for established patients are covered under PLAN_GOLD.".to_string(),
            "Prior authorization is required for extended visits under PLAN_SILVER.".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::ClaimDataStore;

    #[test]
    fn test_standard_snapshot_shape() {
        let snapshot = SnapshotFixtures::standard();
        assert_eq!(snapshot.claim_count(), 9);
        assert_eq!(snapshot.patient_count(), 3);
        assert_eq!(snapshot.rule_count(), 3);
        assert!(snapshot.get_claim(ClaimIds::MISSING).is_none());
        assert!(snapshot.get_rule("PLAN_BRONZE", "CPT_99213").is_none());
    }
}
