//! Test Data Builders
//!
//! Provides builder patterns for constructing records with sensible defaults.
//! Every builder starts from a record that passes validation, so tests only
//! spell out the field they are breaking.

use core_kernel::{PatientId, PlanId};
use domain_claims::{ClaimRecord, CoverageRule, PatientRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Builder for claim rows
pub struct ClaimRecordBuilder {
    record: ClaimRecord,
}

impl Default for ClaimRecordBuilder {
    fn default() -> Self {
        Self::new("C1")
    }
}

impl ClaimRecordBuilder {
    /// Creates a builder for a valid claim by patient `P1`
    pub fn new(claim_id: &str) -> Self {
        Self {
            record: ClaimRecord {
                patient_id: Some(PatientId::new("P1")),
                procedure_code: Some("CPT_99213".to_string()),
                procedure_name: Some("Office visit, established patient".to_string()),
                diagnosis_code: Some("ICD10_J45".to_string()),
                claim_amount: Some(dec!(100)),
                date: Some("2024-03-01".to_string()),
                provider: Some("City Clinic".to_string()),
                ..ClaimRecord::new(claim_id)
            },
        }
    }

    pub fn with_patient(mut self, patient_id: &str) -> Self {
        self.record.patient_id = Some(PatientId::new(patient_id));
        self
    }

    pub fn with_procedure(mut self, code: &str) -> Self {
        self.record.procedure_code = Some(code.to_string());
        self
    }

    pub fn with_diagnosis(mut self, code: &str) -> Self {
        self.record.diagnosis_code = Some(code.to_string());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.record.claim_amount = Some(amount);
        self
    }

    pub fn with_date(mut self, date: &str) -> Self {
        self.record.date = Some(date.to_string());
        self
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.record.provider = Some(provider.to_string());
        self
    }

    /// Clears one column by name, as a blank cell in the source table would
    ///
    /// # Panics
    ///
    /// Panics on an unknown column name.
    pub fn without(mut self, field: &str) -> Self {
        match field {
            "patient_id" => self.record.patient_id = None,
            "procedure_code" => self.record.procedure_code = None,
            "procedure_name" => self.record.procedure_name = None,
            "diagnosis_code" => self.record.diagnosis_code = None,
            "claim_amount" => self.record.claim_amount = None,
            "date" => self.record.date = None,
            "provider" => self.record.provider = None,
            other => panic!("unknown claim column: {}", other),
        }
        self
    }

    pub fn build(self) -> ClaimRecord {
        self.record
    }
}

/// Builder for patient rows
pub struct PatientRecordBuilder {
    record: PatientRecord,
}

impl Default for PatientRecordBuilder {
    fn default() -> Self {
        Self::new("P1")
    }
}

impl PatientRecordBuilder {
    /// Creates a builder for a 45 year old on `PLAN_GOLD`
    pub fn new(patient_id: &str) -> Self {
        Self {
            record: PatientRecord {
                patient_id: PatientId::new(patient_id),
                name: Some("Jane Doe".to_string()),
                age: Some(45),
                gender: Some("F".to_string()),
                plan_id: Some(PlanId::new("PLAN_GOLD")),
            },
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.record.age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: &str) -> Self {
        self.record.gender = Some(gender.to_string());
        self
    }

    pub fn with_plan(mut self, plan_id: &str) -> Self {
        self.record.plan_id = Some(PlanId::new(plan_id));
        self
    }

    pub fn build(self) -> PatientRecord {
        self.record
    }
}

/// Builder for coverage rule rows
pub struct CoverageRuleBuilder {
    record: CoverageRule,
}

impl CoverageRuleBuilder {
    /// Creates a builder for a covered procedure with no prior authorization
    pub fn new(plan_id: &str, procedure_code: &str) -> Self {
        Self {
            record: CoverageRule {
                plan_id: PlanId::new(plan_id),
                procedure_code: procedure_code.to_string(),
                covered: Some("Yes".to_string()),
                prior_auth_required: Some("No".to_string()),
                min_age: Some(0),
                max_age: Some(120),
                gender: Some("Any".to_string()),
                notes: None,
            },
        }
    }

    pub fn not_covered(mut self) -> Self {
        self.record.covered = Some("No".to_string());
        self
    }

    pub fn requiring_prior_auth(mut self) -> Self {
        self.record.prior_auth_required = Some("Yes".to_string());
        self
    }

    pub fn with_age_range(mut self, min_age: u32, max_age: u32) -> Self {
        self.record.min_age = Some(min_age);
        self.record.max_age = Some(max_age);
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.record.notes = Some(notes.to_string());
        self
    }

    pub fn build(self) -> CoverageRule {
        self.record
    }
}
