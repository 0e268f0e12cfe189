//! In-memory data snapshot
//!
//! One `DataSnapshot` is built at startup and shared behind an `Arc` by every
//! stage and every concurrent run.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable};

use crate::ports::ClaimDataStore;
use crate::records::{ClaimRecord, CoverageRule, PatientRecord};

/// Immutable, indexed copy of the patients, claims, and coverage rule tables
#[derive(Debug, Default)]
pub struct DataSnapshot {
    claims: Vec<ClaimRecord>,
    claim_index: HashMap<String, usize>,
    patients: HashMap<String, PatientRecord>,
    rules: HashMap<String, HashMap<String, CoverageRule>>,
}

impl DataSnapshot {
    /// Builds the snapshot and its lookup indexes.
    ///
    /// When a key appears more than once the first row wins, matching a
    /// top-to-bottom scan of the source table.
    pub fn new(
        claims: Vec<ClaimRecord>,
        patients: Vec<PatientRecord>,
        rules: Vec<CoverageRule>,
    ) -> Self {
        let mut claim_index = HashMap::with_capacity(claims.len());
        for (position, claim) in claims.iter().enumerate() {
            if claim_index.contains_key(claim.claim_id.as_str()) {
                warn!(claim_id = %claim.claim_id, "Duplicate claim id in source table, keeping first row");
                continue;
            }
            claim_index.insert(claim.claim_id.to_string(), position);
        }

        let mut patient_index = HashMap::with_capacity(patients.len());
        for patient in patients {
            if patient_index.contains_key(patient.patient_id.as_str()) {
                warn!(patient_id = %patient.patient_id, "Duplicate patient id in source table, keeping first row");
                continue;
            }
            patient_index.insert(patient.patient_id.to_string(), patient);
        }

        let mut rule_index: HashMap<String, HashMap<String, CoverageRule>> = HashMap::new();
        for rule in rules {
            let by_procedure = rule_index.entry(rule.plan_id.to_string()).or_default();
            if by_procedure.contains_key(&rule.procedure_code) {
                warn!(
                    plan_id = %rule.plan_id,
                    procedure_code = %rule.procedure_code,
                    "Duplicate coverage rule in source table, keeping first row"
                );
                continue;
            }
            by_procedure.insert(rule.procedure_code.clone(), rule);
        }

        Self {
            claims,
            claim_index,
            patients: patient_index,
            rules: rule_index,
        }
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(HashMap::len).sum()
    }
}

impl DomainPort for DataSnapshot {}

impl ClaimDataStore for DataSnapshot {
    fn get_claim(&self, claim_id: &str) -> Option<&ClaimRecord> {
        self.claim_index.get(claim_id).map(|&i| &self.claims[i])
    }

    fn get_patient(&self, patient_id: &str) -> Option<&PatientRecord> {
        self.patients.get(patient_id)
    }

    fn get_rule(&self, plan_id: &str, procedure_code: &str) -> Option<&CoverageRule> {
        self.rules.get(plan_id)?.get(procedure_code)
    }

    fn all_claims(&self) -> &[ClaimRecord] {
        &self.claims
    }
}

#[async_trait]
impl HealthCheckable for DataSnapshot {
    async fn health_check(&self) -> HealthCheckResult {
        if self.claims.is_empty() {
            return HealthCheckResult::new(
                "data-snapshot",
                AdapterHealth::Degraded,
                Some("Claims table is empty".to_string()),
            );
        }

        HealthCheckResult::new(
            "data-snapshot",
            AdapterHealth::Healthy,
            Some(format!(
                "{} claims, {} patients, {} coverage rules",
                self.claim_count(),
                self.patient_count(),
                self.rule_count()
            )),
        )
    }
}
