//! CSV snapshot loading
//!
//! Reads the three source tables by header name. Columns may appear in any
//! order, unknown columns are ignored, and blank cells load as `None` so that
//! validation can report them instead of the loader rejecting the row.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use tracing::info;

use domain_claims::{ClaimRecord, CoverageRule, DataSnapshot, PatientRecord};

use crate::error::DataError;

pub const PATIENTS_FILE: &str = "patients.csv";
pub const CLAIMS_FILE: &str = "claims.csv";
pub const RULES_FILE: &str = "insurance_rules.csv";

/// Loads `patients.csv`, `claims.csv`, and `insurance_rules.csv` from `dir`
///
/// # Errors
///
/// Returns `DataError::Io` if a file is missing or unreadable and
/// `DataError::Csv` if a row cannot be parsed.
pub fn load_snapshot(dir: impl AsRef<Path>) -> Result<DataSnapshot, DataError> {
    let dir = dir.as_ref();
    let open = |name: &str| {
        let path = dir.join(name);
        File::open(&path).map_err(|e| DataError::io(path, e))
    };

    let snapshot = snapshot_from_readers(open(CLAIMS_FILE)?, open(PATIENTS_FILE)?, open(RULES_FILE)?)?;
    info!(
        dir = %dir.display(),
        claims = snapshot.claim_count(),
        patients = snapshot.patient_count(),
        rules = snapshot.rule_count(),
        "Data snapshot loaded"
    );
    Ok(snapshot)
}

/// Builds a snapshot from any three CSV sources
pub fn snapshot_from_readers<C, P, R>(claims: C, patients: P, rules: R) -> Result<DataSnapshot, DataError>
where
    C: Read,
    P: Read,
    R: Read,
{
    let claims: Vec<ClaimRecord> = read_table(claims, CLAIMS_FILE)?;
    let patients: Vec<PatientRecord> = read_table(patients, PATIENTS_FILE)?;
    let rules: Vec<CoverageRule> = read_table(rules, RULES_FILE)?;
    Ok(DataSnapshot::new(claims, patients, rules))
}

fn read_table<T, R>(source: R, table: &str) -> Result<Vec<T>, DataError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source);

    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| DataError::csv(table, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::ClaimDataStore;
    use rust_decimal_macros::dec;

    const PATIENTS: &str = "patient_id,name,age,gender,plan_id\nP1,Jane Doe,45,F,PLAN_GOLD\n";
    const RULES: &str = "plan_id,procedure_code,covered,prior_auth_required,min_age,max_age,gender,notes\n\
                         PLAN_GOLD,CPT_99213,Yes,No,0,120,Any,\n";

    #[test]
    fn test_reads_columns_by_header() {
        let claims = "provider,claim_amount,claim_id,patient_id,procedure_code,procedure_name,diagnosis_code,date\n\
                      City Clinic,100.50,C1,P1,CPT_99213,Office visit,ICD10_J45,2024-03-01\n";
        let snapshot = snapshot_from_readers(claims.as_bytes(), PATIENTS.as_bytes(), RULES.as_bytes()).unwrap();

        let claim = snapshot.get_claim("C1").unwrap();
        assert_eq!(claim.claim_amount, Some(dec!(100.50)));
        assert_eq!(claim.provider.as_deref(), Some("City Clinic"));
        assert!(snapshot.get_rule("PLAN_GOLD", "CPT_99213").unwrap().notes.is_none());
    }

    #[test]
    fn test_blank_cells_load_as_none() {
        let claims = "claim_id,patient_id,procedure_code,diagnosis_code,claim_amount,date,provider\n\
                      C1,P1,CPT_99213,,100,2024-03-01,  \n";
        let snapshot = snapshot_from_readers(claims.as_bytes(), PATIENTS.as_bytes(), RULES.as_bytes()).unwrap();

        let claim = snapshot.get_claim("C1").unwrap();
        assert!(claim.diagnosis_code.is_none());
        assert!(claim.provider.is_none());
        assert!(claim.procedure_name.is_none());
    }

    #[test]
    fn test_unparseable_amount_is_an_error() {
        let claims = "claim_id,claim_amount\nC1,lots\n";
        let err = snapshot_from_readers(claims.as_bytes(), PATIENTS.as_bytes(), RULES.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Csv { ref table, .. } if table == CLAIMS_FILE));
    }
}
