//! Property-Based Test Generators
//!
//! Provides proptest strategies for claim data that keep the fields a test is
//! not exercising valid.

use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_claims::ClaimRecord;

use crate::builders::ClaimRecordBuilder;

/// Strategy for strictly positive amounts with two decimal places
pub fn positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for positive amounts spanning cents up to about 1e20
pub fn wide_amount_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        positive_amount_strategy(),
        (1i64..10_000i64, 0u32..=18u32)
            .prop_map(|(mantissa, exponent)| Decimal::from_i128_with_scale(
                i128::from(mantissa) * 10i128.pow(exponent),
                2
            )),
    ]
}

/// Strategy for zero or negative amounts
pub fn non_positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..=0i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for procedure codes with a recognised prefix
pub fn procedure_code_strategy() -> impl Strategy<Value = String> {
    (prop_oneof![Just("CPT_"), Just("HCPCS_")], "[A-Z0-9]{1,6}")
        .prop_map(|(prefix, body)| format!("{}{}", prefix, body))
}

/// Strategy for codes that do not start with `CPT_`, `HCPCS_` or `ICD10_`
pub fn unprefixed_code_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2,4}[0-9]{1,4}".prop_filter("must not carry a known prefix", |code| {
        !code.starts_with("CPT") && !code.starts_with("HCPCS") && !code.starts_with("ICD")
    })
}

/// Strategy for the optional claim columns validation treats as mandatory
pub fn mandatory_column_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("patient_id"),
        Just("procedure_code"),
        Just("diagnosis_code"),
        Just("claim_amount"),
        Just("date"),
        Just("provider"),
    ]
}

/// Strategy for valid claims by patient `P1` with a random id and amount
pub fn valid_claim_strategy() -> impl Strategy<Value = ClaimRecord> {
    ("C[0-9]{1,6}", positive_amount_strategy(), procedure_code_strategy()).prop_map(
        |(id, amount, procedure)| {
            ClaimRecordBuilder::new(&id)
                .with_amount(amount)
                .with_procedure(&procedure)
                .build()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_positive_amounts_are_positive(amount in positive_amount_strategy()) {
            prop_assert!(amount > Decimal::ZERO);
        }

        #[test]
        fn test_wide_amounts_are_positive_and_bounded(amount in wide_amount_strategy()) {
            prop_assert!(amount > Decimal::ZERO);
            prop_assert!(amount < Decimal::from(10i64.pow(18)) * Decimal::from(100));
        }

        #[test]
        fn test_unprefixed_codes_lack_prefix(code in unprefixed_code_strategy()) {
            prop_assert!(!code.starts_with("CPT_"));
            prop_assert!(!code.starts_with("ICD10_"));
        }
    }
}
