//! Fraud screening
//!
//! Three deterministic checks, all evaluated, over the claims table:
//!
//! - **High amount**: amount above a fixed threshold
//! - **Duplicate**: same patient, procedure, provider, and date under another id
//! - **Outlier**: amount more than `outlier_factor` sample standard deviations
//!   from the population mean
//!
//! Triggered messages are joined with `"; "`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::ClaimId;

use crate::ports::ClaimDataStore;
use crate::records::ClaimRecord;

/// Thresholds for fraud screening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudPolicy {
    /// Amounts strictly above this are flagged
    pub high_amount_threshold: Decimal,
    /// Standard deviations from the mean before an amount is anomalous
    pub outlier_factor: Decimal,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            high_amount_threshold: dec!(50000),
            outlier_factor: dec!(3),
        }
    }
}

/// Result of screening one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudResult {
    pub claim_id: ClaimId,
    pub fraud_flag: bool,
    pub reason: Option<String>,
}

impl FraudResult {
    fn clear(claim_id: ClaimId) -> Self {
        Self {
            claim_id,
            fraud_flag: false,
            reason: None,
        }
    }
}

/// Mean and sample variance of all known claim amounts
#[derive(Debug, Clone, Copy, PartialEq)]
enum AmountStats {
    Exact { mean: Decimal, variance: Decimal },
    /// Used once a decimal step overflows
    Approximate { mean: f64, variance: f64 },
}

impl AmountStats {
    /// `None` with fewer than two amounts, where sample variance is undefined
    fn from_claims(claims: &[ClaimRecord]) -> Option<Self> {
        let amounts: Vec<Decimal> = claims.iter().filter_map(|c| c.claim_amount).collect();
        if amounts.len() < 2 {
            return None;
        }

        Self::exact(&amounts).or_else(|| {
            warn!(count = amounts.len(), "Claim amount statistics overflow decimal range, using f64");
            Self::approximate(&amounts)
        })
    }

    fn exact(amounts: &[Decimal]) -> Option<Self> {
        let count = Decimal::from(amounts.len());
        let sum = amounts
            .iter()
            .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount))?;
        let mean = sum.checked_div(count)?;
        let squared = amounts.iter().try_fold(Decimal::ZERO, |acc, amount| {
            let deviation = amount.checked_sub(mean)?;
            acc.checked_add(deviation.checked_mul(deviation)?)
        })?;
        let variance = squared.checked_div(count - Decimal::ONE)?;
        Some(Self::Exact { mean, variance })
    }

    fn approximate(amounts: &[Decimal]) -> Option<Self> {
        let values = amounts.iter().map(|a| a.to_f64()).collect::<Option<Vec<f64>>>()?;
        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0);
        Some(Self::Approximate { mean, variance })
    }

    /// |amount - mean| > factor * stddev, compared on squares
    fn is_outlier(&self, amount: Decimal, factor: Decimal) -> bool {
        let verdict = match *self {
            Self::Exact { mean, variance } => {
                let deviation = amount.checked_sub(mean).and_then(|d| d.checked_mul(d));
                let limit = factor.checked_mul(factor).and_then(|f| f.checked_mul(variance));
                match deviation.zip(limit) {
                    Some((deviation, limit)) => Some(deviation > limit),
                    None => mean
                        .to_f64()
                        .zip(variance.to_f64())
                        .and_then(|(mean, variance)| exceeds_spread(amount, mean, variance, factor)),
                }
            }
            Self::Approximate { mean, variance } => exceeds_spread(amount, mean, variance, factor),
        };

        verdict.unwrap_or_else(|| {
            warn!(%amount, %factor, "Outlier check skipped, amount not representable");
            false
        })
    }

    fn mean_label(&self) -> String {
        match *self {
            Self::Exact { mean, .. } => format!("{:.2}", mean.round_dp(2)),
            Self::Approximate { mean, .. } => format!("{:.2}", mean),
        }
    }
}

fn exceeds_spread(amount: Decimal, mean: f64, variance: f64, factor: Decimal) -> Option<bool> {
    let deviation = amount.to_f64()? - mean;
    let factor = factor.to_f64()?;
    Some(deviation * deviation > factor * factor * variance)
}

/// Screens one claim against the whole claims table.
///
/// An unknown claim id is a soft failure: `fraud_flag=false`, reason
/// `"Claim not found"`.
pub fn screen_claim(store: &dyn ClaimDataStore, claim_id: &str, policy: &FraudPolicy) -> FraudResult {
    let Some(claim) = store.get_claim(claim_id) else {
        return FraudResult {
            claim_id: ClaimId::new(claim_id),
            fraud_flag: false,
            reason: Some("Claim not found".to_string()),
        };
    };

    let mut flags = Vec::new();

    if let Some(amount) = claim.claim_amount {
        if amount > policy.high_amount_threshold {
            flags.push(format!("High billed amount: ${}", amount));
        }
    }

    let duplicates: Vec<&str> = store
        .all_claims()
        .iter()
        .filter(|other| claim.is_duplicate_of(other))
        .map(|other| other.claim_id.as_str())
        .collect();
    if !duplicates.is_empty() {
        flags.push(format!("Duplicate claim(s) found: {}", duplicates.join(", ")));
    }

    if let (Some(amount), Some(stats)) = (claim.claim_amount, AmountStats::from_claims(store.all_claims())) {
        if stats.is_outlier(amount, policy.outlier_factor) {
            flags.push(format!(
                "Anomalous claim amount: ${} (mean: ${})",
                amount,
                stats.mean_label()
            ));
        }
    }

    if flags.is_empty() {
        info!(claim_id, "Fraud screen clear");
        return FraudResult::clear(claim.claim_id.clone());
    }

    info!(claim_id, flags = flags.len(), "Fraud screen flagged claim");
    FraudResult {
        claim_id: claim.claim_id.clone(),
        fraud_flag: true,
        reason: Some(flags.join("; ")),
    }
}
