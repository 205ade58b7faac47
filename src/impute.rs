//! Bucketed mean imputation.
//!
//! Missing numeric fields are filled with the mean of their *bucket*: the
//! group of records sharing coarsened values of two other covariates. Bucket
//! keys are computed once per pass as an explicit derived column aligned with
//! the table, then group means are aggregated and broadcast back into the
//! missing rows: never recomputed per row.
//!
//! # Pass Order
//!
//! The pass order is fixed and load-bearing:
//!
//! 1. `CSCORE_B`, bucketed by (`OCLTV` @ 20, `ORIG_RT` @ 1): pre-imputation
//!    values of the bucketing fields;
//! 2. `DTI`, bucketed by (`CSCORE_B` @ 50, `ORIG_RT` @ 1): the score may
//!    already be imputed by pass 1;
//! 3. `OCLTV`, bucketed by (`CSCORE_B` @ 50, `DTI` @ 20);
//! 4. a global-mean sweep over all three fields for rows whose bucket had no
//!    informative members.
//!
//! A record whose bucketing field is itself missing substitutes the overall
//! column mean (rounded at the same granularity) for key formation, so every
//! record resolves to some bucket. A bucket with no non-missing target
//! values leaves the row unfilled; those rows are counted, surfaced in the
//! pass report, and resolved only by the explicit global sweep: never
//! silently zero-filled.

use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::table::{LoanRecord, LoanTable};

/// Rounding granularities for bucket-key formation.
const SCORE_STEP: f64 = 50.0;
const RATIO_STEP: f64 = 20.0;
const RATE_STEP: f64 = 1.0;

/// Fields that receive bucketed imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImputeField {
    CreditScore,
    Dti,
    Ocltv,
}

/// The required pass order: score first, then the ratio fields that bucket
/// on the possibly-imputed score.
pub const IMPUTATION_ORDER: [ImputeField; 3] =
    [ImputeField::CreditScore, ImputeField::Dti, ImputeField::Ocltv];

impl ImputeField {
    pub fn column(self) -> &'static str {
        match self {
            Self::CreditScore => "CSCORE_B",
            Self::Dti => "DTI",
            Self::Ocltv => "OCLTV",
        }
    }

    #[inline]
    fn get(self, record: &LoanRecord) -> Option<f64> {
        match self {
            Self::CreditScore => record.cscore_b,
            Self::Dti => record.dti,
            Self::Ocltv => record.ocltv,
        }
    }

    #[inline]
    fn set(self, record: &mut LoanRecord, value: f64) {
        match self {
            Self::CreditScore => record.cscore_b = Some(value),
            Self::Dti => record.dti = Some(value),
            Self::Ocltv => record.ocltv = Some(value),
        }
    }

    /// The two bucketing dimensions for this target field.
    fn bucket_dims(self) -> [BucketDim; 2] {
        match self {
            Self::CreditScore => [BucketDim::Ocltv, BucketDim::OrigRate],
            Self::Dti => [BucketDim::CreditScore, BucketDim::OrigRate],
            Self::Ocltv => [BucketDim::CreditScore, BucketDim::Dti],
        }
    }
}

/// A covariate used for bucketing, with its coarsening step.
#[derive(Debug, Clone, Copy)]
enum BucketDim {
    CreditScore,
    Dti,
    Ocltv,
    OrigRate,
}

impl BucketDim {
    #[inline]
    fn get(self, record: &LoanRecord) -> Option<f64> {
        match self {
            Self::CreditScore => record.cscore_b,
            Self::Dti => record.dti,
            Self::Ocltv => record.ocltv,
            Self::OrigRate => Some(record.orig_rt),
        }
    }

    #[inline]
    fn step(self) -> f64 {
        match self {
            Self::CreditScore => SCORE_STEP,
            Self::Dti | Self::Ocltv => RATIO_STEP,
            Self::OrigRate => RATE_STEP,
        }
    }
}

/// Coarsened composite bucket key. Used only for grouping, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey(i64, i64);

/// Round a value to the nearest multiple of `step`.
#[inline]
fn coarsen(value: f64, step: f64) -> i64 {
    ((value / step).round() * step) as i64
}

/// Mean of the non-missing values of one column, or `None` if the column is
/// entirely empty.
fn column_mean(records: &[LoanRecord], get: impl Fn(&LoanRecord) -> Option<f64>) -> Option<f64> {
    let values: Vec<f64> = records.iter().filter_map(&get).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Statistics from one bucketed imputation pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub column: &'static str,
    /// Rows missing the target field before the pass.
    pub missing_before: usize,
    /// Rows filled from a bucket mean.
    pub filled: usize,
    /// Rows whose bucket had no informative members; left missing for the
    /// global sweep.
    pub unresolved: usize,
    /// Distinct buckets with at least one informative member.
    pub buckets: usize,
}

/// One bucketed pass over a single target field.
///
/// Derived key column → group aggregate → broadcast. Coarse fallback values
/// for missing bucketing fields are fixed before the pass so every row keys
/// deterministically.
pub fn impute_field(table: &mut LoanTable, field: ImputeField) -> PassReport {
    let dims = field.bucket_dims();

    // Fallback coarse value per bucketing dimension: the overall column mean
    // rounded at the dimension's own step. An entirely-empty bucketing
    // column degenerates to a single shared coarse value.
    let fallbacks: [i64; 2] = [
        column_mean(table.records(), |r| dims[0].get(r))
            .map(|m| coarsen(m, dims[0].step()))
            .unwrap_or(0),
        column_mean(table.records(), |r| dims[1].get(r))
            .map(|m| coarsen(m, dims[1].step()))
            .unwrap_or(0),
    ];

    // 1. Explicit derived bucket-key column, aligned with table rows.
    let keys: Vec<BucketKey> = table
        .records()
        .iter()
        .map(|record| {
            BucketKey(
                dims[0]
                    .get(record)
                    .map(|v| coarsen(v, dims[0].step()))
                    .unwrap_or(fallbacks[0]),
                dims[1]
                    .get(record)
                    .map(|v| coarsen(v, dims[1].step()))
                    .unwrap_or(fallbacks[1]),
            )
        })
        .collect();

    // 2. Group aggregate: sum/count of non-missing target values per bucket.
    let mut groups: HashMap<BucketKey, (f64, u32)> = HashMap::new();
    for (record, key) in table.records().iter().zip(&keys) {
        if let Some(value) = field.get(record) {
            let entry = groups.entry(*key).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    // 3. Broadcast bucket means into the missing rows.
    let mut report = PassReport {
        column: field.column(),
        missing_before: 0,
        filled: 0,
        unresolved: 0,
        buckets: groups.len(),
    };
    for (record, key) in table.records_mut().iter_mut().zip(&keys) {
        if field.get(record).is_some() {
            continue;
        }
        report.missing_before += 1;
        match groups.get(key) {
            Some((sum, count)) => {
                field.set(record, sum / f64::from(*count));
                report.filled += 1;
            }
            None => report.unresolved += 1,
        }
    }

    debug!(
        column = report.column,
        missing = report.missing_before,
        filled = report.filled,
        unresolved = report.unresolved,
        buckets = report.buckets,
        "bucketed imputation pass"
    );
    report
}

/// Statistics from the global-mean fallback over one column.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub column: &'static str,
    pub filled: usize,
    /// Non-zero only when the whole column was empty.
    pub still_missing: usize,
}

/// Global-mean fallback pass: fills whatever the bucketed passes could not
/// resolve. Runs once, outside bucketing, after all bucketed passes.
pub fn global_mean_sweep(table: &mut LoanTable) -> Vec<SweepReport> {
    IMPUTATION_ORDER
        .iter()
        .map(|&field| {
            let mean = column_mean(table.records(), |r| field.get(r));
            let mut report = SweepReport {
                column: field.column(),
                filled: 0,
                still_missing: 0,
            };
            for record in table.records_mut() {
                if field.get(record).is_some() {
                    continue;
                }
                match mean {
                    Some(value) => {
                        field.set(record, value);
                        report.filled += 1;
                    }
                    None => report.still_missing += 1,
                }
            }
            report
        })
        .collect()
}

/// Aggregate report for the whole imputation stage.
#[derive(Debug, Clone, Serialize)]
pub struct ImputationReport {
    pub passes: Vec<PassReport>,
    pub sweeps: Vec<SweepReport>,
}

impl ImputationReport {
    /// Rows left missing by the bucketed passes (resolved by the sweep
    /// unless the whole column was empty).
    pub fn unresolved_after_buckets(&self) -> usize {
        self.passes.iter().map(|p| p.unresolved).sum()
    }

    /// Rows still missing after the global sweep.
    pub fn still_missing(&self) -> usize {
        self.sweeps.iter().map(|s| s.still_missing).sum()
    }
}

/// The full imputation stage: three ordered bucketed passes, then the
/// global-mean sweep.
pub fn run_imputation(table: &mut LoanTable) -> ImputationReport {
    let passes: Vec<PassReport> = IMPUTATION_ORDER
        .iter()
        .map(|&field| impute_field(table, field))
        .collect();
    let sweeps = global_mean_sweep(table);

    let report = ImputationReport { passes, sweeps };
    info!(
        filled = report.passes.iter().map(|p| p.filled).sum::<usize>(),
        fallback = report.unresolved_after_buckets(),
        still_missing = report.still_missing(),
        "imputation complete"
    );
    report
}
