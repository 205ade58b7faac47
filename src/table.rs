//! Loan table input model and the augmented output contract.
//!
//! [`LoanRecord`] is the unit the pipeline mutates: the three imputable
//! numeric fields are filled in place, and derived fields are appended as
//! the stages run. [`FeatureRow`] is the serialized output shape: its field
//! order and serde renames ARE the compatibility contract for downstream
//! regression consumers, pinned by [`OUTPUT_COLUMNS`] and a test.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::calendar::{format_month_year, parse_month_year};
use crate::error::PrepError;

/// Unique, stable loan identifier.
pub type LoanId = u64;

/// A single loan-level record.
///
/// `ocltv`, `dti` and `cscore_b` are `None` where the source left them
/// missing; imputation fills them in place. Everything below the derived
/// marker is populated by the pipeline and meaningless on input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_id: LoanId,
    pub orig_amt: f64,
    pub orig_rt: f64,
    /// Origination date, month granularity (day pinned to 1).
    pub orig_dte: NaiveDate,
    pub ocltv: Option<f64>,
    pub dti: Option<f64>,
    pub cscore_b: Option<f64>,
    /// Two-letter state code.
    pub state: String,

    // ---- derived fields, filled by the pipeline ----
    #[serde(default)]
    pub ca_fl: u8,
    #[serde(default)]
    pub orig_benchmk: Option<f64>,
    #[serde(default)]
    pub sato: Option<f64>,
    /// HPI min-ratio features for the three response windows, in window order.
    #[serde(default)]
    pub hpi_windows: [Option<f64>; 3],
    /// Benchmark-rate max-drop features for the three response windows.
    #[serde(default)]
    pub rate_windows: [Option<f64>; 3],
    #[serde(default)]
    pub default_code: Option<u16>,
    #[serde(default)]
    pub default_date: Option<NaiveDate>,
    #[serde(default)]
    pub response: u8,
}

impl LoanRecord {
    /// Construct from already-parsed source fields.
    ///
    /// The origination date is the raw `"MM/YYYY"` text; a parse failure is
    /// the hard [`PrepError::MalformedDate`]: a precondition violation, not
    /// a recoverable per-row gap.
    #[allow(clippy::too_many_arguments)]
    pub fn from_source(
        loan_id: LoanId,
        orig_amt: f64,
        orig_rt: f64,
        orig_dte: &str,
        ocltv: Option<f64>,
        dti: Option<f64>,
        cscore_b: Option<f64>,
        state: impl Into<String>,
    ) -> Result<Self, PrepError> {
        Ok(Self {
            loan_id,
            orig_amt,
            orig_rt,
            orig_dte: parse_month_year(orig_dte, "ORIG_DTE")?,
            ocltv,
            dti,
            cscore_b,
            state: state.into(),
            ca_fl: 0,
            orig_benchmk: None,
            sato: None,
            hpi_windows: [None; 3],
            rate_windows: [None; 3],
            default_code: None,
            default_date: None,
            response: 0,
        })
    }
}

/// The loan table: exclusively owned and mutated by the pipeline.
///
/// Construction enforces identifier uniqueness; row order is preserved from
/// input to output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTable {
    records: Vec<LoanRecord>,
}

impl LoanTable {
    pub fn new(records: Vec<LoanRecord>) -> Result<Self, PrepError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.loan_id) {
                return Err(PrepError::DuplicateLoanId {
                    loan_id: record.loan_id,
                });
            }
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LoanRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [LoanRecord] {
        &mut self.records
    }
}

/// Output column names, in contract order.
pub const OUTPUT_COLUMNS: [&str; 20] = [
    "LOAN_ID",
    "ORIG_AMT",
    "ORIG_RT",
    "ORIG_DTE",
    "OCLTV",
    "DTI",
    "CSCORE_B",
    "STATE",
    "CA-FL",
    "ORIG_BENCHMK",
    "SATO",
    "HPI-Y1&2",
    "HPI-Y3&4",
    "HPI-Y5&6",
    "Rate-Y1&2",
    "Rate-Y3&4",
    "Rate-Y5&6",
    "DEFAULT.CODE",
    "DEFAULT.DATE",
    "RESPONSE",
];

/// One fully-assembled output row.
///
/// Serde field order here must match [`OUTPUT_COLUMNS`] exactly.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRow {
    #[serde(rename = "LOAN_ID")]
    pub loan_id: LoanId,
    #[serde(rename = "ORIG_AMT")]
    pub orig_amt: f64,
    #[serde(rename = "ORIG_RT")]
    pub orig_rt: f64,
    #[serde(rename = "ORIG_DTE")]
    pub orig_dte: String,
    #[serde(rename = "OCLTV")]
    pub ocltv: Option<f64>,
    #[serde(rename = "DTI")]
    pub dti: Option<f64>,
    #[serde(rename = "CSCORE_B")]
    pub cscore_b: Option<f64>,
    #[serde(rename = "STATE")]
    pub state: String,
    #[serde(rename = "CA-FL")]
    pub ca_fl: u8,
    #[serde(rename = "ORIG_BENCHMK")]
    pub orig_benchmk: Option<f64>,
    #[serde(rename = "SATO")]
    pub sato: Option<f64>,
    #[serde(rename = "HPI-Y1&2")]
    pub hpi_y1_2: Option<f64>,
    #[serde(rename = "HPI-Y3&4")]
    pub hpi_y3_4: Option<f64>,
    #[serde(rename = "HPI-Y5&6")]
    pub hpi_y5_6: Option<f64>,
    #[serde(rename = "Rate-Y1&2")]
    pub rate_y1_2: Option<f64>,
    #[serde(rename = "Rate-Y3&4")]
    pub rate_y3_4: Option<f64>,
    #[serde(rename = "Rate-Y5&6")]
    pub rate_y5_6: Option<f64>,
    #[serde(rename = "DEFAULT.CODE")]
    pub default_code: Option<u16>,
    #[serde(rename = "DEFAULT.DATE")]
    pub default_date: Option<NaiveDate>,
    #[serde(rename = "RESPONSE")]
    pub response: u8,
}

impl FeatureRow {
    /// Project a fully-processed loan record into the output shape.
    pub fn from_record(record: &LoanRecord) -> Self {
        Self {
            loan_id: record.loan_id,
            orig_amt: record.orig_amt,
            orig_rt: record.orig_rt,
            orig_dte: format_month_year(record.orig_dte),
            ocltv: record.ocltv,
            dti: record.dti,
            cscore_b: record.cscore_b,
            state: record.state.clone(),
            ca_fl: record.ca_fl,
            orig_benchmk: record.orig_benchmk,
            sato: record.sato,
            hpi_y1_2: record.hpi_windows[0],
            hpi_y3_4: record.hpi_windows[1],
            hpi_y5_6: record.hpi_windows[2],
            rate_y1_2: record.rate_windows[0],
            rate_y3_4: record.rate_windows[1],
            rate_y5_6: record.rate_windows[2],
            default_code: record.default_code,
            default_date: record.default_date,
            response: record.response,
        }
    }
}

/// The assembled output table, row order preserved from the input.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn from_rows(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: LoanId) -> LoanRecord {
        LoanRecord::from_source(id, 150_000.0, 6.25, "01/2005", Some(80.0), Some(30.0), Some(720.0), "FL")
            .unwrap()
    }

    #[test]
    fn test_from_source_parses_orig_date() {
        let r = record(1);
        assert_eq!(r.orig_dte, NaiveDate::from_ymd_opt(2005, 1, 1).unwrap());
        assert_eq!(r.response, 0);
        assert_eq!(r.hpi_windows, [None; 3]);
    }

    #[test]
    fn test_from_source_rejects_malformed_date() {
        let err =
            LoanRecord::from_source(1, 150_000.0, 6.25, "2005/01/01", None, None, None, "FL")
                .unwrap_err();
        assert!(matches!(err, PrepError::MalformedDate { .. }));
    }

    #[test]
    fn test_table_rejects_duplicate_ids() {
        let err = LoanTable::new(vec![record(7), record(7)]).unwrap_err();
        assert_eq!(err, PrepError::DuplicateLoanId { loan_id: 7 });
    }

    #[test]
    fn test_output_column_contract_order() {
        // The serialized field order of FeatureRow is the downstream
        // contract; pin it against OUTPUT_COLUMNS.
        let row = FeatureRow::from_record(&record(1));
        let json = serde_json::to_string(&row).unwrap();

        let mut last = 0;
        for column in OUTPUT_COLUMNS {
            let needle = format!("\"{}\"", column);
            let pos = json
                .find(&needle)
                .unwrap_or_else(|| panic!("column {} missing from output", column));
            assert!(pos >= last, "column {} out of contract order", column);
            last = pos;
        }
    }

    #[test]
    fn test_feature_row_projection() {
        let mut r = record(9);
        r.ca_fl = 1;
        r.sato = Some(0.38);
        r.hpi_windows = [Some(0.9), Some(0.8), None];
        r.response = 2;

        let row = FeatureRow::from_record(&r);
        assert_eq!(row.orig_dte, "01/2005");
        assert_eq!(row.hpi_y1_2, Some(0.9));
        assert_eq!(row.hpi_y5_6, None);
        assert_eq!(row.response, 2);
    }
}
