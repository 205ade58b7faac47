//! Pipeline orchestration: fixed-order stages over the loan table.
//!
//! ```text
//! LoanTable (validated: unique ids, parsed dates)
//!    ↓
//! Imputation          (ordered bucketed passes + global sweep)
//!    ↓
//! Covariates          (CA-FL flag, ORIG_BENCHMK, SATO)
//!    ↓
//! Window features     (region remap → 3 windows × {HPI, rate}, rayon sweep)
//!    ↓
//! Event labeling      (indexed terminal-event join → RESPONSE)
//!    ↓
//! FeatureTable        (output-column contract, input row order)
//! ```
//!
//! No stage may be skipped or reordered without changing the output: later
//! imputation passes bucket on earlier fills, and the labeler reads the
//! origination dates the table was constructed with. The orchestrator's own
//! logic is sequencing, error propagation and report assembly: nothing
//! else.
//!
//! The per-loan window/label sweeps are parallelized by row: each loan's
//! derived fields depend only on its own record plus the shared read-only
//! series and event index, so parallel execution cannot alter results.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::covariates::{apply_origination_covariates, hpi_region, CovariateReport};
use crate::error::PrepError;
use crate::impute::{run_imputation, ImputationReport};
use crate::label::{EventIndex, EventRecord};
use crate::series::{ReferenceSeries, RegionalSeries};
use crate::table::{FeatureRow, FeatureTable, LoanTable};
use crate::windows::{hpi_window_ratio, rate_window_drop, RESPONSE_WINDOWS};

/// Aggregate statistics for one preparation run.
#[derive(Debug, Clone, Serialize)]
pub struct PrepReport {
    pub loans: usize,
    pub imputation: ImputationReport,
    pub covariates: CovariateReport,
    /// Window features left missing because the start month was absent from
    /// the series (counted per window slot, per loan).
    pub missing_hpi_windows: usize,
    pub missing_rate_windows: usize,
    pub loans_with_terminal_event: usize,
    /// Response-label distribution, indexed by label 0..=3.
    pub label_counts: [usize; 4],
}

/// Run the full preparation pipeline over a loan table.
///
/// Consumes the table (the pipeline is its exclusive owner for the run) and
/// returns the assembled feature table plus the run report. Structural
/// errors abort with the offending record identified; data gaps degrade to
/// missing values and show up in the report.
pub fn run(
    mut loans: LoanTable,
    events: &[EventRecord],
    benchmark: &ReferenceSeries,
    hpi: &RegionalSeries,
) -> Result<(FeatureTable, PrepReport), PrepError> {
    info!(loans = loans.len(), events = events.len(), "preparation run started");

    let imputation = run_imputation(&mut loans);
    let covariates = apply_origination_covariates(&mut loans, benchmark);
    apply_window_features(&mut loans, benchmark, hpi)?;

    let index = EventIndex::build(events);
    apply_labels(&mut loans, &index);

    let report = build_report(&loans, imputation, covariates, &index);
    let rows: Vec<FeatureRow> = loans.records().iter().map(FeatureRow::from_record).collect();

    info!(
        loans = report.loans,
        terminal = report.loans_with_terminal_event,
        "preparation run complete"
    );
    Ok((FeatureTable::from_rows(rows), report))
}

/// Window-feature sweep: region remap, then three windows against each of
/// the two reference series. Parallel by loan row.
fn apply_window_features(
    table: &mut LoanTable,
    benchmark: &ReferenceSeries,
    hpi: &RegionalSeries,
) -> Result<(), PrepError> {
    table.records_mut().par_iter_mut().try_for_each(|record| {
        let region = hpi_region(&record.state);
        let series = hpi.get(region).ok_or_else(|| PrepError::UnmappedRegion {
            loan_id: record.loan_id,
            state: record.state.clone(),
        })?;

        for (slot, window) in RESPONSE_WINDOWS.iter().enumerate() {
            record.hpi_windows[slot] = hpi_window_ratio(series, record.orig_dte, *window);
            record.rate_windows[slot] = rate_window_drop(benchmark, record.orig_dte, *window);
        }
        Ok(())
    })
}

/// Terminal-event extraction and response labeling. Parallel by loan row.
fn apply_labels(table: &mut LoanTable, index: &EventIndex) {
    table.records_mut().par_iter_mut().for_each(|record| {
        if let Some(event) = index.terminal_event(record.loan_id) {
            record.default_code = event.code;
            record.default_date = Some(event.date);
        }
        record.response =
            crate::label::response_label(record.default_code, record.default_date, record.orig_dte);
    });
}

fn build_report(
    loans: &LoanTable,
    imputation: ImputationReport,
    covariates: CovariateReport,
    index: &EventIndex,
) -> PrepReport {
    let mut report = PrepReport {
        loans: loans.len(),
        imputation,
        covariates,
        missing_hpi_windows: 0,
        missing_rate_windows: 0,
        loans_with_terminal_event: 0,
        label_counts: [0; 4],
    };

    for record in loans.records() {
        report.missing_hpi_windows += record.hpi_windows.iter().filter(|w| w.is_none()).count();
        report.missing_rate_windows += record.rate_windows.iter().filter(|w| w.is_none()).count();
        if index.terminal_event(record.loan_id).is_some() {
            report.loans_with_terminal_event += 1;
        }
        report.label_counts[usize::from(record.response)] += 1;
    }
    report
}
