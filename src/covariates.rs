//! Origination covariates: region flag, benchmark at origination, SATO.

use serde::Serialize;
use tracing::debug;

use crate::calendar::MonthKey;
use crate::series::ReferenceSeries;
use crate::table::LoanTable;

/// States whose loans carry the preferred-region flag.
pub const PREFERRED_STATES: [&str; 2] = ["CA", "FL"];

/// Region code used for HPI lookups.
///
/// PR and VI have no HPI series; both are approximated by HI. Their share of
/// the pool is negligible, so the substitution is an accepted approximation
/// rather than a data gap. Every other state maps to itself.
#[inline]
pub fn hpi_region(state: &str) -> &str {
    match state {
        "PR" | "VI" => "HI",
        other => other,
    }
}

/// 1 iff the state is in the preferred set. Pure total function.
#[inline]
pub fn region_flag(state: &str) -> u8 {
    u8::from(PREFERRED_STATES.contains(&state))
}

/// Statistics from the covariate stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CovariateReport {
    pub flagged: usize,
    /// Loans whose origination month is absent from the benchmark series:
    /// SATO and ORIG_BENCHMK stay missing (data gap, not a failure).
    pub missing_benchmark: usize,
}

/// Fill the region flag, benchmark-at-origination and SATO for every loan.
pub fn apply_origination_covariates(
    table: &mut LoanTable,
    benchmark: &ReferenceSeries,
) -> CovariateReport {
    let mut report = CovariateReport::default();

    for record in table.records_mut() {
        record.ca_fl = region_flag(&record.state);
        report.flagged += usize::from(record.ca_fl == 1);

        match benchmark.value_at(MonthKey::from_date(record.orig_dte)) {
            Some(rate) => {
                record.orig_benchmk = Some(rate);
                record.sato = Some(record.orig_rt - rate);
            }
            None => report.missing_benchmark += 1,
        }
    }

    debug!(
        flagged = report.flagged,
        missing_benchmark = report.missing_benchmark,
        "origination covariates applied"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{LoanRecord, LoanTable};
    use chrono::NaiveDate;

    #[test]
    fn test_region_flag_is_pure_and_total() {
        assert_eq!(region_flag("CA"), 1);
        assert_eq!(region_flag("FL"), 1);
        assert_eq!(region_flag("TX"), 0);
        assert_eq!(region_flag(""), 0);
        assert_eq!(region_flag("ca"), 0);
    }

    #[test]
    fn test_hpi_region_remap() {
        assert_eq!(hpi_region("PR"), "HI");
        assert_eq!(hpi_region("VI"), "HI");
        assert_eq!(hpi_region("HI"), "HI");
        assert_eq!(hpi_region("CA"), "CA");
    }

    #[test]
    fn test_sato_from_benchmark() {
        let benchmark = ReferenceSeries::from_points(
            "PMMS",
            vec![(NaiveDate::from_ymd_opt(2005, 1, 25).unwrap(), 5.87)],
        )
        .unwrap();

        let mut table = LoanTable::new(vec![
            LoanRecord::from_source(1, 150_000.0, 6.25, "01/2005", None, None, None, "FL").unwrap(),
            // Origination month missing from the series: SATO stays None.
            LoanRecord::from_source(2, 150_000.0, 6.25, "02/2005", None, None, None, "TX").unwrap(),
        ])
        .unwrap();

        let report = apply_origination_covariates(&mut table, &benchmark);

        let r1 = &table.records()[0];
        assert_eq!(r1.ca_fl, 1);
        assert_eq!(r1.orig_benchmk, Some(5.87));
        assert!((r1.sato.unwrap() - 0.38).abs() < 1e-9);

        let r2 = &table.records()[1];
        assert_eq!(r2.ca_fl, 0);
        assert_eq!(r2.orig_benchmk, None);
        assert_eq!(r2.sato, None);

        assert_eq!(report.flagged, 1);
        assert_eq!(report.missing_benchmark, 1);
    }
}
