//! Error taxonomy for the preparation pipeline.
//!
//! Two failure classes exist and they must never be confused:
//!
//! - **Data gaps** (a reference series has no entry for a month, a bucket has
//!   no informative members): these degrade to a missing output value, are
//!   tallied in the run report, and never abort the batch. They are NOT
//!   represented here.
//! - **Structural errors** (malformed input dates, a region with no HPI
//!   series, duplicate keys in an input table): these violate the input
//!   contract, abort the run, and identify the offending record. They are
//!   the variants of [`PrepError`].

use chrono::NaiveDate;
use std::fmt;

use crate::table::LoanId;

/// Structural errors that abort a preparation run.
#[derive(Debug, Clone, PartialEq)]
pub enum PrepError {
    /// An input date failed to parse under the expected format.
    MalformedDate {
        field: &'static str,
        raw: String,
    },
    /// A loan's region, after the sanctioned PR/VI remap, has no HPI series.
    UnmappedRegion {
        loan_id: LoanId,
        state: String,
    },
    /// A reference series carried two observations for the same calendar
    /// month. Series are month-keyed; this is a data-quality violation.
    DuplicateSeriesMonth {
        series: String,
        date: NaiveDate,
    },
    /// Two loan records share an identifier.
    DuplicateLoanId {
        loan_id: LoanId,
    },
}

impl fmt::Display for PrepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDate { field, raw } => {
                write!(f, "malformed date for {}: {:?} (expected MM/YYYY)", field, raw)
            }
            Self::UnmappedRegion { loan_id, state } => {
                write!(
                    f,
                    "loan {}: state {:?} has no HPI series and no sanctioned remap",
                    loan_id, state
                )
            }
            Self::DuplicateSeriesMonth { series, date } => {
                write!(
                    f,
                    "series {}: duplicate observation for month of {}",
                    series, date
                )
            }
            Self::DuplicateLoanId { loan_id } => {
                write!(f, "duplicate loan identifier {}", loan_id)
            }
        }
    }
}

impl std::error::Error for PrepError {}
