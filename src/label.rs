//! Exit-event extraction and response labeling.
//!
//! The performance/event log is a one-to-many table: a loan can carry any
//! number of rows, of which at most one: the first in table order with a
//! non-null exit date: is its terminal event. The join is built once as an
//! indexed map rather than scanned per loan.
//!
//! Labeling is a pure classification over (code, origination date, exit
//! date): qualifying exits are binned by the earliest origination-anchored
//! cutoff (+2/+4/+6 years, inclusive) containing the exit date; everything
//! else: non-qualifying code, no terminal event, or an exit past the
//! 6-year observation window: labels 0 (censored).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::calendar::add_years;
use crate::table::LoanId;

/// Zero-balance/exit codes that qualify as liquidation/prepayment exits.
pub const QUALIFYING_EXIT_CODES: [u16; 3] = [3, 6, 9];

/// Cutoff horizons, in years after origination, for response labels 1/2/3.
pub const RESPONSE_CUTOFF_YEARS: [i32; 3] = [2, 4, 6];

/// One raw row of the performance/event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub loan_id: LoanId,
    /// Zero-balance/exit code; `None` for active or unclassified rows.
    pub code: Option<u16>,
    /// Exit date; `None` for rows that do not represent a termination.
    pub date: Option<NaiveDate>,
}

/// A loan's terminal event: the code and date of its first dated event row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TerminalEvent {
    pub code: Option<u16>,
    pub date: NaiveDate,
}

/// Index from loan id to terminal event, built once over the event log.
///
/// The log itself is never mutated; first-in-table-order wins when several
/// rows carry dates.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    by_loan: HashMap<LoanId, TerminalEvent>,
}

impl EventIndex {
    pub fn build(events: &[EventRecord]) -> Self {
        let mut by_loan = HashMap::new();
        for event in events {
            if let Some(date) = event.date {
                by_loan.entry(event.loan_id).or_insert(TerminalEvent {
                    code: event.code,
                    date,
                });
            }
        }
        debug!(
            events = events.len(),
            terminal = by_loan.len(),
            "event index built"
        );
        Self { by_loan }
    }

    #[inline]
    pub fn terminal_event(&self, loan_id: LoanId) -> Option<&TerminalEvent> {
        self.by_loan.get(&loan_id)
    }

    pub fn len(&self) -> usize {
        self.by_loan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_loan.is_empty()
    }
}

/// Classify an exit into the 0/1/2/3 response label.
///
/// Cutoff comparison is inclusive: an exit landing exactly on a cutoff date
/// takes the earlier label.
pub fn response_label(
    code: Option<u16>,
    exit_date: Option<NaiveDate>,
    origination: NaiveDate,
) -> u8 {
    let (Some(code), Some(exit)) = (code, exit_date) else {
        return 0;
    };
    if !QUALIFYING_EXIT_CODES.contains(&code) {
        return 0;
    }
    for (i, years) in RESPONSE_CUTOFF_YEARS.iter().enumerate() {
        if exit <= add_years(origination, *years) {
            return (i + 1) as u8;
        }
    }
    // Qualifying exit beyond the 6-year window: censored, same as no exit.
    0
}
