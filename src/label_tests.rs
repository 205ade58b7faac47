//! Tests for event extraction and response labeling.
//!
//! These verify:
//! 1. Terminal-event join: first dated row in table order wins
//! 2. Cutoff boundaries are inclusive (exit on the cutoff takes the
//!    earlier label)
//! 3. Non-qualifying codes and absent events label 0
//! 4. Exits beyond the 6-year window label 0: censoring, not a bug

use crate::label::{response_label, EventIndex, EventRecord, QUALIFYING_EXIT_CODES};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn event(loan_id: u64, code: Option<u16>, d: Option<NaiveDate>) -> EventRecord {
    EventRecord {
        loan_id,
        code,
        date: d,
    }
}

// -------------------------------------------------------------------------
// Terminal-event extraction
// -------------------------------------------------------------------------

#[test]
fn test_first_dated_row_is_authoritative() {
    let events = vec![
        event(1, Some(1), None),
        event(1, Some(3), Some(date(2006, 5, 1))),
        // A later dated row must not override the first.
        event(1, Some(9), Some(date(2007, 1, 1))),
    ];

    let index = EventIndex::build(&events);
    let terminal = index.terminal_event(1).unwrap();

    assert_eq!(terminal.code, Some(3));
    assert_eq!(terminal.date, date(2006, 5, 1));
}

#[test]
fn test_undated_rows_yield_no_terminal_event() {
    let events = vec![event(1, Some(1), None), event(1, None, None)];

    let index = EventIndex::build(&events);

    assert!(index.terminal_event(1).is_none());
    assert!(index.is_empty());
}

#[test]
fn test_index_is_per_loan() {
    let events = vec![
        event(1, Some(3), Some(date(2006, 5, 1))),
        event(2, Some(9), Some(date(2008, 2, 1))),
    ];

    let index = EventIndex::build(&events);

    assert_eq!(index.len(), 2);
    assert_eq!(index.terminal_event(1).unwrap().code, Some(3));
    assert_eq!(index.terminal_event(2).unwrap().code, Some(9));
    assert!(index.terminal_event(3).is_none());
}

// -------------------------------------------------------------------------
// Cutoff classification
// -------------------------------------------------------------------------

#[test]
fn test_label_boundary_is_inclusive() {
    let orig = date(2005, 1, 1);

    // Exit exactly on the +2y cutoff: label 1.
    assert_eq!(response_label(Some(3), Some(date(2007, 1, 1)), orig), 1);
    // One day later: label 2.
    assert_eq!(response_label(Some(3), Some(date(2007, 1, 2)), orig), 2);
}

#[test]
fn test_label_all_horizons() {
    let orig = date(2005, 1, 1);

    assert_eq!(response_label(Some(3), Some(date(2005, 6, 1)), orig), 1);
    assert_eq!(response_label(Some(3), Some(date(2008, 6, 1)), orig), 2);
    assert_eq!(response_label(Some(3), Some(date(2009, 1, 1)), orig), 2); // +4y cutoff
    assert_eq!(response_label(Some(3), Some(date(2010, 12, 1)), orig), 3);
    assert_eq!(response_label(Some(3), Some(date(2011, 1, 1)), orig), 3); // +6y cutoff
}

#[test]
fn test_exit_beyond_window_is_censored() {
    // Qualifying exit one day past the 6-year cutoff: labeled 0 exactly like
    // a loan with no qualifying exit. Intended censoring, not a fallthrough.
    let orig = date(2005, 1, 1);
    assert_eq!(response_label(Some(3), Some(date(2011, 1, 2)), orig), 0);
    assert_eq!(response_label(Some(9), Some(date(2020, 1, 1)), orig), 0);
}

#[test]
fn test_non_qualifying_codes_label_zero() {
    let orig = date(2005, 1, 1);
    let early = date(2005, 6, 1);

    assert_eq!(response_label(Some(99), Some(early), orig), 0);
    assert_eq!(response_label(Some(1), Some(early), orig), 0);
    assert_eq!(response_label(None, Some(early), orig), 0);
    assert_eq!(response_label(None, None, orig), 0);
    assert_eq!(response_label(Some(3), None, orig), 0);
}

#[test]
fn test_all_qualifying_codes_classify() {
    let orig = date(2005, 1, 1);
    let early = date(2005, 6, 1);

    for code in QUALIFYING_EXIT_CODES {
        assert_eq!(response_label(Some(code), Some(early), orig), 1, "code {}", code);
    }
}

#[test]
fn test_label_uses_calendar_cutoffs_from_leap_origination() {
    // Feb 29 origination: cutoffs clamp to Feb 28 in non-leap years, so a
    // Mar 1 exit in the cutoff year falls past the boundary.
    let orig = date(2004, 2, 29);
    assert_eq!(response_label(Some(3), Some(date(2006, 2, 28)), orig), 1);
    assert_eq!(response_label(Some(3), Some(date(2006, 3, 1)), orig), 2);
}
