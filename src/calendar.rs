//! Calendar arithmetic for month-granularity loan data.
//!
//! Origination dates arrive as `"MM/YYYY"` text and are pinned to the first
//! day of the month. Point lookups into reference series resolve at month
//! granularity via [`MonthKey`]; window boundaries and response cutoffs use
//! exact calendar-date arithmetic via [`add_years`].
//!
//! # Year-Offset Clamping Rule
//!
//! `add_years` keeps the month and day and shifts the year. When the shifted
//! day does not exist (Feb 29 into a non-leap year), the result clamps to the
//! last valid day of that month. All window and cutoff computation in this
//! crate goes through [`add_years`], so the rule is applied in exactly one
//! place.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PrepError;

/// Calendar month key (year + month), the granularity at which point lookups
/// into reference series are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    #[inline]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    #[inline]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

/// Parse an `"MM/YYYY"` date, pinning the day to the first of the month.
///
/// Failure is a hard [`PrepError::MalformedDate`]: a date that does not parse
/// is a precondition violation of the whole run, not a per-row data gap.
pub fn parse_month_year(raw: &str, field: &'static str) -> Result<NaiveDate, PrepError> {
    let malformed = || PrepError::MalformedDate {
        field,
        raw: raw.to_string(),
    };

    let (mm, yyyy) = raw.trim().split_once('/').ok_or_else(malformed)?;
    let month: u32 = mm.parse().map_err(|_| malformed())?;
    let year: i32 = yyyy.parse().map_err(|_| malformed())?;
    if yyyy.len() != 4 {
        return Err(malformed());
    }
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(malformed)
}

/// Render a date back to the `"MM/YYYY"` form used by the source tables.
pub fn format_month_year(date: NaiveDate) -> String {
    format!("{:02}/{:04}", date.month(), date.year())
}

/// Shift a date by whole calendar years, keeping month and day.
///
/// If the shifted day does not exist in the target year (Feb 29 into a
/// non-leap year), the result clamps to the last valid day of that month.
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() + years;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .unwrap_or_else(|| last_day_of_month(year, date.month()))
}

/// Last calendar day of the given month.
fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("month start is always a valid date")
        .pred_opt()
        .expect("month start has a predecessor")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_year_valid() {
        let d = parse_month_year("01/2005", "ORIG_DTE").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2005, 1, 1).unwrap());

        let d = parse_month_year("12/1999", "ORIG_DTE").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(1999, 12, 1).unwrap());
    }

    #[test]
    fn test_parse_month_year_rejects_garbage() {
        for raw in ["2005-01", "13/2005", "00/2005", "1/20x5", "012005", ""] {
            let err = parse_month_year(raw, "ORIG_DTE").unwrap_err();
            assert!(
                matches!(err, PrepError::MalformedDate { .. }),
                "expected MalformedDate for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_rejects_two_digit_year() {
        assert!(parse_month_year("01/05", "ORIG_DTE").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let d = parse_month_year("03/2007", "ORIG_DTE").unwrap();
        assert_eq!(format_month_year(d), "03/2007");
    }

    #[test]
    fn test_add_years_plain() {
        let d = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();
        assert_eq!(add_years(d, 2), NaiveDate::from_ymd_opt(2007, 1, 1).unwrap());
        assert_eq!(add_years(d, 0), d);
    }

    #[test]
    fn test_add_years_clamps_leap_day() {
        // Feb 29 shifted into a non-leap year clamps to Feb 28.
        let leap = NaiveDate::from_ymd_opt(2004, 2, 29).unwrap();
        assert_eq!(add_years(leap, 1), NaiveDate::from_ymd_opt(2005, 2, 28).unwrap());
        // Shifted into another leap year it survives unchanged.
        assert_eq!(add_years(leap, 4), NaiveDate::from_ymd_opt(2008, 2, 29).unwrap());
    }

    #[test]
    fn test_month_key_ordering() {
        assert!(MonthKey::new(2004, 12) < MonthKey::new(2005, 1));
        assert!(MonthKey::new(2005, 1) < MonthKey::new(2005, 2));
        assert_eq!(
            MonthKey::from_date(NaiveDate::from_ymd_opt(2005, 1, 25).unwrap()),
            MonthKey::new(2005, 1)
        );
    }

    #[test]
    fn test_month_key_display() {
        assert_eq!(MonthKey::new(2005, 3).to_string(), "03/2005");
    }
}
