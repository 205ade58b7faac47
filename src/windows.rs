//! Time-window features over the reference series.
//!
//! For each loan, three fixed calendar windows are anchored at origination:
//! years 1–2, 3–4 and 5–6. Over each window two features are computed:
//!
//! - **HPI ratio**: the minimum regional HPI level inside the window
//!   divided by the level at the window's start month. The worst relative
//!   home-price drawdown available within the window; exactly 1.0 when the
//!   minimum sits at the start itself.
//! - **Rate drop**: the benchmark rate at the window's start month minus
//!   the minimum rate inside the window. The largest refinance incentive
//!   that opened up within the window; 0 when the start is already the
//!   minimum. Non-negative whenever the start month's observation lies in
//!   the window.
//!
//! Window boundaries use exact calendar arithmetic ([`add_years`]) and the
//! range is inclusive on both ends. A start month absent from the series
//! makes the whole window's feature missing for that loan: a data gap, not
//! a failure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{add_years, MonthKey};
use crate::series::ReferenceSeries;

/// A calendar window anchored at origination:
/// `[orig + offset, orig + offset + duration]` years, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub offset_years: i32,
    pub duration_years: i32,
}

impl WindowSpec {
    pub const fn new(offset_years: i32, duration_years: i32) -> Self {
        Self {
            offset_years,
            duration_years,
        }
    }

    #[inline]
    pub fn start(&self, origination: NaiveDate) -> NaiveDate {
        add_years(origination, self.offset_years)
    }

    #[inline]
    pub fn end(&self, origination: NaiveDate) -> NaiveDate {
        add_years(origination, self.offset_years + self.duration_years)
    }
}

/// The three response windows: years 1–2, 3–4 and 5–6 after origination.
pub const RESPONSE_WINDOWS: [WindowSpec; 3] = [
    WindowSpec::new(0, 2),
    WindowSpec::new(2, 2),
    WindowSpec::new(4, 2),
];

/// Minimum-over-window HPI level divided by the start-month level.
///
/// `None` when the start month is absent from the series or the window
/// holds no observations.
pub fn hpi_window_ratio(
    series: &ReferenceSeries,
    origination: NaiveDate,
    window: WindowSpec,
) -> Option<f64> {
    let start = window.start(origination);
    let start_level = series.value_at(MonthKey::from_date(start))?;
    let min_level = series.min_in_range(start, window.end(origination))?;
    Some(min_level / start_level)
}

/// Start-month benchmark rate minus the minimum rate over the window.
///
/// `None` when the start month is absent from the series or the window
/// holds no observations.
pub fn rate_window_drop(
    series: &ReferenceSeries,
    origination: NaiveDate,
    window: WindowSpec,
) -> Option<f64> {
    let start = window.start(origination);
    let start_rate = series.value_at(MonthKey::from_date(start))?;
    let min_rate = series.min_in_range(start, window.end(origination))?;
    Some(start_rate - min_rate)
}
