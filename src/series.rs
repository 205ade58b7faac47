//! Sparse date-keyed reference series (benchmark rate, regional HPI).
//!
//! A [`ReferenceSeries`] is an ordered, read-only mapping from calendar date
//! to a numeric level. Two lookup modes exist:
//!
//! - **Point lookup** ([`ReferenceSeries::value_at`]) resolves at month
//!   granularity: the stored observation may fall on any day within the
//!   month. The result is typed found/not-found: no interpolation and no
//!   nearest-date fallback. A missing month is the caller's decision to
//!   treat as a skipped feature or an abort.
//! - **Range lookup** ([`ReferenceSeries::range`]) is an inclusive
//!   `[start, end]` slice over exact calendar dates.
//!
//! Construction validates the month-keyed invariant: at most one observation
//! per calendar month, rejected with a hard error otherwise. HPI is a
//! [`RegionalSeries`]: one independent `ReferenceSeries` per region code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::calendar::MonthKey;
use crate::error::PrepError;

/// An ordered, read-only date-keyed series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSeries {
    name: String,
    /// Observations in strictly ascending date order.
    points: Vec<(NaiveDate, f64)>,
    /// Month-granularity index over the same observations.
    by_month: HashMap<MonthKey, f64>,
}

impl ReferenceSeries {
    /// Build a series from raw `(date, value)` observations.
    ///
    /// Input order is irrelevant; points are sorted on construction. Two
    /// observations within the same calendar month violate the series
    /// invariant and fail the load.
    pub fn from_points(
        name: impl Into<String>,
        mut points: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, PrepError> {
        let name = name.into();
        points.sort_by_key(|(date, _)| *date);

        let mut by_month = HashMap::with_capacity(points.len());
        for (date, value) in &points {
            if by_month.insert(MonthKey::from_date(*date), *value).is_some() {
                return Err(PrepError::DuplicateSeriesMonth {
                    series: name,
                    date: *date,
                });
            }
        }

        Ok(Self {
            name,
            points,
            by_month,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point lookup at month granularity.
    ///
    /// Returns `None` when the series has no observation in that month.
    /// Never falls back to a neighboring date.
    #[inline]
    pub fn value_at(&self, month: MonthKey) -> Option<f64> {
        self.by_month.get(&month).copied()
    }

    /// All observations with `start <= date <= end`, in date order.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> &[(NaiveDate, f64)] {
        let lo = self.points.partition_point(|(date, _)| *date < start);
        let hi = self.points.partition_point(|(date, _)| *date <= end);
        &self.points[lo..hi]
    }

    /// Minimum value over the inclusive `[start, end]` range, or `None` when
    /// the range holds no observations.
    pub fn min_in_range(&self, start: NaiveDate, end: NaiveDate) -> Option<f64> {
        self.range(start, end)
            .iter()
            .map(|(_, value)| *value)
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.min(v))))
    }
}

/// One reference series per region code (the HPI shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalSeries {
    name: String,
    regions: HashMap<String, ReferenceSeries>,
}

impl RegionalSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: HashMap::new(),
        }
    }

    /// Build the full regional index from per-region raw observations.
    pub fn from_regions(
        name: impl Into<String>,
        regions: HashMap<String, Vec<(NaiveDate, f64)>>,
    ) -> Result<Self, PrepError> {
        let mut index = Self::new(name);
        for (region, points) in regions {
            index.insert_region(region, points)?;
        }
        Ok(index)
    }

    /// Add one region's series. The per-series name carries the region code
    /// so a failed load identifies which region broke the invariant.
    pub fn insert_region(
        &mut self,
        region: impl Into<String>,
        points: Vec<(NaiveDate, f64)>,
    ) -> Result<(), PrepError> {
        let region = region.into();
        let series = ReferenceSeries::from_points(format!("{}/{}", self.name, region), points)?;
        self.regions.insert(region, series);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn get(&self, region: &str) -> Option<&ReferenceSeries> {
        self.regions.get(region)
    }

    #[inline]
    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}
