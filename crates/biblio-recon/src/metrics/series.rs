//! Year-indexed metric series.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::RawSeriesEntry;

/// Values indexed by strictly increasing years.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    years: Vec<i32>,
    values: Vec<f64>,
}

impl MetricSeries {
    /// Build from parallel vectors.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the lengths differ or the years are not strictly increasing.
    pub fn new(years: Vec<i32>, values: Vec<f64>) -> EngineResult<Self> {
        if years.len() != values.len() {
            return Err(EngineError::malformed(
                "metric series",
                format!("{} years for {} values", years.len(), values.len()),
            ));
        }
        if let Some(pair) = years.windows(2).find(|w| w[0] >= w[1]) {
            return Err(EngineError::malformed(
                "metric series",
                format!("years not strictly increasing at {} -> {}", pair[0], pair[1]),
            ));
        }
        Ok(Self { years, values })
    }

    /// Build from unordered points; a later point for the same year wins.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = (i32, f64)>) -> Self {
        let map: BTreeMap<i32, f64> = points.into_iter().collect();
        Self::from_map(map)
    }

    /// Lift a raw metric entry, reading missing values as zero.
    #[must_use]
    pub fn from_raw(entry: &RawSeriesEntry) -> Self {
        Self::from_points(entry.points.iter().map(|(year, value)| (*year, value.unwrap_or(0.0))))
    }

    /// All-zero series over `start..=end`.
    #[must_use]
    pub fn zeros(start: i32, end: i32) -> Self {
        let years: Vec<i32> = (start..=end).collect();
        let values = vec![0.0; years.len()];
        Self { years, values }
    }

    fn from_map(map: BTreeMap<i32, f64>) -> Self {
        let (years, values) = map.into_iter().unzip();
        Self { years, values }
    }

    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.years.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// `(year, value)` pairs in year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.years.iter().copied().zip(self.values.iter().copied())
    }

    /// Value recorded for `year`.
    #[must_use]
    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.years.binary_search(&year).ok().map(|i| self.values[i])
    }

    /// Sum of values from `from_year` onwards.
    #[must_use]
    pub fn sum_from(&self, from_year: i32) -> f64 {
        self.iter().filter(|(year, _)| *year >= from_year).map(|(_, v)| v).sum()
    }

    /// Sum of values in `years`.
    #[must_use]
    pub fn sum_over(&self, years: RangeInclusive<i32>) -> f64 {
        self.iter().filter(|(year, _)| years.contains(year)).map(|(_, v)| v).sum()
    }

    /// Sum of all values.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// The last `n` years.
    #[must_use]
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self { years: self.years[start..].to_vec(), values: self.values[start..].to_vec() }
    }

    /// Union of both series; on shared years `other` wins.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut map: BTreeMap<i32, f64> = self.iter().collect();
        map.extend(other.iter());
        Self::from_map(map)
    }

    /// `year` if the series has it, otherwise the year at `fallback_index`
    /// (negative values count from the end).
    #[must_use]
    pub fn nearest_anchor(&self, year: i32, fallback_index: i64) -> Option<i32> {
        if self.years.binary_search(&year).is_ok() {
            return Some(year);
        }
        let len = self.len() as i64;
        let index = if fallback_index < 0 { len + fallback_index } else { fallback_index };
        usize::try_from(index).ok().and_then(|i| self.years.get(i).copied())
    }
}
