//! SciVal yearly metrics stitched from two fixed windows.
//!
//! The metrics endpoint only serves fixed windows. The ten-year window misses the
//! current and next year, so its series are extended with the tail of the
//! three-years-and-current-and-future window.

use crate::client::BibliometricApi;
use crate::config::Tuning;
use crate::error::{EngineError, EngineResult};
use crate::metrics::{MetricSeries, YearWindow};
use crate::models::{ApiUsage, MetricFilters, MetricType, MetricWindow, RawSeries};

/// Labels of the journal percentile thresholds.
pub const TOP_5: &str = "5";
pub const TOP_10: &str = "10";
pub const TOP_25: &str = "25";

/// Labels of the collaboration types.
pub const INTERNATIONAL: &str = "International collaboration";
pub const NATIONAL: &str = "National collaboration";
pub const INSTITUTIONAL: &str = "Institutional collaboration";
pub const SINGLE_AUTHORSHIP: &str = "Single authorship";

/// Label of co-authorship with industry.
pub const ACADEMIC_CORPORATE: &str = "Academic-corporate collaboration";

/// One metric with every label merged across both windows.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedMetric {
    pub metric: MetricType,
    entries: Vec<(Option<String>, MetricSeries)>,
}

impl MergedMetric {
    /// Merge each labelled entry of `long` with the last `tail` years of the
    /// same entry in `short`.
    #[must_use]
    pub fn from_windows(long: &RawSeries, short: &RawSeries, tail: usize) -> Self {
        let entries = long
            .entries
            .iter()
            .map(|entry| {
                let base = MetricSeries::from_raw(entry);
                let recent = short
                    .entries
                    .iter()
                    .find(|e| e.label == entry.label)
                    .map(|e| MetricSeries::from_raw(e).tail(tail));
                let merged = match recent {
                    Some(recent) => base.merge(&recent),
                    None => base,
                };
                (entry.label.clone(), merged)
            })
            .collect();
        Self { metric: long.metric_type, entries }
    }

    /// One window taken as is.
    #[must_use]
    pub fn single(raw: &RawSeries) -> Self {
        let entries = raw.entries.iter().map(|e| (e.label.clone(), MetricSeries::from_raw(e))).collect();
        Self { metric: raw.metric_type, entries }
    }

    /// Series of a labelled entry.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the response had no such entry.
    pub fn labelled(&self, label: &str) -> EngineResult<&MetricSeries> {
        self.entries
            .iter()
            .find(|(l, _)| l.as_deref() == Some(label))
            .map(|(_, s)| s)
            .ok_or_else(|| {
                EngineError::malformed(self.metric.as_str(), format!("no '{label}' entry"))
            })
    }

    /// Series of a plain metric.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the response was empty.
    pub fn primary(&self) -> EngineResult<&MetricSeries> {
        self.entries
            .first()
            .map(|(_, s)| s)
            .ok_or_else(|| EngineError::malformed(self.metric.as_str(), "no entries"))
    }
}

/// Fetch `metric` over one window.
pub async fn fetch_window(
    api: &dyn BibliometricApi,
    entity_id: &str,
    metric: MetricType,
    window: MetricWindow,
    filters: MetricFilters,
    usage: &mut ApiUsage,
) -> EngineResult<RawSeries> {
    Ok(api.fetch_yearly_metric(entity_id, metric, window, filters).await?.take(usage))
}

/// Fetch `metric` over both windows and merge them.
pub async fn fetch_merged(
    api: &dyn BibliometricApi,
    entity_id: &str,
    metric: MetricType,
    filters: MetricFilters,
    tuning: &Tuning,
    usage: &mut ApiUsage,
) -> EngineResult<MergedMetric> {
    fetch_extended(
        api,
        entity_id,
        metric,
        filters,
        MetricWindow::ThreeYearsAndCurrentAndFuture,
        tuning.short_window_tail,
        usage,
    )
    .await
}

/// Fetch `metric` over the ten-year window and extend it with the last `tail`
/// years of `recent`.
pub async fn fetch_extended(
    api: &dyn BibliometricApi,
    entity_id: &str,
    metric: MetricType,
    filters: MetricFilters,
    recent: MetricWindow,
    tail: usize,
    usage: &mut ApiUsage,
) -> EngineResult<MergedMetric> {
    let long = fetch_window(api, entity_id, metric, MetricWindow::TenYears, filters, usage).await?;
    let short = fetch_window(api, entity_id, metric, recent, filters, usage).await?;

    tracing::debug!(
        entity = %entity_id,
        metric = metric.as_str(),
        recent = recent.as_str(),
        entries = long.entries.len(),
        "Merged metric windows"
    );
    Ok(MergedMetric::from_windows(&long, &short, tail))
}

/// Map each window anchor onto a year the merged series actually has.
///
/// # Errors
///
/// Returns `Malformed` if the series is too short for a fallback index.
pub fn resolve_anchors(
    series: &MetricSeries,
    window: &YearWindow,
    fallback_indices: [i64; 3],
) -> EngineResult<[i32; 3]> {
    let anchors = window.anchors();
    let mut resolved = [0; 3];
    for (slot, (anchor, fallback)) in resolved.iter_mut().zip(anchors.into_iter().zip(fallback_indices)) {
        *slot = series.nearest_anchor(anchor, fallback).ok_or_else(|| {
            EngineError::malformed(
                "metric series",
                format!("{} years cannot resolve anchor {anchor}", series.len()),
            )
        })?;
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawSeriesEntry;

    fn raw(metric: MetricType, label: Option<&str>, years: std::ops::RangeInclusive<i32>, value: f64) -> RawSeries {
        RawSeries {
            metric_type: metric,
            entries: vec![RawSeriesEntry {
                label: label.map(str::to_string),
                points: years.map(|y| (y, Some(value))).collect(),
            }],
        }
    }

    #[test]
    fn test_merge_extends_with_short_tail() {
        let long = raw(MetricType::ScholarlyOutput, None, 2015..=2024, 1.0);
        let short = raw(MetricType::ScholarlyOutput, None, 2022..=2026, 2.0);
        let merged = MergedMetric::from_windows(&long, &short, 2);
        let series = merged.primary().unwrap();
        assert_eq!(series.years().first(), Some(&2015));
        assert_eq!(series.years().last(), Some(&2026));
        assert_eq!(series.value_at(2024), Some(1.0));
        assert_eq!(series.value_at(2025), Some(2.0));
    }

    #[test]
    fn test_missing_label_is_malformed() {
        let long = raw(MetricType::Collaboration, Some(INTERNATIONAL), 2015..=2024, 1.0);
        let merged = MergedMetric::from_windows(&long, &long, 2);
        assert!(merged.labelled(INTERNATIONAL).is_ok());
        assert!(matches!(merged.labelled(NATIONAL), Err(EngineError::Malformed { .. })));
    }

    #[test]
    fn test_resolve_anchors_falls_back() {
        let series = MetricSeries::zeros(2015, 2026);
        let window = YearWindow::new([2008, 2019, 2030], 2025, 2);
        assert_eq!(resolve_anchors(&series, &window, [0, -7, -5]).unwrap(), [2015, 2019, 2022]);
    }
}
