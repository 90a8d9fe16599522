//! Headline indicators of a researcher sheet.
//!
//! Shares cover the five years ending the year before last. Averages cover the
//! part of the career inside the ten-year window and are weighted by the yearly
//! article and conference-paper output.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::client::BibliometricApi;
use crate::error::{EngineError, EngineResult};
use crate::metrics::MetricSeries;
use crate::metrics::yearly::{ACADEMIC_CORPORATE, MergedMetric, TOP_10, fetch_extended, fetch_window};
use crate::models::{ApiUsage, MetricFilters, MetricType, MetricWindow};

/// Years of the five-years-and-current window.
const FIVE_YEARS_AND_CURRENT: usize = 6;

/// Years summed by the shares.
const SHARE_YEARS: i32 = 5;

/// The four headline indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    /// First year of the averaged range.
    pub since: i32,
    /// Percent of output among the 10% most cited.
    pub top_cited_share: f64,
    pub citations_per_publication: f64,
    pub field_weighted_impact: f64,
    /// Percent of output co-authored with industry.
    pub academic_corporate_share: f64,
}

/// Series the headline indicators are computed from.
#[derive(Debug, Clone)]
pub struct HeadlineInputs {
    /// Output of every publication type, extended to the current year.
    pub output: MetricSeries,
    /// Ten-year output in the top 10% citation percentiles.
    pub top_cited: MetricSeries,
    /// Academic-corporate output, extended to the current year.
    pub academic_corporate: MetricSeries,
    /// Ten-year article and conference-paper output. Its years are the ten-year window.
    pub article_output: MetricSeries,
    pub citations_per_publication: MetricSeries,
    pub field_weighted_impact: MetricSeries,
}

impl HeadlineMetrics {
    /// Compute the indicators for a career starting in `career_start`.
    ///
    /// A zero denominator yields zero.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the ten-year window has fewer than two years.
    pub fn compute(inputs: &HeadlineInputs, career_start: i32) -> EngineResult<Self> {
        let years = inputs.article_output.years();
        let end = years
            .len()
            .checked_sub(2)
            .map(|i| years[i])
            .ok_or_else(|| EngineError::malformed("metric series", "fewer than two years"))?;
        let since = if years.contains(&career_start) { career_start } else { years[0] };
        let five_start = end - (SHARE_YEARS - 1);

        let top_cited_share = share(
            inputs.top_cited.sum_over(five_start..=end),
            inputs.output.sum_over(five_start..=end),
        );
        let academic_corporate_share =
            share(inputs.academic_corporate.sum_from(five_start), inputs.output.sum_from(five_start));

        let career = since..=end;
        Ok(Self {
            since,
            top_cited_share: round_to(top_cited_share, 1),
            citations_per_publication: round_to(
                weighted_mean(&inputs.article_output, &inputs.citations_per_publication, &career),
                1,
            ),
            field_weighted_impact: round_to(
                weighted_mean(&inputs.article_output, &inputs.field_weighted_impact, &career),
                2,
            ),
            academic_corporate_share: round_to(academic_corporate_share, 1),
        })
    }
}

fn share(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 { 0.0 } else { part / whole * 100.0 }
}

fn weighted_mean(weights: &MetricSeries, values: &MetricSeries, years: &RangeInclusive<i32>) -> f64 {
    let total = weights.sum_over(years.clone());
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = weights
        .iter()
        .filter(|(year, _)| years.contains(year))
        .map(|(year, weight)| weight * values.value_at(year).unwrap_or(0.0))
        .sum();
    weighted / total
}

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

/// Fetch the series behind the headline indicators and compute them.
///
/// # Errors
///
/// Propagates upstream failures and `Malformed` for missing entries.
pub async fn fetch_headline(
    api: &dyn BibliometricApi,
    entity_id: &str,
    career_start: i32,
    usage: &mut ApiUsage,
) -> EngineResult<HeadlineMetrics> {
    let all = MetricFilters::default();
    let articles = MetricFilters::articles_and_conference_papers();
    let ten = MetricWindow::TenYears;
    let recent = MetricWindow::FiveYearsAndCurrent;

    let output =
        fetch_extended(api, entity_id, MetricType::ScholarlyOutput, all, recent, FIVE_YEARS_AND_CURRENT, usage)
            .await?;
    let academic_corporate = fetch_extended(
        api,
        entity_id,
        MetricType::AcademicCorporateCollaboration,
        all,
        recent,
        FIVE_YEARS_AND_CURRENT,
        usage,
    )
    .await?;
    let top_cited = fetch_window(api, entity_id, MetricType::OutputsInTopCitationPercentiles, ten, all, usage).await?;
    let article_output = fetch_window(api, entity_id, MetricType::ScholarlyOutput, ten, articles, usage).await?;
    let citations = fetch_window(api, entity_id, MetricType::CitationsPerPublication, ten, articles, usage).await?;
    let impact = fetch_window(api, entity_id, MetricType::FieldWeightedCitationImpact, ten, articles, usage).await?;

    let inputs = HeadlineInputs {
        output: output.primary()?.clone(),
        top_cited: MergedMetric::single(&top_cited).labelled(TOP_10)?.clone(),
        academic_corporate: academic_corporate.labelled(ACADEMIC_CORPORATE)?.clone(),
        article_output: MergedMetric::single(&article_output).primary()?.clone(),
        citations_per_publication: MergedMetric::single(&citations).primary()?.clone(),
        field_weighted_impact: MergedMetric::single(&impact).primary()?.clone(),
    };
    let headline = HeadlineMetrics::compute(&inputs, career_start)?;
    tracing::debug!(entity = %entity_id, ?headline, "Computed headline metrics");
    Ok(headline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(years: RangeInclusive<i32>, value: f64) -> MetricSeries {
        MetricSeries::from_points(years.map(|y| (y, value)))
    }

    fn inputs() -> HeadlineInputs {
        HeadlineInputs {
            output: constant(2015..=2025, 10.0),
            top_cited: constant(2015..=2024, 2.0),
            academic_corporate: constant(2015..=2025, 1.0),
            article_output: constant(2015..=2024, 8.0),
            citations_per_publication: constant(2015..=2024, 4.0),
            field_weighted_impact: constant(2015..=2024, 1.25),
        }
    }

    #[test]
    fn test_headline_from_constant_series() {
        let headline = HeadlineMetrics::compute(&inputs(), 2010).unwrap();
        assert_eq!(headline.since, 2015);
        assert!((headline.top_cited_share - 20.0).abs() < 1e-9);
        assert!((headline.academic_corporate_share - 10.0).abs() < 1e-9);
        assert!((headline.citations_per_publication - 4.0).abs() < 1e-9);
        assert!((headline.field_weighted_impact - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_career_inside_window_sets_since() {
        assert_eq!(HeadlineMetrics::compute(&inputs(), 2019).unwrap().since, 2019);
    }

    #[test]
    fn test_averages_are_weighted_by_output() {
        let mut inputs = inputs();
        inputs.article_output = MetricSeries::from_points([(2021, 1.0), (2022, 3.0), (2023, 0.0), (2024, 5.0)]);
        inputs.citations_per_publication =
            MetricSeries::from_points([(2021, 2.0), (2022, 6.0), (2023, 50.0), (2024, 99.0)]);
        let headline = HeadlineMetrics::compute(&inputs, 2021).unwrap();
        // 2024 is past the averaged range; 2023 has no output
        assert!((headline.citations_per_publication - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_output_yields_zero() {
        let inputs = HeadlineInputs {
            output: constant(2015..=2025, 0.0),
            top_cited: constant(2015..=2024, 0.0),
            academic_corporate: constant(2015..=2025, 0.0),
            article_output: constant(2015..=2024, 0.0),
            citations_per_publication: constant(2015..=2024, 3.0),
            field_weighted_impact: constant(2015..=2024, 1.0),
        };
        let headline = HeadlineMetrics::compute(&inputs, 2015).unwrap();
        assert_eq!(headline.top_cited_share, 0.0);
        assert_eq!(headline.academic_corporate_share, 0.0);
        assert_eq!(headline.citations_per_publication, 0.0);
        assert_eq!(headline.field_weighted_impact, 0.0);
    }

    #[test]
    fn test_short_window_is_malformed() {
        let mut inputs = inputs();
        inputs.article_output = constant(2024..=2024, 1.0);
        assert!(matches!(HeadlineMetrics::compute(&inputs, 2020), Err(EngineError::Malformed { .. })));
    }
}
