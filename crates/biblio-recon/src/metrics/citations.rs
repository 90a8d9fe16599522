//! Per-year citation totals over document sets larger than one request.

use std::ops::Range;

use crate::client::BibliometricApi;
use crate::error::{EngineError, EngineResult};
use crate::metrics::MetricSeries;
use crate::models::{ApiUsage, RateLimitInfo, RawCitationBlock};

/// One unit of the batch plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CitationBatch {
    /// A real call covering these positions of the id list.
    Ids(Range<usize>),
    /// Stands in for an empty remainder.
    Zero,
}

/// Split `len` ids into calls: the first id alone, then chunks of
/// `batch_size`, then a zero batch when the remainder after the first id
/// divides evenly.
#[must_use]
pub fn plan_batches(len: usize, batch_size: usize) -> Vec<CitationBatch> {
    if len == 0 {
        return Vec::new();
    }
    let batch_size = batch_size.max(1);
    let mut plan = vec![CitationBatch::Ids(0..1)];
    let mut start = 1;
    while start < len {
        let end = (start + batch_size).min(len);
        plan.push(CitationBatch::Ids(start..end));
        start = end;
    }
    if (len - 1) % batch_size == 0 {
        plan.push(CitationBatch::Zero);
    }
    plan
}

/// Result of a citation aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct CitationAggregate {
    /// Citations per year, first publication year to `now + 1`.
    pub series: MetricSeries,
    /// Quota headers of the first call.
    pub diagnostics: RateLimitInfo,
    /// Quota of every call.
    pub usage: ApiUsage,
    /// Batches summed, zero batch included.
    pub batches: usize,
}

/// Sums citation overview responses into one series.
pub struct CitationBatchAggregator<'a> {
    api: &'a dyn BibliometricApi,
    batch_size: usize,
    now: i32,
}

impl<'a> CitationBatchAggregator<'a> {
    #[must_use]
    pub fn new(api: &'a dyn BibliometricApi, batch_size: usize, now: i32) -> Self {
        Self { api, batch_size, now }
    }

    /// Fetch and sum citations of `document_ids` per year.
    ///
    /// Any failed batch fails the whole aggregation.
    pub async fn aggregate(
        &self,
        document_ids: &[String],
        first_publication_year: i32,
    ) -> EngineResult<CitationAggregate> {
        let year_end = self.now + 1;
        if first_publication_year > year_end {
            return Err(EngineError::malformed(
                "citation span",
                format!("first publication year {first_publication_year} is after {year_end}"),
            ));
        }
        let span = (year_end - first_publication_year + 1) as usize;

        let plan = plan_batches(document_ids.len(), self.batch_size);
        tracing::info!(
            documents = document_ids.len(),
            batches = plan.len(),
            from = first_publication_year,
            to = year_end,
            "Aggregating citations"
        );

        let mut totals = vec![0u64; span];
        let mut usage = ApiUsage::default();
        let mut diagnostics = RateLimitInfo::default();

        for (position, batch) in plan.iter().enumerate() {
            let block = match batch {
                CitationBatch::Ids(range) => {
                    let response = self
                        .api
                        .fetch_citation_batch(&document_ids[range.clone()], first_publication_year, year_end)
                        .await?;
                    if position == 0 {
                        if let Some((_, info)) = response.usage.iter().next() {
                            diagnostics = info.clone();
                        }
                    }
                    response.take(&mut usage)
                }
                CitationBatch::Zero => RawCitationBlock::zeroed(first_publication_year, year_end),
            };
            accumulate(&mut totals, &block)?;
        }

        let years = (first_publication_year..=year_end).collect();
        let values = totals.into_iter().map(|v| v as f64).collect();

        Ok(CitationAggregate {
            series: MetricSeries::new(years, values)?,
            diagnostics,
            usage,
            batches: plan.len(),
        })
    }
}

fn accumulate(totals: &mut [u64], block: &RawCitationBlock) -> EngineResult<()> {
    for row in &block.rows {
        if row.counts.len() > totals.len() {
            return Err(EngineError::malformed(
                "citation overview",
                format!(
                    "{} yearly counts for a {}-year span (document {})",
                    row.counts.len(),
                    totals.len(),
                    row.scopus_id
                ),
            ));
        }
        for (total, count) in totals.iter_mut().zip(&row.counts) {
            *total += count;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_calls(plan: &[CitationBatch]) -> usize {
        plan.iter().filter(|b| matches!(b, CitationBatch::Ids(_))).count()
    }

    #[test]
    fn test_single_document_gets_zero_batch() {
        assert_eq!(plan_batches(1, 25), vec![CitationBatch::Ids(0..1), CitationBatch::Zero]);
    }

    #[test]
    fn test_even_remainder_gets_zero_batch() {
        let plan = plan_batches(26, 25);
        assert_eq!(
            plan,
            vec![CitationBatch::Ids(0..1), CitationBatch::Ids(1..26), CitationBatch::Zero]
        );
    }

    #[test]
    fn test_partial_remainder() {
        let plan = plan_batches(27, 25);
        assert_eq!(
            plan,
            vec![CitationBatch::Ids(0..1), CitationBatch::Ids(1..26), CitationBatch::Ids(26..27)]
        );
        assert_eq!(real_calls(&plan), 3);
    }

    #[test]
    fn test_batch_count_formula() {
        for len in 2..200 {
            let plan = plan_batches(len, 25);
            assert_eq!(plan.len(), (len - 1) / 25 + 2, "len {len}");
            assert!(plan.iter().all(|b| match b {
                CitationBatch::Ids(r) => r.len() <= 25,
                CitationBatch::Zero => true,
            }));
        }
    }

    #[test]
    fn test_empty_plan() {
        assert!(plan_batches(0, 25).is_empty());
    }
}
