//! Year-indexed series, comparison windows and the aggregations built on them.

mod citations;
mod headline;
mod series;
mod window;
pub mod yearly;

pub use citations::{CitationAggregate, CitationBatch, CitationBatchAggregator, plan_batches};
pub use headline::{HeadlineInputs, HeadlineMetrics, fetch_headline};
pub use series::MetricSeries;
pub use window::{YearSpan, YearWindow, YearWindowPlanner};
pub use yearly::{MergedMetric, fetch_merged, resolve_anchors};
