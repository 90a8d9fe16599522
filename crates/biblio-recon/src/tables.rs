//! Builders for the named report tables.

use crate::catalog::{DocumentTypeCatalog, Highlight, TypeSelection};
use crate::config::Tuning;
use crate::error::{EngineError, EngineResult};
use crate::metrics::yearly::{
    INSTITUTIONAL, INTERNATIONAL, NATIONAL, SINGLE_AUTHORSHIP, TOP_5, TOP_10, TOP_25,
};
use crate::metrics::{HeadlineMetrics, MergedMetric, MetricSeries, YearWindow, resolve_anchors};
use crate::models::{
    CandidateList, CollaborationAuthor, CollaborationInstitution, CollaborationTable, DocumentRecord,
    RosterMatch, UNDEFINED_TYPE,
};
use crate::report::{Cell, Table};

const TOTAL: &str = "TOTAL";

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| (*c).to_string()).collect()
}

/// Row labels of per-period tables: career, then medium and short periods up to `through`.
#[must_use]
pub fn period_labels(anchors: [i32; 3], through: i32) -> [String; 3] {
    [
        format!("≥{}", anchors[0]),
        format!("{} to ≥{}", anchors[1], through),
        format!("{} to ≥{}", anchors[2], through),
    ]
}

/// Homonym candidates, indexed for selection.
#[must_use]
pub fn candidates(list: &CandidateList) -> Table {
    let mut table = Table::new(
        format!("Candidates for '{}'", list.query),
        columns(&["Name", "Affiliation", "City", "Country", "Documents"]),
    );
    for (i, candidate) in list.candidates.iter().enumerate() {
        table.push_row(
            i.to_string(),
            vec![
                Cell::from(candidate.name_or_default()),
                Cell::from(candidate.affiliation_name.clone().unwrap_or_default()),
                Cell::from(candidate.city.clone().unwrap_or_default()),
                Cell::from(candidate.country.clone().unwrap_or_default()),
                Cell::from(candidate.document_count),
            ],
        );
    }
    table
}

/// Catalog with its stable indices and a total row.
#[must_use]
pub fn document_types(catalog: &DocumentTypeCatalog) -> Table {
    let mut table = Table::new("Documents by type", columns(&["Type", "Documents"]));
    for entry in catalog.entries() {
        table.push_row(entry.index.to_string(), vec![Cell::from(entry.type_name.as_str()), Cell::from(entry.count)]);
    }
    table.push_row(TOTAL, vec![Cell::from(""), Cell::from(catalog.total())]);
    table
}

/// Kept types after exclusion, with their catalog indices.
#[must_use]
pub fn type_selection(selection: &TypeSelection) -> Table {
    let mut table = Table::new("Selected document types", columns(&["Type", "Documents"]));
    for entry in selection.entries() {
        table.push_row(entry.index.to_string(), vec![Cell::from(entry.type_name.as_str()), Cell::from(entry.count)]);
    }
    let total: usize = selection.entries().iter().map(|e| e.count).sum();
    table.push_row(TOTAL, vec![Cell::from(""), Cell::from(total)]);
    table
}

/// Documents published and citations received per year over the citation span.
#[must_use]
pub fn citations(citations: &MetricSeries, documents: &[&DocumentRecord]) -> Table {
    let mut table = Table::new("Citations", columns(&["Documents", "Citations"]));
    let mut total_docs = 0usize;
    for (year, cited) in citations.iter() {
        let published = documents.iter().filter(|d| d.year == year).count();
        total_docs += published;
        table.push_row(year.to_string(), vec![Cell::from(published), Cell::from(cited)]);
    }
    table.push_row(TOTAL, vec![Cell::from(total_docs), Cell::from(citations.total())]);
    table
}

/// Documents per period split into the highlighted groups, others and total.
#[must_use]
pub fn publications_by_period(window: &YearWindow, documents: &[&DocumentRecord], highlight: &Highlight) -> Table {
    let mut names: Vec<&str> = highlight.groups.iter().map(|g| g.label.as_str()).collect();
    names.extend(["Others", TOTAL]);
    let mut table = Table::new("Publications by period", columns(&names));

    let labels = period_labels(window.anchors(), window.now());
    for (years, label) in window.to_descending_lists().iter().zip(labels) {
        let in_period: Vec<&&DocumentRecord> = documents.iter().filter(|d| years.contains(&d.year)).collect();
        let mut cells: Vec<Cell> = highlight
            .groups
            .iter()
            .map(|g| Cell::from(in_period.iter().filter(|d| g.covers(&d.document_type)).count()))
            .collect();
        let others = in_period.iter().filter(|d| !highlight.covers(&d.document_type)).count();
        cells.push(Cell::from(others));
        cells.push(Cell::from(in_period.len()));
        table.push_row(label, cells);
    }
    table
}

/// Journal percentile bands per period.
///
/// Anchors are resolved against the merged scholarly output series; the
/// cumulative thresholds are turned into disjoint bands.
///
/// # Errors
///
/// `Malformed` if a threshold entry is missing or the series is too short.
pub fn journal_percentiles(
    output: &MergedMetric,
    percentiles: &MergedMetric,
    window: &YearWindow,
    tuning: &Tuning,
) -> EngineResult<Table> {
    let output = output.primary()?;
    let top5 = percentiles.labelled(TOP_5)?;
    let top10 = percentiles.labelled(TOP_10)?;
    let top25 = percentiles.labelled(TOP_25)?;

    let anchors = resolve_anchors(output, window, tuning.window_fallback_indices)?;
    let mut table = Table::new(
        "Publications in top journal percentiles (SNIP)",
        columns(&["Top 5%", "Top 6-10%", "Top 11-25%", "Others", TOTAL]),
    );
    for (year, label) in anchors.into_iter().zip(period_labels(anchors, through_year(output)?)) {
        let (t5, t10, t25, all) =
            (top5.sum_from(year), top10.sum_from(year), top25.sum_from(year), output.sum_from(year));
        table.push_row(
            label,
            vec![
                Cell::from(t5),
                Cell::from(t10 - t5),
                Cell::from(t25 - t10),
                Cell::from(all - t25),
                Cell::from(all),
            ],
        );
    }
    Ok(table)
}

/// Documents per collaboration type and period.
///
/// # Errors
///
/// `Malformed` if a collaboration type is missing or the series is too short.
pub fn collaboration_types(collaboration: &MergedMetric, window: &YearWindow, tuning: &Tuning) -> EngineResult<Table> {
    let series = [
        collaboration.labelled(INTERNATIONAL)?,
        collaboration.labelled(NATIONAL)?,
        collaboration.labelled(INSTITUTIONAL)?,
        collaboration.labelled(SINGLE_AUTHORSHIP)?,
    ];
    let years = series[2];
    let anchors = resolve_anchors(years, window, tuning.window_fallback_indices)?;

    let mut table = Table::new(
        "Collaboration types",
        columns(&["International", "National", "Institutional", "Single authorship", TOTAL]),
    );
    for (year, label) in anchors.into_iter().zip(period_labels(anchors, through_year(years)?)) {
        let values: Vec<f64> = series.iter().map(|s| s.sum_from(year)).collect();
        let total: f64 = values.iter().sum();
        let mut cells: Vec<Cell> = values.into_iter().map(Cell::from).collect();
        cells.push(Cell::from(total));
        table.push_row(label, cells);
    }
    Ok(table)
}

/// Headline indicators, one per row.
#[must_use]
pub fn headline(metrics: &HeadlineMetrics) -> Table {
    let mut table = Table::new("Headline indicators", columns(&["Value"]));
    table.push_row("Since", vec![Cell::Integer(i64::from(metrics.since))]);
    table.push_row("Outputs in top 10% citation percentiles (%)", vec![Cell::from(metrics.top_cited_share)]);
    table.push_row("Citations per publication", vec![Cell::from(metrics.citations_per_publication)]);
    table.push_row("Field-weighted citation impact", vec![Cell::from(metrics.field_weighted_impact)]);
    table.push_row("Academic-corporate collaboration (%)", vec![Cell::from(metrics.academic_corporate_share)]);
    table
}

/// The current year of a merged series: the one before its forward slot.
fn through_year(series: &MetricSeries) -> EngineResult<i32> {
    let years = series.years();
    years
        .len()
        .checked_sub(2)
        .map(|i| years[i])
        .ok_or_else(|| EngineError::malformed("metric series", "fewer than two years"))
}

/// Records of a collaboration query.
#[must_use]
pub fn collaboration_records(table: &CollaborationTable) -> Table {
    let mut out = Table::new(
        format!("Collaboration records ({})", table.len()),
        columns(&["Year", "Type", "Title", "Citations"]),
    );
    for record in &table.records {
        out.push_row(
            record.eid.clone(),
            vec![
                record.year.map_or(Cell::from(""), |y| Cell::Integer(i64::from(y))),
                Cell::from(record.document_type.clone().unwrap_or_else(|| UNDEFINED_TYPE.to_string())),
                Cell::from(record.title.clone().unwrap_or_default()),
                Cell::from(record.cited_by_count),
            ],
        );
    }
    out
}

/// Document type counts of a collaboration query, most frequent first.
#[must_use]
pub fn collaboration_document_types(table: &CollaborationTable) -> Table {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in &table.records {
        let kind = record.document_type.clone().unwrap_or_else(|| UNDEFINED_TYPE.to_string());
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((kind, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut out = Table::new("Collaboration documents by type", columns(&["Documents"]));
    for (kind, n) in counts {
        out.push_row(kind, vec![Cell::from(n)]);
    }
    out.push_row(TOTAL, vec![Cell::from(table.len())]);
    out
}

/// Reconciled authors, most publications first.
#[must_use]
pub fn authors(title: &str, authors: &[CollaborationAuthor]) -> Table {
    let mut sorted: Vec<&CollaborationAuthor> = authors.iter().collect();
    sorted.sort_by(|a, b| b.publication_count.cmp(&a.publication_count));

    let mut table = Table::new(title, columns(&["Author ID", "Affiliation IDs", "Publications"]));
    for author in sorted {
        table.push_row(
            author.full_name.clone(),
            vec![
                Cell::from(author.id.as_str()),
                Cell::from(author.affiliation_id.as_str()),
                Cell::from(author.publication_count),
            ],
        );
    }
    table
}

/// Institutions with their publication counts.
#[must_use]
pub fn institutions(institutions: &[CollaborationInstitution]) -> Table {
    let mut table = Table::new("Institutions", columns(&["Name", "Country", "Publications"]));
    for inst in institutions {
        table.push_row(
            inst.id.clone(),
            vec![
                Cell::from(inst.name.as_str()),
                Cell::from(inst.country.as_str()),
                Cell::from(inst.publication_count),
            ],
        );
    }
    table
}

/// Roster matches; fuzzy ones are flagged for review.
#[must_use]
pub fn roster_matches(result: &RosterMatch) -> Table {
    let mut table = Table::new(
        "Roster matches",
        columns(&["Roster name", "Department", "Publications", "Confidence", "Fuzzy"]),
    );
    for m in &result.matched {
        table.push_row(
            m.matched_author.full_name.clone(),
            vec![
                Cell::from(m.roster_entry.name.as_str()),
                Cell::from(m.roster_entry.department.clone().unwrap_or_default()),
                Cell::from(m.matched_author.publication_count),
                Cell::from(u32::from(m.confidence)),
                Cell::from(m.is_fuzzy),
            ],
        );
    }
    table
}

/// Authors that matched no roster entry.
#[must_use]
pub fn roster_unmatched(result: &RosterMatch) -> Table {
    authors("Authors not in the roster", &result.unmatched)
}
