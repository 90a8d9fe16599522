//! Formatting of session output.

mod common;

use std::sync::Arc;

use biblio_recon::formatters::{
    compact_report, compact_usage, format_candidates_markdown, format_prompt_markdown, format_report_markdown,
    format_usage_markdown,
};
use biblio_recon::report::MemoryRenderer;
use biblio_recon::session::{Outcome, Session};
use biblio_recon::Tuning;

use common::{FixtureApi, NOW, person, sample_documents};

async fn completed_sheet() -> (Session, biblio_recon::report::Report) {
    let api = FixtureApi::new()
        .with_person(person("1001", "Tremblay", "Marie-Eve", 2012))
        .with_documents("1001", sample_documents());
    let mut session = Session::new(Arc::new(api), Arc::new(MemoryRenderer::new()), Tuning::default())
        .with_current_year(NOW);

    for answer in ["1", "Tremblay, Marie-Eve", "", ""] {
        session.submit(answer).await.unwrap();
    }
    let reply = session.submit("").await.unwrap();
    let Outcome::ReportReady(report) = reply.outcome else {
        panic!("expected a report, got {:?}", reply.outcome);
    };
    (session, report)
}

#[tokio::test]
async fn test_report_markdown_has_every_table() {
    let (_, report) = completed_sheet().await;
    let md = format_report_markdown(&report);

    assert!(md.starts_with("# Tremblay, Marie-Eve"));
    assert!(md.contains("## Citations"));
    assert!(md.contains("## Publications by period"));
    assert!(md.contains("## Publications in top journal percentiles (SNIP)"));
    assert!(md.contains("## Collaboration types"));
    assert!(md.contains("| 2021 to ≥2025 |"));
}

#[tokio::test]
async fn test_compact_report_is_keyed_by_table() {
    let (_, report) = completed_sheet().await;
    let compact = compact_report(&report);

    assert_eq!(compact["kind"], "researcher_sheet");
    let citations = &compact["tables"]["citations"]["rows"];
    let total = citations.as_array().unwrap().iter().find(|r| r["label"] == "TOTAL").unwrap();
    assert_eq!(total["Documents"], 4);
    assert!(compact["tables"]["journal_percentiles"].is_object());
}

#[tokio::test]
async fn test_usage_output() {
    let (session, _) = completed_sheet().await;

    let compact = compact_usage(session.usage());
    assert_eq!(compact["SciValMetrics"]["remaining"], "800");
    assert_eq!(compact["CitationOverview"]["remaining"], "9000");

    let md = format_usage_markdown(session.usage());
    assert!(md.contains("**SciValMetrics**: 800 of 20000 remaining"));
}

#[tokio::test]
async fn test_prompt_and_candidates_markdown() {
    let api = FixtureApi::new()
        .with_person(person("1", "Smith", "John", 2010))
        .with_person(person("2", "Smith", "John", 2015));
    let mut session = Session::new(Arc::new(api), Arc::new(MemoryRenderer::new()), Tuning::default())
        .with_current_year(NOW);

    let md = format_prompt_markdown(&session.prompt());
    assert!(md.starts_with("**[0]** Choose a report"));
    assert!(md.contains("- 2: collaboration report"));

    session.submit("1").await.unwrap();
    session.submit("Smith, John").await.unwrap();
    let candidates = session.context().candidates.clone().unwrap();
    let md = format_candidates_markdown(&candidates);
    assert!(md.contains("(2 results)"));
    assert!(md.contains("**1**. Smith, John (École de technologie supérieure)"));
}
