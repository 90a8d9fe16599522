//! Collaboration extraction and reconciliation tests.

mod common;

use biblio_recon::collaboration::{
    CollaborationExtractor, CollaborationQuery, EntitySpec, Extraction, IdentityRule, RosterMatcher,
    SimilarityScorer, institution_roster,
};
use biblio_recon::error::EngineError;
use biblio_recon::metrics::YearSpan;
use biblio_recon::models::{CollaborationTable, RawCollaborationRecord, RosterEntry};
use biblio_recon::Tuning;

use common::{FixtureApi, collaboration_record};

fn query(b: EntitySpec) -> CollaborationQuery {
    CollaborationQuery::new(
        EntitySpec::Researchers(vec!["7001".into(), "7002".into()]),
        b,
        YearSpan { start: 2020, end: 2024 },
    )
    .unwrap()
}

async fn extract(api: &FixtureApi, query: &CollaborationQuery) -> CollaborationTable {
    let tuning = Tuning::default();
    let extractor = CollaborationExtractor::new(api, &tuning);
    match extractor.extract(query).await.unwrap().value {
        Extraction::Records(table) => table,
        Extraction::NoResults { query } => panic!("no records for {query}"),
    }
}

fn smith_records() -> Vec<RawCollaborationRecord> {
    vec![
        collaboration_record(
            "2-s2.0-1",
            2021,
            &[("Smith, John", "7001", "60026786"), ("Gagnon, Paul", "3003", "60000001")],
        ),
        collaboration_record(
            "2-s2.0-2",
            2023,
            &[("Smith, Jo", "7002", "60026786"), ("Gagnon, Paul", "3003", "60000001")],
        ),
    ]
}

#[tokio::test]
async fn test_spellings_fold_into_one_author() {
    let api = FixtureApi::new().with_collaboration(smith_records());
    let query = query(EntitySpec::Institutions(vec!["60000001".into()]));
    let table = extract(&api, &query).await;
    assert_eq!(table.len(), 2);
    assert_eq!(table.query, query.to_string());

    let tuning = Tuning::default();
    let extractor = CollaborationExtractor::new(&api, &tuning);
    let side_a = extractor.reconcile_side(&table, &query.entity_a).unwrap();
    assert_eq!(side_a.len(), 1);
    let smith = &side_a[0];
    assert_eq!(smith.full_name, "Smith, John");
    assert_eq!(smith.first_name, "John");
    // the identifier seen last is kept
    assert_eq!(smith.id, "7002");
    assert_eq!(smith.publication_count, 2);

    let everyone = extractor.reconcile_authors(&table).unwrap();
    assert_eq!(everyone.len(), 2);

    let side_b = extractor.reconcile_side(&table, &query.entity_b).unwrap();
    assert_eq!(side_b.len(), 1);
    assert_eq!(side_b[0].full_name, "Gagnon, Paul");
}

#[tokio::test]
async fn test_different_first_names_stay_apart() {
    let records = vec![
        collaboration_record("2-s2.0-1", 2021, &[("Smith, John", "7001", "60026786")]),
        collaboration_record("2-s2.0-2", 2022, &[("Smith, Anna", "7002", "60026786")]),
    ];
    let api = FixtureApi::new().with_collaboration(records);
    let query = query(EntitySpec::Country("Canada".into()));
    let table = extract(&api, &query).await;

    let tuning = Tuning::default();
    let authors = CollaborationExtractor::new(&api, &tuning).reconcile_authors(&table).unwrap();
    let names: Vec<&str> = authors.iter().map(|a| a.full_name.as_str()).collect();
    assert_eq!(names, vec!["Smith, John", "Smith, Anna"]);
}

#[tokio::test]
async fn test_country_side_uses_affiliation_countries() {
    let mut record = collaboration_record(
        "2-s2.0-1",
        2022,
        &[("Smith, John", "7001", "60026786"), ("Dupont, Claire", "5005", "60000001")],
    );
    record.affiliation_names = "ETS;Sorbonne Université".into();
    record.affiliation_countries = "Canada;France".into();

    let api = FixtureApi::new().with_collaboration(vec![record]);
    let query = query(EntitySpec::Country("france".into()));
    let table = extract(&api, &query).await;

    let tuning = Tuning::default();
    let extractor = CollaborationExtractor::new(&api, &tuning);
    let side_b = extractor.reconcile_side(&table, &query.entity_b).unwrap();
    assert_eq!(side_b.len(), 1);
    assert_eq!(side_b[0].full_name, "Dupont, Claire");

    let institutions = institution_roster(&table, Some("France")).unwrap();
    assert_eq!(institutions.len(), 1);
    assert_eq!(institutions[0].name, "Sorbonne Université");

    assert_eq!(institution_roster(&table, None).unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_response_is_no_results() {
    let api = FixtureApi::new();
    let tuning = Tuning::default();
    let query = query(EntitySpec::Country("Canada".into()));

    let extraction = CollaborationExtractor::new(&api, &tuning).extract(&query).await.unwrap().value;
    assert_eq!(extraction, Extraction::NoResults { query: query.to_string() });
    assert_eq!(api.calls().collaboration_queries.len(), 1);
}

#[tokio::test]
async fn test_unaligned_author_lists_are_malformed() {
    let mut record = collaboration_record("2-s2.0-9", 2021, &[("Smith, John", "7001", "60026786")]);
    record.author_ids = "7001;7002".into();

    let api = FixtureApi::new().with_collaboration(vec![record]);
    let query = query(EntitySpec::Country("Canada".into()));
    let table = extract(&api, &query).await;

    let tuning = Tuning::default();
    let err = CollaborationExtractor::new(&api, &tuning).reconcile_authors(&table).unwrap_err();
    assert!(matches!(err, EngineError::Malformed { .. }), "{err}");
    assert!(err.to_string().contains("2-s2.0-9"));
}

#[test]
fn test_country_cannot_be_entity_a() {
    let result = CollaborationQuery::new(
        EntitySpec::Country("Canada".into()),
        EntitySpec::Researchers(vec!["1".into()]),
        YearSpan { start: 2020, end: 2024 },
    );
    assert!(result.is_err());
}

// =============================================================================
// Roster matching
// =============================================================================

#[tokio::test]
async fn test_misspelled_roster_name_is_fuzzy() {
    let records = vec![collaboration_record(
        "2-s2.0-1",
        2022,
        &[("Tremblay, Marie-Eve", "1001", "60026786"), ("Smith, John", "7001", "60026786")],
    )];
    let api = FixtureApi::new().with_collaboration(records);
    let query = query(EntitySpec::Country("Canada".into()));
    let table = extract(&api, &query).await;

    let tuning = Tuning::default();
    let extractor = CollaborationExtractor::new(&api, &tuning);
    let authors = extractor.reconcile_authors(&table).unwrap();
    let roster = vec![
        RosterEntry::new("Tremblai, Marie-Eve", Some("Génie logiciel".into())),
        RosterEntry::new("Smith, Jonathan", None),
    ];

    let result = extractor.fuzzy_match_roster(&authors, &roster);
    assert_eq!(result.matched.len(), 2);
    assert!(result.unmatched.is_empty());

    let tremblay = result.matched.iter().find(|m| m.matched_author.id == "1001").unwrap();
    assert!(tremblay.is_fuzzy);
    assert_eq!(tremblay.confidence, 94);
    assert_eq!(tremblay.roster_entry.department.as_deref(), Some("Génie logiciel"));

    // same last name and first-name prefix
    let smith = result.matched.iter().find(|m| m.matched_author.id == "7001").unwrap();
    assert!(!smith.is_fuzzy);
    assert_eq!(smith.confidence, 100);

    assert_eq!(result.fuzzy_flags(), vec![true, false]);
}

struct Fixed(u8);

impl SimilarityScorer for Fixed {
    fn ratio(&self, _a: &str, _b: &str) -> u8 {
        self.0
    }
}

#[tokio::test]
async fn test_threshold_with_injected_scorer() {
    let records = vec![collaboration_record("2-s2.0-1", 2022, &[("Roy, Luc", "1", "60026786")])];
    let api = FixtureApi::new().with_collaboration(records);
    let query = query(EntitySpec::Country("Canada".into()));
    let table = extract(&api, &query).await;
    let roster = vec![RosterEntry::new("Bergeron, Sylvie", None)];

    let tuning = Tuning::default();
    let accepting = CollaborationExtractor::new(&api, &tuning)
        .with_matcher(RosterMatcher::new(IdentityRule::new(2), 80, Box::new(Fixed(80))));
    let authors = accepting.reconcile_authors(&table).unwrap();
    let result = accepting.fuzzy_match_roster(&authors, &roster);
    assert_eq!(result.matched.len(), 1);
    assert!(result.matched[0].is_fuzzy);

    let rejecting = CollaborationExtractor::new(&api, &tuning)
        .with_matcher(RosterMatcher::new(IdentityRule::new(2), 80, Box::new(Fixed(79))));
    let result = rejecting.fuzzy_match_roster(&authors, &roster);
    assert!(result.matched.is_empty());
    assert_eq!(result.unmatched.len(), 1);
}
