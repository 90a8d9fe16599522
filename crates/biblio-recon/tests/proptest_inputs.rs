//! Property-based tests for input parsing and series arithmetic.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;

use biblio_recon::Tuning;
use biblio_recon::catalog::DocumentTypeCatalog;
use biblio_recon::collaboration::{IdentityRule, normalize_name};
use biblio_recon::metrics::{CitationBatch, MetricSeries, YearWindowPlanner, plan_batches};
use biblio_recon::models::DocumentRecord;
use biblio_recon::resolver::parse_index;

fn arb_series() -> impl Strategy<Value = MetricSeries> {
    proptest::collection::btree_map(1990i32..2030, 0u32..500, 0..25)
        .prop_map(|map| MetricSeries::from_points(map.into_iter().map(|(y, v)| (y, f64::from(v)))))
}

fn catalog(type_count: usize) -> DocumentTypeCatalog {
    let documents: Vec<DocumentRecord> = (0..type_count)
        .map(|i| DocumentRecord {
            eid: format!("2-s2.0-{i}"),
            document_type: format!("Type {i}"),
            year: 2020,
            title: None,
            authors: Vec::new(),
            author_ids: Vec::new(),
            author_affiliation_ids: Vec::new(),
            countries: Vec::new(),
            cited_by_count: 0,
        })
        .collect();
    DocumentTypeCatalog::build(&documents)
}

proptest! {
    #[test]
    fn merge_with_itself_is_identity(series in arb_series()) {
        prop_assert_eq!(series.merge(&series), series);
    }

    /// Every year of either side survives; shared years take the right value.
    #[test]
    fn merge_is_right_biased_union(left in arb_series(), right in arb_series()) {
        let merged = merge_expected(&left, &right);
        let actual: BTreeMap<i32, f64> = left.merge(&right).iter().collect();
        prop_assert_eq!(actual, merged);
    }

    #[test]
    fn merged_years_are_ascending(left in arb_series(), right in arb_series()) {
        let merged = left.merge(&right);
        prop_assert!(merged.years().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn citation_batches_cover_every_id_once(len in 0usize..400, size in 1usize..40) {
        let plan = plan_batches(len, size);
        let mut covered = Vec::new();
        for batch in &plan {
            if let CitationBatch::Ids(range) = batch {
                prop_assert!(range.len() <= size);
                covered.extend(range.clone());
            }
        }
        prop_assert_eq!(covered, (0..len).collect::<Vec<_>>());

        if len == 0 {
            prop_assert!(plan.is_empty());
        } else {
            prop_assert_eq!(plan.len(), (len - 1) / size + 2);
            prop_assert_eq!(plan.first(), Some(&CitationBatch::Ids(0..1)));
        }
    }

    #[test]
    fn empty_window_input_is_default(start in 1980i32..2020, now in 2020i32..2030) {
        let planner = YearWindowPlanner::new(start, now, &Tuning::default());
        prop_assert_eq!(planner.plan_from_input("  ").unwrap(), planner.plan_default());
    }

    #[test]
    fn default_window_starts_at_career_start(start in 1980i32..2026, now in 2020i32..2030) {
        let window = YearWindowPlanner::new(start.min(now), now, &Tuning::default()).plan_default();
        let anchors = window.anchors();
        prop_assert_eq!(window.career_start(), start.min(now));
        prop_assert!(anchors[0] <= anchors[1] && anchors[1] <= anchors[2]);
    }

    /// Two explicit years keep the career start as the first anchor.
    #[test]
    fn two_year_window_keeps_career_start(start in 1990i32..2010, a in 2010i32..2026, b in 2010i32..2026) {
        let planner = YearWindowPlanner::new(start, 2025, &Tuning::default());
        let window = planner.plan_from_input(&format!("{a},{b}")).unwrap();
        let anchors = window.anchors();
        prop_assert_eq!(anchors[0], start);
        prop_assert!(anchors[1] <= anchors[2]);
        prop_assert!(window.to_descending_lists().iter().all(|years| years.first() == Some(&2026)));
    }

    #[test]
    fn out_of_range_window_is_rejected(year in 2027i32..3000) {
        let planner = YearWindowPlanner::new(2000, 2025, &Tuning::default());
        let input = format!("2010,{year}");
        prop_assert!(planner.plan_from_input(&input).is_err());
    }

    #[test]
    fn combine_accepts_each_index_once(types in 2usize..8, seed in any::<u64>()) {
        let catalog = catalog(types);
        // rotate the indices and split them into a single and a bracketed group
        let shift = (seed % types as u64) as usize;
        let order: Vec<usize> = (0..types).map(|i| (i + shift) % types).collect();
        let rest: Vec<String> = order[1..].iter().map(ToString::to_string).collect();
        let spec = format!("{},[{}]", order[0], rest.join(";"));

        let groups = catalog.combine(&spec).unwrap();
        prop_assert_eq!(groups.len(), 2);
        let flat: HashSet<usize> = groups.iter().flatten().copied().collect();
        prop_assert_eq!(flat.len(), types);
    }

    #[test]
    fn combine_rejects_repeated_index(types in 1usize..8, index in 0usize..8) {
        let index = index % types;
        let catalog = catalog(types);
        let spec = format!("{index},[{index}]");
        prop_assert!(catalog.combine(&spec).is_err());
    }

    #[test]
    fn exclusion_never_empties_selection(types in 1usize..6) {
        let catalog = catalog(types);
        let all: Vec<String> = (0..types).map(|i| i.to_string()).collect();
        prop_assert!(catalog.exclusion_from_input(&all.join(",")).is_err());
        if types > 1 {
            let selection = catalog.exclusion_from_input("0").unwrap();
            prop_assert_eq!(selection.len(), types - 1);
            prop_assert!(!selection.contains(0));
        }
    }

    #[test]
    fn candidate_index_bounds(count in 1usize..50, n in 0usize..100) {
        let parsed = parse_index(&n.to_string(), count);
        prop_assert_eq!(parsed.is_ok(), n < count);
    }

    #[test]
    fn normalize_name_is_idempotent(name in "[A-Za-zÀ-ÿ ,.-]{0,40}") {
        let once = normalize_name(&name);
        prop_assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn identity_rule_is_symmetric(a in "[a-z]{1,6}", b in "[a-z]{1,6}") {
        let rule = IdentityRule::default();
        prop_assert_eq!(rule.first_names_match(&a, &b), rule.first_names_match(&b, &a));
    }
}

fn merge_expected(left: &MetricSeries, right: &MetricSeries) -> BTreeMap<i32, f64> {
    let mut expected: BTreeMap<i32, f64> = left.iter().collect();
    expected.extend(right.iter());
    expected
}
