//! In-memory bibliometric API used by the session and aggregation tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use biblio_recon::client::{BibliometricApi, PersonQuery};
use biblio_recon::error::{ClientError, ClientResult};
use biblio_recon::models::{
    ApiUsage, Endpoint, EntityKind, Metered, MetricFilters, MetricType, MetricWindow, RateLimitInfo,
    RawAffiliation, RawAuthorRef, RawCitationBlock, RawCitationRow, RawCollaborationRecord, RawDocument,
    RawProfile, RawSeries, RawSeriesEntry,
};

pub const NOW: i32 = 2025;

/// Calls the fixture received.
#[derive(Debug, Clone, Default)]
pub struct Calls {
    pub people_searches: usize,
    pub profiles: Vec<String>,
    pub documents: usize,
    pub citation_batches: Vec<Vec<String>>,
    pub metrics: Vec<(MetricType, MetricWindow)>,
    pub collaboration_queries: Vec<String>,
}

/// Scriptable [`BibliometricApi`].
#[derive(Debug, Default)]
pub struct FixtureApi {
    pub people: Vec<RawProfile>,
    pub profiles: HashMap<String, RawProfile>,
    pub documents: HashMap<String, Vec<RawDocument>>,
    /// Citations per document per year.
    pub citations_per_year: u64,
    pub collaboration: Vec<RawCollaborationRecord>,
    pub fail_metrics: bool,
    /// Zero-based index of the citation batch call that fails.
    pub fail_citation_batch: Option<usize>,
    calls: Mutex<Calls>,
}

fn usage(endpoint: Endpoint, remaining: &str) -> ApiUsage {
    ApiUsage::single(
        endpoint,
        RateLimitInfo {
            limit: Some("20000".into()),
            remaining: Some(remaining.into()),
            ..RateLimitInfo::default()
        },
    )
}

impl FixtureApi {
    pub fn new() -> Self {
        Self { citations_per_year: 1, ..Self::default() }
    }

    /// Register a searchable person with a retrievable profile.
    pub fn with_person(mut self, profile: RawProfile) -> Self {
        self.profiles.insert(profile.id.clone(), profile.clone());
        self.people.push(profile);
        self
    }

    /// Register a profile that is retrievable by id only.
    pub fn with_profile(mut self, profile: RawProfile) -> Self {
        self.profiles.insert(profile.id.clone(), profile);
        self
    }

    pub fn with_documents(mut self, author_id: &str, documents: Vec<RawDocument>) -> Self {
        self.documents.insert(author_id.to_string(), documents);
        self
    }

    pub fn with_collaboration(mut self, records: Vec<RawCollaborationRecord>) -> Self {
        self.collaboration = records;
        self
    }

    pub fn failing_metrics(mut self) -> Self {
        self.fail_metrics = true;
        self
    }

    pub fn failing_citation_batch(mut self, index: usize) -> Self {
        self.fail_citation_batch = Some(index);
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BibliometricApi for FixtureApi {
    async fn search_people(&self, _query: &PersonQuery) -> ClientResult<Metered<Vec<RawProfile>>> {
        self.calls.lock().unwrap().people_searches += 1;
        Ok(Metered::new(self.people.clone(), usage(Endpoint::AuthorSearch, "4999")))
    }

    async fn fetch_profile(&self, id: &str, kind: EntityKind) -> ClientResult<Metered<RawProfile>> {
        self.calls.lock().unwrap().profiles.push(id.to_string());
        let endpoint = match kind {
            EntityKind::Person => Endpoint::AuthorRetrieval,
            EntityKind::Institution => Endpoint::AffiliationRetrieval,
        };
        self.profiles
            .get(id)
            .cloned()
            .map(|p| Metered::new(p, usage(endpoint, "4998")))
            .ok_or_else(|| ClientError::not_found(format!("{} {id}", kind.label())))
    }

    async fn fetch_documents(&self, id: &str) -> ClientResult<Metered<Vec<RawDocument>>> {
        self.calls.lock().unwrap().documents += 1;
        let docs = self.documents.get(id).cloned().unwrap_or_default();
        Ok(Metered::new(docs, usage(Endpoint::ScopusSearch, "19999")))
    }

    async fn fetch_citation_batch(
        &self,
        scopus_ids: &[String],
        year_start: i32,
        year_end: i32,
    ) -> ClientResult<Metered<RawCitationBlock>> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.citation_batches.push(scopus_ids.to_vec());
            calls.citation_batches.len() - 1
        };
        if self.fail_citation_batch == Some(index) {
            return Err(ClientError::server(502, "citation overview unavailable"));
        }
        let span = (year_end - year_start + 1) as usize;
        let rows = scopus_ids
            .iter()
            .map(|id| RawCitationRow { scopus_id: id.clone(), counts: vec![self.citations_per_year; span] })
            .collect();
        Ok(Metered::new(
            RawCitationBlock { year_start, year_end, rows },
            usage(Endpoint::CitationOverview, "9000"),
        ))
    }

    async fn fetch_yearly_metric(
        &self,
        _entity_id: &str,
        metric: MetricType,
        window: MetricWindow,
        _filters: MetricFilters,
    ) -> ClientResult<Metered<RawSeries>> {
        self.calls.lock().unwrap().metrics.push((metric, window));
        if self.fail_metrics {
            return Err(ClientError::server(503, "SciVal unavailable"));
        }
        Ok(Metered::new(metric_series(metric, window, NOW), usage(Endpoint::SciValMetrics, "800")))
    }

    async fn search_collaboration(&self, query: &str) -> ClientResult<Metered<Vec<RawCollaborationRecord>>> {
        self.calls.lock().unwrap().collaboration_queries.push(query.to_string());
        Ok(Metered::new(self.collaboration.clone(), usage(Endpoint::ScopusSearch, "19998")))
    }
}

/// Years a fixed metric window covers.
pub fn window_years(window: MetricWindow, now: i32) -> std::ops::RangeInclusive<i32> {
    match window {
        MetricWindow::TenYears => now - 10..=now - 1,
        MetricWindow::ThreeYearsAndCurrentAndFuture => now - 3..=now + 1,
        MetricWindow::FiveYearsAndCurrent => now - 5..=now,
    }
}

/// Constant-valued series: output 10, journal percentiles 1/3/6, each collaboration
/// type 2, top-cited 2, academic-corporate 1 of 10, citations per publication 4, FWCI 1.5.
pub fn metric_series(metric: MetricType, window: MetricWindow, now: i32) -> RawSeries {
    let labelled: Vec<(Option<&str>, f64)> = match metric {
        MetricType::ScholarlyOutput => vec![(None, 10.0)],
        MetricType::PublicationsInTopJournalPercentiles => {
            vec![(Some("5"), 1.0), (Some("10"), 3.0), (Some("25"), 6.0)]
        }
        MetricType::Collaboration => vec![
            (Some("International collaboration"), 2.0),
            (Some("National collaboration"), 2.0),
            (Some("Institutional collaboration"), 2.0),
            (Some("Single authorship"), 2.0),
        ],
        MetricType::OutputsInTopCitationPercentiles => vec![(Some("10"), 2.0)],
        MetricType::AcademicCorporateCollaboration => vec![
            (Some("Academic-corporate collaboration"), 1.0),
            (Some("No academic-corporate collaboration"), 9.0),
        ],
        MetricType::CitationsPerPublication => vec![(None, 4.0)],
        MetricType::FieldWeightedCitationImpact => vec![(None, 1.5)],
    };
    RawSeries {
        metric_type: metric,
        entries: labelled
            .into_iter()
            .map(|(label, value)| RawSeriesEntry {
                label: label.map(str::to_string),
                points: window_years(window, now).map(|y| (y, Some(value))).collect(),
            })
            .collect(),
    }
}

pub fn person(id: &str, last: &str, first: &str, first_year: i32) -> RawProfile {
    RawProfile {
        id: id.to_string(),
        kind: Some(EntityKind::Person),
        surname: Some(last.to_string()),
        given_name: Some(first.to_string()),
        affiliation_name: Some("École de technologie supérieure".into()),
        document_count: 4,
        publication_range: Some((first_year, NOW)),
        ..RawProfile::default()
    }
}

pub fn institution(id: &str, name: &str, country: &str) -> RawProfile {
    RawProfile {
        id: id.to_string(),
        kind: Some(EntityKind::Institution),
        display_name: Some(name.to_string()),
        affiliation_id: Some(id.to_string()),
        affiliation_name: Some(name.to_string()),
        country: Some(country.to_string()),
        ..RawProfile::default()
    }
}

pub fn document(n: u32, kind: &str, year: i32) -> RawDocument {
    RawDocument {
        eid: format!("2-s2.0-850000{n:05}"),
        title: Some(format!("Paper {n}")),
        document_type: Some(kind.to_string()),
        cover_date: Some(format!("{year}-06-01")),
        authors: vec![RawAuthorRef {
            id: "1001".into(),
            surname: Some("Tremblay".into()),
            given_name: Some("Marie-Eve".into()),
            indexed_name: None,
            affiliation_ids: vec!["60026786".into()],
        }],
        affiliations: vec![RawAffiliation {
            id: "60026786".into(),
            name: Some("ETS".into()),
            country: Some("Canada".into()),
        }],
        cited_by_count: 3,
    }
}

/// Four documents of three types between 2012 and 2023.
pub fn sample_documents() -> Vec<RawDocument> {
    vec![
        document(1, "Article", 2012),
        document(2, "Article", 2020),
        document(3, "Conference Paper", 2022),
        document(4, "Review", 2023),
    ]
}

/// A record co-authored by `(name, id, afids)` triples.
pub fn collaboration_record(eid: &str, year: i32, authors: &[(&str, &str, &str)]) -> RawCollaborationRecord {
    let names: Vec<&str> = authors.iter().map(|a| a.0).collect();
    let ids: Vec<&str> = authors.iter().map(|a| a.1).collect();
    let afids: Vec<&str> = authors.iter().map(|a| a.2).collect();
    RawCollaborationRecord {
        eid: eid.to_string(),
        title: Some(format!("Joint work {eid}")),
        year: Some(year),
        document_type: Some("Article".into()),
        author_names: names.join(";"),
        author_ids: ids.join(";"),
        author_afids: afids.join(";"),
        affiliation_ids: "60026786;60000001".into(),
        affiliation_names: "ETS;Polytechnique Montreal".into(),
        affiliation_countries: "Canada;Canada".into(),
        cited_by_count: 5,
    }
}
