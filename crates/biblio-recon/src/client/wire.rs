//! Upstream JSON shapes and their conversion to the typed payloads.
//!
//! Scopus encodes most numbers as strings, collapses single-element arrays to
//! objects and reports an empty result set as one entry holding an `error` field.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::models::{
    EntityKind, MetricType, RawAffiliation, RawAuthorRef, RawCitationBlock, RawCitationRow,
    RawDocument, RawProfile, RawSeries, RawSeriesEntry,
};

/// An object or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

fn list<T>(value: Option<OneOrMany<T>>) -> Vec<T> {
    value.map(OneOrMany::into_vec).unwrap_or_default()
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    Ok(lenient_string(deserializer)?.and_then(|s| s.trim().parse().ok()))
}

/// `AUTHOR_ID:123` -> `123`
fn strip_prefix(identifier: &str) -> String {
    identifier.rsplit(':').next().unwrap_or(identifier).to_string()
}

// =============================================================================
// Search envelopes
// =============================================================================

/// Entries that may be the "Result set was empty" sentinel.
pub(super) trait SearchEntry {
    fn is_result(&self) -> bool;
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "E: Deserialize<'de>"))]
pub(super) struct SearchEnvelope<E> {
    #[serde(rename = "search-results")]
    pub results: SearchResults<E>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "E: Deserialize<'de>"))]
pub(super) struct SearchResults<E> {
    #[serde(rename = "opensearch:totalResults", default, deserialize_with = "lenient_u64")]
    pub total: u64,
    #[serde(default = "Vec::new")]
    pub entry: Vec<E>,
    #[serde(default)]
    pub cursor: Option<SearchCursor>,
}

/// Present when the request was made with `cursor=...`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchCursor {
    #[serde(rename = "@next", default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PreferredName {
    #[serde(default)]
    surname: Option<String>,
    #[serde(rename = "given-name", default)]
    given_name: Option<String>,
}

// =============================================================================
// Author search
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct AuthorEntry {
    #[serde(rename = "dc:identifier", default)]
    identifier: Option<String>,
    #[serde(rename = "preferred-name", default)]
    preferred_name: Option<PreferredName>,
    #[serde(rename = "document-count", default, deserialize_with = "lenient_u64")]
    document_count: u64,
    #[serde(rename = "affiliation-current", default)]
    affiliation: Option<OneOrMany<SearchAffiliation>>,
    #[serde(rename = "subject-area", default)]
    subject_area: Option<OneOrMany<SubjectArea>>,
}

#[derive(Debug, Deserialize)]
struct SearchAffiliation {
    #[serde(rename = "affiliation-id", default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "affiliation-name", default)]
    name: Option<String>,
    #[serde(rename = "affiliation-city", default)]
    city: Option<String>,
    #[serde(rename = "affiliation-country", default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubjectArea {
    #[serde(rename = "$", default)]
    name: Option<String>,
}

impl SearchEntry for AuthorEntry {
    fn is_result(&self) -> bool {
        self.identifier.is_some()
    }
}

impl AuthorEntry {
    pub fn into_profile(self) -> RawProfile {
        let name = self.preferred_name.unwrap_or_default();
        let affiliation = list(self.affiliation).into_iter().next();
        let (affiliation_id, affiliation_name, city, country) = match affiliation {
            Some(a) => (a.id, a.name, a.city, a.country),
            None => (None, None, None, None),
        };
        RawProfile {
            id: self.identifier.as_deref().map(strip_prefix).unwrap_or_default(),
            kind: Some(EntityKind::Person),
            surname: name.surname,
            given_name: name.given_name,
            display_name: None,
            affiliation_id,
            affiliation_name,
            city,
            country,
            document_count: self.document_count,
            publication_range: None,
            subject_areas: list(self.subject_area).into_iter().filter_map(|s| s.name).collect(),
        }
    }
}

// =============================================================================
// Author / affiliation retrieval
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct AuthorRetrievalEnvelope {
    #[serde(rename = "author-retrieval-response")]
    response: OneOrMany<AuthorRetrieval>,
}

#[derive(Debug, Deserialize)]
struct AuthorRetrieval {
    #[serde(default)]
    coredata: Option<Coredata>,
    #[serde(rename = "author-profile", default)]
    profile: Option<AuthorProfile>,
}

#[derive(Debug, Deserialize)]
struct Coredata {
    #[serde(rename = "dc:identifier", default)]
    identifier: Option<String>,
    #[serde(rename = "document-count", default, deserialize_with = "lenient_u64")]
    document_count: u64,
}

#[derive(Debug, Deserialize)]
struct AuthorProfile {
    #[serde(rename = "preferred-name", default)]
    preferred_name: Option<PreferredName>,
    #[serde(rename = "publication-range", default)]
    publication_range: Option<PublicationRange>,
    #[serde(rename = "affiliation-current", default)]
    affiliation_current: Option<AffiliationCurrent>,
}

#[derive(Debug, Deserialize)]
struct PublicationRange {
    #[serde(rename = "@start", default, deserialize_with = "lenient_i32")]
    start: Option<i32>,
    #[serde(rename = "@end", default, deserialize_with = "lenient_i32")]
    end: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct AffiliationCurrent {
    #[serde(default)]
    affiliation: Option<OneOrMany<CurrentAffiliation>>,
}

#[derive(Debug, Deserialize)]
struct CurrentAffiliation {
    #[serde(rename = "@affiliation-id", default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(rename = "ip-doc", default)]
    ip_doc: Option<IpDoc>,
}

#[derive(Debug, Deserialize)]
struct IpDoc {
    #[serde(default)]
    afdispname: Option<String>,
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl AuthorRetrievalEnvelope {
    pub fn into_profile(self, requested_id: &str) -> ClientResult<RawProfile> {
        let retrieval = self
            .response
            .into_vec()
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::malformed("author retrieval", "empty response"))?;

        let coredata = retrieval
            .coredata
            .ok_or_else(|| ClientError::malformed("author retrieval", "missing coredata"))?;
        let profile = retrieval.profile;

        let (name, range, affiliation) = match profile {
            Some(p) => (
                p.preferred_name.unwrap_or_default(),
                p.publication_range,
                p.affiliation_current.map(|c| list(c.affiliation)).and_then(|a| a.into_iter().next()),
            ),
            None => (PreferredName::default(), None, None),
        };
        let ip_doc = affiliation.as_ref().and_then(|a| a.ip_doc.as_ref());
        let address = ip_doc.and_then(|d| d.address.as_ref());

        Ok(RawProfile {
            id: coredata
                .identifier
                .as_deref()
                .map(strip_prefix)
                .unwrap_or_else(|| requested_id.to_string()),
            kind: Some(EntityKind::Person),
            surname: name.surname,
            given_name: name.given_name,
            display_name: None,
            affiliation_id: affiliation.as_ref().and_then(|a| a.id.clone()),
            affiliation_name: ip_doc.and_then(|d| d.afdispname.clone()),
            city: address.and_then(|a| a.city.clone()),
            country: address.and_then(|a| a.country.clone()),
            document_count: coredata.document_count,
            publication_range: range.and_then(|r| Some((r.start?, r.end?))),
            subject_areas: Vec::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AffiliationRetrievalEnvelope {
    #[serde(rename = "affiliation-retrieval-response")]
    response: AffiliationRetrieval,
}

#[derive(Debug, Deserialize)]
struct AffiliationRetrieval {
    #[serde(default)]
    coredata: Option<Coredata>,
    #[serde(rename = "affiliation-name", default)]
    name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl AffiliationRetrievalEnvelope {
    pub fn into_profile(self, requested_id: &str) -> RawProfile {
        let response = self.response;
        let id = response
            .coredata
            .as_ref()
            .and_then(|c| c.identifier.as_deref())
            .map(strip_prefix)
            .unwrap_or_else(|| requested_id.to_string());
        RawProfile {
            affiliation_id: Some(id.clone()),
            affiliation_name: response.name.clone(),
            id,
            kind: Some(EntityKind::Institution),
            display_name: response.name,
            city: response.city,
            country: response.country,
            document_count: response.coredata.map(|c| c.document_count).unwrap_or(0),
            ..RawProfile::default()
        }
    }
}

// =============================================================================
// Scopus search
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct ScopusEntry {
    #[serde(default)]
    eid: Option<String>,
    #[serde(rename = "dc:title", default)]
    title: Option<String>,
    #[serde(rename = "prism:coverDate", default)]
    cover_date: Option<String>,
    #[serde(rename = "subtypeDescription", default)]
    subtype: Option<String>,
    #[serde(rename = "citedby-count", default, deserialize_with = "lenient_u64")]
    cited_by: u64,
    #[serde(default)]
    affiliation: Option<OneOrMany<EntryAffiliation>>,
    #[serde(default)]
    author: Option<OneOrMany<EntryAuthor>>,
}

#[derive(Debug, Deserialize)]
struct EntryAffiliation {
    #[serde(default, deserialize_with = "lenient_string")]
    afid: Option<String>,
    #[serde(default)]
    affilname: Option<String>,
    #[serde(rename = "affiliation-country", default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntryAuthor {
    #[serde(default, deserialize_with = "lenient_string")]
    authid: Option<String>,
    #[serde(default)]
    authname: Option<String>,
    #[serde(default)]
    surname: Option<String>,
    #[serde(rename = "given-name", default)]
    given_name: Option<String>,
    #[serde(default)]
    afid: Option<OneOrMany<Dollar>>,
}

#[derive(Debug, Deserialize)]
struct Dollar {
    #[serde(rename = "$", default, deserialize_with = "lenient_string")]
    value: Option<String>,
}

impl SearchEntry for ScopusEntry {
    fn is_result(&self) -> bool {
        self.eid.is_some()
    }
}

impl ScopusEntry {
    pub fn into_document(self) -> RawDocument {
        RawDocument {
            eid: self.eid.unwrap_or_default(),
            title: self.title,
            document_type: self.subtype,
            cover_date: self.cover_date,
            authors: list(self.author)
                .into_iter()
                .map(|a| RawAuthorRef {
                    id: a.authid.unwrap_or_default(),
                    surname: a.surname,
                    given_name: a.given_name,
                    indexed_name: a.authname,
                    affiliation_ids: list(a.afid).into_iter().filter_map(|d| d.value).collect(),
                })
                .collect(),
            affiliations: list(self.affiliation)
                .into_iter()
                .map(|a| RawAffiliation {
                    id: a.afid.unwrap_or_default(),
                    name: a.affilname,
                    country: a.country,
                })
                .collect(),
            cited_by_count: self.cited_by,
        }
    }
}

// =============================================================================
// Citation overview
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct CitationEnvelope {
    #[serde(rename = "abstract-citations-response")]
    response: CitationResponse,
}

#[derive(Debug, Deserialize)]
struct CitationResponse {
    #[serde(rename = "citeInfoMatrix", default)]
    matrix: Option<CiteInfoMatrix>,
}

#[derive(Debug, Deserialize)]
struct CiteInfoMatrix {
    #[serde(rename = "citeInfoMatrixXML")]
    xml: CiteInfoMatrixXml,
}

#[derive(Debug, Deserialize)]
struct CiteInfoMatrixXml {
    #[serde(rename = "citationMatrix")]
    citation_matrix: CitationMatrix,
}

#[derive(Debug, Deserialize)]
struct CitationMatrix {
    #[serde(rename = "citeInfo", default)]
    cite_info: Option<OneOrMany<CiteInfo>>,
}

#[derive(Debug, Deserialize)]
struct CiteInfo {
    #[serde(rename = "dc:identifier", default)]
    identifier: Option<String>,
    #[serde(default)]
    cc: Option<OneOrMany<Dollar>>,
}

impl CitationEnvelope {
    pub fn into_block(self, year_start: i32, year_end: i32) -> ClientResult<RawCitationBlock> {
        let matrix = self
            .response
            .matrix
            .ok_or_else(|| ClientError::malformed("citation overview", "missing citeInfoMatrix"))?;

        let rows = list(matrix.xml.citation_matrix.cite_info)
            .into_iter()
            .map(|info| RawCitationRow {
                scopus_id: info.identifier.as_deref().map(strip_prefix).unwrap_or_default(),
                counts: list(info.cc)
                    .into_iter()
                    .map(|d| d.value.and_then(|v| v.trim().parse().ok()).unwrap_or(0))
                    .collect(),
            })
            .collect();

        Ok(RawCitationBlock { year_start, year_end, rows })
    }
}

// =============================================================================
// SciVal metrics
// =============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct MetricsEnvelope {
    #[serde(default)]
    results: Vec<MetricsResult>,
}

#[derive(Debug, Deserialize)]
struct MetricsResult {
    #[serde(default)]
    metrics: Vec<MetricBlock>,
}

#[derive(Debug, Deserialize)]
struct MetricBlock {
    #[serde(rename = "valueByYear", default)]
    value_by_year: Option<BTreeMap<String, Option<f64>>>,
    #[serde(default)]
    values: Option<Vec<MetricValues>>,
}

#[derive(Debug, Deserialize)]
struct MetricValues {
    #[serde(rename = "collabType", default)]
    collab_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    threshold: Option<String>,
    #[serde(rename = "valueByYear", default)]
    value_by_year: BTreeMap<String, Option<f64>>,
}

fn points(by_year: BTreeMap<String, Option<f64>>) -> ClientResult<Vec<(i32, Option<f64>)>> {
    let mut points = by_year
        .into_iter()
        .map(|(year, value)| {
            year.trim()
                .parse::<i32>()
                .map(|y| (y, value))
                .map_err(|_| ClientError::malformed("metrics", format!("year key '{year}'")))
        })
        .collect::<ClientResult<Vec<_>>>()?;
    points.sort_by_key(|(year, _)| *year);
    Ok(points)
}

impl MetricsEnvelope {
    pub fn into_series(self, metric_type: MetricType) -> ClientResult<RawSeries> {
        let block = self
            .results
            .into_iter()
            .next()
            .and_then(|r| r.metrics.into_iter().next())
            .ok_or_else(|| ClientError::malformed("metrics", "no metric in results"))?;

        let entries = if let Some(values) = block.values {
            values
                .into_iter()
                .map(|v| {
                    Ok(RawSeriesEntry {
                        label: v.collab_type.or(v.threshold),
                        points: points(v.value_by_year)?,
                    })
                })
                .collect::<ClientResult<Vec<_>>>()?
        } else if let Some(by_year) = block.value_by_year {
            vec![RawSeriesEntry { label: None, points: points(by_year)? }]
        } else {
            return Err(ClientError::malformed("metrics", "neither valueByYear nor values"));
        };

        Ok(RawSeries { metric_type, entries })
    }
}
