//! Typed collaborator payloads.
//!
//! The API client decodes the upstream JSON into these structures; nothing past
//! the client sees untyped data.

use serde::{Deserialize, Serialize};

/// Kind of resolvable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A researcher.
    Person,
    /// An institution (affiliation).
    Institution,
}

impl EntityKind {
    /// Singular label for prompts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Person => "researcher",
            Self::Institution => "institution",
        }
    }
}

/// Profile of a person or institution as returned by search or retrieval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    pub id: String,
    #[serde(default)]
    pub kind: Option<EntityKind>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    /// Institution name, or the indexed name of a person.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub affiliation_id: Option<String>,
    #[serde(default)]
    pub affiliation_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub document_count: u64,
    /// First and last publication years.
    #[serde(default)]
    pub publication_range: Option<(i32, i32)>,
    #[serde(default)]
    pub subject_areas: Vec<String>,
}

impl RawProfile {
    /// `Surname, Given` for people, the display name otherwise.
    #[must_use]
    pub fn name_or_default(&self) -> String {
        match (&self.surname, &self.given_name) {
            (Some(last), Some(first)) if !first.is_empty() => format!("{last}, {first}"),
            (Some(last), _) => last.clone(),
            _ => self.display_name.clone().unwrap_or_else(|| self.id.clone()),
        }
    }
}

/// An author as listed on a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuthorRef {
    pub id: String,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub indexed_name: Option<String>,
    #[serde(default)]
    pub affiliation_ids: Vec<String>,
}

impl RawAuthorRef {
    /// `Surname, Given`, falling back to the indexed name.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.surname, &self.given_name) {
            (Some(last), Some(first)) => format!("{last}, {first}"),
            (Some(last), None) => last.clone(),
            _ => self.indexed_name.clone().unwrap_or_default(),
        }
    }
}

/// An affiliation as listed on a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAffiliation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A document from a Scopus search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    pub eid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub cover_date: Option<String>,
    #[serde(default)]
    pub authors: Vec<RawAuthorRef>,
    #[serde(default)]
    pub affiliations: Vec<RawAffiliation>,
    #[serde(default)]
    pub cited_by_count: u64,
}

impl RawDocument {
    /// Year part of the cover date.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.cover_date.as_deref().and_then(|date| date.get(..4)).and_then(|y| y.parse().ok())
    }
}

/// Per-document citation counts, one count per year from `year_start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCitationRow {
    pub scopus_id: String,
    pub counts: Vec<u64>,
}

/// Response of one citation overview call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCitationBlock {
    pub year_start: i32,
    pub year_end: i32,
    pub rows: Vec<RawCitationRow>,
}

impl RawCitationBlock {
    /// A block with a single all-zero row covering the span.
    #[must_use]
    pub fn zeroed(year_start: i32, year_end: i32) -> Self {
        let span = (year_end - year_start + 1).max(0) as usize;
        Self {
            year_start,
            year_end,
            rows: vec![RawCitationRow { scopus_id: String::new(), counts: vec![0; span] }],
        }
    }

    /// Number of years covered.
    #[must_use]
    pub fn span(&self) -> usize {
        (self.year_end - self.year_start + 1).max(0) as usize
    }
}

/// SciVal metric types consumed by the report tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    ScholarlyOutput,
    Collaboration,
    PublicationsInTopJournalPercentiles,
    OutputsInTopCitationPercentiles,
    AcademicCorporateCollaboration,
    CitationsPerPublication,
    FieldWeightedCitationImpact,
}

impl MetricType {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScholarlyOutput => "ScholarlyOutput",
            Self::Collaboration => "Collaboration",
            Self::PublicationsInTopJournalPercentiles => "PublicationsInTopJournalPercentiles",
            Self::OutputsInTopCitationPercentiles => "OutputsInTopCitationPercentiles",
            Self::AcademicCorporateCollaboration => "AcademicCorporateCollaboration",
            Self::CitationsPerPublication => "CitationsPerPublication",
            Self::FieldWeightedCitationImpact => "FieldWeightedCitationImpact",
        }
    }
}

/// Fixed year windows supported by the metrics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricWindow {
    /// Ten complete years.
    #[serde(rename = "10yrs")]
    TenYears,
    /// Three years plus the current and next year.
    #[serde(rename = "3yrsAndCurrentAndFuture")]
    ThreeYearsAndCurrentAndFuture,
    /// Five years plus the current year.
    #[serde(rename = "5yrsAndCurrent")]
    FiveYearsAndCurrent,
}

impl MetricWindow {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenYears => "10yrs",
            Self::ThreeYearsAndCurrentAndFuture => "3yrsAndCurrentAndFuture",
            Self::FiveYearsAndCurrent => "5yrsAndCurrent",
        }
    }
}

/// Journal ranking used by percentile metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JournalImpactType {
    #[default]
    CiteScore,
    #[serde(rename = "SNIP")]
    Snip,
    #[serde(rename = "SJR")]
    Sjr,
}

impl JournalImpactType {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CiteScore => "CiteScore",
            Self::Snip => "SNIP",
            Self::Sjr => "SJR",
        }
    }
}

/// Document types a metric counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IncludedDocs {
    #[default]
    AllPublicationTypes,
    ArticlesReviews,
    ArticlesConferencePapers,
}

impl IncludedDocs {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllPublicationTypes => "AllPublicationTypes",
            Self::ArticlesReviews => "ArticlesReviews",
            Self::ArticlesConferencePapers => "ArticlesConferencePapers",
        }
    }
}

/// Optional filters of a metric request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricFilters {
    pub included_docs: IncludedDocs,
    pub journal_impact_type: JournalImpactType,
    pub include_self_citations: bool,
}

impl Default for MetricFilters {
    fn default() -> Self {
        Self {
            included_docs: IncludedDocs::AllPublicationTypes,
            journal_impact_type: JournalImpactType::CiteScore,
            include_self_citations: true,
        }
    }
}

impl MetricFilters {
    /// Articles and conference papers only, for per-publication averages.
    #[must_use]
    pub const fn articles_and_conference_papers() -> Self {
        Self {
            included_docs: IncludedDocs::ArticlesConferencePapers,
            journal_impact_type: JournalImpactType::CiteScore,
            include_self_citations: true,
        }
    }

    /// Filters used for journal percentile metrics and their scholarly output.
    #[must_use]
    pub const fn snip() -> Self {
        Self {
            included_docs: IncludedDocs::ArticlesReviews,
            journal_impact_type: JournalImpactType::Snip,
            include_self_citations: true,
        }
    }
}

/// One labelled year series inside a metric response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSeriesEntry {
    /// Collaboration type or percentile threshold, absent for plain metrics.
    #[serde(default)]
    pub label: Option<String>,
    pub points: Vec<(i32, Option<f64>)>,
}

/// Response of one yearly metric call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSeries {
    pub metric_type: MetricType,
    pub entries: Vec<RawSeriesEntry>,
}

impl RawSeries {
    /// Entry with the given label.
    #[must_use]
    pub fn entry(&self, label: &str) -> Option<&RawSeriesEntry> {
        self.entries.iter().find(|e| e.label.as_deref() == Some(label))
    }

    /// First entry; plain metrics have exactly one.
    #[must_use]
    pub fn primary(&self) -> Option<&RawSeriesEntry> {
        self.entries.first()
    }
}

/// A co-authored document in the flattened, semicolon-joined form.
///
/// `author_names`, `author_ids` and `author_afids` are positionally aligned; an
/// author's afid entry joins co-affiliations with `-`. `affiliation_ids`,
/// `affiliation_names` and `affiliation_countries` are aligned with each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCollaborationRecord {
    pub eid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub author_names: String,
    #[serde(default)]
    pub author_ids: String,
    #[serde(default)]
    pub author_afids: String,
    #[serde(default)]
    pub affiliation_ids: String,
    #[serde(default)]
    pub affiliation_names: String,
    #[serde(default)]
    pub affiliation_countries: String,
    #[serde(default)]
    pub cited_by_count: u64,
}

impl From<&RawDocument> for RawCollaborationRecord {
    fn from(doc: &RawDocument) -> Self {
        let join = |values: Vec<String>| values.join(";");
        Self {
            eid: doc.eid.clone(),
            title: doc.title.clone(),
            year: doc.year(),
            document_type: doc.document_type.clone(),
            author_names: join(doc.authors.iter().map(RawAuthorRef::full_name).collect()),
            author_ids: join(doc.authors.iter().map(|a| a.id.clone()).collect()),
            author_afids: join(doc.authors.iter().map(|a| a.affiliation_ids.join("-")).collect()),
            affiliation_ids: join(doc.affiliations.iter().map(|a| a.id.clone()).collect()),
            affiliation_names: join(
                doc.affiliations.iter().map(|a| a.name.clone().unwrap_or_default()).collect(),
            ),
            affiliation_countries: join(
                doc.affiliations.iter().map(|a| a.country.clone().unwrap_or_default()).collect(),
            ),
            cited_by_count: doc.cited_by_count,
        }
    }
}
