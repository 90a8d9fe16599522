//! Data models for entities, documents, metrics and collaborations.
//!
//! All models use `#[serde(default)]` for optional fields and
//! `#[serde(rename_all = "camelCase")]` for their serialized form.

mod collaboration;
mod document;
mod entity;
mod raw;
mod usage;

pub use collaboration::{
    CollaborationAuthor, CollaborationInstitution, CollaborationTable, FuzzyMatchResult,
    RosterEntry, RosterMatch, split_full_name,
};
pub use document::{DocumentRecord, UNDEFINED_TYPE};
pub use entity::{CandidateList, EntityProfile};
pub use raw::{
    EntityKind, IncludedDocs, JournalImpactType, MetricFilters, MetricType, MetricWindow,
    RawAffiliation, RawAuthorRef, RawCitationBlock, RawCitationRow, RawCollaborationRecord,
    RawDocument, RawProfile, RawSeries, RawSeriesEntry,
};
pub use usage::{ApiUsage, Endpoint, Metered, RateLimitInfo};
