//! Resolved entities and homonym candidate lists.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::document::DocumentRecord;
use super::raw::{EntityKind, RawProfile};

/// A resolved person or institution.
///
/// Fields are fixed at resolution. The document list is fetched at most once
/// per profile and shared between clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProfile {
    pub id: String,
    pub kind: EntityKind,
    pub display_name: String,
    pub affiliation_id: Option<String>,
    pub affiliation_name: Option<String>,
    pub country: Option<String>,
    pub document_count: u64,
    pub publication_range: Option<(i32, i32)>,
    #[serde(skip)]
    documents: Arc<OnceCell<Arc<[DocumentRecord]>>>,
}

impl EntityProfile {
    /// Build from a fully retrieved profile.
    #[must_use]
    pub fn from_raw(raw: &RawProfile, kind: EntityKind) -> Self {
        Self {
            id: raw.id.clone(),
            kind: raw.kind.unwrap_or(kind),
            display_name: raw.name_or_default(),
            affiliation_id: raw.affiliation_id.clone(),
            affiliation_name: raw.affiliation_name.clone(),
            country: raw.country.clone(),
            document_count: raw.document_count,
            publication_range: raw.publication_range,
            documents: Arc::default(),
        }
    }

    /// Documents, if they have been fetched already.
    #[must_use]
    pub fn cached_documents(&self) -> Option<Arc<[DocumentRecord]>> {
        self.documents.get().cloned()
    }

    pub(crate) fn document_cell(&self) -> &OnceCell<Arc<[DocumentRecord]>> {
        &self.documents
    }

    /// First publication year, from the profile or the fetched documents.
    #[must_use]
    pub fn first_publication_year(&self) -> Option<i32> {
        self.publication_range
            .map(|(start, _)| start)
            .or_else(|| self.cached_documents().and_then(|docs| docs.iter().map(|d| d.year).min()))
    }
}

impl PartialEq for EntityProfile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind && self.display_name == other.display_name
    }
}

/// Search results awaiting a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateList {
    pub query: String,
    pub kind: EntityKind,
    pub candidates: Vec<RawProfile>,
}

impl CandidateList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RawProfile> {
        self.candidates.get(index)
    }
}
