//! Collaboration records, reconciled authors and roster matches.

use serde::{Deserialize, Serialize};

use super::raw::RawCollaborationRecord;

/// Split `Last, First` into its parts. Without a comma the whole text is the last name.
#[must_use]
pub fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.split_once(',') {
        Some((last, first)) => (last.trim().to_string(), first.trim().to_string()),
        None => (full_name.trim().to_string(), String::new()),
    }
}

/// Records returned by one collaboration query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationTable {
    pub query: String,
    pub records: Vec<RawCollaborationRecord>,
}

impl CollaborationTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One real-world author folded from many mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationAuthor {
    pub full_name: String,
    pub last_name: String,
    pub first_name: String,
    pub id: String,
    pub affiliation_id: String,
    pub publication_count: u32,
}

/// An institution appearing on collaboration records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationInstitution {
    pub id: String,
    pub name: String,
    pub country: String,
    pub publication_count: u32,
}

/// A roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// `Last, First`
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}

impl RosterEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, department: Option<String>) -> Self {
        Self { name: name.into(), department }
    }

    /// Last and first name.
    #[must_use]
    pub fn name_parts(&self) -> (String, String) {
        split_full_name(&self.name)
    }
}

/// An author matched against the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyMatchResult {
    pub matched_author: CollaborationAuthor,
    pub roster_entry: RosterEntry,
    /// Similarity ratio 0-100; 100 for structural matches.
    pub confidence: u8,
    /// Accepted by similarity ratio rather than the structural rule.
    pub is_fuzzy: bool,
}

/// Outcome of matching a list of authors against a roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMatch {
    pub matched: Vec<FuzzyMatchResult>,
    pub unmatched: Vec<CollaborationAuthor>,
}

impl RosterMatch {
    /// Fuzzy flag of every match, in match order.
    #[must_use]
    pub fn fuzzy_flags(&self) -> Vec<bool> {
        self.matched.iter().map(|m| m.is_fuzzy).collect()
    }

    /// Matches that need manual review.
    pub fn fuzzy_matches(&self) -> impl Iterator<Item = &FuzzyMatchResult> {
        self.matched.iter().filter(|m| m.is_fuzzy)
    }
}
