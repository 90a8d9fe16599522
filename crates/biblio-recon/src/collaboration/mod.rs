//! Collaboration extraction between two entity sets.
//!
//! Builds the boolean query for an entity pair, fetches the matching records
//! and reconciles author and institution identities across them.

mod matching;
mod query;
mod reconcile;

pub use matching::{LevenshteinRatio, RosterMatcher, SimilarityScorer, normalize_name};
pub use query::{CollaborationQuery, EntitySpec};
pub use reconcile::{
    IdentityRule, institution_roster, reconcile_authors, reconcile_authors_in_affiliations,
    reconcile_authors_in_country, reconcile_authors_with_ids,
};

use crate::client::BibliometricApi;
use crate::config::Tuning;
use crate::error::EngineResult;
use crate::models::{CollaborationAuthor, CollaborationTable, Metered, RosterEntry, RosterMatch};

/// Result of running a collaboration query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// At least one record.
    Records(CollaborationTable),
    /// The query was well formed and matched nothing.
    NoResults { query: String },
}

/// Fetches and reconciles collaboration records.
pub struct CollaborationExtractor<'a> {
    api: &'a dyn BibliometricApi,
    rule: IdentityRule,
    matcher: RosterMatcher,
}

impl<'a> CollaborationExtractor<'a> {
    #[must_use]
    pub fn new(api: &'a dyn BibliometricApi, tuning: &Tuning) -> Self {
        Self {
            api,
            rule: IdentityRule::from_tuning(tuning),
            matcher: RosterMatcher::from_tuning(tuning),
        }
    }

    /// Replace the roster matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: RosterMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    #[must_use]
    pub const fn rule(&self) -> IdentityRule {
        self.rule
    }

    /// Run the query for an entity pair.
    ///
    /// # Errors
    ///
    /// `Upstream` if the search fails. An empty result is `NoResults`, not an error.
    pub async fn extract(&self, query: &CollaborationQuery) -> EngineResult<Metered<Extraction>> {
        let text = query.to_string();
        tracing::info!(query = %text, "Extracting collaborations");

        let records = self.api.search_collaboration(&text).await?;
        Ok(records.map(|records| {
            if records.is_empty() {
                tracing::info!(query = %text, "Collaboration query returned no records");
                Extraction::NoResults { query: text }
            } else {
                Extraction::Records(CollaborationTable { query: text, records })
            }
        }))
    }

    /// Every author on the table, folded by identity.
    ///
    /// # Errors
    ///
    /// `Malformed` when a record's author lists are not aligned.
    pub fn reconcile_authors(&self, table: &CollaborationTable) -> EngineResult<Vec<CollaborationAuthor>> {
        reconcile_authors(table, self.rule)
    }

    /// Authors belonging to one side of the query.
    ///
    /// # Errors
    ///
    /// `Malformed` when a record's lists are not aligned.
    pub fn reconcile_side(
        &self,
        table: &CollaborationTable,
        side: &EntitySpec,
    ) -> EngineResult<Vec<CollaborationAuthor>> {
        match side {
            EntitySpec::Researchers(ids) => reconcile_authors_with_ids(table, ids, self.rule),
            EntitySpec::Institutions(ids) => reconcile_authors_in_affiliations(table, ids, self.rule),
            EntitySpec::Country(country) => reconcile_authors_in_country(table, country, self.rule),
        }
    }

    /// Match authors against a roster; an empty roster leaves all unmatched.
    #[must_use]
    pub fn fuzzy_match_roster(&self, authors: &[CollaborationAuthor], roster: &[RosterEntry]) -> RosterMatch {
        self.matcher.fuzzy_match_roster(authors, roster)
    }
}
