//! Entity resolution and homonym disambiguation.

use std::sync::Arc;

use futures::future::join_all;

use crate::client::{BibliometricApi, PersonQuery};
use crate::error::{EngineError, EngineResult, InputError};
use crate::models::{
    ApiUsage, CandidateList, DocumentRecord, EntityKind, EntityProfile, Metered,
};

/// A parsed search prompt answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// `last, first`
    Person(PersonQuery),
    /// Comma-separated numeric identifiers.
    Identifiers(Vec<String>),
}

impl SearchQuery {
    /// All-numeric tokens are identifiers; anything else must be `last, first`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedQuery` for empty input or a name without exactly two parts.
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
        if tokens.iter().all(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit())) {
            return Ok(Self::Identifiers(tokens.into_iter().map(str::to_string).collect()));
        }

        match tokens.as_slice() {
            [last, first] if !last.is_empty() && !first.is_empty() => Ok(Self::Person(PersonQuery {
                last_name: (*last).to_string(),
                first_name: (*first).to_string(),
            })),
            _ => Err(InputError::malformed_query(
                text.trim(),
                "expected 'last name, first name' or a list of identifiers",
            )),
        }
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exactly one entity; no disambiguation needed.
    Unique(EntityProfile),
    /// Identifier list; `missing` holds the ids the API did not know.
    Group { members: Vec<EntityProfile>, missing: Vec<String> },
    /// Several candidates share the name.
    Homonyms(CandidateList),
}

/// Resolves queries to profiles through the API collaborator.
pub struct EntityResolver<'a> {
    api: &'a dyn BibliometricApi,
}

impl<'a> EntityResolver<'a> {
    #[must_use]
    pub fn new(api: &'a dyn BibliometricApi) -> Self {
        Self { api }
    }

    /// Search for `kind` entities.
    ///
    /// # Errors
    ///
    /// `NoMatch` when nothing is found, `MalformedQuery` for an institution
    /// name, `Upstream` for API failures.
    pub async fn search(
        &self,
        query: &SearchQuery,
        kind: EntityKind,
    ) -> EngineResult<Metered<Resolution>> {
        match query {
            SearchQuery::Person(person) => {
                if kind == EntityKind::Institution {
                    return Err(InputError::malformed_query(
                        format!("{}, {}", person.last_name, person.first_name),
                        "institutions are searched by identifier",
                    )
                    .into());
                }
                self.search_person(person).await
            }
            SearchQuery::Identifiers(ids) => self.fetch_group(ids, kind).await,
        }
    }

    async fn search_person(&self, query: &PersonQuery) -> EngineResult<Metered<Resolution>> {
        let label = format!("{}, {}", query.last_name, query.first_name);
        let mut usage = ApiUsage::default();
        let candidates = self.api.search_people(query).await?.take(&mut usage);
        tracing::info!(query = %label, candidates = candidates.len(), "Person search");

        match candidates.as_slice() {
            [] => Err(InputError::no_match(label).into()),
            [only] => {
                let raw = self.api.fetch_profile(&only.id, EntityKind::Person).await?.take(&mut usage);
                let profile = EntityProfile::from_raw(&raw, EntityKind::Person);
                Ok(Metered::new(Resolution::Unique(profile), usage))
            }
            _ => Ok(Metered::new(
                Resolution::Homonyms(CandidateList {
                    query: label,
                    kind: EntityKind::Person,
                    candidates,
                }),
                usage,
            )),
        }
    }

    async fn fetch_group(&self, ids: &[String], kind: EntityKind) -> EngineResult<Metered<Resolution>> {
        let responses = join_all(ids.iter().map(|id| self.api.fetch_profile(id, kind))).await;

        let mut usage = ApiUsage::default();
        let mut members = Vec::new();
        let mut missing = Vec::new();
        for (id, response) in ids.iter().zip(responses) {
            match response {
                Ok(metered) => {
                    let raw = metered.take(&mut usage);
                    members.push(EntityProfile::from_raw(&raw, kind));
                }
                Err(err) if err.is_not_found() => {
                    tracing::warn!(id = %id, kind = kind.label(), "Identifier not found");
                    missing.push(id.clone());
                }
                Err(err) => return Err(err.into()),
            }
        }

        if members.is_empty() {
            return Err(InputError::no_match(ids.join(",")).into());
        }
        let resolution = if ids.len() == 1 {
            Resolution::Unique(members.remove(0))
        } else {
            Resolution::Group { members, missing }
        };
        Ok(Metered::new(resolution, usage))
    }

    /// Pick a candidate by index and retrieve its full profile.
    ///
    /// # Errors
    ///
    /// `InvalidIndex` unless `index_text` is an integer in `0..candidates.len()`.
    pub async fn resolve(
        &self,
        candidates: &CandidateList,
        index_text: &str,
    ) -> EngineResult<Metered<EntityProfile>> {
        let index = parse_index(index_text, candidates.len())?;
        let chosen = candidates.get(index).ok_or_else(|| EngineError::internal("candidate vanished"))?;
        let raw = self.api.fetch_profile(&chosen.id, candidates.kind).await?;
        Ok(raw.map(|raw| EntityProfile::from_raw(&raw, candidates.kind)))
    }

    /// Documents of `profile`, fetched once and cached on the profile.
    ///
    /// # Errors
    ///
    /// `Upstream` for API failures, `Malformed` for documents without a date.
    pub async fn documents(&self, profile: &EntityProfile) -> EngineResult<Metered<Arc<[DocumentRecord]>>> {
        let mut usage = ApiUsage::default();
        let sink = &mut usage;
        let documents = profile
            .document_cell()
            .get_or_try_init(|| async move {
                let raw = self.api.fetch_documents(&profile.id).await?.take(sink);
                tracing::debug!(entity = %profile.id, documents = raw.len(), "Fetched documents");
                raw.into_iter()
                    .map(DocumentRecord::try_from)
                    .collect::<EngineResult<Vec<_>>>()
                    .map(Arc::from)
            })
            .await?
            .clone();
        Ok(Metered::new(documents, usage))
    }
}

/// Parse a candidate index below `count`.
///
/// # Errors
///
/// `InvalidIndex` for anything else.
pub fn parse_index(text: &str, count: usize) -> Result<usize, InputError> {
    let trimmed = text.trim();
    trimmed
        .parse::<usize>()
        .ok()
        .filter(|i| *i < count && trimmed.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| InputError::InvalidIndex {
            input: trimmed.to_string(),
            max: count.saturating_sub(1),
        })
}
