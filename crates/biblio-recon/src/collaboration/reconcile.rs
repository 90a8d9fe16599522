//! Identity reconciliation over collaboration records.
//!
//! Each record lists its authors as three positionally aligned, `;`-joined
//! lists (names, ids, affiliation ids). Mentions are folded into one
//! [`CollaborationAuthor`] per person under the [`IdentityRule`].

use crate::config::Tuning;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CollaborationAuthor, CollaborationInstitution, CollaborationTable, RawCollaborationRecord,
    split_full_name,
};

/// Decides whether two names denote the same person.
///
/// Last names must be equal. First names are compared on their leading
/// `prefix` characters, or on one character when the shorter name is shorter
/// than that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityRule {
    prefix: usize,
}

impl IdentityRule {
    #[must_use]
    pub const fn new(prefix: usize) -> Self {
        Self { prefix }
    }

    #[must_use]
    pub const fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.first_name_prefix)
    }

    #[must_use]
    pub fn same_person(&self, last_a: &str, first_a: &str, last_b: &str, first_b: &str) -> bool {
        last_a == last_b && self.first_names_match(first_a, first_b)
    }

    #[must_use]
    pub fn first_names_match(&self, a: &str, b: &str) -> bool {
        let shorter = a.chars().count().min(b.chars().count());
        let n = if shorter >= self.prefix { self.prefix } else { 1 };
        a.chars().take(n).eq(b.chars().take(n))
    }
}

impl Default for IdentityRule {
    fn default() -> Self {
        Self::new(2)
    }
}

/// One author mention on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mention<'a> {
    pub full_name: &'a str,
    pub id: &'a str,
    pub afids: &'a str,
}

impl Mention<'_> {
    /// Co-affiliations of the mention.
    pub fn affiliation_ids(&self) -> impl Iterator<Item = &str> {
        self.afids.split('-').map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Split the aligned author lists of a record.
pub(crate) fn mentions(record: &RawCollaborationRecord) -> EngineResult<Vec<Mention<'_>>> {
    if record.author_names.trim().is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<&str> = record.author_names.split(';').map(str::trim).collect();
    let ids: Vec<&str> = record.author_ids.split(';').map(str::trim).collect();
    let afids: Vec<&str> = record.author_afids.split(';').map(str::trim).collect();

    if names.len() != ids.len() || names.len() != afids.len() {
        return Err(EngineError::malformed(
            "collaboration record",
            format!(
                "{}: {} names, {} ids, {} affiliation entries",
                record.eid,
                names.len(),
                ids.len(),
                afids.len()
            ),
        ));
    }

    Ok(names
        .into_iter()
        .zip(ids)
        .zip(afids)
        .map(|((full_name, id), afids)| Mention { full_name, id, afids })
        .collect())
}

/// Aligned `(id, name, country)` affiliations of a record.
fn affiliations(record: &RawCollaborationRecord) -> EngineResult<Vec<(&str, &str, &str)>> {
    if record.affiliation_ids.trim().is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<&str> = record.affiliation_ids.split(';').map(str::trim).collect();
    let names: Vec<&str> = record.affiliation_names.split(';').map(str::trim).collect();
    let countries: Vec<&str> = record.affiliation_countries.split(';').map(str::trim).collect();

    if ids.len() != names.len() || ids.len() != countries.len() {
        return Err(EngineError::malformed(
            "collaboration record",
            format!(
                "{}: {} affiliation ids, {} names, {} countries",
                record.eid,
                ids.len(),
                names.len(),
                countries.len()
            ),
        ));
    }
    Ok(ids.into_iter().zip(names).zip(countries).map(|((i, n), c)| (i, n, c)).collect())
}

/// Fold mentions accepted by `keep` into authors, in first-seen order.
fn fold<F>(table: &CollaborationTable, rule: IdentityRule, keep: F) -> EngineResult<Vec<CollaborationAuthor>>
where
    F: Fn(&RawCollaborationRecord, &Mention<'_>) -> EngineResult<bool>,
{
    let mut authors: Vec<CollaborationAuthor> = Vec::new();

    for record in &table.records {
        for mention in mentions(record)? {
            if !keep(record, &mention)? {
                continue;
            }
            let (last, first) = split_full_name(mention.full_name);
            let existing = authors
                .iter_mut()
                .find(|a| rule.same_person(&a.last_name, &a.first_name, &last, &first));

            match existing {
                Some(author) => {
                    author.publication_count += 1;
                    if first.chars().count() > author.first_name.chars().count() {
                        author.full_name = mention.full_name.to_string();
                        author.first_name = first;
                    }
                    author.id = mention.id.to_string();
                    author.affiliation_id = mention.afids.to_string();
                }
                None => authors.push(CollaborationAuthor {
                    full_name: mention.full_name.to_string(),
                    last_name: last,
                    first_name: first,
                    id: mention.id.to_string(),
                    affiliation_id: mention.afids.to_string(),
                    publication_count: 1,
                }),
            }
        }
    }
    Ok(authors)
}

/// Every author of the table.
///
/// # Errors
///
/// `Malformed` when a record's author lists are not aligned.
pub fn reconcile_authors(table: &CollaborationTable, rule: IdentityRule) -> EngineResult<Vec<CollaborationAuthor>> {
    fold(table, rule, |_, _| Ok(true))
}

/// Authors whose id is one of `ids`.
///
/// # Errors
///
/// `Malformed` when a record's author lists are not aligned.
pub fn reconcile_authors_with_ids(
    table: &CollaborationTable,
    ids: &[String],
    rule: IdentityRule,
) -> EngineResult<Vec<CollaborationAuthor>> {
    fold(table, rule, |_, m| Ok(ids.iter().any(|id| id == m.id)))
}

/// Authors with at least one co-affiliation in `affiliation_ids`.
///
/// # Errors
///
/// `Malformed` when a record's author lists are not aligned.
pub fn reconcile_authors_in_affiliations(
    table: &CollaborationTable,
    affiliation_ids: &[String],
    rule: IdentityRule,
) -> EngineResult<Vec<CollaborationAuthor>> {
    fold(table, rule, |_, m| Ok(m.affiliation_ids().any(|afid| affiliation_ids.iter().any(|t| t == afid))))
}

/// Authors with at least one co-affiliation located in `country`.
///
/// # Errors
///
/// `Malformed` when a record's author or affiliation lists are not aligned.
pub fn reconcile_authors_in_country(
    table: &CollaborationTable,
    country: &str,
    rule: IdentityRule,
) -> EngineResult<Vec<CollaborationAuthor>> {
    let country = country.trim();
    fold(table, rule, |record, mention| {
        let affiliations = affiliations(record)?;
        Ok(mention.affiliation_ids().any(|afid| {
            affiliations.iter().any(|(id, _, c)| *id == afid && c.eq_ignore_ascii_case(country))
        }))
    })
}

/// Institutions with the number of records they appear on, most frequent
/// first, optionally restricted to one country.
///
/// # Errors
///
/// `Malformed` when a record's affiliation lists are not aligned.
pub fn institution_roster(
    table: &CollaborationTable,
    country: Option<&str>,
) -> EngineResult<Vec<CollaborationInstitution>> {
    let mut institutions: Vec<CollaborationInstitution> = Vec::new();

    for record in &table.records {
        let mut seen: Vec<&str> = Vec::new();
        for (id, name, record_country) in affiliations(record)? {
            if id.is_empty() || seen.contains(&id) {
                continue;
            }
            seen.push(id);
            if country.is_some_and(|c| !record_country.eq_ignore_ascii_case(c.trim())) {
                continue;
            }
            match institutions.iter_mut().find(|i| i.id == id) {
                Some(existing) => existing.publication_count += 1,
                None => institutions.push(CollaborationInstitution {
                    id: id.to_string(),
                    name: name.to_string(),
                    country: record_country.to_string(),
                    publication_count: 1,
                }),
            }
        }
    }

    institutions.sort_by(|a, b| b.publication_count.cmp(&a.publication_count));
    Ok(institutions)
}
