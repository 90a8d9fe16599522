//! Documents of a resolved entity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::raw::RawDocument;
use crate::error::EngineError;

/// Placeholder type name for documents without a subtype.
pub const UNDEFINED_TYPE: &str = "Undefined";

/// A document attributed to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub eid: String,
    pub document_type: String,
    pub year: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub author_ids: Vec<String>,
    /// One entry per author, co-affiliations joined with `-`.
    #[serde(default)]
    pub author_affiliation_ids: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub cited_by_count: u64,
}

impl DocumentRecord {
    /// Numeric Scopus id: the part of the EID after the last `-`.
    #[must_use]
    pub fn scopus_id(&self) -> &str {
        self.eid.rsplit('-').next().unwrap_or(&self.eid)
    }
}

impl TryFrom<RawDocument> for DocumentRecord {
    type Error = EngineError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let year = raw.year().ok_or_else(|| {
            EngineError::malformed("document", format!("{} has no usable cover date", raw.eid))
        })?;

        // first-seen order
        let mut seen = HashSet::new();
        let countries: Vec<String> = raw
            .affiliations
            .iter()
            .filter_map(|a| a.country.clone())
            .filter(|country| seen.insert(country.clone()))
            .collect();

        Ok(Self {
            year,
            document_type: raw
                .document_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNDEFINED_TYPE.to_string()),
            title: raw.title,
            authors: raw.authors.iter().map(|a| a.full_name()).collect(),
            author_ids: raw.authors.iter().map(|a| a.id.clone()).collect(),
            author_affiliation_ids: raw.authors.iter().map(|a| a.affiliation_ids.join("-")).collect(),
            countries,
            cited_by_count: raw.cited_by_count,
            eid: raw.eid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawAffiliation;

    #[test]
    fn test_scopus_id_strips_prefix() {
        let raw = RawDocument {
            eid: "2-s2.0-85012345678".into(),
            cover_date: Some("2019-02-01".into()),
            document_type: Some("Article".into()),
            ..RawDocument::default()
        };
        let doc = DocumentRecord::try_from(raw).unwrap();
        assert_eq!(doc.scopus_id(), "85012345678");
        assert_eq!(doc.year, 2019);
    }

    #[test]
    fn test_missing_cover_date_is_malformed() {
        let raw = RawDocument { eid: "2-s2.0-1".into(), ..RawDocument::default() };
        assert!(matches!(DocumentRecord::try_from(raw), Err(EngineError::Malformed { .. })));
    }

    #[test]
    fn test_missing_type_is_undefined() {
        let raw = RawDocument {
            eid: "2-s2.0-1".into(),
            cover_date: Some("2020-01-01".into()),
            ..RawDocument::default()
        };
        assert_eq!(DocumentRecord::try_from(raw).unwrap().document_type, UNDEFINED_TYPE);
    }

    #[test]
    fn test_countries_are_distinct_in_first_seen_order() {
        let affiliation = |id: &str, country: &str| RawAffiliation {
            id: id.into(),
            name: None,
            country: Some(country.into()),
        };
        let raw = RawDocument {
            eid: "2-s2.0-1".into(),
            cover_date: Some("2020-01-01".into()),
            affiliations: vec![
                affiliation("1", "Canada"),
                affiliation("2", "United States"),
                affiliation("3", "Canada"),
            ],
            ..RawDocument::default()
        };
        let doc = DocumentRecord::try_from(raw).unwrap();
        assert_eq!(doc.countries, vec!["Canada".to_string(), "United States".to_string()]);
    }
}
