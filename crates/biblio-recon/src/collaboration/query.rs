//! Boolean entity-pair queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::metrics::YearSpan;

/// One side of a collaboration query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum EntitySpec {
    /// Author identifiers.
    Researchers(Vec<String>),
    /// Affiliation identifiers.
    Institutions(Vec<String>),
    /// Affiliation country name.
    Country(String),
}

impl EntitySpec {
    /// Identifiers of the entity set; empty for a country.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        match self {
            Self::Researchers(ids) | Self::Institutions(ids) => ids,
            Self::Country(_) => &[],
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Researchers(ids) | Self::Institutions(ids) => ids.iter().all(|id| id.trim().is_empty()),
            Self::Country(name) => name.trim().is_empty(),
        }
    }

    fn clause(&self) -> String {
        let or_group = |field: &str, ids: &[String]| {
            ids.iter().map(|id| format!("{field}({})", id.trim())).collect::<Vec<_>>().join(" OR ")
        };
        match self {
            Self::Researchers(ids) => or_group("AU-ID", ids),
            Self::Institutions(ids) => or_group("AF-ID", ids),
            Self::Country(name) => format!("AFFILCOUNTRY({})", name.trim()),
        }
    }
}

/// Entity A co-authoring with entity B within a year span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationQuery {
    pub entity_a: EntitySpec,
    pub entity_b: EntitySpec,
    pub years: YearSpan,
}

impl CollaborationQuery {
    /// # Errors
    ///
    /// `MalformedQuery` if entity A is a country or either side is empty.
    pub fn new(entity_a: EntitySpec, entity_b: EntitySpec, years: YearSpan) -> Result<Self, InputError> {
        if let EntitySpec::Country(name) = &entity_a {
            return Err(InputError::malformed_query(name, "entity A cannot be a country"));
        }
        if entity_a.is_empty() || entity_b.is_empty() {
            return Err(InputError::malformed_query("", "both entities need at least one identifier"));
        }
        Ok(Self { entity_a, entity_b, years })
    }
}

impl fmt::Display for CollaborationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) AND (({}) AND PUBYEAR > {} AND PUBYEAR < {})",
            self.entity_a.clause(),
            self.entity_b.clause(),
            self.years.start - 1,
            self.years.end + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_and_country() {
        let query = CollaborationQuery::new(
            EntitySpec::Researchers(vec!["12345".into()]),
            EntitySpec::Country("Canada".into()),
            YearSpan { start: 2018, end: 2022 },
        )
        .unwrap();
        assert_eq!(
            query.to_string(),
            "(AU-ID(12345)) AND ((AFFILCOUNTRY(Canada)) AND PUBYEAR > 2017 AND PUBYEAR < 2023)"
        );
    }

    #[test]
    fn test_or_groups() {
        let query = CollaborationQuery::new(
            EntitySpec::Institutions(vec!["60026786".into(), "60000001".into()]),
            EntitySpec::Researchers(vec!["1".into(), "2".into()]),
            YearSpan { start: 2020, end: 2020 },
        )
        .unwrap();
        assert_eq!(
            query.to_string(),
            "(AF-ID(60026786) OR AF-ID(60000001)) AND ((AU-ID(1) OR AU-ID(2)) AND PUBYEAR > 2019 AND PUBYEAR < 2021)"
        );
    }

    #[test]
    fn test_country_cannot_be_entity_a() {
        assert!(
            CollaborationQuery::new(
                EntitySpec::Country("Canada".into()),
                EntitySpec::Researchers(vec!["1".into()]),
                YearSpan { start: 2020, end: 2021 },
            )
            .is_err()
        );
        assert!(
            CollaborationQuery::new(
                EntitySpec::Researchers(Vec::new()),
                EntitySpec::Country("Canada".into()),
                YearSpan { start: 2020, end: 2021 },
            )
            .is_err()
        );
    }
}
