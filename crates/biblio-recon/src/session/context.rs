//! State carried between session steps.

use serde::{Deserialize, Serialize};

use crate::catalog::{DocumentTypeCatalog, TypeSelection};
use crate::collaboration::EntitySpec;
use crate::metrics::{MetricSeries, YearWindow};
use crate::models::{CandidateList, EntityKind, EntityProfile};
use crate::report::{RenderHandle, ReportKind, ReportTables};

/// A predefined entity set offered at the group steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedGroup {
    pub label: String,
    pub kind: EntityKind,
    pub ids: Vec<String>,
}

impl NamedGroup {
    #[must_use]
    pub fn new(label: impl Into<String>, kind: EntityKind, ids: Vec<String>) -> Self {
        Self { label: label.into(), kind, ids }
    }

    #[must_use]
    pub fn spec(&self) -> EntitySpec {
        match self.kind {
            EntityKind::Person => EntitySpec::Researchers(self.ids.clone()),
            EntityKind::Institution => EntitySpec::Institutions(self.ids.clone()),
        }
    }
}

/// What one side of a collaboration query is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideKind {
    Researchers,
    Institutions,
    Country,
}

impl SideKind {
    /// Entity kind resolved by identifier, `None` for a country.
    #[must_use]
    pub const fn entity_kind(self) -> Option<EntityKind> {
        match self {
            Self::Researchers => Some(EntityKind::Person),
            Self::Institutions => Some(EntityKind::Institution),
            Self::Country => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Researchers => "researchers",
            Self::Institutions => "institutions",
            Self::Country => "country",
        }
    }
}

/// One side of a collaboration query while it is being assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideDraft {
    pub kind: Option<SideKind>,
    pub candidates: Option<CandidateList>,
    pub spec: Option<EntitySpec>,
    pub label: String,
}

/// Everything accumulated on the current path.
///
/// Cloned before each step and committed only when the step succeeds.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub kind: Option<ReportKind>,
    pub candidates: Option<CandidateList>,
    pub entity: Option<EntityProfile>,
    pub catalog: Option<DocumentTypeCatalog>,
    pub selection: Option<TypeSelection>,
    pub citations: Option<MetricSeries>,
    pub window: Option<YearWindow>,
    pub tables: ReportTables,
    pub render: Option<RenderHandle>,
    pub side_a: SideDraft,
    pub side_b: SideDraft,
}

impl SessionContext {
    /// Fresh context for another report of `kind`.
    #[must_use]
    pub fn for_kind(kind: ReportKind) -> Self {
        Self { kind: Some(kind), ..Self::default() }
    }
}
