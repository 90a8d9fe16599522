//! Session states and the transition table.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A session state; each one prompts for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ReportKind,
    ResearcherSearch,
    HomonymChoice,
    ExcludeTypes,
    YearWindows,
    HighlightTypes,
    EntityAKind,
    EntityAGroup,
    EntityAIds,
    EntityAHomonym,
    EntityBKind,
    EntityBGroup,
    EntityBIds,
    EntityBHomonym,
    CollabYears,
}

impl Step {
    /// Every state, in code order.
    pub const ALL: [Self; 15] = [
        Self::ReportKind,
        Self::ResearcherSearch,
        Self::HomonymChoice,
        Self::ExcludeTypes,
        Self::YearWindows,
        Self::HighlightTypes,
        Self::EntityAKind,
        Self::EntityAGroup,
        Self::EntityAIds,
        Self::EntityAHomonym,
        Self::EntityBKind,
        Self::EntityBGroup,
        Self::EntityBIds,
        Self::EntityBHomonym,
        Self::CollabYears,
    ];

    /// Numeric state code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::ReportKind => 0,
            Self::ResearcherSearch => 1,
            Self::HomonymChoice => 2,
            Self::ExcludeTypes => 3,
            Self::YearWindows => 4,
            Self::HighlightTypes => 5,
            Self::EntityAKind => 11,
            Self::EntityAGroup => 12,
            Self::EntityAIds => 13,
            Self::EntityAHomonym => 14,
            Self::EntityBKind => 15,
            Self::EntityBGroup => 16,
            Self::EntityBIds => 17,
            Self::EntityBHomonym => 18,
            Self::CollabYears => 19,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[derive(Debug, Clone)]
struct Edges {
    successors: Vec<Step>,
    on_back: Option<Step>,
}

/// Successors and logical predecessor of every state.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    edges: HashMap<Step, Edges>,
}

impl TransitionTable {
    #[must_use]
    pub fn new() -> Self {
        use Step::{
            CollabYears, EntityAGroup, EntityAHomonym, EntityAIds, EntityAKind, EntityBGroup,
            EntityBHomonym, EntityBIds, EntityBKind, ExcludeTypes, HighlightTypes, HomonymChoice,
            ReportKind, ResearcherSearch, YearWindows,
        };

        let rows: [(Step, &[Step], Option<Step>); 15] = [
            (ReportKind, &[ResearcherSearch, EntityAKind], None),
            (ResearcherSearch, &[HomonymChoice, ExcludeTypes], Some(ReportKind)),
            (HomonymChoice, &[ExcludeTypes], Some(ResearcherSearch)),
            (ExcludeTypes, &[YearWindows], Some(HomonymChoice)),
            (YearWindows, &[HighlightTypes], Some(ExcludeTypes)),
            (HighlightTypes, &[ResearcherSearch], Some(YearWindows)),
            (EntityAKind, &[EntityAGroup, EntityAIds], Some(ReportKind)),
            (EntityAGroup, &[EntityBKind, EntityAIds], Some(EntityAKind)),
            (EntityAIds, &[EntityAHomonym, EntityBKind], Some(EntityAGroup)),
            (EntityAHomonym, &[EntityBKind], Some(EntityAIds)),
            (EntityBKind, &[EntityBGroup, EntityBIds], Some(EntityAHomonym)),
            (EntityBGroup, &[CollabYears, EntityBIds], Some(EntityBKind)),
            (EntityBIds, &[EntityBHomonym, CollabYears], Some(EntityBGroup)),
            (EntityBHomonym, &[CollabYears], Some(EntityBIds)),
            (CollabYears, &[ReportKind], Some(EntityBHomonym)),
        ];

        let edges = rows
            .into_iter()
            .map(|(step, successors, on_back)| {
                (step, Edges { successors: successors.to_vec(), on_back })
            })
            .collect();
        Self { edges }
    }

    /// States reachable from `step` on valid input.
    #[must_use]
    pub fn successors(&self, step: Step) -> &[Step] {
        self.edges.get(&step).map_or(&[], |e| e.successors.as_slice())
    }

    #[must_use]
    pub fn allows(&self, from: Step, to: Step) -> bool {
        self.successors(from).contains(&to)
    }

    /// Logical predecessor, ignoring which states were actually visited.
    #[must_use]
    pub fn on_back(&self, step: Step) -> Option<Step> {
        self.edges.get(&step).and_then(|e| e.on_back)
    }

    /// Predecessors of `step`, nearest first.
    pub fn back_chain(&self, step: Step) -> impl Iterator<Item = Step> + '_ {
        std::iter::successors(self.on_back(step), move |s| self.on_back(*s))
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for step in Step::ALL {
            assert_eq!(Step::from_code(step.code()), Some(step));
        }
        assert_eq!(Step::from_code(7), None);
    }

    #[test]
    fn test_every_state_has_edges() {
        let table = TransitionTable::new();
        for step in Step::ALL {
            assert!(!table.successors(step).is_empty(), "{step}");
        }
    }

    #[test]
    fn test_back_chain_reaches_root() {
        let table = TransitionTable::new();
        for step in Step::ALL {
            let chain: Vec<Step> = table.back_chain(step).collect();
            assert!(step == Step::ReportKind || chain.last() == Some(&Step::ReportKind), "{step}");
        }
    }

    #[test]
    fn test_back_chain_passes_skippable_states() {
        let table = TransitionTable::new();
        let chain: Vec<Step> = table.back_chain(Step::YearWindows).collect();
        assert_eq!(
            chain,
            vec![Step::ExcludeTypes, Step::HomonymChoice, Step::ResearcherSearch, Step::ReportKind]
        );
    }
}
