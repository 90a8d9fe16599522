//! Interactive report session.
//!
//! A [`Session`] walks the user through one report at a time. Each call to
//! [`Session::submit`] validates one answer, runs the aggregation it unlocks and
//! commits the result only if every step of that work succeeded. Input errors
//! re-emit the current prompt; any other error leaves the session untouched.
//!
//! The path of visited states is kept with a context snapshot per state, so
//! [`Session::back`] lands on the nearest state that actually prompted.

mod context;
mod steps;
mod transitions;

pub use context::{NamedGroup, SessionContext, SideDraft, SideKind};
pub use transitions::{Step, TransitionTable};

use std::sync::Arc;

use chrono::Datelike;
use serde::Serialize;

use crate::client::BibliometricApi;
use crate::config::Tuning;
use crate::error::{EngineError, EngineResult, InputError};
use crate::models::{ApiUsage, CandidateList, EntityKind};
use crate::metrics::YearWindowPlanner;
use crate::report::{Report, ReportRenderer, Table, TableName};
use crate::roster::RosterSource;

/// What a state asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub step: Step,
    pub message: String,
    pub options: Vec<String>,
}

impl Prompt {
    fn new(step: Step, message: impl Into<String>) -> Self {
        Self { step, message: message.into(), options: Vec::new() }
    }

    fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

/// Result of one submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Moved to the next state.
    Advanced,
    /// The answer was invalid; the state did not change.
    Rejected(InputError),
    /// A report was completed.
    ReportReady(Report),
    /// The collaboration query matched nothing; no tables were built.
    NoResults { query: String },
}

/// Answer to [`Session::submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepReply {
    /// State the session is in now.
    pub step: Step,
    pub prompt: Prompt,
    pub outcome: Outcome,
    pub notices: Vec<String>,
    /// Tables produced by this step, for immediate display.
    pub tables: Vec<(TableName, Table)>,
}

/// Work done by a successful step, applied on commit.
#[derive(Debug)]
struct Effect {
    next: Step,
    outcome: Outcome,
    notices: Vec<String>,
    tables: Vec<(TableName, Table)>,
    usage: ApiUsage,
}

impl Effect {
    fn advance(next: Step) -> Self {
        Self {
            next,
            outcome: Outcome::Advanced,
            notices: Vec::new(),
            tables: Vec::new(),
            usage: ApiUsage::default(),
        }
    }

    fn with_table(mut self, name: TableName, table: Table) -> Self {
        self.tables.push((name, table));
        self
    }

    fn with_usage(mut self, usage: ApiUsage) -> Self {
        self.usage.merge(usage);
        self
    }
}

#[derive(Debug, Clone)]
struct Frame {
    step: Step,
    snapshot: SessionContext,
}

/// One user's report session.
pub struct Session {
    api: Arc<dyn BibliometricApi>,
    renderer: Arc<dyn ReportRenderer>,
    roster: Option<Arc<dyn RosterSource>>,
    tuning: Tuning,
    groups: Vec<NamedGroup>,
    current_year: i32,
    transitions: TransitionTable,
    path: Vec<Frame>,
    context: SessionContext,
    usage: ApiUsage,
}

impl Session {
    /// A session waiting for the report kind.
    #[must_use]
    pub fn new(api: Arc<dyn BibliometricApi>, renderer: Arc<dyn ReportRenderer>, tuning: Tuning) -> Self {
        let context = SessionContext::default();
        Self {
            api,
            renderer,
            roster: None,
            tuning,
            groups: Vec::new(),
            current_year: chrono::Utc::now().year(),
            transitions: TransitionTable::new(),
            path: vec![Frame { step: Step::ReportKind, snapshot: context.clone() }],
            context,
            usage: ApiUsage::default(),
        }
    }

    #[must_use]
    pub fn with_roster(mut self, roster: Arc<dyn RosterSource>) -> Self {
        self.roster = Some(roster);
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: Vec<NamedGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Pin the year every window is computed from.
    #[must_use]
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.path.last().map_or(Step::ReportKind, |f| f.step)
    }

    /// Visited states that prompted, oldest first.
    #[must_use]
    pub fn path(&self) -> Vec<Step> {
        self.path.iter().map(|f| f.step).collect()
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Quota records of every committed step.
    #[must_use]
    pub fn usage(&self) -> &ApiUsage {
        &self.usage
    }

    #[must_use]
    pub fn prompt(&self) -> Prompt {
        self.prompt_for(self.step(), &self.context)
    }

    /// Validate one answer and run the work it unlocks.
    ///
    /// # Errors
    ///
    /// Upstream, malformed-data and rendering failures. The session is left in
    /// the state it was in before the call.
    pub async fn submit(&mut self, input: &str) -> EngineResult<StepReply> {
        let step = self.step();
        let mut draft = self.context.clone();
        tracing::debug!(step = %step, "Submitting input");

        let result = self.run_step(step, input.trim(), &mut draft).await;
        let effect = match result {
            Ok(effect) => effect,
            Err(err) => {
                self.release_draft_handle(&draft);
                return match err {
                    EngineError::Input(input_err) => {
                        tracing::info!(step = %step, error = %input_err, "Input rejected");
                        Ok(StepReply {
                            step,
                            prompt: self.prompt(),
                            outcome: Outcome::Rejected(input_err),
                            notices: Vec::new(),
                            tables: Vec::new(),
                        })
                    }
                    other => {
                        tracing::warn!(step = %step, error = %other, "Step failed, session unchanged");
                        Err(other)
                    }
                };
            }
        };

        if !self.transitions.allows(step, effect.next) {
            self.release_draft_handle(&draft);
            return Err(EngineError::internal(format!("no transition from {step} to {}", effect.next)));
        }
        self.commit(effect.next, draft);
        self.usage.merge(effect.usage);

        let next = self.step();
        Ok(StepReply {
            step: next,
            prompt: self.prompt(),
            outcome: effect.outcome,
            notices: effect.notices,
            tables: effect.tables,
        })
    }

    /// Return to the nearest earlier state that prompted and restore its context.
    pub fn back(&mut self) -> Prompt {
        let current = self.step();
        let target = self
            .transitions
            .back_chain(current)
            .find_map(|step| self.path.iter().rposition(|f| f.step == step));

        if let Some(position) = target {
            self.path.truncate(position + 1);
            let snapshot = self.path[position].snapshot.clone();
            self.restore(snapshot);
            tracing::debug!(from = %current, to = %self.step(), "Moved back");
        }
        self.prompt()
    }

    /// Drop everything and return to the first state.
    pub fn reset(&mut self) -> Prompt {
        if let Some(handle) = self.context.render.take() {
            self.renderer.discard(handle);
        }
        self.context = SessionContext::default();
        self.path = vec![Frame { step: Step::ReportKind, snapshot: self.context.clone() }];
        tracing::debug!("Session reset");
        self.prompt()
    }

    fn commit(&mut self, next: Step, draft: SessionContext) {
        match self.path.iter().rposition(|f| f.step == next) {
            Some(position) => {
                self.path.truncate(position + 1);
                self.path[position].snapshot = draft.clone();
            }
            None => self.path.push(Frame { step: next, snapshot: draft.clone() }),
        }
        self.context = draft;
    }

    fn restore(&mut self, snapshot: SessionContext) {
        if let Some(handle) = self.context.render {
            if snapshot.render != Some(handle) {
                self.renderer.discard(handle);
            }
        }
        self.context = snapshot;
    }

    /// Discard a handle opened by a step that is not committed.
    fn release_draft_handle(&self, draft: &SessionContext) {
        if let Some(handle) = draft.render {
            if self.context.render != Some(handle) {
                self.renderer.discard(handle);
            }
        }
    }

    fn groups_of(&self, kind: EntityKind) -> Vec<&NamedGroup> {
        self.groups.iter().filter(|g| g.kind == kind).collect()
    }

    fn prompt_for(&self, step: Step, ctx: &SessionContext) -> Prompt {
        match step {
            Step::ReportKind => Prompt::new(step, "Choose a report").with_options(vec![
                "1: researcher bibliometric sheet".into(),
                "2: collaboration report".into(),
            ]),
            Step::ResearcherSearch => {
                Prompt::new(step, "Researcher as 'last name, first name' or author identifier")
            }
            Step::HomonymChoice => candidate_prompt(step, ctx.candidates.as_ref()),
            Step::ExcludeTypes => {
                let options = ctx.catalog.as_ref().map_or_else(Vec::new, |catalog| {
                    catalog
                        .entries()
                        .iter()
                        .map(|e| format!("{}: {} ({})", e.index, e.type_name, e.count))
                        .collect()
                });
                Prompt::new(step, "Document types to exclude, comma-separated (empty keeps all)")
                    .with_options(options)
            }
            Step::YearWindows => {
                let default = ctx
                    .entity
                    .as_ref()
                    .and_then(|e| e.first_publication_year())
                    .map(|start| {
                        let window = YearWindowPlanner::new(start, self.current_year, &self.tuning).plan_default();
                        let [a, b, c] = window.anchors();
                        format!(" (default {a},{b},{c})")
                    })
                    .unwrap_or_default();
                Prompt::new(
                    step,
                    format!("Period start years as 'mid,short' or 'career,mid,short'{default}"),
                )
            }
            Step::HighlightTypes => {
                let options = ctx.selection.as_ref().map_or_else(Vec::new, |selection| {
                    selection.entries().iter().map(|e| format!("{}: {}", e.index, e.type_name)).collect()
                });
                Prompt::new(
                    step,
                    "Two document types to highlight, e.g. '0,[1;2]' (empty takes the first two)",
                )
                .with_options(options)
            }
            Step::EntityAKind => Prompt::new(step, "Entity A kind")
                .with_options(vec!["1: researchers".into(), "2: institutions".into()]),
            Step::EntityBKind => Prompt::new(step, "Entity B kind").with_options(vec![
                "1: researchers".into(),
                "2: institutions".into(),
                "3: country".into(),
            ]),
            Step::EntityAGroup => self.group_prompt(step, &ctx.side_a),
            Step::EntityBGroup => self.group_prompt(step, &ctx.side_b),
            Step::EntityAIds => ids_prompt(step, &ctx.side_a),
            Step::EntityBIds => ids_prompt(step, &ctx.side_b),
            Step::EntityAHomonym => candidate_prompt(step, ctx.side_a.candidates.as_ref()),
            Step::EntityBHomonym => candidate_prompt(step, ctx.side_b.candidates.as_ref()),
            Step::CollabYears => {
                let span = self.tuning.default_collaboration_span;
                Prompt::new(
                    step,
                    format!(
                        "Publication years as 'start,end' (default {},{})",
                        self.current_year - span,
                        self.current_year
                    ),
                )
            }
        }
    }

    fn group_prompt(&self, step: Step, side: &SideDraft) -> Prompt {
        let groups = side.kind.and_then(SideKind::entity_kind).map(|k| self.groups_of(k)).unwrap_or_default();
        let mut options: Vec<String> =
            groups.iter().enumerate().map(|(i, g)| format!("{}: {}", i + 1, g.label)).collect();
        options.push(format!("{}: enter identifiers", groups.len() + 1));
        Prompt::new(step, "Predefined group").with_options(options)
    }
}

fn candidate_prompt(step: Step, candidates: Option<&CandidateList>) -> Prompt {
    let Some(list) = candidates else {
        return Prompt::new(step, "Choose a candidate");
    };
    let options = list
        .candidates
        .iter()
        .enumerate()
        .map(|(i, c)| match &c.affiliation_name {
            Some(affiliation) => format!("{i}: {} ({affiliation})", c.name_or_default()),
            None => format!("{i}: {}", c.name_or_default()),
        })
        .collect();
    Prompt::new(
        step,
        format!(
            "Several {}s match '{}'; choose an index between 0 and {}",
            list.kind.label(),
            list.query,
            list.len().saturating_sub(1)
        ),
    )
    .with_options(options)
}

fn ids_prompt(step: Step, side: &SideDraft) -> Prompt {
    let message = match side.kind {
        Some(SideKind::Country) => "Country name",
        Some(SideKind::Institutions) => "Institution identifiers, comma-separated",
        _ => "Researcher identifiers, comma-separated, or 'last name, first name'",
    };
    Prompt::new(step, message)
}
