//! Per-state input handlers.
//!
//! Handlers only write to the draft context; the session commits it once the
//! handler returns successfully.

use crate::catalog::DocumentTypeCatalog;
use crate::collaboration::{
    CollaborationExtractor, CollaborationQuery, EntitySpec, Extraction, institution_roster,
};
use crate::error::{EngineError, EngineResult, InputError};
use crate::metrics::{CitationBatchAggregator, YearSpan, YearWindowPlanner, fetch_headline, fetch_merged};
use crate::models::{
    ApiUsage, CandidateList, EntityKind, EntityProfile, MetricFilters, MetricType,
};
use crate::report::{Report, ReportKind, TableName};
use crate::resolver::{EntityResolver, Resolution, SearchQuery};
use crate::roster::load_or_empty;
use crate::tables;

use super::{Effect, Outcome, Session, SessionContext, SideDraft, SideKind, Step};

/// Which side of a collaboration query a handler fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

impl Side {
    const fn group_step(self) -> Step {
        match self {
            Self::A => Step::EntityAGroup,
            Self::B => Step::EntityBGroup,
        }
    }

    const fn ids_step(self) -> Step {
        match self {
            Self::A => Step::EntityAIds,
            Self::B => Step::EntityBIds,
        }
    }

    const fn homonym_step(self) -> Step {
        match self {
            Self::A => Step::EntityAHomonym,
            Self::B => Step::EntityBHomonym,
        }
    }

    /// State after this side is complete.
    const fn done_step(self) -> Step {
        match self {
            Self::A => Step::EntityBKind,
            Self::B => Step::CollabYears,
        }
    }

    fn draft(self, ctx: &mut SessionContext) -> &mut SideDraft {
        match self {
            Self::A => &mut ctx.side_a,
            Self::B => &mut ctx.side_b,
        }
    }
}

impl Session {
    pub(super) async fn run_step(
        &self,
        step: Step,
        input: &str,
        draft: &mut SessionContext,
    ) -> EngineResult<Effect> {
        match step {
            Step::ReportKind => self.choose_report(input, draft),
            Step::ResearcherSearch => self.search_researcher(input, draft).await,
            Step::HomonymChoice => self.choose_researcher(input, draft).await,
            Step::ExcludeTypes => self.exclude_types(input, draft).await,
            Step::YearWindows => self.plan_windows(input, draft),
            Step::HighlightTypes => self.complete_sheet(input, draft).await,
            Step::EntityAKind => self.choose_side_kind(Side::A, input, draft),
            Step::EntityBKind => self.choose_side_kind(Side::B, input, draft),
            Step::EntityAGroup => self.choose_group(Side::A, input, draft),
            Step::EntityBGroup => self.choose_group(Side::B, input, draft),
            Step::EntityAIds => self.resolve_side(Side::A, input, draft).await,
            Step::EntityBIds => self.resolve_side(Side::B, input, draft).await,
            Step::EntityAHomonym => self.choose_side_homonym(Side::A, input, draft).await,
            Step::EntityBHomonym => self.choose_side_homonym(Side::B, input, draft).await,
            Step::CollabYears => self.complete_collaboration(input, draft).await,
        }
    }

    fn choose_report(&self, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let (kind, next) = match input {
            "1" => (ReportKind::ResearcherSheet, Step::ResearcherSearch),
            "2" => (ReportKind::Collaboration, Step::EntityAKind),
            other => return Err(InputError::unknown_option(other).into()),
        };
        *draft = SessionContext::for_kind(kind);
        Ok(Effect::advance(next))
    }

    // --- researcher sheet ---

    async fn search_researcher(&self, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let query = SearchQuery::parse(input)?;
        if let SearchQuery::Identifiers(ids) = &query {
            if ids.len() > 1 {
                return Err(InputError::malformed_query(input, "a sheet covers a single researcher").into());
            }
        }

        let resolver = EntityResolver::new(self.api.as_ref());
        let mut usage = ApiUsage::default();
        match resolver.search(&query, EntityKind::Person).await?.take(&mut usage) {
            Resolution::Unique(profile) => {
                let effect = self.load_entity(profile, draft).await?;
                Ok(effect.with_usage(usage))
            }
            Resolution::Homonyms(list) => {
                let table = tables::candidates(&list);
                draft.candidates = Some(list);
                Ok(Effect::advance(Step::HomonymChoice)
                    .with_table(TableName::Candidates, table)
                    .with_usage(usage))
            }
            Resolution::Group { .. } => {
                Err(EngineError::internal("identifier group returned for a single identifier"))
            }
        }
    }

    async fn choose_researcher(&self, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let candidates = draft
            .candidates
            .clone()
            .ok_or_else(|| EngineError::internal("no candidates to choose from"))?;
        let mut usage = ApiUsage::default();
        let profile = EntityResolver::new(self.api.as_ref())
            .resolve(&candidates, input)
            .await?
            .take(&mut usage);
        let effect = self.load_entity(profile, draft).await?;
        Ok(effect.with_usage(usage))
    }

    /// Fetch the documents of a chosen researcher and show the type catalog.
    async fn load_entity(&self, profile: EntityProfile, draft: &mut SessionContext) -> EngineResult<Effect> {
        let mut usage = ApiUsage::default();
        let documents = EntityResolver::new(self.api.as_ref()).documents(&profile).await?.take(&mut usage);
        if documents.is_empty() {
            return Err(InputError::no_match(format!("{} (no documents)", profile.display_name)).into());
        }

        let catalog = DocumentTypeCatalog::build(&documents);
        tracing::info!(
            entity = %profile.id,
            documents = documents.len(),
            types = catalog.len(),
            "Loaded researcher"
        );
        let table = tables::document_types(&catalog);
        draft.entity = Some(profile);
        draft.catalog = Some(catalog);
        Ok(Effect::advance(Step::ExcludeTypes)
            .with_table(TableName::DocumentTypes, table)
            .with_usage(usage))
    }

    async fn exclude_types(&self, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let catalog = draft.catalog.as_ref().ok_or_else(|| EngineError::internal("no catalog"))?;
        let selection = catalog.exclusion_from_input(input)?;
        let profile = draft.entity.clone().ok_or_else(|| EngineError::internal("no entity"))?;
        let documents = profile
            .cached_documents()
            .ok_or_else(|| EngineError::internal("documents not loaded"))?;

        let ids: Vec<String> = selection.filter(&documents).map(|d| d.scopus_id().to_string()).collect();
        let first_year = profile
            .first_publication_year()
            .ok_or_else(|| EngineError::malformed("profile", format!("{} has no publication year", profile.id)))?;

        let aggregate = CitationBatchAggregator::new(
            self.api.as_ref(),
            self.tuning.citation_batch_size,
            self.current_year,
        )
        .aggregate(&ids, first_year)
        .await?;

        let kept: Vec<_> = selection.filter(&documents).collect();
        let citations = tables::citations(&aggregate.series, &kept);
        let types = tables::type_selection(&selection);

        let handle = self.renderer.open(&profile.display_name)?;
        draft.render = Some(handle);
        self.renderer.write_table(&handle, TableName::DocumentTypes, &types)?;
        self.renderer.write_table(&handle, TableName::Citations, &citations)?;

        let mut notices = Vec::new();
        if let Some(remaining) = &aggregate.diagnostics.remaining {
            notices.push(format!("Citation overview quota remaining: {remaining}"));
        }

        draft.tables.insert(TableName::DocumentTypes, types.clone());
        draft.tables.insert(TableName::Citations, citations.clone());
        draft.selection = Some(selection);
        draft.citations = Some(aggregate.series);

        let mut effect = Effect::advance(Step::YearWindows)
            .with_table(TableName::DocumentTypes, types)
            .with_table(TableName::Citations, citations)
            .with_usage(aggregate.usage);
        effect.notices = notices;
        Ok(effect)
    }

    fn plan_windows(&self, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let profile = draft.entity.as_ref().ok_or_else(|| EngineError::internal("no entity"))?;
        let career_start = profile
            .first_publication_year()
            .ok_or_else(|| EngineError::malformed("profile", format!("{} has no publication year", profile.id)))?;

        let window = YearWindowPlanner::new(career_start, self.current_year, &self.tuning).plan_from_input(input)?;
        tracing::debug!(anchors = ?window.anchors(), "Planned year windows");
        draft.window = Some(window);
        Ok(Effect::advance(Step::HighlightTypes))
    }

    async fn complete_sheet(&self, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let (Some(catalog), Some(selection), Some(window), Some(profile)) =
            (&draft.catalog, &draft.selection, draft.window, &draft.entity)
        else {
            return Err(EngineError::internal("sheet context incomplete"));
        };
        let highlight = catalog.select_highlighted(input, selection)?;
        let documents = profile
            .cached_documents()
            .ok_or_else(|| EngineError::internal("documents not loaded"))?;
        let kept: Vec<_> = selection.filter(&documents).collect();

        let mut usage = ApiUsage::default();
        let api = self.api.as_ref();
        let output =
            fetch_merged(api, &profile.id, MetricType::ScholarlyOutput, MetricFilters::snip(), &self.tuning, &mut usage)
                .await?;
        let percentiles = fetch_merged(
            api,
            &profile.id,
            MetricType::PublicationsInTopJournalPercentiles,
            MetricFilters::snip(),
            &self.tuning,
            &mut usage,
        )
        .await?;
        let collaboration = fetch_merged(
            api,
            &profile.id,
            MetricType::Collaboration,
            MetricFilters::default(),
            &self.tuning,
            &mut usage,
        )
        .await?;
        let headline = fetch_headline(api, &profile.id, window.career_start(), &mut usage).await?;

        let built = [
            (TableName::PublicationsByPeriod, tables::publications_by_period(&window, &kept, &highlight)),
            (
                TableName::JournalPercentiles,
                tables::journal_percentiles(&output, &percentiles, &window, &self.tuning)?,
            ),
            (
                TableName::CollaborationTypes,
                tables::collaboration_types(&collaboration, &window, &self.tuning)?,
            ),
            (TableName::Headline, tables::headline(&headline)),
        ];

        let handle = draft.render.ok_or_else(|| EngineError::internal("no open document"))?;
        for (name, table) in &built {
            self.renderer.write_table(&handle, *name, table)?;
        }
        self.renderer.finish(handle)?;

        let title = profile.display_name.clone();
        let mut all = std::mem::take(&mut draft.tables);
        all.extend(built.iter().cloned());
        tracing::info!(entity = %profile.id, tables = all.len(), "Researcher sheet completed");

        let report = Report { kind: ReportKind::ResearcherSheet, title, tables: all };
        *draft = SessionContext::for_kind(ReportKind::ResearcherSheet);

        let mut effect = Effect::advance(Step::ResearcherSearch).with_usage(usage);
        effect.tables = built.into_iter().collect();
        effect.outcome = Outcome::ReportReady(report);
        Ok(effect)
    }

    // --- collaboration report ---

    fn choose_side_kind(&self, side: Side, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let kind = match (side, input) {
            (_, "1") => SideKind::Researchers,
            (_, "2") => SideKind::Institutions,
            (Side::B, "3") => SideKind::Country,
            (_, other) => return Err(InputError::unknown_option(other).into()),
        };
        *side.draft(draft) = SideDraft { kind: Some(kind), ..SideDraft::default() };

        let has_groups = kind.entity_kind().is_some_and(|k| !self.groups_of(k).is_empty());
        let next = if has_groups { side.group_step() } else { side.ids_step() };
        Ok(Effect::advance(next))
    }

    fn choose_group(&self, side: Side, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let entity_kind = side
            .draft(draft)
            .kind
            .and_then(SideKind::entity_kind)
            .ok_or_else(|| EngineError::internal("group step without an entity kind"))?;
        let groups = self.groups_of(entity_kind);

        let choice: usize = input
            .parse()
            .ok()
            .filter(|n| (1..=groups.len() + 1).contains(n))
            .ok_or_else(|| InputError::unknown_option(input))?;
        if choice == groups.len() + 1 {
            return Ok(Effect::advance(side.ids_step()));
        }

        let group = groups[choice - 1];
        let slot = side.draft(draft);
        slot.spec = Some(group.spec());
        slot.label = group.label.clone();
        Ok(Effect::advance(side.done_step()))
    }

    async fn resolve_side(&self, side: Side, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let kind = side.draft(draft).kind.ok_or_else(|| EngineError::internal("side kind not chosen"))?;
        let Some(entity_kind) = kind.entity_kind() else {
            if input.is_empty() {
                return Err(InputError::malformed_query(input, "country name is empty").into());
            }
            let slot = side.draft(draft);
            slot.spec = Some(EntitySpec::Country(input.to_string()));
            slot.label = input.to_string();
            return Ok(Effect::advance(side.done_step()));
        };

        let query = SearchQuery::parse(input)?;
        let mut usage = ApiUsage::default();
        let resolution = EntityResolver::new(self.api.as_ref())
            .search(&query, entity_kind)
            .await?
            .take(&mut usage);

        let slot = side.draft(draft);
        let mut effect = match resolution {
            Resolution::Unique(profile) => {
                set_members(slot, kind, &[profile]);
                Effect::advance(side.done_step())
            }
            Resolution::Group { members, missing } => {
                set_members(slot, kind, &members);
                let mut effect = Effect::advance(side.done_step());
                if !missing.is_empty() {
                    effect.notices.push(format!("Unknown identifiers skipped: {}", missing.join(", ")));
                }
                effect
            }
            Resolution::Homonyms(list) => {
                let table = tables::candidates(&list);
                slot.candidates = Some(list);
                Effect::advance(side.homonym_step()).with_table(TableName::Candidates, table)
            }
        };
        effect.usage = usage;
        Ok(effect)
    }

    async fn choose_side_homonym(&self, side: Side, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let slot = side.draft(draft);
        let kind = slot.kind.ok_or_else(|| EngineError::internal("side kind not chosen"))?;
        let candidates: CandidateList =
            slot.candidates.clone().ok_or_else(|| EngineError::internal("no candidates to choose from"))?;

        let mut usage = ApiUsage::default();
        let profile = EntityResolver::new(self.api.as_ref())
            .resolve(&candidates, input)
            .await?
            .take(&mut usage);
        let slot = side.draft(draft);
        set_members(slot, kind, &[profile]);
        Ok(Effect::advance(side.done_step()).with_usage(usage))
    }

    async fn complete_collaboration(&self, input: &str, draft: &mut SessionContext) -> EngineResult<Effect> {
        let span = YearSpan::parse(input, self.current_year, self.tuning.default_collaboration_span)?;
        let (Some(entity_a), Some(entity_b)) = (draft.side_a.spec.clone(), draft.side_b.spec.clone()) else {
            return Err(EngineError::internal("collaboration sides incomplete"));
        };
        let title = format!(
            "Collaborations {} / {} ({}-{})",
            draft.side_a.label, draft.side_b.label, span.start, span.end
        );
        let query = CollaborationQuery::new(entity_a, entity_b, span)?;

        let extractor = CollaborationExtractor::new(self.api.as_ref(), &self.tuning);
        let mut usage = ApiUsage::default();
        let table = match extractor.extract(&query).await?.take(&mut usage) {
            Extraction::NoResults { query } => {
                *draft = SessionContext::default();
                let mut effect = Effect::advance(Step::ReportKind).with_usage(usage);
                effect.notices.push(format!("No collaboration found for {query}"));
                effect.outcome = Outcome::NoResults { query };
                return Ok(effect);
            }
            Extraction::Records(table) => table,
        };

        let all_authors = extractor.reconcile_authors(&table)?;
        let a_authors = extractor.reconcile_side(&table, &query.entity_a)?;
        let b_authors = extractor.reconcile_side(&table, &query.entity_b)?;
        let country = match &query.entity_b {
            EntitySpec::Country(name) => Some(name.as_str()),
            _ => None,
        };
        let institutions = institution_roster(&table, country)?;

        let roster = self.roster.as_deref().map(load_or_empty).unwrap_or_default();
        let matches = extractor.fuzzy_match_roster(&all_authors, &roster);
        let fuzzy = matches.fuzzy_matches().count();

        let built = vec![
            (TableName::CollaborationRecords, tables::collaboration_records(&table)),
            (TableName::CollaborationDocumentTypes, tables::collaboration_document_types(&table)),
            (TableName::CollaborationAuthors, tables::authors("Authors", &all_authors)),
            (TableName::EntityAAuthors, tables::authors("Entity A authors", &a_authors)),
            (TableName::EntityBAuthors, tables::authors("Entity B authors", &b_authors)),
            (TableName::Institutions, tables::institutions(&institutions)),
            (TableName::RosterMatches, tables::roster_matches(&matches)),
            (TableName::RosterUnmatched, tables::roster_unmatched(&matches)),
        ];

        let handle = self.renderer.open(&title)?;
        draft.render = Some(handle);
        for (name, table) in &built {
            self.renderer.write_table(&handle, *name, table)?;
        }
        self.renderer.finish(handle)?;
        tracing::info!(
            records = table.len(),
            authors = all_authors.len(),
            roster_matches = matches.matched.len(),
            fuzzy,
            "Collaboration report completed"
        );

        let report = Report { kind: ReportKind::Collaboration, title, tables: built.iter().cloned().collect() };
        *draft = SessionContext::default();

        let mut effect = Effect::advance(Step::ReportKind).with_usage(usage);
        if fuzzy > 0 {
            effect.notices.push(format!("{fuzzy} roster matches are fuzzy and need review"));
        }
        effect.tables = built;
        effect.outcome = Outcome::ReportReady(report);
        Ok(effect)
    }
}

fn set_members(slot: &mut SideDraft, kind: SideKind, members: &[EntityProfile]) {
    let ids: Vec<String> = members.iter().map(|p| p.id.clone()).collect();
    slot.label = members.iter().map(|p| p.display_name.as_str()).collect::<Vec<_>>().join(", ");
    slot.spec = Some(match kind {
        SideKind::Institutions => EntitySpec::Institutions(ids),
        _ => EntitySpec::Researchers(ids),
    });
    slot.candidates = None;
}
