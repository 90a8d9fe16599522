//! Finished tables and the rendering collaborator.
//!
//! Tables are handed over under a stable [`TableName`]; the renderer owns the
//! layout of the final document.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RenderError;

/// Stable names of the tables a report can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Candidates,
    DocumentTypes,
    Citations,
    PublicationsByPeriod,
    JournalPercentiles,
    CollaborationTypes,
    Headline,
    CollaborationRecords,
    CollaborationDocumentTypes,
    CollaborationAuthors,
    EntityAAuthors,
    EntityBAuthors,
    Institutions,
    RosterMatches,
    RosterUnmatched,
}

impl TableName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Candidates => "candidates",
            Self::DocumentTypes => "document_types",
            Self::Citations => "citations",
            Self::PublicationsByPeriod => "publications_by_period",
            Self::JournalPercentiles => "journal_percentiles",
            Self::CollaborationTypes => "collaboration_types",
            Self::Headline => "headline",
            Self::CollaborationRecords => "collaboration_records",
            Self::CollaborationDocumentTypes => "collaboration_document_types",
            Self::CollaborationAuthors => "collaboration_authors",
            Self::EntityAAuthors => "entity_a_authors",
            Self::EntityBAuthors => "entity_b_authors",
            Self::Institutions => "institutions",
            Self::RosterMatches => "roster_matches",
            Self::RosterUnmatched => "roster_unmatched",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Integer(i64),
    Number(f64),
    Flag(bool),
    Text(String),
}

impl Cell {
    /// Numeric value, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            Self::Flag(_) | Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) if v.fract() == 0.0 => write!(f, "{v:.0}"),
            Self::Number(v) => write!(f, "{v:.2}"),
            Self::Flag(true) => f.write_str("yes"),
            Self::Flag(false) => f.write_str("no"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// A labelled row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub label: String,
    pub cells: Vec<Cell>,
}

/// A titled table; the row label is not counted in `columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    #[must_use]
    pub fn new(title: impl Into<String>, columns: Vec<String>) -> Self {
        Self { title: title.into(), columns, rows: Vec::new() }
    }

    pub fn push_row(&mut self, label: impl Into<String>, cells: Vec<Cell>) {
        self.rows.push(TableRow { label: label.into(), cells });
    }

    #[must_use]
    pub fn row(&self, label: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Cell at a row label and column name.
    #[must_use]
    pub fn cell(&self, row: &str, column: &str) -> Option<&Cell> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.row(row).and_then(|r| r.cells.get(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Tables of one report keyed by name.
pub type ReportTables = BTreeMap<TableName, Table>;

/// Kind of report a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Bibliometric sheet of one researcher.
    ResearcherSheet,
    /// Collaborations between two entity sets.
    Collaboration,
}

/// A completed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub tables: ReportTables,
}

impl Report {
    #[must_use]
    pub fn table(&self, name: TableName) -> Option<&Table> {
        self.tables.get(&name)
    }
}

/// Opaque token for a document being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderHandle(Uuid);

impl RenderHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RenderHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Turns finished tables into a document.
pub trait ReportRenderer: Send + Sync {
    /// Start a document.
    ///
    /// # Errors
    ///
    /// Returns error if the document cannot be created.
    fn open(&self, title: &str) -> Result<RenderHandle, RenderError>;

    /// Add a table to an open document.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown handle or a failed write.
    fn write_table(&self, handle: &RenderHandle, name: TableName, table: &Table) -> Result<(), RenderError>;

    /// Complete the document and release the handle.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown handle or a failed finish.
    fn finish(&self, handle: RenderHandle) -> Result<(), RenderError>;

    /// Drop an unfinished document and release the handle.
    fn discard(&self, handle: RenderHandle);
}

/// A document kept by [`MemoryRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub title: String,
    pub tables: Vec<(TableName, Table)>,
}

/// Renderer that keeps documents in memory.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    open: Mutex<HashMap<RenderHandle, RenderedDocument>>,
    finished: Mutex<Vec<RenderedDocument>>,
}

impl MemoryRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents finished so far.
    #[must_use]
    pub fn finished(&self) -> Vec<RenderedDocument> {
        self.finished.lock().map(|docs| docs.clone()).unwrap_or_default()
    }

    /// Number of handles still open.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.lock().map(|docs| docs.len()).unwrap_or_default()
    }

    fn poisoned() -> RenderError {
        RenderError::Failed("renderer state poisoned".to_string())
    }
}

impl ReportRenderer for MemoryRenderer {
    fn open(&self, title: &str) -> Result<RenderHandle, RenderError> {
        let handle = RenderHandle::new();
        self.open
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(handle, RenderedDocument { title: title.to_string(), tables: Vec::new() });
        tracing::debug!(handle = %handle, title, "Opened document");
        Ok(handle)
    }

    fn write_table(&self, handle: &RenderHandle, name: TableName, table: &Table) -> Result<(), RenderError> {
        let mut open = self.open.lock().map_err(|_| Self::poisoned())?;
        let doc = open.get_mut(handle).ok_or_else(|| RenderError::UnknownHandle(handle.to_string()))?;
        doc.tables.retain(|(n, _)| *n != name);
        doc.tables.push((name, table.clone()));
        Ok(())
    }

    fn finish(&self, handle: RenderHandle) -> Result<(), RenderError> {
        let doc = self
            .open
            .lock()
            .map_err(|_| Self::poisoned())?
            .remove(&handle)
            .ok_or_else(|| RenderError::UnknownHandle(handle.to_string()))?;
        self.finished.lock().map_err(|_| Self::poisoned())?.push(doc);
        Ok(())
    }

    fn discard(&self, handle: RenderHandle) {
        if let Ok(mut open) = self.open.lock() {
            if open.remove(&handle).is_some() {
                tracing::debug!(handle = %handle, "Discarded document");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut t = Table::new("Citations", vec!["Documents".into(), "Citations".into()]);
        t.push_row("2020", vec![Cell::from(2usize), Cell::from(5.0)]);
        t
    }

    #[test]
    fn test_cell_lookup() {
        let t = table();
        assert_eq!(t.cell("2020", "Citations"), Some(&Cell::Number(5.0)));
        assert_eq!(t.cell("2021", "Citations"), None);
        assert_eq!(t.cell("2020", "Missing"), None);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(1.25).to_string(), "1.25");
        assert_eq!(Cell::Flag(true).to_string(), "yes");
    }

    #[test]
    fn test_memory_renderer_lifecycle() {
        let renderer = MemoryRenderer::new();
        let handle = renderer.open("Smith, John").unwrap();
        renderer.write_table(&handle, TableName::Citations, &table()).unwrap();
        assert_eq!(renderer.open_count(), 1);
        renderer.finish(handle).unwrap();
        assert_eq!(renderer.open_count(), 0);
        assert_eq!(renderer.finished()[0].tables.len(), 1);
        assert!(matches!(renderer.finish(handle), Err(RenderError::UnknownHandle(_))));
    }

    #[test]
    fn test_discard_releases_handle() {
        let renderer = MemoryRenderer::new();
        let handle = renderer.open("draft").unwrap();
        renderer.discard(handle);
        assert_eq!(renderer.open_count(), 0);
        assert!(renderer.finished().is_empty());
        assert!(renderer.write_table(&handle, TableName::Citations, &table()).is_err());
    }
}
