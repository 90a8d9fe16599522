//! Institutional rosters used for author matching.

use std::path::PathBuf;

use crate::error::RosterError;
use crate::models::RosterEntry;

/// Supplies a roster of `(name, department)` rows.
pub trait RosterSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// # Errors
    ///
    /// Returns error if the roster cannot be read or parsed.
    fn load(&self) -> Result<Vec<RosterEntry>, RosterError>;
}

/// Load a roster, degrading any failure to an empty roster.
#[must_use]
pub fn load_or_empty(source: &dyn RosterSource) -> Vec<RosterEntry> {
    match source.load() {
        Ok(entries) => {
            tracing::info!(roster = %source.describe(), entries = entries.len(), "Loaded roster");
            entries
        }
        Err(e) => {
            tracing::warn!(roster = %source.describe(), error = %e, "Roster unavailable, matching without it");
            Vec::new()
        }
    }
}

/// CSV file with `name` and `department` headers; `name` is `Last, First`.
#[derive(Debug, Clone)]
pub struct CsvRosterSource {
    path: PathBuf,
}

impl CsvRosterSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse roster rows from any reader.
    ///
    /// # Errors
    ///
    /// `Csv` for malformed input, `MissingColumn` without a `name` header.
    pub fn parse<R: std::io::Read>(reader: R) -> Result<Vec<RosterEntry>, RosterError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);

        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let name_idx = column("name").ok_or_else(|| RosterError::MissingColumn { column: "name".into() })?;
        let department_idx = column("department");

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let Some(name) = record.get(name_idx).filter(|n| !n.is_empty()) else {
                continue;
            };
            let department = department_idx
                .and_then(|i| record.get(i))
                .filter(|d| !d.is_empty())
                .map(str::to_string);
            entries.push(RosterEntry::new(name, department));
        }
        Ok(entries)
    }
}

impl RosterSource for CsvRosterSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<RosterEntry>, RosterError> {
        let file = std::fs::File::open(&self.path)?;
        Self::parse(file)
    }
}

/// A roster held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    entries: Vec<RosterEntry>,
}

impl StaticRoster {
    #[must_use]
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }
}

impl RosterSource for StaticRoster {
    fn describe(&self) -> String {
        format!("static roster ({} entries)", self.entries.len())
    }

    fn load(&self) -> Result<Vec<RosterEntry>, RosterError> {
        Ok(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roster() {
        let data = "name,department\n\"Tremblay, Marie-Eve\",Génie logiciel\n\"Roy, Luc\",\n";
        let entries = CsvRosterSource::parse(data.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Tremblay, Marie-Eve");
        assert_eq!(entries[0].department.as_deref(), Some("Génie logiciel"));
        assert_eq!(entries[1].department, None);
    }

    #[test]
    fn test_missing_name_column() {
        let data = "nom,department\nRoy,GL\n";
        assert!(matches!(
            CsvRosterSource::parse(data.as_bytes()),
            Err(RosterError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let source = CsvRosterSource::new("/nonexistent/roster.csv");
        assert!(load_or_empty(&source).is_empty());
    }
}
