//! Document type catalog and the type selection grammar.
//!
//! Indices are assigned once when the catalog is built and stay valid for the
//! whole session. Selections are written as comma-separated tokens; a token is
//! a bare index or a bracketed group `[a;b]` that sums `b` into `a`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::models::DocumentRecord;

static GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.+)\]$").expect("valid group regex"));
static INDEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid index regex"));

/// Column label used when only one type is available for highlighting.
pub const EMPTY_GROUP_LABEL: &str = "∅";

/// Number of documents of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeCount {
    pub index: usize,
    pub type_name: String,
    pub count: usize,
}

/// Document types of one entity, most frequent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTypeCatalog {
    entries: Vec<DocumentTypeCount>,
}

impl DocumentTypeCatalog {
    /// Count types by frequency; ties keep first appearance.
    #[must_use]
    pub fn build(documents: &[DocumentRecord]) -> Self {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for doc in documents {
            match counts.iter_mut().find(|(name, _)| *name == doc.document_type) {
                Some((_, count)) => *count += 1,
                None => counts.push((doc.document_type.clone(), 1)),
            }
        }
        // stable sort
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let entries = counts
            .into_iter()
            .enumerate()
            .map(|(index, (type_name, count))| DocumentTypeCount { index, type_name, count })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[DocumentTypeCount] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DocumentTypeCount> {
        self.entries.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Documents over all types.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Every type except `excluded`.
    #[must_use]
    pub fn filter_excluding(&self, excluded: &[usize]) -> TypeSelection {
        TypeSelection {
            kept: self.entries.iter().filter(|e| !excluded.contains(&e.index)).cloned().collect(),
        }
    }

    /// Parse an exclusion prompt answer; empty keeps every type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` for an unknown, duplicate or non-numeric
    /// index, or when nothing would be left.
    pub fn exclusion_from_input(&self, text: &str) -> Result<TypeSelection, InputError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(self.filter_excluding(&[]));
        }

        let mut seen = HashSet::new();
        let mut excluded = Vec::new();
        for token in text.split(',').map(str::trim) {
            let index = self.parse_index(token)?;
            if !seen.insert(index) {
                return Err(InputError::invalid_selection(token, "duplicate index"));
            }
            excluded.push(index);
        }

        let selection = self.filter_excluding(&excluded);
        if selection.is_empty() {
            return Err(InputError::invalid_selection(text, "every document type is excluded"));
        }
        Ok(selection)
    }

    /// Parse a selection expression into groups of type indices.
    ///
    /// `"0,[1;2]"` yields `[[0], [1, 2]]`. Empty input yields no groups.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` naming the first index that is malformed,
    /// unknown or used twice anywhere in the expression.
    pub fn combine(&self, spec: &str) -> Result<Vec<Vec<usize>>, InputError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut groups = Vec::new();
        for token in spec.split(',').map(str::trim) {
            let members: Vec<&str> = match GROUP_RE.captures(token).and_then(|c| c.get(1)) {
                Some(inner) => inner.as_str().split(';').map(str::trim).collect(),
                None => vec![token],
            };

            let mut group = Vec::with_capacity(members.len());
            for member in members {
                let index = self.parse_index(member)?;
                if !seen.insert(index) {
                    return Err(InputError::invalid_selection(member, "index used more than once"));
                }
                group.push(index);
            }
            groups.push(group);
        }
        Ok(groups)
    }

    /// Parse the two highlighted groups of the publications table.
    ///
    /// Empty input picks the first two kept types in catalog order; with a
    /// single kept type the second group is empty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` for an index outside `kept`, or `WrongArity`
    /// unless exactly two groups are given.
    pub fn select_highlighted(&self, text: &str, kept: &TypeSelection) -> Result<Highlight, InputError> {
        if text.trim().is_empty() {
            let mut groups: Vec<HighlightGroup> = kept
                .entries()
                .iter()
                .take(2)
                .map(|e| HighlightGroup::single(&e.type_name))
                .collect();
            if groups.len() < 2 {
                groups.push(HighlightGroup::empty());
            }
            return Ok(Highlight { groups });
        }

        let combined = self.combine(text)?;
        for index in combined.iter().flatten() {
            if !kept.contains(*index) {
                return Err(InputError::invalid_selection(
                    index.to_string(),
                    "document type was excluded",
                ));
            }
        }
        if combined.len() != 2 {
            return Err(InputError::WrongArity { expected: 2, found: combined.len() });
        }

        let groups = combined
            .iter()
            .map(|indices| HighlightGroup {
                label: self.entries[indices[0]].type_name.clone(),
                members: indices.iter().map(|i| self.entries[*i].type_name.clone()).collect(),
            })
            .collect();
        Ok(Highlight { groups })
    }

    fn parse_index(&self, token: &str) -> Result<usize, InputError> {
        if !INDEX_RE.is_match(token) {
            return Err(InputError::invalid_selection(token, "not an index"));
        }
        token
            .parse::<usize>()
            .ok()
            .filter(|i| *i < self.entries.len())
            .ok_or_else(|| {
                InputError::invalid_selection(
                    token,
                    format!("expected an index below {}", self.entries.len()),
                )
            })
    }
}

/// Types kept after exclusion, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSelection {
    kept: Vec<DocumentTypeCount>,
}

impl TypeSelection {
    #[must_use]
    pub fn entries(&self) -> &[DocumentTypeCount] {
        &self.kept
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kept.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    /// Whether the catalog index is kept.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.kept.iter().any(|e| e.index == index)
    }

    /// Whether documents of this type are kept.
    #[must_use]
    pub fn includes_type(&self, type_name: &str) -> bool {
        self.kept.iter().any(|e| e.type_name == type_name)
    }

    /// Documents of kept types.
    pub fn filter<'a>(&'a self, documents: &'a [DocumentRecord]) -> impl Iterator<Item = &'a DocumentRecord> + 'a {
        documents.iter().filter(|d| self.includes_type(&d.document_type))
    }
}

/// Highlighted types reported under the first member's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightGroup {
    pub label: String,
    pub members: Vec<String>,
}

impl HighlightGroup {
    fn single(type_name: &str) -> Self {
        Self { label: type_name.to_string(), members: vec![type_name.to_string()] }
    }

    fn empty() -> Self {
        Self { label: EMPTY_GROUP_LABEL.to_string(), members: Vec::new() }
    }

    /// Whether a document type counts towards this group.
    #[must_use]
    pub fn covers(&self, type_name: &str) -> bool {
        self.members.iter().any(|m| m == type_name)
    }
}

/// The two highlighted groups of the publications table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub groups: Vec<HighlightGroup>,
}

impl Highlight {
    /// Whether any group covers the type.
    #[must_use]
    pub fn covers(&self, type_name: &str) -> bool {
        self.groups.iter().any(|g| g.covers(type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(eid: &str, kind: &str) -> DocumentRecord {
        DocumentRecord {
            eid: eid.to_string(),
            document_type: kind.to_string(),
            year: 2020,
            title: None,
            authors: Vec::new(),
            author_ids: Vec::new(),
            author_affiliation_ids: Vec::new(),
            countries: Vec::new(),
            cited_by_count: 0,
        }
    }

    fn catalog() -> DocumentTypeCatalog {
        DocumentTypeCatalog::build(&[
            doc("1", "Conference Paper"),
            doc("2", "Article"),
            doc("3", "Article"),
            doc("4", "Review"),
            doc("5", "Conference Paper"),
            doc("6", "Article"),
        ])
    }

    #[test]
    fn test_build_orders_by_count_then_appearance() {
        let names: Vec<_> = catalog().entries().iter().map(|e| e.type_name.clone()).collect();
        assert_eq!(names, vec!["Article", "Conference Paper", "Review"]);
        assert_eq!(catalog().total(), 6);
    }

    #[test]
    fn test_combine_groups() {
        assert_eq!(catalog().combine("0,[1;2]").unwrap(), vec![vec![0], vec![1, 2]]);
        assert_eq!(catalog().combine(" [ 2 ; 0 ] ").unwrap(), vec![vec![2, 0]]);
    }

    #[test]
    fn test_combine_rejects_duplicates_and_unknown() {
        assert_eq!(
            catalog().combine("0,1,1"),
            Err(InputError::invalid_selection("1", "index used more than once"))
        );
        assert!(matches!(
            catalog().combine("0,[1;0]"),
            Err(InputError::InvalidSelection { token, .. }) if token == "0"
        ));
        assert!(matches!(
            catalog().combine("0,7"),
            Err(InputError::InvalidSelection { token, .. }) if token == "7"
        ));
        assert!(matches!(
            catalog().combine("0,x"),
            Err(InputError::InvalidSelection { token, .. }) if token == "x"
        ));
        assert!(matches!(catalog().combine("0,[]"), Err(InputError::InvalidSelection { .. })));
    }

    #[test]
    fn test_exclusion() {
        let cat = catalog();
        assert_eq!(cat.exclusion_from_input("").unwrap().len(), 3);
        let kept = cat.exclusion_from_input("1").unwrap();
        assert!(kept.contains(0) && !kept.contains(1) && kept.contains(2));
        assert!(cat.exclusion_from_input("0,1,2").is_err());
        assert!(cat.exclusion_from_input("1,1").is_err());
    }

    #[test]
    fn test_highlight_default_is_first_two_kept() {
        let cat = catalog();
        let kept = cat.filter_excluding(&[0]);
        let highlight = cat.select_highlighted("", &kept).unwrap();
        let labels: Vec<_> = highlight.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Conference Paper", "Review"]);
    }

    #[test]
    fn test_highlight_single_kept_type() {
        let cat = catalog();
        let kept = cat.filter_excluding(&[1, 2]);
        let highlight = cat.select_highlighted("", &kept).unwrap();
        assert_eq!(highlight.groups[1].label, EMPTY_GROUP_LABEL);
        assert!(highlight.groups[1].members.is_empty());
    }

    #[test]
    fn test_highlight_arity_and_membership() {
        let cat = catalog();
        let all = cat.filter_excluding(&[]);
        assert_eq!(
            cat.select_highlighted("0", &all),
            Err(InputError::WrongArity { expected: 2, found: 1 })
        );
        assert_eq!(
            cat.select_highlighted("0,1,2", &all),
            Err(InputError::WrongArity { expected: 2, found: 3 })
        );
        let kept = cat.filter_excluding(&[2]);
        assert!(matches!(
            cat.select_highlighted("0,2", &kept),
            Err(InputError::InvalidSelection { .. })
        ));

        let highlight = cat.select_highlighted("[1;2],0", &all).unwrap();
        assert_eq!(highlight.groups[0].label, "Conference Paper");
        assert!(highlight.groups[0].covers("Review"));
    }
}
