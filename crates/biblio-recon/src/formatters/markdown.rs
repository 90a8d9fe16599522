//! Markdown output formatting.

use crate::models::{ApiUsage, CandidateList};
use crate::report::{Report, Table};
use crate::session::Prompt;

/// Format a table as a Markdown pipe table under a level-2 heading.
#[must_use]
pub fn format_table_markdown(table: &Table) -> String {
    let mut output = format!("## {}\n\n", table.title);

    if table.is_empty() {
        output.push_str("No rows.\n");
        return output;
    }

    let header: Vec<&str> = std::iter::once("").chain(table.columns.iter().map(String::as_str)).collect();
    output.push_str(&format!("| {} |\n", header.join(" | ")));
    output.push_str(&format!("|{}\n", "---|".repeat(header.len())));

    for row in &table.rows {
        let cells: Vec<String> = row.cells.iter().map(|c| escape(&c.to_string())).collect();
        output.push_str(&format!("| {} | {} |\n", escape(&row.label), cells.join(" | ")));
    }

    output
}

/// Format a finished report, tables in name order.
#[must_use]
pub fn format_report_markdown(report: &Report) -> String {
    let mut output = format!("# {}\n\n", report.title);

    for table in report.tables.values() {
        output.push_str(&format_table_markdown(table));
        output.push('\n');
    }

    output
}

/// Format a homonym list with the index to answer.
#[must_use]
pub fn format_candidates_markdown(list: &CandidateList) -> String {
    if list.is_empty() {
        return format!("No match found for '{}'.", list.query);
    }

    let mut output = format!("# Candidates for '{}' ({} results)\n\n", list.query, list.len());
    for (i, candidate) in list.candidates.iter().enumerate() {
        output.push_str(&format!("**{i}**. {}", candidate.name_or_default()));
        if let Some(affiliation) = &candidate.affiliation_name {
            output.push_str(&format!(" ({affiliation})"));
        }
        output.push_str(&format!(" | **Documents**: {}\n", candidate.document_count));
    }

    output
}

/// Format a prompt and its numbered options.
#[must_use]
pub fn format_prompt_markdown(prompt: &Prompt) -> String {
    let mut output = format!("**[{}]** {}\n", prompt.step.code(), prompt.message);
    for option in &prompt.options {
        output.push_str(&format!("- {option}\n"));
    }
    output
}

/// Format quota records, one line per endpoint.
#[must_use]
pub fn format_usage_markdown(usage: &ApiUsage) -> String {
    if usage.is_empty() {
        return "No quota information.".to_string();
    }

    let mut output = String::from("## API quota\n\n");
    for (endpoint, info) in usage.iter() {
        output.push_str(&format!(
            "- **{endpoint:?}**: {} of {} remaining",
            info.remaining.as_deref().unwrap_or("?"),
            info.limit.as_deref().unwrap_or("?"),
        ));
        if let Some(reset) = &info.reset {
            output.push_str(&format!(", resets {reset}"));
        }
        output.push('\n');
    }

    output
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Cell;

    #[test]
    fn test_format_table() {
        let mut table = Table::new("Citations", vec!["Documents".into(), "Citations".into()]);
        table.push_row("2020", vec![Cell::from(2usize), Cell::from(5.0)]);
        let md = format_table_markdown(&table);

        assert!(md.starts_with("## Citations"));
        assert!(md.contains("|  | Documents | Citations |"));
        assert!(md.contains("| 2020 | 2 | 5 |"));
    }

    #[test]
    fn test_pipes_are_escaped() {
        let mut table = Table::new("Records", vec!["Title".into()]);
        table.push_row("2-s2.0-1", vec![Cell::from("A | B")]);
        assert!(format_table_markdown(&table).contains("A \\| B"));
    }

    #[test]
    fn test_empty_usage() {
        assert_eq!(format_usage_markdown(&ApiUsage::default()), "No quota information.");
    }
}
