//! JSON output formatting.

use serde_json::{Map, Value, json};

use crate::models::ApiUsage;
use crate::report::{Report, Table};

/// Create a compact table representation: one object per row keyed by column.
#[must_use]
pub fn compact_table(table: &Table) -> Value {
    let rows: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            obj.insert("label".to_string(), json!(row.label));
            for (column, cell) in table.columns.iter().zip(&row.cells) {
                obj.insert(column.clone(), json!(cell));
            }
            Value::Object(obj)
        })
        .collect();

    json!({
        "title": table.title,
        "rows": rows,
    })
}

/// Create a compact report representation keyed by table name.
#[must_use]
pub fn compact_report(report: &Report) -> Value {
    let tables: Map<String, Value> = report
        .tables
        .iter()
        .map(|(name, table)| (name.to_string(), compact_table(table)))
        .collect();

    json!({
        "kind": report.kind,
        "title": report.title,
        "tables": tables,
    })
}

/// Quota records keyed by endpoint; endpoints without headers are skipped.
#[must_use]
pub fn compact_usage(usage: &ApiUsage) -> Value {
    let mut obj = Map::new();
    for (endpoint, info) in usage.iter().filter(|(_, info)| !info.is_empty()) {
        obj.insert(format!("{endpoint:?}"), json!(info));
    }
    Value::Object(obj)
}
