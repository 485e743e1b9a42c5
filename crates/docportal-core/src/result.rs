use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::schema::table_spec::TableSpec;

/// One warehouse row keyed by internal column name.
pub type Row = IndexMap<String, Value>;

/// Rows of one table, keyed by display label, in query order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub table: String,
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<IndexMap<String, Value>>,
    /// Distinct documents among the hits.
    pub file_count: usize,
    /// Every hit row is one page.
    pub page_count: usize,
}

impl SearchResult {
    pub fn from_rows(spec: &TableSpec, rows: Vec<Row>) -> Self {
        let file_count = match spec.columns.file_id.as_deref() {
            Some(file_col) => rows
                .iter()
                .filter_map(|r| r.get(file_col))
                .filter(|v| !v.is_null())
                .map(Value::to_string)
                .collect::<HashSet<_>>()
                .len(),
            None => rows.len(),
        };
        let page_count = rows.len();

        let rows = rows
            .into_iter()
            .map(|mut row| {
                spec.display_columns
                    .iter()
                    .map(|(column, label)| {
                        let value = row.swap_remove(column).unwrap_or(Value::Null);
                        (label.clone(), value)
                    })
                    .collect()
            })
            .collect();

        Self {
            table: spec.name.clone(),
            label: spec.label.clone(),
            columns: spec.display_columns.values().cloned().collect(),
            rows,
            file_count,
            page_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
