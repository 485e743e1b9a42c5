use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::dsl::plan::{PlanOrder, PlanProjection, SearchPlan, SortDirection};
use crate::error::QueryError;
use crate::result::Row;
use crate::schema::table_spec::{Dimension, TableSpec};
use crate::sql::dialect::Dialect;
use crate::sql::render::{render_sql, BuiltQuery};

/// Distinct values a user can pick per filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub table: String,
    pub values: IndexMap<Dimension, Vec<Value>>,
}

fn filter_columns(spec: &TableSpec) -> Vec<(Dimension, &str)> {
    Dimension::FILTERS
        .into_iter()
        .filter_map(|d| spec.columns.column(d).map(|c| (d, c)))
        .collect()
}

/// Distinct combinations of every filter column the table declares.
pub fn compile_metadata(spec: &TableSpec) -> Result<SearchPlan, QueryError> {
    spec.validate()?;

    let columns = filter_columns(spec);
    if columns.is_empty() {
        return Err(QueryError::table_spec(&spec.name, "no filter columns declared"));
    }

    Ok(SearchPlan {
        table: spec.name.clone(),
        source: spec.table_ref(),
        projections: columns
            .iter()
            .map(|(_, c)| PlanProjection {
                column: c.to_string(),
                label: spec.display_label(c).unwrap_or(c).to_string(),
            })
            .collect(),
        clauses: Vec::new(),
        order_by: columns
            .iter()
            .map(|(d, c)| PlanOrder {
                column: c.to_string(),
                direction: SortDirection::Asc,
                text: d.is_text(),
            })
            .collect(),
        distinct: true,
        limit: None,
        params: Vec::new(),
    })
}

pub fn metadata_query(spec: &TableSpec, dialect: Dialect) -> Result<BuiltQuery, QueryError> {
    let plan = compile_metadata(spec)?;
    Ok(BuiltQuery {
        sql: render_sql(&plan, dialect),
        params: Vec::new(),
        dialect,
        plan: Some(plan),
    })
}

fn sort_key(v: &Value) -> (Option<i64>, String) {
    match v {
        Value::Number(n) => (n.as_i64(), n.to_string()),
        Value::String(s) => (None, s.clone()),
        other => (None, other.to_string()),
    }
}

impl FilterOptions {
    /// Sorted distinct values per dimension; fiscal years newest first.
    pub fn from_rows(spec: &TableSpec, rows: &[Row]) -> Self {
        let mut values = IndexMap::new();

        for (dimension, column) in filter_columns(spec) {
            let mut distinct: Vec<Value> = rows
                .iter()
                .filter_map(|r| r.get(column))
                .filter(|v| !v.is_null())
                .map(|v| (sort_key(v), v.clone()))
                .collect::<std::collections::BTreeMap<_, _>>()
                .into_values()
                .collect();

            if dimension == Dimension::FiscalYear {
                distinct.reverse();
            }
            values.insert(dimension, distinct);
        }

        Self {
            table: spec.name.clone(),
            values,
        }
    }

    pub fn get(&self, dimension: Dimension) -> &[Value] {
        self.values.get(&dimension).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Values as display strings, for pickers that only handle text.
    pub fn labels(&self, dimension: Dimension) -> BTreeSet<String> {
        self.get(dimension)
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}
