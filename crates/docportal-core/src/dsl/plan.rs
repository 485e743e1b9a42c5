use serde::Serialize;

use crate::schema::table_spec::{Dimension, TableRef};
use crate::sql::params::QueryParameter;

// A projected column in the SELECT clause
#[derive(Debug, Clone, Serialize)]
pub struct PlanProjection {
    pub column: String, // e.g. "file_id"
    pub label: String,  // e.g. "ファイルID"
}

// One filter in the WHERE clause. `param`/`params` index into SearchPlan::params.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Clause {
    /// column value is one of the bound array
    Membership {
        dimension: Dimension,
        column: String,
        param: usize,
    },
    /// every token matches one of `fields`; one predicate per token
    KeywordAll { fields: Vec<String>, params: Vec<usize> },
    /// at least one token matches one of `fields`
    KeywordAny { fields: Vec<String>, params: Vec<usize> },
}

// A sort directive in the ORDER BY clause
#[derive(Debug, Clone, Serialize)]
pub struct PlanOrder {
    pub column: String,
    pub direction: SortDirection,
    /// Text keys sort by code point in every dialect.
    pub text: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Dialect-neutral search query: what to select, filter and sort.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPlan {
    pub table: String, // logical table name, e.g. "budget"
    pub source: TableRef,
    pub projections: Vec<PlanProjection>,
    pub clauses: Vec<Clause>,
    pub order_by: Vec<PlanOrder>,
    /// Collapse duplicate rows (rendered as GROUP BY over every projection).
    pub distinct: bool,
    pub limit: Option<u64>,
    pub params: Vec<QueryParameter>,
}

impl SearchPlan {
    pub fn param(&self, name: &str) -> Option<&QueryParameter> {
        self.params.iter().find(|p| p.name == name)
    }
}
