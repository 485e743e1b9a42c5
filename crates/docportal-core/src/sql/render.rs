use serde::Serialize;

use crate::dsl::compile::{compile_search, CompileOptions};
use crate::dsl::plan::{Clause, SearchPlan};
use crate::dsl::selection::FilterSelection;
use crate::error::QueryError;
use crate::schema::table_spec::TableSpec;
use crate::sql::dialect::Dialect;
use crate::sql::params::QueryParameter;

/// Query text plus its bindings, ready for an executor.
#[derive(Debug, Clone, Serialize)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<QueryParameter>,
    pub dialect: Dialect,
    /// Present for search queries; lets in-memory executors evaluate them.
    #[serde(skip)]
    pub plan: Option<SearchPlan>,
}

impl BuiltQuery {
    pub fn new(sql: String, params: Vec<QueryParameter>, dialect: Dialect) -> Self {
        Self {
            sql,
            params,
            dialect,
            plan: None,
        }
    }
}

fn keyword_predicate(fields: &[String], placeholder: &str) -> String {
    let parts = fields
        .iter()
        .map(|f| format!("LOWER({f}) LIKE {placeholder}"))
        .collect::<Vec<_>>();

    if parts.len() == 1 {
        parts[0].clone()
    } else {
        format!("({})", parts.join(" OR "))
    }
}

fn render_clause(plan: &SearchPlan, clause: &Clause, dialect: Dialect) -> Vec<String> {
    let ph = |i: usize| dialect.placeholder(i, &plan.params[i]);

    match clause {
        Clause::Membership { column, param, .. } => {
            vec![dialect.membership(column, &ph(*param))]
        }
        Clause::KeywordAll { fields, params } => params
            .iter()
            .map(|p| keyword_predicate(fields, &ph(*p)))
            .collect(),
        Clause::KeywordAny { fields, params } => {
            let any = params
                .iter()
                .map(|p| keyword_predicate(fields, &ph(*p)))
                .collect::<Vec<_>>()
                .join(" OR ");
            vec![format!("({any})")]
        }
    }
}

fn render_sql_inner(plan: &SearchPlan, dialect: Dialect) -> String {
    let cols = plan
        .projections
        .iter()
        .map(|p| p.column.as_str())
        .collect::<Vec<_>>()
        .join(",\n       ");

    let select_clause = format!("SELECT {cols}");
    let from_clause = format!("FROM {}", dialect.table(&plan.source));

    // WHERE
    let predicates = plan
        .clauses
        .iter()
        .flat_map(|c| render_clause(plan, c, dialect))
        .collect::<Vec<_>>();

    let where_clause = if predicates.is_empty() {
        "".to_string()
    } else {
        format!("\nWHERE {}", predicates.join("\n  AND "))
    };

    let group_clause = if plan.distinct {
        let keys = plan
            .projections
            .iter()
            .map(|p| p.column.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("\nGROUP BY {keys}")
    } else {
        "".to_string()
    };

    // ORDER BY
    let order_clause = if plan.order_by.is_empty() {
        "".to_string()
    } else {
        let keys = plan
            .order_by
            .iter()
            .map(|o| dialect.order_key(o))
            .collect::<Vec<_>>()
            .join(", ");
        format!("\nORDER BY {keys}")
    };

    let limit_clause = plan
        .limit
        .map(|n| format!("\nLIMIT {n}"))
        .unwrap_or_default();

    format!("{select_clause}\n{from_clause}{where_clause}{group_clause}{order_clause}{limit_clause}")
}

/// Render a plan into SQL. Output depends only on the plan and dialect.
pub fn render_sql(plan: &SearchPlan, dialect: Dialect) -> String {
    render_sql_inner(plan, dialect)
}

/// Compile and render in one step.
pub fn build_search_query(
    spec: &TableSpec,
    selection: &FilterSelection,
    options: &CompileOptions,
    dialect: Dialect,
) -> Result<BuiltQuery, QueryError> {
    let plan = compile_search(spec, selection, options)?;
    Ok(BuiltQuery {
        sql: render_sql(&plan, dialect),
        params: plan.params.clone(),
        dialect,
        plan: Some(plan),
    })
}
