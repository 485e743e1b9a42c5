use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::dsl::compile::CompileOptions;
use crate::dsl::selection::FilterSelection;
use crate::dsl::validate::inapplicable_dimensions;
use crate::error::{QueryError, StoreError};
use crate::result::{Row, SearchResult};
use crate::schema::table_spec::{Dimension, TableSpec};
use crate::sql::dialect::Dialect;
use crate::sql::eval;
use crate::sql::render::{build_search_query, BuiltQuery};

/// Runs a built query against the warehouse.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &BuiltQuery) -> Result<Vec<Row>, StoreError>;
}

/// Executor over fixed rows per logical table.
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    tables: HashMap<String, Vec<Row>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.insert(name.into(), rows);
        self
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn execute(&self, query: &BuiltQuery) -> Result<Vec<Row>, StoreError> {
        let plan = query
            .plan
            .as_ref()
            .ok_or_else(|| StoreError::Query("in-memory executor needs a search plan".into()))?;
        let rows = self
            .tables
            .get(&plan.table)
            .ok_or_else(|| StoreError::UnknownTable(plan.table.clone()))?;
        Ok(eval::apply(plan, rows))
    }
}

#[derive(Debug, Clone)]
pub enum TabQuery {
    Ready(BuiltQuery),
    /// The selection constrains a dimension this table does not have.
    NotApplicable { dimensions: Vec<Dimension> },
}

#[derive(Debug, Clone)]
pub struct TabPlan<'a> {
    pub spec: &'a TableSpec,
    pub query: TabQuery,
}

/// Build one query per table. Tables that cannot honour every selected
/// dimension are skipped rather than searched with the filter dropped.
/// Any other error aborts the whole search.
pub fn plan_tabs<'a>(
    specs: impl IntoIterator<Item = &'a TableSpec>,
    selection: &FilterSelection,
    options: &CompileOptions,
    dialect: Dialect,
) -> Result<Vec<TabPlan<'a>>, QueryError> {
    specs
        .into_iter()
        .map(|spec| {
            let missing = inapplicable_dimensions(spec, selection);
            let query = if missing.is_empty() {
                TabQuery::Ready(build_search_query(spec, selection, options, dialect)?)
            } else {
                TabQuery::NotApplicable {
                    dimensions: missing,
                }
            };
            Ok(TabPlan { spec, query })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TabOutcome {
    Found { result: SearchResult },
    NotApplicable { dimensions: Vec<Dimension> },
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TabResult {
    pub table: String,
    pub label: String,
    #[serde(flatten)]
    pub outcome: TabOutcome,
}

impl TabResult {
    pub fn result(&self) -> Option<&SearchResult> {
        match &self.outcome {
            TabOutcome::Found { result } => Some(result),
            _ => None,
        }
    }
}

/// Execute ready tabs in order. A failing table is reported on its own
/// tab and does not hide the others.
pub async fn run_tabs(executor: &dyn QueryExecutor, tabs: Vec<TabPlan<'_>>) -> Vec<TabResult> {
    let mut results = Vec::with_capacity(tabs.len());

    for tab in tabs {
        let outcome = match &tab.query {
            TabQuery::NotApplicable { dimensions } => {
                info!(table = %tab.spec.name, ?dimensions, "table skipped, filter not applicable");
                TabOutcome::NotApplicable {
                    dimensions: dimensions.clone(),
                }
            }
            TabQuery::Ready(query) => match executor.execute(query).await {
                Ok(rows) => {
                    let result = SearchResult::from_rows(tab.spec, rows);
                    info!(
                        table = %tab.spec.name,
                        files = result.file_count,
                        pages = result.page_count,
                        "search finished"
                    );
                    TabOutcome::Found { result }
                }
                Err(e) => {
                    warn!(table = %tab.spec.name, error = %e, "search failed");
                    TabOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            },
        };

        results.push(TabResult {
            table: tab.spec.name.clone(),
            label: tab.spec.label.clone(),
            outcome,
        });
    }

    results
}
