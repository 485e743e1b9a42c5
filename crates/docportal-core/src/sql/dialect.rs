use serde::{Deserialize, Serialize};

use crate::dsl::plan::{PlanOrder, SortDirection};
use crate::schema::table_spec::TableRef;
use crate::sql::params::QueryParameter;

/// SQL flavour of the warehouse the query is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Named `@param` placeholders, `IN UNNEST(@param)` membership.
    #[default]
    BigQuery,
    /// Positional `$n` placeholders with explicit casts, `= ANY($n)` membership.
    Postgres,
}

impl Dialect {
    pub fn table(self, table: &TableRef) -> String {
        match self {
            Dialect::BigQuery => match &table.project_id {
                Some(project) => format!(
                    "`{}.{}.{}`",
                    project, table.dataset_name, table.table_name
                ),
                None => format!("`{}.{}`", table.dataset_name, table.table_name),
            },
            Dialect::Postgres => format!("{}.{}", table.dataset_name, table.table_name),
        }
    }

    /// Placeholder for `params[index]`.
    pub fn placeholder(self, index: usize, param: &QueryParameter) -> String {
        match self {
            Dialect::BigQuery => format!("@{}", param.name),
            Dialect::Postgres => format!("${}::{}", index + 1, param.value.pg_type()),
        }
    }

    pub fn membership(self, column: &str, placeholder: &str) -> String {
        match self {
            Dialect::BigQuery => format!("{column} IN UNNEST({placeholder})"),
            Dialect::Postgres => format!("{column} = ANY({placeholder})"),
        }
    }

    /// Sort key with BigQuery's placement and text order: NULLs first
    /// ascending, last descending, strings by code point.
    pub fn order_key(self, order: &PlanOrder) -> String {
        let column = &order.column;
        match self {
            Dialect::BigQuery => match order.direction {
                SortDirection::Asc => column.clone(),
                SortDirection::Desc => format!("{column} DESC"),
            },
            Dialect::Postgres => {
                let key = if order.text {
                    format!("{column} COLLATE \"C\"")
                } else {
                    column.clone()
                };
                match order.direction {
                    SortDirection::Asc => format!("{key} NULLS FIRST"),
                    SortDirection::Desc => format!("{key} DESC NULLS LAST"),
                }
            }
        }
    }

    /// Converts an ISO-8601 string placeholder into a timestamp expression.
    pub fn timestamp(self, placeholder: &str) -> String {
        match self {
            Dialect::BigQuery => format!("TIMESTAMP({placeholder})"),
            Dialect::Postgres => format!("CAST({placeholder} AS timestamptz)"),
        }
    }
}
