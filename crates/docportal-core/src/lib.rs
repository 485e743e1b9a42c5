//! Search core of the document portal: turns a filter selection into a
//! parameterized warehouse query and shapes the rows that come back.

pub mod audit;
pub mod auth;
pub mod config;
pub mod dsl;
pub mod error;
pub mod metadata;
pub mod result;
pub mod schema;
pub mod search;
pub mod sql;
pub mod validate;

pub use dsl::compile::{compile_search, CompileOptions};
pub use dsl::selection::FilterSelection;
pub use error::{AuthError, QueryError, StoreError};
pub use result::{Row, SearchResult};
pub use schema::table_spec::{Dimension, DimensionColumns, TableRef, TableSpec};
pub use sql::dialect::Dialect;
pub use sql::params::{ParamValue, QueryParameter};
pub use sql::render::{build_search_query, render_sql, BuiltQuery};
