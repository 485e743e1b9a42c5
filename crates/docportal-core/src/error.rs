use thiserror::Error;

/// Failures raised while turning a selection into a query.
///
/// Nothing here comes from the data store: the builder performs no I/O.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid table spec '{table}': {reason}")]
    InvalidTableSpec { table: String, reason: String },

    #[error("invalid value '{value}' for filter '{filter}': {reason}")]
    InvalidFilterValue {
        filter: &'static str,
        value: String,
        reason: String,
    },

    #[error("filter '{filter}' does not apply to table '{table}'")]
    InapplicableFilter { filter: &'static str, table: String },
}

impl QueryError {
    pub(crate) fn table_spec(table: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidTableSpec {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures reported by the external data-store collaborators
/// (query execution, credential lookup, audit writes).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("unexpected value in column '{column}': {reason}")]
    Decode { column: String, reason: String },

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user id and password are required")]
    MissingCredentials,

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
