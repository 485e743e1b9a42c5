use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use serde::Serialize;
use tracing::{debug, warn};

use crate::dsl::selection::FilterSelection;
use crate::error::{QueryError, StoreError};
use crate::result::SearchResult;
use crate::schema::table_spec::TableRef;
use crate::sql::dialect::Dialect;
use crate::sql::params::QueryParameter;
use crate::sql::render::BuiltQuery;

/// Current time as ISO-8601 in Japan time.
pub fn now_tokyo() -> String {
    Utc::now().with_timezone(&Tokyo).to_rfc3339()
}

fn joined<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginResult {
    Success,
    Failed,
}

impl LoginResult {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginResult::Success => "success",
            LoginResult::Failed => "failed",
        }
    }
}

/// One login attempt. The password is never recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginLogRecord {
    pub timestamp: String,
    pub id: String,
    pub result: LoginResult,
    pub session_id: String,
}

/// One executed search on one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchLogRecord {
    pub timestamp: String,
    pub session_id: String,
    pub table: String,
    pub keyword: String,
    pub filter_ministries: String,
    pub filter_agencies: String,
    pub filter_councils: String,
    pub filter_category: String,
    pub filter_subcategory: String,
    pub filter_year: String,
    pub file_count: usize,
    pub page_count: usize,
}

impl SearchLogRecord {
    pub fn new(session_id: &str, selection: &FilterSelection, result: &SearchResult) -> Self {
        Self {
            timestamp: now_tokyo(),
            session_id: session_id.to_string(),
            table: result.table.clone(),
            keyword: selection.keyword_summary(),
            filter_ministries: joined(&selection.ministries),
            filter_agencies: joined(&selection.agencies),
            filter_councils: joined(&selection.councils),
            filter_category: joined(&selection.categories),
            filter_subcategory: joined(&selection.sub_categories),
            filter_year: joined(&selection.fiscal_years),
            file_count: result.file_count,
            page_count: result.page_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditRecord {
    Login(LoginLogRecord),
    Search(SearchLogRecord),
}

enum Column {
    Timestamp(&'static str, String),
    Value(&'static str, QueryParameter),
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl AuditRecord {
    fn columns(&self) -> Vec<Column> {
        use Column::*;
        let s = |name: &str, value: String| QueryParameter::string(name, value);
        match self {
            AuditRecord::Login(r) => vec![
                Timestamp("logged_at", r.timestamp.clone()),
                Value("id", s("id", r.id.clone())),
                Value("result", s("result", r.result.as_str().to_string())),
                Value("session_id", s("session_id", r.session_id.clone())),
            ],
            AuditRecord::Search(r) => vec![
                Timestamp("logged_at", r.timestamp.clone()),
                Value("session_id", s("session_id", r.session_id.clone())),
                Value("search_table", s("search_table", r.table.clone())),
                Value("keyword", s("keyword", r.keyword.clone())),
                Value("filter_ministries", s("filter_ministries", r.filter_ministries.clone())),
                Value("filter_agencies", s("filter_agencies", r.filter_agencies.clone())),
                Value("filter_councils", s("filter_councils", r.filter_councils.clone())),
                Value("filter_category", s("filter_category", r.filter_category.clone())),
                Value("filter_subcategory", s("filter_subcategory", r.filter_subcategory.clone())),
                Value("filter_year", s("filter_year", r.filter_year.clone())),
                Value("file_count", QueryParameter::int64("file_count", count(r.file_count))),
                Value("page_count", QueryParameter::int64("page_count", count(r.page_count))),
            ],
        }
    }

    /// Parameterized INSERT of this record into `table`.
    pub fn insert_query(&self, table: &TableRef, dialect: Dialect) -> Result<BuiltQuery, QueryError> {
        table.validate("audit log")?;

        let mut names = Vec::new();
        let mut values = Vec::new();
        let mut params = Vec::new();

        for column in self.columns() {
            let (name, param, is_timestamp) = match column {
                Column::Timestamp(name, ts) => (name, QueryParameter::string(name, ts), true),
                Column::Value(name, p) => (name, p, false),
            };
            let ph = dialect.placeholder(params.len(), &param);
            values.push(if is_timestamp { dialect.timestamp(&ph) } else { ph });
            names.push(name);
            params.push(param);
        }

        let sql = format!(
            "INSERT INTO {} ({})\nVALUES ({})",
            dialect.table(table),
            names.join(", "),
            values.join(", ")
        );
        Ok(BuiltQuery::new(sql, params, dialect))
    }
}

/// Persists audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn write(&self, record: &AuditRecord) -> Result<(), StoreError>;
}

/// Write a record, logging and swallowing any failure so the caller's
/// flow is never interrupted by audit problems.
pub async fn record_best_effort(sink: &dyn AuditSink, record: AuditRecord) {
    match sink.write(&record).await {
        Ok(()) => debug!(?record, "audit record written"),
        Err(e) => warn!(error = %e, "failed to write audit record"),
    }
}

/// Keeps records in memory. Optionally fails every write.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    fail: bool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn write(&self, record: &AuditRecord) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Unavailable("audit sink is down".into()));
        }
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("audit sink lock poisoned".into()))?
            .push(record.clone());
        Ok(())
    }
}
