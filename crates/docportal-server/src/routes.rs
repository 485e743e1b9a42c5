use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use docportal_core::audit::{record_best_effort, AuditRecord, SearchLogRecord};
use docportal_core::auth::{authenticate, AuthOutcome, Credentials};
use docportal_core::metadata::FilterOptions;
use docportal_core::search::{plan_tabs, run_tabs, TabResult};
use docportal_core::{Dimension, FilterSelection, TableSpec};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Defaults to the user id.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub session_id: String,
    /// Logical table names to search; empty means every table.
    pub tables: Vec<String>,
    pub selection: FilterSelection,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub tabs: Vec<TabResult>,
}

#[derive(Debug, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub label: String,
    pub columns: Vec<String>,
    pub filters: Vec<Dimension>,
}

impl TableInfo {
    fn from_spec(spec: &TableSpec) -> Self {
        Self {
            name: spec.name.clone(),
            label: spec.label.clone(),
            columns: spec.display_columns.values().cloned().collect(),
            filters: Dimension::FILTERS
                .into_iter()
                .filter(|d| spec.supports(*d))
                .collect(),
        }
    }
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthOutcome>), AppError> {
    let session_id = req
        .session_id
        .unwrap_or_else(|| req.credentials.user_id.clone());
    let outcome = authenticate(
        state.credentials.as_ref(),
        state.audit.as_ref(),
        &req.credentials,
        &session_id,
    )
    .await?;

    let status = if outcome.authenticated {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    Ok((status, Json(outcome)))
}

async fn tables(State(state): State<Arc<AppState>>) -> Json<Vec<TableInfo>> {
    Json(state.registry.specs().map(TableInfo::from_spec).collect())
}

async fn filters(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
) -> Result<Json<FilterOptions>, AppError> {
    Ok(Json(state.filter_options(&table).await?))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let specs = if req.tables.is_empty() {
        state.registry.specs().collect::<Vec<_>>()
    } else {
        req.tables
            .iter()
            .map(|name| state.table(name))
            .collect::<Result<Vec<_>, _>>()?
    };

    let plans = plan_tabs(specs, &req.selection, &state.options, state.dialect)?;
    let tabs = run_tabs(state.executor.as_ref(), plans).await;

    for result in tabs.iter().filter_map(TabResult::result) {
        if result.is_empty() {
            continue;
        }
        let record = SearchLogRecord::new(&req.session_id, &req.selection, result);
        record_best_effort(state.audit.as_ref(), AuditRecord::Search(record)).await;
    }

    Ok(Json(SearchResponse { tabs }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/tables", get(tables))
        .route("/filters/:table", get(filters))
        .route("/search", post(search))
        .with_state(state)
}
