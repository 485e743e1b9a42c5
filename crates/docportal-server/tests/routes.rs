use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use docportal_core::audit::{AuditRecord, LoginResult, MemoryAuditSink};
use docportal_core::auth::{AuthTableSpec, MemoryCredentialStore, Role};
use docportal_core::config::PortalConfig;
use docportal_core::schema::catalog::{budget_table, council_table};
use docportal_core::search::MemoryExecutor;
use docportal_core::{Dialect, Row, TableRef};
use docportal_server::routes::router;
use docportal_server::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn config() -> PortalConfig {
    PortalConfig {
        dialect: Dialect::Postgres,
        tables: vec![budget_table("gov_docs"), council_table("gov_docs")],
        auth: AuthTableSpec::new(TableRef::new("portal_config", "auth")),
        log_login_table: TableRef::new("portal_config", "log_login"),
        log_search_table: TableRef::new("portal_config", "log_search"),
        row_limit: Some(100),
        metadata_ttl_secs: 3600,
    }
}

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn budget_rows() -> Vec<Row> {
    vec![
        row(&[
            ("file_id", json!("b1")),
            ("title", json!("AI活用推進計画")),
            ("ministry", json!("総務省")),
            ("agency", json!("情報流通行政局")),
            ("fiscal_year_start", json!(2022)),
            ("category", json!("予算")),
            ("sub_category", json!("概要")),
            ("file_page", json!(1)),
            ("content_text", json!("教育分野でのAI活用")),
        ]),
        row(&[
            ("file_id", json!("b2")),
            ("title", json!("医療DX")),
            ("ministry", json!("厚生労働省")),
            ("agency", json!("医政局")),
            ("fiscal_year_start", json!(2023)),
            ("category", json!("予算")),
            ("sub_category", json!("資料")),
            ("file_page", json!(1)),
            ("content_text", json!("電子カルテの標準化")),
        ]),
    ]
}

fn council_rows() -> Vec<Row> {
    vec![row(&[
        ("file_id", json!("c1")),
        ("title", json!("AI戦略会議 資料")),
        ("ministry", json!("内閣府")),
        ("council_name", json!("AI戦略会議")),
        ("fiscal_year_start", json!(2023)),
        ("category", json!("議事")),
        ("file_page", json!(3)),
        ("content_text", json!("生成AIの利活用")),
    ])]
}

fn app() -> (Router, Arc<MemoryAuditSink>) {
    let executor = MemoryExecutor::new()
        .with_table("budget", budget_rows())
        .with_table("council", council_rows());
    let credentials = MemoryCredentialStore::new()
        .with_account("admin", "secret", Role::Admin)
        .with_account("analyst", "hunter2", Role::User);
    let audit = Arc::new(MemoryAuditSink::new());

    let state = AppState::new(&config(), Arc::new(executor), Arc::new(credentials), audit.clone())
        .unwrap();
    (router(Arc::new(state)), audit)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn login_reports_role_and_is_audited() {
    let (app, audit) = app();

    let (status, body) = call(
        app.clone(),
        post("/login", json!({ "user_id": "admin", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "authenticated": true, "role": "admin" }));

    let (status, body) = call(
        app,
        post("/login", json!({ "user_id": "admin", "password": "nope", "session_id": "s-9" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["authenticated"], json!(false));

    let results: Vec<(String, LoginResult)> = audit
        .records()
        .into_iter()
        .filter_map(|r| match r {
            AuditRecord::Login(l) => Some((l.session_id, l.result)),
            AuditRecord::Search(_) => None,
        })
        .collect();
    assert_eq!(
        results,
        vec![
            ("admin".to_string(), LoginResult::Success),
            ("s-9".to_string(), LoginResult::Failed),
        ]
    );
}

#[tokio::test]
async fn empty_password_is_a_bad_request() {
    let (app, audit) = app();
    let (status, _) = call(app, post("/login", json!({ "user_id": "admin", "password": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(audit.records().is_empty());
}

#[tokio::test]
async fn tables_list_labels_and_supported_filters() {
    let (app, _) = app();
    let (status, body) = call(app, get("/tables")).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body[0]["name"], json!("budget"));
    assert_eq!(body[0]["label"], json!("予算資料"));
    assert_eq!(
        body[0]["filters"],
        json!(["ministry", "agency", "category", "sub_category", "fiscal_year"])
    );
    assert_eq!(
        body[1]["filters"],
        json!(["ministry", "council", "category", "fiscal_year"])
    );
}

#[tokio::test]
async fn filters_are_distinct_per_table() {
    let (app, _) = app();
    let (status, body) = call(app.clone(), get("/filters/budget")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table"], json!("budget"));
    assert_eq!(body["values"]["fiscal_year"], json!([2023, 2022]));
    assert_eq!(body["values"]["ministry"], json!(["厚生労働省", "総務省"]));

    let (status, _) = call(app, get("/filters/minutes")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn council_filter_skips_budget_tab() {
    let (app, audit) = app();
    let (status, body) = call(
        app,
        post(
            "/search",
            json!({
                "session_id": "s-1",
                "selection": { "councils": ["AI戦略会議"], "keyword_and": ["ai"] }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let tabs = body["tabs"].as_array().unwrap();
    assert_eq!(tabs.len(), 2);
    assert_eq!(tabs[0]["table"], json!("budget"));
    assert_eq!(tabs[0]["status"], json!("not_applicable"));
    assert_eq!(tabs[0]["dimensions"], json!(["council"]));

    assert_eq!(tabs[1]["status"], json!("found"));
    assert_eq!(tabs[1]["result"]["file_count"], json!(1));
    assert_eq!(tabs[1]["result"]["rows"][0]["会議体"], json!("AI戦略会議"));

    let searches: Vec<_> = audit
        .records()
        .into_iter()
        .filter_map(|r| match r {
            AuditRecord::Search(s) => Some(s),
            AuditRecord::Login(_) => None,
        })
        .collect();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].table, "council");
    assert_eq!(searches[0].session_id, "s-1");
    assert_eq!(searches[0].filter_councils, "AI戦略会議");
}

#[tokio::test]
async fn empty_results_are_not_audited() {
    let (app, audit) = app();
    let (status, body) = call(
        app,
        post(
            "/search",
            json!({ "tables": ["budget"], "selection": { "keyword_or": ["存在しない語"] } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tabs"][0]["result"]["page_count"], json!(0));
    assert!(audit.records().is_empty());
}

#[tokio::test]
async fn bad_year_and_unknown_table_are_rejected() {
    let (app, _) = app();
    let (status, body) = call(
        app.clone(),
        post("/search", json!({ "selection": { "fiscal_years": ["令和五年"] } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("fiscal_year"));

    let (status, _) = call(app, post("/search", json!({ "tables": ["minutes"] }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn duplicate_table_names_fail_state_construction() {
    let mut config = config();
    config.tables.push(budget_table("gov_docs"));
    let state = AppState::new(
        &config,
        Arc::new(MemoryExecutor::new()),
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(MemoryAuditSink::new()),
    );
    assert!(state.is_err());
}
