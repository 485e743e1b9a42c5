#![allow(dead_code)]

use std::path::PathBuf;

use docportal_core::schema::catalog::ministry_documents_table;
use docportal_core::{FilterSelection, Row, TableSpec};
use serde_json::json;

pub fn repo_path(rel: &str) -> String {
    // crates/docportal-core -> repo root (two levels up)
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.join(rel))
        .expect("resolve repo root from CARGO_MANIFEST_DIR")
        .to_string_lossy()
        .to_string()
}

pub fn documents_spec() -> TableSpec {
    ministry_documents_table("gov_docs", "documents")
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn set(values: &[&str]) -> std::collections::BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn keywords(and: &[&str], or: &[&str]) -> FilterSelection {
    FilterSelection {
        keyword_and: strings(and),
        keyword_or: strings(or),
        ..Default::default()
    }
}

#[allow(clippy::too_many_arguments)]
pub fn doc_row(
    file_id: &str,
    title: &str,
    ministry: &str,
    year: i64,
    category: &str,
    sub_category: &str,
    page: i64,
    content: &str,
) -> Row {
    [
        ("file_id", json!(file_id)),
        ("title", json!(title)),
        ("ministry", json!(ministry)),
        ("fiscal_year_start", json!(year)),
        ("category", json!(category)),
        ("sub_category", json!(sub_category)),
        ("file_page", json!(page)),
        ("source_url", json!(format!("https://example.go.jp/{file_id}.pdf"))),
        ("content_text", json!(content)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Two ministries, three categories, three years.
pub fn document_rows() -> Vec<Row> {
    vec![
        doc_row("f1", "AI活用推進計画", "総務省", 2022, "予算", "概要", 1, "教育分野でのAI活用"),
        doc_row("f1", "AI活用推進計画", "総務省", 2022, "予算", "概要", 2, "医療データ連携"),
        doc_row("f2", "AI戦略", "財務省", 2021, "白書", "本文", 1, "教育予算の概要"),
        doc_row("f3", "デジタル田園都市", "総務省", 2021, "白書", "本文", 1, "地方のDX"),
        doc_row("f4", "医療DX工程表", "財務省", 2023, "予算", "概要", 1, "AIによる診断支援"),
        doc_row("f5", "教育ICT", "総務省", 2021, "予算", "資料", 1, "学校でのネットワーク整備"),
        doc_row("f6", "AIガイドライン", "財務省", 2022, "白書", "資料", 1, "指針の策定"),
        doc_row("f7", "統計年報", "総務省", 2023, "統計", "資料", 1, "人口推計の結果"),
    ]
}

/// (file_id, page) of each row, for order assertions.
pub fn file_pages(rows: &[Row]) -> Vec<(String, i64)> {
    rows.iter()
        .map(|r| {
            (
                r["file_id"].as_str().unwrap_or_default().to_string(),
                r["file_page"].as_i64().unwrap_or_default(),
            )
        })
        .collect()
}

pub fn fp(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
    pairs.iter().map(|(f, p)| (f.to_string(), *p)).collect()
}
