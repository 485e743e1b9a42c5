use docportal_core::validate::static_check::parse_ok;
use docportal_core::{build_search_query, CompileOptions, Dialect, FilterSelection, ParamValue};

mod common;
use crate::common::{documents_spec, set, strings};

fn full_selection() -> FilterSelection {
    FilterSelection {
        ministries: set(&["総務省"]),
        categories: set(&["予算"]),
        fiscal_years: set(&["2021", "2022"]),
        keyword_and: strings(&["AI 活用"]),
        keyword_or: strings(&["教育", "医療"]),
        ..Default::default()
    }
}

fn capped() -> CompileOptions {
    CompileOptions {
        row_limit: Some(1000),
    }
}

#[test]
fn full_query_bigquery() {
    let q = build_search_query(&documents_spec(), &full_selection(), &capped(), Dialect::BigQuery)
        .expect("build query");

    insta::assert_snapshot!(q.sql, @r"
SELECT file_id,
       title,
       ministry,
       fiscal_year_start,
       category,
       sub_category,
       file_page,
       source_url,
       content_text
FROM `gov_docs.documents`
WHERE ministry IN UNNEST(@ministries)
  AND category IN UNNEST(@categories)
  AND fiscal_year_start IN UNNEST(@years)
  AND (LOWER(title) LIKE @kw_and_0 OR LOWER(content_text) LIKE @kw_and_0)
  AND (LOWER(title) LIKE @kw_and_1 OR LOWER(content_text) LIKE @kw_and_1)
  AND ((LOWER(title) LIKE @kw_or_0 OR LOWER(content_text) LIKE @kw_or_0) OR (LOWER(title) LIKE @kw_or_1 OR LOWER(content_text) LIKE @kw_or_1))
ORDER BY ministry, category, fiscal_year_start, file_id, file_page
LIMIT 1000
");

    let names: Vec<_> = q.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        ["ministries", "categories", "years", "kw_and_0", "kw_and_1", "kw_or_0", "kw_or_1"]
    );
    assert_eq!(q.params[2].value, ParamValue::Int64Array(vec![2021, 2022]));
    assert_eq!(q.params[2].value.type_name(), "ARRAY<INT64>");
    assert_eq!(q.params[3].value, ParamValue::String("%ai%".into()));
    assert_eq!(q.params[4].value, ParamValue::String("%活用%".into()));
}

#[test]
fn full_query_postgres_parses() {
    let q = build_search_query(&documents_spec(), &full_selection(), &capped(), Dialect::Postgres)
        .expect("build query");

    let expected = "\
SELECT file_id,
       title,
       ministry,
       fiscal_year_start,
       category,
       sub_category,
       file_page,
       source_url,
       content_text
FROM gov_docs.documents
WHERE ministry = ANY($1::text[])
  AND category = ANY($2::text[])
  AND fiscal_year_start = ANY($3::bigint[])
  AND (LOWER(title) LIKE $4::text OR LOWER(content_text) LIKE $4::text)
  AND (LOWER(title) LIKE $5::text OR LOWER(content_text) LIKE $5::text)
  AND ((LOWER(title) LIKE $6::text OR LOWER(content_text) LIKE $6::text) OR (LOWER(title) LIKE $7::text OR LOWER(content_text) LIKE $7::text))
ORDER BY ministry COLLATE \"C\" NULLS FIRST, category COLLATE \"C\" NULLS FIRST, fiscal_year_start NULLS FIRST, file_id COLLATE \"C\" NULLS FIRST, file_page NULLS FIRST
LIMIT 1000";

    assert_eq!(q.sql, expected);
    parse_ok(&q.sql, Dialect::Postgres).expect("rendered SQL should parse");
}

#[test]
fn empty_selection_has_no_where_clause() {
    let spec = documents_spec();
    for dialect in [Dialect::BigQuery, Dialect::Postgres] {
        let q = build_search_query(&spec, &FilterSelection::default(), &CompileOptions::default(), dialect)
            .expect("build query");
        assert!(!q.sql.contains("WHERE"), "unexpected filter in:\n{}", q.sql);
        assert!(!q.sql.contains("LIMIT"));
        assert!(q.params.is_empty());
    }
}

#[test]
fn select_list_follows_display_order() {
    let spec = documents_spec();
    let q = build_search_query(&spec, &FilterSelection::default(), &CompileOptions::default(), Dialect::BigQuery)
        .expect("build query");

    let select = q.sql.split("\nFROM").next().unwrap_or_default();
    let cols: Vec<_> = select
        .trim_start_matches("SELECT ")
        .split(',')
        .map(str::trim)
        .collect();
    let declared: Vec<_> = spec.display_columns.keys().map(String::as_str).collect();
    assert_eq!(cols, declared);
}
