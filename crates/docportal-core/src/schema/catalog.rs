use indexmap::IndexMap;

use crate::schema::table_spec::{DimensionColumns, TableSpec};

fn labels(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(col, label)| (col.to_string(), label.to_string()))
        .collect()
}

fn col(name: &str) -> Option<String> {
    Some(name.to_string())
}

/// Single-table portal: ministry documents with page-level text.
pub fn ministry_documents_table(dataset: &str, table: &str) -> TableSpec {
    TableSpec {
        name: "documents".into(),
        label: "省庁資料".into(),
        project_id: None,
        dataset_name: dataset.into(),
        table_name: table.into(),
        display_columns: labels(&[
            ("file_id", "ファイルID"),
            ("title", "資料名"),
            ("ministry", "省庁"),
            ("fiscal_year_start", "年度"),
            ("category", "カテゴリ"),
            ("sub_category", "資料形式"),
            ("file_page", "ページ"),
            ("source_url", "URL"),
            ("content_text", "本文"),
        ]),
        columns: DimensionColumns {
            ministry: col("ministry"),
            category: col("category"),
            sub_category: col("sub_category"),
            fiscal_year: col("fiscal_year_start"),
            title: col("title"),
            content: col("content_text"),
            file_id: col("file_id"),
            page: col("file_page"),
            ..Default::default()
        },
    }
}

/// Budget materials tab: ministry and agency, no council.
pub fn budget_table(dataset: &str) -> TableSpec {
    TableSpec {
        name: "budget".into(),
        label: "予算資料".into(),
        project_id: None,
        dataset_name: dataset.into(),
        table_name: "budget_documents".into(),
        display_columns: labels(&[
            ("file_id", "ファイルID"),
            ("title", "資料名"),
            ("ministry", "省庁"),
            ("agency", "部局"),
            ("fiscal_year_start", "年度"),
            ("category", "カテゴリ"),
            ("sub_category", "資料形式"),
            ("file_page", "ページ"),
            ("source_url", "URL"),
            ("content_text", "本文"),
        ]),
        columns: DimensionColumns {
            ministry: col("ministry"),
            agency: col("agency"),
            category: col("category"),
            sub_category: col("sub_category"),
            fiscal_year: col("fiscal_year_start"),
            title: col("title"),
            content: col("content_text"),
            file_id: col("file_id"),
            page: col("file_page"),
            ..Default::default()
        },
    }
}

/// Council meeting materials tab.
pub fn council_table(dataset: &str) -> TableSpec {
    TableSpec {
        name: "council".into(),
        label: "審議会資料".into(),
        project_id: None,
        dataset_name: dataset.into(),
        table_name: "council_documents".into(),
        display_columns: labels(&[
            ("file_id", "ファイルID"),
            ("title", "資料名"),
            ("ministry", "省庁"),
            ("council_name", "会議体"),
            ("category", "カテゴリ"),
            ("fiscal_year_start", "年度"),
            ("file_page", "ページ"),
            ("source_url", "URL"),
            ("content_text", "本文"),
        ]),
        columns: DimensionColumns {
            ministry: col("ministry"),
            council: col("council_name"),
            category: col("category"),
            fiscal_year: col("fiscal_year_start"),
            title: col("title"),
            content: col("content_text"),
            file_id: col("file_id"),
            page: col("file_page"),
            ..Default::default()
        },
    }
}
