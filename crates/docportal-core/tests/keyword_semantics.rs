use docportal_core::sql::eval;
use docportal_core::{compile_search, CompileOptions, FilterSelection, Row};

mod common;
use crate::common::{doc_row, document_rows, documents_spec, fp, file_pages, keywords};

fn search(sel: &FilterSelection) -> Vec<Row> {
    let plan = compile_search(&documents_spec(), sel, &CompileOptions::default()).expect("compile");
    eval::apply(&plan, &document_rows())
}

fn matches(sel: &FilterSelection, row: &Row) -> bool {
    let plan = compile_search(&documents_spec(), sel, &CompileOptions::default()).expect("compile");
    eval::matches(&plan, row)
}

#[test]
fn and_keywords_must_all_match() {
    let sel = keywords(&["AI", "活用"], &[]);

    let both = doc_row("a", "AI活用の手引き", "総務省", 2022, "予算", "概要", 1, "");
    let only_ai = doc_row("b", "AI戦略", "総務省", 2022, "予算", "概要", 1, "概要");
    let split = doc_row("c", "AI戦略", "総務省", 2022, "予算", "概要", 1, "行政での活用");

    assert!(matches(&sel, &both));
    assert!(!matches(&sel, &only_ai));
    // each token may match a different field
    assert!(matches(&sel, &split));

    assert_eq!(file_pages(&search(&sel)), fp(&[("f1", 1), ("f1", 2)]));
}

#[test]
fn and_keywords_split_on_whitespace() {
    let joined = keywords(&["AI　活用"], &[]);
    let separate = keywords(&["AI", "活用"], &[]);
    assert_eq!(file_pages(&search(&joined)), file_pages(&search(&separate)));
}

#[test]
fn or_keywords_need_any_match() {
    let sel = keywords(&[], &["教育", "医療"]);

    let edu = doc_row("a", "教育白書", "文部科学省", 2022, "白書", "本文", 1, "");
    let med = doc_row("b", "資料", "厚生労働省", 2022, "白書", "本文", 1, "医療提供体制");
    let neither = doc_row("c", "防衛白書", "防衛省", 2022, "白書", "本文", 1, "安全保障");

    assert!(matches(&sel, &edu));
    assert!(matches(&sel, &med));
    assert!(!matches(&sel, &neither));

    // f3 mentions neither token
    let hits = file_pages(&search(&sel));
    assert!(!hits.iter().any(|(f, _)| f == "f3"));
    assert!(!hits.iter().any(|(f, _)| f == "f6"));
    assert_eq!(hits.len(), 5);
}

#[test]
fn and_or_groups_must_both_hold() {
    let sel = keywords(&["AI"], &["教育", "医療"]);

    let ai_edu = doc_row("a", "AI", "総務省", 2022, "予算", "概要", 1, "教育");
    let only_ai = doc_row("b", "AI", "総務省", 2022, "予算", "概要", 1, "防災");
    let only_edu = doc_row("c", "教育", "総務省", 2022, "予算", "概要", 1, "");

    assert!(matches(&sel, &ai_edu));
    assert!(!matches(&sel, &only_ai));
    assert!(!matches(&sel, &only_edu));

    // f6 has AI but neither OR token; f5 has 教育 but no AI
    let hits = file_pages(&search(&sel));
    assert_eq!(hits, fp(&[("f1", 1), ("f1", 2), ("f4", 1), ("f2", 1)]));
}

#[test]
fn keyword_match_is_case_insensitive_and_literal() {
    let sel = keywords(&["dx"], &[]);
    let hits = file_pages(&search(&sel));
    assert_eq!(hits, fp(&[("f3", 1), ("f4", 1)]));

    // % is a literal character, not a wildcard
    let pct = keywords(&["10%"], &[]);
    let literal = doc_row("a", "削減率10%", "総務省", 2022, "予算", "概要", 1, "");
    let wildcard_bait = doc_row("b", "10年で半減", "総務省", 2022, "予算", "概要", 1, "");
    assert!(matches(&pct, &literal));
    assert!(!matches(&pct, &wildcard_bait));
}
