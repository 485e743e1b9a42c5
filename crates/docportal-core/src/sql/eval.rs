//! Evaluates a [`SearchPlan`] against in-memory rows with the same
//! semantics the rendered SQL has in the warehouse.

use std::cmp::Ordering;

use serde_json::Value;

use crate::dsl::plan::{Clause, SearchPlan, SortDirection};
use crate::result::Row;
use crate::sql::params::ParamValue;

fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// Reverses like_pattern: strip the wrapping %...% and unescape.
fn needle(pattern: &str) -> String {
    let inner = pattern
        .strip_prefix('%')
        .and_then(|p| p.strip_suffix('%'))
        .unwrap_or(pattern);

    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        out.push(c);
    }
    out
}

fn keyword_matches(plan: &SearchPlan, fields: &[String], param: usize, row: &Row) -> bool {
    let Some(ParamValue::String(pattern)) = plan.params.get(param).map(|p| &p.value) else {
        return false;
    };
    let needle = needle(pattern);
    fields.iter().any(|f| {
        row.get(f)
            .and_then(as_text)
            .is_some_and(|text| text.to_lowercase().contains(&needle))
    })
}

fn clause_matches(plan: &SearchPlan, clause: &Clause, row: &Row) -> bool {
    match clause {
        Clause::Membership { column, param, .. } => {
            let value = row.get(column).unwrap_or(&Value::Null);
            match plan.params.get(*param).map(|p| &p.value) {
                Some(ParamValue::StringArray(values)) => {
                    as_text(value).is_some_and(|s| values.contains(&s))
                }
                Some(ParamValue::Int64Array(values)) => {
                    as_i64(value).is_some_and(|i| values.contains(&i))
                }
                _ => false,
            }
        }
        Clause::KeywordAll { fields, params } => {
            params.iter().all(|p| keyword_matches(plan, fields, *p, row))
        }
        Clause::KeywordAny { fields, params } => {
            params.iter().any(|p| keyword_matches(plan, fields, *p, row))
        }
    }
}

pub fn matches(plan: &SearchPlan, row: &Row) -> bool {
    plan.clauses.iter().all(|c| clause_matches(plan, c, row))
}

// NULLs sort first, numbers numerically, everything else as text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => as_text(x).cmp(&as_text(y)),
    }
}

/// Filter, sort, limit and project `rows` the way the warehouse would.
/// Output rows carry internal column names in projection order.
pub fn apply(plan: &SearchPlan, rows: &[Row]) -> Vec<Row> {
    let mut hits: Vec<&Row> = rows.iter().filter(|r| matches(plan, r)).collect();

    hits.sort_by(|a, b| {
        for key in &plan.order_by {
            let ord = compare_values(a.get(&key.column), b.get(&key.column));
            let ord = match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    let limit = plan
        .limit
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(usize::MAX);

    let mut out: Vec<Row> = Vec::new();
    for row in hits {
        if out.len() >= limit {
            break;
        }
        let projected: Row = plan
            .projections
            .iter()
            .map(|p| {
                let value = row.get(&p.column).cloned().unwrap_or(Value::Null);
                (p.column.clone(), value)
            })
            .collect();
        if plan.distinct && out.contains(&projected) {
            continue;
        }
        out.push(projected);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::compile::like_pattern;

    #[test]
    fn needle_reverses_like_pattern() {
        for token in ["100%", "a_b", "back\\slash", "活用"] {
            assert_eq!(needle(&like_pattern(token)), token);
        }
    }
}
