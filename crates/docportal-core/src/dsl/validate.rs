use std::collections::BTreeSet;

use crate::dsl::selection::FilterSelection;
use crate::error::QueryError;
use crate::schema::table_spec::{Dimension, TableSpec};

/// Dimensions the selection sets that `spec` has no column for.
pub fn inapplicable_dimensions(spec: &TableSpec, selection: &FilterSelection) -> Vec<Dimension> {
    selection
        .requested_dimensions()
        .into_iter()
        .filter(|d| !spec.supports(*d))
        .collect()
}

pub fn validate_selection(spec: &TableSpec, selection: &FilterSelection) -> Result<(), QueryError> {
    if let Some(dim) = inapplicable_dimensions(spec, selection).first() {
        return Err(QueryError::InapplicableFilter {
            filter: dim.as_str(),
            table: spec.name.clone(),
        });
    }
    parse_fiscal_years(&selection.fiscal_years)?;
    Ok(())
}

/// Coerces raw year values to integers. Full-width digits are accepted.
pub fn parse_fiscal_years(values: &BTreeSet<String>) -> Result<BTreeSet<i64>, QueryError> {
    values.iter().map(|v| parse_year(v)).collect()
}

fn parse_year(raw: &str) -> Result<i64, QueryError> {
    let err = |reason: &str| QueryError::InvalidFilterValue {
        filter: "fiscal_year",
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let normalized: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect();

    if normalized.is_empty() {
        return Err(err("expected a year, got an empty value"));
    }

    normalized.parse::<i64>().map_err(|_| err("expected an integer year"))
}
