use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsl::plan::{Clause, PlanOrder, PlanProjection, SearchPlan, SortDirection};
use crate::dsl::selection::FilterSelection;
use crate::dsl::validate::{parse_fiscal_years, validate_selection};
use crate::error::QueryError;
use crate::schema::table_spec::{Dimension, TableSpec};
use crate::sql::params::{ParamValue, QueryParameter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Appends `LIMIT n` when set.
    pub row_limit: Option<u64>,
}

// Dimension, parameter name, in WHERE order.
const MEMBERSHIP_FILTERS: [(Dimension, &str); 6] = [
    (Dimension::Ministry, "ministries"),
    (Dimension::Agency, "agencies"),
    (Dimension::Council, "councils"),
    (Dimension::Category, "categories"),
    (Dimension::SubCategory, "sub_categories"),
    (Dimension::FiscalYear, "years"),
];

const SORT_DIMENSIONS: [Dimension; 4] = [
    Dimension::Ministry,
    Dimension::Agency,
    Dimension::Category,
    Dimension::FiscalYear,
];

/// Lowercases, splits on whitespace (including U+3000) and drops repeats.
pub fn tokenize(values: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in values.iter().flat_map(|v| v.split_whitespace()) {
        let token = token.to_lowercase();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// `%token%` with LIKE metacharacters escaped so the token matches literally.
pub fn like_pattern(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 2);
    out.push('%');
    for c in token.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn push_param(params: &mut Vec<QueryParameter>, name: String, value: ParamValue) -> usize {
    params.push(QueryParameter::new(name, value));
    params.len() - 1
}

fn keyword_params(params: &mut Vec<QueryParameter>, prefix: &str, tokens: &[String]) -> Vec<usize> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| {
            push_param(
                params,
                format!("{prefix}_{i}"),
                ParamValue::String(like_pattern(t)),
            )
        })
        .collect()
}

/// Compile a selection against one table into a parameterized plan.
/// Either the whole plan is produced or nothing is.
pub fn compile_search(
    spec: &TableSpec,
    selection: &FilterSelection,
    options: &CompileOptions,
) -> Result<SearchPlan, QueryError> {
    spec.validate()?;
    validate_selection(spec, selection)?;

    let projections = spec
        .display_columns
        .iter()
        .map(|(column, label)| PlanProjection {
            column: column.clone(),
            label: label.clone(),
        })
        .collect();

    let mut params = Vec::new();
    let mut clauses = Vec::new();

    for (dimension, name) in MEMBERSHIP_FILTERS {
        let Some(values) = selection.values(dimension).filter(|v| !v.is_empty()) else {
            continue;
        };
        // validate_selection guarantees the column exists
        let Some(column) = spec.columns.column(dimension) else {
            continue;
        };

        let value = if dimension == Dimension::FiscalYear {
            ParamValue::Int64Array(parse_fiscal_years(values)?.into_iter().collect())
        } else {
            ParamValue::StringArray(values.iter().cloned().collect())
        };

        let param = push_param(&mut params, name.to_string(), value);
        clauses.push(Clause::Membership {
            dimension,
            column: column.to_string(),
            param,
        });
    }

    let fields: Vec<String> = spec
        .columns
        .text_fields()
        .into_iter()
        .map(str::to_string)
        .collect();

    let and_tokens = tokenize(&selection.keyword_and);
    if !and_tokens.is_empty() {
        clauses.push(Clause::KeywordAll {
            fields: fields.clone(),
            params: keyword_params(&mut params, "kw_and", &and_tokens),
        });
    }

    let or_tokens = tokenize(&selection.keyword_or);
    if !or_tokens.is_empty() {
        clauses.push(Clause::KeywordAny {
            fields,
            params: keyword_params(&mut params, "kw_or", &or_tokens),
        });
    }

    let order_by = SORT_DIMENSIONS
        .iter()
        .filter_map(|d| spec.columns.column(*d).map(|c| (c, d.is_text())))
        .chain(spec.columns.file_id.as_deref().map(|c| (c, true)))
        .chain(spec.columns.page.as_deref().map(|c| (c, false)))
        .map(|(column, text)| PlanOrder {
            column: column.to_string(),
            direction: SortDirection::Asc,
            text,
        })
        .collect();

    debug!(
        table = %spec.name,
        clauses = clauses.len(),
        params = params.len(),
        "compiled search plan"
    );

    Ok(SearchPlan {
        table: spec.name.clone(),
        source: spec.table_ref(),
        projections,
        clauses,
        order_by,
        distinct: false,
        limit: options.row_limit,
        params,
    })
}
