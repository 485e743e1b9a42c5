use serde::Serialize;

/// A typed value bound to a placeholder. Values never appear in query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    String(String),
    Int64(i64),
    StringArray(Vec<String>),
    Int64Array(Vec<i64>),
}

impl ParamValue {
    /// Warehouse type name, as used by BigQuery query parameters.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "STRING",
            ParamValue::Int64(_) => "INT64",
            ParamValue::StringArray(_) => "ARRAY<STRING>",
            ParamValue::Int64Array(_) => "ARRAY<INT64>",
        }
    }

    pub(crate) fn pg_type(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "text",
            ParamValue::Int64(_) => "bigint",
            ParamValue::StringArray(_) => "text[]",
            ParamValue::Int64Array(_) => "bigint[]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParameter {
    pub name: String,
    #[serde(flatten)]
    pub value: ParamValue,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ParamValue::String(value.into()))
    }

    pub fn int64(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, ParamValue::Int64(value))
    }
}
