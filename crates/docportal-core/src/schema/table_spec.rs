use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Physical location of a warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub dataset_name: String,
    pub table_name: String,
}

impl TableRef {
    pub fn new(dataset_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            project_id: None,
            dataset_name: dataset_name.into(),
            table_name: table_name.into(),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Checks that every part is a plain identifier, `context` names the owner in errors.
    pub fn validate(&self, context: &str) -> Result<(), QueryError> {
        if self.dataset_name.trim().is_empty() {
            return Err(QueryError::table_spec(context, "dataset_name is empty"));
        }
        if self.table_name.trim().is_empty() {
            return Err(QueryError::table_spec(context, "table_name is empty"));
        }
        if let Some(project) = &self.project_id {
            if !is_project_id(project) {
                return Err(QueryError::table_spec(
                    context,
                    format!("project id '{project}' is not a valid identifier"),
                ));
            }
        }
        for part in [&self.dataset_name, &self.table_name] {
            if !is_identifier(part) {
                return Err(QueryError::table_spec(
                    context,
                    format!("'{part}' is not a valid identifier"),
                ));
            }
        }
        Ok(())
    }
}

/// Filter dimensions a selection can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Ministry,
    Agency,
    Council,
    Category,
    SubCategory,
    FiscalYear,
    Keyword,
}

impl Dimension {
    pub const FILTERS: [Dimension; 6] = [
        Dimension::Ministry,
        Dimension::Agency,
        Dimension::Council,
        Dimension::Category,
        Dimension::SubCategory,
        Dimension::FiscalYear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Ministry => "ministry",
            Dimension::Agency => "agency",
            Dimension::Council => "council",
            Dimension::Category => "category",
            Dimension::SubCategory => "sub_category",
            Dimension::FiscalYear => "fiscal_year",
            Dimension::Keyword => "keyword",
        }
    }

    /// Fiscal years are integer columns; every other dimension is text.
    pub fn is_text(self) -> bool {
        self != Dimension::FiscalYear
    }
}

/// Which physical column backs each dimension. `None` means the table
/// does not carry that dimension at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionColumns {
    pub ministry: Option<String>,
    pub agency: Option<String>,
    pub council: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub fiscal_year: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub file_id: Option<String>,
    pub page: Option<String>,
}

impl DimensionColumns {
    pub fn column(&self, dimension: Dimension) -> Option<&str> {
        let col = match dimension {
            Dimension::Ministry => &self.ministry,
            Dimension::Agency => &self.agency,
            Dimension::Council => &self.council,
            Dimension::Category => &self.category,
            Dimension::SubCategory => &self.sub_category,
            Dimension::FiscalYear => &self.fiscal_year,
            Dimension::Keyword => return self.text_fields().first().copied(),
        };
        col.as_deref()
    }

    /// Columns searched by keyword clauses, title first.
    pub fn text_fields(&self) -> Vec<&str> {
        [&self.title, &self.content]
            .into_iter()
            .filter_map(|c| c.as_deref())
            .collect()
    }

    fn all(&self) -> impl Iterator<Item = &str> {
        [
            &self.ministry,
            &self.agency,
            &self.council,
            &self.category,
            &self.sub_category,
            &self.fiscal_year,
            &self.title,
            &self.content,
            &self.file_id,
            &self.page,
        ]
        .into_iter()
        .filter_map(|c| c.as_deref())
    }
}

/// One logical searchable table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Stable key, e.g. "budget".
    pub name: String,
    /// Tab caption shown to users.
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub dataset_name: String,
    pub table_name: String,
    /// Internal column -> display label. Insertion order is display order.
    pub display_columns: IndexMap<String, String>,
    #[serde(default)]
    pub columns: DimensionColumns,
}

impl TableSpec {
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            project_id: self.project_id.clone(),
            dataset_name: self.dataset_name.clone(),
            table_name: self.table_name.clone(),
        }
    }

    pub fn supports(&self, dimension: Dimension) -> bool {
        self.columns.column(dimension).is_some()
    }

    pub fn display_label(&self, column: &str) -> Option<&str> {
        self.display_columns.get(column).map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        let name = if self.name.is_empty() {
            self.table_name.as_str()
        } else {
            self.name.as_str()
        };

        self.table_ref().validate(name)?;

        if self.display_columns.is_empty() {
            return Err(QueryError::table_spec(name, "display_columns is empty"));
        }

        let mut labels = std::collections::HashSet::new();
        for (column, label) in &self.display_columns {
            if !is_identifier(column) {
                return Err(QueryError::table_spec(
                    name,
                    format!("column '{column}' is not a valid identifier"),
                ));
            }
            if label.trim().is_empty() {
                return Err(QueryError::table_spec(
                    name,
                    format!("column '{column}' has an empty display label"),
                ));
            }
            if !labels.insert(label.as_str()) {
                return Err(QueryError::table_spec(
                    name,
                    format!("display label '{label}' is used more than once"),
                ));
            }
        }

        for column in self.columns.all() {
            if !is_identifier(column) {
                return Err(QueryError::table_spec(
                    name,
                    format!("dimension column '{column}' is not a valid identifier"),
                ));
            }
        }

        Ok(())
    }
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// GCP project ids allow dashes.
fn is_project_id(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
