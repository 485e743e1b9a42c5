use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::table_spec::Dimension;

/// What the user picked in the search form. Built fresh per search and
/// never mutated afterwards; an empty selection matches every row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    /// Every token must match.
    pub keyword_and: Vec<String>,
    /// At least one token must match.
    pub keyword_or: Vec<String>,
    pub ministries: BTreeSet<String>,
    pub agencies: BTreeSet<String>,
    pub councils: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub sub_categories: BTreeSet<String>,
    /// Raw year values as the form sent them; coerced to integers at compile time.
    #[serde(deserialize_with = "years_as_strings")]
    pub fiscal_years: BTreeSet<String>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.requested_dimensions().is_empty()
    }

    pub fn values(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        match dimension {
            Dimension::Ministry => Some(&self.ministries),
            Dimension::Agency => Some(&self.agencies),
            Dimension::Council => Some(&self.councils),
            Dimension::Category => Some(&self.categories),
            Dimension::SubCategory => Some(&self.sub_categories),
            Dimension::FiscalYear => Some(&self.fiscal_years),
            Dimension::Keyword => None,
        }
    }

    pub fn has_keywords(&self) -> bool {
        self.keyword_and
            .iter()
            .chain(&self.keyword_or)
            .any(|k| !k.trim().is_empty())
    }

    /// Dimensions this selection actually constrains.
    pub fn requested_dimensions(&self) -> Vec<Dimension> {
        let mut dims: Vec<Dimension> = Dimension::FILTERS
            .into_iter()
            .filter(|d| self.values(*d).is_some_and(|v| !v.is_empty()))
            .collect();
        if self.has_keywords() {
            dims.push(Dimension::Keyword);
        }
        dims
    }

    /// Keyword text for audit records: "AND terms | OR terms".
    pub fn keyword_summary(&self) -> String {
        let and = self.keyword_and.join(" ");
        let or = self.keyword_or.join(" ");
        match (and.trim().is_empty(), or.trim().is_empty()) {
            (false, false) => format!("{} | {}", and.trim(), or.trim()),
            (false, true) => and.trim().to_string(),
            (true, false) => or.trim().to_string(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearValue {
    Int(i64),
    Text(String),
}

// Forms send years either as numbers or as the strings shown in the picker.
fn years_as_strings<'de, D>(de: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<YearValue>::deserialize(de)?;
    Ok(raw
        .into_iter()
        .map(|v| match v {
            YearValue::Int(i) => i.to_string(),
            YearValue::Text(s) => s,
        })
        .collect())
}
