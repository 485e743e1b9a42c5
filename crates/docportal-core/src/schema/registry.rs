use indexmap::IndexMap;

use crate::error::QueryError;
use crate::schema::table_spec::TableSpec;

/// Validated set of searchable tables, in tab order.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: IndexMap<String, TableSpec>,
}

impl TableRegistry {
    pub fn new(specs: impl IntoIterator<Item = TableSpec>) -> Result<Self, QueryError> {
        let mut tables = IndexMap::new();
        for spec in specs {
            spec.validate()?;
            if tables.contains_key(&spec.name) {
                return Err(QueryError::table_spec(&spec.name, "duplicate table name"));
            }
            tables.insert(spec.name.clone(), spec);
        }
        Ok(Self { tables })
    }

    pub fn get(&self, name: &str) -> Option<&TableSpec> {
        self.tables.get(name)
    }

    pub fn specs(&self) -> impl Iterator<Item = &TableSpec> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
