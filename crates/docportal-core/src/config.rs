use anyhow::Context;
use serde::Deserialize;

use crate::auth::AuthTableSpec;
use crate::dsl::compile::CompileOptions;
use crate::error::QueryError;
use crate::schema::registry::TableRegistry;
use crate::schema::table_spec::{TableRef, TableSpec};
use crate::sql::dialect::Dialect;

fn default_metadata_ttl_secs() -> u64 {
    3600
}

/// Static portal configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub dialect: Dialect,
    pub tables: Vec<TableSpec>,
    pub auth: AuthTableSpec,
    pub log_login_table: TableRef,
    pub log_search_table: TableRef,
    #[serde(default)]
    pub row_limit: Option<u64>,
    #[serde(default = "default_metadata_ttl_secs")]
    pub metadata_ttl_secs: u64,
}

impl PortalConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read portal config: {}", path))?;
        Self::from_json(&raw).with_context(|| format!("load portal config: {}", path))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let config: PortalConfig = serde_json::from_str(raw).context("parse portal config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if self.tables.is_empty() {
            return Err(QueryError::InvalidTableSpec {
                table: "<config>".into(),
                reason: "no searchable tables configured".into(),
            });
        }
        self.registry()?;
        self.auth.validate()?;
        self.log_login_table.validate("log_login")?;
        self.log_search_table.validate("log_search")?;
        Ok(())
    }

    pub fn registry(&self) -> Result<TableRegistry, QueryError> {
        TableRegistry::new(self.tables.iter().cloned())
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            row_limit: self.row_limit,
        }
    }
}
