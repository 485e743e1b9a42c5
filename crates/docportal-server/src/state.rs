use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use docportal_core::audit::AuditSink;
use docportal_core::auth::{AuthTableSpec, CredentialStore};
use docportal_core::config::PortalConfig;
use docportal_core::metadata::{metadata_query, FilterOptions};
use docportal_core::schema::registry::TableRegistry;
use docportal_core::search::QueryExecutor;
use docportal_core::validate::static_check::parse_ok;
use docportal_core::{
    build_search_query, CompileOptions, Dialect, Dimension, FilterSelection, QueryError, TableSpec,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::AppError;

pub struct AppState {
    pub registry: TableRegistry,
    pub options: CompileOptions,
    pub dialect: Dialect,
    pub auth: AuthTableSpec,
    pub executor: Arc<dyn QueryExecutor>,
    pub credentials: Arc<dyn CredentialStore>,
    pub audit: Arc<dyn AuditSink>,
    metadata_ttl: Duration,
    metadata_cache: RwLock<HashMap<String, (Instant, FilterOptions)>>,
}

impl AppState {
    pub fn new(
        config: &PortalConfig,
        executor: Arc<dyn QueryExecutor>,
        credentials: Arc<dyn CredentialStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            registry: config.registry()?,
            options: config.compile_options(),
            dialect: config.dialect,
            auth: config.auth.clone(),
            executor,
            credentials,
            audit,
            metadata_ttl: Duration::from_secs(config.metadata_ttl_secs),
            metadata_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn table(&self, name: &str) -> Result<&TableSpec, AppError> {
        self.registry
            .get(name)
            .ok_or_else(|| AppError::UnknownTable(name.to_string()))
    }

    /// Filter choices for one table, cached for the configured TTL.
    pub async fn filter_options(&self, name: &str) -> Result<FilterOptions, AppError> {
        let spec = self.table(name)?;

        if let Some((loaded, options)) = self.metadata_cache.read().await.get(name) {
            if loaded.elapsed() < self.metadata_ttl {
                return Ok(options.clone());
            }
        }

        let query = metadata_query(spec, self.dialect)?;
        let rows = self.executor.execute(&query).await?;
        let options = FilterOptions::from_rows(spec, &rows);
        debug!(table = name, rows = rows.len(), "filter options refreshed");

        self.metadata_cache
            .write()
            .await
            .insert(name.to_string(), (Instant::now(), options.clone()));
        Ok(options)
    }
}

/// A selection that sets every filter the table supports plus both
/// keyword groups.
fn full_selection(spec: &TableSpec) -> FilterSelection {
    let mut selection = FilterSelection {
        keyword_and: vec!["check query".to_string()],
        keyword_or: vec!["a b".to_string()],
        ..Default::default()
    };
    for dimension in Dimension::FILTERS.into_iter().filter(|d| spec.supports(*d)) {
        let (set, value) = match dimension {
            Dimension::Ministry => (&mut selection.ministries, "x"),
            Dimension::Agency => (&mut selection.agencies, "x"),
            Dimension::Council => (&mut selection.councils, "x"),
            Dimension::Category => (&mut selection.categories, "x"),
            Dimension::SubCategory => (&mut selection.sub_categories, "x"),
            Dimension::FiscalYear => (&mut selection.fiscal_years, "2021"),
            Dimension::Keyword => continue,
        };
        set.insert(value.to_string());
    }
    selection
}

/// Render the unfiltered, fully filtered and metadata queries of every
/// table and make sure the SQL parses before the server accepts traffic.
pub fn check_queries(config: &PortalConfig) -> anyhow::Result<()> {
    let options = config.compile_options();
    for spec in &config.tables {
        let empty = build_search_query(spec, &FilterSelection::default(), &options, config.dialect)?;
        parse_ok(&empty.sql, config.dialect)
            .with_context(|| format!("unfiltered query for table '{}'", spec.name))?;

        let full = build_search_query(spec, &full_selection(spec), &options, config.dialect)?;
        parse_ok(&full.sql, config.dialect)
            .with_context(|| format!("filtered query for table '{}'", spec.name))?;

        let metadata = metadata_query(spec, config.dialect)?;
        parse_ok(&metadata.sql, config.dialect)
            .with_context(|| format!("metadata query for table '{}'", spec.name))?;
    }
    Ok(())
}
