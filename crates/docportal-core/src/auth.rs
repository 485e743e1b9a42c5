use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::{now_tokyo, record_best_effort, AuditRecord, AuditSink, LoginLogRecord, LoginResult};
use crate::error::{AuthError, QueryError, StoreError};
use crate::schema::table_spec::{is_identifier, TableRef};
use crate::sql::dialect::Dialect;
use crate::sql::params::QueryParameter;
use crate::sql::render::BuiltQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Unknown role strings fall back to a plain user.
    pub fn parse(raw: &str) -> Role {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Role::Admin,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub authenticated: bool,
    pub role: Option<Role>,
}

impl AuthOutcome {
    pub fn denied() -> Self {
        Self {
            authenticated: false,
            role: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
}

/// Location and column names of the account table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTableSpec {
    #[serde(flatten)]
    pub table: TableRef,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_password_column")]
    pub password_column: String,
    #[serde(default)]
    pub role_column: Option<String>,
}

fn default_id_column() -> String {
    "id".into()
}

fn default_password_column() -> String {
    "pw".into()
}

impl AuthTableSpec {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            id_column: default_id_column(),
            password_column: default_password_column(),
            role_column: None,
        }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        self.table.validate("auth")?;
        let columns = [Some(&self.id_column), Some(&self.password_column), self.role_column.as_ref()];
        for column in columns.into_iter().flatten() {
            if !is_identifier(column) {
                return Err(QueryError::InvalidTableSpec {
                    table: "auth".into(),
                    reason: format!("column '{column}' is not a valid identifier"),
                });
            }
        }
        Ok(())
    }
}

/// `SELECT id[, role] FROM auth WHERE id = ? AND pw = ? LIMIT 1`
pub fn credential_query(
    auth: &AuthTableSpec,
    credentials: &Credentials,
    dialect: Dialect,
) -> Result<BuiltQuery, QueryError> {
    auth.validate()?;

    let params = vec![
        QueryParameter::string("user_id", credentials.user_id.clone()),
        QueryParameter::string("password", credentials.password.clone()),
    ];

    let mut select = vec![auth.id_column.as_str()];
    if let Some(role) = &auth.role_column {
        select.push(role);
    }

    let sql = format!(
        "SELECT {}\nFROM {}\nWHERE {} = {} AND {} = {}\nLIMIT 1",
        select.join(", "),
        dialect.table(&auth.table),
        auth.id_column,
        dialect.placeholder(0, &params[0]),
        auth.password_column,
        dialect.placeholder(1, &params[1]),
    );

    Ok(BuiltQuery::new(sql, params, dialect))
}

/// Checks a user id and password against the account store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn check(&self, credentials: &Credentials) -> Result<AuthOutcome, StoreError>;
}

/// Fixed accounts: (user id, password, role).
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    accounts: Vec<(String, String, Role)>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, user_id: &str, password: &str, role: Role) -> Self {
        self.accounts
            .push((user_id.to_string(), password.to_string(), role));
        self
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn check(&self, credentials: &Credentials) -> Result<AuthOutcome, StoreError> {
        let hit = self
            .accounts
            .iter()
            .find(|(id, pw, _)| *id == credentials.user_id && *pw == credentials.password);
        Ok(match hit {
            Some((_, _, role)) => AuthOutcome {
                authenticated: true,
                role: Some(*role),
            },
            None => AuthOutcome::denied(),
        })
    }
}

/// Check credentials and record the attempt. Empty fields are rejected
/// before the store is consulted and are not logged.
pub async fn authenticate(
    store: &dyn CredentialStore,
    audit: &dyn AuditSink,
    credentials: &Credentials,
    session_id: &str,
) -> Result<AuthOutcome, AuthError> {
    if credentials.user_id.trim().is_empty() || credentials.password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    let outcome = store.check(credentials).await?;
    let result = if outcome.authenticated {
        LoginResult::Success
    } else {
        LoginResult::Failed
    };
    info!(user = %credentials.user_id, result = result.as_str(), "login attempt");

    record_best_effort(
        audit,
        AuditRecord::Login(LoginLogRecord {
            timestamp: now_tokyo(),
            id: credentials.user_id.clone(),
            result,
            session_id: session_id.to_string(),
        }),
    )
    .await;

    Ok(outcome)
}
