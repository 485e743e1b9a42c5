//! PostgreSQL-backed search, account and audit stores.

use std::error::Error;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use docportal_core::audit::{AuditRecord, AuditSink};
use docportal_core::auth::{credential_query, AuthOutcome, AuthTableSpec, CredentialStore, Credentials, Role};
use docportal_core::config::PortalConfig;
use docportal_core::result::Row;
use docportal_core::search::QueryExecutor;
use docportal_core::{BuiltQuery, Dialect, ParamValue, StoreError, TableRef};
use serde_json::Value;
use tokio_postgres::types::{FromSql, Kind, ToSql, Type};
use tokio_postgres::{Client, NoTls};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

pub struct PgStore {
    client: Client,
    auth: AuthTableSpec,
    log_login_table: TableRef,
    log_search_table: TableRef,
}

impl PgStore {
    pub async fn connect(db_url: &str, config: &PortalConfig) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(db_url, NoTls)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("db connection error: {e}");
            }
        });

        Ok(Self {
            client,
            auth: config.auth.clone(),
            log_login_table: config.log_login_table.clone(),
            log_search_table: config.log_search_table.clone(),
        })
    }

    async fn query(&self, query: &BuiltQuery) -> Result<Vec<tokio_postgres::Row>, StoreError> {
        check_dialect(query)?;
        let bound = bind(query);
        self.client
            .query(&query.sql, &as_refs(&bound))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn execute_statement(&self, query: &BuiltQuery) -> Result<u64, StoreError> {
        check_dialect(query)?;
        let bound = bind(query);
        self.client
            .execute(&query.sql, &as_refs(&bound))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}

fn check_dialect(query: &BuiltQuery) -> Result<(), StoreError> {
    if query.dialect != Dialect::Postgres {
        return Err(StoreError::Query(format!(
            "cannot run {:?} SQL against PostgreSQL",
            query.dialect
        )));
    }
    Ok(())
}

// Owned bindings; kept Send so they can live across an await.
fn bind(query: &BuiltQuery) -> Vec<Box<dyn ToSql + Sync + Send>> {
    query
        .params
        .iter()
        .map(|p| -> Box<dyn ToSql + Sync + Send> {
            match &p.value {
                ParamValue::String(s) => Box::new(s.clone()),
                ParamValue::Int64(i) => Box::new(*i),
                ParamValue::StringArray(v) => Box::new(v.clone()),
                ParamValue::Int64Array(v) => Box::new(v.clone()),
            }
        })
        .collect()
}

fn as_refs(bound: &[Box<dyn ToSql + Sync + Send>]) -> Vec<&(dyn ToSql + Sync)> {
    bound.iter().map(|b| &**b as &(dyn ToSql + Sync)).collect()
}

fn get<'a, T: FromSql<'a>>(
    row: &'a tokio_postgres::Row,
    idx: usize,
) -> Result<Option<T>, StoreError> {
    row.try_get::<_, Option<T>>(idx).map_err(|e| StoreError::Decode {
        column: row.columns()[idx].name().to_string(),
        reason: e.to_string(),
    })
}

/// One column value decoded into JSON, whatever its SQL type.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell(pub Value);

impl<'a> FromSql<'a> for Cell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match *ty {
            Type::BOOL => Value::from(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::from(i16::from_sql(ty, raw)?),
            Type::INT4 => Value::from(i32::from_sql(ty, raw)?),
            Type::INT8 => Value::from(i64::from_sql(ty, raw)?),
            Type::FLOAT4 => Value::from(f32::from_sql(ty, raw)?),
            Type::FLOAT8 => Value::from(f64::from_sql(ty, raw)?),
            Type::NUMERIC => numeric_value(raw)?,
            Type::DATE => Value::from(NaiveDate::from_sql(ty, raw)?.to_string()),
            Type::TIME => Value::from(NaiveTime::from_sql(ty, raw)?.to_string()),
            Type::TIMESTAMP => Value::from(
                NaiveDateTime::from_sql(ty, raw)?
                    .format("%Y-%m-%dT%H:%M:%S%.f")
                    .to_string(),
            ),
            Type::TIMESTAMPTZ => Value::from(DateTime::<Utc>::from_sql(ty, raw)?.to_rfc3339()),
            Type::JSON | Type::JSONB => Value::from_sql(ty, raw)?,
            Type::UUID => Value::from(Uuid::from_sql(ty, raw)?.to_string()),
            _ => match ty.kind() {
                Kind::Array(_) => Value::Array(
                    Vec::<Cell>::from_sql(ty, raw)?
                        .into_iter()
                        .map(|c| c.0)
                        .collect(),
                ),
                Kind::Enum(_) => Value::from(std::str::from_utf8(raw)?),
                _ if <String as FromSql<'_>>::accepts(ty) => Value::from(String::from_sql(ty, raw)?),
                _ => return Err(format!("unsupported column type {ty}").into()),
            },
        };
        Ok(Cell(value))
    }

    fn from_sql_null(_: &Type) -> Result<Self, BoxError> {
        Ok(Cell(Value::Null))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// Decimal text of a binary NUMERIC: base-10000 digit groups with a
/// weight (position of the first group) and a display scale.
fn numeric_text(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() < 8 || raw.len() % 2 != 0 {
        return Err("invalid numeric length".into());
    }
    let words: Vec<u16> = raw
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    let (ndigits, weight, sign, dscale) = (
        usize::from(words[0]),
        words[1] as i16,
        words[2],
        usize::from(words[3]),
    );
    let digits = &words[4..];
    if digits.len() != ndigits {
        return Err("numeric digit count mismatch".into());
    }

    let negative = match sign {
        0x0000 => false,
        0x4000 => true,
        0xC000 => return Ok("NaN".into()),
        0xD000 => return Ok("Infinity".into()),
        0xF000 => return Ok("-Infinity".into()),
        other => return Err(format!("invalid numeric sign {other:#x}").into()),
    };

    let group = |idx: i32| -> u16 {
        usize::try_from(idx)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&group(0).to_string());
        for idx in 1..=i32::from(weight) {
            out.push_str(&format!("{:04}", group(idx)));
        }
    }

    if dscale > 0 {
        let mut frac = String::new();
        for k in 1..=dscale.div_ceil(4) {
            let idx = i32::from(weight) + k as i32;
            frac.push_str(&format!("{:04}", group(idx)));
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

fn numeric_value(raw: &[u8]) -> Result<Value, BoxError> {
    let text = numeric_text(raw)?;
    Ok(text
        .parse::<serde_json::Number>()
        .map(Value::Number)
        .unwrap_or(Value::String(text)))
}

fn decode_row(row: &tokio_postgres::Row) -> Result<Row, StoreError> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let cell: Cell = row.try_get(idx).map_err(|e| StoreError::Decode {
                column: column.name().to_string(),
                reason: e.to_string(),
            })?;
            Ok((column.name().to_string(), cell.0))
        })
        .collect()
}

#[async_trait]
impl QueryExecutor for PgStore {
    async fn execute(&self, query: &BuiltQuery) -> Result<Vec<Row>, StoreError> {
        self.query(query).await?.iter().map(decode_row).collect()
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn check(&self, credentials: &Credentials) -> Result<AuthOutcome, StoreError> {
        let query = credential_query(&self.auth, credentials, Dialect::Postgres)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let rows = self.query(&query).await?;
        let Some(row) = rows.first() else {
            return Ok(AuthOutcome::denied());
        };

        let role = match self.auth.role_column {
            Some(_) => get::<String>(row, 1)?.map(|r| Role::parse(&r)).unwrap_or(Role::User),
            None => Role::User,
        };
        Ok(AuthOutcome {
            authenticated: true,
            role: Some(role),
        })
    }
}

#[async_trait]
impl AuditSink for PgStore {
    async fn write(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let table = match record {
            AuditRecord::Login(_) => &self.log_login_table,
            AuditRecord::Search(_) => &self.log_search_table,
        };
        let query = record
            .insert_query(table, Dialect::Postgres)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        self.execute_statement(&query).await?;
        Ok(())
    }
}
