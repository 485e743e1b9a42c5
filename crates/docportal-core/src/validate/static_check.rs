use sqlparser::dialect::{BigQueryDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

use crate::sql::dialect::Dialect;

/// Basic static SQL parse check of rendered queries.
pub fn parse_ok(sql: &str, dialect: Dialect) -> anyhow::Result<()> {
    match dialect {
        Dialect::BigQuery => Parser::parse_sql(&BigQueryDialect {}, sql)?,
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql)?,
    };
    Ok(())
}
