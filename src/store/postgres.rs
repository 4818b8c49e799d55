//! PostgreSQL record source.
//!
//! One table per guard. Lookups build a conjunctive filter over validated
//! column names and compare values through `to_jsonb`, so callers can match
//! text, numeric, and boolean columns with plain JSON values. The matched
//! row comes back as a JSON record via `row_to_json`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

use super::RecordSource;
use crate::errors::{AuthError, AuthResult};
use crate::record::{FieldMap, UserRecord};

/// Record source backed by a PostgreSQL table
#[derive(Debug, Clone)]
pub struct PgRecordSource {
    pool: PgPool,
    table: String,
}

impl PgRecordSource {
    /// Create a source over `table`, validating the table name
    pub fn new(pool: PgPool, table: impl Into<String>) -> AuthResult<Self> {
        let table = table.into();
        if !is_safe_ident(&table) {
            return Err(AuthError::Configuration(format!(
                "`{table}` is not a valid table name"
            )));
        }
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn find_by(&self, filters: &FieldMap) -> AuthResult<Option<UserRecord>> {
        if filters.is_empty() {
            return Err(AuthError::InvalidInput(
                "Lookup filters must not be empty".to_string(),
            ));
        }

        let mut conditions = Vec::with_capacity(filters.len());
        for (position, name) in filters.keys().enumerate() {
            if !is_safe_ident(name) {
                return Err(AuthError::InvalidInput(format!(
                    "`{name}` is not a valid column name"
                )));
            }
            conditions.push(format!("to_jsonb(t.\"{name}\") = ${}", position + 1));
        }

        let sql = format!(
            "SELECT row_to_json(t) FROM \"{}\" t WHERE {} LIMIT 1",
            self.table,
            conditions.join(" AND "),
        );

        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for value in filters.values() {
            query = query.bind(Json(value));
        }

        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.and_then(UserRecord::from_value))
    }
}

/// Identifiers we are willing to splice into SQL: ASCII letters, digits,
/// and underscores, not starting with a digit.
fn is_safe_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
