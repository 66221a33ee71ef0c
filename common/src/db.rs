//! Store abstraction over the service database.

use crate::err::StoreError;
use crate::schema::{escape_db_identifier, Table};
use crate::types::{FixtureRow, SqlValue};
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions};
use sqlx::Row as _;
use std::env;
use std::time::Duration;

pub type DbType = sqlx::MySql;
pub type DbPool = MySqlPool;

const DEFAULT_DB_MAX_CONNECTIONS: &str = "10";

/// The operations the bootstrap needs from a backing store. Any relational
/// store able to apply DDL, answer a count probe and delete/drop by table
/// name qualifies.
#[async_trait]
pub trait Store: Send + Sync {
    async fn apply_schema(&self, table: &Table) -> Result<(), StoreError>;
    /// Cheap existence probe. Any `Ok` means the table is queryable.
    async fn count(&self, table: &str) -> Result<u64, StoreError>;
    async fn delete_all(&self, table: &str) -> Result<u64, StoreError>;
    async fn drop_table(&self, table: &str) -> Result<(), StoreError>;
    async fn row_exists(
        &self,
        table: &str,
        column: &str,
        key: &SqlValue,
    ) -> Result<bool, StoreError>;
    async fn insert(&self, table: &str, row: &FixtureRow) -> Result<(), StoreError>;
}

fn db_url() -> Result<String> {
    env::var("DB_URL").context("DB_URL is required in the .env file.")
}

/// Create the database if missing, or drop and recreate it when `clean`.
pub async fn reset_database(clean: bool) -> Result<()> {
    let url = db_url()?;
    if clean {
        if DbType::database_exists(&url).await? {
            DbType::drop_database(&url).await?;
        }
        DbType::create_database(&url).await?;
    } else if !DbType::database_exists(&url).await? {
        DbType::create_database(&url).await?;
    }
    Ok(())
}

pub struct SqlStore {
    pool: DbPool,
}

impl SqlStore {
    pub fn new(pool: DbPool) -> SqlStore {
        SqlStore { pool }
    }

    /// Opens the shared pool from `DB_URL`, once at process start.
    pub async fn connect() -> Result<SqlStore> {
        let url = db_url()?;
        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| DEFAULT_DB_MAX_CONNECTIONS.to_owned())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS parse error")?;
        let pool = MySqlPoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .max_connections(max_connections)
            .connect(&url)
            .await
            .with_context(|| "failed to connect to the database")?;
        Ok(SqlStore { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

type DbQuery<'q> = sqlx::query::Query<'q, DbType, MySqlArguments>;

fn bind_value<'q>(query: DbQuery<'q>, value: &'q SqlValue) -> DbQuery<'q> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
    }
}

#[async_trait]
impl Store for SqlStore {
    async fn apply_schema(&self, table: &Table) -> Result<(), StoreError> {
        let ddl = table.create_sql();
        log::debug!("exec ddl:\n{}", ddl);
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn count(&self, table: &str) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", escape_db_identifier(table));
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as u64)
    }

    async fn delete_all(&self, table: &str) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {}", escape_db_identifier(table));
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn drop_table(&self, table: &str) -> Result<(), StoreError> {
        let sql = format!("DROP TABLE {}", escape_db_identifier(table));
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn row_exists(
        &self,
        table: &str,
        column: &str,
        key: &SqlValue,
    ) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ? LIMIT 1",
            escape_db_identifier(table),
            escape_db_identifier(column)
        );
        let row = bind_value(sqlx::query(&sql), key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, table: &str, row: &FixtureRow) -> Result<(), StoreError> {
        let columns = row
            .columns()
            .map(escape_db_identifier)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; row.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            escape_db_identifier(table),
            columns,
            placeholders
        );
        let mut query = sqlx::query(&sql);
        for (_, value) in row.iter() {
            query = bind_value(query, value);
        }
        query.execute(&self.pool).await?;
        Ok(())
    }
}
