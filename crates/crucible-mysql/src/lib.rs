//! MySQL driver for Crucible, backed by `sqlx`.
//!
//! [`MySqlDriver`] implements [`crucible_core::Driver`] over a pool capped
//! at a single connection. The cap matters: transactions are driven with
//! raw `START TRANSACTION` / `COMMIT` / `ROLLBACK` statements, which only
//! work when every statement in between lands on the same connection.
//!
//! Rows come back as dynamically typed [`Row`] maps. MySQL result sets
//! carry enough type information for the common cases; columns decode by
//! trial as integer, float, boolean, text and finally bytes, with NULL
//! short-circuiting everything.

use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row as _};
use tracing::trace;

use crucible_core::{Driver, Error, Result, Row, SqlValue};

/// A [`Driver`] over a single-connection MySQL pool.
pub struct MySqlDriver {
    pool: MySqlPool,
}

impl MySqlDriver {
    /// Connects to the given `mysql://` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(Error::driver)?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    ///
    /// The pool must be capped at one connection for
    /// [`begin_transaction`](Driver::begin_transaction) to be sound.
    #[must_use]
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn run_raw(&self, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(Error::driver)?;
        Ok(())
    }
}

impl Driver for MySqlDriver {
    async fn statement(&self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>> {
        trace!(%sql, bindings = bindings.len(), "mysql statement");
        let mut query = sqlx::query(sql);
        for value in bindings {
            query = bind_value(query, value);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(Error::driver)?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn execute(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64> {
        trace!(%sql, bindings = bindings.len(), "mysql execute");
        let mut query = sqlx::query(sql);
        for value in bindings {
            query = bind_value(query, value);
        }
        let result = query.execute(&self.pool).await.map_err(Error::driver)?;
        Ok(result.rows_affected())
    }

    async fn last_insert_id(&self) -> Result<u64> {
        let row = sqlx::query("SELECT LAST_INSERT_ID()")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::driver)?;
        row.try_get::<u64, _>(0).map_err(Error::driver)
    }

    async fn begin_transaction(&self) -> Result<()> {
        self.run_raw("START TRANSACTION").await
    }

    async fn commit(&self) -> Result<()> {
        self.run_raw("COMMIT").await
    }

    async fn rollback(&self) -> Result<()> {
        self.run_raw("ROLLBACK").await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(n) => query.bind(*n),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}

fn decode_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (String::from(column.name()), decode_column(row, column.ordinal())))
        .collect()
}

fn decode_column(row: &MySqlRow, index: usize) -> SqlValue {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Int);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Float);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Bool);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Text);
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Blob);
    }
    SqlValue::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    // Requires a live server; run with
    //   DATABASE_URL=mysql://... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn round_trip_against_live_server() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let driver = MySqlDriver::connect(&url).await.unwrap();

        driver
            .execute("DROP TABLE IF EXISTS crucible_driver_smoke", &[])
            .await
            .unwrap();
        driver
            .execute(
                "CREATE TABLE crucible_driver_smoke (\
                 id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
                 label VARCHAR(64) NOT NULL)",
                &[],
            )
            .await
            .unwrap();

        driver
            .execute(
                "INSERT INTO crucible_driver_smoke (label) VALUES (?)",
                &[SqlValue::from("hello")],
            )
            .await
            .unwrap();
        assert_eq!(driver.last_insert_id().await.unwrap(), 1);

        let rows = driver
            .statement(
                "SELECT id, label FROM crucible_driver_smoke WHERE label = ?",
                &[SqlValue::from("hello")],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&SqlValue::Int(1)));
        assert_eq!(
            rows[0].get("label"),
            Some(&SqlValue::Text(String::from("hello")))
        );

        driver
            .execute("DROP TABLE crucible_driver_smoke", &[])
            .await
            .unwrap();
        driver.close().await;
    }
}
