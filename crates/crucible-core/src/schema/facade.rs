//! Entry point for schema operations against a live connection.

use tracing::debug;

use crate::driver::Driver;
use crate::error::Result;

use super::blueprint::Blueprint;

/// Compiles blueprints and runs the resulting DDL on a driver.
///
/// Borrows the driver instead of owning it so one connection can serve
/// schema and query work side by side.
pub struct Schema<'d, D: Driver> {
    driver: &'d D,
}

impl<'d, D: Driver> Schema<'d, D> {
    /// Creates a schema facade over the given driver.
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self { driver }
    }

    /// Creates a table. The closure populates a fresh create-mode
    /// blueprint, which is compiled and executed as one statement.
    pub async fn create<F>(&self, table: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint) -> Result<()>,
    {
        let mut blueprint = Blueprint::create(table);
        build(&mut blueprint)?;
        self.run(&blueprint.to_sql()).await
    }

    /// Alters a table. A closure that records nothing is a no-op: an
    /// empty ALTER TABLE is never sent.
    pub async fn table<F>(&self, table: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint) -> Result<()>,
    {
        let mut blueprint = Blueprint::alter(table);
        build(&mut blueprint)?;
        if !blueprint.has_commands() {
            debug!(table, "no schema changes recorded, skipping");
            return Ok(());
        }
        self.run(&blueprint.to_sql()).await
    }

    /// Renames a table.
    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.run(&format!("RENAME TABLE `{from}` TO `{to}`")).await
    }

    /// Drops a table. Errors if the table does not exist.
    pub async fn drop(&self, table: &str) -> Result<()> {
        self.run(&format!("DROP TABLE `{table}`")).await
    }

    /// Drops a table if it exists.
    pub async fn drop_if_exists(&self, table: &str) -> Result<()> {
        self.run(&format!("DROP TABLE IF EXISTS `{table}`")).await
    }

    async fn run(&self, sql: &str) -> Result<()> {
        debug!(%sql, "executing schema statement");
        self.driver.execute(sql, &[]).await?;
        Ok(())
    }
}
