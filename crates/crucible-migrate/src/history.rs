//! Migration ledger.
//!
//! The `migrations` table records the name of every applied migration.
//! Pending work is computed by name: a registered migration whose name is
//! absent from the ledger has not run yet. Names are recorded in apply
//! order, so the ledger also fixes rollback order.

use crucible_core::{Driver, SqlValue};

use crate::error::{MigrateError, Result};

/// SQL to create the ledger table.
pub const CREATE_LEDGER_SQL: &str = "CREATE TABLE IF NOT EXISTS `migrations` (\
    `id` INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
    `name` VARCHAR(256) NOT NULL\
)";

/// Manages the applied-migrations ledger.
pub struct MigrationHistory<'d, D: Driver> {
    driver: &'d D,
}

impl<'d, D: Driver> MigrationHistory<'d, D> {
    /// Creates a ledger manager over the given driver.
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self { driver }
    }

    /// Ensures the ledger table exists.
    pub async fn ensure_table(&self) -> Result<()> {
        self.driver.execute(CREATE_LEDGER_SQL, &[]).await?;
        Ok(())
    }

    /// Records a migration as applied.
    pub async fn record_applied(&self, name: &str) -> Result<()> {
        self.driver
            .execute(
                "INSERT INTO `migrations` (`name`) VALUES (?)",
                &[SqlValue::from(name)],
            )
            .await?;
        Ok(())
    }

    /// Removes a migration record after rollback.
    pub async fn record_unapplied(&self, name: &str) -> Result<()> {
        let affected = self
            .driver
            .execute(
                "DELETE FROM `migrations` WHERE `name` = ?",
                &[SqlValue::from(name)],
            )
            .await?;
        if affected == 0 {
            return Err(MigrateError::MigrationNotFound(String::from(name)));
        }
        Ok(())
    }

    /// Checks whether a migration has been applied.
    pub async fn is_applied(&self, name: &str) -> Result<bool> {
        let rows = self
            .driver
            .statement(
                "SELECT `id` FROM `migrations` WHERE `name` = ?",
                &[SqlValue::from(name)],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Returns every applied migration name, oldest first.
    pub async fn applied_names(&self) -> Result<Vec<String>> {
        let rows = self
            .driver
            .statement("SELECT `name` FROM `migrations` ORDER BY `id`", &[])
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| match row.remove("name") {
                Some(SqlValue::Text(name)) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// Returns how many migrations have been applied.
    pub async fn count_applied(&self) -> Result<usize> {
        Ok(self.applied_names().await?.len())
    }
}
