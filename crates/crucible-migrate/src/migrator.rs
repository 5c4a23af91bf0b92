//! Migration registry and runner.
//!
//! A [`Migration`] is a named pair of forward and reverse statement
//! lists, usually produced from blueprints at registration time. The
//! [`Migrator`] compares the registry against the ledger by name:
//! registered names missing from the ledger are pending, and rollback
//! walks the ledger tail backwards through the registry.

use std::fs;
use std::path::{Path, PathBuf};

use crucible_core::Driver;
use tracing::{debug, info};

use crate::error::{MigrateError, Result};
use crate::history::MigrationHistory;

/// A named, reversible migration.
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique name, normally `<date>_<seq>_<description>`.
    pub name: String,
    /// Forward statements, run in order.
    pub up: Vec<String>,
    /// Reverse statements, run in order.
    pub down: Vec<String>,
}

impl Migration {
    /// Creates an empty migration with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            up: Vec::new(),
            down: Vec::new(),
        }
    }

    /// Appends a forward statement.
    #[must_use]
    pub fn up(mut self, sql: impl Into<String>) -> Self {
        self.up.push(sql.into());
        self
    }

    /// Appends a reverse statement.
    #[must_use]
    pub fn down(mut self, sql: impl Into<String>) -> Self {
        self.down.push(sql.into());
        self
    }

    /// A migration with no reverse statements cannot be rolled back.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        !self.down.is_empty()
    }
}

/// Status of one known migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migration name.
    pub name: String,
    /// Whether the ledger records it as applied.
    pub applied: bool,
    /// Whether this process has it registered. An applied but
    /// unregistered name means the ledger and the binary have drifted.
    pub registered: bool,
}

/// Applies and rolls back registered migrations against one driver.
pub struct Migrator<'d, D: Driver> {
    driver: &'d D,
    history: MigrationHistory<'d, D>,
    migrations: Vec<Migration>,
    directory: Option<PathBuf>,
}

impl<'d, D: Driver> Migrator<'d, D> {
    /// Creates a migrator with an empty registry.
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self {
            driver,
            history: MigrationHistory::new(driver),
            migrations: Vec::new(),
            directory: None,
        }
    }

    /// Creates a migrator whose pending set and order come from the
    /// `.rs` files in a migrations directory, sorted lexically. Every
    /// pending file must have a registered migration of the same name.
    #[must_use]
    pub fn with_directory(driver: &'d D, directory: impl Into<PathBuf>) -> Self {
        let mut migrator = Self::new(driver);
        migrator.directory = Some(directory.into());
        migrator
    }

    /// Registers a migration. Registration order is execution order.
    pub fn register(&mut self, migration: Migration) -> &mut Self {
        self.migrations.push(migration);
        self
    }

    /// Returns the ledger manager.
    #[must_use]
    pub fn history(&self) -> &MigrationHistory<'d, D> {
        &self.history
    }

    /// Returns the migrations not yet recorded in the ledger. Ensures
    /// the ledger table exists.
    ///
    /// With a configured directory, file stems sorted lexically define
    /// both the candidate set and the order, and each pending file must
    /// be registered. Otherwise registration order is used.
    pub async fn pending(&self) -> Result<Vec<&Migration>> {
        self.history.ensure_table().await?;
        let applied = self.history.applied_names().await?;

        match &self.directory {
            None => Ok(self
                .migrations
                .iter()
                .filter(|m| !applied.contains(&m.name))
                .collect()),
            Some(directory) => {
                let mut pending = Vec::new();
                for name in list_migration_stems(directory)? {
                    if applied.contains(&name) {
                        continue;
                    }
                    let migration = self
                        .migrations
                        .iter()
                        .find(|m| m.name == name)
                        .ok_or(MigrateError::UnregisteredMigration(name))?;
                    pending.push(migration);
                }
                Ok(pending)
            }
        }
    }

    /// Applies every pending migration and returns the applied names.
    ///
    /// Each migration runs inside its own transaction together with its
    /// ledger insert; a failed statement rolls that migration back and
    /// stops the run, leaving previously applied migrations recorded.
    pub async fn migrate(&self) -> Result<Vec<String>> {
        let pending: Vec<Migration> = self.pending().await?.into_iter().cloned().collect();
        if pending.is_empty() {
            info!("nothing to migrate");
            return Ok(Vec::new());
        }

        let mut applied = Vec::with_capacity(pending.len());
        for migration in &pending {
            info!(name = %migration.name, "applying migration");
            self.driver.begin_transaction().await?;
            match self.apply_one(migration).await {
                Ok(()) => {
                    self.driver.commit().await?;
                    applied.push(migration.name.clone());
                }
                Err(err) => {
                    self.driver.rollback().await?;
                    return Err(err);
                }
            }
        }
        Ok(applied)
    }

    async fn apply_one(&self, migration: &Migration) -> Result<()> {
        for sql in &migration.up {
            debug!(%sql, "migration statement");
            self.driver.execute(sql, &[]).await?;
        }
        self.history.record_applied(&migration.name).await
    }

    /// Rolls back the most recently applied `steps` migrations and
    /// returns their names, newest first.
    ///
    /// Every migration in the window must be registered and reversible;
    /// the run aborts before touching anything otherwise.
    pub async fn rollback(&self, steps: usize) -> Result<Vec<String>> {
        self.history.ensure_table().await?;
        let applied = self.history.applied_names().await?;
        let window: Vec<String> = applied.iter().rev().take(steps).cloned().collect();
        if window.is_empty() {
            info!("nothing to roll back");
            return Ok(Vec::new());
        }

        let mut targets = Vec::with_capacity(window.len());
        for name in &window {
            let migration = self
                .migrations
                .iter()
                .find(|m| &m.name == name)
                .ok_or_else(|| MigrateError::UnregisteredMigration(name.clone()))?;
            if !migration.is_reversible() {
                return Err(MigrateError::NotReversible(name.clone()));
            }
            targets.push(migration);
        }

        let mut rolled_back = Vec::with_capacity(targets.len());
        for migration in targets {
            info!(name = %migration.name, "rolling back migration");
            self.driver.begin_transaction().await?;
            match self.rollback_one(migration).await {
                Ok(()) => {
                    self.driver.commit().await?;
                    rolled_back.push(migration.name.clone());
                }
                Err(err) => {
                    self.driver.rollback().await?;
                    return Err(err);
                }
            }
        }
        Ok(rolled_back)
    }

    async fn rollback_one(&self, migration: &Migration) -> Result<()> {
        for sql in &migration.down {
            debug!(%sql, "rollback statement");
            self.driver.execute(sql, &[]).await?;
        }
        self.history.record_unapplied(&migration.name).await
    }

    /// Reports the state of every known migration: the registry in
    /// order, then any applied names the registry does not know about.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>> {
        self.history.ensure_table().await?;
        let applied = self.history.applied_names().await?;

        let mut statuses: Vec<MigrationStatus> = self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                name: m.name.clone(),
                applied: applied.contains(&m.name),
                registered: true,
            })
            .collect();

        for name in &applied {
            if !self.migrations.iter().any(|m| &m.name == name) {
                statuses.push(MigrationStatus {
                    name: name.clone(),
                    applied: true,
                    registered: false,
                });
            }
        }
        Ok(statuses)
    }

    /// Returns the forward SQL of every pending migration without
    /// executing anything.
    pub async fn plan(&self) -> Result<Vec<(String, Vec<String>)>> {
        Ok(self
            .pending()
            .await?
            .into_iter()
            .map(|m| (m.name.clone(), m.up.clone()))
            .collect())
    }
}

/// Lists `.rs` file stems in a migrations directory, lexically sorted.
fn list_migration_stems(directory: &Path) -> Result<Vec<String>> {
    if !directory.is_dir() {
        return Err(MigrateError::MigrationsDirNotFound(directory.to_path_buf()));
    }
    let mut stems = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "rs") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.push(String::from(stem));
            }
        }
    }
    stems.sort();
    Ok(stems)
}
