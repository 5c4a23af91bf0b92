//! Error types for the migration system.

use std::path::PathBuf;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Error from the core query/schema layer or the driver.
    #[error(transparent)]
    Core(#[from] crucible_core::Error),

    /// IO error reading or writing migration files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No migrations directory found.
    #[error("Migrations directory not found: {}", .0.display())]
    MigrationsDirNotFound(PathBuf),

    /// Migration file already exists.
    #[error("Migration file already exists: {}", .0.display())]
    MigrationExists(PathBuf),

    /// Migration name produced an empty identifier after normalization.
    #[error("Migration name '{0}' contains no usable characters")]
    EmptyMigrationName(String),

    /// The ledger records a migration this process does not know about.
    #[error("Migration '{0}' is applied but not registered")]
    UnregisteredMigration(String),

    /// Rollback asked for a migration that was never applied.
    #[error("Migration '{0}' is not recorded as applied")]
    MigrationNotFound(String),

    /// Rollback reached a migration with no reverse statements.
    #[error("Migration '{0}' is not reversible")]
    NotReversible(String),
}

/// Result alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
