//! Schema migrations for Crucible.
//!
//! Three pieces cooperate:
//!
//! - [`Generator`] writes timestamped migration skeletons whose file
//!   names sort in execution order,
//! - [`MigrationHistory`] keeps the `migrations` ledger of applied names,
//! - [`Migrator`] diffs a registry of [`Migration`]s against the ledger
//!   and applies or rolls back the difference.
//!
//! Migrations are plain values: a name plus forward and reverse statement
//! lists, usually compiled from `crucible_core` blueprints.
//!
//! ```no_run
//! use crucible_core::Blueprint;
//! use crucible_migrate::{Migration, Migrator};
//! use crucible_mysql::MySqlDriver;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let driver = MySqlDriver::connect("mysql://localhost/app").await?;
//!
//! let mut users = Blueprint::create("users");
//! users.id();
//! users.string("email", 255).unique();
//!
//! let mut migrator = Migrator::new(&driver);
//! migrator.register(
//!     Migration::new("2026_08_30_0001_create_users_table")
//!         .up(users.to_sql())
//!         .down("DROP TABLE `users`"),
//! );
//! migrator.migrate().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod history;
pub mod migrator;

pub use error::{MigrateError, Result};
pub use generator::{classify, normalize_name, Generator, MigrationKind};
pub use history::MigrationHistory;
pub use migrator::{Migration, MigrationStatus, Migrator};
