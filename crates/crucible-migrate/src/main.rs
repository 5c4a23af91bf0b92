//! crucible-migrate CLI
//!
//! Command-line front end for the migration system. `make` works against
//! the migrations directory alone; the database commands operate on the
//! ledger through a MySQL connection. Applications with registered
//! migrations embed [`Migrator`] in their own binary; this tool covers
//! generation, inspection and ledger upkeep.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crucible_core::driver::Driver;
use crucible_migrate::{Generator, Migrator};
use crucible_mysql::MySqlDriver;

/// Schema migrations for Crucible.
#[derive(Parser)]
#[command(name = "crucible-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string.
    #[arg(short, long, env = "DATABASE_URL", default_value = "mysql://localhost/crucible")]
    database: String,

    /// Migrations directory.
    #[arg(short, long, default_value = "migrations")]
    migrations_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new migration file.
    Make {
        /// Migration name, e.g. `create_users_table`.
        name: String,
    },

    /// Apply pending migrations.
    Migrate {
        /// Show SQL without executing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Roll back the most recently applied migrations.
    Rollback {
        /// How many migrations to roll back.
        #[arg(short, long, default_value_t = 1)]
        steps: usize,
    },

    /// Show which migrations are applied.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Make { name } => {
            let path = Generator::new(&cli.migrations_dir).make(&name)?;
            println!("Created {}", path.display());
        }

        Commands::Migrate { dry_run } => {
            let driver = MySqlDriver::connect(&cli.database).await?;
            let migrator = build_migrator(&driver, &cli.migrations_dir);

            if dry_run {
                let plan = migrator.plan().await?;
                if plan.is_empty() {
                    info!("Nothing to migrate.");
                }
                for (name, statements) in plan {
                    println!("-- {name}");
                    for sql in statements {
                        println!("{sql};");
                    }
                }
            } else {
                let applied = migrator.migrate().await?;
                if applied.is_empty() {
                    info!("Nothing to migrate.");
                } else {
                    for name in applied {
                        info!("Applied {name}");
                    }
                }
            }
            driver.close().await;
        }

        Commands::Rollback { steps } => {
            let driver = MySqlDriver::connect(&cli.database).await?;
            let migrator = build_migrator(&driver, &cli.migrations_dir);

            let rolled_back = migrator.rollback(steps).await?;
            if rolled_back.is_empty() {
                info!("Nothing to roll back.");
            } else {
                for name in rolled_back {
                    info!("Rolled back {name}");
                }
            }
            driver.close().await;
        }

        Commands::Status => {
            let driver = MySqlDriver::connect(&cli.database).await?;
            let migrator = build_migrator(&driver, &cli.migrations_dir);

            let statuses = migrator.status().await?;
            if statuses.is_empty() {
                info!("No migrations known.");
            }
            for status in statuses {
                let mark = if status.applied { "X" } else { " " };
                println!(" [{mark}] {}", status.name);
                if !status.registered {
                    warn!("{} is applied but not registered", status.name);
                }
            }
            driver.close().await;
        }
    }

    Ok(())
}

/// Builds the migrator for the database commands.
///
/// The standalone binary carries an empty registry: migration files are
/// Rust modules compiled into the application, so apply/rollback with
/// real registrations happens through a binary that links them in. The
/// directory still drives pending detection, so drift between files and
/// registrations surfaces as an error instead of a silent skip.
fn build_migrator<'d>(
    driver: &'d MySqlDriver,
    migrations_dir: &std::path::Path,
) -> Migrator<'d, MySqlDriver> {
    Migrator::with_directory(driver, migrations_dir)
}
