//! Migration file generation.
//!
//! `make` writes a timestamped Rust skeleton into the migrations
//! directory. The file name carries the ordering: date stamp, then a
//! per-day sequence number, then the normalized migration name, so a
//! plain lexical sort of the directory is the execution order.
//!
//! The skeleton shape follows the migration name. `create_users_table`
//! yields a create blueprint with a matching `DROP TABLE` reverse;
//! `add_votes_to_posts_table` yields a pair of alter blueprints; anything
//! else gets an empty shell.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::{MigrateError, Result};

/// What kind of skeleton a migration name asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationKind {
    /// `create_<table>_table`
    Create(String),
    /// `..._to_<table>_table`, `..._from_<table>_table` or
    /// `..._in_<table>_table`
    Alter(String),
    /// Anything else.
    Shell,
}

/// Writes migration skeletons into a directory.
pub struct Generator {
    dir: PathBuf,
}

impl Generator {
    /// Creates a generator targeting the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Generates a new migration file and returns its path.
    ///
    /// The directory must already exist. A file for the same normalized
    /// name is never overwritten.
    pub fn make(&self, raw_name: &str) -> Result<PathBuf> {
        if !self.dir.is_dir() {
            return Err(MigrateError::MigrationsDirNotFound(self.dir.clone()));
        }
        let name = normalize_name(raw_name);
        if name.is_empty() {
            return Err(MigrateError::EmptyMigrationName(String::from(raw_name)));
        }

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if file_stem(&path)
                .and_then(strip_stamp)
                .is_some_and(|existing| existing == name)
            {
                return Err(MigrateError::MigrationExists(path));
            }
        }

        let stamp = Local::now().format("%Y_%m_%d").to_string();
        let sequence = self.next_sequence(&stamp)?;
        let file_name = format!("{stamp}_{sequence:04}_{name}.rs");
        let full_name = format!("{stamp}_{sequence:04}_{name}");
        let path = self.dir.join(file_name);

        let body = match classify(&name) {
            MigrationKind::Create(table) => create_template(&full_name, &table),
            MigrationKind::Alter(table) => alter_template(&full_name, &table),
            MigrationKind::Shell => shell_template(&full_name),
        };
        fs::write(&path, body)?;
        info!(path = %path.display(), "generated migration");
        Ok(path)
    }

    fn next_sequence(&self, stamp: &str) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if file_stem(&path).is_some_and(|stem| stem.starts_with(stamp)) {
                count += 1;
            }
        }
        Ok(count + 1)
    }
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// Strips the `<YYYY_MM_DD>_<seq>_` prefix off a generated file stem,
/// leaving just the migration name.
fn strip_stamp(stem: &str) -> Option<&str> {
    let mut rest = stem;
    for _ in 0..4 {
        let (segment, tail) = rest.split_once('_')?;
        if !segment.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        rest = tail;
    }
    Some(rest)
}

/// Lowercases and maps every non-alphanumeric run to a single `_`,
/// trimming leading and trailing separators.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Infers the skeleton kind from a normalized name.
#[must_use]
pub fn classify(name: &str) -> MigrationKind {
    if let Some(table) = name
        .strip_prefix("create_")
        .and_then(|rest| rest.strip_suffix("_table"))
    {
        if !table.is_empty() {
            return MigrationKind::Create(String::from(table));
        }
    }
    if let Some(inner) = name.strip_suffix("_table") {
        for marker in ["_to_", "_from_", "_in_"] {
            if let Some(position) = inner.rfind(marker) {
                let table = &inner[position + marker.len()..];
                if !table.is_empty() {
                    return MigrationKind::Alter(String::from(table));
                }
            }
        }
    }
    MigrationKind::Shell
}

fn create_template(name: &str, table: &str) -> String {
    format!(
        r#"use crucible_core::Blueprint;
use crucible_migrate::Migration;

pub fn migration() -> Migration {{
    let mut up = Blueprint::create("{table}");
    up.id();
    // TODO: add columns for `{table}`

    Migration::new("{name}")
        .up(up.to_sql())
        .down("DROP TABLE `{table}`")
}}
"#
    )
}

fn alter_template(name: &str, table: &str) -> String {
    format!(
        r#"use crucible_core::Blueprint;
use crucible_migrate::Migration;

pub fn migration() -> Migration {{
    let mut up = Blueprint::alter("{table}");
    // TODO: describe the forward change to `{table}`

    let mut down = Blueprint::alter("{table}");
    // TODO: describe the reverse change to `{table}`

    Migration::new("{name}")
        .up(up.to_sql())
        .down(down.to_sql())
}}
"#
    )
}

fn shell_template(name: &str) -> String {
    format!(
        r#"use crucible_migrate::Migration;

pub fn migration() -> Migration {{
    // TODO: fill in forward and reverse statements
    Migration::new("{name}")
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Create Users Table"), "create_users_table");
        assert_eq!(normalize_name("add-votes--to_posts!!table"), "add_votes_to_posts_table");
        assert_eq!(normalize_name("___"), "");
    }

    #[test]
    fn test_classify_create() {
        assert_eq!(
            classify("create_users_table"),
            MigrationKind::Create(String::from("users"))
        );
        assert_eq!(
            classify("create_order_items_table"),
            MigrationKind::Create(String::from("order_items"))
        );
    }

    #[test]
    fn test_classify_alter() {
        assert_eq!(
            classify("add_votes_to_posts_table"),
            MigrationKind::Alter(String::from("posts"))
        );
        assert_eq!(
            classify("remove_legacy_from_users_table"),
            MigrationKind::Alter(String::from("users"))
        );
        assert_eq!(
            classify("rename_mail_in_users_table"),
            MigrationKind::Alter(String::from("users"))
        );
    }

    #[test]
    fn test_classify_shell() {
        assert_eq!(classify("seed_reference_data"), MigrationKind::Shell);
        assert_eq!(classify("create_table"), MigrationKind::Shell);
    }

    #[test]
    fn test_make_writes_sequenced_files() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(dir.path());

        let first = generator.make("create_users_table").unwrap();
        let second = generator.make("create_posts_table").unwrap();

        let first_name = first.file_name().unwrap().to_str().unwrap();
        let second_name = second.file_name().unwrap().to_str().unwrap();
        assert!(first_name.ends_with("_0001_create_users_table.rs"));
        assert!(second_name.ends_with("_0002_create_posts_table.rs"));
        assert!(first_name < second_name);

        let body = std::fs::read_to_string(&first).unwrap();
        assert!(body.contains("Blueprint::create(\"users\")"));
        assert!(body.contains("DROP TABLE `users`"));
    }

    #[test]
    fn test_make_refuses_duplicate_name() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(dir.path());

        generator.make("create_users_table").unwrap();
        let err = generator.make("Create Users Table").unwrap_err();
        assert!(matches!(err, MigrateError::MigrationExists(_)));
    }

    #[test]
    fn test_suffix_aligned_name_is_not_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(dir.path());

        generator.make("create_users_table").unwrap();
        // Shares a `_`-aligned suffix with the existing file but is a
        // distinct migration name.
        let path = generator.make("users_table").unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with("_0002_users_table.rs"));
    }

    #[test]
    fn test_make_requires_existing_directory() {
        let err = Generator::new("/nonexistent/migrations")
            .make("create_users_table")
            .unwrap_err();
        assert!(matches!(err, MigrateError::MigrationsDirNotFound(_)));
    }

    #[test]
    fn test_make_rejects_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let err = Generator::new(dir.path()).make("!!!").unwrap_err();
        assert!(matches!(err, MigrateError::EmptyMigrationName(_)));
    }

    #[test]
    fn test_alter_template_has_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::new(dir.path());
        let path = generator.make("add_votes_to_posts_table").unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.contains("Blueprint::alter(\"posts\")"));
        assert_eq!(body.matches("Blueprint::alter").count(), 2);
    }
}
