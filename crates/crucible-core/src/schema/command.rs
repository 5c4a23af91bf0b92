//! Table alteration commands.
//!
//! Each schema change a blueprint can express beyond plain column addition
//! is one [`Command`] variant, matched exhaustively by the DDL compiler so
//! a new variant is a compile-time-checked change.

use std::str::FromStr;

use crate::error::Error;

use super::column::{ColumnDescriptor, ColumnType};

/// Referential action applied to dependent rows on delete/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    /// Cascade the operation.
    Cascade,
    /// Set the referencing column to NULL.
    SetNull,
    /// No action.
    NoAction,
    /// Restrict the operation.
    Restrict,
    /// Set the referencing column to its default.
    SetDefault,
}

impl ReferentialAction {
    /// Returns the SQL keyword sequence for this action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl FromStr for ReferentialAction {
    type Err = Error;

    /// Parses an action case-insensitively, treating underscores and any
    /// amount of whitespace as a single separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_uppercase()
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        match normalized.as_str() {
            "CASCADE" => Ok(Self::Cascade),
            "SET NULL" => Ok(Self::SetNull),
            "NO ACTION" => Ok(Self::NoAction),
            "RESTRICT" => Ok(Self::Restrict),
            "SET DEFAULT" => Ok(Self::SetDefault),
            _ => Err(Error::UnknownReferentialAction(s.to_string())),
        }
    }
}

/// A fully-assembled foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyCommand {
    /// Local column(s).
    pub columns: Vec<String>,
    /// Referenced table.
    pub on_table: String,
    /// Referenced column(s).
    pub references: Vec<String>,
    /// ON DELETE action.
    pub on_delete: Option<ReferentialAction>,
    /// ON UPDATE action.
    pub on_update: Option<ReferentialAction>,
}

/// An alteration command recorded on a blueprint.
///
/// Commands are ordered; compilation preserves declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a foreign key constraint.
    Foreign(ForeignKeyCommand),
    /// Drop a column.
    DropColumn {
        /// Column to drop.
        column: String,
    },
    /// Rename a column, optionally changing its type.
    RenameColumn {
        /// Current name.
        from: String,
        /// New name.
        to: String,
        /// New type, if the rename also retypes the column.
        new_type: Option<ColumnType>,
    },
    /// Redefine an existing column in place.
    ChangeColumn {
        /// The new definition, keyed by its name.
        column: ColumnDescriptor,
    },
    /// Add a plain index.
    AddIndex {
        /// Index name.
        name: String,
        /// Indexed columns.
        columns: Vec<String>,
    },
    /// Add a (possibly composite) primary key.
    AddPrimary {
        /// Key columns.
        columns: Vec<String>,
    },
    /// Add a unique index.
    AddUnique {
        /// Index name.
        name: String,
        /// Indexed columns.
        columns: Vec<String>,
    },
    /// Drop an index.
    DropIndex {
        /// Index name.
        name: String,
    },
    /// Drop the primary key.
    DropPrimary,
    /// Drop a unique index.
    DropUnique {
        /// Index name.
        name: String,
    },
    /// Rename an index.
    RenameIndex {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
}
