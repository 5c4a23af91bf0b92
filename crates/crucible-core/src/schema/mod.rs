//! Schema definition and migration DDL.
//!
//! The flow mirrors how applications describe tables: [`Schema`] opens a
//! create or alter call, the caller's closure fills in a [`Blueprint`]
//! with columns and commands, and the blueprint compiles to a single DDL
//! statement for the driver.

pub mod blueprint;
pub mod column;
pub mod command;
pub mod facade;
pub mod foreign_key;

pub use blueprint::{constrain_identifier, Blueprint, BlueprintMode, MAX_IDENTIFIER_LEN};
pub use column::{ColumnDescriptor, ColumnType, DefaultValue};
pub use command::{Command, ForeignKeyCommand, ReferentialAction};
pub use facade::Schema;
pub use foreign_key::ForeignKeyBuilder;
