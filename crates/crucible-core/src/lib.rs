//! Core schema and query building blocks for Crucible.
//!
//! This crate is engine-agnostic: everything compiles down to SQL text
//! plus a positional binding list, and a [`Driver`] implementation (see
//! `crucible-mysql`) carries the statements to a real connection.
//!
//! Two entry points cover the surface:
//!
//! - [`Schema`] compiles [`Blueprint`] table definitions into DDL,
//! - [`QueryBuilder`] accumulates a query fluently and executes it at a
//!   terminal call, resetting itself afterwards.
//!
//! ```no_run
//! use crucible_core::{QueryBuilder, Schema};
//! # use crucible_core::{Driver, Result, Row, SqlValue};
//! # struct D;
//! # impl Driver for D {
//! #     async fn statement(&self, _: &str, _: &[SqlValue]) -> Result<Vec<Row>> { Ok(vec![]) }
//! #     async fn execute(&self, _: &str, _: &[SqlValue]) -> Result<u64> { Ok(0) }
//! #     async fn last_insert_id(&self) -> Result<u64> { Ok(0) }
//! #     async fn begin_transaction(&self) -> Result<()> { Ok(()) }
//! #     async fn commit(&self) -> Result<()> { Ok(()) }
//! #     async fn rollback(&self) -> Result<()> { Ok(()) }
//! #     async fn close(&self) {}
//! # }
//! # async fn demo(driver: D) -> Result<()> {
//! let schema = Schema::new(&driver);
//! schema
//!     .create("users", |table| {
//!         table.id();
//!         table.string("email", 255).unique();
//!         Ok(())
//!     })
//!     .await?;
//!
//! let mut query = QueryBuilder::new(&driver);
//! let rows = query
//!     .table("users")
//!     .where_("email", "LIKE", "%@example.com")
//!     .get()
//!     .await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod query;
pub mod schema;
pub mod value;

pub use driver::{Driver, Row};
pub use error::{Error, Result};
pub use query::{ConditionSet, JoinKind, OrderDirection, Paginated, QueryBuilder};
pub use schema::{
    Blueprint, BlueprintMode, ColumnDescriptor, ColumnType, Command, DefaultValue,
    ForeignKeyBuilder, ForeignKeyCommand, ReferentialAction, Schema,
};
pub use value::{SqlValue, ToSqlValue};
