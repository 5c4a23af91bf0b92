//! The database driver capability.
//!
//! The core never opens connections itself. Everything that touches the
//! database receives an already-connected [`Driver`] by reference, and each
//! builder/blueprint instance is owned by exactly one logical call chain.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::value::SqlValue;

/// A single result row, keyed by column name.
pub type Row = BTreeMap<String, SqlValue>;

/// Capability for executing SQL with positional bindings.
///
/// Bindings line up with `?` placeholders read left-to-right in the SQL
/// text; implementations must bind them in slice order.
///
/// Transactions are explicit and non-nested: callers must not invoke
/// [`begin_transaction`](Driver::begin_transaction) twice without an
/// intervening commit or rollback. DDL statements auto-commit on the
/// reference engine and are outside transaction protection.
#[allow(async_fn_in_trait)]
pub trait Driver {
    /// Executes a query and returns the result rows.
    async fn statement(&self, sql: &str, bindings: &[SqlValue]) -> Result<Vec<Row>>;

    /// Executes a statement and returns the number of affected rows.
    async fn execute(&self, sql: &str, bindings: &[SqlValue]) -> Result<u64>;

    /// Returns the id generated by the most recent insert.
    async fn last_insert_id(&self) -> Result<u64>;

    /// Begins a transaction.
    async fn begin_transaction(&self) -> Result<()>;

    /// Commits the current transaction.
    async fn commit(&self) -> Result<()>;

    /// Rolls back the current transaction.
    async fn rollback(&self) -> Result<()>;

    /// Closes the connection.
    async fn close(&self);
}
