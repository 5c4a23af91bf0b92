//! Fluent SQL query builder.
//!
//! One [`QueryBuilder`] accumulates intent through chained calls and
//! compiles it at a terminal operation. Every user value travels as a `?`
//! binding; the compiled SQL never embeds data. After any terminal call
//! the builder resets to a blank state so the same instance can be reused
//! for the next query.

use tracing::debug;

use crate::driver::{Driver, Row};
use crate::error::{Error, Result};
use crate::value::{SqlValue, ToSqlValue};

use super::predicate::ConditionSet;

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    first: String,
    operator: String,
    second: String,
}

/// One page of results with the totals needed to render pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated {
    /// Rows on this page.
    pub rows: Vec<Row>,
    /// Total matching rows across all pages.
    pub total: u64,
    /// Requested page size.
    pub per_page: u64,
    /// 1-based page number of this page.
    pub current_page: u64,
    /// Last page number; 0 when there are no rows.
    pub last_page: u64,
}

/// Fluent builder over a borrowed driver.
///
/// Chainable methods take and return `&mut self`; terminal methods are
/// async, run the compiled statement, and reset the builder whether or
/// not the statement succeeded.
#[derive(Debug)]
pub struct QueryBuilder<'d, D: Driver> {
    driver: &'d D,
    table: Option<String>,
    columns: Vec<String>,
    distinct: bool,
    joins: Vec<Join>,
    wheres: ConditionSet,
    groups: Vec<String>,
    havings: ConditionSet,
    orders: Vec<(String, OrderDirection)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'d, D: Driver> QueryBuilder<'d, D> {
    /// Creates a blank builder over the given driver.
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self {
            driver,
            table: None,
            columns: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            wheres: ConditionSet::new(),
            groups: Vec::new(),
            havings: ConditionSet::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Clears all accumulated state except the driver handle.
    pub fn reset(&mut self) {
        self.table = None;
        self.columns.clear();
        self.distinct = false;
        self.joins.clear();
        self.wheres = ConditionSet::new();
        self.groups.clear();
        self.havings = ConditionSet::new();
        self.orders.clear();
        self.limit = None;
        self.offset = None;
    }

    // ------------------------------------------------------------------
    // Chainable state
    // ------------------------------------------------------------------

    /// Targets a table. Required before any terminal call.
    pub fn table(&mut self, table: &str) -> &mut Self {
        self.table = Some(String::from(table));
        self
    }

    /// Sets the select list. Entries are emitted verbatim, so expressions
    /// and aliases are allowed. Defaults to `*`.
    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.columns = columns.iter().map(|c| String::from(*c)).collect();
        self
    }

    /// Adds `DISTINCT` to the select.
    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Adds an inner join.
    pub fn join(&mut self, table: &str, first: &str, operator: &str, second: &str) -> &mut Self {
        self.push_join(JoinKind::Inner, table, first, operator, second)
    }

    /// Adds a left outer join.
    pub fn left_join(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> &mut Self {
        self.push_join(JoinKind::Left, table, first, operator, second)
    }

    /// Adds a right outer join.
    pub fn right_join(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> &mut Self {
        self.push_join(JoinKind::Right, table, first, operator, second)
    }

    fn push_join(
        &mut self,
        kind: JoinKind,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> &mut Self {
        self.joins.push(Join {
            kind,
            table: String::from(table),
            first: String::from(first),
            operator: String::from(operator),
            second: String::from(second),
        });
        self
    }

    /// Adds `column op ?` to the WHERE clause, AND-joined.
    pub fn where_(&mut self, column: &str, operator: &str, value: impl ToSqlValue) -> &mut Self {
        self.wheres.where_(column, operator, value);
        self
    }

    /// Adds `column op ?` to the WHERE clause, OR-joined.
    pub fn or_where(&mut self, column: &str, operator: &str, value: impl ToSqlValue) -> &mut Self {
        self.wheres.or_where(column, operator, value);
        self
    }

    /// Adds `column IN (?, ...)`.
    pub fn where_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.wheres.where_in(column, values);
        self
    }

    /// Adds `column NOT IN (?, ...)`.
    pub fn where_not_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.wheres.where_not_in(column, values);
        self
    }

    /// Adds `column IS NULL`.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.wheres.where_null(column);
        self
    }

    /// Adds `column IS NOT NULL`.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.wheres.where_not_null(column);
        self
    }

    /// Adds `column BETWEEN ? AND ?`.
    pub fn where_between(
        &mut self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> &mut Self {
        self.wheres.where_between(column, low, high);
        self
    }

    /// Adds `column NOT BETWEEN ? AND ?`.
    pub fn where_not_between(
        &mut self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> &mut Self {
        self.wheres.where_not_between(column, low, high);
        self
    }

    /// Adds a raw WHERE fragment with bindings.
    pub fn where_raw(&mut self, sql: &str, bindings: Vec<SqlValue>) -> &mut Self {
        self.wheres.where_raw(sql, bindings);
        self
    }

    /// Adds a parenthesized WHERE group, AND-joined.
    pub fn where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut ConditionSet),
    {
        self.wheres.where_group(build);
        self
    }

    /// Adds a parenthesized WHERE group, OR-joined.
    pub fn or_where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut ConditionSet),
    {
        self.wheres.or_where_group(build);
        self
    }

    /// Sets the GROUP BY column list. An empty list is rejected here
    /// rather than producing invalid SQL at compile time.
    pub fn group_by(&mut self, columns: &[&str]) -> Result<&mut Self> {
        if columns.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "group_by requires at least one column",
            )));
        }
        self.groups = columns.iter().map(|c| String::from(*c)).collect();
        Ok(self)
    }

    /// Adds `column op ?` to the HAVING clause, AND-joined.
    pub fn having(&mut self, column: &str, operator: &str, value: impl ToSqlValue) -> &mut Self {
        self.havings.where_(column, operator, value);
        self
    }

    /// Adds `column op ?` to the HAVING clause, OR-joined.
    pub fn or_having(&mut self, column: &str, operator: &str, value: impl ToSqlValue) -> &mut Self {
        self.havings.or_where(column, operator, value);
        self
    }

    /// Adds a raw HAVING fragment with bindings.
    pub fn having_raw(&mut self, sql: &str, bindings: Vec<SqlValue>) -> &mut Self {
        self.havings.where_raw(sql, bindings);
        self
    }

    /// Appends an ORDER BY term.
    pub fn order_by(&mut self, column: &str, direction: OrderDirection) -> &mut Self {
        self.orders.push((String::from(column), direction));
        self
    }

    /// Appends a descending ORDER BY term.
    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Sets LIMIT.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Sets OFFSET.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    // ------------------------------------------------------------------
    // Compilation
    // ------------------------------------------------------------------

    /// Compiles the current state into a SELECT without executing it or
    /// resetting the builder. Placeholders and bindings line up one to
    /// one, left to right.
    pub fn to_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let table = self.require_table()?;
        let mut bindings = Vec::new();

        let columns = if self.columns.is_empty() {
            String::from("*")
        } else {
            self.columns.join(", ")
        };
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        let mut sql = format!("SELECT {distinct}{columns} FROM `{table}`");
        self.join_clauses(&mut sql);

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            self.wheres.compile(&mut sql, &mut bindings);
        }

        if !self.groups.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.groups.join(", "));
        }

        if !self.havings.is_empty() {
            sql.push_str(" HAVING ");
            self.havings.compile(&mut sql, &mut bindings);
        }

        if !self.orders.is_empty() {
            let terms: Vec<String> = self
                .orders
                .iter()
                .map(|(column, direction)| format!("{column} {}", direction.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        Ok((sql, bindings))
    }

    fn require_table(&self) -> Result<&str> {
        self.table.as_deref().ok_or(Error::MissingTable)
    }

    fn join_clauses(&self, sql: &mut String) {
        for join in &self.joins {
            sql.push_str(&format!(
                " {} `{}` ON {} {} {}",
                join.kind.as_sql(),
                join.table,
                join.first,
                join.operator,
                join.second
            ));
        }
    }

    fn where_clause(&self, sql: &mut String, bindings: &mut Vec<SqlValue>) {
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            self.wheres.compile(sql, bindings);
        }
    }

    // ------------------------------------------------------------------
    // Terminal operations
    // ------------------------------------------------------------------

    /// Runs the compiled SELECT and returns all rows.
    pub async fn get(&mut self) -> Result<Vec<Row>> {
        let compiled = self.to_sql();
        self.reset();
        let (sql, bindings) = compiled?;
        debug!(%sql, bindings = bindings.len(), "running select");
        self.driver.statement(&sql, &bindings).await
    }

    /// Runs the SELECT with `LIMIT 1` and returns the first row, if any.
    pub async fn first(&mut self) -> Result<Option<Row>> {
        self.limit = Some(1);
        let mut rows = self.get().await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Inserts one row and returns the auto-increment id the engine
    /// assigned, or 0 when the table has none.
    pub async fn insert(&mut self, values: &[(&str, SqlValue)]) -> Result<u64> {
        let compiled = self.compile_insert(values);
        self.reset();
        let (sql, bindings) = compiled?;
        debug!(%sql, bindings = bindings.len(), "running insert");
        self.driver.execute(&sql, &bindings).await?;
        self.driver.last_insert_id().await
    }

    /// Inserts many rows in one statement and returns the number of rows
    /// written. An empty `rows` slice is a no-op returning 0.
    pub async fn insert_many(
        &mut self,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64> {
        let compiled = self.compile_insert_many(columns, rows);
        self.reset();
        let Some((sql, bindings)) = compiled? else {
            return Ok(0);
        };
        debug!(%sql, bindings = bindings.len(), "running multi-row insert");
        self.driver.execute(&sql, &bindings).await
    }

    /// Updates matching rows and returns the affected-row count. SET
    /// bindings precede WHERE bindings, matching placeholder order.
    pub async fn update(&mut self, values: &[(&str, SqlValue)]) -> Result<u64> {
        let compiled = self.compile_update(values);
        self.reset();
        let (sql, bindings) = compiled?;
        debug!(%sql, bindings = bindings.len(), "running update");
        self.driver.execute(&sql, &bindings).await
    }

    /// Deletes matching rows and returns the affected-row count. With no
    /// WHERE clause this deletes every row in the table.
    pub async fn delete(&mut self) -> Result<u64> {
        let compiled = self.compile_delete();
        self.reset();
        let (sql, bindings) = compiled?;
        debug!(%sql, bindings = bindings.len(), "running delete");
        self.driver.execute(&sql, &bindings).await
    }

    /// Returns `COUNT(*)` over the current filters.
    pub async fn count(&mut self) -> Result<u64> {
        let value = self.aggregate("COUNT", "*").await?;
        match value {
            SqlValue::Int(n) if n >= 0 => Ok(n as u64),
            SqlValue::Null => Ok(0),
            other => Err(Error::InvalidArgument(format!(
                "COUNT returned a non-integer value: {other:?}"
            ))),
        }
    }

    /// Returns `SUM(column)`; NULL when no rows match.
    pub async fn sum(&mut self, column: &str) -> Result<SqlValue> {
        self.aggregate("SUM", column).await
    }

    /// Returns `AVG(column)`; NULL when no rows match.
    pub async fn avg(&mut self, column: &str) -> Result<SqlValue> {
        self.aggregate("AVG", column).await
    }

    /// Returns `MIN(column)`; NULL when no rows match.
    pub async fn min(&mut self, column: &str) -> Result<SqlValue> {
        self.aggregate("MIN", column).await
    }

    /// Returns `MAX(column)`; NULL when no rows match.
    pub async fn max(&mut self, column: &str) -> Result<SqlValue> {
        self.aggregate("MAX", column).await
    }

    async fn aggregate(&mut self, function: &str, column: &str) -> Result<SqlValue> {
        self.columns = vec![format!("{function}({column}) AS aggregate")];
        self.orders.clear();
        self.limit = None;
        self.offset = None;
        let mut rows = self.get().await?;
        if rows.is_empty() {
            return Ok(SqlValue::Null);
        }
        Ok(rows
            .remove(0)
            .remove("aggregate")
            .unwrap_or(SqlValue::Null))
    }

    /// Adds `step` to a column on matching rows. The step must be
    /// positive; direction comes from choosing increment or decrement.
    pub async fn increment(&mut self, column: &str, step: i64) -> Result<u64> {
        self.arith_update(column, "+", step).await
    }

    /// Subtracts `step` from a column on matching rows.
    pub async fn decrement(&mut self, column: &str, step: i64) -> Result<u64> {
        self.arith_update(column, "-", step).await
    }

    async fn arith_update(&mut self, column: &str, op: &str, step: i64) -> Result<u64> {
        let compiled = if step <= 0 {
            Err(Error::InvalidArgument(String::from(
                "increment/decrement step must be positive",
            )))
        } else {
            self.require_table().map(|table| {
                let mut sql =
                    format!("UPDATE `{table}` SET {column} = {column} {op} ?");
                let mut bindings = vec![SqlValue::Int(step)];
                self.where_clause(&mut sql, &mut bindings);
                (sql, bindings)
            })
        };
        self.reset();
        let (sql, bindings) = compiled?;
        debug!(%sql, "running arithmetic update");
        self.driver.execute(&sql, &bindings).await
    }

    /// Fetches one page of results plus the total match count, both over
    /// the same filter state. Pages are 1-based; `per_page` must be
    /// non-zero.
    pub async fn paginate(&mut self, per_page: u64, page: u64) -> Result<Paginated> {
        let compiled = self.compile_paginate(per_page, page);
        self.reset();
        let (count_sql, count_bindings, sql, bindings) = compiled?;

        debug!(%count_sql, "running pagination count");
        let count_rows = self.driver.statement(&count_sql, &count_bindings).await?;
        let total = match count_rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove("aggregate"))
        {
            Some(SqlValue::Int(n)) if n >= 0 => n as u64,
            _ => 0,
        };

        debug!(%sql, bindings = bindings.len(), "running pagination select");
        let rows = self.driver.statement(&sql, &bindings).await?;
        Ok(Paginated {
            rows,
            total,
            per_page,
            current_page: page,
            last_page: total.div_ceil(per_page),
        })
    }

    #[allow(clippy::type_complexity)]
    fn compile_paginate(
        &mut self,
        per_page: u64,
        page: u64,
    ) -> Result<(String, Vec<SqlValue>, String, Vec<SqlValue>)> {
        if page == 0 || per_page == 0 {
            return Err(Error::InvalidArgument(String::from(
                "paginate requires page >= 1 and per_page >= 1",
            )));
        }
        let table = self.require_table()?;

        let mut count_sql = format!("SELECT COUNT(*) AS aggregate FROM `{table}`");
        self.join_clauses(&mut count_sql);
        let mut count_bindings = Vec::new();
        self.where_clause(&mut count_sql, &mut count_bindings);

        self.limit = Some(per_page);
        self.offset = Some((page - 1) * per_page);
        let (sql, bindings) = self.to_sql()?;
        Ok((count_sql, count_bindings, sql, bindings))
    }

    fn compile_insert(&self, values: &[(&str, SqlValue)]) -> Result<(String, Vec<SqlValue>)> {
        let table = self.require_table()?;
        if values.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "insert requires at least one column",
            )));
        }
        let columns: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "INSERT INTO `{table}` ({}) VALUES ({placeholders})",
            columns.join(", ")
        );
        let bindings = values.iter().map(|(_, v)| v.clone()).collect();
        Ok((sql, bindings))
    }

    fn compile_insert_many(
        &self,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<Option<(String, Vec<SqlValue>)>> {
        let table = self.require_table()?;
        if columns.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "insert requires at least one column",
            )));
        }
        if rows.is_empty() {
            return Ok(None);
        }
        for row in rows {
            if row.len() != columns.len() {
                return Err(Error::InvalidArgument(format!(
                    "row has {} values but {} columns were named",
                    row.len(),
                    columns.len()
                )));
            }
        }
        let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
        let tuples = vec![tuple; rows.len()].join(", ");
        let sql = format!(
            "INSERT INTO `{table}` ({}) VALUES {tuples}",
            columns.join(", ")
        );
        let bindings = rows.iter().flatten().cloned().collect();
        Ok(Some((sql, bindings)))
    }

    fn compile_update(&self, values: &[(&str, SqlValue)]) -> Result<(String, Vec<SqlValue>)> {
        let table = self.require_table()?;
        if values.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "update requires at least one assignment",
            )));
        }
        let assignments: Vec<String> =
            values.iter().map(|(c, _)| format!("{c} = ?")).collect();
        let mut sql = format!("UPDATE `{table}` SET {}", assignments.join(", "));
        let mut bindings: Vec<SqlValue> = values.iter().map(|(_, v)| v.clone()).collect();
        self.where_clause(&mut sql, &mut bindings);
        Ok((sql, bindings))
    }

    fn compile_delete(&self) -> Result<(String, Vec<SqlValue>)> {
        let table = self.require_table()?;
        let mut sql = format!("DELETE FROM `{table}`");
        let mut bindings = Vec::new();
        self.where_clause(&mut sql, &mut bindings);
        Ok((sql, bindings))
    }
}
