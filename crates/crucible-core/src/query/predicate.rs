//! WHERE/HAVING condition trees.
//!
//! A [`ConditionSet`] is an ordered list of predicates, each joined to the
//! previous one by AND or OR. Groups nest a whole set behind parentheses
//! via a closure, so precedence is explicit in the call structure.

use crate::value::{SqlValue, ToSqlValue};

/// Connective joining a predicate to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

impl Boolean {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One condition in a set.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op ?`
    Basic {
        column: String,
        operator: String,
        value: SqlValue,
    },
    /// `column [NOT] IN (?, ...)`
    In {
        column: String,
        values: Vec<SqlValue>,
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: String, negated: bool },
    /// `column [NOT] BETWEEN ? AND ?`
    Between {
        column: String,
        low: SqlValue,
        high: SqlValue,
        negated: bool,
    },
    /// Raw SQL fragment with its own bindings, emitted verbatim.
    Raw {
        sql: String,
        bindings: Vec<SqlValue>,
    },
    /// Parenthesized nested set.
    Group(ConditionSet),
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    boolean: Boolean,
    predicate: Predicate,
}

/// An ordered, connective-tagged list of predicates.
///
/// The same structure backs both WHERE and HAVING clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    nodes: Vec<Node>,
}

impl ConditionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, boolean: Boolean, predicate: Predicate) -> &mut Self {
        self.nodes.push(Node { boolean, predicate });
        self
    }

    /// Adds `column op ?`, AND-joined.
    pub fn where_(
        &mut self,
        column: &str,
        operator: &str,
        value: impl ToSqlValue,
    ) -> &mut Self {
        self.push(
            Boolean::And,
            Predicate::Basic {
                column: String::from(column),
                operator: String::from(operator),
                value: value.to_sql_value(),
            },
        )
    }

    /// Adds `column op ?`, OR-joined.
    pub fn or_where(
        &mut self,
        column: &str,
        operator: &str,
        value: impl ToSqlValue,
    ) -> &mut Self {
        self.push(
            Boolean::Or,
            Predicate::Basic {
                column: String::from(column),
                operator: String::from(operator),
                value: value.to_sql_value(),
            },
        )
    }

    /// Adds `column IN (?, ...)`.
    pub fn where_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push_in(column, values, false)
    }

    /// Adds `column NOT IN (?, ...)`.
    pub fn where_not_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.push_in(column, values, true)
    }

    fn push_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
        negated: bool,
    ) -> &mut Self {
        self.push(
            Boolean::And,
            Predicate::In {
                column: String::from(column),
                values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
                negated,
            },
        )
    }

    /// Adds `column IS NULL`.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.push(
            Boolean::And,
            Predicate::Null {
                column: String::from(column),
                negated: false,
            },
        )
    }

    /// Adds `column IS NOT NULL`.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.push(
            Boolean::And,
            Predicate::Null {
                column: String::from(column),
                negated: true,
            },
        )
    }

    /// Adds `column BETWEEN ? AND ?`.
    pub fn where_between(
        &mut self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> &mut Self {
        self.push_between(column, low, high, false)
    }

    /// Adds `column NOT BETWEEN ? AND ?`.
    pub fn where_not_between(
        &mut self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
    ) -> &mut Self {
        self.push_between(column, low, high, true)
    }

    fn push_between(
        &mut self,
        column: &str,
        low: impl ToSqlValue,
        high: impl ToSqlValue,
        negated: bool,
    ) -> &mut Self {
        self.push(
            Boolean::And,
            Predicate::Between {
                column: String::from(column),
                low: low.to_sql_value(),
                high: high.to_sql_value(),
                negated,
            },
        )
    }

    /// Adds a raw fragment with its own bindings. The fragment is trusted
    /// SQL; any `?` it contains must line up with `bindings`.
    pub fn where_raw(&mut self, sql: &str, bindings: Vec<SqlValue>) -> &mut Self {
        self.push(
            Boolean::And,
            Predicate::Raw {
                sql: String::from(sql),
                bindings,
            },
        )
    }

    /// Adds a parenthesized group, AND-joined. Empty groups are dropped
    /// at compile time.
    pub fn where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut ConditionSet),
    {
        self.push_group(Boolean::And, build)
    }

    /// Adds a parenthesized group, OR-joined.
    pub fn or_where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut ConditionSet),
    {
        self.push_group(Boolean::Or, build)
    }

    fn push_group<F>(&mut self, boolean: Boolean, build: F) -> &mut Self
    where
        F: FnOnce(&mut ConditionSet),
    {
        let mut inner = ConditionSet::new();
        build(&mut inner);
        self.push(boolean, Predicate::Group(inner))
    }

    /// Renders the set into `sql` and appends its parameters to
    /// `bindings`, left to right. The first rendered node drops its
    /// connective; this holds at every nesting level.
    pub fn compile(&self, sql: &mut String, bindings: &mut Vec<SqlValue>) {
        let mut first = true;
        for node in &self.nodes {
            // Empty groups contribute nothing, including their connective.
            if let Predicate::Group(inner) = &node.predicate {
                if inner.is_empty() {
                    continue;
                }
            }
            if first {
                first = false;
            } else {
                sql.push(' ');
                sql.push_str(node.boolean.as_sql());
                sql.push(' ');
            }
            compile_predicate(&node.predicate, sql, bindings);
        }
    }
}

fn compile_predicate(predicate: &Predicate, sql: &mut String, bindings: &mut Vec<SqlValue>) {
    match predicate {
        Predicate::Basic {
            column,
            operator,
            value,
        } => {
            sql.push_str(&format!("{column} {operator} ?"));
            bindings.push(value.clone());
        }
        Predicate::In {
            column,
            values,
            negated,
        } => {
            // Engines reject IN (); substitute a constant predicate that
            // keeps the row set an empty IN would describe.
            if values.is_empty() {
                sql.push_str(if *negated { "1 = 1" } else { "0 = 1" });
                return;
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            let keyword = if *negated { "NOT IN" } else { "IN" };
            sql.push_str(&format!("{column} {keyword} ({placeholders})"));
            bindings.extend(values.iter().cloned());
        }
        Predicate::Null { column, negated } => {
            let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
            sql.push_str(&format!("{column} {keyword}"));
        }
        Predicate::Between {
            column,
            low,
            high,
            negated,
        } => {
            let keyword = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
            sql.push_str(&format!("{column} {keyword} ? AND ?"));
            bindings.push(low.clone());
            bindings.push(high.clone());
        }
        Predicate::Raw { sql: raw, bindings: raw_bindings } => {
            sql.push_str(raw);
            bindings.extend(raw_bindings.iter().cloned());
        }
        Predicate::Group(inner) => {
            sql.push('(');
            inner.compile(sql, bindings);
            sql.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(set: &ConditionSet) -> (String, Vec<SqlValue>) {
        let mut sql = String::new();
        let mut bindings = Vec::new();
        set.compile(&mut sql, &mut bindings);
        (sql, bindings)
    }

    #[test]
    fn test_first_node_drops_connective() {
        let mut set = ConditionSet::new();
        set.where_("age", ">", 18).or_where("vip", "=", true);
        let (sql, bindings) = render(&set);
        assert_eq!(sql, "age > ? OR vip = ?");
        assert_eq!(bindings, vec![SqlValue::Int(18), SqlValue::Bool(true)]);
    }

    #[test]
    fn test_in_and_null() {
        let mut set = ConditionSet::new();
        set.where_in("status", ["open", "held"])
            .where_not_null("owner");
        let (sql, bindings) = render(&set);
        assert_eq!(sql, "status IN (?, ?) AND owner IS NOT NULL");
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn test_empty_in_compiles_to_constant() {
        let mut set = ConditionSet::new();
        set.where_in("id", Vec::<i64>::new());
        let (sql, bindings) = render(&set);
        assert_eq!(sql, "0 = 1");
        assert!(bindings.is_empty());

        let mut set = ConditionSet::new();
        set.where_not_in("id", Vec::<i64>::new());
        let (sql, _) = render(&set);
        assert_eq!(sql, "1 = 1");
    }

    #[test]
    fn test_between_bindings_in_order() {
        let mut set = ConditionSet::new();
        set.where_between("price", 10, 20)
            .where_not_between("stock", 0, 5);
        let (sql, bindings) = render(&set);
        assert_eq!(
            sql,
            "price BETWEEN ? AND ? AND stock NOT BETWEEN ? AND ?"
        );
        assert_eq!(
            bindings,
            vec![
                SqlValue::Int(10),
                SqlValue::Int(20),
                SqlValue::Int(0),
                SqlValue::Int(5)
            ]
        );
    }

    #[test]
    fn test_nested_group_strips_inner_leading_connective() {
        let mut set = ConditionSet::new();
        set.where_("active", "=", true).where_group(|g| {
            g.where_("role", "=", "admin").or_where("role", "=", "owner");
        });
        let (sql, bindings) = render(&set);
        assert_eq!(sql, "active = ? AND (role = ? OR role = ?)");
        assert_eq!(bindings.len(), 3);
    }

    #[test]
    fn test_empty_group_is_dropped() {
        let mut set = ConditionSet::new();
        set.where_("a", "=", 1).where_group(|_| {}).where_("b", "=", 2);
        let (sql, _) = render(&set);
        assert_eq!(sql, "a = ? AND b = ?");
    }

    #[test]
    fn test_leading_empty_group_does_not_leave_dangling_connective() {
        let mut set = ConditionSet::new();
        set.where_group(|_| {}).where_("a", "=", 1);
        let (sql, _) = render(&set);
        assert_eq!(sql, "a = ?");
    }

    #[test]
    fn test_raw_fragment_carries_bindings() {
        let mut set = ConditionSet::new();
        set.where_raw("LOWER(email) = ?", vec![SqlValue::from("x@y.z")])
            .where_("active", "=", true);
        let (sql, bindings) = render(&set);
        assert_eq!(sql, "LOWER(email) = ? AND active = ?");
        assert_eq!(bindings.len(), 2);

        let mut count = 0;
        for ch in sql.chars() {
            if ch == '?' {
                count += 1;
            }
        }
        assert_eq!(count, bindings.len());
    }
}
