//! Short-lived fluent builder for foreign key constraints.

use crate::error::Result;

use super::blueprint::Blueprint;
use super::command::{Command, ForeignKeyCommand, ReferentialAction};

/// Accumulates one foreign key definition against a [`Blueprint`].
///
/// Obtained from [`Blueprint::foreign`]; nothing is recorded on the
/// blueprint until the terminal [`on`](Self::on) call, so a validation
/// error mid-chain drops the builder without side effects.
#[derive(Debug)]
#[must_use = "a foreign key builder does nothing until `.on(table)` is called"]
pub struct ForeignKeyBuilder<'a> {
    blueprint: &'a mut Blueprint,
    columns: Vec<String>,
    references: Vec<String>,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
}

impl<'a> ForeignKeyBuilder<'a> {
    pub(crate) fn new(blueprint: &'a mut Blueprint, columns: &[&str]) -> Self {
        Self {
            blueprint,
            columns: columns.iter().map(|c| String::from(*c)).collect(),
            references: Vec::new(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets the referenced column(s) on the foreign table.
    ///
    /// Defaults to `["id"]` when never called.
    pub fn references(mut self, columns: &[&str]) -> Self {
        self.references = columns.iter().map(|c| String::from(*c)).collect();
        self
    }

    /// Sets the ON DELETE action from a free-form action name.
    ///
    /// Accepts the same spellings as [`ReferentialAction::from_str`],
    /// e.g. `"cascade"`, `"SET NULL"`, `"no_action"`.
    pub fn on_delete(mut self, action: &str) -> Result<Self> {
        self.on_delete = Some(action.parse()?);
        Ok(self)
    }

    /// Sets the ON UPDATE action from a free-form action name.
    pub fn on_update(mut self, action: &str) -> Result<Self> {
        self.on_update = Some(action.parse()?);
        Ok(self)
    }

    /// Names the foreign table and records the constraint on the blueprint.
    pub fn on(self, table: &str) {
        let references = if self.references.is_empty() {
            vec![String::from("id")]
        } else {
            self.references
        };
        self.blueprint.push_command(Command::Foreign(ForeignKeyCommand {
            columns: self.columns,
            on_table: String::from(table),
            references,
            on_delete: self.on_delete,
            on_update: self.on_update,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_full_foreign_key_chain() {
        let mut bp = Blueprint::create("posts");
        bp.foreign(&["user_id"])
            .references(&["id"])
            .on_delete("cascade")
            .unwrap()
            .on_update("restrict")
            .unwrap()
            .on("users");

        let sql = bp.to_sql();
        assert!(sql.contains(
            "CONSTRAINT `fk_posts_users_user_id` FOREIGN KEY (`user_id`) \
             REFERENCES `users` (`id`) ON DELETE CASCADE ON UPDATE RESTRICT"
        ));
    }

    #[test]
    fn test_references_defaults_to_id() {
        let mut bp = Blueprint::create("posts");
        bp.foreign(&["user_id"]).on("users");
        let sql = bp.to_sql();
        assert!(sql.contains("REFERENCES `users` (`id`)"));
        assert!(!sql.contains("ON DELETE"));
    }

    #[test]
    fn test_invalid_action_leaves_blueprint_unmodified() {
        let mut bp = Blueprint::create("posts");
        let err = bp.foreign(&["user_id"]).on_delete("explode").unwrap_err();
        assert!(matches!(err, Error::UnknownReferentialAction(_)));
        assert!(bp.commands().is_empty());
    }

    #[test]
    fn test_composite_foreign_key() {
        let mut bp = Blueprint::alter("order_items");
        bp.foreign(&["order_id", "order_region"])
            .references(&["id", "region"])
            .on("orders");
        let sql = bp.to_sql();
        assert!(sql.contains(
            "ADD CONSTRAINT `fk_order_items_orders_order_id_order_region` \
             FOREIGN KEY (`order_id`, `order_region`) REFERENCES `orders` (`id`, `region`)"
        ));
    }
}
