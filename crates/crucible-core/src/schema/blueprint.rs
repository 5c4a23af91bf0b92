//! Table blueprints and the DDL compiler.
//!
//! A [`Blueprint`] is constructed fresh per `Schema::create`/`Schema::table`
//! call, mutated inside that call's closure, compiled once with
//! [`to_sql`](Blueprint::to_sql) and then discarded.

use super::column::{ColumnDescriptor, ColumnType};
use super::command::{Command, ForeignKeyCommand};
use super::foreign_key::ForeignKeyBuilder;

/// Maximum identifier length on the reference engine.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Whether the blueprint compiles to CREATE TABLE or ALTER TABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueprintMode {
    /// Compile to `CREATE TABLE`.
    Create,
    /// Compile to `ALTER TABLE`.
    Alter,
}

/// In-memory description of one table's desired column/command state.
#[derive(Debug, Clone)]
pub struct Blueprint {
    table: String,
    mode: BlueprintMode,
    columns: Vec<ColumnDescriptor>,
    commands: Vec<Command>,
    engine: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
}

impl Blueprint {
    /// Creates a blueprint in create mode.
    #[must_use]
    pub fn create(table: impl Into<String>) -> Self {
        Self::new(table, BlueprintMode::Create)
    }

    /// Creates a blueprint in alter mode.
    #[must_use]
    pub fn alter(table: impl Into<String>) -> Self {
        Self::new(table, BlueprintMode::Alter)
    }

    fn new(table: impl Into<String>, mode: BlueprintMode) -> Self {
        Self {
            table: table.into(),
            mode,
            columns: Vec::new(),
            commands: Vec::new(),
            engine: None,
            charset: None,
            collation: None,
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the compilation mode.
    #[must_use]
    pub const fn mode(&self) -> BlueprintMode {
        self.mode
    }

    /// Returns the columns added so far, in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns the recorded commands, in declaration order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Reports whether compiling would produce anything to execute.
    ///
    /// Callers must skip execution when this is false: an empty
    /// `ALTER TABLE` is invalid SQL.
    #[must_use]
    pub fn has_commands(&self) -> bool {
        !self.columns.is_empty() || !self.commands.is_empty()
    }

    // ------------------------------------------------------------------
    // Column helpers
    // ------------------------------------------------------------------

    /// Appends a column of the given logical type and returns it for
    /// modification. Column order is append-only and determines DDL order.
    pub fn add_column(&mut self, column_type: ColumnType, name: &str) -> &mut ColumnDescriptor {
        self.columns.push(ColumnDescriptor::new(name, column_type));
        self.columns.last_mut().expect("column was just pushed")
    }

    /// Adds an auto-incrementing unsigned `id` primary key.
    pub fn id(&mut self) -> &mut ColumnDescriptor {
        let col = self.add_column(ColumnType::Id, "id");
        col.unsigned().auto_increment().primary();
        col
    }

    /// Adds a `VARCHAR` column.
    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnDescriptor {
        self.add_column(ColumnType::String(length), name)
    }

    /// Adds an `INT` column.
    pub fn integer(&mut self, name: &str) -> &mut ColumnDescriptor {
        self.add_column(ColumnType::Integer, name)
    }

    /// Adds a `TINYINT(1)` column.
    pub fn boolean(&mut self, name: &str) -> &mut ColumnDescriptor {
        self.add_column(ColumnType::Boolean, name)
    }

    /// Adds a `TEXT` column.
    pub fn text(&mut self, name: &str) -> &mut ColumnDescriptor {
        self.add_column(ColumnType::Text, name)
    }

    /// Adds a `DECIMAL` column.
    pub fn decimal(&mut self, name: &str, precision: u8, scale: u8) -> &mut ColumnDescriptor {
        self.add_column(ColumnType::Decimal(precision, scale), name)
    }

    /// Adds a `DATE` column.
    pub fn date(&mut self, name: &str) -> &mut ColumnDescriptor {
        self.add_column(ColumnType::Date, name)
    }

    /// Adds a `DATETIME` column.
    pub fn datetime(&mut self, name: &str) -> &mut ColumnDescriptor {
        self.add_column(ColumnType::DateTime, name)
    }

    /// Adds a `TIMESTAMP` column.
    pub fn timestamp(&mut self, name: &str) -> &mut ColumnDescriptor {
        self.add_column(ColumnType::Timestamp, name)
    }

    /// Adds an `ENUM` column over a closed value set.
    pub fn enumeration(&mut self, name: &str, values: &[&str]) -> &mut ColumnDescriptor {
        let values = values.iter().map(|v| String::from(*v)).collect();
        self.add_column(ColumnType::Enum(values), name)
    }

    // ------------------------------------------------------------------
    // Command helpers
    // ------------------------------------------------------------------

    /// Records a raw command. Commands compile in declaration order.
    pub fn push_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Starts a foreign key on the given local column(s).
    ///
    /// The returned builder pushes its command into this blueprint on its
    /// terminal [`on`](ForeignKeyBuilder::on) call; a validation error
    /// before that leaves the blueprint untouched.
    pub fn foreign(&mut self, columns: &[&str]) -> ForeignKeyBuilder<'_> {
        ForeignKeyBuilder::new(self, columns)
    }

    /// Adds a (possibly composite) primary key.
    pub fn primary(&mut self, columns: &[&str]) {
        self.commands.push(Command::AddPrimary {
            columns: owned(columns),
        });
    }

    /// Adds a unique index with a derived name.
    pub fn unique(&mut self, columns: &[&str]) {
        let name = self.index_name(columns, "unique");
        self.commands.push(Command::AddUnique {
            name,
            columns: owned(columns),
        });
    }

    /// Adds a plain index with a derived name.
    pub fn index(&mut self, columns: &[&str]) {
        let name = self.index_name(columns, "idx");
        self.commands.push(Command::AddIndex {
            name,
            columns: owned(columns),
        });
    }

    /// Drops a column.
    pub fn drop_column(&mut self, column: &str) {
        self.commands.push(Command::DropColumn {
            column: String::from(column),
        });
    }

    /// Renames a column, optionally changing its type.
    pub fn rename_column(&mut self, from: &str, to: &str, new_type: Option<ColumnType>) {
        self.commands.push(Command::RenameColumn {
            from: String::from(from),
            to: String::from(to),
            new_type,
        });
    }

    /// Redefines an existing column in place.
    pub fn change_column(&mut self, column: ColumnDescriptor) {
        self.commands.push(Command::ChangeColumn { column });
    }

    /// Drops an index.
    pub fn drop_index(&mut self, name: &str) {
        self.commands.push(Command::DropIndex {
            name: String::from(name),
        });
    }

    /// Drops the primary key.
    pub fn drop_primary(&mut self) {
        self.commands.push(Command::DropPrimary);
    }

    /// Drops a unique index.
    pub fn drop_unique(&mut self, name: &str) {
        self.commands.push(Command::DropUnique {
            name: String::from(name),
        });
    }

    /// Renames an index.
    pub fn rename_index(&mut self, from: &str, to: &str) {
        self.commands.push(Command::RenameIndex {
            from: String::from(from),
            to: String::from(to),
        });
    }

    // ------------------------------------------------------------------
    // Table options
    // ------------------------------------------------------------------

    /// Sets the storage engine.
    pub fn engine(&mut self, engine: impl Into<String>) {
        self.engine = Some(engine.into());
    }

    /// Sets the table character set.
    pub fn charset(&mut self, charset: impl Into<String>) {
        self.charset = Some(charset.into());
    }

    /// Sets the table collation.
    pub fn collation(&mut self, collation: impl Into<String>) {
        self.collation = Some(collation.into());
    }

    // ------------------------------------------------------------------
    // Compilation
    // ------------------------------------------------------------------

    /// Compiles the blueprint into a single DDL statement.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self.mode {
            BlueprintMode::Create => self.compile_create(),
            BlueprintMode::Alter => self.compile_alter(),
        }
    }

    fn compile_create(&self) -> String {
        let mut lines: Vec<String> = self.columns.iter().map(column_sql).collect();

        for command in &self.commands {
            match command {
                Command::AddPrimary { columns } => {
                    lines.push(format!("PRIMARY KEY ({})", quote_list(columns)));
                }
                Command::AddUnique { name, columns } => {
                    lines.push(format!(
                        "UNIQUE KEY {} ({})",
                        quote(name),
                        quote_list(columns)
                    ));
                }
                Command::AddIndex { name, columns } => {
                    lines.push(format!("KEY {} ({})", quote(name), quote_list(columns)));
                }
                Command::Foreign(fk) => {
                    lines.push(self.foreign_key_sql(fk));
                }
                // Drop/rename/change commands have no meaning inside
                // CREATE TABLE and are not emitted.
                _ => {}
            }
        }

        let mut sql = format!(
            "CREATE TABLE {} (\n    {}\n)",
            quote(&self.table),
            lines.join(",\n    ")
        );

        if let Some(ref engine) = self.engine {
            sql.push_str(&format!(" ENGINE={engine}"));
        }
        if let Some(ref charset) = self.charset {
            sql.push_str(&format!(" DEFAULT CHARACTER SET {charset}"));
        }
        if let Some(ref collation) = self.collation {
            sql.push_str(&format!(" COLLATE {collation}"));
        }

        sql
    }

    fn compile_alter(&self) -> String {
        let mut clauses: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("ADD COLUMN {}", column_sql(c)))
            .collect();

        for command in &self.commands {
            let clause = match command {
                Command::Foreign(fk) => {
                    format!("ADD {}", self.foreign_key_sql(fk))
                }
                Command::DropColumn { column } => {
                    format!("DROP COLUMN {}", quote(column))
                }
                Command::RenameColumn { from, to, new_type } => match new_type {
                    Some(ty) => format!(
                        "CHANGE COLUMN {} {} {}",
                        quote(from),
                        quote(to),
                        ty.to_sql()
                    ),
                    None => format!("RENAME COLUMN {} TO {}", quote(from), quote(to)),
                },
                Command::ChangeColumn { column } => {
                    format!("MODIFY COLUMN {}", column_sql(column))
                }
                Command::AddIndex { name, columns } => {
                    format!("ADD INDEX {} ({})", quote(name), quote_list(columns))
                }
                Command::AddPrimary { columns } => {
                    format!("ADD PRIMARY KEY ({})", quote_list(columns))
                }
                Command::AddUnique { name, columns } => {
                    format!("ADD UNIQUE KEY {} ({})", quote(name), quote_list(columns))
                }
                Command::DropIndex { name } | Command::DropUnique { name } => {
                    format!("DROP INDEX {}", quote(name))
                }
                Command::DropPrimary => String::from("DROP PRIMARY KEY"),
                Command::RenameIndex { from, to } => {
                    format!("RENAME INDEX {} TO {}", quote(from), quote(to))
                }
            };
            clauses.push(clause);
        }

        format!("ALTER TABLE {} {}", quote(&self.table), clauses.join(", "))
    }

    fn foreign_key_sql(&self, fk: &ForeignKeyCommand) -> String {
        let name = self.foreign_key_name(fk);
        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            quote(&name),
            quote_list(&fk.columns),
            quote(&fk.on_table),
            quote_list(&fk.references)
        );
        if let Some(action) = fk.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = fk.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }

    /// Derives the constraint name `fk_<table>_<foreign>_<columns>`,
    /// squeezed under the engine's identifier limit.
    #[must_use]
    pub fn foreign_key_name(&self, fk: &ForeignKeyCommand) -> String {
        let name = format!(
            "fk_{}_{}_{}",
            self.table,
            fk.on_table,
            fk.columns.join("_")
        );
        constrain_identifier(&name)
    }

    fn index_name(&self, columns: &[&str], suffix: &str) -> String {
        let name = format!("{}_{}_{suffix}", self.table, columns.join("_"));
        constrain_identifier(&name)
    }
}

/// Compiles one column clause: type, nullability, default, auto-increment,
/// primary, unique, comment.
fn column_sql(col: &ColumnDescriptor) -> String {
    let mut sql = format!("{} {}", quote(&col.name), col.column_type.to_sql());

    if col.unsigned {
        sql.push_str(" UNSIGNED");
    }
    if let Some(ref charset) = col.charset {
        sql.push_str(&format!(" CHARACTER SET {charset}"));
    }
    if let Some(ref collation) = col.collation {
        sql.push_str(&format!(" COLLATE {collation}"));
    }
    if !col.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(ref default) = col.default {
        // DEFAULT NULL only renders for nullable columns or explicit NULL.
        sql.push_str(&format!(" DEFAULT {}", default.to_sql()));
    }
    if col.auto_increment {
        sql.push_str(" AUTO_INCREMENT");
    }
    if col.primary {
        sql.push_str(" PRIMARY KEY");
    }
    if col.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(ref comment) = col.comment {
        sql.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
    }

    sql
}

/// Squeezes a derived identifier under [`MAX_IDENTIFIER_LEN`].
///
/// Deterministic best-effort: segments longer than three characters lose
/// their non-leading vowels first; whatever still exceeds the limit is
/// truncated. Not a uniqueness guarantee.
#[must_use]
pub fn constrain_identifier(name: &str) -> String {
    if name.len() <= MAX_IDENTIFIER_LEN {
        return String::from(name);
    }
    let squeezed = name
        .split('_')
        .map(|segment| {
            if segment.len() <= 3 {
                String::from(segment)
            } else {
                segment
                    .chars()
                    .enumerate()
                    .filter(|&(i, ch)| i == 0 || !matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u'))
                    .map(|(_, ch)| ch)
                    .collect()
            }
        })
        .collect::<Vec<String>>()
        .join("_");
    if squeezed.len() <= MAX_IDENTIFIER_LEN {
        squeezed
    } else {
        squeezed.chars().take(MAX_IDENTIFIER_LEN).collect()
    }
}

fn quote(identifier: &str) -> String {
    format!("`{identifier}`")
}

fn quote_list(identifiers: &[String]) -> String {
    identifiers
        .iter()
        .map(|i| quote(i))
        .collect::<Vec<String>>()
        .join(", ")
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| String::from(*c)).collect()
}
