//! Column descriptors for table blueprints.
//!
//! A [`ColumnDescriptor`] is pure data: the DDL compiler in
//! [`blueprint`](super::blueprint) turns it into a column clause. Modifier
//! methods return `&mut Self`, so the column being modified is always the
//! one the borrow points at rather than an implicit "last added" cursor.

/// Logical column types supported by the DDL compiler.
///
/// Rendered as uppercase MySQL type names.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// Auto-incrementing primary key (`BIGINT`).
    Id,
    /// Variable-length string with a maximum length.
    String(u32),
    /// 32-bit integer.
    Integer,
    /// Boolean, stored as `TINYINT(1)`.
    Boolean,
    /// Unbounded text.
    Text,
    /// Fixed-point decimal with precision and scale.
    Decimal(u8, u8),
    /// Date only.
    Date,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,
    /// Enumeration over a closed value set.
    Enum(Vec<String>),
}

impl ColumnType {
    /// Returns the SQL type clause for this logical type.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Id => String::from("BIGINT"),
            Self::String(len) => format!("VARCHAR({len})"),
            Self::Integer => String::from("INT"),
            Self::Boolean => String::from("TINYINT(1)"),
            Self::Text => String::from("TEXT"),
            Self::Decimal(precision, scale) => format!("DECIMAL({precision},{scale})"),
            Self::Date => String::from("DATE"),
            Self::DateTime => String::from("DATETIME"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Enum(values) => {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| format!("'{}'", v.replace('\'', "''")))
                    .collect();
                format!("ENUM({})", quoted.join(","))
            }
        }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Explicit NULL default.
    Null,
    /// Boolean default, rendered as `1`/`0`.
    Bool(bool),
    /// Integer default, rendered unquoted.
    Int(i64),
    /// Float default, rendered unquoted.
    Float(f64),
    /// String default, single-quoted with embedded quotes doubled.
    Str(String),
    /// Raw SQL expression (e.g. `CURRENT_TIMESTAMP`).
    Expr(String),
}

impl DefaultValue {
    /// Returns the SQL rendering of this default.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expr(expr) => expr.clone(),
        }
    }
}

/// A single column of a table blueprint.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Logical type.
    pub column_type: ColumnType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value, if any.
    pub default: Option<DefaultValue>,
    /// Whether the column carries a UNIQUE constraint.
    pub unique: bool,
    /// Whether the column is the primary key.
    pub primary: bool,
    /// Whether the column auto-increments.
    pub auto_increment: bool,
    /// Whether a numeric column is unsigned.
    pub unsigned: bool,
    /// Column comment.
    pub comment: Option<String>,
    /// Per-column character set.
    pub charset: Option<String>,
    /// Per-column collation.
    pub collation: Option<String>,
}

impl ColumnDescriptor {
    /// Creates a column with the compiler defaults: NOT NULL, no default.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            unique: false,
            primary: false,
            auto_increment: false,
            unsigned: false,
            comment: None,
            charset: None,
            collation: None,
        }
    }

    /// Allows NULL for this column.
    ///
    /// Forces the default to NULL; a later explicit [`default`](Self::default)
    /// call overrides it.
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self.default = Some(DefaultValue::Null);
        self
    }

    /// Sets the default value.
    pub fn default(&mut self, value: DefaultValue) -> &mut Self {
        self.default = Some(value);
        self
    }

    /// Marks the column UNIQUE.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Marks the column as the primary key.
    pub fn primary(&mut self) -> &mut Self {
        self.primary = true;
        self
    }

    /// Marks the column AUTO_INCREMENT.
    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Marks a numeric column UNSIGNED.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Attaches a comment.
    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the per-column character set.
    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the per-column collation.
    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }
}
