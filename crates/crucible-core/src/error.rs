//! Error types for the schema and query core.

/// Errors raised by the blueprint compiler and the query builder.
///
/// Construction-time validation errors are raised at the offending call,
/// before any SQL is built. Driver errors pass through unchanged; the core
/// never classifies or recovers them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A terminal operation was called before `table()`.
    #[error("No table specified for query")]
    MissingTable,

    /// A builder call violated one of its preconditions.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A foreign-key action string was not one of CASCADE, SET NULL,
    /// NO ACTION, RESTRICT, SET DEFAULT.
    #[error("Unknown referential action: '{0}'")]
    UnknownReferentialAction(String),

    /// Error surfaced by the underlying database driver.
    #[error("Driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a driver-level error.
    pub fn driver<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Driver(Box::new(err))
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
