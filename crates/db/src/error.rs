use club_core::error::CoreError;

/// Domain-level storage error produced by every accessor operation.
///
/// Native driver errors never leave the accessor raw: they go through
/// [`crate::classify::classify`] exactly once, at the statement that failed.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Malformed input rejected before any statement ran.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A unique key already holds `value`.
    #[error("Duplicate entry '{value}' for key '{field}'")]
    DuplicateEntry { field: String, value: String },

    /// An insert referenced a parent row that does not exist.
    #[error(
        "Foreign key violation: {referencing_table}.{referencing_column} references missing \
         {referenced_table}.{referenced_column}"
    )]
    ForeignKeyViolation {
        referencing_table: String,
        referencing_column: String,
        referenced_table: String,
        referenced_column: String,
    },

    /// A constraint error whose structured payload did not match the
    /// expected grammar.
    #[error("Unclassified storage error ({code}): {message}")]
    Unclassified { code: String, message: String },

    /// Any other driver error, passed through untouched.
    #[error("Database error: {0}")]
    Native(#[source] sqlx::Error),
}

impl StorageError {
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        StorageError::DuplicateEntry {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<CoreError> for StorageError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => StorageError::Validation(msg),
            other => StorageError::Validation(other.to_string()),
        }
    }
}
