//! Storage error classification.
//!
//! Reads the driver's structured error fields (SQLSTATE, schema, table,
//! constraint name, detail) and maps constraint failures onto
//! [`StorageError`] variants. The free-text message is never inspected.
//!
//! Constraint names follow the grammar declared in the migrations:
//!
//! ```text
//! {table}__pk__{key} | {table}__uq__{key}                  unique keys
//! fk__{column}__{referenced_table}__{referenced_column}    foreign keys
//! ```

use sqlx::postgres::PgDatabaseError;

use crate::error::StorageError;

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

const CONSTRAINT_SEPARATOR: &str = "__";

/// Kind of statement that produced the error.
///
/// Foreign-key failures are only classified for inserts; a foreign-key
/// error raised by any other statement passes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Begin,
    Select,
    Insert,
    Update,
    Delete,
    Commit,
    Rollback,
}

/// Driver-independent view of a database error's structured fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeDbError {
    pub code: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub constraint: Option<String>,
    pub detail: Option<String>,
    pub message: String,
}

/// Outcome of classifying a [`NativeDbError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    DuplicateEntry {
        field: String,
        value: String,
    },
    ForeignKeyViolation {
        referencing_table: String,
        referencing_column: String,
        referenced_table: String,
        referenced_column: String,
    },
    /// A constraint error whose payload does not match the grammar.
    Unclassified,
    /// Not a constraint error we own; hand it back untouched.
    PassThrough,
}

/// Classify a sqlx error raised by `statement`.
pub fn classify(err: sqlx::Error, statement: Statement) -> StorageError {
    let Some(native) = native_view(&err) else {
        return StorageError::Native(err);
    };

    match classify_native(&native, statement) {
        Classification::DuplicateEntry { field, value } => {
            StorageError::DuplicateEntry { field, value }
        }
        Classification::ForeignKeyViolation {
            referencing_table,
            referencing_column,
            referenced_table,
            referenced_column,
        } => StorageError::ForeignKeyViolation {
            referencing_table,
            referencing_column,
            referenced_table,
            referenced_column,
        },
        Classification::Unclassified => StorageError::Unclassified {
            code: native.code.unwrap_or_default(),
            message: native.message,
        },
        Classification::PassThrough => StorageError::Native(err),
    }
}

/// Pure classification over the structured fields.
pub fn classify_native(err: &NativeDbError, statement: Statement) -> Classification {
    match err.code.as_deref() {
        Some(UNIQUE_VIOLATION) => classify_unique(err),
        Some(FOREIGN_KEY_VIOLATION) if statement == Statement::Insert => classify_foreign_key(err),
        _ => Classification::PassThrough,
    }
}

fn classify_unique(err: &NativeDbError) -> Classification {
    let Some(constraint) = err.constraint.as_deref() else {
        return Classification::Unclassified;
    };

    let tokens: Vec<&str> = constraint.split(CONSTRAINT_SEPARATOR).collect();
    let [table, kind, key] = tokens.as_slice() else {
        return Classification::Unclassified;
    };
    if !matches!(*kind, "pk" | "uq") || table.is_empty() || key.is_empty() {
        return Classification::Unclassified;
    }
    if let Some(reported) = err.table.as_deref() {
        if reported != *table {
            return Classification::Unclassified;
        }
    }

    match err.detail.as_deref().and_then(key_value) {
        Some(value) => Classification::DuplicateEntry {
            field: (*key).to_string(),
            value: value.to_string(),
        },
        None => Classification::Unclassified,
    }
}

fn classify_foreign_key(err: &NativeDbError) -> Classification {
    // database (schema), table, constraint, column, referenced table, referenced column
    let (Some(schema), Some(table), Some(constraint)) = (
        err.schema.as_deref(),
        err.table.as_deref(),
        err.constraint.as_deref(),
    ) else {
        return Classification::Unclassified;
    };

    let tokens: Vec<&str> = constraint.split(CONSTRAINT_SEPARATOR).collect();
    let ["fk", column, referenced_table, referenced_column] = tokens.as_slice() else {
        return Classification::Unclassified;
    };

    let grammar = [
        schema,
        table,
        constraint,
        *column,
        *referenced_table,
        *referenced_column,
    ];
    if grammar.iter().any(|token| token.is_empty()) {
        return Classification::Unclassified;
    }

    Classification::ForeignKeyViolation {
        referencing_table: table.to_string(),
        referencing_column: column.to_string(),
        referenced_table: referenced_table.to_string(),
        referenced_column: referenced_column.to_string(),
    }
}

/// Extract the offending value tuple from a key detail such as
/// `Key (leader_uuid)=(student-123412341234) already exists.`
///
/// Only the `(columns)=(values)` structure is relied on; the surrounding
/// words depend on the server's message locale.
fn key_value(detail: &str) -> Option<&str> {
    let start = detail.find(")=(")? + 3;
    let end = detail.rfind(')')?;
    (end > start).then(|| &detail[start..end])
}

fn native_view(err: &sqlx::Error) -> Option<NativeDbError> {
    let db_err = err.as_database_error()?;

    if let Some(pg) = db_err.try_downcast_ref::<PgDatabaseError>() {
        return Some(NativeDbError {
            code: Some(pg.code().to_string()),
            schema: pg.schema().map(str::to_string),
            table: pg.table().map(str::to_string),
            constraint: pg.constraint().map(str::to_string),
            detail: pg.detail().map(str::to_string),
            message: pg.message().to_string(),
        });
    }

    Some(NativeDbError {
        code: db_err.code().map(|c| c.into_owned()),
        schema: None,
        table: db_err.table().map(str::to_string),
        constraint: db_err.constraint().map(str::to_string),
        detail: None,
        message: db_err.message().to_string(),
    })
}
