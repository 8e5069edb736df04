//! Error types for schema descriptions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A schema description that cannot be turned into generated code.
///
/// Every variant is a configuration error: it is reported while the schema is
/// loaded or while a derive macro expands, never while queries run.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The table declares no primary key column.
    #[error("table `{table}` has no primary key column")]
    NoPrimaryKey { table: String },

    /// The table declares more than one primary key column.
    #[error("table `{table}` has more than one primary key column: {}", columns.join(", "))]
    MultiplePrimaryKeys { table: String, columns: Vec<String> },

    /// Two tables share a name.
    #[error("table `{0}` is declared more than once")]
    DuplicateTable(String),

    /// Two columns of one table share a name.
    #[error("column `{column}` is declared more than once in table `{table}`")]
    DuplicateColumn { table: String, column: String },

    /// A reference points at a table that is not described.
    #[error("`{referenced_from}` references unknown table `{table}`")]
    UnknownTable {
        table: String,
        referenced_from: String,
    },

    /// A reference points at a column that the table does not have.
    #[error("table `{table}` has no column `{column}`")]
    UnknownColumn { table: String, column: String },

    /// A foreign key names a target column other than the target's primary key.
    #[error("foreign key `{table}.{column}` must reference the primary key of `{target}`")]
    ForeignKeyNotPrimaryKey {
        table: String,
        column: String,
        target: String,
    },

    /// A reverse relation names an owner column that is not a foreign key to the table.
    #[error(
        "reverse relation of `{table}`: `{owner_table}.{owner_column}` is not a foreign key to `{table}`"
    )]
    InvalidReverseRelation {
        table: String,
        owner_table: String,
        owner_column: String,
    },

    /// A domain type name could not be parsed.
    #[error("invalid domain type `{0}`")]
    InvalidDomainType(String),

    /// The schema document is malformed.
    #[error("failed to parse schema description: {0}")]
    Parse(String),

    /// The schema document could not be read.
    #[error("failed to read schema description {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    /// Whether this error is about the primary key declaration of a table.
    pub fn is_primary_key_error(&self) -> bool {
        matches!(
            self,
            Self::NoPrimaryKey { .. } | Self::MultiplePrimaryKeys { .. }
        )
    }
}
