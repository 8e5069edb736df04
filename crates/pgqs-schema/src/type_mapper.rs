use crate::description::{ColumnDescription, DomainType};
use crate::error::{SchemaError, SchemaResult};
use crate::naming::{relation_name, sanitize_field_ident};
use std::collections::BTreeMap;
use std::fmt;

/// Rust storage type of a column value, before nullability is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RustType {
    Bool,
    I32,
    I64,
    F64,
    DateTime,
    String,
    /// A user-supplied type path from the `[types]` overrides.
    Custom(String),
    Vec(Box<RustType>),
}

impl fmt::Display for RustType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::F64 => f.write_str("f64"),
            Self::DateTime => f.write_str("chrono::DateTime<chrono::Utc>"),
            Self::String => f.write_str("String"),
            Self::Custom(path) => f.write_str(path),
            Self::Vec(inner) => write!(f, "Vec<{inner}>"),
        }
    }
}

/// How user code reaches a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Plain public field.
    Public,
    /// Private field behind a generated read-only method.
    Getter { name: String },
}

/// The relation side of a foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignRepresentation {
    /// Referenced table.
    pub table: String,
    /// Referenced (primary key) column.
    pub column: String,
    /// Name used for the `get_*` / `set_*` relation methods.
    pub accessor: String,
}

/// Storage representation of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    pub field_name: String,
    pub column: String,
    pub base: RustType,
    pub nullable: bool,
    pub accessor: Accessor,
    pub foreign_key: Option<ForeignRepresentation>,
    /// `<`, `<=`, `>`, `>=` filters are offered.
    pub comparable: bool,
}

impl Representation {
    /// Full field type, `Option<…>` for nullable columns.
    pub fn field_type(&self) -> String {
        if self.nullable {
            format!("Option<{}>", self.base)
        } else {
            self.base.to_string()
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.accessor, Accessor::Getter { .. })
    }
}

/// Where a column's foreign-key target lives relative to the generation set.
#[derive(Debug, Clone, Copy)]
pub enum ForeignKeyScope<'a> {
    /// The column is not a foreign key.
    NotForeign,
    /// The referenced table is generated; this is its primary-key column.
    Resolved {
        table: &'a str,
        primary_key: &'a ColumnDescription,
    },
    /// The referenced table is not generated; the column is dropped.
    OutsideGenerationSet,
}

#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    /// User overrides from `[types]` (canonical domain name -> Rust path/type).
    custom: BTreeMap<String, String>,
}

impl TypeMapper {
    /// Build a mapper from `[types]` overrides; keys may use any accepted type spelling.
    pub fn new(custom: BTreeMap<String, String>) -> SchemaResult<Self> {
        let mut normalized = BTreeMap::new();
        for (k, v) in custom {
            let domain: DomainType = k.parse()?;
            if domain.array_depth() > 0 {
                return Err(SchemaError::InvalidDomainType(k));
            }
            normalized.insert(domain.canonical_name().to_string(), v);
        }
        Ok(Self { custom: normalized })
    }

    /// Rust type for a domain type; arrays unwrap recursively to nested `Vec`s.
    pub fn rust_type(&self, domain: &DomainType) -> RustType {
        if let DomainType::Array(inner) = domain {
            return RustType::Vec(Box::new(self.rust_type(inner)));
        }

        if let Some(t) = self.custom.get(domain.canonical_name()) {
            return RustType::Custom(t.clone());
        }

        match domain {
            DomainType::Boolean => RustType::Bool,
            DomainType::Int32 => RustType::I32,
            DomainType::Int64 => RustType::I64,
            DomainType::Float64 => RustType::F64,
            DomainType::DateTime => RustType::DateTime,
            DomainType::String => RustType::String,
            DomainType::Array(_) => unreachable!("arrays handled above"),
        }
    }

    /// Representation of `column`, or `None` when the column is dropped.
    ///
    /// Many-to-many links and foreign keys into tables outside the generation
    /// set are dropped. A foreign key takes the base type of the referenced
    /// primary key and keeps its own nullability.
    pub fn map(
        &self,
        column: &ColumnDescription,
        scope: ForeignKeyScope<'_>,
    ) -> Option<Representation> {
        if column
            .foreign_key
            .as_ref()
            .is_some_and(|fk| fk.many_to_many)
        {
            return None;
        }

        let field_name = sanitize_field_ident(&column.name);
        let accessor = if column.autogenerated {
            Accessor::Getter {
                name: field_name.clone(),
            }
        } else {
            Accessor::Public
        };

        let (domain, foreign_key) = match scope {
            ForeignKeyScope::NotForeign => (&column.domain_type, None),
            ForeignKeyScope::OutsideGenerationSet => return None,
            ForeignKeyScope::Resolved { table, primary_key } => (
                &primary_key.domain_type,
                Some(ForeignRepresentation {
                    table: table.to_string(),
                    column: primary_key.name.clone(),
                    accessor: relation_name(&column.name),
                }),
            ),
        };

        Some(Representation {
            field_name,
            column: column.name.clone(),
            base: self.rust_type(domain),
            nullable: column.nullable,
            accessor,
            foreign_key,
            comparable: domain.is_ordered(),
        })
    }
}
