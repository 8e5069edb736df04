//! The schema description: tables, typed columns, keys and relations as plain data.

use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Column domain type, independent of any storage or language representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DomainType {
    Boolean,
    Int32,
    Int64,
    Float64,
    DateTime,
    String,
    /// An array of another domain type (arrays may nest).
    Array(Box<DomainType>),
}

impl DomainType {
    /// Wrap this type into an array type.
    pub fn array_of(inner: DomainType) -> Self {
        Self::Array(Box::new(inner))
    }

    /// The innermost non-array type.
    pub fn base(&self) -> &DomainType {
        match self {
            Self::Array(inner) => inner.base(),
            other => other,
        }
    }

    /// Number of array levels around the base type.
    pub fn array_depth(&self) -> usize {
        match self {
            Self::Array(inner) => 1 + inner.array_depth(),
            _ => 0,
        }
    }

    /// Whether ordering comparisons (`<`, `<=`, `>`, `>=`) are offered for this type.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, Self::Boolean)
    }

    /// Canonical name of the base type, as used in `[types]` overrides.
    pub fn canonical_name(&self) -> &'static str {
        match self.base() {
            Self::Boolean => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::DateTime => "datetime",
            Self::String => "string",
            Self::Array(_) => unreachable!("base() never returns an array"),
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())?;
        for _ in 0..self.array_depth() {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl FromStr for DomainType {
    type Err = SchemaError;

    fn from_str(s: &str) -> SchemaResult<Self> {
        let normalized = normalize_type_name(s);

        if let Some(inner) = normalized.strip_suffix("[]") {
            return Ok(Self::array_of(inner.parse()?));
        }

        match normalized.as_str() {
            "bool" | "boolean" => Ok(Self::Boolean),
            "int32" | "int" | "int4" | "integer" | "int2" | "smallint" | "serial" => {
                Ok(Self::Int32)
            }
            "int64" | "int8" | "bigint" | "bigserial" => Ok(Self::Int64),
            "float64" | "float8" | "double precision" | "float4" | "real" => Ok(Self::Float64),
            "datetime" | "timestamptz" | "timestamp" | "date" | "time" => Ok(Self::DateTime),
            "string" | "text" | "varchar" | "char" | "character" | "name" => Ok(Self::String),
            _ => Err(SchemaError::InvalidDomainType(s.to_string())),
        }
    }
}

impl TryFrom<String> for DomainType {
    type Error = SchemaError;

    fn try_from(value: String) -> SchemaResult<Self> {
        value.parse()
    }
}

impl From<DomainType> for String {
    fn from(value: DomainType) -> Self {
        value.to_string()
    }
}

/// Lowercase, strip `(…)` modifiers and collapse whitespace: `VARCHAR(255)` -> `varchar`.
pub fn normalize_type_name(name: &str) -> String {
    let mut s = name.trim().to_lowercase();

    while let Some(start) = s.find('(') {
        let Some(end) = s[start..].find(')') else {
            break;
        };
        s.replace_range(start..start + end + 1, "");
    }

    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");

    match s.as_str() {
        "character varying" => "varchar".to_string(),
        "timestamp with time zone" => "timestamptz".to_string(),
        "timestamp without time zone" => "timestamp".to_string(),
        _ => s,
    }
}

/// Target of a foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyTarget {
    /// Referenced table.
    pub table: String,
    /// Referenced column; defaults to the referenced table's primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Many-to-many link; such columns are never generated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub many_to_many: bool,
}

impl ForeignKeyTarget {
    /// Reference the primary key of `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: None,
            many_to_many: false,
        }
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub domain_type: DomainType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Value assigned by the store (serial key or server default).
    #[serde(default)]
    pub autogenerated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyTarget>,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>, domain_type: DomainType) -> Self {
        Self {
            name: name.into(),
            domain_type,
            nullable: false,
            primary_key: false,
            autogenerated: false,
            foreign_key: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn autogenerated(mut self) -> Self {
        self.autogenerated = true;
        self
    }

    pub fn references(mut self, target: ForeignKeyTarget) -> Self {
        self.foreign_key = Some(target);
        self
    }

    /// Whether the column is supplied by the caller on INSERT.
    pub fn is_insertable(&self) -> bool {
        !self.autogenerated
    }

    /// Whether the column is written by a keyed UPDATE of a persisted row.
    pub fn is_updatable(&self) -> bool {
        !self.autogenerated && !self.primary_key
    }
}

/// A one-to-many relation seen from the referenced ("one") side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseRelation {
    /// Table holding the foreign key.
    pub owner_table: String,
    /// Foreign-key column on `owner_table`.
    pub owner_column: String,
    /// Accessor name; derived from `owner_table` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A table: name, ordered columns and reverse relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reverse_relations: Vec<ReverseRelation>,
}

impl TableDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            reverse_relations: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDescription) -> Self {
        self.columns.push(column);
        self
    }

    pub fn reverse_relation(mut self, relation: ReverseRelation) -> Self {
        self.reverse_relations.push(relation);
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnDescription> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The single primary-key column.
    ///
    /// Fails when the table declares zero or several primary keys.
    pub fn primary_key(&self) -> SchemaResult<&ColumnDescription> {
        let mut keys = self.columns.iter().filter(|c| c.primary_key);
        let Some(first) = keys.next() else {
            return Err(SchemaError::NoPrimaryKey {
                table: self.name.clone(),
            });
        };
        let rest: Vec<&ColumnDescription> = keys.collect();
        if !rest.is_empty() {
            return Err(SchemaError::MultiplePrimaryKeys {
                table: self.name.clone(),
                columns: std::iter::once(first)
                    .chain(rest)
                    .map(|c| c.name.clone())
                    .collect(),
            });
        }
        Ok(first)
    }

    /// Table-local checks: unique column names and exactly one primary key.
    pub fn validate(&self) -> SchemaResult<()> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for c in &self.columns {
            if !seen.insert(c.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: c.name.clone(),
                });
            }
        }
        self.primary_key()?;
        Ok(())
    }
}

/// A full schema description document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    /// Type Mapper overrides: domain type name -> Rust type path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, String>,
    #[serde(default)]
    pub tables: Vec<TableDescription>,
}

impl SchemaDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: TableDescription) -> Self {
        self.tables.push(table);
        self
    }

    pub fn find_table(&self, name: &str) -> Option<&TableDescription> {
        self.tables.iter().find(|t| t.name == name)
    }
}
