//! Decoded rows and row mapping.

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use tokio_postgres::types::{FromSql, Type};

/// A result row: column names plus one [`Value`] per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row; missing trailing column names are left empty.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        let mut columns = columns;
        columns.resize(values.len(), String::new());
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Raw value at `idx`.
    pub fn value(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    fn column_label(&self, idx: usize) -> String {
        match self.columns.get(idx) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("#{idx}"),
        }
    }

    /// Typed value at position `idx`.
    pub fn get<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let Some(value) = self.values.get(idx) else {
            return Err(OrmError::decode(
                format!("#{idx}"),
                format!("row has only {} columns", self.values.len()),
            ));
        };
        T::from_value(value.clone()).map_err(|e| OrmError::decode(self.column_label(idx), e.to_string()))
    }

    /// Typed value of the column named `column`.
    pub fn get_named<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        match self.columns.iter().position(|c| c == column) {
            Some(idx) => self.get(idx),
            None => Err(OrmError::decode(column, "no such column in row")),
        }
    }

    /// Decode a `tokio_postgres` row by its column types.
    pub fn from_pg(row: &tokio_postgres::Row) -> OrmResult<Self> {
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (idx, column) in row.columns().iter().enumerate() {
            values.push(decode_cell(row, idx, column.name(), column.type_())?);
            columns.push(column.name().to_string());
        }
        Ok(Self { columns, values })
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(Vec::new(), values)
    }
}

impl TryFrom<&tokio_postgres::Row> for Row {
    type Error = OrmError;

    fn try_from(row: &tokio_postgres::Row) -> OrmResult<Self> {
        Self::from_pg(row)
    }
}

fn decode_cell(row: &tokio_postgres::Row, idx: usize, name: &str, ty: &Type) -> OrmResult<Value> {
    if !<Value as FromSql>::accepts(ty) {
        return Err(OrmError::decode(
            name,
            format!("unsupported column type {ty}"),
        ));
    }
    row.try_get::<_, Value>(idx)
        .map_err(|e| OrmError::decode(name, e.to_string()))
}

/// Trait for converting a decoded row into a Rust struct.
///
/// Generated by `#[derive(Entity)]`; columns are read by position, in the
/// order of the entity's select list.
pub trait FromRow: Sized {
    /// Convert a row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}
