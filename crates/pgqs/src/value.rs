//! Dynamically typed SQL values.
//!
//! [`Value`] is the single currency between builders, rows and the store:
//! compiled statements carry `Vec<Value>` parameters and decoded rows carry
//! `Value` cells. Typed fields convert through [`IntoValue`] / [`FromValue`].

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use fallible_iterator::FallibleIterator;
use postgres_protocol::types::{ArrayDimension, array_from_sql, array_to_sql};
use thiserror::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn std::error::Error + Sync + Send>;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    DateTime(DateTime<Utc>),
    Text(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short type name used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float64(_) => "float64",
            Self::DateTime(_) => "datetime",
            Self::Text(_) => "string",
            Self::Array(_) => "array",
        }
    }
}

/// A [`Value`] could not be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("unexpected NULL for non-optional {0}")]
    UnexpectedNull(&'static str),
    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
}

fn mismatch(expected: &'static str, found: &Value) -> ValueError {
    match found {
        Value::Null => ValueError::UnexpectedNull(expected),
        other => ValueError::TypeMismatch {
            expected,
            found: other.type_name(),
        },
    }
}

/// Conversion of a Rust value into a SQL [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion of a SQL [`Value`] into a Rust value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

macro_rules! scalar_value {
    ($ty:ty, $variant:ident) => {
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl IntoValue for &$ty {
            fn into_value(self) -> Value {
                Value::$variant(self.clone())
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

scalar_value!(bool, Bool);
scalar_value!(i32, Int32);
scalar_value!(i64, Int64);
scalar_value!(f64, Float64);
scalar_value!(DateTime<Utc>, DateTime);
scalar_value!(String, Text);

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl IntoValue for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::DateTime(self.and_utc())
    }
}

impl IntoValue for &NaiveDateTime {
    fn into_value(self) -> Value {
        Value::DateTime(self.and_utc())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: IntoValue + Clone> IntoValue for &Option<T> {
    fn into_value(self) -> Value {
        self.clone().into_value()
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue + Clone> IntoValue for &Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.iter().cloned().map(IntoValue::into_value).collect())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int32(v) => Ok(v),
            Value::Int64(v) => i32::try_from(v).map_err(|_| ValueError::OutOfRange {
                value: v.to_string(),
                target: "int32",
            }),
            other => Err(mismatch("int32", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int64(v) => Ok(v),
            Value::Int32(v) => Ok(i64::from(v)),
            other => Err(mismatch("int64", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float64(v) => Ok(v),
            other => Err(mismatch("float64", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::DateTime(v) => Ok(v),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        DateTime::<Utc>::from_value(value).map(|v| v.naive_utc())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("array", &other)),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int32(v) => match *ty {
                Type::INT8 => i64::from(*v).to_sql(ty, out),
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Int64(v) => match *ty {
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float64(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::DateTime(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Array(items) => match ty.kind() {
                Kind::Array(member) => {
                    encode_array(items, member, out)?;
                    Ok(IsNull::No)
                }
                _ => Err(format!("cannot encode an array as {ty}").into()),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Dimension lengths of a rectangular array, outermost first.
fn array_shape(items: &[Value]) -> Result<Vec<usize>, BoxError> {
    let mut shape = vec![items.len()];
    match items.first() {
        Some(Value::Array(first)) => {
            let inner = array_shape(first)?;
            for item in items {
                match item {
                    Value::Array(sub) if array_shape(sub)? == inner => {}
                    _ => return Err("multidimensional arrays must be rectangular".into()),
                }
            }
            shape.extend(inner);
        }
        _ if items.iter().any(|v| matches!(v, Value::Array(_))) => {
            return Err("multidimensional arrays must be rectangular".into());
        }
        _ => {}
    }
    Ok(shape)
}

fn flatten<'a>(items: &'a [Value], leaves: &mut Vec<&'a Value>) {
    for item in items {
        match item {
            Value::Array(sub) => flatten(sub, leaves),
            leaf => leaves.push(leaf),
        }
    }
}

/// Binary array encoding with one dimension per nesting level.
fn encode_array(items: &[Value], member: &Type, out: &mut BytesMut) -> Result<(), BoxError> {
    let shape = array_shape(items)?;
    // PostgreSQL stores any array without elements as zero-dimensional.
    let dimensions = if shape.contains(&0) {
        Vec::new()
    } else {
        shape
            .iter()
            .map(|len| -> Result<ArrayDimension, BoxError> {
                Ok(ArrayDimension {
                    len: i32::try_from(*len)?,
                    lower_bound: 1,
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut leaves = Vec::new();
    flatten(items, &mut leaves);
    array_to_sql(
        dimensions,
        member.oid(),
        leaves,
        |leaf, buf| match leaf.to_sql(member, buf)? {
            IsNull::No => Ok(postgres_protocol::IsNull::No),
            IsNull::Yes => Ok(postgres_protocol::IsNull::Yes),
        },
        out,
    )
}

fn decode_array(member: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    let array = array_from_sql(raw)?;
    let shape: Vec<usize> = array
        .dimensions()
        .map(|d| Ok(usize::try_from(d.len)?))
        .collect()?;
    let leaves: Vec<Value> = array
        .values()
        .map(|raw| Value::from_sql_nullable(member, raw))
        .collect()?;

    if shape.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    if leaves.len() != shape.iter().product::<usize>() {
        return Err("array element count does not match its dimensions".into());
    }
    Ok(nest(&shape, &mut leaves.into_iter()))
}

fn nest<I: Iterator<Item = Value>>(shape: &[usize], leaves: &mut I) -> Value {
    match shape {
        [] => Value::Array(Vec::new()),
        [len] => Value::Array(leaves.by_ref().take(*len).collect()),
        [len, rest @ ..] => Value::Array((0..*len).map(|_| nest(rest, leaves)).collect()),
    }
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::Int32(i16::from_sql(ty, raw)?.into()),
            Type::INT4 => Value::Int32(i32::from_sql(ty, raw)?),
            Type::INT8 => Value::Int64(i64::from_sql(ty, raw)?),
            Type::FLOAT4 => Value::Float64(f32::from_sql(ty, raw)?.into()),
            Type::FLOAT8 => Value::Float64(f64::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::DateTime(DateTime::<Utc>::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::DateTime(NaiveDateTime::from_sql(ty, raw)?.and_utc()),
            Type::DATE => Value::DateTime(
                NaiveDate::from_sql(ty, raw)?
                    .and_time(NaiveTime::MIN)
                    .and_utc(),
            ),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                Value::Text(String::from_sql(ty, raw)?)
            }
            _ => match ty.kind() {
                Kind::Array(member) => decode_array(member, raw)?,
                _ => return Err(format!("unsupported column type {ty}").into()),
            },
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(ty: &Type) -> bool {
        match ty.kind() {
            Kind::Array(member) => <Value as FromSql>::accepts(member),
            _ => matches!(
                *ty,
                Type::BOOL
                    | Type::INT2
                    | Type::INT4
                    | Type::INT8
                    | Type::FLOAT4
                    | Type::FLOAT8
                    | Type::TIMESTAMPTZ
                    | Type::TIMESTAMP
                    | Type::DATE
                    | Type::TEXT
                    | Type::VARCHAR
                    | Type::BPCHAR
                    | Type::NAME
            ),
        }
    }
}
