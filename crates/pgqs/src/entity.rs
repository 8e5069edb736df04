//! The per-table entity contract implemented by `#[derive(Entity)]`.

use crate::error::OrmResult;
use crate::queryset::QuerySet;
use crate::row::{FromRow, Row};
use crate::value::{FromValue, IntoValue, Value};

/// Whether an entity instance corresponds to a stored row.
///
/// `new` on user construction, `persisted` after a row scan or a successful
/// insert. `save` branches on it: persisted rows are updated, new rows are
/// inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowState {
    persisted: bool,
}

impl RowState {
    /// State of a freshly constructed, never stored instance.
    pub const fn new() -> Self {
        Self { persisted: false }
    }

    /// State of an instance read from the store.
    pub const fn persisted() -> Self {
        Self { persisted: true }
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    #[doc(hidden)]
    pub fn mark(&mut self, persisted: bool) {
        self.persisted = persisted;
    }
}

/// A table-backed record type.
///
/// Column lists are in declaration order. `INSERT_COLUMNS` are the columns
/// the caller supplies (every column that is not autogenerated, including a
/// user-supplied primary key), `UPDATE_COLUMNS` exclude the primary key as
/// well, and `RETURNING_COLUMNS` are the autogenerated columns read back
/// after an insert.
pub trait Entity: FromRow + Send + Sync + Sized + 'static {
    /// Per-table query set wrapper (`PostQuery` for `Post`).
    type Query: From<QuerySet<Self>> + Into<QuerySet<Self>>;
    /// Rust type of the primary key.
    type PrimaryKey: IntoValue + FromValue + Clone + Send + Sync;

    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const PRIMARY_KEY: &'static str;
    const PRIMARY_KEY_AUTOGENERATED: bool;
    const INSERT_COLUMNS: &'static [&'static str];
    const UPDATE_COLUMNS: &'static [&'static str];
    const RETURNING_COLUMNS: &'static [&'static str];

    fn primary_key(&self) -> Self::PrimaryKey;

    fn pk_value(&self) -> Value {
        self.primary_key().into_value()
    }

    /// Values for `INSERT_COLUMNS`, in order.
    fn insert_values(&self) -> Vec<Value>;

    /// Values for `UPDATE_COLUMNS`, in order.
    fn update_values(&self) -> Vec<Value>;

    /// Store the `RETURNING_COLUMNS` of `row` into the instance.
    fn apply_returning(&mut self, row: &Row) -> OrmResult<()>;

    fn row_state(&self) -> RowState;

    fn row_state_mut(&mut self) -> &mut RowState;

    fn exists_in_db(&self) -> bool {
        self.row_state().is_persisted()
    }

    fn set_exists_in_db(&mut self, exists: bool) {
        self.row_state_mut().mark(exists);
    }

    /// An unfiltered query set over the table.
    fn query() -> Self::Query {
        QuerySet::new().into()
    }
}

/// Whether `columns` contains `name`. Usable in constants, so generated
/// `has_many` accessors can reject a missing foreign key column at compile
/// time.
#[doc(hidden)]
pub const fn has_column(columns: &[&str], name: &str) -> bool {
    let mut i = 0;
    while i < columns.len() {
        if str_eq(columns[i], name) {
            return true;
        }
        i += 1;
    }
    false
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}
