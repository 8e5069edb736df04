//! Immutable, composable query sets.
//!
//! A [`QuerySet`] is a table-typed bundle of AND-ed conditions, order terms
//! and a lock mode. Every builder call returns a new value sharing its
//! parent's state, so a base query can be refined in several directions:
//!
//! ```ignore
//! let live = Post::query().deleted_at_is_null();
//! let mine = live.author_id_eq(&me)?;
//! let recent = live.order_by_created_at_desc();
//! ```
//!
//! The derive generates a per-table wrapper (`PostQuery`) with one method per
//! column; this type carries the table-independent half.

use std::fmt;
use std::marker::PhantomData;

use crate::chain::Chain;
use crate::client::GenericClient;
use crate::counter::PositionalCounter;
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::fragment::{write_where, Fragment, Subquery};
use crate::ident::{column_list, push_quoted};
use crate::row::FromRow;
use crate::update::UpdateSet;
use crate::value::{IntoValue, Value};

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderTerm {
    Column { column: String, descending: bool },
    Random,
}

impl OrderTerm {
    fn write(&self, sql: &mut String) {
        match self {
            OrderTerm::Column { column, descending } => {
                push_quoted(sql, column);
                if *descending {
                    sql.push_str(" DESC");
                }
            }
            OrderTerm::Random => sql.push_str("random()"),
        }
    }
}

/// Row locking applied to SELECTs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockMode {
    #[default]
    None,
    ForUpdate,
    ForUpdateNowait,
    ForUpdateSkipLocked,
}

impl LockMode {
    pub fn clause(self) -> &'static str {
        match self {
            LockMode::None => "",
            LockMode::ForUpdate => " FOR UPDATE",
            LockMode::ForUpdateNowait => " FOR UPDATE NOWAIT",
            LockMode::ForUpdateSkipLocked => " FOR UPDATE SKIP LOCKED",
        }
    }
}

/// A query over the rows of `E`'s table.
pub struct QuerySet<E> {
    conditions: Chain<Fragment>,
    order: Chain<OrderTerm>,
    lock: LockMode,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for QuerySet<E> {
    fn clone(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            order: self.order.clone(),
            lock: self.lock,
            _entity: PhantomData,
        }
    }
}

impl<E> Default for QuerySet<E> {
    fn default() -> Self {
        Self {
            conditions: Chain::new(),
            order: Chain::new(),
            lock: LockMode::None,
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for QuerySet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("conditions", &self.conditions)
            .field("order", &self.order)
            .field("lock", &self.lock)
            .finish()
    }
}

impl<E> QuerySet<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conditions accumulated so far, in insertion order.
    pub fn conditions(&self) -> impl ExactSizeIterator<Item = &Fragment> {
        self.conditions.iter()
    }

    pub fn lock_mode(&self) -> LockMode {
        self.lock
    }

    fn with_condition(&self, fragment: Fragment) -> Self {
        Self {
            conditions: self.conditions.push(fragment),
            ..self.clone()
        }
    }

    fn with_order(&self, term: OrderTerm) -> Self {
        Self {
            order: self.order.push(term),
            ..self.clone()
        }
    }

    fn with_lock(&self, lock: LockMode) -> Self {
        Self { lock, ..self.clone() }
    }

    /// Add an arbitrary condition.
    #[must_use]
    pub fn filter(&self, fragment: Fragment) -> Self {
        self.with_condition(fragment)
    }

    #[must_use]
    pub fn eq(&self, column: &str, value: impl IntoValue) -> Self {
        self.filter(Fragment::compare(column, "=", value.into_value()))
    }

    #[must_use]
    pub fn ne(&self, column: &str, value: impl IntoValue) -> Self {
        self.filter(Fragment::compare(column, "!=", value.into_value()))
    }

    #[must_use]
    pub fn lt(&self, column: &str, value: impl IntoValue) -> Self {
        self.filter(Fragment::compare(column, "<", value.into_value()))
    }

    #[must_use]
    pub fn le(&self, column: &str, value: impl IntoValue) -> Self {
        self.filter(Fragment::compare(column, "<=", value.into_value()))
    }

    #[must_use]
    pub fn gt(&self, column: &str, value: impl IntoValue) -> Self {
        self.filter(Fragment::compare(column, ">", value.into_value()))
    }

    #[must_use]
    pub fn ge(&self, column: &str, value: impl IntoValue) -> Self {
        self.filter(Fragment::compare(column, ">=", value.into_value()))
    }

    #[must_use]
    pub fn is_null(&self, column: &str) -> Self {
        self.filter(Fragment::is_null(column))
    }

    #[must_use]
    pub fn is_not_null(&self, column: &str) -> Self {
        self.filter(Fragment::is_not_null(column))
    }

    /// `column IN (…)`; an empty list matches nothing.
    #[must_use]
    pub fn in_list<I>(&self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoValue,
    {
        self.filter(Fragment::InList {
            column: column.to_string(),
            values: values.into_iter().map(IntoValue::into_value).collect(),
            negate: false,
        })
    }

    /// `column NOT IN (…)`; an empty list matches everything.
    #[must_use]
    pub fn not_in<I>(&self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoValue,
    {
        self.filter(Fragment::InList {
            column: column.to_string(),
            values: values.into_iter().map(IntoValue::into_value).collect(),
            negate: true,
        })
    }

    /// `column IN (SELECT pk FROM related WHERE …)`.
    ///
    /// Order terms and lock mode of `related` are ignored.
    #[must_use]
    pub fn in_subquery<R: Entity>(&self, column: &str, related: impl Into<QuerySet<R>>) -> Self {
        let related = related.into();
        self.filter(Fragment::InSubquery {
            column: column.to_string(),
            subquery: related.subquery(),
        })
    }

    /// Append one disjunction whose groups are the condition lists of `groups`.
    ///
    /// A group without conditions compiles to `true`, so
    /// `q.or([Post::query()])` keeps every row of `q`.
    #[must_use]
    pub fn or<I>(&self, groups: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<QuerySet<E>>,
    {
        let groups = groups
            .into_iter()
            .map(|g| g.into().conditions.iter().cloned().collect())
            .collect();
        self.filter(Fragment::Or(groups))
    }

    #[must_use]
    pub fn order_by(&self, column: &str) -> Self {
        self.with_order(OrderTerm::Column {
            column: column.to_string(),
            descending: false,
        })
    }

    #[must_use]
    pub fn order_by_desc(&self, column: &str) -> Self {
        self.with_order(OrderTerm::Column {
            column: column.to_string(),
            descending: true,
        })
    }

    #[must_use]
    pub fn order_by_random(&self) -> Self {
        self.with_order(OrderTerm::Random)
    }

    #[must_use]
    pub fn for_update(&self) -> Self {
        self.with_lock(LockMode::ForUpdate)
    }

    #[must_use]
    pub fn for_update_nowait(&self) -> Self {
        self.with_lock(LockMode::ForUpdateNowait)
    }

    #[must_use]
    pub fn for_update_skip_locked(&self) -> Self {
        self.with_lock(LockMode::ForUpdateSkipLocked)
    }

    #[must_use]
    pub fn clear_for_update(&self) -> Self {
        self.with_lock(LockMode::None)
    }

    fn write_order(&self, sql: &mut String) {
        if self.order.is_empty() {
            return;
        }
        sql.push_str(" ORDER BY ");
        for (i, term) in self.order.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            term.write(sql);
        }
    }
}

impl<E: Entity> QuerySet<E> {
    /// The primary keys of the matched rows, for embedding in another query.
    pub fn subquery(&self) -> Subquery {
        Subquery {
            table: E::TABLE,
            column: E::PRIMARY_KEY,
            conditions: self.conditions.iter().cloned().collect(),
        }
    }

    fn select_sql(&self, limit_one: bool) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        sql.push_str(&column_list(E::COLUMNS));
        sql.push_str(" FROM ");
        push_quoted(&mut sql, E::TABLE);

        let mut counter = PositionalCounter::new();
        let mut params = Vec::new();
        write_where(self.conditions.iter(), &mut counter, &mut sql, &mut params);
        self.write_order(&mut sql);
        if limit_one {
            sql.push_str(" LIMIT 1");
        }
        sql.push_str(self.lock.clause());
        (sql, params)
    }

    /// Statement run by [`all`](Self::all).
    pub fn to_select_sql(&self) -> (String, Vec<Value>) {
        self.select_sql(false)
    }

    /// Statement run by [`first`](Self::first).
    pub fn to_first_sql(&self) -> (String, Vec<Value>) {
        self.select_sql(true)
    }

    /// Statement run by [`count`](Self::count). Order and lock are dropped.
    pub fn to_count_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT COUNT(");
        push_quoted(&mut sql, E::PRIMARY_KEY);
        sql.push_str(") FROM ");
        push_quoted(&mut sql, E::TABLE);

        let mut counter = PositionalCounter::new();
        let mut params = Vec::new();
        write_where(self.conditions.iter(), &mut counter, &mut sql, &mut params);
        (sql, params)
    }

    /// Statement run by [`delete`](Self::delete).
    pub fn to_delete_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("DELETE FROM ");
        push_quoted(&mut sql, E::TABLE);

        let mut counter = PositionalCounter::new();
        let mut params = Vec::new();
        write_where(self.conditions.iter(), &mut counter, &mut sql, &mut params);
        (sql, params)
    }

    /// Number of matching rows.
    pub async fn count(&self, conn: &impl GenericClient) -> OrmResult<i64> {
        let (sql, params) = self.to_count_sql();
        match conn.query_opt(&sql, &params).await? {
            Some(row) => row.get(0),
            None => Ok(0),
        }
    }

    /// Every matching row, in the store's order unless ordered explicitly.
    pub async fn all(&self, conn: &impl GenericClient) -> OrmResult<Vec<E>> {
        let (sql, params) = self.to_select_sql();
        let rows = conn.query(&sql, &params).await?;
        rows.iter().map(E::from_row).collect()
    }

    /// The first matching row; `Ok(None)` when nothing matches.
    pub async fn first(&self, conn: &impl GenericClient) -> OrmResult<Option<E>> {
        let (sql, params) = self.to_first_sql();
        conn.query_opt(&sql, &params)
            .await?
            .as_ref()
            .map(E::from_row)
            .transpose()
    }

    /// Delete every matching row; returns the affected row count.
    pub async fn delete(&self, conn: &impl GenericClient) -> OrmResult<u64> {
        let (sql, params) = self.to_delete_sql();
        conn.execute(&sql, &params).await
    }

    /// Start a bulk update of the matching rows.
    pub fn update(&self) -> UpdateSet<E> {
        UpdateSet::new(self.conditions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::RowState;
    use crate::row::Row;

    #[derive(Debug)]
    struct Thing {
        id: i64,
        name: String,
        deleted_at: Option<chrono::DateTime<chrono::Utc>>,
        state: RowState,
    }

    impl FromRow for Thing {
        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.get(0)?,
                name: row.get(1)?,
                deleted_at: row.get(2)?,
                state: RowState::persisted(),
            })
        }
    }

    impl Entity for Thing {
        type Query = QuerySet<Thing>;
        type PrimaryKey = i64;

        const TABLE: &'static str = "t";
        const COLUMNS: &'static [&'static str] = &["id", "name", "deleted_at"];
        const PRIMARY_KEY: &'static str = "id";
        const PRIMARY_KEY_AUTOGENERATED: bool = true;
        const INSERT_COLUMNS: &'static [&'static str] = &["name", "deleted_at"];
        const UPDATE_COLUMNS: &'static [&'static str] = &["name", "deleted_at"];
        const RETURNING_COLUMNS: &'static [&'static str] = &["id"];

        fn primary_key(&self) -> i64 {
            self.id
        }

        fn insert_values(&self) -> Vec<Value> {
            vec![(&self.name).into_value(), (&self.deleted_at).into_value()]
        }

        fn update_values(&self) -> Vec<Value> {
            self.insert_values()
        }

        fn apply_returning(&mut self, row: &Row) -> OrmResult<()> {
            self.id = row.get(0)?;
            Ok(())
        }

        fn row_state(&self) -> RowState {
            self.state
        }

        fn row_state_mut(&mut self) -> &mut RowState {
            &mut self.state
        }
    }

    fn q() -> QuerySet<Thing> {
        QuerySet::new()
    }

    #[test]
    fn select_with_conditions_and_order() {
        let (sql, params) = q()
            .eq("name", "x")
            .is_null("deleted_at")
            .order_by_desc("id")
            .to_select_sql();
        assert_eq!(
            sql,
            r#"SELECT "id","name","deleted_at" FROM "t" WHERE "name" = $1 AND "deleted_at" IS NULL ORDER BY "id" DESC"#
        );
        assert_eq!(params, [Value::from("x")]);
    }

    #[test]
    fn unfiltered_select_has_no_where() {
        assert_eq!(
            q().to_select_sql().0,
            r#"SELECT "id","name","deleted_at" FROM "t""#
        );
    }

    #[test]
    fn siblings_are_independent() {
        let base = q().eq("name", "x");
        let a = base.gt("id", 1_i64);
        let b = base.order_by_random().for_update();

        assert_eq!(base.conditions().len(), 1);
        assert_eq!(a.conditions().len(), 2);
        assert_eq!(b.conditions().len(), 1);
        assert_eq!(base.lock_mode(), LockMode::None);
        assert_eq!(
            b.to_select_sql().0,
            r#"SELECT "id","name","deleted_at" FROM "t" WHERE "name" = $1 ORDER BY random() FOR UPDATE"#
        );
    }

    #[test]
    fn first_limits_before_locking() {
        let (sql, _) = q()
            .order_by("name")
            .order_by_desc("id")
            .for_update_skip_locked()
            .to_first_sql();
        assert_eq!(
            sql,
            r#"SELECT "id","name","deleted_at" FROM "t" ORDER BY "name", "id" DESC LIMIT 1 FOR UPDATE SKIP LOCKED"#
        );
    }

    #[test]
    fn last_lock_mode_wins() {
        let query = q().for_update().for_update_nowait();
        assert_eq!(query.lock_mode(), LockMode::ForUpdateNowait);
        assert_eq!(query.clear_for_update().lock_mode(), LockMode::None);
    }

    #[test]
    fn or_groups_each_query_set() {
        let (sql, params) = q()
            .eq("name", "a")
            .or([q().gt("id", 5_i64), q().lt("id", 2_i64).is_not_null("deleted_at")])
            .to_count_sql();
        assert_eq!(
            sql,
            r#"SELECT COUNT("id") FROM "t" WHERE "name" = $1 AND ("id" > $2 OR ("id" < $3 AND "deleted_at" IS NOT NULL))"#
        );
        assert_eq!(
            params,
            [Value::from("a"), Value::Int64(5), Value::Int64(2)]
        );
    }

    #[test]
    fn empty_in_lists_are_guarded() {
        let (sql, params) = q()
            .in_list("id", Vec::<i64>::new())
            .not_in("name", Vec::<String>::new())
            .to_delete_sql();
        assert_eq!(sql, r#"DELETE FROM "t" WHERE false AND true"#);
        assert!(params.is_empty());
    }

    #[test]
    fn subquery_shares_numbering() {
        let inner = q().eq("name", "inner");
        let (sql, params) = q()
            .ne("name", "outer")
            .in_subquery::<Thing>("id", inner)
            .le("id", 10_i64)
            .to_select_sql();
        assert_eq!(
            sql,
            r#"SELECT "id","name","deleted_at" FROM "t" WHERE "name" != $1 AND "id" IN (SELECT "id" FROM "t" WHERE "name" = $2) AND "id" <= $3"#
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn count_and_delete_ignore_order_and_lock() {
        let query = q().ge("id", 3_i64).order_by("name").for_update();
        assert_eq!(
            query.to_count_sql().0,
            r#"SELECT COUNT("id") FROM "t" WHERE "id" >= $1"#
        );
        assert_eq!(query.to_delete_sql().0, r#"DELETE FROM "t" WHERE "id" >= $1"#);
    }

    #[test]
    fn update_numbers_assignments_first() {
        let (sql, params) = q().eq("id", 5_i64).update().set("name", "y").to_sql().unwrap();
        assert_eq!(sql, r#"UPDATE "t" SET "name" = $1 WHERE "id" = $2"#);
        assert_eq!(params, [Value::from("y"), Value::Int64(5)]);
    }

    #[test]
    fn update_keeps_the_conditions_frozen() {
        let base = q().is_null("deleted_at");
        let update = base.update().set_null("name");
        let _later = base.eq("id", 1_i64);

        assert!(update.has_assignments());
        assert!(!base.update().has_assignments());
        assert_eq!(
            update.to_sql().unwrap(),
            (r#"UPDATE "t" SET "name" = NULL WHERE "deleted_at" IS NULL"#.to_string(), vec![])
        );
    }
}
