//! Bulk updates of the rows matched by a query set.

use std::fmt;
use std::marker::PhantomData;

use crate::chain::Chain;
use crate::client::GenericClient;
use crate::counter::PositionalCounter;
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::fragment::{write_where, Fragment};
use crate::ident::push_quoted;
use crate::value::{IntoValue, Value};

/// Assignments applied to the rows of a frozen condition set.
///
/// Created by [`QuerySet::update`](crate::QuerySet::update). Like query sets,
/// every `set` returns a new value.
pub struct UpdateSet<E> {
    conditions: Chain<Fragment>,
    assignments: Chain<Fragment>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for UpdateSet<E> {
    fn clone(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            assignments: self.assignments.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for UpdateSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateSet")
            .field("conditions", &self.conditions)
            .field("assignments", &self.assignments)
            .finish()
    }
}

impl<E> UpdateSet<E> {
    pub(crate) fn new(conditions: Chain<Fragment>) -> Self {
        Self {
            conditions,
            assignments: Chain::new(),
            _entity: PhantomData,
        }
    }

    /// `column = value`; a NULL value is written as a literal `NULL`.
    #[must_use]
    pub fn set(&self, column: &str, value: impl IntoValue) -> Self {
        let assignment = match value.into_value() {
            Value::Null => Fragment::assign_null(column),
            value => Fragment::compare(column, "=", value),
        };
        Self {
            assignments: self.assignments.push(assignment),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn set_null(&self, column: &str) -> Self {
        self.set(column, Value::Null)
    }

    pub fn has_assignments(&self) -> bool {
        !self.assignments.is_empty()
    }
}

impl<E: Entity> UpdateSet<E> {
    /// The UPDATE statement, or `None` when nothing is assigned.
    ///
    /// Assignments are numbered first, then the WHERE clause.
    pub fn to_sql(&self) -> Option<(String, Vec<Value>)> {
        if self.assignments.is_empty() {
            return None;
        }
        let mut sql = String::from("UPDATE ");
        push_quoted(&mut sql, E::TABLE);
        sql.push_str(" SET ");

        let mut counter = PositionalCounter::new();
        let mut params = Vec::new();
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            assignment.write(&mut counter, &mut sql, &mut params);
        }
        write_where(self.conditions.iter(), &mut counter, &mut sql, &mut params);
        Some((sql, params))
    }

    /// Run the update; returns the affected row count.
    ///
    /// With no assignments the store is not contacted and 0 is returned.
    pub async fn exec(&self, conn: &impl GenericClient) -> OrmResult<u64> {
        match self.to_sql() {
            Some((sql, params)) => conn.execute(&sql, &params).await,
            None => Ok(0),
        }
    }
}
