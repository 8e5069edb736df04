//! Helpers behind the generated relation accessors.

use crate::client::GenericClient;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::queryset::QuerySet;
use crate::value::IntoValue;

/// Load the row of `R` whose primary key is `key`.
///
/// `None` (a NULL foreign key) resolves to `Ok(None)` without a query.
pub async fn fetch_related<R: Entity>(
    conn: &impl GenericClient,
    key: Option<R::PrimaryKey>,
) -> OrmResult<Option<R>> {
    let Some(key) = key else {
        return Ok(None);
    };
    QuerySet::<R>::new().eq(R::PRIMARY_KEY, key).first(conn).await
}

/// The primary key to store in a foreign key column referencing `related`.
///
/// Fails when `related` has an autogenerated key and was never saved, since
/// its key has no value yet.
pub fn related_key<R: Entity>(related: &R) -> OrmResult<R::PrimaryKey> {
    if R::PRIMARY_KEY_AUTOGENERATED && !related.exists_in_db() {
        return Err(OrmError::configuration(format!(
            "cannot reference an unsaved {} row: its primary key is generated on insert",
            R::TABLE
        )));
    }
    Ok(related.primary_key())
}

/// Rows of `E` whose `column` references `key`.
pub fn reverse<E: Entity>(column: &str, key: impl IntoValue) -> E::Query {
    QuerySet::<E>::new().eq(column, key).into()
}
