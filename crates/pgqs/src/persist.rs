//! Row persistence: insert, update, delete and batch save.
//!
//! Statements are derived from the column lists of [`Entity`]. None of the
//! operations open a transaction; pass a `tokio_postgres::Transaction` as the
//! client when several statements must commit together.

use crate::client::GenericClient;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::ident::push_quoted;

fn push_column_names(sql: &mut String, columns: &[&str]) {
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        push_quoted(sql, column);
    }
}

/// `INSERT INTO "t" ("a", "b") VALUES ($1, $2), … [RETURNING …]` for `rows` rows.
///
/// Tables without insert columns get `DEFAULT VALUES`, which only inserts a
/// single row.
pub fn insert_sql<E: Entity>(rows: usize) -> String {
    let mut sql = String::from("INSERT INTO ");
    push_quoted(&mut sql, E::TABLE);

    if E::INSERT_COLUMNS.is_empty() {
        sql.push_str(" DEFAULT VALUES");
    } else {
        sql.push_str(" (");
        push_column_names(&mut sql, E::INSERT_COLUMNS);
        sql.push_str(") VALUES ");

        let width = E::INSERT_COLUMNS.len();
        for row in 0..rows {
            if row > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for col in 0..width {
                if col > 0 {
                    sql.push_str(", ");
                }
                sql.push('$');
                sql.push_str(&(row * width + col + 1).to_string());
            }
            sql.push(')');
        }
    }

    if !E::RETURNING_COLUMNS.is_empty() {
        sql.push_str(" RETURNING ");
        push_column_names(&mut sql, E::RETURNING_COLUMNS);
    }
    sql
}

/// `UPDATE "t" SET "a" = $1, … WHERE "pk" = $n`, or `None` without updatable columns.
pub fn update_sql<E: Entity>() -> Option<String> {
    if E::UPDATE_COLUMNS.is_empty() {
        return None;
    }
    let mut sql = String::from("UPDATE ");
    push_quoted(&mut sql, E::TABLE);
    sql.push_str(" SET ");
    for (i, column) in E::UPDATE_COLUMNS.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        push_quoted(&mut sql, column);
        sql.push_str(&format!(" = ${}", i + 1));
    }
    sql.push_str(" WHERE ");
    push_quoted(&mut sql, E::PRIMARY_KEY);
    sql.push_str(&format!(" = ${}", E::UPDATE_COLUMNS.len() + 1));
    Some(sql)
}

/// `DELETE FROM "t" WHERE "pk" = $1`.
pub fn delete_sql<E: Entity>() -> String {
    let mut sql = String::from("DELETE FROM ");
    push_quoted(&mut sql, E::TABLE);
    sql.push_str(" WHERE ");
    push_quoted(&mut sql, E::PRIMARY_KEY);
    sql.push_str(" = $1");
    sql
}

/// Insert a new row, or update the stored one.
pub async fn save<E: Entity>(conn: &impl GenericClient, entity: &mut E) -> OrmResult<()> {
    if entity.exists_in_db() {
        update(conn, entity).await.map(|_| ())
    } else {
        insert(conn, entity).await
    }
}

/// Insert one row and read back its autogenerated columns.
///
/// Marks the entity persisted on success.
pub async fn insert<E: Entity>(conn: &impl GenericClient, entity: &mut E) -> OrmResult<()> {
    let sql = insert_sql::<E>(1);
    let params = entity.insert_values();

    if E::RETURNING_COLUMNS.is_empty() {
        conn.execute(&sql, &params).await?;
    } else {
        let row = conn.query_opt(&sql, &params).await?.ok_or_else(|| {
            OrmError::not_found(format!("INSERT INTO {} returned no row", E::TABLE))
        })?;
        entity.apply_returning(&row)?;
    }
    entity.set_exists_in_db(true);
    Ok(())
}

/// Write every updatable column of a stored row; returns the affected row count.
///
/// A table without updatable columns is left untouched.
pub async fn update<E: Entity>(conn: &impl GenericClient, entity: &E) -> OrmResult<u64> {
    let Some(sql) = update_sql::<E>() else {
        return Ok(0);
    };
    let mut params = entity.update_values();
    params.push(entity.pk_value());
    conn.execute(&sql, &params).await
}

/// Delete the row by primary key.
///
/// The entity is marked new again only when the store reports success, so a
/// failed delete can be retried with `save` semantics intact.
pub async fn delete<E: Entity>(conn: &impl GenericClient, entity: &mut E) -> OrmResult<u64> {
    let affected = conn.execute(&delete_sql::<E>(), &[entity.pk_value()]).await?;
    entity.set_exists_in_db(false);
    Ok(affected)
}

/// Save a batch: one UPDATE per stored row, then a single multi-row INSERT.
///
/// RETURNING rows are matched to the inserted entities by position, which
/// PostgreSQL guarantees for a single `INSERT … VALUES … RETURNING`. When the
/// store returns a different number of rows, the rows that did arrive are
/// applied and [`OrmError::RowCountMismatch`] is returned. The batch is not
/// atomic unless `conn` is a transaction.
pub async fn save_all<E: Entity>(conn: &impl GenericClient, entities: &mut [E]) -> OrmResult<()> {
    let mut updates = 0usize;
    for entity in entities.iter().filter(|e| e.exists_in_db()) {
        update(conn, entity).await?;
        updates += 1;
    }

    let mut pending: Vec<&mut E> = entities.iter_mut().filter(|e| !e.exists_in_db()).collect();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "pgqs.persist",
        table = E::TABLE,
        updates,
        inserts = pending.len(),
        "save_all"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = updates;

    if pending.is_empty() {
        return Ok(());
    }

    if E::INSERT_COLUMNS.is_empty() {
        for entity in pending {
            insert(conn, entity).await?;
        }
        return Ok(());
    }

    let sql = insert_sql::<E>(pending.len());
    let params: Vec<_> = pending.iter().flat_map(|e| e.insert_values()).collect();

    if E::RETURNING_COLUMNS.is_empty() {
        conn.execute(&sql, &params).await?;
        for entity in pending {
            entity.set_exists_in_db(true);
        }
        return Ok(());
    }

    let rows = conn.query(&sql, &params).await?;
    for (entity, row) in pending.iter_mut().zip(&rows) {
        entity.apply_returning(row)?;
        entity.set_exists_in_db(true);
    }
    if rows.len() != pending.len() {
        return Err(OrmError::RowCountMismatch {
            expected: pending.len(),
            actual: rows.len(),
        });
    }
    Ok(())
}
