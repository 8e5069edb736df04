//! Generic client trait for unified database access.

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// A trait that unifies database clients and transactions.
///
/// Every query set and persistence operation takes `&impl GenericClient`, so
/// the caller decides whether work runs on a bare connection, a pooled
/// connection or inside a transaction.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// Semantics:
    /// - 0 rows: returns `Ok(None)`
    /// - 1 or more rows: returns `Ok(Some(first_row))` (does **not** error)
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Return a cancellation token for the underlying connection, if supported.
    ///
    /// This enables best-effort server-side query cancellation in higher-level wrappers when a timeout triggers.
    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        None
    }
}

fn sql_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

fn decode_rows(rows: Vec<tokio_postgres::Row>) -> OrmResult<Vec<Row>> {
    rows.iter().map(Row::from_pg).collect()
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &sql_params(params))
            .await?;
        decode_rows(rows)
    }

    async fn query_opt(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &sql_params(params)).await?;
        rows.first().map(Row::from_pg).transpose()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, &sql_params(params)).await?)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        Some(tokio_postgres::Client::cancel_token(self))
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &sql_params(params))
            .await?;
        decode_rows(rows)
    }

    async fn query_opt(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Row>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &sql_params(params)).await?;
        rows.first().map(Row::from_pg).transpose()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        Ok(tokio_postgres::Transaction::execute(self, sql, &sql_params(params)).await?)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        Some(tokio_postgres::Transaction::cancel_token(self))
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        GenericClient::query(&**self, sql, params).await
    }

    async fn query_opt(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Row>> {
        GenericClient::query_opt(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        GenericClient::cancel_token(&**self)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        GenericClient::query(&**self, sql, params).await
    }

    async fn query_opt(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Row>> {
        GenericClient::query_opt(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        GenericClient::cancel_token(&**self)
    }
}
