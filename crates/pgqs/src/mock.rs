//! In-memory [`GenericClient`] for tests.
//!
//! `MockClient` records every statement it receives and answers from a FIFO
//! script of responses. When the script is empty, queries return no rows and
//! executes affect 0 rows.
//!
//! ```
//! use pgqs::mock::MockClient;
//! use pgqs::{GenericClient, Row, Value};
//!
//! # tokio_test_block_on(async {
//! let client = MockClient::new();
//! client.push_rows(vec![Row::from_pairs([("n", Value::Int64(3))])]);
//!
//! let rows = client.query("SELECT 3 AS n", &[]).await.unwrap();
//! assert_eq!(rows[0].get::<i64>(0).unwrap(), 3);
//! assert_eq!(client.statements()[0].sql, "SELECT 3 AS n");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;

/// A scripted answer to the next statement.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Rows for a query; an execute reports their count as affected.
    Rows(Vec<Row>),
    /// Affected count for an execute; a query gets no rows.
    Affected(u64),
    /// Fail the statement with [`OrmError::Other`].
    Error(String),
}

/// A statement received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct MockClient {
    responses: Mutex<VecDeque<MockResponse>>,
    statements: Mutex<Vec<RecordedStatement>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: MockResponse) -> &Self {
        lock(&self.responses).push_back(response);
        self
    }

    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.push(MockResponse::Rows(rows))
    }

    pub fn push_affected(&self, affected: u64) -> &Self {
        self.push(MockResponse::Affected(affected))
    }

    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.push(MockResponse::Error(message.into()))
    }

    /// Every statement received so far, oldest first.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        lock(&self.statements).clone()
    }

    pub fn last_statement(&self) -> Option<RecordedStatement> {
        lock(&self.statements).last().cloned()
    }

    /// Scripted responses not consumed yet.
    pub fn pending_responses(&self) -> usize {
        lock(&self.responses).len()
    }

    pub fn clear(&self) {
        lock(&self.statements).clear();
        lock(&self.responses).clear();
    }

    fn record(&self, sql: &str, params: &[Value]) -> Option<MockResponse> {
        lock(&self.statements).push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        lock(&self.responses).pop_front()
    }
}

impl GenericClient for MockClient {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        match self.record(sql, params) {
            Some(MockResponse::Rows(rows)) => Ok(rows),
            Some(MockResponse::Affected(_)) | None => Ok(Vec::new()),
            Some(MockResponse::Error(message)) => Err(OrmError::Other(message)),
        }
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        match self.record(sql, params) {
            Some(MockResponse::Affected(n)) => Ok(n),
            Some(MockResponse::Rows(rows)) => Ok(rows.len() as u64),
            Some(MockResponse::Error(message)) => Err(OrmError::Other(message)),
            None => Ok(0),
        }
    }
}
