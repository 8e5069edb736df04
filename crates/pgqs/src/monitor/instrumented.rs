use super::config::MonitorConfig;
use super::monitors::NoopMonitor;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wraps any [`GenericClient`] with monitoring and an optional per-statement
/// timeout.
///
/// Monitors only receive events once monitoring is enabled through the
/// [`MonitorConfig`]; the timeout applies either way.
pub struct InstrumentedClient<C> {
    client: C,
    monitor: Arc<dyn QueryMonitor>,
    config: MonitorConfig,
    tag: Option<String>,
}

impl<C: GenericClient> InstrumentedClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            monitor: Arc::new(NoopMonitor),
            config: MonitorConfig::default(),
            tag: None,
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Label attached to the context of every statement.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = Some(timeout);
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = true;
        self
    }

    pub fn disable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = false;
        self
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn context(&self, sql: &str, param_count: usize) -> QueryContext {
        let ctx = QueryContext::new(sql, param_count);
        match &self.tag {
            Some(tag) => ctx.with_tag(tag.clone()),
            None => ctx,
        }
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if !self.config.monitoring_enabled {
            return;
        }
        self.monitor.on_query_complete(ctx, duration, result);
        if self
            .config
            .slow_query_threshold
            .is_some_and(|threshold| duration > threshold)
        {
            self.monitor.on_slow_query(ctx, duration);
        }
    }

    async fn execute_with_timeout<T, F>(&self, future: F) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>> + Send,
    {
        let Some(timeout) = self.config.query_timeout else {
            return future.await;
        };
        tokio::pin!(future);
        tokio::select! {
            result = &mut future => result,
            _ = tokio::time::sleep(timeout) => {
                if let Some(cancel_token) = self.client.cancel_token() {
                    tokio::spawn(async move {
                        let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                    });
                }
                Err(OrmError::Timeout(timeout))
            }
        }
    }

    /// Run `future` as the statement described by `ctx`, reporting its outcome.
    async fn instrument<T, F>(
        &self,
        ctx: QueryContext,
        future: F,
        summarize: impl Fn(&T) -> QueryResult,
    ) -> OrmResult<T>
    where
        F: Future<Output = OrmResult<T>> + Send,
    {
        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = self.execute_with_timeout(future).await;
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(value) => summarize(value),
            Err(OrmError::Timeout(d)) => QueryResult::Error(format!("timeout after {d:?}")),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report_result(&ctx, duration, &query_result);
        result
    }
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let ctx = self.context(sql, params.len());
        self.instrument(ctx, self.client.query(sql, params), |rows| {
            QueryResult::Rows(rows.len())
        })
        .await
    }

    async fn query_opt(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Row>> {
        let ctx = self.context(sql, params.len());
        self.instrument(ctx, self.client.query_opt(sql, params), |row| {
            QueryResult::OptionalRow(row.is_some())
        })
        .await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let ctx = self.context(sql, params.len());
        self.instrument(ctx, self.client.execute(sql, params), |n| {
            QueryResult::Affected(*n)
        })
        .await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        self.client.cancel_token()
    }
}
