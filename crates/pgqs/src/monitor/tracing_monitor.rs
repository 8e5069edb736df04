use super::truncate_sql_bytes;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use std::time::Duration;
use tracing::Level;

/// Emits statement events through `tracing` under the `pgqs.sql` target.
///
/// Starts and completions are emitted at the configured level; slow
/// statements and failures at `WARN`.
///
/// Enable via the crate feature: `pgqs = { features = ["tracing"] }`.
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    pub level: Level,
    /// Truncate SQL longer than this many bytes. `None` disables truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

impl QueryMonitor for TracingMonitor {
    fn on_query_start(&self, ctx: &QueryContext) {
        let tag = ctx.tag.as_deref().unwrap_or("-");
        emit_at_level!(
            self.level,
            target: "pgqs.sql",
            query_type = ?ctx.query_type,
            tag,
            param_count = ctx.param_count,
            sql = %self.truncate_sql(&ctx.sql),
            "query start"
        );
    }

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let tag = ctx.tag.as_deref().unwrap_or("-");
        if let QueryResult::Error(message) = result {
            tracing::warn!(
                target: "pgqs.sql",
                query_type = ?ctx.query_type,
                tag,
                ?duration,
                error = %message,
                sql = %self.truncate_sql(&ctx.sql),
                "query failed"
            );
            return;
        }
        emit_at_level!(
            self.level,
            target: "pgqs.sql",
            query_type = ?ctx.query_type,
            tag,
            ?duration,
            result = %result,
            "query complete"
        );
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        tracing::warn!(
            target: "pgqs.sql",
            query_type = ?ctx.query_type,
            ?duration,
            sql = %self.truncate_sql(&ctx.sql),
            "slow query"
        );
    }
}
