use std::time::Duration;

/// Configuration for statement monitoring and timeouts.
///
/// Monitoring is off by default and must be enabled explicitly.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Per-statement timeout. `None` means no timeout (default).
    pub query_timeout: Option<Duration>,
    /// Statements slower than this trigger `on_slow_query`.
    pub slow_query_threshold: Option<Duration>,
    /// Whether monitors receive events.
    pub monitoring_enabled: bool,
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements exceeding `timeout` are abandoned with [`OrmError::Timeout`]
    /// and a best-effort server-side cancel is sent.
    ///
    /// [`OrmError::Timeout`]: crate::OrmError::Timeout
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.monitoring_enabled = true;
        self
    }

    pub fn disable_monitoring(mut self) -> Self {
        self.monitoring_enabled = false;
        self
    }
}
