//! Statement monitoring and timeouts.
//!
//! [`InstrumentedClient`] wraps any [`GenericClient`](crate::GenericClient)
//! and reports every statement to a [`QueryMonitor`]. Query sets and
//! persistence functions accept the wrapper wherever they accept a client.
//!
//! # Example
//!
//! ```rust,ignore
//! use pgqs::monitor::{InstrumentedClient, MonitorConfig, StatsMonitor, TracingMonitor, CompositeMonitor};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let client = InstrumentedClient::new(db_client)
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_query_timeout(Duration::from_secs(30))
//!             .with_slow_query_threshold(Duration::from_millis(500))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor(CompositeMonitor::new().add(TracingMonitor::new()).add_arc(stats.clone()));
//!
//! let drafts = Post::query().published_eq(false).all(&client).await?;
//! println!("{:?}", stats.stats());
//! ```

mod config;
mod instrumented;
mod monitors;
mod types;

#[cfg(feature = "tracing")]
mod tracing_monitor;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;
pub use monitors::{CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};

#[cfg(feature = "tracing")]
pub use tracing_monitor::TracingMonitor;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
