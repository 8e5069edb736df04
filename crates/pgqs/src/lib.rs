//! # pgqs
//!
//! Typed per-table query sets and persistence for PostgreSQL.
//!
//! ## Features
//!
//! - **Typed query sets**: `#[derive(Entity)]` generates a `XxxQuery` with one
//!   method per column and operator; a misspelled column is a compile error
//! - **Immutable builders**: every builder call returns a new value, so a base
//!   query can be refined in several directions
//! - **Positional parameters**: conditions compile to `$n` placeholders that
//!   stay consecutive through `OR` groups and subqueries
//! - **Persistence**: `save`, `delete` and batch `save_all` with `RETURNING`
//!   for autogenerated columns
//! - **Relations**: forward accessors for foreign keys and pre-filtered query
//!   sets for reverse relations
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//! - **Query monitoring**: timing, logging, stats and timeouts via `InstrumentedClient`
//!
//! ## Example
//!
//! ```ignore
//! use pgqs::prelude::*;
//!
//! #[derive(Debug, Entity)]
//! #[orm(table = "post")]
//! pub struct Post {
//!     #[orm(id, auto)]
//!     id: i64,
//!     #[orm(foreign_key = Author)]
//!     pub author_id: i64,
//!     pub title: String,
//!     pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
//!     state: RowState,
//! }
//!
//! let recent = Post::query()
//!     .deleted_at_is_null()
//!     .author_id_eq(&alice)?
//!     .order_by_id_desc()
//!     .all(&client)
//!     .await?;
//!
//! Post::query()
//!     .title_eq("draft")
//!     .update()
//!     .set_deleted_at(Some(chrono::Utc::now()))
//!     .exec(&client)
//!     .await?;
//! ```

pub mod chain;
pub mod client;
pub mod counter;
pub mod entity;
pub mod error;
pub mod fragment;
pub mod ident;
pub mod mock;
pub mod monitor;
pub mod persist;
pub mod prelude;
pub mod queryset;
pub mod relation;
pub mod row;
pub mod update;
pub mod value;

pub use client::GenericClient;
pub use counter::PositionalCounter;
pub use entity::{Entity, RowState};
pub use error::{OrmError, OrmResult};
pub use fragment::{Fragment, Subquery};
pub use monitor::{
    CompositeMonitor, InstrumentedClient, LoggingMonitor, MonitorConfig, NoopMonitor,
    QueryContext, QueryMonitor, QueryResult, QueryStats, QueryType, StatsMonitor,
};
#[cfg(feature = "tracing")]
pub use monitor::TracingMonitor;
pub use persist::{delete, insert, save, save_all, update};
pub use queryset::{LockMode, OrderTerm, QuerySet};
pub use row::{FromRow, Row};
pub use update::UpdateSet;
pub use value::{FromValue, IntoValue, Value, ValueError};

#[cfg(feature = "derive")]
pub use pgqs_derive::Entity;
