//! Common imports for typical `pgqs` usage.
//!
//! ```ignore
//! use pgqs::prelude::*;
//! ```

pub use crate::{
    Entity, FromRow, GenericClient, OrmError, OrmResult, QuerySet, Row, RowState, UpdateSet, Value,
};
