//! Schema descriptions for pgqs.
//!
//! A [`SchemaDescription`] lists tables, their typed columns, primary keys,
//! autogenerated columns, foreign keys and reverse relations. It can be built
//! in code, loaded from TOML or JSON, and resolved into an immutable
//! [`SchemaGraph`] with foreign keys and reverse relations cross-checked.
//!
//! `#[derive(Entity)]` does not read a graph: it describes one struct at a
//! time and runs each field through the [`TypeMapper`] alone. The graph
//! serves callers that start from a whole-schema description file.
//!
//! ```
//! use pgqs_schema::{ColumnDescription, DomainType, SchemaDescription, TableDescription};
//!
//! let schema = SchemaDescription::new().table(
//!     TableDescription::new("author")
//!         .column(ColumnDescription::new("id", DomainType::Int64).primary_key().autogenerated())
//!         .column(ColumnDescription::new("name", DomainType::String)),
//! );
//! let graph = schema.resolve().unwrap();
//! assert_eq!(graph.table("author").unwrap().insert_columns(), ["name"]);
//! ```

mod config;
pub mod description;
pub mod error;
pub mod graph;
pub mod naming;
pub mod type_mapper;

pub use config::Format;
pub use description::{
    ColumnDescription, DomainType, ForeignKeyTarget, ReverseRelation, SchemaDescription,
    TableDescription,
};
pub use error::{SchemaError, SchemaResult};
pub use graph::{ResolvedReverseRelation, ResolvedTable, SchemaGraph};
pub use type_mapper::{
    Accessor, ForeignKeyScope, ForeignRepresentation, Representation, RustType, TypeMapper,
};
