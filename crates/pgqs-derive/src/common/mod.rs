//! Helpers shared across the entity derive modules.

pub mod syn_types;
