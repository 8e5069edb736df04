//! The validated, immutable schema graph.
//!
//! A [`SchemaGraph`] is built once from a [`SchemaDescription`] and a
//! generation set. Every cross-table decision (foreign-key collapse, dropped
//! columns, reverse relations) is made during resolution, so later consumers
//! only read resolved tables.

use crate::description::{ColumnDescription, SchemaDescription, TableDescription};
use crate::error::{SchemaError, SchemaResult};
use crate::naming::{pluralize, sanitize_field_ident, struct_name};
use crate::type_mapper::{ForeignKeyScope, Representation, TypeMapper};
use std::collections::{BTreeSet, HashMap};

/// A reverse (one-to-many) relation whose owner table is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReverseRelation {
    pub owner_table: String,
    pub owner_struct: String,
    pub owner_column: String,
    /// Accessor method name on the referenced entity.
    pub method: String,
}

/// One generated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub name: String,
    pub struct_name: String,
    pub query_name: String,
    pub update_name: String,
    /// Kept columns in declaration order.
    pub fields: Vec<Representation>,
    /// Index of the primary key in `fields`.
    pub primary_key: usize,
    pub reverse_relations: Vec<ResolvedReverseRelation>,
    /// Columns the type mapper dropped.
    pub dropped: Vec<String>,
}

impl ResolvedTable {
    pub fn primary_key(&self) -> &Representation {
        &self.fields[self.primary_key]
    }

    pub fn field(&self, column: &str) -> Option<&Representation> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Every kept column, in declaration order.
    pub fn select_columns(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column.as_str()).collect()
    }

    /// Columns supplied by the caller on INSERT.
    pub fn insert_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.is_hidden())
            .map(|f| f.column.as_str())
            .collect()
    }

    /// Columns written by the keyed UPDATE of a persisted row.
    pub fn update_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(i, f)| *i != self.primary_key && !f.is_hidden())
            .map(|(_, f)| f.column.as_str())
            .collect()
    }

    /// Autogenerated columns read back after INSERT.
    pub fn returning_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_hidden())
            .map(|f| f.column.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaGraph {
    tables: Vec<ResolvedTable>,
}

impl SchemaGraph {
    /// Resolve every table of `desc`.
    pub fn resolve(desc: &SchemaDescription) -> SchemaResult<Self> {
        let all: Vec<&str> = desc.tables.iter().map(|t| t.name.as_str()).collect();
        Self::resolve_subset(desc, &all)
    }

    /// Resolve the tables named in `generate`; other tables are only used as
    /// reference targets.
    pub fn resolve_subset(desc: &SchemaDescription, generate: &[&str]) -> SchemaResult<Self> {
        let mut by_name: HashMap<&str, &TableDescription> = HashMap::new();
        for t in &desc.tables {
            if by_name.insert(t.name.as_str(), t).is_some() {
                return Err(SchemaError::DuplicateTable(t.name.clone()));
            }
            t.validate()?;
        }

        let mut generated = BTreeSet::new();
        for name in generate {
            if !by_name.contains_key(name) {
                return Err(SchemaError::UnknownTable {
                    table: name.to_string(),
                    referenced_from: "generation set".to_string(),
                });
            }
            generated.insert(*name);
        }

        let mapper = TypeMapper::new(desc.types.clone())?;
        let mut tables = Vec::with_capacity(generated.len());
        for t in desc.tables.iter().filter(|t| generated.contains(t.name.as_str())) {
            tables.push(resolve_table(t, &by_name, &generated, &mapper)?);
        }

        Ok(Self { tables })
    }

    pub fn tables(&self) -> &[ResolvedTable] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&ResolvedTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

fn resolve_table(
    table: &TableDescription,
    by_name: &HashMap<&str, &TableDescription>,
    generated: &BTreeSet<&str>,
    mapper: &TypeMapper,
) -> SchemaResult<ResolvedTable> {
    let mut fields = Vec::with_capacity(table.columns.len());
    let mut dropped = Vec::new();
    let mut primary_key = None;

    for column in &table.columns {
        let scope = foreign_key_scope(table, column, by_name, generated)?;
        match mapper.map(column, scope) {
            Some(repr) => {
                if column.primary_key {
                    primary_key = Some(fields.len());
                }
                fields.push(repr);
            }
            None => dropped.push(column.name.clone()),
        }
    }

    let Some(primary_key) = primary_key else {
        return Err(SchemaError::NoPrimaryKey {
            table: table.name.clone(),
        });
    };

    let mut reverse_relations = Vec::new();
    for rel in &table.reverse_relations {
        let Some(owner) = by_name.get(rel.owner_table.as_str()) else {
            return Err(SchemaError::UnknownTable {
                table: rel.owner_table.clone(),
                referenced_from: format!("{} reverse relations", table.name),
            });
        };
        let Some(owner_column) = owner.find_column(&rel.owner_column) else {
            return Err(SchemaError::UnknownColumn {
                table: owner.name.clone(),
                column: rel.owner_column.clone(),
            });
        };
        let points_here = owner_column
            .foreign_key
            .as_ref()
            .is_some_and(|fk| fk.table == table.name && !fk.many_to_many);
        if !points_here {
            return Err(SchemaError::InvalidReverseRelation {
                table: table.name.clone(),
                owner_table: owner.name.clone(),
                owner_column: owner_column.name.clone(),
            });
        }
        if !generated.contains(owner.name.as_str()) {
            continue;
        }
        let method = match &rel.name {
            Some(name) => sanitize_field_ident(name),
            None => pluralize(&sanitize_field_ident(&owner.name)),
        };
        reverse_relations.push(ResolvedReverseRelation {
            owner_table: owner.name.clone(),
            owner_struct: struct_name(&owner.name),
            owner_column: owner_column.name.clone(),
            method,
        });
    }

    let struct_name = struct_name(&table.name);
    Ok(ResolvedTable {
        name: table.name.clone(),
        query_name: format!("{struct_name}Query"),
        update_name: format!("{struct_name}Update"),
        struct_name,
        fields,
        primary_key,
        reverse_relations,
        dropped,
    })
}

fn foreign_key_scope<'a>(
    table: &TableDescription,
    column: &ColumnDescription,
    by_name: &HashMap<&str, &'a TableDescription>,
    generated: &BTreeSet<&str>,
) -> SchemaResult<ForeignKeyScope<'a>> {
    let Some(fk) = column.foreign_key.as_ref().filter(|fk| !fk.many_to_many) else {
        return Ok(ForeignKeyScope::NotForeign);
    };

    let Some(&target) = by_name.get(fk.table.as_str()) else {
        return Err(SchemaError::UnknownTable {
            table: fk.table.clone(),
            referenced_from: format!("{}.{}", table.name, column.name),
        });
    };
    let target_pk = target.primary_key()?;

    if let Some(target_column) = &fk.column {
        if target.find_column(target_column).is_none() {
            return Err(SchemaError::UnknownColumn {
                table: target.name.clone(),
                column: target_column.clone(),
            });
        }
        if *target_column != target_pk.name {
            return Err(SchemaError::ForeignKeyNotPrimaryKey {
                table: table.name.clone(),
                column: column.name.clone(),
                target: target.name.clone(),
            });
        }
    }

    if generated.contains(target.name.as_str()) {
        Ok(ForeignKeyScope::Resolved {
            table: target.name.as_str(),
            primary_key: target_pk,
        })
    } else if column.primary_key {
        // The key column itself is always kept.
        Ok(ForeignKeyScope::NotForeign)
    } else {
        Ok(ForeignKeyScope::OutsideGenerationSet)
    }
}
