//! Entity derive macro implementation
//!
//! ## Module Structure
//!
//! - `attrs`: struct and field attribute parsing plus table validation
//! - `query`: the `XxxQuery` builder
//! - `update`: the `XxxUpdate` builder
//! - `relations`: foreign key accessors and `has_many` methods

mod attrs;
mod query;
mod relations;
mod update;

use attrs::{ColumnField, EntityDef};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let def = attrs::parse(&input)?;

    let entity_impl = gen_entity_impl(&def);
    let inherent_impl = gen_inherent_impl(&def);
    let query_struct = query::generate(&def);
    let update_struct = update::generate(&def);
    let relation_methods = relations::generate(&def);

    Ok(quote! {
        #entity_impl
        #inherent_impl
        #query_struct
        #update_struct
        #relation_methods
    })
}

fn column_names<'a>(columns: impl Iterator<Item = &'a ColumnField>) -> Vec<&'a str> {
    columns.map(|c| c.column.as_str()).collect()
}

fn clone_values<'a>(columns: impl Iterator<Item = &'a ColumnField>) -> Vec<TokenStream> {
    columns
        .map(|c| {
            let ident = &c.ident;
            quote! {
                pgqs::IntoValue::into_value(::std::clone::Clone::clone(&self.#ident))
            }
        })
        .collect()
}

fn gen_entity_impl(def: &EntityDef) -> TokenStream {
    let name = &def.ident;
    let query_name = format_ident!("{}Query", name);
    let table = &def.table;
    let state = &def.state_field;

    let pk = def.primary_key();
    let pk_ident = &pk.ident;
    let pk_ty = &pk.ty;
    let pk_column = &pk.column;
    let pk_auto = pk.autogenerated;

    let columns = column_names(def.columns.iter());
    let insert_columns = column_names(def.columns.iter().filter(|c| c.is_insertable()));
    let update_columns = column_names(def.columns.iter().filter(|c| c.is_updatable()));
    let returning_columns = column_names(def.columns.iter().filter(|c| c.autogenerated));

    let row_fields = def.columns.iter().enumerate().map(|(idx, c)| {
        let ident = &c.ident;
        quote! { #ident: row.get(#idx)? }
    });

    let insert_values = clone_values(def.columns.iter().filter(|c| c.is_insertable()));
    let update_values = clone_values(def.columns.iter().filter(|c| c.is_updatable()));

    let apply_returning = def
        .columns
        .iter()
        .filter(|c| c.autogenerated)
        .enumerate()
        .map(|(idx, c)| {
            let ident = &c.ident;
            quote! { self.#ident = row.get(#idx)?; }
        });

    quote! {
        impl pgqs::FromRow for #name {
            fn from_row(row: &pgqs::Row) -> pgqs::OrmResult<Self> {
                Ok(Self {
                    #(#row_fields,)*
                    #state: pgqs::RowState::persisted(),
                })
            }
        }

        impl pgqs::Entity for #name {
            type Query = #query_name;
            type PrimaryKey = #pk_ty;

            const TABLE: &'static str = #table;
            const COLUMNS: &'static [&'static str] = &[#(#columns),*];
            const PRIMARY_KEY: &'static str = #pk_column;
            const PRIMARY_KEY_AUTOGENERATED: bool = #pk_auto;
            const INSERT_COLUMNS: &'static [&'static str] = &[#(#insert_columns),*];
            const UPDATE_COLUMNS: &'static [&'static str] = &[#(#update_columns),*];
            const RETURNING_COLUMNS: &'static [&'static str] = &[#(#returning_columns),*];

            fn primary_key(&self) -> #pk_ty {
                ::std::clone::Clone::clone(&self.#pk_ident)
            }

            fn insert_values(&self) -> ::std::vec::Vec<pgqs::Value> {
                ::std::vec![#(#insert_values),*]
            }

            fn update_values(&self) -> ::std::vec::Vec<pgqs::Value> {
                ::std::vec![#(#update_values),*]
            }

            #[allow(unused_variables)]
            fn apply_returning(&mut self, row: &pgqs::Row) -> pgqs::OrmResult<()> {
                #(#apply_returning)*
                Ok(())
            }

            fn row_state(&self) -> pgqs::RowState {
                self.#state
            }

            fn row_state_mut(&mut self) -> &mut pgqs::RowState {
                &mut self.#state
            }
        }
    }
}

fn gen_inherent_impl(def: &EntityDef) -> TokenStream {
    let name = &def.ident;
    let query_name = format_ident!("{}Query", name);
    let state = &def.state_field;

    let params = def.columns.iter().filter(|c| c.is_insertable()).map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote! { #ident: #ty }
    });
    let inits = def.columns.iter().map(|c| {
        let ident = &c.ident;
        if c.is_insertable() {
            quote! { #ident }
        } else {
            quote! { #ident: ::std::default::Default::default() }
        }
    });

    let getters = def.columns.iter().filter(|c| c.hidden).map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let doc = format!(
            "Value of the `{}` column, assigned by the database on insert.",
            c.column
        );
        quote! {
            #[doc = #doc]
            pub fn #ident(&self) -> #ty {
                ::std::clone::Clone::clone(&self.#ident)
            }
        }
    });

    quote! {
        impl #name {
            /// A new, not yet stored row. Autogenerated columns start at their
            /// default and are filled in by `save`.
            #[allow(clippy::too_many_arguments)]
            pub fn new(#(#params),*) -> Self {
                Self {
                    #(#inits,)*
                    #state: pgqs::RowState::new(),
                }
            }

            #(#getters)*

            /// An unfiltered query over the table.
            pub fn query() -> #query_name {
                #query_name::default()
            }

            /// Insert the row, or update it when it is already stored.
            pub async fn save(&mut self, conn: &impl pgqs::GenericClient) -> pgqs::OrmResult<()> {
                pgqs::persist::save(conn, self).await
            }

            /// Delete the row by primary key; returns the affected row count.
            pub async fn delete(&mut self, conn: &impl pgqs::GenericClient) -> pgqs::OrmResult<u64> {
                pgqs::persist::delete(conn, self).await
            }

            /// Save a batch: stored rows are updated one by one, new rows are
            /// inserted with a single statement.
            pub async fn save_all(
                conn: &impl pgqs::GenericClient,
                rows: &mut [Self],
            ) -> pgqs::OrmResult<()> {
                pgqs::persist::save_all(conn, rows).await
            }
        }
    }
}
