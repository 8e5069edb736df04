//! Relation accessors: `get_x`/`set_x` for foreign key columns and the
//! reverse `has_many` queries.

use super::attrs::{ColumnField, EntityDef, HasManyRelation};
use pgqs_schema::naming::{is_rust_keyword, relation_name};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};

pub(super) fn generate(def: &EntityDef) -> TokenStream {
    let name = &def.ident;

    let foreign_keys: Vec<_> = def
        .columns
        .iter()
        .filter_map(|c| c.foreign_key.as_ref().map(|r| foreign_key_accessors(c, r)))
        .collect();
    let reverse: Vec<_> = def.has_many.iter().map(|rel| has_many(def, rel)).collect();
    let checks = def.has_many.iter().map(|rel| has_many_check(def, rel));

    if foreign_keys.is_empty() && reverse.is_empty() {
        return TokenStream::new();
    }

    quote! {
        impl #name {
            #(#foreign_keys)*
            #(#reverse)*
        }

        #(#checks)*
    }
}

fn method_ident(name: &str) -> syn::Ident {
    if is_rust_keyword(name) {
        syn::Ident::new_raw(name, Span::call_site())
    } else {
        syn::Ident::new(name, Span::call_site())
    }
}

fn foreign_key_accessors(col: &ColumnField, related: &syn::Path) -> TokenStream {
    let field = &col.ident;
    let relation = relation_name(&col.stem);
    let getter = format_ident!("get_{}", relation);
    let setter = format_ident!("set_{}", relation);
    let get_doc = format!("Load the row referenced by `{}`.", col.column);

    if col.nullable {
        quote! {
            #[doc = #get_doc]
            pub async fn #getter(
                &self,
                conn: &impl pgqs::GenericClient,
            ) -> pgqs::OrmResult<::std::option::Option<#related>> {
                pgqs::relation::fetch_related::<#related>(
                    conn,
                    ::std::clone::Clone::clone(&self.#field),
                )
                .await
            }

            /// Point the foreign key at `related`, or clear it with `None`.
            pub fn #setter(
                &mut self,
                related: ::std::option::Option<&#related>,
            ) -> pgqs::OrmResult<()> {
                self.#field = match related {
                    ::std::option::Option::Some(r) => {
                        ::std::option::Option::Some(pgqs::relation::related_key(r)?)
                    }
                    ::std::option::Option::None => ::std::option::Option::None,
                };
                Ok(())
            }
        }
    } else {
        quote! {
            #[doc = #get_doc]
            pub async fn #getter(
                &self,
                conn: &impl pgqs::GenericClient,
            ) -> pgqs::OrmResult<::std::option::Option<#related>> {
                pgqs::relation::fetch_related::<#related>(
                    conn,
                    ::std::option::Option::Some(::std::clone::Clone::clone(&self.#field)),
                )
                .await
            }

            /// Point the foreign key at `related`.
            pub fn #setter(&mut self, related: &#related) -> pgqs::OrmResult<()> {
                self.#field = pgqs::relation::related_key(related)?;
                Ok(())
            }
        }
    }
}

fn has_many(def: &EntityDef, rel: &HasManyRelation) -> TokenStream {
    let model = &rel.model;
    let method = method_ident(&rel.method);
    let foreign_key = &rel.foreign_key;
    let pk = &def.primary_key().ident;
    let doc = format!("Rows whose `{}` references this row.", foreign_key);

    quote! {
        #[doc = #doc]
        pub fn #method(&self) -> <#model as pgqs::Entity>::Query {
            pgqs::relation::reverse::<#model>(#foreign_key, ::std::clone::Clone::clone(&self.#pk))
        }
    }
}

fn has_many_check(def: &EntityDef, rel: &HasManyRelation) -> TokenStream {
    let model = &rel.model;
    let foreign_key = &rel.foreign_key;
    let message = format!(
        "has_many on {}: foreign_key \"{}\" is not a column of the related entity",
        def.ident, foreign_key
    );

    quote! {
        const _: () = ::std::assert!(
            pgqs::entity::has_column(<#model as pgqs::Entity>::COLUMNS, #foreign_key),
            #message
        );
    }
}
