//! `XxxUpdate`: bulk `UPDATE ... SET` over the rows of an `XxxQuery`.

use super::attrs::{ColumnField, EntityDef};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub(super) fn generate(def: &EntityDef) -> TokenStream {
    let name = &def.ident;
    let vis = &def.vis;
    let update_name = format_ident!("{}Update", name);
    let doc = format!("Bulk update over rows of the `{}` table.", def.table);

    let setters = def
        .columns
        .iter()
        .filter(|c| c.is_assignable())
        .map(setter);

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone)]
        #[must_use]
        #vis struct #update_name {
            inner: pgqs::UpdateSet<#name>,
        }

        impl ::std::convert::From<pgqs::UpdateSet<#name>> for #update_name {
            fn from(inner: pgqs::UpdateSet<#name>) -> Self {
                Self { inner }
            }
        }

        impl #update_name {
            #(#setters)*

            /// The UPDATE statement, or `None` when nothing is assigned.
            pub fn to_sql(
                &self,
            ) -> ::std::option::Option<(::std::string::String, ::std::vec::Vec<pgqs::Value>)> {
                self.inner.to_sql()
            }

            /// Run the update; returns the affected row count.
            pub async fn exec(&self, conn: &impl pgqs::GenericClient) -> pgqs::OrmResult<u64> {
                self.inner.exec(conn).await
            }
        }
    }
}

fn setter(col: &ColumnField) -> TokenStream {
    let column = &col.column;
    let method = format_ident!("set_{}", col.stem);
    let ty = &col.ty;

    let Some(related) = &col.foreign_key else {
        return quote! {
            pub fn #method(&self, value: impl ::std::convert::Into<#ty>) -> Self {
                Self::from(self.inner.set(#column, ::std::convert::Into::<#ty>::into(value)))
            }
        };
    };

    let raw = format_ident!("set_{}_raw", col.stem);
    let by_row = if col.nullable {
        quote! {
            pub fn #method(
                &self,
                related: ::std::option::Option<&#related>,
            ) -> pgqs::OrmResult<Self> {
                let value = match related {
                    ::std::option::Option::Some(r) => {
                        pgqs::IntoValue::into_value(pgqs::relation::related_key(r)?)
                    }
                    ::std::option::Option::None => pgqs::Value::Null,
                };
                Ok(Self::from(self.inner.set(#column, value)))
            }
        }
    } else {
        quote! {
            pub fn #method(&self, related: &#related) -> pgqs::OrmResult<Self> {
                let key = pgqs::relation::related_key(related)?;
                Ok(Self::from(self.inner.set(#column, key)))
            }
        }
    };

    quote! {
        #by_row

        pub fn #raw(&self, value: impl ::std::convert::Into<#ty>) -> Self {
            Self::from(self.inner.set(#column, ::std::convert::Into::<#ty>::into(value)))
        }
    }
}
