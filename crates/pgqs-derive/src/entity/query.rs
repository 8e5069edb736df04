//! `XxxQuery`: the per-table query set with one typed method per column filter.

use super::attrs::{ColumnField, EntityDef};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub(super) fn generate(def: &EntityDef) -> TokenStream {
    let name = &def.ident;
    let vis = &def.vis;
    let query_name = format_ident!("{}Query", name);
    let update_name = format_ident!("{}Update", name);
    let doc = format!("Query set over the `{}` table.", def.table);

    let column_methods = def.columns.iter().map(column_methods);

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Default)]
        #[must_use]
        #vis struct #query_name {
            inner: pgqs::QuerySet<#name>,
        }

        impl ::std::convert::From<pgqs::QuerySet<#name>> for #query_name {
            fn from(inner: pgqs::QuerySet<#name>) -> Self {
                Self { inner }
            }
        }

        impl ::std::convert::From<#query_name> for pgqs::QuerySet<#name> {
            fn from(query: #query_name) -> Self {
                query.inner
            }
        }

        impl #query_name {
            #(#column_methods)*

            /// The untyped query set behind this query.
            pub fn query_set(&self) -> &pgqs::QuerySet<#name> {
                &self.inner
            }

            /// Add an arbitrary condition.
            pub fn filter(&self, fragment: pgqs::Fragment) -> Self {
                Self::from(self.inner.filter(fragment))
            }

            /// Rows matching any of `groups`, each group being the conjunction
            /// of its own conditions.
            pub fn or<I>(&self, groups: I) -> Self
            where
                I: ::std::iter::IntoIterator<Item = Self>,
            {
                Self::from(self.inner.or(groups))
            }

            pub fn order_by_random(&self) -> Self {
                Self::from(self.inner.order_by_random())
            }

            pub fn for_update(&self) -> Self {
                Self::from(self.inner.for_update())
            }

            pub fn for_update_nowait(&self) -> Self {
                Self::from(self.inner.for_update_nowait())
            }

            pub fn for_update_skip_locked(&self) -> Self {
                Self::from(self.inner.for_update_skip_locked())
            }

            pub fn clear_for_update(&self) -> Self {
                Self::from(self.inner.clear_for_update())
            }

            pub fn to_select_sql(&self) -> (::std::string::String, ::std::vec::Vec<pgqs::Value>) {
                self.inner.to_select_sql()
            }

            pub fn to_first_sql(&self) -> (::std::string::String, ::std::vec::Vec<pgqs::Value>) {
                self.inner.to_first_sql()
            }

            pub fn to_count_sql(&self) -> (::std::string::String, ::std::vec::Vec<pgqs::Value>) {
                self.inner.to_count_sql()
            }

            pub fn to_delete_sql(&self) -> (::std::string::String, ::std::vec::Vec<pgqs::Value>) {
                self.inner.to_delete_sql()
            }

            /// Number of matching rows.
            pub async fn count(&self, conn: &impl pgqs::GenericClient) -> pgqs::OrmResult<i64> {
                self.inner.count(conn).await
            }

            /// Every matching row, in the requested order.
            pub async fn all(
                &self,
                conn: &impl pgqs::GenericClient,
            ) -> pgqs::OrmResult<::std::vec::Vec<#name>> {
                self.inner.all(conn).await
            }

            /// The first matching row, if any.
            pub async fn first(
                &self,
                conn: &impl pgqs::GenericClient,
            ) -> pgqs::OrmResult<::std::option::Option<#name>> {
                self.inner.first(conn).await
            }

            /// Delete every matching row; returns the affected row count.
            pub async fn delete(&self, conn: &impl pgqs::GenericClient) -> pgqs::OrmResult<u64> {
                self.inner.delete(conn).await
            }

            /// A bulk update over the matching rows.
            pub fn update(&self) -> #update_name {
                #update_name::from(self.inner.update())
            }
        }
    }
}

fn column_methods(col: &ColumnField) -> TokenStream {
    let column = &col.column;
    let stem = &col.stem;
    let order_by = format_ident!("order_by_{}", stem);
    let order_by_desc = format_ident!("order_by_{}_desc", stem);
    let ordering = quote! {
        pub fn #order_by(&self) -> Self {
            Self::from(self.inner.order_by(#column))
        }

        pub fn #order_by_desc(&self) -> Self {
            Self::from(self.inner.order_by_desc(#column))
        }
    };

    let nullability = if col.nullable {
        let is_null = format_ident!("{}_is_null", stem);
        let is_not_null = format_ident!("{}_is_not_null", stem);
        quote! {
            pub fn #is_null(&self) -> Self {
                Self::from(self.inner.is_null(#column))
            }

            pub fn #is_not_null(&self) -> Self {
                Self::from(self.inner.is_not_null(#column))
            }
        }
    } else {
        TokenStream::new()
    };

    let filters = match &col.foreign_key {
        Some(related) => foreign_key_filters(col, related),
        None => value_filters(col),
    };

    quote! {
        #filters
        #nullability
        #ordering
    }
}

fn value_filters(col: &ColumnField) -> TokenStream {
    let column = &col.column;
    let stem = &col.stem;
    let base = &col.base_ty;

    let eq = format_ident!("{}_eq", stem);
    let ne = format_ident!("{}_ne", stem);
    let in_ = format_ident!("{}_in", stem);
    let not_in = format_ident!("{}_not_in", stem);

    let comparisons = if col.comparable {
        let ops = ["lt", "le", "gt", "ge"].map(|op| {
            let method = format_ident!("{}_{}", stem, op);
            let op = format_ident!("{}", op);
            quote! {
                pub fn #method(&self, value: impl ::std::convert::Into<#base>) -> Self {
                    Self::from(self.inner.#op(#column, ::std::convert::Into::<#base>::into(value)))
                }
            }
        });
        quote! { #(#ops)* }
    } else {
        TokenStream::new()
    };

    quote! {
        pub fn #eq(&self, value: impl ::std::convert::Into<#base>) -> Self {
            Self::from(self.inner.eq(#column, ::std::convert::Into::<#base>::into(value)))
        }

        pub fn #ne(&self, value: impl ::std::convert::Into<#base>) -> Self {
            Self::from(self.inner.ne(#column, ::std::convert::Into::<#base>::into(value)))
        }

        #comparisons

        pub fn #in_<I>(&self, values: I) -> Self
        where
            I: ::std::iter::IntoIterator,
            I::Item: ::std::convert::Into<#base>,
        {
            Self::from(self.inner.in_list(
                #column,
                values.into_iter().map(::std::convert::Into::<#base>::into),
            ))
        }

        pub fn #not_in<I>(&self, values: I) -> Self
        where
            I: ::std::iter::IntoIterator,
            I::Item: ::std::convert::Into<#base>,
        {
            Self::from(self.inner.not_in(
                #column,
                values.into_iter().map(::std::convert::Into::<#base>::into),
            ))
        }
    }
}

/// Foreign key columns filter by the related row, by a subquery over the
/// related table, or by raw key values.
fn foreign_key_filters(col: &ColumnField, related: &syn::Path) -> TokenStream {
    let column = &col.column;
    let stem = &col.stem;
    let base = &col.base_ty;

    let eq = format_ident!("{}_eq", stem);
    let ne = format_ident!("{}_ne", stem);
    let raw_eq = format_ident!("{}_raw_eq", stem);
    let in_ = format_ident!("{}_in", stem);
    let raw_in = format_ident!("{}_raw_in", stem);
    let not_in = format_ident!("{}_not_in", stem);

    quote! {
        /// Rows referencing `related`; fails if `related` was never saved
        /// and its key is generated on insert.
        pub fn #eq(&self, related: &#related) -> pgqs::OrmResult<Self> {
            let key = pgqs::relation::related_key(related)?;
            Ok(Self::from(self.inner.eq(#column, key)))
        }

        pub fn #ne(&self, related: &#related) -> pgqs::OrmResult<Self> {
            let key = pgqs::relation::related_key(related)?;
            Ok(Self::from(self.inner.ne(#column, key)))
        }

        pub fn #raw_eq(&self, value: impl ::std::convert::Into<#base>) -> Self {
            Self::from(self.inner.eq(#column, ::std::convert::Into::<#base>::into(value)))
        }

        /// Rows referencing any row selected by `related`.
        pub fn #in_(&self, related: impl ::std::convert::Into<pgqs::QuerySet<#related>>) -> Self {
            Self::from(self.inner.in_subquery::<#related>(#column, related))
        }

        pub fn #raw_in<I>(&self, values: I) -> Self
        where
            I: ::std::iter::IntoIterator,
            I::Item: ::std::convert::Into<#base>,
        {
            Self::from(self.inner.in_list(
                #column,
                values.into_iter().map(::std::convert::Into::<#base>::into),
            ))
        }

        pub fn #not_in<I>(&self, values: I) -> Self
        where
            I: ::std::iter::IntoIterator,
            I::Item: ::std::convert::Into<#base>,
        {
            Self::from(self.inner.not_in(
                #column,
                values.into_iter().map(::std::convert::Into::<#base>::into),
            ))
        }
    }
}
