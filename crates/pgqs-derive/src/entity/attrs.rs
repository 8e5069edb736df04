//! Attribute parsing for the Entity derive macro.
//!
//! Reads the struct and its `#[orm(...)]` attributes into an [`EntityDef`],
//! validating it as a table description on the way.

use crate::common::syn_types::{infer_domain_type, is_row_state, option_inner};
use heck::ToSnakeCase;
use pgqs_schema::naming::{pluralize, unraw};
use pgqs_schema::{ColumnDescription, DomainType, ForeignKeyScope, TableDescription, TypeMapper};
use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

/// A struct field backed by a column.
pub(super) struct ColumnField {
    pub ident: syn::Ident,
    /// Field name without `r#`, used to build method names.
    pub stem: String,
    pub column: String,
    pub ty: syn::Type,
    /// `ty` without the outer `Option`.
    pub base_ty: syn::Type,
    pub nullable: bool,
    pub primary_key: bool,
    pub autogenerated: bool,
    /// Private field reached through a generated getter.
    pub hidden: bool,
    /// `<`, `<=`, `>`, `>=` filters are generated.
    pub comparable: bool,
    /// The referenced entity of a foreign key column.
    pub foreign_key: Option<syn::Path>,
}

impl ColumnField {
    pub fn is_insertable(&self) -> bool {
        !self.autogenerated
    }

    pub fn is_updatable(&self) -> bool {
        !self.autogenerated && !self.primary_key
    }

    /// Bulk updates may also rewrite a caller-supplied primary key.
    pub fn is_assignable(&self) -> bool {
        !self.autogenerated
    }
}

/// `#[orm(has_many(Comment, foreign_key = "post_id", method = "comments"))]`
pub(super) struct HasManyRelation {
    pub model: syn::Path,
    pub foreign_key: String,
    pub method: String,
}

pub(super) struct EntityDef {
    pub ident: syn::Ident,
    pub vis: syn::Visibility,
    pub table: String,
    pub columns: Vec<ColumnField>,
    pub state_field: syn::Ident,
    pub has_many: Vec<HasManyRelation>,
    pk: usize,
}

impl EntityDef {
    pub fn primary_key(&self) -> &ColumnField {
        &self.columns[self.pk]
    }
}

#[derive(Default)]
struct StructAttr {
    table: Option<String>,
    has_many: Vec<HasManyRelation>,
}

impl syn::parse::Parse for StructAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = StructAttr::default();
        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            if key == "table" {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                attr.table = Some(value.value());
            } else if key == "has_many" {
                let content;
                syn::parenthesized!(content in input);
                attr.has_many.push(parse_has_many(&content)?);
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    "expected `table = \"...\"` or `has_many(...)`",
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

fn parse_has_many(content: syn::parse::ParseStream) -> Result<HasManyRelation> {
    let model: syn::Path = content.parse()?;
    let mut foreign_key = None;
    let mut method = None;

    while content.peek(syn::Token![,]) {
        let _: syn::Token![,] = content.parse()?;
        if content.is_empty() {
            break;
        }
        let key = syn::Ident::parse_any(content)?;
        let _: syn::Token![=] = content.parse()?;
        let value: syn::LitStr = content.parse()?;
        if key == "foreign_key" {
            foreign_key = Some(value.value());
        } else if key == "method" || key == "name" {
            method = Some(value.value());
        } else {
            return Err(syn::Error::new(
                key.span(),
                "has_many accepts `foreign_key` and `method`",
            ));
        }
    }

    let foreign_key = foreign_key.ok_or_else(|| {
        syn::Error::new(Span::call_site(), "has_many requires foreign_key = \"...\"")
    })?;
    let method = match method {
        Some(m) => m,
        None => {
            let Some(last) = model.segments.last() else {
                return Err(syn::Error::new_spanned(&model, "expected a model path"));
            };
            pluralize(&last.ident.to_string().to_snake_case())
        }
    };

    Ok(HasManyRelation {
        model,
        foreign_key,
        method,
    })
}

/// Field-level `#[orm(...)]` options.
#[derive(Default)]
struct FieldAttr {
    is_id: bool,
    is_auto: bool,
    column: Option<String>,
    domain_type: Option<syn::LitStr>,
    foreign_key: Option<syn::Path>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();
        while !input.is_empty() {
            // `type` is a keyword
            let key = syn::Ident::parse_any(input)?;
            if key == "id" {
                attr.is_id = true;
            } else if key == "auto" {
                attr.is_auto = true;
            } else if key == "column" {
                let _: syn::Token![=] = input.parse()?;
                attr.column = Some(input.parse::<syn::LitStr>()?.value());
            } else if key == "type" {
                let _: syn::Token![=] = input.parse()?;
                attr.domain_type = Some(input.parse()?);
            } else if key == "foreign_key" {
                let _: syn::Token![=] = input.parse()?;
                attr.foreign_key = Some(input.parse()?);
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    "expected one of `id`, `auto`, `column`, `type`, `foreign_key`",
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        let parsed: FieldAttr = attr.parse_args()?;
        merged.is_id |= parsed.is_id;
        merged.is_auto |= parsed.is_auto;
        merged.column = parsed.column.or(merged.column);
        merged.domain_type = parsed.domain_type.or(merged.domain_type);
        merged.foreign_key = parsed.foreign_key.or(merged.foreign_key);
    }
    Ok(merged)
}

fn domain_type(field: &syn::Field, attr: &FieldAttr, base_ty: &syn::Type) -> Result<DomainType> {
    if let Some(lit) = &attr.domain_type {
        return lit
            .value()
            .parse()
            .map_err(|e: pgqs_schema::SchemaError| syn::Error::new(lit.span(), e.to_string()));
    }
    infer_domain_type(base_ty).ok_or_else(|| {
        syn::Error::new_spanned(
            &field.ty,
            "cannot infer the column type; add #[orm(type = \"int64\")] or similar",
        )
    })
}

pub(super) fn parse(input: &DeriveInput) -> Result<EntityDef> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Entity can only be derived for structs",
            ));
        }
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let mut struct_attr = StructAttr::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        let parsed: StructAttr = attr.parse_args()?;
        if parsed.table.is_some() {
            struct_attr.table = parsed.table;
        }
        struct_attr.has_many.extend(parsed.has_many);
    }
    let table = struct_attr.table.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "Entity requires #[orm(table = \"table_name\")] attribute",
        )
    })?;

    let mapper = TypeMapper::default();
    let mut description = TableDescription::new(&table);
    let mut columns = Vec::with_capacity(fields.len());
    let mut state_field: Option<syn::Ident> = None;

    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };

        if is_row_state(&field.ty) {
            if state_field.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one RowState field is allowed",
                ));
            }
            state_field = Some(ident);
            continue;
        }

        let attr = field_attr(field)?;
        let (base_ty, nullable) = match option_inner(&field.ty) {
            Some(inner) => (inner.clone(), true),
            None => (field.ty.clone(), false),
        };
        let stem = unraw(&ident.to_string()).to_string();
        let column = attr.column.clone().unwrap_or_else(|| stem.clone());

        let mut desc = ColumnDescription::new(&column, domain_type(field, &attr, &base_ty)?)
            .nullable(nullable);
        if attr.is_id {
            desc = desc.primary_key();
        }
        if attr.is_auto {
            desc = desc.autogenerated();
        }
        let Some(repr) = mapper.map(&desc, ForeignKeyScope::NotForeign) else {
            return Err(syn::Error::new_spanned(field, "column cannot be mapped"));
        };
        description = description.column(desc);

        columns.push(ColumnField {
            ident,
            stem,
            column,
            ty: field.ty.clone(),
            base_ty,
            nullable,
            primary_key: attr.is_id,
            autogenerated: attr.is_auto,
            hidden: repr.is_hidden(),
            comparable: repr.comparable && attr.foreign_key.is_none(),
            foreign_key: attr.foreign_key,
        });
    }

    description
        .validate()
        .map_err(|e| syn::Error::new_spanned(&input.ident, e.to_string()))?;

    let Some(pk) = columns.iter().position(|c| c.primary_key) else {
        return Err(syn::Error::new_spanned(&input.ident, "no primary key column"));
    };
    let state_field = state_field.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "Entity requires a `RowState` field to track whether the row is stored",
        )
    })?;

    Ok(EntityDef {
        ident: input.ident.clone(),
        vis: input.vis.clone(),
        table,
        columns,
        state_field,
        has_many: struct_attr.has_many,
        pk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn parse_err(input: DeriveInput) -> String {
        match parse(&input) {
            Ok(_) => panic!("expected an error"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn column_roles() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "comment")]
            #[orm(has_many(Reply, foreign_key = "comment_id"))]
            pub struct Comment {
                #[orm(id, auto)]
                id: i64,
                #[orm(foreign_key = Post)]
                pub post_id: i64,
                #[orm(column = "body_text")]
                pub body: Option<String>,
                pub r#type: String,
                state: pgqs::RowState,
            }
        };
        let def = parse(&input).unwrap();

        assert_eq!(def.table, "comment");
        assert_eq!(def.state_field, "state");
        assert_eq!(def.primary_key().column, "id");
        assert_eq!(def.columns.len(), 4);

        let id = &def.columns[0];
        assert!(id.hidden && !id.is_insertable() && !id.is_updatable());
        assert!(!id.is_assignable());

        let post_id = &def.columns[1];
        assert!(post_id.foreign_key.is_some() && !post_id.comparable);

        let body = &def.columns[2];
        assert_eq!(body.column, "body_text");
        assert!(body.nullable && body.is_updatable());

        assert_eq!(def.columns[3].stem, "type");
        assert_eq!(def.has_many[0].method, "replies");
        assert_eq!(def.has_many[0].foreign_key, "comment_id");
    }

    #[test]
    fn bool_columns_are_not_comparable() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "flag")]
            struct Flag {
                #[orm(id)]
                name: String,
                on: bool,
                state: RowState,
            }
        };
        let def = parse(&input).unwrap();
        assert!(def.columns[0].comparable);
        assert!(!def.columns[1].comparable);
        assert!(def.columns[0].is_insertable());
        assert!(!def.columns[0].is_updatable());
        assert!(def.columns[0].is_assignable());
    }

    #[test]
    fn table_attribute_is_required() {
        let input: DeriveInput = parse_quote! {
            struct Nameless {
                #[orm(id)]
                id: i64,
                state: RowState,
            }
        };
        assert!(parse_err(input).contains("table"));
    }

    #[test]
    fn primary_key_count_is_checked() {
        let none: DeriveInput = parse_quote! {
            #[orm(table = "t")]
            struct T {
                id: i64,
                state: RowState,
            }
        };
        let two: DeriveInput = parse_quote! {
            #[orm(table = "t")]
            struct T {
                #[orm(id)]
                a: i64,
                #[orm(id)]
                b: i64,
                state: RowState,
            }
        };
        assert!(parse(&none).is_err());
        assert!(parse(&two).is_err());
    }

    #[test]
    fn row_state_field_is_required() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "t")]
            struct T {
                #[orm(id)]
                id: i64,
            }
        };
        assert!(parse_err(input).contains("RowState"));
    }

    #[test]
    fn uninferable_types_need_an_explicit_domain() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "t")]
            struct T {
                #[orm(id)]
                id: i64,
                amount: rust_decimal::Decimal,
                state: RowState,
            }
        };
        assert!(parse_err(input).contains("#[orm(type"));

        let input: DeriveInput = parse_quote! {
            #[orm(table = "t")]
            struct T {
                #[orm(id)]
                id: i64,
                #[orm(type = "float64")]
                amount: Money,
                state: RowState,
            }
        };
        assert!(parse(&input).is_ok());
    }
}
