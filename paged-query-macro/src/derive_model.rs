//! # Model Derive Macro Implementation
//!
//! Expands `#[derive(Model)]` into a `paged_query::Model` implementation plus
//! a `<snake_name>_fields` module of field-name constants.
//!
//! ## Generated Items
//!
//! ```rust,ignore
//! // Input struct:
//! #[derive(Model)]
//! struct City {
//!     #[orm(primary_key)]
//!     id: i64,
//!     #[orm(size = 100)]
//!     name: String,
//! }
//!
//! // Generated implementation:
//! impl paged_query::Model for City {
//!     fn table_name() -> &'static str { "City" }
//!     fn columns() -> &'static [ColumnInfo] { /* const table */ }
//!     fn active_columns() -> &'static [&'static str] { &["id", "name"] }
//!     fn to_map(&self) -> HashMap<String, String> { /* ... */ }
//!     fn value(&self, column: &str) -> Option<Value> {
//!         match column {
//!             "id" => Some(Value::from(self.id.clone())),
//!             "name" => Some(Value::from(self.name.clone())),
//!             _ => None,
//!         }
//!     }
//!     fn sanitize_strings(&mut self) {
//!         self.name = paged_query::sanitizer::html_encode(&self.name);
//!     }
//! }
//!
//! mod city_fields {
//!     pub const ID: &str = "id";
//!     pub const NAME: &str = "name";
//! }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use heck::{ToShoutySnakeCase, ToSnakeCase};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitStr};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::types::{StringKind, rust_type_to_sql, string_kind};

// ============================================================================
// Attribute Parsing
// ============================================================================

/// Options collected from `#[orm(...)]` on a single field.
#[derive(Default)]
struct FieldAttrs {
    primary_key: bool,
    unique: bool,
    index: bool,
    size: Option<usize>,
    foreign: Option<(String, String)>,
}

fn parse_field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                attrs.primary_key = true;
            } else if meta.path.is_ident("unique") {
                attrs.unique = true;
            } else if meta.path.is_ident("index") {
                attrs.index = true;
            } else if meta.path.is_ident("size") {
                let value: syn::LitInt = meta.value()?.parse()?;
                attrs.size = Some(value.base10_parse::<usize>()?);
            } else if meta.path.is_ident("foreign_key") {
                let value: LitStr = meta.value()?.parse()?;
                let fk = value.value();
                match fk.split_once("::") {
                    Some((table, column)) if !table.is_empty() && !column.is_empty() => {
                        attrs.foreign = Some((table.to_string(), column.to_string()));
                    }
                    _ => return Err(meta.error("invalid format for foreign_key, use 'Table::column'")),
                }
            } else {
                return Err(meta.error("unsupported orm attribute"));
            }
            Ok(())
        })?;
    }

    Ok(attrs)
}

// ============================================================================
// Macro Expansion Function
// ============================================================================

/// Expands the `#[derive(Model)]` macro.
///
/// # Errors
///
/// Returns a spanned error if the input is not a struct with named fields or
/// an `#[orm(...)]` attribute is malformed.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;
    let vis = &ast.vis;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new_spanned(struct_name, "Model must have named fields")),
        },
        _ => return Err(syn::Error::new_spanned(struct_name, "Model must be a struct")),
    };

    let mut column_defs = Vec::with_capacity(fields.len());
    let mut field_names = Vec::with_capacity(fields.len());
    let mut map_inserts = Vec::with_capacity(fields.len());
    let mut value_arms = Vec::with_capacity(fields.len());
    let mut sanitize_stmts = Vec::new();
    let mut field_consts = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = LitStr::new(&ident.to_string(), Span::call_site());
        let attrs = parse_field_attrs(field)?;

        // --------------------------------------------------------------------
        // Column metadata
        // --------------------------------------------------------------------
        let (mut sql_type, is_nullable) = rust_type_to_sql(&field.ty);
        if let Some(size) = attrs.size
            && sql_type == "TEXT"
        {
            sql_type = format!("VARCHAR({})", size);
        }

        let (foreign_table, foreign_key) = match &attrs.foreign {
            Some((table, column)) => (quote! { Some(#table) }, quote! { Some(#column) }),
            None => (quote! { None }, quote! { None }),
        };
        let primary_key = attrs.primary_key;
        let unique = attrs.unique;
        let index = attrs.index;

        column_defs.push(quote! {
            paged_query::ColumnInfo {
                name: #name,
                sql_type: #sql_type,
                is_primary_key: #primary_key,
                is_nullable: #is_nullable,
                unique: #unique,
                index: #index,
                foreign_table: #foreign_table,
                foreign_key: #foreign_key,
            }
        });

        // --------------------------------------------------------------------
        // Insert serialization
        // --------------------------------------------------------------------
        map_inserts.push(if is_nullable {
            quote! {
                if let Some(val) = &self.#ident {
                    map.insert(#name.to_string(), val.to_string());
                }
            }
        } else {
            quote! {
                map.insert(#name.to_string(), self.#ident.to_string());
            }
        });

        // --------------------------------------------------------------------
        // Accessor dispatch
        // --------------------------------------------------------------------
        value_arms.push(quote! {
            #name => Some(paged_query::Value::from(::core::clone::Clone::clone(&self.#ident))),
        });

        match string_kind(&field.ty) {
            Some(StringKind::Plain) => sanitize_stmts.push(quote! {
                self.#ident = paged_query::sanitizer::html_encode(&self.#ident);
            }),
            Some(StringKind::Optional) => sanitize_stmts.push(quote! {
                if let Some(val) = self.#ident.as_mut() {
                    *val = paged_query::sanitizer::html_encode(val);
                }
            }),
            None => {}
        }

        let bare = ident.to_string();
        let bare = bare.strip_prefix("r#").unwrap_or(&bare);
        let const_name = format_ident!("{}", bare.to_shouty_snake_case());
        field_consts.push(quote! {
            pub const #const_name: &str = #name;
        });

        field_names.push(name);
    }

    let fields_mod = format_ident!("{}_fields", struct_name.to_string().to_snake_case());

    Ok(quote! {
        impl #impl_generics paged_query::Model for #struct_name #ty_generics #where_clause {
            fn table_name() -> &'static str {
                stringify!(#struct_name)
            }

            fn columns() -> &'static [paged_query::ColumnInfo] {
                const COLUMNS: &[paged_query::ColumnInfo] = &[#(#column_defs),*];
                COLUMNS
            }

            fn active_columns() -> &'static [&'static str] {
                &[#(#field_names),*]
            }

            fn to_map(&self) -> ::std::collections::HashMap<String, String> {
                let mut map = ::std::collections::HashMap::new();
                #(#map_inserts)*
                map
            }

            fn value(&self, column: &str) -> Option<paged_query::Value> {
                match column {
                    #(#value_arms)*
                    _ => None,
                }
            }

            fn sanitize_strings(&mut self) {
                #(#sanitize_stmts)*
            }
        }

        /// Field name constants generated by `#[derive(Model)]`.
        #[allow(dead_code)]
        #vis mod #fields_mod {
            #(#field_consts)*
        }
    })
}
