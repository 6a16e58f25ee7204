//! `#[derive(Entity)]` expansion.

use crate::attrs::{FieldSpec, field_spec, get_table_name};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let table_name = get_table_name(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let specs = fields.iter().map(field_spec).collect::<Result<Vec<_>>>()?;
    let (persisted, skipped): (Vec<&FieldSpec>, Vec<&FieldSpec>) =
        specs.iter().partition(|f| !f.attr.skip);

    let mut ids = persisted.iter().filter(|f| f.attr.is_id);
    let id = match (ids.next(), ids.next()) {
        (Some(id), None) => *id,
        (None, _) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity requires exactly one #[orm(id)] field",
            ));
        }
        (Some(_), Some(second)) => {
            return Err(syn::Error::new_spanned(
                &second.ident,
                "Entity supports a single #[orm(id)] field; composite keys are not supported",
            ));
        }
    };

    // field_value
    let value_arms = persisted.iter().map(|f| {
        let ident = &f.ident;
        let field_name = &f.name;
        quote! {
            #field_name => ::core::option::Option::Some(::ormlite::ToValue::to_value(&self.#ident)),
        }
    });

    // from_row
    let read_fields = persisted.iter().map(|f| {
        let ident = &f.ident;
        let field_name = &f.name;
        quote! { #ident: row.get(#field_name)?, }
    });
    let default_fields = skipped.iter().map(|f| {
        let ident = &f.ident;
        quote! { #ident: ::core::default::Default::default(), }
    });

    // mapping, in declaration order
    let column_calls = persisted
        .iter()
        .filter(|f| !(f.attr.is_id && f.attr.generated))
        .map(|f| {
            let field_name = &f.name;
            let column = &f.column;
            quote! { .column(#field_name, #column) }
        });
    let id_name = &id.name;
    let id_column = &id.column;
    let primary_key_call = if id.attr.generated {
        quote! { .generated_primary_key(#id_name, #id_column) }
    } else {
        quote! { .primary_key(#id_name) }
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Auto-registration needs a concrete type.
    let registration = if input.generics.params.is_empty() {
        quote! {
            ::ormlite::inventory::submit! {
                ::ormlite::MappingRegistration {
                    register_fn: |registry: &mut ::ormlite::MappingRegistry| {
                        registry.register::<#name>().map(|_| ())
                    }
                }
            }
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        impl #impl_generics ::ormlite::Entity for #name #ty_generics #where_clause {
            fn field_value(&self, field: &str) -> ::core::option::Option<::ormlite::Value> {
                match field {
                    #(#value_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn from_row(row: &::ormlite::FieldRow<'_>) -> ::ormlite::OrmResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#read_fields)*
                    #(#default_fields)*
                })
            }
        }

        impl #impl_generics ::ormlite::TableMapping for #name #ty_generics #where_clause {
            fn mapping() -> ::ormlite::OrmResult<::ormlite::Mapping> {
                ::ormlite::Mapping::builder(#table_name)
                    #(#column_calls)*
                    #primary_key_call
                    .build()
            }
        }

        #registration
    })
}
