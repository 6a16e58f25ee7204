//! Parsing of struct-level and field-level `#[orm(...)]` attributes.

use syn::ext::IdentExt;
use syn::{DeriveInput, LitStr, Result};

/// Parsed field attributes.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub is_id: bool,
    pub generated: bool,
    pub skip: bool,
    pub column: Option<String>,
}

/// One persisted (or skipped) struct field.
pub(crate) struct FieldSpec {
    pub ident: syn::Ident,
    /// Field name as seen by the mapping (raw identifiers unescaped).
    pub name: String,
    pub column: String,
    pub attr: FieldAttr,
}

/// Extract table name from struct-level `#[orm(table = "...")]`.
pub(crate) fn get_table_name(input: &DeriveInput) -> Result<String> {
    let mut table = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                table = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute; expected `table = \"...\"`"))
            }
        })?;
    }
    table.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "Entity requires #[orm(table = \"table_name\")] attribute",
        )
    })
}

/// Parse every `#[orm(...)]` on a field.
pub(crate) fn get_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                out.is_id = true;
            } else if meta.path.is_ident("generated") {
                out.generated = true;
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                out.column = Some(lit.value());
            } else {
                return Err(meta.error(
                    "unsupported field attribute; expected `id`, `generated`, `skip` or `column = \"...\"`",
                ));
            }
            Ok(())
        })?;
    }

    if out.generated && !out.is_id {
        return Err(syn::Error::new_spanned(field, "`generated` is only valid together with `id`"));
    }
    if out.skip && (out.is_id || out.column.is_some()) {
        return Err(syn::Error::new_spanned(field, "`skip` cannot be combined with `id` or `column`"));
    }
    Ok(out)
}

pub(crate) fn field_spec(field: &syn::Field) -> Result<FieldSpec> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Entity fields must be named"))?;
    let attr = get_field_attr(field)?;
    let name = ident.unraw().to_string();
    let column = attr.column.clone().unwrap_or_else(|| name.clone());
    Ok(FieldSpec {
        ident,
        name,
        column,
        attr,
    })
}
