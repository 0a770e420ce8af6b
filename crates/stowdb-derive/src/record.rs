use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Type, ext::IdentExt,
    spanned::Spanned,
};

const KEY_SEPARATOR: char = ':';

// derive_record
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    expand(&input).unwrap_or_else(Error::into_compile_error)
}

///
/// RecordField
/// One named field plus the attributes found on it.
///

struct RecordField<'a> {
    ident: &'a Ident,
    name: String,
    ty: &'a Type,
    index: bool,
    id: bool,
}

fn expand(input: &DeriveInput) -> Result<TokenStream, Error> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            ident,
            "Record can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &data.fields,
            "Record can only be derived for structs with named fields",
        ));
    };

    let table = table_name(input)?;
    let fields = named
        .named
        .iter()
        .map(record_field)
        .collect::<Result<Vec<_>, _>>()?;
    let primary = primary_field(ident, &fields)?;
    let primary_name = &primary.name;

    let accessors = fields.iter().map(accessor);

    Ok(quote! {
        impl ::stowdb::traits::Record for #ident {
            const TABLE: &'static str = #table;
            const PRIMARY_KEY: &'static str = #primary_name;
            const FIELDS: &'static [::stowdb::model::FieldAccessor<Self>] = &[
                #(#accessors),*
            ];
        }
    })
}

// table_name
// `#[record(table = "...")]`, otherwise the struct name.
fn table_name(input: &DeriveInput) -> Result<String, Error> {
    let mut table = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                let value = lit.value();
                if value.is_empty() || value.contains(KEY_SEPARATOR) {
                    return Err(Error::new_spanned(
                        &lit,
                        "table name must be non-empty and must not contain ':'",
                    ));
                }
                table = Some(value);
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `table = \"...\"`"))
            }
        })?;
    }

    Ok(table.unwrap_or_else(|| input.ident.unraw().to_string()))
}

fn record_field(field: &Field) -> Result<RecordField<'_>, Error> {
    let Some(ident) = field.ident.as_ref() else {
        return Err(Error::new(field.span(), "expected a named field"));
    };

    let mut index = false;
    let mut id = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("index") {
                index = true;
                Ok(())
            } else if meta.path.is_ident("id") {
                id = true;
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `index` or `id`"))
            }
        })?;
    }

    Ok(RecordField {
        ident,
        name: ident.unraw().to_string(),
        ty: &field.ty,
        index,
        id,
    })
}

// primary_field
// Exactly one `#[record(id)]` field, or the field named `id`.
fn primary_field<'f, 'a>(
    ident: &Ident,
    fields: &'f [RecordField<'a>],
) -> Result<&'f RecordField<'a>, Error> {
    let mut marked = fields.iter().filter(|f| f.id);
    let primary = match (marked.next(), marked.next()) {
        (Some(_), Some(second)) => {
            return Err(Error::new_spanned(
                second.ident,
                "only one field can be marked #[record(id)]",
            ));
        }
        (Some(field), None) => field,
        (None, _) => fields.iter().find(|f| f.name == "id").ok_or_else(|| {
            Error::new_spanned(
                ident,
                "Record needs a primary id: add an `id: String` field or mark one with #[record(id)]",
            )
        })?,
    };

    if primary.index {
        return Err(Error::new_spanned(
            primary.ident,
            "the primary id field cannot be indexed",
        ));
    }
    if !is_string(primary.ty) {
        return Err(Error::new_spanned(
            primary.ty,
            "the primary id field must be a String",
        ));
    }

    Ok(primary)
}

fn accessor(field: &RecordField<'_>) -> TokenStream {
    let RecordField {
        ident,
        name,
        ty,
        index,
        ..
    } = field;

    quote! {
        ::stowdb::model::FieldAccessor::new(
            ::stowdb::model::FieldModel::new(
                #name,
                <#ty as ::stowdb::traits::FieldValue>::KIND,
                #index,
            ),
            |record: &Self| -> ::stowdb::value::Value {
                ::stowdb::traits::FieldValue::to_value(&record.#ident)
            },
            |record: &mut Self, value: ::stowdb::value::Value|
                -> ::core::result::Result<(), ::stowdb::value::Value>
            {
                record.#ident = <#ty as ::stowdb::traits::FieldValue>::from_value(value)?;
                ::core::result::Result::Ok(())
            },
            |record: &Self| -> bool {
                ::stowdb::traits::FieldValue::is_default(&record.#ident)
            },
        )
    }
}

fn is_string(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };

    path.qself.is_none()
        && path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "String" && segment.arguments.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // whitespace-free rendering, so assertions do not depend on token spacing
    fn expand_str(input: TokenStream) -> String {
        derive_record(input).to_string().replace(' ', "")
    }

    fn assert_rejected(input: TokenStream, needle: &str) {
        let out = expand_str(input);
        assert!(out.contains("compile_error"), "expected error, got: {out}");
        assert!(out.contains(needle), "missing '{needle}' in: {out}");
    }

    #[test]
    fn expands_table_primary_key_and_accessors() {
        let out = expand_str(quote! {
            #[record(table = "people")]
            struct Person {
                id: String,
                #[record(index)]
                address: String,
                r#type: i64,
            }
        });

        assert!(out.contains("constTABLE:&'staticstr=\"people\""));
        assert!(out.contains("constPRIMARY_KEY:&'staticstr=\"id\""));
        assert!(out.contains("\"address\""));
        assert!(out.contains("\"type\""));
        assert!(!out.contains("compile_error"));
    }

    #[test]
    fn table_defaults_to_struct_name_and_custom_id_is_used() {
        let out = expand_str(quote! {
            struct Pet {
                #[record(id)]
                key: String,
                owner: String,
            }
        });

        assert!(out.contains("\"Pet\""));
        assert!(out.contains("constPRIMARY_KEY:&'staticstr=\"key\""));
    }

    #[test]
    fn rejects_missing_id() {
        assert_rejected(quote! { struct NoId { name: String } }, "primaryid");
    }

    #[test]
    fn rejects_non_string_id() {
        assert_rejected(quote! { struct Num { id: u64 } }, "mustbeaString");
    }

    #[test]
    fn rejects_indexed_id() {
        assert_rejected(
            quote! { struct Bad { #[record(index)] id: String } },
            "cannotbeindexed",
        );
    }

    #[test]
    fn rejects_two_id_fields() {
        assert_rejected(
            quote! { struct Bad { #[record(id)] a: String, #[record(id)] b: String } },
            "onlyonefield",
        );
    }

    #[test]
    fn rejects_separator_in_table_name() {
        assert_rejected(
            quote! { #[record(table = "a:b")] struct Bad { id: String } },
            "mustnotcontain",
        );
    }

    #[test]
    fn rejects_tuple_generic_and_enum_inputs() {
        assert_rejected(quote! { struct T(String); }, "namedfields");
        assert_rejected(quote! { struct G<T> { id: String, t: T } }, "generic");
        assert_rejected(quote! { enum E { A } }, "namedfields");
    }

    #[test]
    fn rejects_unknown_attribute() {
        assert_rejected(
            quote! { struct Bad { id: String, #[record(unique)] name: String } },
            "unsupportedrecordattribute",
        );
    }
}
