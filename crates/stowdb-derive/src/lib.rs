use proc_macro::TokenStream;

mod record;

/// Derive `stowdb::traits::Record` for a struct with named fields.
///
/// Struct attribute: `#[record(table = "name")]` (defaults to the struct
/// name). Field attributes: `#[record(index)]` maintains a secondary index,
/// `#[record(id)]` selects the primary id field (defaults to `id`, must be
/// a `String`).
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
