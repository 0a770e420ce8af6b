use crate::{
    model::{FieldAccessor, FieldKind},
    value::Value,
};
use chrono::{DateTime, Utc};

// ============================================================================
// FIELD VALUES
// ============================================================================
//
// Bridges between plain Rust field types and the tagged `Value` enum.
//

///
/// FieldValue
///
/// A Rust type that can be stored as one record field.
///
/// `is_default` is the per-type zero check behind partial updates and
/// query-by-example: fields still at their default are left out of
/// non-default shapes.
///

pub trait FieldValue: Sized {
    const KIND: FieldKind;

    fn to_value(&self) -> Value;

    /// Convert back from a `Value`; a value of another kind is returned as-is.
    fn from_value(value: Value) -> Result<Self, Value>;

    fn is_default(&self) -> bool;
}

macro_rules! impl_field_value {
    ($ty:ty, $variant:ident, |$v:ident| $to_value:expr, $is_default:expr) => {
        impl FieldValue for $ty {
            const KIND: FieldKind = FieldKind::$variant;

            fn to_value(&self) -> Value {
                let $v = self;
                Value::$variant($to_value)
            }

            fn from_value(value: Value) -> Result<Self, Value> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(other),
                }
            }

            fn is_default(&self) -> bool {
                let $v = self;
                $is_default
            }
        }
    };
}

impl_field_value!(String, Text, |v| v.clone(), v.is_empty());
impl_field_value!(i64, Int64, |v| *v, *v == 0);
impl_field_value!(isize, Int, |v| *v, *v == 0);
impl_field_value!(f64, Float64, |v| *v, v.to_bits() == 0);
impl_field_value!(bool, Bool, |v| *v, !*v);
impl_field_value!(Vec<u8>, Bytes, |v| v.clone(), v.is_empty());
impl_field_value!(DateTime<Utc>, Timestamp, |v| *v, *v == DateTime::<Utc>::default());

// ============================================================================
// RECORDS
// ============================================================================

///
/// Record
///
/// A struct persisted as one record per instance.
///
/// Implementations are normally generated by `#[derive(Record)]`, which
/// builds `FIELDS` at compile time. `FIELDS` lists every field, including
/// the primary id field named by `PRIMARY_KEY`.
///

pub trait Record: Default + Sized + 'static {
    /// Table name used in every key this record type occupies.
    const TABLE: &'static str;

    /// Name of the text field that carries the record's unique id.
    const PRIMARY_KEY: &'static str;

    /// Accessor table, in declaration order.
    const FIELDS: &'static [FieldAccessor<Self>];

    /// Look up a field accessor by name.
    #[must_use]
    fn field(name: &str) -> Option<&'static FieldAccessor<Self>> {
        Self::FIELDS.iter().find(|field| field.name() == name)
    }
}
