use crate::value::Value;
use derive_more::Display;

///
/// FieldKind
///
/// Declared type tag of a record field.
///
/// IMPORTANT:
/// Discriminants are written as the first byte of every encoded value and
/// are therefore part of the on-disk format. Never renumber them.
///

#[repr(u8)]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FieldKind {
    Text = 1,
    Int64 = 2,
    Int = 3,
    Float64 = 4,
    Bool = 5,
    Bytes = 6,
    Timestamp = 7,
}

impl FieldKind {
    pub const ALL: [Self; 7] = [
        Self::Text,
        Self::Int64,
        Self::Int,
        Self::Float64,
        Self::Bool,
        Self::Bytes,
        Self::Timestamp,
    ];

    /// Stable wire byte tag for this kind.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Text),
            2 => Some(Self::Int64),
            3 => Some(Self::Int),
            4 => Some(Self::Float64),
            5 => Some(Self::Bool),
            6 => Some(Self::Bytes),
            7 => Some(Self::Timestamp),
            _ => None,
        }
    }
}

///
/// FieldModel
/// Static metadata for one record field.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldModel {
    /// Field name as used in keys and predicates.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether writes maintain a secondary index entry for this field.
    pub indexed: bool,
}

impl FieldModel {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind, indexed: bool) -> Self {
        Self {
            name,
            kind,
            indexed,
        }
    }
}

///
/// FieldAccessor
///
/// One row of a record type's accessor table: the field model plus plain
/// function pointers that read, write and zero-check the field on an
/// instance. Tables are built in a `const` by the derive macro, so lookups
/// never go through runtime introspection.
///

pub struct FieldAccessor<R> {
    model: FieldModel,
    get: fn(&R) -> Value,
    set: fn(&mut R, Value) -> Result<(), Value>,
    is_default: fn(&R) -> bool,
}

impl<R> FieldAccessor<R> {
    #[must_use]
    pub const fn new(
        model: FieldModel,
        get: fn(&R) -> Value,
        set: fn(&mut R, Value) -> Result<(), Value>,
        is_default: fn(&R) -> bool,
    ) -> Self {
        Self {
            model,
            get,
            set,
            is_default,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.model.name
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.model.kind
    }

    #[must_use]
    pub const fn indexed(&self) -> bool {
        self.model.indexed
    }

    /// Read the field's current value out of `record`.
    #[must_use]
    pub fn read(&self, record: &R) -> Value {
        (self.get)(record)
    }

    /// Write `value` into the field.
    /// A value of the wrong kind is handed back unchanged.
    pub fn write(&self, record: &mut R, value: Value) -> Result<(), Value> {
        (self.set)(record, value)
    }

    /// Whether the field still holds its type's zero/default value.
    #[must_use]
    pub fn is_default_in(&self, record: &R) -> bool {
        (self.is_default)(record)
    }
}

impl<R> std::fmt::Debug for FieldAccessor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
