mod codec;


use crate::{
    error::{Error, ErrorOrigin},
    model::FieldKind,
};
use chrono::{DateTime, Utc};

// re-exports
pub use codec::{MAX_LEN_PREFIXED_BYTES, ValueError, decode, encode};

///
/// Value
///
/// Tagged variant covering every storable field kind.
/// Encoding and decoding are exhaustive matches over this enum; there is no
/// untyped field storage anywhere in the store.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    Int64(i64),
    /// Native-width integer, stored as a 64-bit value.
    Int(isize),
    Float64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Int64(_) => FieldKind::Int64,
            Self::Int(_) => FieldKind::Int,
            Self::Float64(_) => FieldKind::Float64,
            Self::Bool(_) => FieldKind::Bool,
            Self::Bytes(_) => FieldKind::Bytes,
            Self::Timestamp(_) => FieldKind::Timestamp,
        }
    }

    /// Zero/default value for a kind.
    #[must_use]
    pub fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Self::Text(String::new()),
            FieldKind::Int64 => Self::Int64(0),
            FieldKind::Int => Self::Int(0),
            FieldKind::Float64 => Self::Float64(0.0),
            FieldKind::Bool => Self::Bool(false),
            FieldKind::Bytes => Self::Bytes(Vec::new()),
            FieldKind::Timestamp => Self::Timestamp(DateTime::<Utc>::default()),
        }
    }

    /// Whether this value equals its kind's zero/default.
    ///
    /// Floats compare by bit pattern, so `-0.0` is *not* a default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        match self {
            Self::Text(v) => v.is_empty(),
            Self::Int64(v) => *v == 0,
            Self::Int(v) => *v == 0,
            Self::Float64(v) => v.to_bits() == 0,
            Self::Bool(v) => !*v,
            Self::Bytes(v) => v.is_empty(),
            Self::Timestamp(v) => *v == DateTime::<Utc>::default(),
        }
    }

    /// Encode into the canonical byte layout for this value's kind.
    pub fn encode(&self) -> Result<Vec<u8>, ValueError> {
        encode(self)
    }

    /// Decode bytes that were written for a field declared as `kind`.
    pub fn decode(bytes: &[u8], kind: FieldKind) -> Result<Self, ValueError> {
        decode(bytes, kind)
    }
}

impl From<ValueError> for Error {
    fn from(err: ValueError) -> Self {
        Self::type_conversion(ErrorOrigin::Value, err.to_string())
    }
}
