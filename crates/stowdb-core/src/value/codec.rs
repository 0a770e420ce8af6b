//! Canonical binary layout of field values.
//!
//! Every encoding is `[kind tag][payload]`:
//!
//! | kind      | payload                                   |
//! |-----------|-------------------------------------------|
//! | Text      | u32 BE length, UTF-8 bytes                |
//! | Int64     | i64 BE                                    |
//! | Int       | i64 BE                                    |
//! | Float64   | IEEE-754 bits, u64 BE                     |
//! | Bool      | 0x00 or 0x01                              |
//! | Bytes     | u32 BE length, raw bytes                  |
//! | Timestamp | i64 BE seconds, u32 BE subsecond nanos    |
//!
//! Encodings are prefix-free within a kind, which keeps index prefix scans
//! on `...:encoded-value:` exact.
use crate::{model::FieldKind, value::Value};
use chrono::DateTime;
use thiserror::Error as ThisError;

/// Largest text or byte payload a length prefix can describe.
pub const MAX_LEN_PREFIXED_BYTES: usize = u32::MAX as usize;

const LEN_PREFIX_BYTES: usize = 4;
const TIMESTAMP_BYTES: usize = 12;

///
/// ValueError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ValueError {
    #[error("{kind} payload of {len} bytes exceeds the length prefix")]
    TooLarge { kind: FieldKind, len: usize },

    #[error("empty buffer, expected an encoded {expected}")]
    Empty { expected: FieldKind },

    #[error("unknown value tag {tag:#04x}")]
    UnknownTag { tag: u8 },

    #[error("expected {expected} value, found {found}")]
    KindMismatch {
        expected: FieldKind,
        found: FieldKind,
    },

    #[error("{kind} payload has {found} bytes, expected {expected}")]
    Length {
        kind: FieldKind,
        expected: usize,
        found: usize,
    },

    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("bool payload byte {byte:#04x} is neither 0 nor 1")]
    InvalidBool { byte: u8 },

    #[error("timestamp {secs}s + {nanos}ns is out of range")]
    TimestampOutOfRange { secs: i64, nanos: u32 },

    #[error("integer {value} does not fit a native int")]
    IntOverflow { value: i64 },
}

/// Encode a value into its canonical byte layout.
pub fn encode(value: &Value) -> Result<Vec<u8>, ValueError> {
    let kind = value.kind();
    let mut out = Vec::with_capacity(1 + payload_len_hint(value));
    out.push(kind.to_u8());

    match value {
        Value::Text(v) => put_len_prefixed(&mut out, kind, v.as_bytes())?,
        Value::Int64(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Int(v) => out.extend_from_slice(&(*v as i64).to_be_bytes()),
        Value::Float64(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
        Value::Bool(v) => out.push(u8::from(*v)),
        Value::Bytes(v) => put_len_prefixed(&mut out, kind, v)?,
        Value::Timestamp(v) => {
            out.extend_from_slice(&v.timestamp().to_be_bytes());
            out.extend_from_slice(&v.timestamp_subsec_nanos().to_be_bytes());
        }
    }

    Ok(out)
}

/// Decode bytes written for a field declared as `kind`.
///
/// No coercion between kinds: a stored Int64 read back as Text is an error.
pub fn decode(bytes: &[u8], kind: FieldKind) -> Result<Value, ValueError> {
    let (&tag, payload) = bytes
        .split_first()
        .ok_or(ValueError::Empty { expected: kind })?;
    let found = FieldKind::from_u8(tag).ok_or(ValueError::UnknownTag { tag })?;
    if found != kind {
        return Err(ValueError::KindMismatch {
            expected: kind,
            found,
        });
    }

    let value = match kind {
        FieldKind::Text => {
            let body = take_len_prefixed(kind, payload)?;
            let text = std::str::from_utf8(body).map_err(|_| ValueError::InvalidUtf8)?;
            Value::Text(text.to_string())
        }
        FieldKind::Int64 => Value::Int64(i64::from_be_bytes(fixed(kind, payload)?)),
        FieldKind::Int => {
            let value = i64::from_be_bytes(fixed(kind, payload)?);
            let value = isize::try_from(value).map_err(|_| ValueError::IntOverflow { value })?;
            Value::Int(value)
        }
        FieldKind::Float64 => {
            Value::Float64(f64::from_bits(u64::from_be_bytes(fixed(kind, payload)?)))
        }
        FieldKind::Bool => match fixed::<1>(kind, payload)? {
            [0] => Value::Bool(false),
            [1] => Value::Bool(true),
            [byte] => return Err(ValueError::InvalidBool { byte }),
        },
        FieldKind::Bytes => Value::Bytes(take_len_prefixed(kind, payload)?.to_vec()),
        FieldKind::Timestamp => {
            let raw: [u8; TIMESTAMP_BYTES] = fixed(kind, payload)?;
            let (secs, nanos) = raw.split_at(8);
            let secs = i64::from_be_bytes(fixed(kind, secs)?);
            let nanos = u32::from_be_bytes(fixed(kind, nanos)?);
            let ts = DateTime::from_timestamp(secs, nanos)
                .ok_or(ValueError::TimestampOutOfRange { secs, nanos })?;
            Value::Timestamp(ts)
        }
    };

    Ok(value)
}

// Capacity hint only; never used for validation.
fn payload_len_hint(value: &Value) -> usize {
    match value {
        Value::Text(v) => LEN_PREFIX_BYTES + v.len(),
        Value::Bytes(v) => LEN_PREFIX_BYTES + v.len(),
        Value::Int64(_) | Value::Int(_) | Value::Float64(_) => 8,
        Value::Bool(_) => 1,
        Value::Timestamp(_) => TIMESTAMP_BYTES,
    }
}

fn put_len_prefixed(out: &mut Vec<u8>, kind: FieldKind, body: &[u8]) -> Result<(), ValueError> {
    let len = u32::try_from(body.len()).map_err(|_| ValueError::TooLarge {
        kind,
        len: body.len(),
    })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(body);

    Ok(())
}

fn take_len_prefixed(kind: FieldKind, payload: &[u8]) -> Result<&[u8], ValueError> {
    let prefix: [u8; LEN_PREFIX_BYTES] = payload
        .get(..LEN_PREFIX_BYTES)
        .and_then(|p| p.try_into().ok())
        .ok_or(ValueError::Length {
            kind,
            expected: LEN_PREFIX_BYTES,
            found: payload.len(),
        })?;
    let len = u32::from_be_bytes(prefix) as usize;
    let body = &payload[LEN_PREFIX_BYTES..];
    if body.len() != len {
        return Err(ValueError::Length {
            kind,
            expected: LEN_PREFIX_BYTES + len,
            found: payload.len(),
        });
    }

    Ok(body)
}

fn fixed<const N: usize>(kind: FieldKind, payload: &[u8]) -> Result<[u8; N], ValueError> {
    payload.try_into().map_err(|_| ValueError::Length {
        kind,
        expected: N,
        found: payload.len(),
    })
}
