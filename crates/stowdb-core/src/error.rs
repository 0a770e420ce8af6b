use derive_more::Display;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured error returned by every public store operation.
/// `kind` is the stable classification callers branch on; `origin` names the
/// subsystem that raised it and `message` carries the operation context.
///

#[derive(Debug, ThisError)]
#[error("{origin}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Malformed call shape (empty batch, unknown or non-indexed field, ...).
    pub(crate) fn invalid_parameter(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, origin, message)
    }

    pub(crate) fn no_primary_id(table: &str, primary_key: &str) -> Self {
        Self::new(
            ErrorKind::NoPrimaryId,
            ErrorOrigin::Shape,
            format!("record '{table}' has no text primary id field named '{primary_key}'"),
        )
    }

    pub(crate) fn no_record(table: &str, id: &str) -> Self {
        Self::new(
            ErrorKind::NoRecord,
            ErrorOrigin::Store,
            format!("record does not exist: {table}/{id}"),
        )
    }

    pub(crate) fn reserved_word(schema: &str, token: &str) -> Self {
        Self::new(
            ErrorKind::ReservedWord,
            ErrorOrigin::Config,
            format!("schema '{schema}' starts with reserved token '{token}'"),
        )
    }

    pub(crate) fn type_conversion(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeConversion, origin, message)
    }

    /// Prefix the message with the operation that surfaced the error.
    #[must_use]
    pub(crate) fn context(mut self, op: &str) -> Self {
        self.message = format!("{op}: {}", self.message);
        self
    }

    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

///
/// ErrorKind
///
/// Stable error taxonomy. Engine and configuration failures are kept apart
/// from the record-level kinds so callers can tell "your call was wrong"
/// from "the store could not do it".
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    #[display("invalid parameter")]
    InvalidParameter,
    #[display("primary id field does not exist")]
    NoPrimaryId,
    #[display("type conversion")]
    TypeConversion,
    #[display("record does not exist")]
    NoRecord,
    #[display("reserved identifier used")]
    ReservedWord,
    #[display("malformed key or zero key fields")]
    MalformedKey,
    #[display("engine")]
    Engine,
    #[display("config")]
    Config,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ErrorOrigin {
    #[display("config")]
    Config,
    #[display("engine")]
    Engine,
    #[display("key")]
    Key,
    #[display("query")]
    Query,
    #[display("shape")]
    Shape,
    #[display("store")]
    Store,
    #[display("value")]
    Value,
}

///
/// BatchError
///
/// A multi-record write that stopped part way. Every id in `committed`
/// was written in its own transaction before `source` occurred.
///

#[derive(Debug, ThisError)]
#[error("batch stopped after {} committed record(s): {source}", .committed.len())]
pub struct BatchError {
    pub committed: Vec<String>,
    #[source]
    pub source: Error,
}

impl From<BatchError> for Error {
    fn from(err: BatchError) -> Self {
        let committed = err.committed.len();
        err.source
            .context(&format!("batch stopped after {committed} committed record(s)"))
    }
}
