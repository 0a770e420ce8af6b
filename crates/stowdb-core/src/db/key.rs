//! Keyspace layout.
//!
//! ```text
//! record marker   schema:table:id
//! field           schema:table:id:field
//! table prefix    schema:table:
//! index entry     <index-ns>:table:field:<encoded value>:id
//! index prefix    <index-ns>:table:field:<encoded value>:
//! ```
//!
//! Index keys sort by table, field, encoded value bytes and finally id, so a
//! scan over one index prefix yields the ids holding that value in id order.
use crate::{
    KEY_SEPARATOR,
    error::{Error, ErrorKind, ErrorOrigin},
};
use thiserror::Error as ThisError;

/// Value stored under record markers and index entries.
pub const MARKER: &[u8] = &[0];

///
/// KeyError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum KeyError {
    #[error("{component} must not be empty")]
    EmptyComponent { component: &'static str },

    #[error("{component} '{value}' contains the key separator")]
    ContainsSeparator {
        component: &'static str,
        value: String,
    },

    #[error("malformed key '{key}': {reason}")]
    Malformed { key: String, reason: &'static str },
}

impl KeyError {
    fn malformed(key: &[u8], reason: &'static str) -> Self {
        Self::Malformed {
            key: String::from_utf8_lossy(key).into_owned(),
            reason,
        }
    }
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        Self::new(ErrorKind::MalformedKey, ErrorOrigin::Key, err.to_string())
    }
}

/// Check one name-like key component (schema, table, field, namespace).
pub(crate) fn validate_component(component: &'static str, value: &str) -> Result<(), KeyError> {
    if value.is_empty() {
        return Err(KeyError::EmptyComponent { component });
    }
    if value.as_bytes().contains(&KEY_SEPARATOR) {
        return Err(KeyError::ContainsSeparator {
            component,
            value: value.to_string(),
        });
    }

    Ok(())
}

///
/// Keyspace
///
/// The two namespaces one store writes into: the caller's schema for
/// records and the index namespace for secondary index entries.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Keyspace {
    schema: String,
    index_namespace: String,
}

impl Keyspace {
    pub fn new(
        schema: impl Into<String>,
        index_namespace: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let schema = schema.into();
        let index_namespace = index_namespace.into();
        validate_component("schema", &schema)?;
        validate_component("index namespace", &index_namespace)?;

        Ok(Self {
            schema,
            index_namespace,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    #[must_use]
    pub fn index_namespace(&self) -> &str {
        &self.index_namespace
    }

    /// Key builder scoped to one table.
    #[must_use]
    pub const fn table<'a>(&'a self, table: &'a str) -> TableKeys<'a> {
        TableKeys {
            keyspace: self,
            table,
        }
    }
}

///
/// TableKeys
///

#[derive(Clone, Copy, Debug)]
pub struct TableKeys<'a> {
    keyspace: &'a Keyspace,
    table: &'a str,
}

impl TableKeys<'_> {
    #[must_use]
    pub const fn table(&self) -> &str {
        self.table
    }

    /// `schema:table:`, covering every record marker and field key of the table.
    #[must_use]
    pub fn table_prefix(&self) -> Vec<u8> {
        join(&[self.keyspace.schema.as_bytes(), self.table.as_bytes(), b""])
    }

    /// `schema:table:id`
    pub fn record_key(&self, id: &str) -> Result<Vec<u8>, KeyError> {
        validate_id(id)?;

        Ok(join(&[
            self.keyspace.schema.as_bytes(),
            self.table.as_bytes(),
            id.as_bytes(),
        ]))
    }

    /// `schema:table:id:field`
    pub fn field_key(&self, id: &str, field: &str) -> Result<Vec<u8>, KeyError> {
        validate_id(id)?;
        validate_component("field", field)?;

        Ok(join(&[
            self.keyspace.schema.as_bytes(),
            self.table.as_bytes(),
            id.as_bytes(),
            field.as_bytes(),
        ]))
    }

    /// `index-ns:table:field:encoded:id`
    pub fn index_key(&self, field: &str, encoded: &[u8], id: &str) -> Result<Vec<u8>, KeyError> {
        validate_id(id)?;
        let mut key = self.index_prefix(field, encoded)?;
        key.extend_from_slice(id.as_bytes());

        Ok(key)
    }

    /// `index-ns:table:field:encoded:`, covering every id currently holding `encoded`.
    pub fn index_prefix(&self, field: &str, encoded: &[u8]) -> Result<Vec<u8>, KeyError> {
        validate_component("field", field)?;

        Ok(join(&[
            self.keyspace.index_namespace.as_bytes(),
            self.table.as_bytes(),
            field.as_bytes(),
            encoded,
            b"",
        ]))
    }

    /// Classify a key found under [`Self::table_prefix`].
    ///
    /// Returns the id for record markers and `None` for field keys.
    pub fn record_id_from_table_key<'k>(&self, key: &'k [u8]) -> Result<Option<&'k str>, KeyError> {
        let prefix = self.table_prefix();
        let rest = key
            .strip_prefix(prefix.as_slice())
            .ok_or_else(|| KeyError::malformed(key, "outside table prefix"))?;
        if rest.contains(&KEY_SEPARATOR) {
            return Ok(None);
        }

        parse_id(key, rest).map(Some)
    }

    /// Extract the id from an index key found under `prefix`.
    pub fn id_from_index_key<'k>(&self, prefix: &[u8], key: &'k [u8]) -> Result<&'k str, KeyError> {
        let rest = key
            .strip_prefix(prefix)
            .ok_or_else(|| KeyError::malformed(key, "outside index prefix"))?;
        if rest.contains(&KEY_SEPARATOR) {
            return Err(KeyError::malformed(key, "index id contains separator"));
        }

        parse_id(key, rest)
    }
}

fn validate_id(id: &str) -> Result<(), KeyError> {
    validate_component("id", id)
}

fn parse_id<'k>(key: &[u8], raw: &'k [u8]) -> Result<&'k str, KeyError> {
    if raw.is_empty() {
        return Err(KeyError::malformed(key, "empty id"));
    }

    std::str::from_utf8(raw).map_err(|_| KeyError::malformed(key, "id is not UTF-8"))
}

fn join(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len() + 1).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.extend_from_slice(part);
    }

    key
}
