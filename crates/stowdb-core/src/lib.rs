//! Core runtime for StowDB: record traits, values, the keyspace layout,
//! shapes, store executors and the equality query engine.
#![warn(unreachable_pub)]

extern crate self as stowdb;

// public exports are one module level down
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Namespace every secondary index entry lives under, unless the store
/// configuration overrides it.
pub const DEFAULT_INDEX_NAMESPACE: &str = "system.index";

/// Byte joining the components of every key in the keyspace.
///
/// Schema, table, field and index namespace names must never contain it.
pub const KEY_SEPARATOR: u8 = b':';

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No executors or engine handles are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{Store, StoreConfig},
        error::{BatchError, Error, ErrorKind},
        model::{FieldKind, FieldModel},
        traits::{FieldValue, Record},
        value::Value,
    };
}
