//! StowDB: typed records, secondary indexes and query-by-example over an
//! embedded transactional key-value engine.
//!
//! ## Crate layout
//! - `db`: the `Store`, its configuration, executors and the query engine.
//! - `model` / `traits`: record descriptors and the `Record` trait.
//! - `value`: the tagged field value and its byte codec.
//! - `obs`: per-thread operation metrics.
//!
//! ```ignore
//! use stowdb::prelude::*;
//!
//! #[derive(Default, Record)]
//! struct Person {
//!     id: String,
//!     #[record(index)]
//!     address: String,
//!     age: i64,
//! }
//!
//! let store = Store::open("people.redb", "sparkle");
//! let id = store.create(&Person { address: "Kew".into(), ..Default::default() })?;
//! ```

pub use stowdb_core::{
    DEFAULT_INDEX_NAMESPACE, KEY_SEPARATOR, db, error, model, obs, traits, value,
};
pub use stowdb_derive::Record;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// Store, errors, value vocabulary and the derive macro.
///

pub mod prelude {
    pub use stowdb_core::prelude::*;
    pub use stowdb_derive::Record;
}
