//! Runtime record model.
//!
//! Types here are the compile-time descriptors emitted by `#[derive(Record)]`
//! (or written by hand). Shapes, executors and the query engine read them
//! directly; nothing in this module touches storage.
//!
//! In general:
//! - the derive macro defines *what exists*
//! - `model` defines *what runs*
mod field;

pub use field::*;
