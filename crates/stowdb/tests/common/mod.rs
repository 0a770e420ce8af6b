#![allow(dead_code)]

use chrono::{DateTime, Utc};
use stowdb::prelude::*;

///
/// Person
///

#[derive(Clone, Debug, Default, PartialEq, Record)]
pub struct Person {
    pub id: String,
    #[record(index)]
    pub name: String,
    #[record(index)]
    pub address: String,
    #[record(index)]
    pub age: i64,
    pub height: f64,
    pub visits: isize,
    pub verified: bool,
    pub photo: Vec<u8>,
    pub born: DateTime<Utc>,
}

impl Person {
    pub fn new(name: &str, address: &str, age: i64) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            age,
            ..Self::default()
        }
    }
}

///
/// Note
/// Custom table name and id field.
///

#[derive(Clone, Debug, Default, PartialEq, Record)]
#[record(table = "notes")]
pub struct Note {
    #[record(id)]
    pub key: String,
    #[record(index)]
    pub author: String,
    pub body: String,
}

pub fn store() -> Store {
    Store::in_memory("sparkle").expect("in-memory store should open")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
