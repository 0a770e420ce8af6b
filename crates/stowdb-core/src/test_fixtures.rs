//! Record types shared by the core's unit tests.
use crate::{
    model::{FieldAccessor, FieldKind, FieldModel},
    traits::{FieldValue, Record},
    value::Value,
};
use chrono::{DateTime, Utc};
use stowdb_derive::Record;

///
/// Person
///

#[derive(Clone, Debug, Default, PartialEq, Record)]
#[record(table = "Person")]
pub(crate) struct Person {
    pub(crate) id: String,
    #[record(index)]
    pub(crate) name: String,
    #[record(index)]
    pub(crate) address: String,
    #[record(index)]
    pub(crate) age: i64,
    pub(crate) height: f64,
    pub(crate) rank: isize,
    #[record(index)]
    pub(crate) active: bool,
    pub(crate) avatar: Vec<u8>,
    pub(crate) joined: DateTime<Utc>,
}

impl Person {
    pub(crate) fn new(name: &str, address: &str, age: i64) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            age,
            ..Self::default()
        }
    }
}

///
/// Pet
/// Custom id field and a table name that shares a prefix with `Person`.
///

#[derive(Clone, Debug, Default, PartialEq, Record)]
#[record(table = "PersonPet")]
pub(crate) struct Pet {
    #[record(id)]
    pub(crate) tag: String,
    #[record(index)]
    pub(crate) owner: String,
    pub(crate) species: String,
}

///
/// Headless
/// Hand-written impl whose PRIMARY_KEY names a field that does not exist.
///

#[derive(Debug, Default)]
pub(crate) struct Headless {
    pub(crate) label: String,
}

impl Record for Headless {
    const TABLE: &'static str = "Headless";
    const PRIMARY_KEY: &'static str = "id";
    const FIELDS: &'static [FieldAccessor<Self>] = &[FieldAccessor::new(
        FieldModel::new("label", FieldKind::Text, false),
        |record: &Self| -> Value { record.label.to_value() },
        |record: &mut Self, value: Value| -> Result<(), Value> {
            record.label = String::from_value(value)?;
            Ok(())
        },
        |record: &Self| -> bool { record.label.is_default() },
    )];
}

///
/// BadTable
/// Hand-written impl with a table name that would break key boundaries.
///

#[derive(Debug, Default)]
pub(crate) struct BadTable {
    pub(crate) id: String,
}

impl Record for BadTable {
    const TABLE: &'static str = "bad:table";
    const PRIMARY_KEY: &'static str = "id";
    const FIELDS: &'static [FieldAccessor<Self>] = &[FieldAccessor::new(
        FieldModel::new("id", FieldKind::Text, false),
        |record: &Self| -> Value { record.id.to_value() },
        |record: &mut Self, value: Value| -> Result<(), Value> {
            record.id = String::from_value(value)?;
            Ok(())
        },
        |record: &Self| -> bool { record.id.is_default() },
    )];
}
