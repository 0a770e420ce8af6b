//! Thin adapter over the embedded key-value engine (`redb`).
//!
//! The store needs only atomic read-modify-write transactions with
//! get/set/delete, snapshot reads, ordered prefix scans and a not-found
//! signal that is distinguishable from failure. Everything else about the
//! engine (B-tree layout, durability, recovery) stays behind this module.
use crate::error::{Error, ErrorKind, ErrorOrigin};
use redb::{
    Database, ReadOnlyTable, ReadableTable, Table, TableDefinition, backends::InMemoryBackend,
};
use std::{ops::ControlFlow, path::Path};
use thiserror::Error as ThisError;

/// Single flat keyspace every record, field and index entry lives in.
const KEYSPACE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("stowdb");

///
/// EngineError
///

#[derive(Debug, ThisError)]
pub enum EngineError {
    #[error(transparent)]
    Redb(#[from] redb::Error),
}

impl EngineError {
    fn wrap(err: impl Into<redb::Error>) -> Self {
        Self::Redb(err.into())
    }
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        Self::new(ErrorKind::Engine, ErrorOrigin::Engine, err.to_string())
    }
}

fn engine_err(err: impl Into<redb::Error>) -> Error {
    EngineError::wrap(err).into()
}

///
/// KvRead
///
/// Read access shared by read-only and read-write transactions, so record
/// hydration runs unchanged inside either.
///

pub trait KvRead {
    /// Point read; `Ok(None)` means the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    fn contains(&self, key: &[u8]) -> Result<bool, Error> {
        Ok(self.get(key)?.is_some())
    }

    /// Visit keys in order, starting at `from`, while they start with `prefix`.
    fn scan(
        &self,
        prefix: &[u8],
        from: &[u8],
        visit: &mut dyn FnMut(&[u8]) -> ControlFlow<()>,
    ) -> Result<(), Error>;

    /// Collect every key under `prefix`.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
        let mut keys = Vec::new();
        self.scan(prefix, prefix, &mut |key| {
            keys.push(key.to_vec());
            ControlFlow::Continue(())
        })?;

        Ok(keys)
    }
}

fn get_in<T>(table: &T, key: &[u8]) -> Result<Option<Vec<u8>>, Error>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let value = table.get(key).map_err(engine_err)?;

    Ok(value.map(|guard| guard.value().to_vec()))
}

fn scan_in<T>(
    table: &T,
    prefix: &[u8],
    from: &[u8],
    visit: &mut dyn FnMut(&[u8]) -> ControlFlow<()>,
) -> Result<(), Error>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    for entry in table.range(from..).map_err(engine_err)? {
        let (key, _) = entry.map_err(engine_err)?;
        let key = key.value();
        if !key.starts_with(prefix) || visit(key).is_break() {
            break;
        }
    }

    Ok(())
}

///
/// WriteTxn
///

pub struct WriteTxn<'txn> {
    table: Table<'txn, &'static [u8], &'static [u8]>,
}

impl WriteTxn<'_> {
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.table.insert(key, value).map_err(engine_err)?;

        Ok(())
    }

    /// Remove `key`; removing an absent key is not an error.
    pub fn delete(&mut self, key: &[u8]) -> Result<(), Error> {
        self.table.remove(key).map_err(engine_err)?;

        Ok(())
    }
}

impl KvRead for WriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        get_in(&self.table, key)
    }

    fn scan(
        &self,
        prefix: &[u8],
        from: &[u8],
        visit: &mut dyn FnMut(&[u8]) -> ControlFlow<()>,
    ) -> Result<(), Error> {
        scan_in(&self.table, prefix, from, visit)
    }
}

///
/// ReadTxn
///

pub struct ReadTxn {
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl KvRead for ReadTxn {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        get_in(&self.table, key)
    }

    fn scan(
        &self,
        prefix: &[u8],
        from: &[u8],
        visit: &mut dyn FnMut(&[u8]) -> ControlFlow<()>,
    ) -> Result<(), Error> {
        scan_in(&self.table, prefix, from, visit)
    }
}

///
/// Engine
///
/// Shared handle to the database. `update` runs a closure in one write
/// transaction and commits only if the closure succeeds; `view` runs a
/// closure against a consistent snapshot.
///

pub struct Engine {
    db: Database,
}

impl Engine {
    /// Open (or create) an on-disk database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let db = Database::create(path).map_err(engine_err)?;

        Self::init(db)
    }

    /// Open a database that lives only as long as this handle.
    pub fn in_memory() -> Result<Self, Error> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(engine_err)?;

        Self::init(db)
    }

    // Read transactions cannot open a table that was never created.
    fn init(db: Database) -> Result<Self, Error> {
        let txn = db.begin_write().map_err(engine_err)?;
        txn.open_table(KEYSPACE).map_err(engine_err)?;
        txn.commit().map_err(engine_err)?;

        Ok(Self { db })
    }

    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut WriteTxn<'_>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let txn = self.db.begin_write().map_err(engine_err)?;
        let result = {
            let table = txn.open_table(KEYSPACE).map_err(engine_err)?;
            let mut write = WriteTxn { table };
            f(&mut write)
        };

        match result {
            Ok(out) => {
                txn.commit().map_err(engine_err)?;
                Ok(out)
            }
            Err(err) => {
                txn.abort().map_err(engine_err)?;
                Err(err)
            }
        }
    }

    pub fn view<T>(&self, f: impl FnOnce(&ReadTxn) -> Result<T, Error>) -> Result<T, Error> {
        let txn = self.db.begin_read().map_err(engine_err)?;
        let table = txn.open_table(KEYSPACE).map_err(engine_err)?;

        f(&ReadTxn { table })
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }
}
