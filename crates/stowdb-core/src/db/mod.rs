pub mod config;
pub mod engine;
pub mod executor;
pub mod key;
pub mod query;
pub mod shape;


use crate::{
    db::{
        engine::Engine,
        executor::{Context, CreateExecutor, DeleteExecutor, LoadExecutor, UpdateExecutor},
        key::Keyspace,
        query::QueryExecutor,
    },
    error::{BatchError, Error},
    traits::Record,
};
use std::path::Path;
use tracing::{debug, info};

// re-exports
pub use config::{ConfigError, StoreConfig};
pub use shape::Shape;

///
/// Store
///
/// Typed record store over one embedded engine handle.
///
/// The store keeps no state between calls besides the engine handle and
/// its keyspace, so a `&Store` can be shared freely across threads;
/// isolation comes from the engine's transactions, not from locks here.
///

pub struct Store {
    engine: Engine,
    keyspace: Keyspace,
    debug: bool,
}

impl Store {
    /// Open a store described by `config`.
    pub fn try_open(config: &StoreConfig) -> Result<Self, Error> {
        let keyspace = config.validate()?;
        let engine = match (&config.path, config.in_memory) {
            (_, true) | (None, _) => Engine::in_memory()?,
            (Some(path), false) => Engine::open(path)?,
        };
        info!(
            schema = keyspace.schema(),
            index_namespace = keyspace.index_namespace(),
            path = ?config.path,
            "store opened"
        );

        Ok(Self {
            engine,
            keyspace,
            debug: config.debug,
        })
    }

    /// Open an on-disk store.
    ///
    /// Construction is fail-fast: a bad path or a reserved schema panics
    /// rather than handing back a store that cannot serve. Use
    /// [`Self::try_open`] to handle those errors instead.
    #[must_use]
    pub fn open(path: impl AsRef<Path>, schema: &str) -> Self {
        let config = StoreConfig::new(path.as_ref(), schema);
        match Self::try_open(&config) {
            Ok(store) => store,
            Err(err) => panic!("stowdb: cannot open store: {err}"),
        }
    }

    /// Store backed by the engine's in-memory backend.
    pub fn in_memory(schema: &str) -> Result<Self, Error> {
        Self::try_open(&StoreConfig::in_memory(schema))
    }

    /// Enable debug logging for subsequent calls on this store.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub const fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    const fn context(&self) -> Context<'_> {
        Context::new(&self.engine, &self.keyspace, self.debug)
    }

    //
    // Low-level executors
    //

    #[must_use]
    pub const fn creator<R: Record>(&self) -> CreateExecutor<'_, R> {
        CreateExecutor::new(self.context())
    }

    #[must_use]
    pub const fn loader<R: Record>(&self) -> LoadExecutor<'_, R> {
        LoadExecutor::new(self.context())
    }

    #[must_use]
    pub const fn updater<R: Record>(&self) -> UpdateExecutor<'_, R> {
        UpdateExecutor::new(self.context())
    }

    #[must_use]
    pub const fn deleter<R: Record>(&self) -> DeleteExecutor<'_, R> {
        DeleteExecutor::new(self.context())
    }

    #[must_use]
    pub const fn query<R: Record>(&self) -> QueryExecutor<'_, R> {
        QueryExecutor::new(self.context())
    }

    //
    // High-level operations
    //

    /// Create one record; returns its generated id.
    pub fn create<R: Record>(&self, record: &R) -> Result<String, Error> {
        self.creator::<R>().one(record)
    }

    /// Create records in order; returns their ids in the same order.
    pub fn create_many<R: Record>(&self, records: &[R]) -> Result<Vec<String>, BatchError> {
        self.creator::<R>().many(records)
    }

    /// Read records by id, skipping ids that do not exist.
    pub fn read<R, I>(&self, ids: I) -> Result<Vec<R>, Error>
    where
        R: Record,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.loader::<R>().many(&[], ids)
    }

    /// Like [`Self::read`], but only the allowlisted fields are loaded.
    pub fn read_fields<R, I>(&self, fields: &[&str], ids: I) -> Result<Vec<R>, Error>
    where
        R: Record,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.loader::<R>().many(fields, ids)
    }

    /// Overwrite the template's non-default fields on every id.
    pub fn update<R, I>(&self, template: &R, ids: I) -> Result<(), BatchError>
    where
        R: Record,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.updater::<R>().execute(template, ids)
    }

    /// Delete records by id; missing ids are not an error.
    pub fn delete<R, I>(&self, ids: I) -> Result<usize, BatchError>
    where
        R: Record,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.deleter::<R>().execute(ids)
    }

    /// Ids of every record matching all non-default fields of `template`.
    pub fn matching_ids<R: Record>(&self, template: &R) -> Result<Vec<String>, Error> {
        self.query::<R>().matching_ids(template)
    }

    /// Records matching all non-default fields of `template`, in id order.
    pub fn select<R: Record>(&self, template: &R) -> Result<Vec<R>, Error> {
        self.query::<R>().select(template, &[])
    }

    /// Like [`Self::select`], but only the allowlisted fields are loaded.
    pub fn select_fields<R: Record>(&self, template: &R, fields: &[&str]) -> Result<Vec<R>, Error> {
        self.query::<R>().select(template, fields)
    }

    /// One page of records in table order, starting after `seek`.
    pub fn take<R: Record>(
        &self,
        fields: &[&str],
        seek: Option<&str>,
        limit: usize,
    ) -> Result<Vec<R>, Error> {
        self.loader::<R>().take(fields, seek, limit)
    }

    /// Number of records in the table.
    pub fn count<R: Record>(&self) -> Result<usize, Error> {
        self.loader::<R>().count()
    }

    /// Run `f` against the raw engine handle.
    pub fn with_database<T>(&self, f: impl FnOnce(&redb::Database) -> T) -> T {
        f(self.engine.database())
    }

    /// Close the store, releasing the engine handle.
    pub fn close(self) {
        debug!(schema = self.keyspace.schema(), "store closed");
        drop(self.engine);
    }
}
