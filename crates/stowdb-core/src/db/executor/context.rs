use crate::db::{
    engine::Engine,
    key::{Keyspace, TableKeys},
};
use tracing::debug;

///
/// Context
/// Borrowed view of one store that executors run against.
///

#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub(crate) engine: &'a Engine,
    pub(crate) keyspace: &'a Keyspace,
    pub(crate) debug: bool,
}

impl<'a> Context<'a> {
    #[must_use]
    pub(crate) const fn new(engine: &'a Engine, keyspace: &'a Keyspace, debug: bool) -> Self {
        Self {
            engine,
            keyspace,
            debug,
        }
    }

    #[must_use]
    pub(crate) const fn keys(&self, table: &'a str) -> TableKeys<'a> {
        self.keyspace.table(table)
    }

    pub(crate) fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            debug!(schema = self.keyspace.schema(), "{}", s.as_ref());
        }
    }
}
