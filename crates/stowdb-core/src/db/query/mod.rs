//! Equality query by example.
//!
//! The non-default fields of a template record are the predicates. Each
//! predicate is resolved with one index prefix scan; the candidate id sets
//! are intersected (logical AND), then narrowed to ids whose record marker
//! exists in this store's schema. An all-default template matches nothing.
#[cfg(test)]
mod tests;

use crate::{
    db::{
        engine::{KvRead, ReadTxn},
        executor::{Context, hydrate, to_u64},
        key::TableKeys,
        shape::Shape,
    },
    error::{Error, ErrorOrigin},
    model::FieldAccessor,
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    traits::Record,
};
use std::{collections::BTreeSet, marker::PhantomData, ops::ControlFlow};
use tracing::warn;

///
/// Predicate
/// One `field == encoded value` condition taken from a template.
///

struct Predicate<R: 'static> {
    field: &'static FieldAccessor<R>,
    encoded: Vec<u8>,
}

///
/// QueryExecutor
///

pub struct QueryExecutor<'a, R: Record> {
    ctx: Context<'a>,
    _marker: PhantomData<R>,
}

impl<'a, R: Record> QueryExecutor<'a, R> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self {
            ctx,
            _marker: PhantomData,
        }
    }

    /// Ids of all records matching every predicate of `template`, in id order.
    pub fn matching_ids(&self, template: &R) -> Result<Vec<String>, Error> {
        let _span = Span::<R>::new(ExecKind::Select);
        let predicates = Self::predicates(template)?;
        let keys = self.ctx.keys(R::TABLE);

        let ids = self
            .ctx
            .engine
            .view(|txn| Self::resolve(txn, keys, &predicates))?;

        Ok(ids.into_iter().collect())
    }

    /// Records matching `template`, loaded in the same snapshot the ids were
    /// resolved in. `fields` restricts which fields are hydrated.
    pub fn select(&self, template: &R, fields: &[&str]) -> Result<Vec<R>, Error> {
        let mut span = Span::<R>::new(ExecKind::Select);
        let predicates = Self::predicates(template)?;
        let shape = Shape::<R>::of()?.restrict(fields);
        let keys = self.ctx.keys(R::TABLE);

        let records = self.ctx.engine.view(|txn| {
            let ids = Self::resolve(txn, keys, &predicates)?;
            let mut records = Vec::with_capacity(ids.len());
            for id in &ids {
                match hydrate(txn, keys, &shape, id)? {
                    Some(record) => records.push(record),
                    None => warn!(table = R::TABLE, id = %id, "index entry without record"),
                }
            }

            Ok(records)
        })?;

        self.ctx.debug_log(format!(
            "select {} on [{}]: {} record(s)",
            R::TABLE,
            predicates
                .iter()
                .map(|p| p.field.name())
                .collect::<Vec<_>>()
                .join(", "),
            records.len()
        ));
        span.set_rows(to_u64(records.len()));

        Ok(records)
    }

    // Non-default template fields become predicates; each must be indexed.
    fn predicates(template: &R) -> Result<Vec<Predicate<R>>, Error> {
        let shape = Shape::derive(template, false)?;

        shape
            .fields()
            .iter()
            .map(|&field| {
                if !field.indexed() {
                    return Err(Error::invalid_parameter(
                        ErrorOrigin::Query,
                        format!(
                            "field '{}' of '{}' is not indexed and cannot be queried",
                            field.name(),
                            R::TABLE
                        ),
                    ));
                }

                Ok(Predicate {
                    field,
                    encoded: field.read(template).encode()?,
                })
            })
            .collect()
    }

    fn resolve(
        txn: &ReadTxn,
        keys: TableKeys<'_>,
        predicates: &[Predicate<R>],
    ) -> Result<BTreeSet<String>, Error> {
        let mut result: Option<BTreeSet<String>> = None;

        for predicate in predicates {
            let candidates = Self::scan_index(txn, keys, predicate)?;
            let narrowed = match result {
                None => candidates,
                Some(current) => current.intersection(&candidates).cloned().collect(),
            };
            if narrowed.is_empty() {
                return Ok(BTreeSet::new());
            }
            result = Some(narrowed);
        }

        // Index keys carry no schema, so another schema sharing the file
        // may own some of these ids.
        let mut live = BTreeSet::new();
        for id in result.unwrap_or_default() {
            if txn.contains(&keys.record_key(&id)?)? {
                live.insert(id);
            }
        }

        Ok(live)
    }

    fn scan_index(
        txn: &ReadTxn,
        keys: TableKeys<'_>,
        predicate: &Predicate<R>,
    ) -> Result<BTreeSet<String>, Error> {
        let prefix = keys.index_prefix(predicate.field.name(), &predicate.encoded)?;
        let mut ids = BTreeSet::new();
        let mut scanned = 0u64;
        let mut failed = None;

        txn.scan(&prefix, &prefix, &mut |key| {
            scanned += 1;
            match keys.id_from_index_key(&prefix, key) {
                Ok(id) => {
                    ids.insert(id.to_string());
                    ControlFlow::Continue(())
                }
                Err(err) => {
                    failed = Some(err);
                    ControlFlow::Break(())
                }
            }
        })?;
        sink::record(MetricsEvent::RowsScanned {
            table: R::TABLE,
            rows_scanned: scanned,
        });

        match failed {
            Some(err) => Err(err.into()),
            None => Ok(ids),
        }
    }
}
