use crate::{
    db::{
        engine::KvRead,
        executor::{Context, remove_index, to_u64},
        shape::Shape,
    },
    error::{BatchError, Error},
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    traits::Record,
};
use std::marker::PhantomData;

///
/// DeleteExecutor
///

pub struct DeleteExecutor<'a, R: Record> {
    ctx: Context<'a>,
    _marker: PhantomData<R>,
}

impl<'a, R: Record> DeleteExecutor<'a, R> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self {
            ctx,
            _marker: PhantomData,
        }
    }

    /// Remove every field key, index entry and the record marker of each
    /// id. Ids that do not exist are skipped, so deleting twice is fine.
    ///
    /// Returns the number of records actually removed.
    pub fn execute<I>(&self, ids: I) -> Result<usize, BatchError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut span = Span::<R>::new(ExecKind::Delete);
        let mut committed = Vec::new();
        let mut removed = 0;

        let shape = Shape::<R>::of().map_err(|source| BatchError {
            committed: Vec::new(),
            source,
        })?;
        let keys = self.ctx.keys(R::TABLE);

        for id in ids {
            let id = id.as_ref();
            let result = self.ctx.engine.update(|txn| -> Result<Option<u64>, Error> {
                let marker = keys.record_key(id)?;
                if !txn.contains(&marker)? {
                    return Ok(None);
                }

                let mut removes = 0u64;
                for field in shape.fields() {
                    let field_key = keys.field_key(id, field.name())?;
                    if field.indexed()
                        && let Some(old) = txn.get(&field_key)?
                    {
                        remove_index(txn, keys, field.name(), &old, id)?;
                        removes += 1;
                    }
                    txn.delete(&field_key)?;
                }
                txn.delete(&marker)?;

                Ok(Some(removes))
            });

            match result {
                Ok(Some(removes)) => {
                    sink::record(MetricsEvent::IndexDelta {
                        table: R::TABLE,
                        inserts: 0,
                        removes,
                    });
                    removed += 1;
                    committed.push(id.to_string());
                }
                Ok(None) => {
                    self.ctx
                        .debug_log(format!("delete {}/{id}: no such record", R::TABLE));
                    committed.push(id.to_string());
                }
                Err(source) => {
                    span.set_rows(to_u64(removed));
                    return Err(BatchError { committed, source });
                }
            }
        }
        span.set_rows(to_u64(removed));
        self.ctx
            .debug_log(format!("deleted {removed} record(s) from {}", R::TABLE));

        Ok(removed)
    }
}
