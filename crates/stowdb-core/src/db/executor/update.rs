use crate::{
    db::{
        engine::KvRead,
        executor::{Context, create::encode_fields, insert_index, remove_index, to_u64},
        shape::Shape,
    },
    error::{BatchError, Error},
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    traits::Record,
};
use std::marker::PhantomData;

///
/// UpdateExecutor
///
/// Partial updates. Only the template's non-default fields are written;
/// every other stored field keeps its value. The id field is never
/// rewritten.
///

pub struct UpdateExecutor<'a, R: Record> {
    ctx: Context<'a>,
    _marker: PhantomData<R>,
}

impl<'a, R: Record> UpdateExecutor<'a, R> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self {
            ctx,
            _marker: PhantomData,
        }
    }

    /// Apply `template` to every id, one transaction per id.
    ///
    /// Fails with `NoRecord` on the first id that does not exist. Ids
    /// before it stay updated and are listed in the `BatchError`.
    pub fn execute<I>(&self, template: &R, ids: I) -> Result<(), BatchError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut span = Span::<R>::new(ExecKind::Update);
        let mut committed = Vec::new();

        let encoded = Shape::derive(template, false)
            .and_then(|shape| encode_fields(&shape, template))
            .map_err(|source| BatchError {
                committed: Vec::new(),
                source,
            })?;
        self.ctx.debug_log(format!(
            "update {} with fields [{}]",
            R::TABLE,
            encoded
                .iter()
                .map(|(field, _)| field.name())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let keys = self.ctx.keys(R::TABLE);
        for id in ids {
            let id = id.as_ref();
            let result = self.ctx.engine.update(|txn| {
                let (mut inserts, mut removes) = (0u64, 0u64);
                if !txn.contains(&keys.record_key(id)?)? {
                    return Err(Error::no_record(R::TABLE, id));
                }

                for (field, bytes) in &encoded {
                    let field_key = keys.field_key(id, field.name())?;
                    if field.indexed() {
                        let old = txn.get(&field_key)?;
                        if old.as_deref() != Some(bytes.as_slice()) {
                            if let Some(old) = old {
                                remove_index(txn, keys, field.name(), &old, id)?;
                                removes += 1;
                            }
                            insert_index(txn, keys, field.name(), bytes, id)?;
                            inserts += 1;
                        }
                    }
                    txn.set(&field_key, bytes)?;
                }

                Ok((inserts, removes))
            });

            match result {
                Ok((inserts, removes)) => {
                    sink::record(MetricsEvent::IndexDelta {
                        table: R::TABLE,
                        inserts,
                        removes,
                    });
                    committed.push(id.to_string());
                }
                Err(source) => {
                    span.set_rows(to_u64(committed.len()));
                    return Err(BatchError { committed, source });
                }
            }
        }
        span.set_rows(to_u64(committed.len()));

        Ok(())
    }
}
