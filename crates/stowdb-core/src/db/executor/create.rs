use crate::{
    db::{
        executor::{Context, insert_index, to_u64},
        key::MARKER,
        shape::Shape,
    },
    error::{BatchError, Error, ErrorOrigin},
    model::FieldAccessor,
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    traits::Record,
};
use std::marker::PhantomData;
use ulid::Ulid;

///
/// CreateExecutor
///
/// Writes new records. Every field is written, default-valued ones
/// included, and each record gets a freshly generated id.
///

pub struct CreateExecutor<'a, R: Record> {
    ctx: Context<'a>,
    _marker: PhantomData<R>,
}

impl<'a, R: Record> CreateExecutor<'a, R> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self {
            ctx,
            _marker: PhantomData,
        }
    }

    /// Create one record and return its id.
    pub fn one(&self, record: &R) -> Result<String, Error> {
        let mut span = Span::<R>::new(ExecKind::Create);
        let id = self.write(record)?;
        span.set_rows(1);

        Ok(id)
    }

    /// Create records in order, one transaction each.
    ///
    /// Fail-fast and non-atomic: on error, the ids already committed are
    /// returned inside the `BatchError`.
    pub fn many(&self, records: &[R]) -> Result<Vec<String>, BatchError> {
        let mut span = Span::<R>::new(ExecKind::Create);
        if records.is_empty() {
            return Err(BatchError {
                committed: Vec::new(),
                source: Error::invalid_parameter(
                    ErrorOrigin::Store,
                    "create needs at least one record",
                ),
            });
        }

        let mut committed = Vec::with_capacity(records.len());
        for record in records {
            match self.write(record) {
                Ok(id) => committed.push(id),
                Err(source) => {
                    span.set_rows(to_u64(committed.len()));
                    return Err(BatchError { committed, source });
                }
            }
        }
        span.set_rows(to_u64(committed.len()));

        Ok(committed)
    }

    fn write(&self, record: &R) -> Result<String, Error> {
        let shape = Shape::derive(record, true)?;
        let encoded = encode_fields(&shape, record)?;
        let id = Ulid::new().to_string();
        let keys = self.ctx.keys(R::TABLE);

        let inserts = self.ctx.engine.update(|txn| {
            let mut inserts = 0u64;
            txn.set(&keys.record_key(&id)?, MARKER)?;
            for (field, bytes) in &encoded {
                txn.set(&keys.field_key(&id, field.name())?, bytes)?;
                if field.indexed() {
                    insert_index(txn, keys, field.name(), bytes, &id)?;
                    inserts += 1;
                }
            }

            Ok(inserts)
        })?;

        sink::record(MetricsEvent::IndexDelta {
            table: R::TABLE,
            inserts,
            removes: 0,
        });
        self.ctx
            .debug_log(format!("created {}/{id} ({} fields)", R::TABLE, encoded.len()));

        Ok(id)
    }
}

/// Encode every field of the shape up front, so a value that cannot be
/// encoded fails the call before any transaction starts.
pub(super) fn encode_fields<R: Record>(
    shape: &Shape<R>,
    record: &R,
) -> Result<Vec<(&'static FieldAccessor<R>, Vec<u8>)>, Error> {
    shape
        .fields()
        .iter()
        .map(|field| {
            let bytes = field
                .read(record)
                .encode()
                .map_err(|err| Error::from(err).context(field.name()))?;
            Ok((*field, bytes))
        })
        .collect()
}
