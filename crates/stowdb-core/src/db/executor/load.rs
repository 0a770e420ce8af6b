use crate::{
    db::{
        engine::KvRead,
        executor::{Context, hydrate, to_u64},
        shape::Shape,
    },
    error::Error,
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    traits::Record,
};
use std::{marker::PhantomData, ops::ControlFlow};
use tracing::warn;

///
/// LoadExecutor
///
/// Point reads by id and table-ordered pagination.
///

pub struct LoadExecutor<'a, R: Record> {
    ctx: Context<'a>,
    _marker: PhantomData<R>,
}

impl<'a, R: Record> LoadExecutor<'a, R> {
    #[must_use]
    pub(crate) const fn new(ctx: Context<'a>) -> Self {
        Self {
            ctx,
            _marker: PhantomData,
        }
    }

    /// Read records by id, one snapshot per id.
    ///
    /// Ids without a record marker are skipped, so the result may be shorter
    /// than the input. Order follows the input.
    pub fn many<I>(&self, fields: &[&str], ids: I) -> Result<Vec<R>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut span = Span::<R>::new(ExecKind::Read);
        let shape = Shape::<R>::of()?.restrict(fields);
        let keys = self.ctx.keys(R::TABLE);

        let mut records = Vec::new();
        for id in ids {
            let id = id.as_ref();
            match self.ctx.engine.view(|txn| hydrate(txn, keys, &shape, id))? {
                Some(record) => records.push(record),
                None => self.ctx.debug_log(format!("read {}/{id}: skipped", R::TABLE)),
            }
        }
        span.set_rows(to_u64(records.len()));

        Ok(records)
    }

    /// Page through the table in id order.
    ///
    /// `seek` is exclusive: the page starts after that id, so feeding the
    /// last id of one page into the next call never repeats a record.
    /// `limit = 0` means no limit.
    pub fn take(&self, fields: &[&str], seek: Option<&str>, limit: usize) -> Result<Vec<R>, Error> {
        let mut span = Span::<R>::new(ExecKind::Take);
        let shape = Shape::<R>::of()?.restrict(fields);
        let keys = self.ctx.keys(R::TABLE);
        let prefix = keys.table_prefix();
        let from = match seek {
            Some(seek) if !seek.is_empty() => keys.record_key(seek)?,
            _ => prefix.clone(),
        };

        let records = self.ctx.engine.view(|txn| {
            let mut scanned = 0u64;
            let mut ids = Vec::new();
            let mut failed = None;
            txn.scan(&prefix, &from, &mut |key| {
                scanned += 1;
                match keys.record_id_from_table_key(key) {
                    Ok(Some(id)) if Some(id) != seek => ids.push(id.to_string()),
                    Ok(_) => {}
                    Err(err) => {
                        failed = Some(err);
                        return ControlFlow::Break(());
                    }
                }
                if limit > 0 && ids.len() >= limit {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })?;
            sink::record(MetricsEvent::RowsScanned {
                table: R::TABLE,
                rows_scanned: scanned,
            });
            if let Some(err) = failed {
                return Err(err.into());
            }

            let mut records = Vec::with_capacity(ids.len());
            for id in &ids {
                match hydrate(txn, keys, &shape, id)? {
                    Some(record) => records.push(record),
                    None => warn!(table = R::TABLE, id = %id, "record vanished during take"),
                }
            }

            Ok(records)
        })?;

        self.ctx.debug_log(format!(
            "take {} seek={seek:?} limit={limit}: {} record(s)",
            R::TABLE,
            records.len()
        ));
        span.set_rows(to_u64(records.len()));

        Ok(records)
    }

    /// Number of records in the table.
    pub fn count(&self) -> Result<usize, Error> {
        Shape::<R>::of()?;
        let keys = self.ctx.keys(R::TABLE);
        let prefix = keys.table_prefix();

        self.ctx.engine.view(|txn| {
            let mut count = 0;
            let mut failed = None;
            txn.scan(&prefix, &prefix, &mut |key| {
                match keys.record_id_from_table_key(key) {
                    Ok(Some(_)) => count += 1,
                    Ok(None) => {}
                    Err(err) => {
                        failed = Some(err);
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            })?;

            match failed {
                Some(err) => Err(err.into()),
                None => Ok(count),
            }
        })
    }
}
