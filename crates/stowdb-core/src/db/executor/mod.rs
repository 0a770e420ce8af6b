mod context;
mod create;
mod delete;
mod load;
mod update;


pub(crate) use context::*;
pub use create::CreateExecutor;
pub use delete::DeleteExecutor;
pub use load::LoadExecutor;
pub use update::UpdateExecutor;

use crate::{
    db::{
        engine::{KvRead, WriteTxn},
        key::{MARKER, TableKeys},
        shape::Shape,
    },
    error::Error,
    traits::Record,
};
use tracing::trace;

// Design notes:
// - Every single-id operation is exactly one engine transaction.
// - Multi-id operations are fail-fast and non-atomic: ids before the failing
//   one stay committed and are reported through `BatchError`.
// - Index entries change only inside the transaction that changes the
//   field they mirror.

/// Load one record by id inside an open transaction.
///
/// Returns `None` when the record marker is absent. Field keys that are
/// missing are left at their default; the id comes from the lookup, never
/// from stored bytes.
pub(crate) fn hydrate<R, T>(
    txn: &T,
    keys: TableKeys<'_>,
    shape: &Shape<R>,
    id: &str,
) -> Result<Option<R>, Error>
where
    R: Record,
    T: KvRead + ?Sized,
{
    if !txn.contains(&keys.record_key(id)?)? {
        return Ok(None);
    }

    let mut record = R::default();
    shape.assign_id(&mut record, id)?;
    for field in shape.fields() {
        let Some(bytes) = txn.get(&keys.field_key(id, field.name())?)? else {
            continue;
        };
        Shape::assign(field, &mut record, &bytes)
            .map_err(|err| err.context(&format!("{}/{id}", keys.table())))?;
    }

    Ok(Some(record))
}

/// Add the index entry for (`field`, `encoded`) -> `id`.
pub(crate) fn insert_index(
    txn: &mut WriteTxn<'_>,
    keys: TableKeys<'_>,
    field: &str,
    encoded: &[u8],
    id: &str,
) -> Result<(), Error> {
    trace!(table = keys.table(), field, id, "index insert");
    txn.set(&keys.index_key(field, encoded, id)?, MARKER)
}

/// Remove the index entry for (`field`, `encoded`) -> `id`.
pub(crate) fn remove_index(
    txn: &mut WriteTxn<'_>,
    keys: TableKeys<'_>,
    field: &str,
    encoded: &[u8],
    id: &str,
) -> Result<(), Error> {
    trace!(table = keys.table(), field, id, "index remove");
    txn.delete(&keys.index_key(field, encoded, id)?)
}

/// Saturating `usize` to `u64` for metrics.
pub(crate) fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
