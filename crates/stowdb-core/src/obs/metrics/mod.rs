use crate::obs::sink::ExecKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap, time::Duration};

///
/// MetricsState
/// Ephemeral, in-memory counters and timing totals for store operations.
/// One instance per thread.
///

#[derive(Debug)]
pub(crate) struct MetricsState {
    pub(crate) ops: OpCounters,
    pub(crate) perf: PerfCounters,
    pub(crate) tables: BTreeMap<String, OpCounters>,
    pub(crate) since: DateTime<Utc>,
}

impl Default for MetricsState {
    fn default() -> Self {
        Self {
            ops: OpCounters::default(),
            perf: PerfCounters::default(),
            tables: BTreeMap::new(),
            since: Utc::now(),
        }
    }
}

///
/// OpCounters
/// Used both for the process-wide totals and the per-table breakdown.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct OpCounters {
    // Executor entrypoints
    pub create_calls: u64,
    pub read_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,
    pub select_calls: u64,
    pub take_calls: u64,

    // Rows touched
    pub rows_written: u64,
    pub rows_loaded: u64,
    pub rows_scanned: u64,
    pub rows_deleted: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
}

impl OpCounters {
    pub(crate) const fn count_call(&mut self, kind: ExecKind) {
        let slot = match kind {
            ExecKind::Create => &mut self.create_calls,
            ExecKind::Read => &mut self.read_calls,
            ExecKind::Update => &mut self.update_calls,
            ExecKind::Delete => &mut self.delete_calls,
            ExecKind::Select => &mut self.select_calls,
            ExecKind::Take => &mut self.take_calls,
        };
        *slot = slot.saturating_add(1);
    }

    pub(crate) const fn count_rows(&mut self, kind: ExecKind, rows: u64) {
        let slot = match kind {
            ExecKind::Create | ExecKind::Update => &mut self.rows_written,
            ExecKind::Read | ExecKind::Select | ExecKind::Take => &mut self.rows_loaded,
            ExecKind::Delete => &mut self.rows_deleted,
        };
        *slot = slot.saturating_add(rows);
    }
}

///
/// PerfCounters
/// Wall-clock totals and maxima per executor kind.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct PerfCounters {
    pub create: ExecTiming,
    pub read: ExecTiming,
    pub update: ExecTiming,
    pub delete: ExecTiming,
    pub select: ExecTiming,
    pub take: ExecTiming,
}

impl PerfCounters {
    #[must_use]
    pub const fn get(&self, kind: ExecKind) -> &ExecTiming {
        match kind {
            ExecKind::Create => &self.create,
            ExecKind::Read => &self.read,
            ExecKind::Update => &self.update,
            ExecKind::Delete => &self.delete,
            ExecKind::Select => &self.select,
            ExecKind::Take => &self.take,
        }
    }

    const fn get_mut(&mut self, kind: ExecKind) -> &mut ExecTiming {
        match kind {
            ExecKind::Create => &mut self.create,
            ExecKind::Read => &mut self.read,
            ExecKind::Update => &mut self.update,
            ExecKind::Delete => &mut self.delete,
            ExecKind::Select => &mut self.select,
            ExecKind::Take => &mut self.take,
        }
    }
}

///
/// ExecTiming
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ExecTiming {
    pub total_micros: u128,
    pub max_micros: u64,
}

impl ExecTiming {
    /// Accumulate one call's elapsed time and track the max.
    pub(crate) fn add(&mut self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_micros = self.total_micros.saturating_add(u128::from(micros));
        if micros > self.max_micros {
            self.max_micros = micros;
        }
    }
}

thread_local! {
    static STATE: RefCell<MetricsState> = RefCell::new(MetricsState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&MetricsState) -> R) -> R {
    STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut MetricsState) -> R) -> R {
    STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Apply `f` to the global counters and to the counters of `table`.
pub(crate) fn with_counters(table: &str, f: impl Fn(&mut OpCounters)) {
    with_state_mut(|m| {
        f(&mut m.ops);
        f(m.tables.entry(table.to_string()).or_default());
    });
}

pub(crate) fn add_timing(kind: ExecKind, elapsed: Duration) {
    with_state_mut(|m| m.perf.get_mut(kind).add(elapsed));
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = MetricsState::default());
}

///
/// MetricsReport
/// Point-in-time copy of this thread's metrics.
///

#[derive(Clone, Debug, Serialize)]
pub struct MetricsReport {
    pub ops: OpCounters,
    pub perf: PerfCounters,
    pub tables: BTreeMap<String, OpCounters>,
    pub since: DateTime<Utc>,
}

#[must_use]
pub(crate) fn report() -> MetricsReport {
    with_state(|m| MetricsReport {
        ops: m.ops.clone(),
        perf: m.perf.clone(),
        tables: m.tables.clone(),
        since: m.since,
    })
}
