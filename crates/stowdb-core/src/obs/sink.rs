//! Metrics sink boundary.
//!
//! Core DB logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::{obs::metrics, traits::Record};
use derive_more::Display;
use std::{cell::RefCell, marker::PhantomData, rc::Rc, time::Instant};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ExecKind {
    Create,
    Read,
    Update,
    Delete,
    Select,
    Take,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    ExecStart {
        kind: ExecKind,
        table: &'static str,
    },
    ExecFinish {
        kind: ExecKind,
        table: &'static str,
        rows_touched: u64,
        elapsed_micros: u64,
    },
    RowsScanned {
        table: &'static str,
        rows_scanned: u64,
    },
    IndexDelta {
        table: &'static str,
        inserts: u64,
        removes: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into this thread's metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::ExecStart { kind, table } => {
                metrics::with_counters(table, |c| c.count_call(kind));
            }

            MetricsEvent::ExecFinish {
                kind,
                table,
                rows_touched,
                elapsed_micros,
            } => {
                metrics::with_counters(table, |c| c.count_rows(kind, rows_touched));
                metrics::add_timing(kind, std::time::Duration::from_micros(elapsed_micros));
            }

            MetricsEvent::RowsScanned {
                table,
                rows_scanned,
            } => {
                metrics::with_counters(table, |c| {
                    c.rows_scanned = c.rows_scanned.saturating_add(rows_scanned);
                });
            }

            MetricsEvent::IndexDelta {
                table,
                inserts,
                removes,
            } => {
                metrics::with_counters(table, |c| {
                    c.index_inserts = c.index_inserts.saturating_add(inserts);
                    c.index_removes = c.index_removes.saturating_add(removes);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    // Clone out of the slot so a sink may itself record without re-borrowing.
    let installed = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match installed {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot this thread's metrics.
#[must_use]
pub fn metrics_report() -> metrics::MetricsReport {
    metrics::report()
}

/// Reset this thread's metrics (counters + perf).
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

/// Span
/// RAII guard that emits start/finish metrics events for one executor call.
/// Ensures finish accounting happens even on early return or unwind.

pub(crate) struct Span<R: Record> {
    kind: ExecKind,
    start: Instant,
    rows: u64,
    _marker: PhantomData<R>,
}

impl<R: Record> Span<R> {
    /// Start a metrics span for a specific record type and executor kind.
    #[must_use]
    pub(crate) fn new(kind: ExecKind) -> Self {
        record(MetricsEvent::ExecStart {
            kind,
            table: R::TABLE,
        });

        Self {
            kind,
            start: Instant::now(),
            rows: 0,
            _marker: PhantomData,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl<R: Record> Drop for Span<R> {
    fn drop(&mut self) {
        let elapsed = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            table: R::TABLE,
            rows_touched: self.rows,
            elapsed_micros: elapsed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::Person;
    use std::{
        cell::Cell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    #[derive(Default)]
    struct CountingSink {
        calls: Cell<usize>,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _: MetricsEvent) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    fn scanned(rows: u64) -> MetricsEvent {
        MetricsEvent::RowsScanned {
            table: "obs::tests",
            rows_scanned: rows,
        }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        let outer = Rc::new(CountingSink::default());
        let inner = Rc::new(CountingSink::default());

        with_metrics_sink(outer.clone(), || {
            record(scanned(1));
            with_metrics_sink(inner.clone(), || record(scanned(1)));

            // inner override was restored to outer override
            record(scanned(1));
        });

        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        let sink = Rc::new(CountingSink::default());

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(sink.clone(), || {
                record(scanned(1));
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();

        assert!(panicked);
        assert_eq!(sink.calls.get(), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn global_sink_accumulates_per_table() {
        metrics_reset_all();
        record(scanned(3));
        record(MetricsEvent::IndexDelta {
            table: "obs::tests",
            inserts: 2,
            removes: 1,
        });

        let report = metrics_report();
        assert_eq!(report.ops.rows_scanned, 3);
        assert_eq!(report.ops.index_inserts, 2);
        let table = &report.tables["obs::tests"];
        assert_eq!(table.index_removes, 1);
    }

    #[test]
    fn span_records_start_and_finish_on_drop() {
        metrics_reset_all();
        {
            let mut span = Span::<Person>::new(ExecKind::Read);
            span.set_rows(4);
        }

        let report = metrics_report();
        assert_eq!(report.ops.read_calls, 1);
        assert_eq!(report.ops.rows_loaded, 4);
        assert_eq!(report.tables[Person::TABLE].read_calls, 1);
    }
}
