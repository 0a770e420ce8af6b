//! Observability: per-thread operation counters and the sink they flow
//! through.
//!
//! Executors never touch `metrics` directly; they emit `MetricsEvent`s via
//! `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{ExecTiming, MetricsReport, OpCounters, PerfCounters};
pub use sink::{
    ExecKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink,
};
