//! Periodic count records and the sinks that store them.

mod emitter;
mod eval;
mod record;
mod sink;

pub use emitter::MetricsEmitter;
pub use eval::{CountAccuracy, evaluate_counts};
pub use record::MetricsRecord;
pub use sink::{JsonLinesSink, MemorySink, MetricsSink, SharedSink, read_latest, read_records};
