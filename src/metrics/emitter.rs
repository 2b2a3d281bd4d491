use std::time::{Duration, Instant};

use chrono::Utc;

use crate::counting::FlowCounts;
use crate::error::SinkError;
use crate::metrics::{MetricsRecord, MetricsSink};

/// Writes a [`MetricsRecord`] for one camera every `interval` of wall-clock time.
pub struct MetricsEmitter<S> {
    camera_id: String,
    interval: Duration,
    last_emit: Instant,
    sink: S,
    emitted: u64,
}

impl<S: MetricsSink> MetricsEmitter<S> {
    pub fn new(camera_id: impl Into<String>, interval: Duration, sink: S) -> Self {
        Self::starting_at(camera_id, interval, sink, Instant::now())
    }

    /// Like [`MetricsEmitter::new`] with an explicit start of the first interval.
    pub fn starting_at(
        camera_id: impl Into<String>,
        interval: Duration,
        sink: S,
        start: Instant,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            interval,
            last_emit: start,
            sink,
            emitted: 0,
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    /// Records successfully written so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Emit a record if more than one interval has passed since the last one.
    ///
    /// The interval restarts even when the write fails, so a broken sink costs
    /// one attempt per interval rather than one per frame.
    pub fn tick(
        &mut self,
        now: Instant,
        counts: FlowCounts,
        active: usize,
    ) -> Result<Option<MetricsRecord>, SinkError> {
        if now.duration_since(self.last_emit) <= self.interval {
            return Ok(None);
        }
        self.last_emit = now;
        self.write(counts, active).map(Some)
    }

    /// Emit a final record regardless of the interval and flush the sink.
    pub fn flush(&mut self, counts: FlowCounts, active: usize) -> Result<MetricsRecord, SinkError> {
        self.last_emit = Instant::now();
        let record = self.write(counts, active)?;
        self.sink.flush()?;
        Ok(record)
    }

    fn write(&mut self, counts: FlowCounts, active: usize) -> Result<MetricsRecord, SinkError> {
        let record = MetricsRecord::new(Utc::now(), self.camera_id.clone(), counts, active);
        self.sink.emit(&record)?;
        self.emitted += 1;
        Ok(record)
    }
}
