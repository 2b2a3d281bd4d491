//! Append-only destinations for [`MetricsRecord`]s.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::error::SinkError;
use crate::metrics::MetricsRecord;

/// Receives metrics records; records are only ever appended.
pub trait MetricsSink: Send {
    fn emit(&mut self, record: &MetricsRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn emit(&mut self, record: &MetricsRecord) -> Result<(), SinkError> {
        (**self).emit(record)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

/// One JSON object per line, appended to a file that is never rewritten.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetricsSink for JsonLinesSink {
    fn emit(&mut self, record: &MetricsRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<MetricsRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MetricsRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&MetricsRecord> {
        self.records.last()
    }
}

impl MetricsSink for MemorySink {
    fn emit(&mut self, record: &MetricsRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// A sink shared by several camera pipelines; appends are serialized by a lock.
pub struct SharedSink<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedSink<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: MetricsSink> SharedSink<S> {
    pub fn new(sink: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, S>, SinkError> {
        self.inner.lock().map_err(|_| SinkError::Poisoned)
    }
}

impl<S: MetricsSink> MetricsSink for SharedSink<S> {
    fn emit(&mut self, record: &MetricsRecord) -> Result<(), SinkError> {
        self.lock()?.emit(record)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.lock()?.flush()
    }
}

/// Read every record from a JSON-lines metrics file, skipping blank lines.
///
/// Fails on the first line that does not decode; see [`read_latest`] for a
/// reader that tolerates a partially written tail.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<MetricsRecord>, SinkError> {
    let mut records = Vec::new();
    for (line, parsed) in parse_lines(path)? {
        records.push(parsed.map_err(|source| SinkError::Decode { line, source })?);
    }
    Ok(records)
}

fn parse_lines(
    path: impl AsRef<Path>,
) -> Result<Vec<(usize, serde_json::Result<MetricsRecord>)>, SinkError> {
    let reader = BufReader::new(File::open(path)?);
    let mut parsed = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        parsed.push((index + 1, serde_json::from_str(&line)));
    }
    Ok(parsed)
}

/// The most recently appended record, optionally restricted to one camera.
///
/// A missing file means nothing has been emitted yet and yields `None`. Lines
/// that do not decode, such as a tail cut short by an interrupted append, are
/// skipped with a warning.
pub fn read_latest(
    path: impl AsRef<Path>,
    camera_id: Option<&str>,
) -> Result<Option<MetricsRecord>, SinkError> {
    let parsed = match parse_lines(path) {
        Ok(parsed) => parsed,
        Err(SinkError::Io(err)) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    Ok(parsed
        .into_iter()
        .rev()
        .filter_map(|(line, record)| match record {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(line, %err, "skipping undecodable metrics line");
                None
            }
        })
        .find(|r| camera_id.is_none_or(|id| r.camera_id == id)))
}
