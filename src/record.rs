use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::RecordError;
use crate::model::Sample;

pub const DEFAULT_RECORD_PATH: &str = "system_performance_data.csv";

pub const HEADER: [&str; 6] = [
    "Time (s)",
    "CPU Utilization (%)",
    "Memory Usage (%)",
    "NIC Sent (bytes)",
    "NIC Received (bytes)",
    "Simulated Power Consumption (W)",
];

#[derive(Serialize)]
struct Row {
    time: String,
    cpu: f64,
    memory: f64,
    sent: u64,
    received: u64,
    power: f64,
}

impl From<&Sample> for Row {
    fn from(s: &Sample) -> Self {
        Self {
            time: format!("{:.2}", s.elapsed_seconds),
            cpu: s.cpu_percent,
            memory: s.memory_percent,
            sent: s.bytes_sent,
            received: s.bytes_received,
            power: s.simulated_power_watts,
        }
    }
}

/// Append-only CSV sink, one row per sample, flushed as it goes.
///
/// Each row is encoded on its own and handed to the sink whole, so a row
/// whose write fails is gone rather than queued behind the next one.
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl RecordWriter<File> {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Result<Self, RecordError> {
        let mut record = Self { inner: writer };
        let header = encode(|row| row.write_record(HEADER))?;
        record.put(&header)?;
        Ok(record)
    }

    pub fn write_sample(&mut self, sample: &Sample) -> Result<(), RecordError> {
        let line = encode(|row| row.serialize(Row::from(sample)))?;
        self.put(&line)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn put(&mut self, line: &[u8]) -> Result<(), RecordError> {
        self.inner.write_all(line)?;
        self.inner.flush()?;
        Ok(())
    }
}

fn encode(
    write: impl FnOnce(&mut csv::Writer<Vec<u8>>) -> csv::Result<()>,
) -> Result<Vec<u8>, RecordError> {
    let mut row = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    write(&mut row)?;
    row.into_inner().map_err(|e| RecordError::Io(e.into_error()))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io;

    use super::*;
    use crate::model::{Reading, Sample};

    /// In-memory sink whose `fail_on`-th write call (1-based) errors.
    pub(crate) struct FlakyWriter {
        pub(crate) buf: Vec<u8>,
        writes: usize,
        fail_on: usize,
    }

    impl FlakyWriter {
        pub(crate) fn failing_on(fail_on: usize) -> Self {
            Self {
                buf: Vec::new(),
                writes: 0,
                fail_on,
            }
        }

        pub(crate) fn text(&self) -> String {
            String::from_utf8(self.buf.clone()).unwrap()
        }
    }

    impl io::Write for FlakyWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            if self.writes == self.fail_on {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample(t: f64, cpu: f64) -> Sample {
        Sample::new(
            t,
            Reading {
                cpu_percent: cpu,
                memory_percent: 61.2,
                bytes_sent: 123_456,
                bytes_received: 7_890_123,
            },
        )
    }

    fn written(samples: &[Sample]) -> String {
        let mut w = RecordWriter::new(Vec::new()).unwrap();
        for s in samples {
            w.write_sample(s).unwrap();
        }
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn empty_record_is_just_the_header() {
        assert_eq!(
            written(&[]),
            "Time (s),CPU Utilization (%),Memory Usage (%),NIC Sent (bytes),NIC Received (bytes),Simulated Power Consumption (W)\n"
        );
    }

    #[test]
    fn rows_follow_header_in_column_order() {
        let out = written(&[sample(1.004, 10.0), sample(2.019, 25.5)]);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1.00,10.0,61.2,123456,7890123,5.0");
        assert_eq!(lines[2], "2.02,25.5,61.2,123456,7890123,12.75");
    }

    #[test]
    fn failed_row_does_not_resurface_on_next_write() {
        // write 1 is the header, write 2 the first row
        let mut w = RecordWriter::new(FlakyWriter::failing_on(2)).unwrap();

        assert!(matches!(
            w.write_sample(&sample(1.0, 10.0)),
            Err(RecordError::Io(_))
        ));
        w.write_sample(&sample(2.0, 20.0)).unwrap();

        let out = w.into_inner().text();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "2.00,20.0,61.2,123456,7890123,10.0");
    }
}
