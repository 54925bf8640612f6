//! Streaming CSV encoder.

use std::io::{self, Write};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::{debug, instrument};

use harvestdoc_shared::{Concept, HarvestError, Result};

use crate::flatten;

/// Header row, written once per encoder.
pub const HEADER: [&str; 4] = ["Field", "Concept", "Category", "Description"];

/// Whether an encoder has written its header yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    NotStarted,
    Started,
}

/// Writes concepts to a sink as CSV, one row per field.
///
/// `encode` may be called repeatedly against the same sink; only the first
/// call emits the header. Output is append-only: if the sink fails part
/// way through, whatever already reached it stays there and the encoder is
/// spent. Every later `encode` or `into_inner` returns the first error and
/// nothing more is written, not even when the encoder is dropped.
pub struct CsvEncoder<W: Write> {
    csv: csv::Writer<LatchingSink<W>>,
    state: EncoderState,
    rows_written: usize,
}

impl<W: Write> CsvEncoder<W> {
    /// Create an encoder writing to `sink`.
    pub fn new(sink: W) -> Self {
        let csv = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(LatchingSink::new(sink));

        Self {
            csv,
            state: EncoderState::NotStarted,
            rows_written: 0,
        }
    }

    /// Current header state.
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Data rows written so far, across all `encode` calls.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Append one batch of concepts and flush the sink.
    ///
    /// The batch is validated before anything is written, so a batch
    /// rejected with [`HarvestError::MissingCategory`] leaves the sink and
    /// the header state untouched.
    #[instrument(skip_all, fields(concepts = concepts.len()))]
    pub fn encode(&mut self, concepts: &[Concept]) -> Result<()> {
        self.check_sink()?;
        let rows = flatten(concepts)?;

        if self.state == EncoderState::NotStarted {
            self.csv.write_record(HEADER).map_err(write_error)?;
            self.state = EncoderState::Started;
        }

        for row in &rows {
            self.csv.write_record(row.cells()).map_err(write_error)?;
            self.rows_written += 1;
        }

        self.csv
            .flush()
            .map_err(|e| HarvestError::Write(e.to_string()))?;

        debug!(rows = rows.len(), total = self.rows_written, "batch encoded");
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn into_inner(self) -> Result<W> {
        self.check_sink()?;
        self.csv
            .into_inner()
            .map(|sink| sink.inner)
            .map_err(|e| HarvestError::Write(e.error().to_string()))
    }

    fn check_sink(&self) -> Result<()> {
        match &self.csv.get_ref().failure {
            Some(message) => Err(HarvestError::Write(message.clone())),
            None => Ok(()),
        }
    }
}

/// Sink wrapper that refuses all I/O after the first failure.
///
/// `csv::Writer` keeps its buffer when a flush fails and retries the whole
/// buffer on the next flush (including the one in its `Drop`), which would
/// repeat bytes the sink already accepted.
struct LatchingSink<W> {
    inner: W,
    failure: Option<String>,
}

impl<W> LatchingSink<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            failure: None,
        }
    }

    fn check(&self) -> io::Result<()> {
        match &self.failure {
            Some(message) => Err(io::Error::other(message.clone())),
            None => Ok(()),
        }
    }

    fn latch<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        match &result {
            Err(e) if e.kind() != io::ErrorKind::Interrupted => {
                self.failure = Some(e.to_string());
            }
            _ => {}
        }
        result
    }
}

impl<W: Write> Write for LatchingSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check()?;
        let result = self.inner.write(buf);
        self.latch(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check()?;
        let result = self.inner.flush();
        self.latch(result)
    }
}

fn write_error(e: csv::Error) -> HarvestError {
    HarvestError::Write(e.to_string())
}
