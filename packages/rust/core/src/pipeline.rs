//! End-to-end export: catalog source → concepts → encoded document → sink.

use std::io::Write;
use std::time::Instant;

use tracing::{info, instrument};

use harvestdoc_export::{CsvEncoder, ExportFormat};
use harvestdoc_shared::{Concept, Result};
use harvestdoc_source::CatalogSource;

/// Result of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Format that was written.
    pub format: ExportFormat,
    /// Concepts read from the source.
    pub concepts: usize,
    /// Data rows written (header excluded).
    pub rows: usize,
}

/// Fetch the catalog from `source` and write it to `sink` in `format`.
///
/// Source errors surface before anything is written to the sink.
#[instrument(skip_all, fields(source = %source.describe(), format = %format))]
pub async fn export<W: Write>(
    source: &CatalogSource,
    format: ExportFormat,
    sink: W,
) -> Result<ExportSummary> {
    let start = Instant::now();

    let concepts = source.concepts().await?;
    let summary = encode(&concepts, format, sink)?;

    info!(
        concepts = summary.concepts,
        rows = summary.rows,
        elapsed_ms = start.elapsed().as_millis(),
        "export completed"
    );

    Ok(summary)
}

/// Run [`export`] into an in-memory buffer.
pub async fn export_to_vec(source: &CatalogSource, format: ExportFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    export(source, format, &mut buf).await?;
    Ok(buf)
}

/// Encode already-loaded concepts to `sink`, flushing before returning.
pub fn encode<W: Write>(concepts: &[Concept], format: ExportFormat, sink: W) -> Result<ExportSummary> {
    let rows = match format {
        ExportFormat::Csv => {
            let mut encoder = CsvEncoder::new(sink);
            encoder.encode(concepts)?;
            let rows = encoder.rows_written();
            encoder.into_inner()?;
            rows
        }
    };

    Ok(ExportSummary {
        format,
        concepts: concepts.len(),
        rows,
    })
}
