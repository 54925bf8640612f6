//! Flattening export of a concept catalog.
//!
//! Each concept expands into one row per field, in catalog order:
//!
//! ```text
//! Field,Concept,Category,Description
//! Age,Patient,Demographics,years old
//! ```

mod csv_encoder;

use std::fmt;
use std::str::FromStr;

use harvestdoc_shared::{Concept, HarvestError, Result};

pub use csv_encoder::{CsvEncoder, EncoderState, HEADER};

// ---------------------------------------------------------------------------
// ExportFormat
// ---------------------------------------------------------------------------

/// Output formats the exporter can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
}

impl ExportFormat {
    /// MIME type of the encoded document.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            other => Err(format!("unsupported export format '{other}': expected 'csv'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// One exported line: a field together with its owning concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    pub field: &'a str,
    pub concept: &'a str,
    pub category: &'a str,
    /// Field description with surrounding whitespace removed.
    pub description: &'a str,
}

impl<'a> Row<'a> {
    /// Cells in header order.
    pub fn cells(&self) -> [&'a str; 4] {
        [self.field, self.concept, self.category, self.description]
    }
}

/// Expand concepts into rows, (concept, field) order preserved.
///
/// Fails with [`HarvestError::MissingCategory`] if any concept that has
/// fields lacks a category; no rows are produced in that case.
pub fn flatten(concepts: &[Concept]) -> Result<Vec<Row<'_>>> {
    let mut rows = Vec::with_capacity(concepts.iter().map(|c| c.fields.len()).sum());

    for concept in concepts {
        if concept.fields.is_empty() {
            continue;
        }

        let category = concept
            .category_name()
            .ok_or_else(|| HarvestError::MissingCategory {
                concept: concept.name.clone(),
            })?;

        rows.extend(concept.fields.iter().map(|field| Row {
            field: &field.name,
            concept: &concept.name,
            category,
            description: field.description.trim(),
        }));
    }

    Ok(rows)
}
