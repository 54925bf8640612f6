//! Core pipeline orchestration for harvestdoc.
//!
//! This crate wires a catalog source into the exporter (`export`), the one
//! operation both the CLI and the HTTP service run.

pub mod pipeline;

pub use pipeline::{ExportSummary, encode, export, export_to_vec};
