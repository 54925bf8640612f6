//! Shared types, error model, and configuration for harvestdoc.
//!
//! This crate is the foundation depended on by all other harvestdoc crates.
//! It provides:
//! - [`HarvestError`]: the unified error type
//! - The concept catalog model ([`Concept`], [`Field`], [`Category`])
//! - Configuration ([`AppConfig`], [`TransportPolicy`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClientConfig, ServerConfig, TlsFloor, TransportPolicy, config_dir,
    config_file_path, load_config, load_config_from,
};
pub use error::{HarvestError, Result};
pub use types::{Category, Concept, Field};
