//! Catalog sources: where the concept list comes from.
//!
//! A catalog is either served by a remote Harvest API ([`RemoteCatalog`]) or
//! stored as a JSON document on disk. Either way the result is the ordered
//! list of concepts exactly as the source lists them; nothing is filtered,
//! sorted or deduplicated.

mod client;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use harvestdoc_shared::{Concept, HarvestError, Result, TransportPolicy};

pub use client::RemoteCatalog;

// ---------------------------------------------------------------------------
// CatalogSource
// ---------------------------------------------------------------------------

/// One of the two places a concept catalog can be read from.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// A Harvest API endpoint.
    Remote(RemoteCatalog),
    /// A JSON file containing an array of concepts.
    File(PathBuf),
}

impl CatalogSource {
    /// Pick a source for a CLI-style target: http(s) URLs are fetched,
    /// anything else is treated as a file path.
    ///
    /// `token` is only used for remote targets.
    pub fn from_target(
        target: &str,
        token: Option<&str>,
        policy: &TransportPolicy,
    ) -> Result<Self> {
        if is_remote_target(target) {
            let catalog = RemoteCatalog::new(target, policy)?.with_token(token.unwrap_or_default());
            return Ok(Self::Remote(catalog));
        }

        if token.is_some_and(|t| !t.is_empty()) {
            debug!(target, "ignoring API token for file source");
        }

        Ok(Self::File(PathBuf::from(target)))
    }

    /// Short human-readable description, used in logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Remote(catalog) => catalog.endpoint().to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Load the ordered concept list.
    pub async fn concepts(&self) -> Result<Vec<Concept>> {
        match self {
            Self::Remote(catalog) => catalog.concepts().await,
            Self::File(path) => read_concepts_file(path),
        }
    }
}

/// Whether a target names an http(s) URL rather than a file.
///
/// Only the scheme prefix is checked, so a malformed URL still goes to
/// [`RemoteCatalog::new`] and is reported as an invalid endpoint.
pub fn is_remote_target(target: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        target
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

// ---------------------------------------------------------------------------
// Local decoding
// ---------------------------------------------------------------------------

/// Decode a JSON array of concepts from any byte stream.
pub fn decode_concepts<R: Read>(reader: R) -> Result<Vec<Concept>> {
    serde_json::from_reader(reader).map_err(HarvestError::decode)
}

/// Open and decode a concepts file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_concepts_file(path: &Path) -> Result<Vec<Concept>> {
    let file = File::open(path).map_err(|e| HarvestError::io(path, e))?;
    let concepts = decode_concepts(BufReader::new(file))?;

    info!(concepts = concepts.len(), "concepts loaded from file");
    Ok(concepts)
}
