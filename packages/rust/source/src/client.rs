//! HTTP client for the Harvest concepts API.

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, tls};
use tracing::{debug, info, instrument};
use url::Url;

use harvestdoc_shared::{Concept, HarvestError, Result, TlsFloor, TransportPolicy};

/// Path of the concept listing, relative to the API endpoint.
const CONCEPTS_PATH: &str = "concepts/";

/// Header carrying the API token.
const API_TOKEN_HEADER: &str = "Api-Token";

// ---------------------------------------------------------------------------
// RemoteCatalog
// ---------------------------------------------------------------------------

/// A concept catalog served by a remote Harvest API.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    endpoint: Url,
    concepts_url: Url,
    token: Option<String>,
    client: Client,
}

impl RemoteCatalog {
    /// Create a client for the API rooted at `endpoint`.
    pub fn new(endpoint: &str, policy: &TransportPolicy) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let concepts_url = join_path(&endpoint, CONCEPTS_PATH)?;

        Ok(Self {
            endpoint,
            concepts_url,
            token: None,
            client: build_client(policy)?,
        })
    }

    /// Send `token` in the `Api-Token` header. An empty token sends nothing.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// The API root this client was created with.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fully joined URL of the concept listing.
    pub fn concepts_url(&self) -> &Url {
        &self.concepts_url
    }

    /// Fetch every concept, in the order the API returns them.
    #[instrument(skip_all, fields(url = %self.concepts_url))]
    pub async fn concepts(&self) -> Result<Vec<Concept>> {
        let url = &self.concepts_url;
        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json");

        if let Some(token) = &self.token {
            request = request.header(API_TOKEN_HEADER, token.as_str());
        }

        debug!(authenticated = self.token.is_some(), "requesting concepts");

        let response = request
            .send()
            .await
            .map_err(|e| HarvestError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(HarvestError::UnexpectedStatus {
                status: status.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HarvestError::Transport(format!("{url}: failed to read body: {e}")))?;

        let concepts: Vec<Concept> = serde_json::from_slice(&body).map_err(HarvestError::decode)?;

        info!(
            concepts = concepts.len(),
            bytes = body.len(),
            "concepts fetched"
        );

        Ok(concepts)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an API endpoint, accepting only http(s) URLs.
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| HarvestError::Transport(format!("invalid endpoint {endpoint:?}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(HarvestError::Transport(format!(
            "invalid endpoint {endpoint:?}: unsupported scheme {scheme:?}"
        ))),
    }
}

/// Append `path` below the endpoint's path, ignoring a leading slash on `path`.
fn join_path(endpoint: &Url, path: &str) -> Result<Url> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }

    base.join(path.trim_start_matches('/'))
        .map_err(|e| HarvestError::Transport(format!("cannot join {path:?} onto {endpoint}: {e}")))
}

/// Build a reqwest client from the transport policy.
fn build_client(policy: &TransportPolicy) -> Result<Client> {
    let min_tls = match policy.min_tls_version {
        TlsFloor::Tls12 => tls::Version::TLS_1_2,
        TlsFloor::Tls13 => tls::Version::TLS_1_3,
    };

    Client::builder()
        .use_rustls_tls()
        .min_tls_version(min_tls)
        .user_agent(policy.user_agent.as_str())
        .timeout(policy.timeout)
        .build()
        .map_err(|e| HarvestError::Transport(format!("failed to build HTTP client: {e}")))
}
