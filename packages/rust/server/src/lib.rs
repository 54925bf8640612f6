//! HTTP front end: `POST /` with `{"url", "token"}` returns the catalog as CSV.
//!
//! Status mapping:
//! - 405 for any method other than POST
//! - 422 when the body is not a valid request
//! - 503 when the catalog cannot be fetched or decoded
//! - 500 when encoding fails
//!
//! The document is encoded in memory before the response starts, so an error
//! never follows partial CSV output.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use harvestdoc_export::ExportFormat;
use harvestdoc_shared::{HarvestError, TransportPolicy};
use harvestdoc_source::{CatalogSource, RemoteCatalog};

/// Per-server settings shared by every request.
#[derive(Debug, Clone, Default)]
pub struct ServerState {
    /// Transport settings for the upstream concepts API.
    pub policy: TransportPolicy,
}

/// Request body: which API to export and the token to use.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportRequest {
    url: String,
    token: String,
}

/// Build the service router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", post(export_catalog))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process is interrupted.
pub async fn serve(addr: &str, state: ServerState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[instrument(skip_all)]
async fn export_catalog(State(state): State<ServerState>, body: Bytes) -> Response {
    let request: ExportRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "rejecting malformed request body");
            return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
        }
    };

    let source = match RemoteCatalog::new(&request.url, &state.policy) {
        Ok(catalog) => CatalogSource::Remote(catalog.with_token(request.token)),
        Err(e) => return error_response(&e),
    };

    let format = ExportFormat::Csv;
    match harvestdoc_core::export_to_vec(&source, format).await {
        Ok(document) => ([(header::CONTENT_TYPE, format.content_type())], document).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &HarvestError) -> Response {
    let status = if err.is_source_error() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    warn!(%status, error = %err, "export failed");
    (status, err.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const PATIENT: &str = r#"[{"id":1,"name":"Patient","category":{"id":1,"name":"Demographics"},
        "fields":[{"pk":1,"name":"Age","description":" years old "},{"pk":2,"name":"Sex","description":"M/F"}]}]"#;

    async fn send(request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = router(ServerState::default()).oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    fn post_json(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_other_methods() {
        let request = Request::builder().method("GET").uri("/").body(Body::empty()).unwrap();
        let (status, _, _) = send(request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn malformed_body_is_unprocessable() {
        let (status, content_type, body) = send(post_json("not json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!body.is_empty());
        assert_ne!(content_type.as_deref(), Some("text/csv"));
        assert!(!body.contains("Field,Concept"));
    }

    #[tokio::test]
    async fn upstream_status_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let payload = serde_json::json!({ "url": server.uri(), "token": "" }).to_string();
        let (status, _, body) = send(post_json(payload)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "client: 404 Not Found");
    }

    #[tokio::test]
    async fn file_paths_are_not_served() {
        let payload = serde_json::json!({ "url": "../../../fixtures/json/concepts.fixture.json" });
        let (status, _, body) = send(post_json(payload.to_string())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("invalid endpoint"));
    }

    #[tokio::test]
    async fn streams_csv_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/concepts/"))
            .and(header_matcher("Api-Token", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PATIENT))
            .expect(1)
            .mount(&server)
            .await;

        let payload =
            serde_json::json!({ "url": format!("{}/api", server.uri()), "token": "abc123" });
        let (status, content_type, body) = send(post_json(payload.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/csv"));
        assert_eq!(
            body,
            "Field,Concept,Category,Description\n\
             Age,Patient,Demographics,years old\n\
             Sex,Patient,Demographics,M/F\n"
        );
    }

    #[tokio::test]
    async fn encode_failure_is_internal_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[{"id":1,"name":"Orphan","fields":[{"pk":1,"name":"x"}]}]"#),
            )
            .mount(&server)
            .await;

        let payload = serde_json::json!({ "url": server.uri() });
        let (status, content_type, body) = send(post_json(payload.to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_ne!(content_type.as_deref(), Some("text/csv"));
        assert!(body.contains("Orphan"));
    }
}
