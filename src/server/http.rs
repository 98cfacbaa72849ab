//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.
//!
//! ## Routes
//!
//! - `POST /api/verify-license` - `{"licenseKey": "..."}` → `{"valid": bool}`
//! - `GET /health` - liveness check
//! - `OPTIONS *` - CORS preflight

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::license::{LicenseRegistry, LicenseVerdict, VerifyLicenseRequest, VerifyLicenseResponse};

/// Shared server state
pub struct AppState {
    /// Registry holding the access token (normally Gumroad)
    pub registry: Arc<dyn LicenseRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<dyn LicenseRegistry>) -> Self {
        Self { registry }
    }
}

/// Bind `listen` and serve until the process exits
pub async fn run(listen: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(listen).await?;
    info!("License relay listening on {}", listener.local_addr()?);
    serve(listener, state).await;
    Ok(())
}

/// Accept loop over an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        (Method::OPTIONS, _) => preflight_response(),

        (Method::GET, "/health") | (Method::GET, "/healthz") => json_response(
            StatusCode::OK,
            serde_json::json!({
                "healthy": true,
                "version": env!("CARGO_PKG_VERSION"),
            }),
        ),

        (Method::POST, "/api/verify-license") => {
            let body = match req.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    warn!("Failed to read request body from {}: {}", addr, e);
                    return Ok(verify_response(StatusCode::BAD_REQUEST, false));
                }
            };
            verify_license(&state, &body).await
        }

        _ => not_found_response(&path),
    };

    Ok(response)
}

/// Decide a verify-license request
///
/// Invalid keys and registry failures both answer 401; callers of the relay
/// cannot tell them apart.
async fn verify_license(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    let key = serde_json::from_slice::<VerifyLicenseRequest>(body)
        .ok()
        .and_then(|r| r.license_key)
        .filter(|k| !k.trim().is_empty());

    let Some(key) = key else {
        return verify_response(StatusCode::BAD_REQUEST, false);
    };

    match state.registry.check(&key).await {
        Ok(LicenseVerdict::Valid) => {
            info!("License key accepted");
            verify_response(StatusCode::OK, true)
        }
        Ok(LicenseVerdict::Invalid) => {
            info!("License key rejected");
            verify_response(StatusCode::UNAUTHORIZED, false)
        }
        Err(e) => {
            warn!("License registry unavailable: {}", e);
            verify_response(StatusCode::UNAUTHORIZED, false)
        }
    }
}

fn verify_response(status: StatusCode, valid: bool) -> Response<Full<Bytes>> {
    let body = serde_json::to_value(VerifyLicenseResponse { valid })
        .unwrap_or_else(|_| serde_json::json!({ "valid": valid }));
    json_response(status, body)
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        hyper::header::HeaderValue::from_static("*"),
    );
    response
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    let headers = response.headers_mut();
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_ORIGIN,
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_HEADERS,
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        hyper::header::ACCESS_CONTROL_ALLOW_METHODS,
        hyper::header::HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        serde_json::json!({
            "error": "Not Found",
            "path": path,
        }),
    )
}
