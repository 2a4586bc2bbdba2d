//! HTTP server implementation
//!
//! Hyper http1 accept loop in front of the gateway. Each inbound request is
//! translated into a [`RequestDescriptor`]; intercepted requests are
//! answered from the gateway, pass-throughs are forwarded to the origin
//! verbatim. Also exposes `/healthz` (liveness + counters) and `/version`
//! (deployment verification) like any of our gateways.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Args;
use crate::fetch::Fetcher;
use crate::gateway::{FetchOutcome, Gateway};
use crate::request::{RequestDescriptor, StoredResponse};
use crate::store::MemoryStore;
use crate::strategy::ServedFrom;
use crate::types::Result;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub gateway: Arc<Gateway>,
    /// Concrete store handle kept for the stats surface
    pub store: Arc<MemoryStore>,
    /// Default network path for pass-through requests
    pub fetcher: Arc<dyn Fetcher>,
}

/// Request headers that must not be forwarded to the origin
const SKIP_REQUEST_HEADERS: [&str; 3] = ["host", "connection", "content-length"];
/// Response headers the serve loop manages itself
const SKIP_RESPONSE_HEADERS: [&str; 3] = ["content-length", "transfer-encoding", "connection"];

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Manna listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

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

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .serve_connection(io, service)
                        .await
                    {
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

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    // Operational routes answered by the gateway itself
    if method == "GET" {
        match path.as_str() {
            "/healthz" | "/health" => return Ok(health_response(&state)),
            "/version" => return Ok(version_response(&state)),
            _ => {}
        }
    }

    let descriptor = to_descriptor(&state, &req);

    match state.gateway.handle(&descriptor).await {
        Ok(FetchOutcome::Respond {
            response,
            served_from,
            ..
        }) => Ok(to_http_response(response, Some(served_from))),
        Ok(FetchOutcome::PassThrough) => {
            // Default network path: forward verbatim, no caching
            match state.fetcher.fetch(&descriptor).await {
                Ok(response) => Ok(to_http_response(response, None)),
                Err(err) => {
                    debug!(url = %descriptor.url, error = %err, "pass-through fetch failed");
                    Ok(error_response(StatusCode::BAD_GATEWAY, &err.to_string()))
                }
            }
        }
        Err(err) => {
            // Indistinguishable, for the caller, from a failed network request
            Ok(error_response(StatusCode::BAD_GATEWAY, &err.to_string()))
        }
    }
}

/// Translate an inbound hyper request into the gateway's descriptor
fn to_descriptor(state: &AppState, req: &Request<Incoming>) -> RequestDescriptor {
    let uri = req.uri();
    let url = if uri.scheme().is_some() {
        // Proxy-style absolute URI: taken as-is
        uri.to_string()
    } else {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(uri.path());
        format!("{}{}", state.args.site_origin(), path_and_query)
    };

    let headers = req
        .headers()
        .iter()
        .filter(|(name, _)| {
            !SKIP_REQUEST_HEADERS
                .iter()
                .any(|skip| name.as_str().eq_ignore_ascii_case(skip))
        })
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    RequestDescriptor {
        method: req.method().as_str().to_uppercase(),
        url,
        headers,
    }
}

/// Build an HTTP response from a stored/fetched response
fn to_http_response(
    response: StoredResponse,
    served_from: Option<ServedFrom>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK));

    for (name, value) in &response.headers {
        if SKIP_RESPONSE_HEADERS
            .iter()
            .any(|skip| name.eq_ignore_ascii_case(skip))
        {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }

    if let Some(served_from) = served_from {
        let label = match served_from {
            ServedFrom::Cache => "cache",
            ServedFrom::Network => "network",
        };
        builder = builder.header("x-manna-served-from", label);
    }

    builder
        .body(Full::new(response.body))
        .unwrap_or_else(|_| plain_response(StatusCode::INTERNAL_SERVER_ERROR, "response build failed"))
}

fn health_response(state: &AppState) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "status": "ok",
        "gateway": state.gateway.stats(),
        "store": state.store.stats(),
    });
    json_response(StatusCode::OK, &body)
}

fn version_response(state: &AppState) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "build_version": state.args.build_version,
        "commit": env!("GIT_COMMIT_SHORT"),
        "built_at": env!("BUILD_TIMESTAMP"),
        "node_id": state.args.node_id.to_string(),
    });
    json_response(StatusCode::OK, &body)
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| plain_response(StatusCode::INTERNAL_SERVER_ERROR, "response build failed"))
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }))
}

fn plain_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(message.to_string())));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClaimPolicy;
    use crate::router::RouteConfig;
    use crate::testing::ScriptedFetcher;
    use clap::Parser;

    fn state() -> Arc<AppState> {
        let args = Args::parse_from(["manna", "--origin", "https://example.com"]);
        let store = Arc::new(MemoryStore::new());
        let fetcher: Arc<dyn Fetcher> = Arc::new(ScriptedFetcher::new());
        let gateway = Arc::new(Gateway::new(
            RouteConfig::for_origin("https://example.com"),
            "1.0.0",
            store.clone(),
            fetcher.clone(),
            ClaimPolicy::Immediate,
        ));
        Arc::new(AppState {
            args,
            gateway,
            store,
            fetcher,
        })
    }

    #[test]
    fn test_to_http_response_marks_source() {
        let response = to_http_response(StoredResponse::ok("body"), Some(ServedFrom::Cache));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-manna-served-from").unwrap(),
            "cache"
        );
    }

    #[test]
    fn test_to_http_response_skips_managed_headers() {
        let mut stored = StoredResponse::ok("body");
        stored.headers.push(("Content-Length".into(), "999".into()));
        stored.headers.push(("Content-Type".into(), "text/css".into()));
        let response = to_http_response(stored, None);
        assert!(response.headers().get("content-length").is_none() || {
            // hyper may set the real length itself; never the stored lie
            response.headers().get("content-length").unwrap() != "999"
        });
        assert_eq!(response.headers().get("content-type").unwrap(), "text/css");
    }

    #[test]
    fn test_health_response_is_json() {
        let response = health_response(&state());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
