// gateway/src/proxy.rs
use std::time::Duration;

use actix_web::http::header::{self, HeaderName};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use common::GatewayConfig;
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the upstream forwarder. No retry, no circuit
/// breaking: errors come straight back to the caller as a 502.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": "upstream_unreachable",
            "message": self.to_string(),
        }))
    }
}

/// Build the upstream client with an explicit request timeout
pub fn build_client(config: &GatewayConfig) -> awc::Client {
    awc::Client::builder()
        .timeout(Duration::from_secs(config.upstream.timeout_secs))
        .finish()
}

/// Connection-scoped headers that must not be forwarded in either direction
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Forward a request to the agent backend. The matched prefix is kept
/// as-is (identity rewrite); method, headers and body pass through with
/// the Host header rewritten to the upstream origin.
pub async fn forward(
    req: HttpRequest,
    payload: web::Payload,
    client: web::Data<awc::Client>,
    config: web::Data<GatewayConfig>,
) -> Result<HttpResponse, ProxyError> {
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path());
    let url = format!("{}{}", config.upstream.origin, path);

    tracing::info!("Proxying {} {} -> {}", req.method(), req.path(), url);

    let mut upstream_req = client.request_from(url.as_str(), req.head()).no_decompress();
    upstream_req.headers_mut().remove(header::HOST);

    let upstream_res = upstream_req.send_stream(payload).await.map_err(|e| {
        tracing::error!("Proxy error for {}: {}", req.path(), e);
        ProxyError::Upstream(e.to_string())
    })?;

    let mut builder = HttpResponse::build(upstream_res.status());
    for (name, value) in upstream_res.headers() {
        if !is_hop_by_hop(name) {
            builder.insert_header((name.clone(), value.clone()));
        }
    }

    Ok(builder.streaming(upstream_res))
}

/// Register the forwarded prefix; every method is passed through
pub fn register(cfg: &mut web::ServiceConfig, config: &GatewayConfig) {
    let prefix = config.upstream.prefix.trim_end_matches('/').to_string();
    cfg.service(
        web::resource([prefix.clone(), format!("{}/{{tail:.*}}", prefix)])
            .route(web::route().to(forward)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        assert!(is_hop_by_hop(&header::CONNECTION));
        assert!(is_hop_by_hop(&header::TRANSFER_ENCODING));
        assert!(is_hop_by_hop(&header::UPGRADE));
        assert!(!is_hop_by_hop(&header::CONTENT_TYPE));
        assert!(!is_hop_by_hop(&header::AUTHORIZATION));
    }

    #[test]
    fn proxy_errors_render_as_502_json() {
        let err = ProxyError::Upstream("connection refused".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let res = err.error_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }
}
