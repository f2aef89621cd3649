use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
};
use axum_server::tls_rustls::RustlsConfig;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
};
use std::{net::SocketAddr, path::PathBuf};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

pub static REQUEST_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "console_request_latency_ms",
        "Latency of console API requests in ms",
        &["endpoint"]
    )
    .unwrap()
});

pub static API_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "console_api_errors_total",
        "Console API failures by error kind",
        &["kind"]
    )
    .unwrap()
});

pub static DEBUG_INFLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("console_debug_inflight", "In-flight tool debug calls").unwrap()
});

pub static STALE_RESPONSES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "console_stale_responses_total",
        "Responses discarded because a newer request superseded them"
    )
    .unwrap()
});

/// Holds the debug in-flight gauge up for as long as it lives.
pub struct PendingGaugeGuard;

impl PendingGaugeGuard {
    pub fn new() -> Self {
        DEBUG_INFLIGHT.inc();
        PendingGaugeGuard
    }
}

impl Default for PendingGaugeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PendingGaugeGuard {
    fn drop(&mut self) {
        DEBUG_INFLIGHT.dec();
    }
}

pub fn observe_request(endpoint: &'static str, elapsed_ms: u64) {
    REQUEST_LATENCY
        .with_label_values(&[endpoint])
        .observe(elapsed_ms as f64);
}

pub fn record_api_error(kind: &'static str) {
    API_ERRORS.with_label_values(&[kind]).inc();
}

pub fn record_stale_response() {
    STALE_RESPONSES.inc();
}

#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct MetricsServerConfig {
    pub addr: SocketAddr,
    pub auth_token: Option<String>,
    pub allow_insecure: bool,
    pub tls: Option<TlsConfig>,
}

#[derive(Clone)]
struct MetricsState {
    auth_token: Option<String>,
}

pub async fn spawn_metrics_server(config: MetricsServerConfig) {
    let MetricsServerConfig {
        addr,
        auth_token,
        allow_insecure,
        tls,
    } = config;
    if !allow_insecure && tls.is_none() {
        warn!(%addr, "metrics server skipped: TLS required but not configured");
        return;
    }

    let app = router(MetricsState { auth_token });

    tokio::spawn(async move {
        if let Some(tls_cfg) = tls {
            match RustlsConfig::from_pem_file(&tls_cfg.cert_path, &tls_cfg.key_path).await {
                Ok(rustls_config) => {
                    info!(%addr, "metrics server (TLS) starting");
                    if let Err(err) = axum_server::bind_rustls(addr, rustls_config)
                        .serve(app.into_make_service())
                        .await
                    {
                        error!(%addr, %err, "metrics server terminated");
                    }
                }
                Err(err) => {
                    error!(%addr, %err, "failed to load TLS config");
                }
            }
        } else {
            info!(%addr, "metrics server (HTTP) starting");
            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if let Err(err) = axum::serve(listener, app.into_make_service()).await {
                        error!(%addr, %err, "metrics server terminated");
                    }
                }
                Err(err) => {
                    error!(%addr, %err, "failed to bind metrics listener");
                }
            }
        }
    });
}

fn router(state: MetricsState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn metrics_handler(
    State(state): State<MetricsState>,
    headers: HeaderMap,
) -> axum::response::Response {
    if let Some(token) = &state.auth_token {
        if !is_authorized(headers.get(http::header::AUTHORIZATION), token) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(err) = encoder.encode(&metrics, &mut buf) {
        error!(%err, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response();
    }

    let mut resp: http::Response<axum::body::Body> =
        http::Response::new(axum::body::Body::from(buf));
    let ct = encoder.format_type().to_string();
    resp.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_str(&ct).unwrap_or(HeaderValue::from_static("text/plain")),
    );
    resp.into_response()
}

fn is_authorized(header: Option<&HeaderValue>, token: &str) -> bool {
    match header.and_then(|value| value.to_str().ok()) {
        Some(value) if value.starts_with("Bearer ") => value[7..].trim() == token,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Bearer s3cret"), true)]
    #[case(Some("Bearer  s3cret "), true)]
    #[case(Some("Bearer other"), false)]
    #[case(Some("Basic s3cret"), false)]
    #[case(None, false)]
    fn bearer_header_must_match(#[case] header: Option<&str>, #[case] expected: bool) {
        let value = header.map(|h| HeaderValue::from_str(h).unwrap());
        assert_eq!(is_authorized(value.as_ref(), "s3cret"), expected);
    }

    #[test]
    fn pending_guard_holds_gauge_up() {
        let _a = PendingGaugeGuard::new();
        let _b = PendingGaugeGuard::new();
        assert!(DEBUG_INFLIGHT.get() >= 2);
    }

    #[tokio::test]
    async fn metrics_route_requires_token_when_configured() {
        observe_request("tool_list", 5);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(MetricsState {
            auth_token: Some("tok".into()),
        });
        tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });

        let client = reqwest::Client::new();
        let url = format!("http://{addr}/metrics");
        let denied = client.get(&url).send().await.unwrap();
        assert_eq!(denied.status().as_u16(), 401);

        let ok = client.get(&url).bearer_auth("tok").send().await.unwrap();
        assert_eq!(ok.status().as_u16(), 200);
        let body = ok.text().await.unwrap();
        assert!(body.contains("console_request_latency_ms"));
    }
}
