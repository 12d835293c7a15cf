#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
mod handlers;
mod structures;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::Request,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderName, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use mcprobe::{Prober, ProberConfig};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::structures::ErrorSerialization;

#[macro_use]
extern crate tracing;

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() {
    start_tracing();
    let port: u16 = std::env::var("PORT").map_or(DEFAULT_PORT, |v| {
        v.parse().expect("PORT must be a valid port number")
    });
    let mut config = ProberConfig::default();
    if let Ok(timeout) = std::env::var("PROBE_TIMEOUT_MS") {
        let millis: u64 = timeout
            .parse()
            .expect("PROBE_TIMEOUT_MS must be a number of milliseconds");
        config.default_timeout = Duration::from_millis(millis);
    }
    info!(?config, "Starting prober");

    let app = router(Arc::new(Prober::new(config)));
    let socket_address = SocketAddr::from(([0, 0, 0, 0], port));
    let tcp = TcpListener::bind(socket_address).await.unwrap();
    info!(%socket_address, "Listening");
    axum::serve(tcp, app)
        .with_graceful_shutdown(vss::shutdown_signal())
        .await
        .unwrap();
}

fn router(prober: Arc<Prober>) -> Router {
    Router::new()
        .route("/api/:address", get(handlers::ping_java))
        .route("/api/java/:address", get(handlers::ping_java))
        .route("/api/bedrock/:address", get(handlers::ping_bedrock))
        .route("/api/batch", post(handlers::ping_batch))
        .route("/api/health", get(handlers::health))
        .layer(axum::middleware::from_fn(noindex_cache))
        .layer(TraceLayer::new_for_http())
        .with_state(prober)
}

static ROBOTS_NAME: HeaderName = HeaderName::from_static("x-robots-tag");
static ROBOTS_VALUE: HeaderValue = HeaderValue::from_static("noindex");
// matches the prober's cache TTL
static CACHE_CONTROL_AGE: HeaderValue = HeaderValue::from_static("s-maxage=5");

async fn noindex_cache(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    resp.headers_mut()
        .insert(ROBOTS_NAME.clone(), ROBOTS_VALUE.clone());
    resp.headers_mut()
        .insert(CACHE_CONTROL, CACHE_CONTROL_AGE.clone());
    resp
}

#[derive(thiserror::Error, Debug)]
pub enum Failure {
    #[error("invalid server address `{0}`")]
    InvalidAddress(String),
    #[error("too many targets: {0} (at most {max})", max = handlers::MAX_BATCH)]
    TooManyTargets(usize),
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidAddress(_) | Self::TooManyTargets(_) => StatusCode::BAD_REQUEST,
        };
        debug!(error = %self, "Rejected request");
        let ser = ErrorSerialization {
            error: self.to_string(),
        };
        (status, Json(ser)).into_response()
    }
}

pub struct Json<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        static JSON_CTYPE: HeaderValue = HeaderValue::from_static("application/json;charset=utf-8");

        let body = serde_json::to_vec_pretty(&self.0).unwrap_or_else(|_| {
            r#"{"error": "JSON Serialization failed, please make a bug report"}"#
                .as_bytes()
                .to_vec()
        });
        ([(CONTENT_TYPE, JSON_CTYPE.clone())], body).into_response()
    }
}

fn start_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env("LOG").unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("mcprobe_server=info,mcprobe=info,tower_http=info")
    });
    let registry = tracing_subscriber::registry().with(env_filter);
    if std::env::var_os("LOG_JSON").is_some() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        router(Arc::new(Prober::new(ProberConfig {
            resolve_srv: false,
            ..ProberConfig::default()
        })))
    }

    #[tokio::test]
    async fn test_health_sets_headers() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-robots-tag"], "noindex");
        assert_eq!(response.headers()[CACHE_CONTROL], "s-maxage=5");
    }

    #[tokio::test]
    async fn test_invalid_address_is_bad_request() {
        let response = app()
            .oneshot(
                Request::get("/api/java/host:notaport")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected() {
        let targets: Vec<_> = (0..=handlers::MAX_BATCH)
            .map(|i| serde_json::json!({"name": i.to_string(), "host": "127.0.0.1", "type": "java"}))
            .collect();
        let response = app()
            .oneshot(
                Request::post("/api/batch")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&targets).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
