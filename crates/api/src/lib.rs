mod config;
mod rate_limit;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::Serialize;
use shadow_agents::{build_http_agent, HttpShadowAgent};
use shadow_core::{error_reply, throttled_reply, QueryRequest, ShadowReply};
use shadow_observability::{AppMetrics, Counter};
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub use crate::config::{ShadowConfig, DEFAULT_PORT};
pub use crate::rate_limit::IpRateLimiter;

pub const QUERY_PATH: &str = "/shadow/query";
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(5);
pub const RATE_LIMIT_MAX: usize = 1;
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<HttpShadowAgent>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: shadow_observability::MetricsSnapshot,
}

pub fn build_state(config: &ShadowConfig) -> Result<ApiState> {
    let metrics = AppMetrics::shared();
    let agent = build_http_agent(
        config.translate_url.clone(),
        config.search_url.clone(),
        config.lookup_timeout,
        metrics.clone(),
    )?;

    Ok(ApiState {
        agent: Arc::new(agent),
        metrics,
        limiter: IpRateLimiter::new(RATE_LIMIT_WINDOW, RATE_LIMIT_MAX),
        allowed_origins: Arc::new(config.allowed_origins.clone()),
        trust_forwarded_for: config.trust_forwarded_for,
    })
}

pub fn build_app(config: &ShadowConfig) -> Result<Router> {
    Ok(build_router(build_state(config)?))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(QUERY_PATH, post(shadow_query))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(catch_panic_layer(state.metrics.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(build_cors_layer(&state.allowed_origins))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

/// Always answers 200. A body that does not parse becomes the canned error
/// reply; panics further in are caught by `catch_panic_layer`.
async fn shadow_query(
    State(state): State<ApiState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Json<ShadowReply> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            state.metrics.record(Counter::Error);
            warn!(error = %rejection.body_text(), "rejected query body");
            return Json(error_reply(rejection.body_text()));
        }
    };

    Json(state.agent.answer(request).await)
}

#[derive(Clone)]
struct PanicReply {
    metrics: Arc<AppMetrics>,
}

impl ResponseForPanic for PanicReply {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response {
        self.metrics.record(Counter::Error);
        panic_response(err)
    }
}

fn catch_panic_layer(metrics: Arc<AppMetrics>) -> CatchPanicLayer<PanicReply> {
    CatchPanicLayer::custom(PanicReply { metrics })
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "handler panicked");

    (StatusCode::OK, Json(error_reply(detail))).into_response()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    // an open deployment reflects whatever headers the browser asks for
    let (allow_origin, allow_headers) = if origins.is_empty() {
        (AllowOrigin::any(), AllowHeaders::mirror_request())
    } else {
        (AllowOrigin::list(origins), AllowHeaders::list([header::CONTENT_TYPE]))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allow_headers)
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() != QUERY_PATH {
        return next.run(request).await;
    }

    let ip = request_ip(&request, state.trust_forwarded_for);
    if !state.limiter.allow(&ip) {
        state.metrics.record(Counter::Throttled);
        return (StatusCode::TOO_MANY_REQUESTS, Json(throttled_reply())).into_response();
    }

    next.run(request).await
}

/// Rate-limit key: the socket peer, unless the deployment opted in to
/// trusting the proxy's `x-forwarded-for`.
fn request_ip(request: &Request<Body>, trust_forwarded_for: bool) -> String {
    let forwarded = if trust_forwarded_for {
        forwarded_for(request)
    } else {
        None
    };

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "local".to_string())
}

fn forwarded_for(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
