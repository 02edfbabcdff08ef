use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use shadow_api::{build_app, ShadowConfig};
use tower::ServiceExt;

#[derive(Clone)]
enum Canned {
    Json(Value),
    Status(StatusCode),
}

impl IntoResponse for Canned {
    fn into_response(self) -> axum::response::Response {
        match self {
            Canned::Json(body) => Json(body).into_response(),
            Canned::Status(status) => status.into_response(),
        }
    }
}

/// Serves canned translation and search answers on an ephemeral port.
async fn spawn_providers(translation: Canned, search: Canned) -> String {
    let router = Router::new()
        .route("/translate", get(move || async move { translation }))
        .route("/search", get(move || async move { search }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn app_with(translation: Canned, search: Canned) -> Router {
    app_with_env(translation, search, &[]).await
}

async fn app_with_env(translation: Canned, search: Canned, extra: &[(&str, &str)]) -> Router {
    let base = spawn_providers(translation, search).await;
    let mut vars = HashMap::from([
        ("SHADOW_TRANSLATE_URL".to_string(), format!("{base}/translate")),
        ("SHADOW_SEARCH_URL".to_string(), format!("{base}/search")),
    ]);
    vars.extend(extra.iter().map(|(key, value)| (key.to_string(), value.to_string())));
    let config = ShadowConfig::from_source(|key| vars.get(key).cloned()).unwrap();
    build_app(&config).expect("app should build")
}

fn nothing() -> Canned {
    Canned::Json(json!({ "AbstractText": "", "RelatedTopics": [] }))
}

/// Attaches the socket peer the way `into_make_service_with_connect_info` does.
fn from_peer(mut request: Request<Body>, peer_ip: &str) -> Request<Body> {
    let addr: SocketAddr = format!("{peer_ip}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

fn query(body: Value, peer_ip: &str) -> Request<Body> {
    let request = Request::builder()
        .method("POST")
        .uri("/shadow/query")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    from_peer(request, peer_ip)
}

fn query_forwarded_for(body: Value, peer_ip: &str, forwarded_for: &str) -> Request<Body> {
    let mut request = query(body, peer_ip);
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with(nothing(), nothing()).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn greeting_round_trip() {
    let app = app_with(nothing(), nothing()).await;

    let (status, body) = send(&app, query(json!({ "message": "hello" }), "198.51.100.1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Hey, I'm here. Go ahead.");
    assert_eq!(body["confidence"], 0.5);
    assert_eq!(body["source"], "shadow-brain");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn arabic_translation_uses_provider_text() {
    let app = app_with(
        Canned::Json(json!({
            "responseData": { "translatedText": "مرحباً" },
            "responseStatus": 200
        })),
        nothing(),
    )
    .await;

    let (status, body) = send(
        &app,
        query(json!({ "message": "ترجم hello", "lang": "ar" }), "198.51.100.2"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "ترجمت لك:\nمرحباً");
    assert_eq!(body["confidence"], 0.9);
    assert_eq!(body["source"], "translation-api");
}

#[tokio::test]
async fn translation_outage_falls_back_quietly() {
    let app = app_with(Canned::Status(StatusCode::INTERNAL_SERVER_ERROR), nothing()).await;

    let (status, body) = send(&app, query(json!({ "message": "translate cat" }), "198.51.100.3")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "I couldn't translate that right now. Try rephrasing it.");
    assert_eq!(body["confidence"], 0.5);
    assert_eq!(body["source"], "shadow-brain");
}

#[tokio::test]
async fn question_uses_lookup_abstract() {
    let app = app_with(
        nothing(),
        Canned::Json(json!({
            "AbstractText": "Rust is a general-purpose programming language.",
            "RelatedTopics": []
        })),
    )
    .await;

    let (_, body) = send(&app, query(json!({ "message": "what is rust?" }), "198.51.100.4")).await;

    assert!(body["answer"]
        .as_str()
        .unwrap()
        .starts_with("Rust is a general-purpose programming language."));
    assert_eq!(body["confidence"], 0.85);
    assert_eq!(body["source"], "duckduckgo");
}

#[tokio::test]
async fn search_uses_related_topic_when_abstract_is_empty() {
    let app = app_with(
        nothing(),
        Canned::Json(json!({
            "AbstractText": "",
            "RelatedTopics": [{ "Text": "Cairo is the capital of Egypt." }]
        })),
    )
    .await;

    let (_, body) = send(&app, query(json!({ "message": "ابحث عن القاهرة" }), "198.51.100.5")).await;

    assert!(body["answer"].as_str().unwrap().contains("Cairo is the capital of Egypt."));
    assert_eq!(body["confidence"], 0.85);
    assert_eq!(body["source"], "duckduckgo");
}

#[tokio::test]
async fn empty_message_gets_canned_reply() {
    let app = app_with(nothing(), nothing()).await;

    let (status, english) = send(&app, query(json!({ "message": "", "lang": "en" }), "198.51.100.6")).await;
    let (_, arabic) = send(&app, query(json!({ "message": "   ", "lang": "ar" }), "198.51.100.7")).await;
    let (_, missing) = send(&app, query(json!({}), "198.51.100.8")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(english["confidence"], 0.0);
    assert_eq!(english["answer"], arabic["answer"]);
    assert_eq!(english["answer"], missing["answer"]);
    assert_eq!(english["source"], "shadow-brain");
}

#[tokio::test]
async fn malformed_body_still_answers_ok() {
    let app = app_with(nothing(), nothing()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/shadow/query")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, from_peer(request, "198.51.100.9")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["source"], "shadow-brain-error");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn second_request_within_window_is_throttled() {
    let app = app_with(nothing(), nothing()).await;

    let (first, _) = send(&app, query(json!({ "message": "hello" }), "203.0.113.10")).await;
    let (second, body) = send(&app, query(json!({ "message": "hello" }), "203.0.113.10")).await;
    let (other, _) = send(&app, query(json!({ "message": "hello" }), "203.0.113.11")).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["answer"], "اهداً قليلاً.. الظل يحتاج وقتاً للتفكير.");
    assert_eq!(other, StatusCode::OK);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_escape_the_limit() {
    let app = app_with(nothing(), nothing()).await;

    let mut statuses = Vec::new();
    for n in 1..=5 {
        let request =
            query_forwarded_for(json!({ "message": "hello" }), "192.0.2.50", &format!("198.18.0.{n}"));
        statuses.push(send(&app, request).await.0);
    }

    assert_eq!(
        statuses,
        [
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
}

#[tokio::test]
async fn trusted_proxy_is_keyed_on_forwarded_for() {
    let app = app_with_env(nothing(), nothing(), &[("SHADOW_TRUST_FORWARDED_FOR", "true")]).await;

    let (first, _) =
        send(&app, query_forwarded_for(json!({ "message": "hi" }), "10.0.0.1", "203.0.113.20")).await;
    let (other_client, _) =
        send(&app, query_forwarded_for(json!({ "message": "hi" }), "10.0.0.1", "203.0.113.21")).await;
    let (repeat, _) =
        send(&app, query_forwarded_for(json!({ "message": "hi" }), "10.0.0.1", "203.0.113.20")).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(other_client, StatusCode::OK);
    assert_eq!(repeat, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn health_is_not_throttled() {
    let app = app_with(nothing(), nothing()).await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn preflight_allows_any_origin_by_default() {
    let app = app_with(nothing(), nothing()).await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/shadow/query")
        .header("origin", "https://chat.example")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn preflight_reflects_requested_headers_by_default() {
    let app = app_with(nothing(), nothing()).await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/shadow/query")
        .header("origin", "https://chat.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-client-version")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-headers")
            .and_then(|value| value.to_str().ok()),
        Some("content-type,x-client-version")
    );
}

#[tokio::test]
async fn configured_origins_keep_a_fixed_header_list() {
    let app = app_with_env(
        nothing(),
        nothing(),
        &[("SHADOW_ALLOWED_ORIGINS", "https://chat.example")],
    )
    .await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/shadow/query")
        .header("origin", "https://chat.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "x-client-version")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();

    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("https://chat.example")
    );
    assert_eq!(
        headers
            .get("access-control-allow-headers")
            .and_then(|value| value.to_str().ok()),
        Some("content-type")
    );
}
