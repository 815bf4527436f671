//! End-to-end tests of the HTTP surface, driven through the router with
//! `tower::ServiceExt::oneshot` (no socket).

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use qrlogin_auth::mocks::MockQrRenderer;
use qrlogin_auth::stores::{NoopBackend, TableTicketStore};
use qrlogin_auth::{QrLoginState, TicketConfig, TicketService};
use qrlogin_server::build_router;
use qrlogin_testing::{init_test_tracing, test_clock, ManualClock, SequentialIdGenerator};
use qrlogin_core::environment::Clock;
use qrlogin_web::CORRELATION_ID_HEADER;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    clock: ManualClock,
    renderer: MockQrRenderer,
}

type TestState =
    QrLoginState<TableTicketStore<NoopBackend>, SequentialIdGenerator, ManualClock, MockQrRenderer>;

/// Router over an in-memory table with a 10 second TTL.
fn test_app() -> TestApp {
    init_test_tracing();
    let clock = ManualClock::new(test_clock().now());
    let renderer = MockQrRenderer::new();
    let service = TicketService::new(
        TableTicketStore::in_memory(),
        SequentialIdGenerator::new(),
        clock.clone(),
        TicketConfig::new("http://192.168.100.100:3000".to_string()).with_ttl_secs(10),
    );
    let state: Arc<TestState> = Arc::new(QrLoginState::new(Arc::new(service), renderer.clone()));

    TestApp {
        router: build_router(state, None),
        clock,
        renderer,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(router: &Router, uri: &str, body: &Value) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn issue(router: &Router) -> String {
    let response = router
        .clone()
        .oneshot(
            Request::get("/getqrcode")
                .header("X-Forwarded-For", "10.0.0.7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    response.headers()["uuid"].to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_getqrcode_returns_image_and_ticket_header() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/getqrcode")
                .header("X-Forwarded-For", "10.0.0.7, 172.16.0.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers["uuid"], "t-000001");
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert!(
        headers[header::ACCESS_CONTROL_EXPOSE_HEADERS]
            .to_str()
            .unwrap()
            .contains("uuid")
    );

    let expected = "http://192.168.100.100:3000/phone?uuid=t-000001&ip=10.0.0.7";
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], expected.as_bytes());
    assert_eq!(app.renderer.rendered(), vec![expected.to_string()]);
}

#[tokio::test]
async fn test_full_login_flow() {
    let app = test_app();
    let uuid = issue(&app.router).await;

    let waiting = post_json(&app.router, "/checkuuid", &json!({ "uuid": uuid })).await;
    assert_eq!(waiting.status(), StatusCode::OK);
    assert_eq!(
        body_json(waiting).await,
        json!({ "success": false, "user_id": "", "message": "notyet" })
    );

    let claim = post_json(
        &app.router,
        "/login",
        &json!({ "uuid": uuid, "user_id": "user42" }),
    )
    .await;
    assert_eq!(claim.status(), StatusCode::OK);
    assert_eq!(
        body_json(claim).await,
        json!({ "success": true, "message": "success" })
    );

    let done = post_json(&app.router, "/checkuuid", &json!({ "uuid": uuid })).await;
    assert_eq!(
        body_json(done).await,
        json!({ "success": true, "user_id": "user42", "message": "success" })
    );

    let consumed = post_json(&app.router, "/checkuuid", &json!({ "uuid": uuid })).await;
    assert_eq!(body_json(consumed).await["message"], "notfound");
}

#[tokio::test]
async fn test_second_claim_is_rejected() {
    let app = test_app();
    let uuid = issue(&app.router).await;

    post_json(&app.router, "/login", &json!({ "uuid": uuid, "user_id": "alice" })).await;
    let second = post_json(&app.router, "/login", &json!({ "uuid": uuid, "user_id": "mallory" })).await;

    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(
        body_json(second).await,
        json!({ "success": false, "message": "claimed" })
    );
}

#[tokio::test]
async fn test_expired_ticket() {
    let app = test_app();
    let uuid = issue(&app.router).await;

    app.clock.advance_secs(11);

    let claim = post_json(&app.router, "/login", &json!({ "uuid": uuid, "user_id": "user42" })).await;
    assert_eq!(body_json(claim).await["message"], "expired");

    let poll = post_json(&app.router, "/checkuuid", &json!({ "uuid": uuid })).await;
    assert_eq!(body_json(poll).await["message"], "notfound");
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let app = test_app();

    let poll = post_json(&app.router, "/checkuuid", &json!({ "uuid": "nope" })).await;
    assert_eq!(poll.status(), StatusCode::OK);
    assert_eq!(
        body_json(poll).await,
        json!({ "success": false, "user_id": "", "message": "notfound" })
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/checkuuid")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_empty_fields_are_bad_request() {
    let app = test_app();

    let poll = post_json(&app.router, "/checkuuid", &json!({})).await;
    assert_eq!(poll.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(poll).await["message"], "uuid is required");

    let claim = post_json(&app.router, "/login", &json!({ "uuid": "t-000001" })).await;
    assert_eq!(claim.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(claim).await["message"], "user_id is required");
}

#[tokio::test]
async fn test_render_failure_is_internal_error() {
    let app = test_app();
    app.renderer.fail(true);

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/getqrcode").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "An internal error occurred");
}

#[tokio::test]
async fn test_health_and_correlation_header() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/health")
                .header(CORRELATION_ID_HEADER, "7f8b1c52-4f3a-4c0e-9d0a-3b7a2f1e6c11")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CORRELATION_ID_HEADER],
        "7f8b1c52-4f3a-4c0e-9d0a-3b7a2f1e6c11"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::options("/checkuuid")
                .header(header::ORIGIN, "http://192.168.100.100:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
