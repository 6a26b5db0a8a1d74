mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{EchoService, get, send, with_body};
use serde_json::json;
use sso_gateway::{Gateway, RegisterError, RequestSource};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn router(service: &Arc<EchoService>) -> axum::Router {
    Gateway::local(service.clone()).unwrap().into_router()
}

#[tokio::test]
async fn test_routes_are_listed() {
    let gateway = Gateway::local(EchoService::new()).unwrap();
    let routes: Vec<String> = gateway.routes().iter().map(|r| r.to_string()).collect();
    assert_eq!(
        routes,
        vec![
            "GET /ping -> /sso.Sso/Ping",
            "GET /metrics -> /sso.Sso/Metrics",
            "GET /v1/audit -> /sso.Sso/AuditList",
            "POST /v1/audit -> /sso.Sso/AuditCreate",
            "GET /v1/audit/{id} -> /sso.Sso/AuditRead",
            "PATCH /v1/audit/{id} -> /sso.Sso/AuditUpdate",
        ]
    );

    let list = &gateway.routes()[2];
    assert_eq!(list.source, RequestSource::Query);
    assert_eq!(gateway.routes()[0].response_field, Some("text"));
    assert_eq!(gateway.routes()[4].response_field, None);
}

#[tokio::test]
async fn test_ping_and_metrics_return_text_field() {
    let service = EchoService::new();
    let router = router(&service);

    let resp = send(&router, get("/ping")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.headers.get("content-type").unwrap(), "application/json");
    assert_eq!(resp.body, json!("pong"));

    let resp = send(&router, get("/metrics")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!("# TYPE sso_up gauge\nsso_up 1\n"));
}

#[tokio::test]
async fn test_list_reads_query_string() {
    let service = EchoService::new();
    let resp = send(&router(&service), get("/v1/audit?status=open&limit=10&type=login")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body,
        json!({"meta": {"status": "open", "limit": 10, "type": "login"}, "data": []})
    );
}

#[tokio::test]
async fn test_list_rejects_malformed_query() {
    let service = EchoService::new();
    let resp = send(&router(&service), get("/v1/audit?limit=lots")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["code"], json!(3));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_list_rejects_bad_escape_and_repeated_key() {
    let service = EchoService::new();
    let router = router(&service);

    let resp = send(&router, get("/v1/audit?status=%zz")).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["code"], json!(3));

    let resp = send(&router, get("/v1/audit?status=a&status=b")).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_create_with_null_body_sets_no_fields() {
    let service = EchoService::new();
    let resp = send(&router(&service), with_body("POST", "/v1/audit", "null")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"], json!({"id": "created"}));
}

#[tokio::test]
async fn test_create_reads_body() {
    let service = EchoService::new();
    let resp = send(
        &router(&service),
        with_body("POST", "/v1/audit", r#"{"actor":"x","type":"login","extra":true}"#),
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.body,
        json!({"data": {"id": "created", "type": "login", "actor": "x"}})
    );
}

#[tokio::test]
async fn test_create_with_empty_body_sets_no_fields() {
    let service = EchoService::new();
    let resp = send(&router(&service), with_body("POST", "/v1/audit", "")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"], json!({"id": "created"}));
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_create_with_malformed_body_is_rejected() {
    let service = EchoService::new();
    let resp = send(&router(&service), with_body("POST", "/v1/audit", "{not json")).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["code"], json!(3));
    assert_eq!(resp.body["details"], json!([]));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_read_binds_path_variable() {
    let service = EchoService::new();
    let resp = send(&router(&service), get("/v1/audit/42")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["id"], json!("42"));
}

#[tokio::test]
async fn test_read_decodes_percent_encoded_path() {
    let service = EchoService::new();
    let resp = send(&router(&service), get("/v1/audit/a%20b")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["id"], json!("a b"));
}

#[tokio::test]
async fn test_update_path_wins_over_body() {
    let service = EchoService::new();
    let resp = send(
        &router(&service),
        with_body("PATCH", "/v1/audit/42", r#"{"id":"7","status":"closed"}"#),
    )
    .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["id"], json!("42"));
    assert_eq!(resp.body["data"]["status"], json!("closed"));
}

#[tokio::test]
async fn test_update_with_empty_body_keeps_path_value() {
    let service = EchoService::new();
    let resp = send(&router(&service), with_body("PATCH", "/v1/audit/42", "")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["id"], json!("42"));
    assert!(resp.body["data"].get("status").is_none());
}

#[tokio::test]
async fn test_shared_path_does_not_cross_dispatch() {
    let service = EchoService::new();
    let router = router(&service);

    // GET and POST share /v1/audit.
    let list = send(&router, get("/v1/audit?actor=x")).await;
    assert_eq!(list.body["meta"]["actor"], json!("x"));
    assert!(list.body.get("data").unwrap().is_array());

    let create = send(&router, with_body("POST", "/v1/audit", r#"{"actor":"x"}"#)).await;
    assert_eq!(create.body["data"]["id"], json!("created"));

    // No DELETE route exists for the path.
    let request = Request::builder()
        .method("DELETE")
        .uri("/v1/audit/42")
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn test_head_never_reaches_service() {
    let service = EchoService::new();
    let router = router(&service);

    for uri in ["/ping", "/v1/audit", "/v1/audit/42"] {
        let request = Request::builder()
            .method("HEAD")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = router.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "HEAD {uri}");
    }
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_service_error_passes_through() {
    let service = EchoService::new();
    let resp = send(&router(&service), get("/v1/audit/missing")).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(
        resp.body,
        json!({"code": 5, "message": "audit not found", "details": []})
    );
}

#[tokio::test]
async fn test_metadata_is_forwarded_both_ways() {
    let service = EchoService::new();
    let request = Request::builder()
        .uri("/v1/audit/42")
        .header("authorization", "Bearer abc")
        .header("grpc-metadata-tenant", "acme")
        .body(Body::empty())
        .unwrap();
    let resp = send(&router(&service), request).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["subject"], json!("acme"));
    assert_eq!(resp.body["data"]["actor"], json!("Bearer abc"));
    assert_eq!(resp.headers.get("grpc-metadata-x-request-id").unwrap(), "req-1");
    assert_eq!(resp.headers.get("grpc-trailer-x-audit-version").unwrap(), "3");
}

#[tokio::test]
async fn test_grpc_timeout_expiry_is_gateway_timeout() {
    let service = EchoService::new();
    let request = Request::builder()
        .uri("/v1/audit/slow")
        .header("grpc-timeout", "50m")
        .body(Body::empty())
        .unwrap();
    let resp = send(&router(&service), request).await;

    assert_eq!(resp.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(resp.body["code"], json!(4));
}

#[tokio::test]
async fn test_server_timeout_applies_without_header() {
    let service = EchoService::new();
    let router = Gateway::builder()
        .timeout(Duration::from_millis(50))
        .local(service.clone())
        .unwrap()
        .into_router();
    let resp = send(&router, get("/v1/audit/slow")).await;

    assert_eq!(resp.status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_invalid_grpc_timeout_is_rejected() {
    let service = EchoService::new();
    let request = Request::builder()
        .uri("/v1/audit/42")
        .header("grpc-timeout", "soon")
        .body(Body::empty())
        .unwrap();
    let resp = send(&router(&service), request).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let service = EchoService::new();
    let router = Gateway::builder()
        .body_limit(8)
        .local(service.clone())
        .unwrap()
        .into_router();
    let resp = send(
        &router,
        with_body("POST", "/v1/audit", r#"{"actor":"a very long actor name"}"#),
    )
    .await;

    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.body["code"], json!(8));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_cancelling_governing_token_cancels_call() {
    let service = EchoService::new();
    let shutdown = CancellationToken::new();
    let router = Gateway::builder()
        .shutdown_token(shutdown.clone())
        .local(service.clone())
        .unwrap()
        .into_router();

    let in_flight = tokio::spawn({
        let router = router.clone();
        async move { send(&router, get("/v1/audit/wait")).await }
    });

    service.entered.notified().await;
    shutdown.cancel();
    let resp = in_flight.await.unwrap();

    assert_eq!(resp.status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(resp.body["code"], json!(1));
    assert!(service.observed_cancel.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_gateways_are_independent() {
    let first = EchoService::new();
    let second = EchoService::new();
    let a = router(&first);
    let b = router(&second);

    send(&a, get("/ping")).await;
    send(&a, get("/ping")).await;
    send(&b, get("/ping")).await;

    assert_eq!(first.calls(), 2);
    assert_eq!(second.calls(), 1);
}

#[test]
fn test_register_error_display() {
    let err = RegisterError::Duplicate {
        method: Method::GET,
        pattern: "/ping".to_owned(),
    };
    assert_eq!(err.to_string(), "route GET /ping is already registered");
}
