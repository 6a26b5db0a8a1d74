#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use sso_gateway::Trailers;
use sso_gateway::pb::{
    Audit, AuditCreateRequest, AuditListReply, AuditListRequest, AuditReadReply,
    AuditReadRequest, AuditUpdateRequest, Empty, Text,
};
use sso_gateway::Sso;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataMap;
use tonic::{Response, Status};
use tower::ServiceExt;

/// A service that echoes its input back.
///
/// Special ids on `AuditRead`:
/// - `missing`: fails with `NotFound`
/// - `slow`: sleeps for five seconds
/// - `wait`: blocks until the request token is cancelled
#[derive(Default)]
pub struct EchoService {
    pub calls: AtomicUsize,
    pub entered: Notify,
    pub observed_cancel: AtomicBool,
}

impl EchoService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn metadata_value(metadata: &MetadataMap, key: &str) -> Option<String> {
    metadata
        .get(key)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[async_trait]
impl Sso for EchoService {
    async fn ping(&self, _request: tonic::Request<Empty>) -> Result<Response<Text>, Status> {
        self.record();
        Ok(Response::new(Text {
            text: "pong".to_owned(),
        }))
    }

    async fn metrics(&self, _request: tonic::Request<Empty>) -> Result<Response<Text>, Status> {
        self.record();
        Ok(Response::new(Text {
            text: "# TYPE sso_up gauge\nsso_up 1\n".to_owned(),
        }))
    }

    async fn audit_list(
        &self,
        request: tonic::Request<AuditListRequest>,
    ) -> Result<Response<AuditListReply>, Status> {
        self.record();
        Ok(Response::new(AuditListReply {
            meta: Some(request.into_inner()),
            data: Vec::new(),
        }))
    }

    async fn audit_create(
        &self,
        request: tonic::Request<AuditCreateRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        self.record();
        let req = request.into_inner();
        Ok(Response::new(AuditReadReply {
            data: Some(Audit {
                id: "created".to_owned(),
                type_: req.type_,
                subject: req.subject,
                status: req.status,
                actor: req.actor,
                data: req.data,
                user_id: req.user_id,
                service_id: req.service_id,
                ..Default::default()
            }),
        }))
    }

    async fn audit_read(
        &self,
        request: tonic::Request<AuditReadRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        self.record();
        let token = request.extensions().get::<CancellationToken>().cloned();
        let tenant = metadata_value(request.metadata(), "tenant");
        let authorization = metadata_value(request.metadata(), "authorization");
        let id = request.into_inner().id;

        match id.as_str() {
            "missing" => return Err(Status::not_found("audit not found")),
            "slow" => tokio::time::sleep(Duration::from_secs(5)).await,
            "wait" => {
                self.entered.notify_one();
                if let Some(token) = token {
                    token.cancelled().await;
                    self.observed_cancel.store(true, Ordering::SeqCst);
                    return Err(Status::cancelled("request cancelled"));
                }
            }
            _ => {}
        }

        let mut response = Response::new(AuditReadReply {
            data: Some(Audit {
                id,
                subject: tenant,
                actor: authorization,
                ..Default::default()
            }),
        });
        response
            .metadata_mut()
            .insert("x-request-id", "req-1".parse().unwrap());
        let mut trailers = MetadataMap::new();
        trailers.insert("x-audit-version", "3".parse().unwrap());
        response.extensions_mut().insert(Trailers(trailers));
        Ok(response)
    }

    async fn audit_update(
        &self,
        request: tonic::Request<AuditUpdateRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        self.record();
        let req = request.into_inner();
        Ok(Response::new(AuditReadReply {
            data: Some(Audit {
                id: req.id,
                subject: req.subject,
                status: req.status,
                actor: req.actor,
                data: req.data,
                ..Default::default()
            }),
        }))
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

pub fn with_body(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}
