//! gRPC server adapter for `sso.Sso`.
//!
//! [`SsoServer`] routes gRPC requests by path to a shared [`Sso`]
//! implementation and can be added to a `tonic::transport::Server`.

use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tonic::body::Body;
use tonic::codegen::StdError;
use tonic::server::{Grpc, NamedService, UnaryService};
use tonic::{Request, Response, Status};
use tonic_prost::ProstCodec;
use tower::Service;

use crate::Sso;
use crate::method::{AuditCreate, AuditList, AuditRead, AuditUpdate, Metrics, Ping, UnaryMethod};

#[derive(Clone)]
pub struct SsoServer {
    inner: Arc<dyn Sso>,
}

impl SsoServer {
    pub fn new<S: Sso>(service: S) -> Self {
        Self::from_arc(Arc::new(service))
    }

    pub fn from_arc(inner: Arc<dyn Sso>) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for SsoServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoServer").finish_non_exhaustive()
    }
}

impl NamedService for SsoServer {
    const NAME: &'static str = crate::SERVICE_NAME;
}

/// Adapts one method of a shared service to tonic's [`UnaryService`].
struct MethodService<M> {
    inner: Arc<dyn Sso>,
    _method: PhantomData<M>,
}

impl<M: UnaryMethod> UnaryService<M::Request> for MethodService<M> {
    type Response = M::Response;
    type Future = BoxFuture<'static, Result<Response<M::Response>, Status>>;

    fn call(&mut self, request: Request<M::Request>) -> Self::Future {
        M::invoke(Arc::clone(&self.inner), request)
    }
}

async fn serve_unary<M, B>(inner: Arc<dyn Sso>, req: http::Request<B>) -> http::Response<Body>
where
    M: UnaryMethod,
    B: http_body::Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    let method = MethodService::<M> {
        inner,
        _method: PhantomData,
    };
    let codec = ProstCodec::<M::Response, M::Request>::default();
    Grpc::new(codec).unary(method, req).await
}

impl<B> Service<http::Request<B>> for SsoServer
where
    B: http_body::Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        let path = req.uri().path();

        if path == Ping::PATH {
            Box::pin(async move { Ok(serve_unary::<Ping, B>(inner, req).await) })
        } else if path == Metrics::PATH {
            Box::pin(async move { Ok(serve_unary::<Metrics, B>(inner, req).await) })
        } else if path == AuditList::PATH {
            Box::pin(async move { Ok(serve_unary::<AuditList, B>(inner, req).await) })
        } else if path == AuditCreate::PATH {
            Box::pin(async move { Ok(serve_unary::<AuditCreate, B>(inner, req).await) })
        } else if path == AuditRead::PATH {
            Box::pin(async move { Ok(serve_unary::<AuditRead, B>(inner, req).await) })
        } else if path == AuditUpdate::PATH {
            Box::pin(async move { Ok(serve_unary::<AuditUpdate, B>(inner, req).await) })
        } else {
            let status = Status::unimplemented(format!("unknown method {path}"));
            Box::pin(async move { Ok(status.into_http()) })
        }
    }
}
