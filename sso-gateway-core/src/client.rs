//! gRPC client stub for `sso.Sso`.

use http::uri::PathAndQuery;
use tonic::client::Grpc;
use tonic::codegen::{GrpcMethod, StdError};
use tonic::transport::{Channel, Endpoint};
use tonic::{IntoRequest, Request, Response, Status};
use tonic_prost::ProstCodec;

use crate::method::{AuditCreate, AuditList, AuditRead, AuditUpdate, Metrics, Ping, UnaryMethod};
use crate::pb::{
    AuditCreateRequest, AuditListReply, AuditListRequest, AuditReadReply, AuditReadRequest,
    AuditUpdateRequest, Empty, Text,
};

/// Client for the `sso.Sso` service over a `tonic` channel.
///
/// Cloning is cheap and shares the underlying connection.
#[derive(Debug, Clone)]
pub struct SsoClient {
    inner: Grpc<Channel>,
}

impl SsoClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: Grpc::new(channel),
        }
    }

    /// Dial `dst` and wrap the established channel.
    pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
    where
        D: TryInto<Endpoint>,
        D::Error: Into<StdError>,
    {
        let channel = Endpoint::new(dst)?.connect().await?;
        Ok(Self::new(channel))
    }

    /// Send a unary request for method `M`.
    pub async fn unary<M: UnaryMethod>(
        &mut self,
        request: Request<M::Request>,
    ) -> Result<Response<M::Response>, Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unavailable(format!("service was not ready: {e}")))?;

        let mut request = request;
        request
            .extensions_mut()
            .insert(GrpcMethod::new(crate::SERVICE_NAME, M::NAME));

        let codec = ProstCodec::<M::Request, M::Response>::default();
        self.inner
            .unary(request, PathAndQuery::from_static(M::PATH), codec)
            .await
    }

    pub async fn ping(
        &mut self,
        request: impl IntoRequest<Empty>,
    ) -> Result<Response<Text>, Status> {
        self.unary::<Ping>(request.into_request()).await
    }

    pub async fn metrics(
        &mut self,
        request: impl IntoRequest<Empty>,
    ) -> Result<Response<Text>, Status> {
        self.unary::<Metrics>(request.into_request()).await
    }

    pub async fn audit_list(
        &mut self,
        request: impl IntoRequest<AuditListRequest>,
    ) -> Result<Response<AuditListReply>, Status> {
        self.unary::<AuditList>(request.into_request()).await
    }

    pub async fn audit_create(
        &mut self,
        request: impl IntoRequest<AuditCreateRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        self.unary::<AuditCreate>(request.into_request()).await
    }

    pub async fn audit_read(
        &mut self,
        request: impl IntoRequest<AuditReadRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        self.unary::<AuditRead>(request.into_request()).await
    }

    pub async fn audit_update(
        &mut self,
        request: impl IntoRequest<AuditUpdateRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        self.unary::<AuditUpdate>(request.into_request()).await
    }
}
