use async_trait::async_trait;
use tonic::{Request, Response, Status};

use crate::pb::{
    AuditCreateRequest, AuditListReply, AuditListRequest, AuditReadReply, AuditReadRequest,
    AuditUpdateRequest, Empty, Text,
};

/// Server-side behaviour of the `sso.Sso` service.
///
/// Every method defaults to `Unimplemented`, so an implementation only needs
/// to provide the calls it actually serves.
#[async_trait]
pub trait Sso: Send + Sync + 'static {
    async fn ping(&self, request: Request<Empty>) -> Result<Response<Text>, Status> {
        let _ = request;
        Err(Status::unimplemented("Ping is not implemented"))
    }

    async fn metrics(&self, request: Request<Empty>) -> Result<Response<Text>, Status> {
        let _ = request;
        Err(Status::unimplemented("Metrics is not implemented"))
    }

    async fn audit_list(
        &self,
        request: Request<AuditListRequest>,
    ) -> Result<Response<AuditListReply>, Status> {
        let _ = request;
        Err(Status::unimplemented("AuditList is not implemented"))
    }

    async fn audit_create(
        &self,
        request: Request<AuditCreateRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        let _ = request;
        Err(Status::unimplemented("AuditCreate is not implemented"))
    }

    async fn audit_read(
        &self,
        request: Request<AuditReadRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        let _ = request;
        Err(Status::unimplemented("AuditRead is not implemented"))
    }

    async fn audit_update(
        &self,
        request: Request<AuditUpdateRequest>,
    ) -> Result<Response<AuditReadReply>, Status> {
        let _ = request;
        Err(Status::unimplemented("AuditUpdate is not implemented"))
    }
}
