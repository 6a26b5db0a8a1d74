//! Unary method descriptors for `sso.Sso`.
//!
//! Every RPC is described by a zero-sized marker type implementing
//! [`UnaryMethod`]. The marker carries the request/response types, the gRPC
//! path, and how to call the method on an in-process [`Sso`] implementation,
//! so the client stub, the server adapter and the HTTP gateway can all be
//! written once, generically over the method.

use std::sync::Arc;

use futures::future::BoxFuture;
use tonic::{Request, Response, Status};

use crate::Sso;
use crate::pb::{
    AuditCreateRequest, AuditListReply, AuditListRequest, AuditReadReply, AuditReadRequest,
    AuditUpdateRequest, Empty, Text,
};

/// A unary RPC of the `sso.Sso` service.
pub trait UnaryMethod: Send + Sync + 'static {
    type Request: prost::Message + Default + Send + Sync + 'static;
    type Response: prost::Message + Default + Send + Sync + 'static;

    /// Method name as declared in the service, e.g. `AuditRead`.
    const NAME: &'static str;
    /// gRPC request path, e.g. `/sso.Sso/AuditRead`.
    const PATH: &'static str;

    /// Call this method on an in-process service.
    fn invoke(
        service: Arc<dyn Sso>,
        request: Request<Self::Request>,
    ) -> BoxFuture<'static, Result<Response<Self::Response>, Status>>;
}

macro_rules! unary_method {
    ($(#[$doc:meta])* $marker:ident, $name:literal, $call:ident, $req:ty => $resp:ty) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $marker;

        impl UnaryMethod for $marker {
            type Request = $req;
            type Response = $resp;

            const NAME: &'static str = $name;
            const PATH: &'static str = concat!("/sso.Sso/", $name);

            fn invoke(
                service: Arc<dyn Sso>,
                request: Request<$req>,
            ) -> BoxFuture<'static, Result<Response<$resp>, Status>> {
                Box::pin(async move { service.$call(request).await })
            }
        }
    };
}

unary_method!(
    /// `Ping(Empty) -> Text`
    Ping, "Ping", ping, Empty => Text
);
unary_method!(
    /// `Metrics(Empty) -> Text`
    Metrics, "Metrics", metrics, Empty => Text
);
unary_method!(
    /// `AuditList(AuditListRequest) -> AuditListReply`
    AuditList, "AuditList", audit_list, AuditListRequest => AuditListReply
);
unary_method!(
    /// `AuditCreate(AuditCreateRequest) -> AuditReadReply`
    AuditCreate, "AuditCreate", audit_create, AuditCreateRequest => AuditReadReply
);
unary_method!(
    /// `AuditRead(AuditReadRequest) -> AuditReadReply`
    AuditRead, "AuditRead", audit_read, AuditReadRequest => AuditReadReply
);
unary_method!(
    /// `AuditUpdate(AuditUpdateRequest) -> AuditReadReply`
    AuditUpdate, "AuditUpdate", audit_update, AuditUpdateRequest => AuditReadReply
);
