//! HTTP/JSON gateway for the `sso.Sso` gRPC service, built on axum.
//!
//! Each HTTP route is bound to one RPC method. A request is decoded into the
//! method's request message (from the query string, the JSON body and path
//! variables), the method is invoked either in-process or through a gRPC
//! client, and the response message is written back as JSON.
//!
//! ## Modules
//!
//! - [`gateway`]: [`Gateway`] and its builder, both registration modes
//! - [`pattern`]: Path template validation
//! - [`metadata`]: Header/metadata mapping in both directions
//! - [`timeout`]: `Grpc-Timeout` handling
//! - [`target`]: Local and remote invocation targets
//! - [`error`]: Gateway and registration errors

mod decode;
mod dispatch;
pub mod error;
pub mod gateway;
pub mod metadata;
pub mod pattern;
mod route;
mod sso;
mod table;
pub mod target;
pub mod timeout;

pub use decode::DEFAULT_BODY_LIMIT;
pub use error::{Code, GatewayError, RegisterError};
pub use gateway::{Gateway, GatewayBuilder};
pub use metadata::{ServerMetadata, Trailers};
pub use pattern::{Pattern, PatternError};
pub use route::{RequestSource, RouteDescriptor};
pub use target::{RemoteTarget, Target};

pub use sso_gateway_core::{Sso, SsoClient, SsoServer, pb};
