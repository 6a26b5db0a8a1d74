//! Gateway construction.
//!
//! A [`Gateway`] owns the route table for the `sso.Sso` service and turns it
//! into an [`axum::Router`]. It is built in one of two modes:
//!
//! - **local**: handlers call an in-process [`Sso`] implementation directly
//! - **proxy**: handlers call a remote service through an [`SsoClient`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sso_gateway::Gateway;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let shutdown = CancellationToken::new();
//! let gateway = Gateway::builder()
//!     .timeout(Duration::from_secs(10))
//!     .shutdown_token(shutdown.clone())
//!     .from_endpoint("http://127.0.0.1:7042")
//!     .await?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, gateway.into_router())
//!     .with_graceful_shutdown(async move { shutdown.cancelled().await })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sso_gateway_core::{Sso, SsoClient};
use tokio_util::sync::CancellationToken;
use tonic::transport::Endpoint;

use crate::decode::DEFAULT_BODY_LIMIT;
use crate::dispatch::DispatchContext;
use crate::error::RegisterError;
use crate::route::RouteDescriptor;
use crate::sso::register_sso_routes;
use crate::table::RouteTable;
use crate::target::{RemoteTarget, Target};

/// An HTTP gateway for `sso.Sso`.
pub struct Gateway {
    router: Router,
    routes: Vec<RouteDescriptor>,
    target: Target,
}

impl Gateway {
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Local mode with default options.
    pub fn local(service: Arc<dyn Sso>) -> Result<Self, RegisterError> {
        Self::builder().local(service)
    }

    /// Proxy mode over an existing client, with default options.
    pub fn client(client: SsoClient) -> Result<Self, RegisterError> {
        Self::builder().client(client)
    }

    /// Dial `endpoint` and build a proxy-mode gateway with default options.
    pub async fn from_endpoint(endpoint: impl Into<String>) -> Result<Self, RegisterError> {
        Self::builder().from_endpoint(endpoint).await
    }

    /// The registered routes, in registration order.
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("routes", &self.routes)
            .field("target", &self.target)
            .finish()
    }
}

/// Builder for [`Gateway`].
#[derive(Clone, Debug)]
pub struct GatewayBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    body_limit: usize,
    shutdown: CancellationToken,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            body_limit: DEFAULT_BODY_LIMIT,
            shutdown: CancellationToken::new(),
        }
    }

    /// Server-side deadline for every call. A shorter `Grpc-Timeout` from
    /// the client still wins.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Maximum time to establish the upstream connection in
    /// [`from_endpoint`](Self::from_endpoint).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Maximum request body size in bytes.
    ///
    /// Default is 4 MiB.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Governing token. Cancelling it fails in-flight calls with `Canceled`
    /// and, in [`from_endpoint`](Self::from_endpoint) mode, closes the
    /// upstream connection.
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn local(self, service: Arc<dyn Sso>) -> Result<Gateway, RegisterError> {
        self.build(Target::Local(service))
    }

    pub fn client(self, client: SsoClient) -> Result<Gateway, RegisterError> {
        self.build(Target::Remote(RemoteTarget::new("client", client)))
    }

    /// Dial `endpoint` and register proxy routes over the new connection.
    ///
    /// The connection is closed when the governing token is cancelled. If
    /// registration fails after dialing, it is closed right away.
    pub async fn from_endpoint(
        self,
        endpoint: impl Into<String>,
    ) -> Result<Gateway, RegisterError> {
        let endpoint = endpoint.into();

        let mut dial = Endpoint::from_shared(endpoint.clone()).map_err(|source| {
            RegisterError::Endpoint {
                endpoint: endpoint.clone(),
                source,
            }
        })?;
        if let Some(timeout) = self.connect_timeout {
            dial = dial.connect_timeout(timeout);
        }
        let channel = dial.connect().await.map_err(|source| RegisterError::Connect {
            endpoint: endpoint.clone(),
            source,
        })?;
        tracing::info!(%endpoint, "connected to upstream");

        let remote = RemoteTarget::new(endpoint, SsoClient::new(channel));
        let shutdown = self.shutdown.clone();
        let gateway = match self.build(Target::Remote(remote.clone())) {
            Ok(gateway) => gateway,
            Err(err) => {
                remote.close();
                return Err(err);
            }
        };

        tokio::spawn(async move {
            shutdown.cancelled().await;
            remote.close();
        });

        Ok(gateway)
    }

    fn build(self, target: Target) -> Result<Gateway, RegisterError> {
        let mut table = RouteTable::new(DispatchContext {
            target: target.clone(),
            timeout: self.timeout,
            body_limit: self.body_limit,
            shutdown: self.shutdown,
        });
        register_sso_routes(&mut table)?;

        let (router, routes) = table.into_parts();
        Ok(Gateway {
            router,
            routes,
            target,
        })
    }
}
