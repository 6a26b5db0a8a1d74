//! Where a gateway sends its calls.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sso_gateway_core::{Sso, SsoClient, UnaryMethod};
use tonic::{Request, Response, Status};

/// The invocation target of a gateway: an in-process service or a remote
/// one reached through a gRPC client.
#[derive(Clone)]
pub enum Target {
    Local(Arc<dyn Sso>),
    Remote(RemoteTarget),
}

impl Target {
    pub(crate) async fn invoke<M: UnaryMethod>(
        &self,
        request: Request<M::Request>,
    ) -> Result<Response<M::Response>, Status> {
        match self {
            Target::Local(service) => M::invoke(Arc::clone(service), request).await,
            Target::Remote(remote) => {
                let mut client = remote.client()?;
                client.unary::<M>(request).await
            }
        }
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Local(_) => f.write_str("Local"),
            Target::Remote(remote) => f.debug_tuple("Remote").field(&remote.endpoint).finish(),
        }
    }
}

/// A client connection that can be closed once.
///
/// Clones share the connection slot. After [`close`](Self::close), calls fail
/// with `Unavailable` and the channel is released once in-flight calls finish.
#[derive(Clone)]
pub struct RemoteTarget {
    endpoint: Arc<str>,
    slot: Arc<Mutex<Option<SsoClient>>>,
}

impl RemoteTarget {
    pub fn new(endpoint: impl Into<Arc<str>>, client: SsoClient) -> Self {
        Self {
            endpoint: endpoint.into(),
            slot: Arc::new(Mutex::new(Some(client))),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Drop the client. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        match self.lock().take() {
            Some(client) => {
                drop(client);
                tracing::info!(endpoint = %self.endpoint, "closed upstream connection");
                true
            }
            None => {
                tracing::warn!(endpoint = %self.endpoint, "upstream connection already closed");
                false
            }
        }
    }

    fn client(&self) -> Result<SsoClient, Status> {
        self.lock().clone().ok_or_else(|| {
            Status::unavailable(format!("connection to {} is closed", self.endpoint))
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<SsoClient>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
