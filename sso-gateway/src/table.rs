//! Per-gateway route table.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::http::Method;
use axum::routing::{MethodFilter, MethodRouter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sso_gateway_core::UnaryMethod;

use crate::dispatch::{DispatchContext, serve};
use crate::error::RegisterError;
use crate::route::{Route, RouteDescriptor};

/// Routes registered for one gateway instance.
///
/// Every `(method, pattern)` pair maps to exactly one RPC method; adding a
/// pair twice fails.
pub struct RouteTable {
    ctx: Arc<DispatchContext>,
    paths: BTreeMap<String, MethodRouter>,
    seen: HashSet<(Method, String)>,
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub(crate) fn new(ctx: DispatchContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            paths: BTreeMap::new(),
            seen: HashSet::new(),
            routes: Vec::new(),
        }
    }

    /// Register `route`, dispatching to RPC method `M`.
    pub fn add<M>(&mut self, route: Route<M>) -> Result<&mut Self, RegisterError>
    where
        M: UnaryMethod,
        M::Request: DeserializeOwned,
        M::Response: Serialize,
    {
        let route = route.compile()?;
        let descriptor = route.descriptor.clone();

        let key = (descriptor.method.clone(), descriptor.pattern.clone());
        if self.seen.contains(&key) {
            return Err(RegisterError::Duplicate {
                method: descriptor.method,
                pattern: descriptor.pattern,
            });
        }
        let filter = MethodFilter::try_from(descriptor.method.clone())
            .map_err(|_| RegisterError::Method(descriptor.method.clone()))?;

        let route = Arc::new(route);
        let ctx = Arc::clone(&self.ctx);
        let handler = move |request: Request| {
            let route = Arc::clone(&route);
            let ctx = Arc::clone(&ctx);
            async move { serve::<M>(route, ctx, request).await }
        };

        let method_router = self
            .paths
            .remove(&descriptor.pattern)
            .unwrap_or_default()
            .on(filter, handler);
        self.paths.insert(descriptor.pattern.clone(), method_router);

        tracing::debug!(route = %descriptor, "registered route");
        self.seen.insert(key);
        self.routes.push(descriptor);
        Ok(self)
    }

    pub(crate) fn into_parts(self) -> (Router, Vec<RouteDescriptor>) {
        let router = self
            .paths
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            });
        (router, self.routes)
    }
}
