//! The request handler shared by every route.
//!
//! [`serve`] is generic over the RPC method; the route decides how the
//! request is decoded and the response encoded, the [`Target`] decides where
//! the call goes.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams, Request};
use axum::http::{Extensions, HeaderValue, StatusCode, header, request::Parts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sso_gateway_core::UnaryMethod;
use tokio_util::sync::CancellationToken;

use crate::decode::decode_request;
use crate::error::GatewayError;
use crate::metadata::{ServerMetadata, Trailers, annotate, forward_server_metadata};
use crate::route::{CompiledRoute, ResponseBody};
use crate::target::Target;
use crate::timeout::{client_timeout, compute_effective_timeout};

/// State shared by all routes of one gateway.
pub(crate) struct DispatchContext {
    pub(crate) target: Target,
    pub(crate) timeout: Option<Duration>,
    pub(crate) body_limit: usize,
    pub(crate) shutdown: CancellationToken,
}

pub(crate) async fn serve<M>(
    route: Arc<CompiledRoute<M>>,
    ctx: Arc<DispatchContext>,
    request: Request,
) -> Response
where
    M: UnaryMethod,
    M::Request: DeserializeOwned,
    M::Response: Serialize,
{
    // The router also hands HEAD to GET routes.
    if request.method() != route.descriptor.method {
        let allow = HeaderValue::from_str(route.descriptor.method.as_str())
            .unwrap_or(HeaderValue::from_static("GET"));
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, allow)]).into_response();
    }

    // Dropping the handler future (client went away) cancels the call.
    let token = ctx.shutdown.child_token();
    let _guard = token.clone().drop_guard();

    match call(&route, &ctx, token, request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(
                rpc = M::PATH,
                code = err.code().as_str(),
                message = err.message(),
                "gateway call failed"
            );
            err.into_response()
        }
    }
}

async fn call<M>(
    route: &CompiledRoute<M>,
    ctx: &DispatchContext,
    token: CancellationToken,
    request: Request,
) -> Result<Response, GatewayError>
where
    M: UnaryMethod,
    M::Request: DeserializeOwned,
    M::Response: Serialize,
{
    let (mut parts, body) = request.into_parts();
    let params = path_params(route, &mut parts).await?;
    let message = decode_request(route, &parts, &params, body, ctx.body_limit).await?;

    let deadline = compute_effective_timeout(ctx.timeout, client_timeout(&parts.headers)?);

    let mut extensions = Extensions::new();
    extensions.insert(token.clone());
    let mut rpc_request = tonic::Request::from_parts(annotate(&parts), extensions, message);
    if let Some(deadline) = deadline {
        rpc_request.set_timeout(deadline);
    }

    let invocation = async {
        match deadline {
            Some(deadline) => tokio::time::timeout(deadline, ctx.target.invoke::<M>(rpc_request))
                .await
                .map_err(|_| GatewayError::deadline_exceeded())?
                .map_err(GatewayError::from),
            None => ctx
                .target
                .invoke::<M>(rpc_request)
                .await
                .map_err(GatewayError::from),
        }
    };

    // The call is polled first so a service watching the token gets to
    // report its own cancellation.
    let response = tokio::select! {
        biased;
        result = invocation => result?,
        _ = token.cancelled() => return Err(GatewayError::canceled()),
    };

    encode_response(route, response)
}

async fn path_params<M: UnaryMethod>(
    route: &CompiledRoute<M>,
    parts: &mut Parts,
) -> Result<Vec<(String, String)>, GatewayError> {
    if route.path_fields.is_empty() {
        return Ok(Vec::new());
    }
    let params = RawPathParams::from_request_parts(parts, &())
        .await
        .map_err(|rejection| GatewayError::invalid_argument(rejection.body_text()))?;
    Ok(params
        .iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect())
}

fn encode_response<M>(
    route: &CompiledRoute<M>,
    response: tonic::Response<M::Response>,
) -> Result<Response, GatewayError>
where
    M: UnaryMethod,
    M::Response: Serialize,
{
    let (headers, message, extensions) = response.into_parts();

    let body = match &route.response {
        ResponseBody::Message => serde_json::to_vec(&message),
        ResponseBody::Field { encode, .. } => encode(&message),
    }
    .map_err(|e| GatewayError::internal(format!("failed to encode response: {e}")))?;

    let metadata = ServerMetadata {
        headers,
        trailers: extensions
            .get::<Trailers>()
            .map(|t| t.0.clone())
            .unwrap_or_default(),
    };

    let mut response = (StatusCode::OK, Body::from(body)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    forward_server_metadata(response.headers_mut(), &metadata);
    Ok(response)
}
