//! Request message decoding.
//!
//! A request message is built in two steps: first from the query string or
//! the JSON body (per the route's [`RequestSource`]), then path variables are
//! bound on top, so a path value always wins over a same-named field.

use std::collections::HashSet;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use sso_gateway_core::UnaryMethod;

use crate::error::GatewayError;
use crate::route::{CompiledRoute, PathField, RequestSource};

/// Default maximum request body size: 4 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// Decode the request message for `route` from an HTTP request.
pub(crate) async fn decode_request<M>(
    route: &CompiledRoute<M>,
    parts: &Parts,
    params: &[(String, String)],
    body: Body,
    body_limit: usize,
) -> Result<M::Request, GatewayError>
where
    M: UnaryMethod,
    M::Request: DeserializeOwned,
{
    let mut message = match route.descriptor.source {
        RequestSource::Empty => M::Request::default(),
        RequestSource::Query => {
            let filter: Vec<&str> = route.pattern.variables().collect();
            decode_query(parts.uri.query().unwrap_or_default(), &filter)?
        }
        RequestSource::Body => decode_body(&read_body(body, body_limit).await?)?,
    };
    bind_path(&mut message, &route.path_fields, params)?;
    Ok(message)
}

/// Read the whole request body, up to `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let source = e.into_inner();
        if source.is::<LengthLimitError>() {
            GatewayError::resource_exhausted(format!(
                "request body exceeds the {limit} byte limit"
            ))
        } else {
            GatewayError::invalid_argument(format!("failed to read request body: {source}"))
        }
    })
}

/// Decode a JSON body. An empty, whitespace-only or `null` body means "no
/// fields set".
pub fn decode_body<T>(bytes: &[u8]) -> Result<T, GatewayError>
where
    T: DeserializeOwned + Default,
{
    let trimmed = bytes.trim_ascii();
    if trimmed.is_empty() || trimmed == b"null" {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| GatewayError::invalid_argument(e.to_string()))
}

/// Decode a query string, skipping every key rooted at a name in `filter`.
///
/// A key is rooted at `name` when it is `name` itself or a nested form of it
/// (`name.field`, `name[0]`). Invalid percent escapes and repeated keys are
/// rejected; request messages decoded from a query have no repeated fields.
pub fn decode_query<T>(query: &str, filter: &[&str]) -> Result<T, GatewayError>
where
    T: DeserializeOwned,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        check_escapes(pair)?;

        let key = pair.split('=').next().unwrap_or_default();
        let root = key.split(['.', '[']).next().unwrap_or_default();
        if filter.contains(&root) {
            continue;
        }
        if !seen.insert(key) {
            return Err(GatewayError::invalid_argument(format!(
                "too many values for query parameter {key}"
            )));
        }
        kept.push(pair);
    }

    serde_qs::from_str(&kept.join("&")).map_err(|e| GatewayError::invalid_argument(e.to_string()))
}

/// Every `%` must start a two-digit hex escape.
fn check_escapes(pair: &str) -> Result<(), GatewayError> {
    let bytes = pair.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                let end = (i + 3).min(pair.len());
                let escape = pair.get(i..end).unwrap_or("%");
                return Err(GatewayError::invalid_argument(format!(
                    "invalid URL escape {escape:?}"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

fn bind_path<R>(
    message: &mut R,
    fields: &[PathField<R>],
    params: &[(String, String)],
) -> Result<(), GatewayError> {
    for field in fields {
        let value = params
            .iter()
            .find(|(name, _)| name == field.name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| {
                GatewayError::invalid_argument(format!("missing parameter {}", field.name))
            })?;
        (field.bind)(message, value)?;
    }
    Ok(())
}
