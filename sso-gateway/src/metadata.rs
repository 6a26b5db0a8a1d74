//! Mapping between HTTP headers and gRPC metadata.
//!
//! Incoming: [`annotate`] builds the RPC request metadata from the HTTP
//! request. Outgoing: [`forward_server_metadata`] copies response metadata
//! onto the HTTP response as `Grpc-Metadata-*` / `Grpc-Trailer-*` headers.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, HeaderValue, header, request::Parts};
use tonic::metadata::MetadataMap;

/// Prefix for request headers forwarded verbatim as metadata, and for
/// response headers carrying server header metadata.
pub const METADATA_HEADER_PREFIX: &str = "grpc-metadata-";
/// Prefix for response headers carrying server trailer metadata.
pub const METADATA_TRAILER_PREFIX: &str = "grpc-trailer-";
/// Prefix applied to permanent HTTP headers forwarded as metadata.
pub const GATEWAY_METADATA_PREFIX: &str = "grpcgateway-";

const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Standard request headers that are forwarded with [`GATEWAY_METADATA_PREFIX`].
const PERMANENT_HEADERS: &[&str] = &[
    "accept",
    "accept-charset",
    "accept-language",
    "accept-ranges",
    "authorization",
    "cache-control",
    "content-type",
    "cookie",
    "date",
    "expect",
    "from",
    "host",
    "if-match",
    "if-modified-since",
    "if-none-match",
    "if-schedule-tag-match",
    "if-unmodified-since",
    "max-forwards",
    "origin",
    "pragma",
    "referer",
    "user-agent",
    "via",
    "warning",
];

/// Trailers attached by a service to its response.
///
/// A local [`Sso`](sso_gateway_core::Sso) implementation can insert this into
/// the response extensions; the gateway forwards it as `Grpc-Trailer-*`.
#[derive(Clone, Debug, Default)]
pub struct Trailers(pub MetadataMap);

/// Header and trailer metadata returned by a call.
#[derive(Clone, Debug, Default)]
pub struct ServerMetadata {
    pub headers: MetadataMap,
    pub trailers: MetadataMap,
}

/// Build RPC request metadata from an incoming HTTP request.
pub fn annotate(parts: &Parts) -> MetadataMap {
    let mut headers = HeaderMap::new();

    for (name, value) in &parts.headers {
        let key = name.as_str();

        if key == "authorization" {
            headers.append(header::AUTHORIZATION, value.clone());
        }

        if let Some(stripped) = key.strip_prefix(METADATA_HEADER_PREFIX) {
            append(&mut headers, stripped, value.clone());
        } else if PERMANENT_HEADERS.contains(&key) {
            append(
                &mut headers,
                &format!("{GATEWAY_METADATA_PREFIX}{key}"),
                value.clone(),
            );
        }
    }

    let host = parts
        .headers
        .get(X_FORWARDED_HOST)
        .or_else(|| parts.headers.get(header::HOST))
        .cloned()
        .or_else(|| {
            let authority = parts.uri.authority()?;
            HeaderValue::from_str(authority.as_str()).ok()
        });
    if let Some(host) = host {
        headers.insert(X_FORWARDED_HOST, host);
    }

    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        let remote = addr.ip().to_string();
        let forwarded = match parts
            .headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
        {
            Some(existing) => format!("{existing}, {remote}"),
            None => remote,
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    } else if let Some(existing) = parts.headers.get(X_FORWARDED_FOR) {
        headers.insert(X_FORWARDED_FOR, existing.clone());
    }

    MetadataMap::from_headers(headers)
}

fn append(headers: &mut HeaderMap, key: &str, value: HeaderValue) {
    match HeaderName::from_bytes(key.as_bytes()) {
        Ok(name) => {
            headers.append(name, value);
        }
        Err(e) => {
            tracing::debug!(key, error = %e, "invalid metadata key, header dropped");
        }
    }
}

/// Copy forwardable metadata onto `headers`, each key prefixed with `prefix`.
///
/// Binary (`-bin`) keys and keys owned by the gRPC or HTTP transport are
/// skipped.
pub fn forward_metadata(headers: &mut HeaderMap, metadata: &MetadataMap, prefix: &str) {
    for (name, value) in &metadata.clone().into_headers() {
        let key = name.as_str();
        if !is_forwardable(key) {
            continue;
        }
        append(headers, &format!("{prefix}{key}"), value.clone());
    }
}

/// Attach server metadata to an HTTP response.
pub fn forward_server_metadata(headers: &mut HeaderMap, metadata: &ServerMetadata) {
    forward_metadata(headers, &metadata.headers, METADATA_HEADER_PREFIX);
    forward_metadata(headers, &metadata.trailers, METADATA_TRAILER_PREFIX);
}

fn is_forwardable(key: &str) -> bool {
    !(key.ends_with("-bin")
        || key.starts_with("grpc-")
        || matches!(
            key,
            "content-type"
                | "content-length"
                | "date"
                | "te"
                | "trailer"
                | "transfer-encoding"
                | "user-agent"
        ))
}
