//! Gateway error types.
//!
//! [`GatewayError`] is what a failed request turns into: a status [`Code`],
//! a message and optional response headers. It renders as the JSON body
//! `{"code": <int>, "message": <string>, "details": []}` with the HTTP status
//! mapped from the code. [`RegisterError`] covers everything that can go
//! wrong while building a gateway.

use axum::{
    Json,
    http::{HeaderMap, HeaderName, HeaderValue, Method},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::metadata::{METADATA_HEADER_PREFIX, forward_metadata};
use crate::pattern::PatternError;

pub use sso_gateway_core::Code;

/// An error produced while serving a gateway request.
#[derive(Clone, Debug)]
pub struct GatewayError {
    code: Code,
    message: String,
    meta: Option<HeaderMap>,
}

impl GatewayError {
    /// Create a new error with a code and message.
    pub fn new<S: Into<String>>(code: Code, message: S) -> Self {
        Self {
            code,
            message: message.into(),
            meta: None,
        }
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn resource_exhausted<S: Into<String>>(message: S) -> Self {
        Self::new(Code::ResourceExhausted, message)
    }

    pub fn canceled() -> Self {
        Self::new(Code::Canceled, "context canceled")
    }

    pub fn deadline_exceeded() -> Self {
        Self::new(Code::DeadlineExceeded, "context deadline exceeded")
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the metadata headers, if any.
    pub fn meta(&self) -> Option<&HeaderMap> {
        self.meta.as_ref()
    }

    /// Get mutable access to metadata headers.
    pub fn meta_mut(&mut self) -> &mut HeaderMap {
        self.meta.get_or_insert_with(HeaderMap::new)
    }

    /// Add a response header. Invalid names or values are dropped.
    pub fn with_meta<K, V>(mut self, key: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let key = key.as_ref();
        let value = value.as_ref();

        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.meta_mut().append(name, value);
            }
            (Err(e), _) => {
                tracing::debug!(key, error = %e, "invalid header name, metadata dropped");
            }
            (_, Err(e)) => {
                tracing::debug!(key, error = %e, "invalid header value, metadata dropped");
            }
        }
        self
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<tonic::Status> for GatewayError {
    fn from(status: tonic::Status) -> Self {
        let mut error = Self::new(status.code().into(), status.message());
        let mut headers = HeaderMap::new();
        forward_metadata(&mut headers, status.metadata(), METADATA_HEADER_PREFIX);
        if !headers.is_empty() {
            error.meta = Some(headers);
        }
        error
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: Code,
    message: &'a str,
    details: [(); 0],
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
            details: [],
        };
        let mut response = (self.code.http_status(), Json(body)).into_response();
        if let Some(meta) = self.meta {
            response.headers_mut().extend(meta);
        }
        response
    }
}

/// Errors raised while registering routes or connecting to the upstream.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("invalid route pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: PatternError,
    },
    #[error("unsupported HTTP method {0}")]
    Method(Method),
    #[error("route {method} {pattern} is already registered")]
    Duplicate { method: Method, pattern: String },
    #[error("path variable {variable:?} of {pattern} is not bound to a request field")]
    UnboundVariable { pattern: String, variable: String },
    #[error("path field {field:?} is not a variable of {pattern}")]
    UnknownPathField { pattern: String, field: String },
    #[error("invalid endpoint {endpoint:?}: {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("failed to dial {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },
}
