//! Declarative route descriptions.
//!
//! A [`Route`] ties one HTTP method and path template to one RPC method `M`,
//! together with how the request message is populated and how the response
//! message is written back. Routes are validated when they are added to a
//! gateway's route table.

use std::fmt;

use axum::http::Method;
use sso_gateway_core::UnaryMethod;

use crate::error::{GatewayError, RegisterError};
use crate::pattern::Pattern;

/// Where the fields of a request message come from, besides path variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestSource {
    /// Nothing; the message starts out empty.
    Empty,
    /// The URL query string.
    Query,
    /// The JSON request body.
    Body,
}

/// Assigns one path variable to a field of request message `R`.
pub type BindFn<R> = fn(&mut R, &str) -> Result<(), GatewayError>;

/// Serializes a single field of response message `R` as the HTTP body.
pub type FieldEncodeFn<R> = fn(&R) -> Result<Vec<u8>, serde_json::Error>;

pub(crate) struct PathField<R> {
    pub(crate) name: &'static str,
    pub(crate) bind: BindFn<R>,
}

/// How a response message is written as the HTTP body.
pub(crate) enum ResponseBody<R> {
    /// The whole message.
    Message,
    /// A single field of the message.
    Field {
        name: &'static str,
        encode: FieldEncodeFn<R>,
    },
}

/// A route for RPC method `M`.
pub struct Route<M: UnaryMethod> {
    method: Method,
    template: String,
    source: RequestSource,
    path_fields: Vec<PathField<M::Request>>,
    response: ResponseBody<M::Response>,
}

impl<M: UnaryMethod> Route<M> {
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            source: RequestSource::Empty,
            path_fields: Vec::new(),
            response: ResponseBody::Message,
        }
    }

    pub fn get(template: impl Into<String>) -> Self {
        Self::new(Method::GET, template)
    }

    pub fn post(template: impl Into<String>) -> Self {
        Self::new(Method::POST, template)
    }

    pub fn patch(template: impl Into<String>) -> Self {
        Self::new(Method::PATCH, template)
    }

    /// Populate the request from the query string. Keys naming a path
    /// variable are ignored.
    pub fn query(mut self) -> Self {
        self.source = RequestSource::Query;
        self
    }

    /// Populate the request from the JSON body.
    pub fn body(mut self) -> Self {
        self.source = RequestSource::Body;
        self
    }

    /// Bind path variable `name` to a request field. Path values are applied
    /// after the query string or body, so they take precedence.
    pub fn path(mut self, name: &'static str, bind: BindFn<M::Request>) -> Self {
        self.path_fields.push(PathField { name, bind });
        self
    }

    /// Write only one field of the response as the HTTP body.
    pub fn response_field(mut self, name: &'static str, encode: FieldEncodeFn<M::Response>) -> Self {
        self.response = ResponseBody::Field { name, encode };
        self
    }

    /// Validate the route and fix its shape.
    pub(crate) fn compile(self) -> Result<CompiledRoute<M>, RegisterError> {
        if !is_supported(&self.method) {
            return Err(RegisterError::Method(self.method));
        }

        let pattern = Pattern::parse(&self.template).map_err(|source| RegisterError::Pattern {
            pattern: self.template.clone(),
            source,
        })?;

        for variable in pattern.variables() {
            if !self.path_fields.iter().any(|f| f.name == variable) {
                return Err(RegisterError::UnboundVariable {
                    pattern: self.template.clone(),
                    variable: variable.to_owned(),
                });
            }
        }
        for field in &self.path_fields {
            if !pattern.variables().any(|v| v == field.name) {
                return Err(RegisterError::UnknownPathField {
                    pattern: self.template.clone(),
                    field: field.name.to_owned(),
                });
            }
        }

        let response_field = match &self.response {
            ResponseBody::Message => None,
            ResponseBody::Field { name, .. } => Some(*name),
        };

        Ok(CompiledRoute {
            descriptor: RouteDescriptor {
                method: self.method,
                pattern: self.template,
                rpc: M::PATH,
                source: self.source,
                response_field,
            },
            pattern,
            path_fields: self.path_fields,
            response: self.response,
        })
    }
}

fn is_supported(method: &Method) -> bool {
    [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ]
    .contains(method)
}

/// A validated route, shared by every request it serves.
pub(crate) struct CompiledRoute<M: UnaryMethod> {
    pub(crate) descriptor: RouteDescriptor,
    pub(crate) pattern: Pattern,
    pub(crate) path_fields: Vec<PathField<M::Request>>,
    pub(crate) response: ResponseBody<M::Response>,
}

/// Public description of a registered route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub method: Method,
    pub pattern: String,
    /// gRPC path of the invoked method, e.g. `/sso.Sso/AuditRead`.
    pub rpc: &'static str,
    pub source: RequestSource,
    /// Response field written as the body, or `None` for the whole message.
    pub response_field: Option<&'static str>,
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.pattern, self.rpc)
    }
}

/// Parse a path value into a request field type.
///
/// Conversion failures are reported the way the gateway reports every bad
/// path value: `type mismatch, parameter: <name>, error: <reason>`.
pub fn path_value<T>(name: &str, value: &str) -> Result<T, GatewayError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e| {
        GatewayError::invalid_argument(format!("type mismatch, parameter: {name}, error: {e}"))
    })
}
