//! Core types for the sso gateway.
//!
//! This crate provides the pieces shared by the HTTP gateway (`sso-gateway`)
//! and anything that talks to the `sso.Sso` service over gRPC.
//!
//! ## Modules
//!
//! - [`error`]: Status codes and their HTTP mapping
//! - [`pb`]: `sso` message types
//! - [`method`]: Unary method descriptors
//! - [`service`]: The [`Sso`] service trait
//! - [`client`]: gRPC client stub
//! - [`server`]: gRPC server adapter

pub mod client;
pub mod error;
pub mod method;
pub mod pb;
pub mod server;
pub mod service;

pub use client::SsoClient;
pub use error::*;
pub use method::*;
pub use server::SsoServer;
pub use service::Sso;

/// Fully-qualified gRPC service name.
pub const SERVICE_NAME: &str = "sso.Sso";
