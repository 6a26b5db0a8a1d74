//! `Grpc-Timeout` parsing and deadline computation.

use std::time::Duration;

use axum::http::HeaderMap;

use crate::error::GatewayError;

/// Request header carrying the client's deadline in gRPC timeout encoding.
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Parse a gRPC timeout value such as `250m` or `5S`.
///
/// The value is at most 8 ASCII digits followed by one unit:
/// `H` hours, `M` minutes, `S` seconds, `m` milliseconds, `u` microseconds,
/// `n` nanoseconds.
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || !value.is_ascii() {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    let duration = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

/// Read the client deadline from request headers.
///
/// A missing header means no client deadline; a malformed one is a client
/// error.
pub fn client_timeout(headers: &HeaderMap) -> Result<Option<Duration>, GatewayError> {
    let Some(value) = headers.get(GRPC_TIMEOUT_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(parse_grpc_timeout)
        .map(Some)
        .ok_or_else(|| {
            GatewayError::invalid_argument(format!("invalid grpc-timeout: {value:?}"))
        })
}

/// The effective timeout is the smaller of the server and client timeouts.
pub fn compute_effective_timeout(
    server_timeout: Option<Duration>,
    client_timeout: Option<Duration>,
) -> Option<Duration> {
    match (server_timeout, client_timeout) {
        (Some(server), Some(client)) => Some(server.min(client)),
        (server, None) => server,
        (None, client) => client,
    }
}
