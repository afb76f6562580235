//! Anti-forgery token for the play endpoint

use axum::http::HeaderMap;
use rand::Rng;

use crate::session::SessionContext;

/// Header the browser echoes the token back in
pub const CSRF_HEADER: &str = "x-csrftoken";

const TOKEN_BYTES: usize = 32;

/// Generate a random hex-encoded token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Token bound to the session, creating one if the session has none yet
pub fn ensure_token(ctx: &mut SessionContext) -> String {
    ctx.csrf_token.get_or_insert_with(generate_token).clone()
}

/// Whether the request carries the session's token
pub fn verify(ctx: &SessionContext, headers: &HeaderMap) -> bool {
    let Some(expected) = ctx.csrf_token.as_deref() else {
        return false;
    };
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|given| constant_time_eq(expected.as_bytes(), given.trim().as_bytes()))
        .unwrap_or(false)
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
