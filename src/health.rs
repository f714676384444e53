//! Liveness endpoint

/// Body of the liveness response
pub const HEALTH_BODY: &str = "Chat server is up and running";

/// `GET /` handler
pub async fn health_check() -> &'static str {
    HEALTH_BODY
}
