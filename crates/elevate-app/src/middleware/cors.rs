use salvo::cors::{AllowOrigin, Cors, CorsHandler};
use salvo::http::{HeaderValue, Method};

use elevate_core::config::ServerConfig;
use elevate_core::constants::{ORGANIZATION_HEADER, USER_TOKEN_HEADER};

/// Request headers the browser client may send.
pub const ALLOWED_HEADERS: [&str; 6] = [
    "authorization",
    "content-type",
    "apikey",
    "x-client-info",
    USER_TOKEN_HEADER,
    ORGANIZATION_HEADER,
];

/// ## Summary
/// Builds the CORS handler that answers pre-flight requests for every route.
/// An empty `allowed_origins` list allows any origin.
#[must_use]
pub fn cors_handler(server: &ServerConfig) -> CorsHandler {
    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    Cors::new()
        .allow_origin(allow_origin)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(ALLOWED_HEADERS.to_vec())
        .into_handler()
}
