use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::error_response;
use crate::state::GatewayState;
use routecodex_common::GatewayError;

/// If `httpServer.apiKey` is set, every non-health endpoint requires
/// `x-api-key` or `Authorization: Bearer <key>` matching it; otherwise
/// 401. `x-api-key` takes precedence over the bearer form.
pub async fn require_api_key(
    State(state): State<Arc<GatewayState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(req).await;
    };

    match extract_api_key(req.headers()) {
        Some(key) if key == expected => next.run(req).await,
        Some(_) => error_response(&GatewayError::auth("invalid api key")),
        None => error_response(&GatewayError::auth("missing api key")),
    }
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = header_value(headers, "x-api-key") {
        return Some(value);
    }
    let auth = header_value(headers, "authorization")?;
    let auth = auth.trim();
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn x_api_key_header_wins_over_bearer() {
        let mut headers = headers_with("x-api-key", "from-header");
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-bearer"),
        );
        assert_eq!(extract_api_key(&headers), Some("from-header".to_string()));
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        let headers = headers_with("authorization", "Bearer secret-token");
        assert_eq!(extract_api_key(&headers), Some("secret-token".to_string()));
    }

    #[test]
    fn lowercase_bearer_prefix_is_accepted() {
        let headers = headers_with("authorization", "bearer secret-token");
        assert_eq!(extract_api_key(&headers), Some("secret-token".to_string()));
    }

    #[test]
    fn missing_headers_yield_none() {
        assert_eq!(extract_api_key(&HeaderMap::new()), None);
    }

    #[test]
    fn authorization_without_bearer_prefix_yields_none() {
        let headers = headers_with("authorization", "Basic dXNlcjpwYXNz");
        assert_eq!(extract_api_key(&headers), None);
    }
}
