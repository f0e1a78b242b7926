use axum::body::Body;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use routecodex_common::{ErrorEnvelope, GatewayError};

/// Maps an error category to an HTTP status and formats the error
/// envelope. A plain function rather than an `IntoResponse` impl:
/// `GatewayError` lives in `routecodex-common`, not here, so a trait impl
/// would hit the orphan rule.
pub fn error_response(err: &GatewayError) -> Response {
    let status = StatusCode::from_u16(err.category.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = ErrorEnvelope::from(err);
    let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| b"{}".to_vec());

    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_category_to_http_status() {
        let resp = error_response(&GatewayError::rate_limit("slow down"));
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            resp.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn admission_maps_to_503() {
        let resp = error_response(&GatewayError::admission("no pipeline"));
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
