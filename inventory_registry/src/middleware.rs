//! HTTP middleware for rate limiting, security headers, request ids and CORS handling.

use anyhow::{anyhow, Result};
use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::settings::SecurityConfig;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rate limiter type
pub type AppRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create rate limiter from configuration
pub fn create_rate_limiter(config: &SecurityConfig) -> Result<Arc<AppRateLimiter>> {
    let per_minute = NonZeroU32::new(config.rate_limit_per_minute)
        .ok_or_else(|| anyhow!("rate_limit_per_minute must be greater than 0"))?;
    Ok(Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(rate_limiter): State<Arc<AppRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match rate_limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            warn!("Rate limit exceeded for request to {}", request.uri().path());
            Err(StatusCode::TOO_MANY_REQUESTS)
        }
    }
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));

    response
}

/// Tags each request with a correlation id and logs its outcome
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let mut response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if status.is_server_error() {
        error!(%request_id, %method, %uri, %status, elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        warn!(%request_id, %method, %uri, %status, elapsed_ms, "Request rejected");
    } else {
        debug!(%request_id, %method, %uri, %status, elapsed_ms, "Request completed");
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Create CORS layer from security configuration
pub fn create_cors_layer(config: &SecurityConfig) -> CorsLayer {
    if !config.enable_cors {
        // No cross-origin access at all
        return CorsLayer::new();
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    if config.allowed_origins.iter().any(|origin| origin == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Create request body size limit layer
pub fn create_body_limit_layer(max_size_kb: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max_size_kb * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_rate_limiter() {
        let config = SecurityConfig {
            rate_limit_per_minute: 2,
            ..Default::default()
        };

        let rate_limiter = create_rate_limiter(&config).unwrap();

        // First two requests should succeed
        assert!(rate_limiter.check().is_ok());
        assert!(rate_limiter.check().is_ok());

        // Third request should be rate limited
        assert!(rate_limiter.check().is_err());
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let config = SecurityConfig {
            rate_limit_per_minute: 0,
            ..Default::default()
        };

        assert!(create_rate_limiter(&config).is_err());
    }

    #[tokio::test]
    async fn test_request_id_is_generated_or_echoed() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(request_logging_middleware))
            .layer(middleware::from_fn(security_headers_middleware));

        let response = app
            .clone()
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let generated = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(generated.to_str().unwrap()).is_ok());
        assert_eq!(response.headers().get("X-Content-Type-Options").unwrap(), "nosniff");

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, "caller-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "caller-supplied");
    }
}
