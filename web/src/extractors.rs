//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation ID
//! - `BearerToken`: the raw token from `Authorization: Bearer <token>`
//! - `JsonBody` / `QueryParams`: `Json` and `Query` whose rejections use the
//!   [`AppError`] body shape
//!
//! # Examples
//!
//! ```ignore
//! use estate_web::extractors::{BearerToken, CorrelationId, JsonBody};
//!
//! async fn handler(
//!     correlation_id: CorrelationId,
//!     token: BearerToken,
//!     JsonBody(input): JsonBody<CreateReviewInput>,
//! ) -> Result<Json<Review>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, "Processing request");
//!     ...
//! }
//! ```

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Uses the ID stored by the correlation middleware, then the
/// `X-Correlation-ID` header, and generates a UUID v4 if neither is present.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| {
                parts
                    .headers
                    .get(crate::CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer token from the `Authorization` header.
///
/// Rejects with 401 when the header is missing, is not `Bearer`, or the
/// token is empty. Resolving the token to a user is the application's job.
#[derive(Clone)]
pub struct BearerToken(pub String);

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .map(|token| Self(token.to_string()))
            .ok_or_else(|| AppError::unauthorized("Missing or malformed bearer token"))
    }
}

/// Token part of `Authorization: Bearer <token>`; the scheme is
/// case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// `Json<T>` with [`AppError`] rejections.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `Query<T>` with [`AppError`] rejections.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde::Deserialize;

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Correlation-ID", uuid.to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_middleware_value() {
        let stored = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Correlation-ID", Uuid::new_v4().to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        parts.extensions.insert(stored);
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, stored);
    }

    #[tokio::test]
    async fn test_bearer_token_extracted() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "bearer  secret-token ")
            .body(())
            .expect("Valid request");

        let (mut parts, _) = req.into_parts();
        let token = BearerToken::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(token.0, "secret-token");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
    }

    #[tokio::test]
    async fn test_missing_or_wrong_scheme_is_unauthorized() {
        for value in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer "), Some("Bearer")] {
            let mut builder = Request::builder();
            if let Some(value) = value {
                builder = builder.header(header::AUTHORIZATION, value);
            }
            let (mut parts, _) = builder.body(()).expect("Valid request").into_parts();

            let err = BearerToken::from_request_parts(&mut parts, &())
                .await
                .expect_err("Should reject");
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[derive(Debug, Deserialize)]
    struct Guests {
        guests: u32,
    }

    #[tokio::test]
    async fn test_json_body_rejections_use_app_error() {
        let wrong_shape = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"guests": "many"}"#))
            .unwrap();
        let err = JsonBody::<Guests>::from_request(wrong_shape, &())
            .await
            .expect_err("Should reject");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let malformed = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{"))
            .unwrap();
        let err = JsonBody::<Guests>::from_request(malformed, &())
            .await
            .expect_err("Should reject");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let ok = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"guests": 3}"#))
            .unwrap();
        let JsonBody(body) = JsonBody::<Guests>::from_request(ok, &()).await.unwrap();
        assert_eq!(body.guests, 3);
    }
}
