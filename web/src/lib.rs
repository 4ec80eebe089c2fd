//! Axum integration for Estate.
//!
//! The HTTP shell around the domain services: handlers parse requests into
//! typed inputs, call a service with the authenticated `Actor`, and map the
//! outcome to a response.
//!
//! ```text
//! request ─▶ correlation id ─▶ extractors ─▶ service(actor, input) ─▶ AppError / JSON
//! ```
//!
//! This crate holds the pieces every handler shares:
//!
//! - [`AppError`]: domain errors to status codes and JSON bodies
//! - [`extractors`]: bearer tokens, correlation ids, JSON and query bodies
//!   whose rejections use the same error shape
//! - [`middleware`]: correlation id propagation and request spans
//! - [`handlers::health`]: liveness and readiness probes
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::post, extract::State};
//! use estate_web::{AppError, JsonBody};
//!
//! async fn create(
//!     State(state): State<AppState>,
//!     user: AuthUser,
//!     JsonBody(input): JsonBody<CreateReservationInput>,
//! ) -> Result<(StatusCode, Json<Reservation>), AppError> {
//!     let reservation = state.reservations.create(&user.actor, input).await?;
//!     Ok((StatusCode::CREATED, Json(reservation)))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId, JsonBody, QueryParams};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
