//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Every error body
//! has the same shape:
//!
//! ```json
//! {
//!   "code": "VALIDATION_ERROR",
//!   "message": "The given data was invalid",
//!   "errors": { "check_out_date": ["The check out date must be after the check in date"] }
//! }
//! ```
//!
//! `errors` is present only for field-level validation failures.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use estate_core::error::DomainError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use validator::ValidationErrors;

/// Field name to messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error type for web handlers.
///
/// Implements Axum's `IntoResponse`, so handlers return
/// `Result<_, AppError>` and use `?` on service calls.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, AppError> {
///     let me = state.users.me(&user.actor).await?;
///     Ok(Json(me))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Field-level validation messages
    errors: Option<FieldErrors>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            errors: None,
            source: None,
        }
    }

    fn unprocessable(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message.into(), code.to_string())
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach field-level validation messages.
    #[must_use]
    pub(crate) fn with_field_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 422 validation error without field details.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::unprocessable("VALIDATION_ERROR", message)
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

/// Flatten `validator` errors into `field -> [messages]`.
///
/// Errors without a custom message fall back to their code.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, list)| {
            let messages = list
                .iter()
                .map(|error| {
                    error.message.as_ref().map_or_else(
                        || format!("The {field} field is invalid ({})", error.code),
                        ToString::to_string,
                    )
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
    /// Field-level messages, validation failures only.
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            metrics::counter!("http.server_errors", "code" => self.code.clone()).increment(1);
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            errors: self.errors,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map domain failures to HTTP.
///
/// Business-rule rejections are all 422 with a dedicated code; storage
/// failures are 500 with a generic message and the detail kept for logs.
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::Validation(errors) => {
                Self::validation("The given data was invalid").with_field_errors(field_errors(&errors))
            }
            DomainError::Unavailable => Self::unprocessable("RESERVATION_CONFLICT", message),
            DomainError::PropertyNotBookable => Self::unprocessable("PROPERTY_NOT_BOOKABLE", message),
            DomainError::InvalidTransition { .. } => {
                Self::unprocessable("INVALID_STATUS_TRANSITION", message)
            }
            DomainError::NotEditable { .. } => Self::unprocessable("RESERVATION_NOT_EDITABLE", message),
            DomainError::CancellationWindowClosed { .. } => {
                Self::unprocessable("CANCELLATION_WINDOW_CLOSED", message)
            }
            DomainError::EditWindowClosed { .. } => Self::unprocessable("EDIT_WINDOW_CLOSED", message),
            DomainError::DuplicateReview => Self::unprocessable("DUPLICATE_REVIEW", message),
            DomainError::PriceOverflow => Self::unprocessable("PRICE_OUT_OF_RANGE", message),
            DomainError::Forbidden(reason) => Self::forbidden(reason),
            DomainError::NotFound { resource, id } => Self::not_found(resource, id),
            DomainError::Storage(detail) => {
                Self::internal("An internal error occurred").with_source(anyhow::anyhow!(detail))
            }
        }
    }
}

/// Malformed JSON is a 400; well-formed JSON of the wrong shape is a 422.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => Self::validation(err.body_text()),
            other => Self::new(other.status(), other.body_text(), "BAD_REQUEST".to_string()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_core::types::ReservationStatus;
    use validator::ValidationError;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::from(DomainError::not_found("Reservation", "123"));
        assert_eq!(err.to_string(), "[NOT_FOUND] Reservation with id 123 not found");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_overlap_is_a_reservation_conflict() {
        let err = AppError::from(DomainError::Unavailable);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, "RESERVATION_CONFLICT");
        assert_eq!(err.message, "Property is not available for the selected dates");
    }

    #[test]
    fn test_business_rules_get_dedicated_codes() {
        let cases = [
            (
                DomainError::InvalidTransition {
                    from: ReservationStatus::Completed,
                    to: ReservationStatus::Confirmed,
                },
                "INVALID_STATUS_TRANSITION",
            ),
            (
                DomainError::NotEditable { status: ReservationStatus::Confirmed },
                "RESERVATION_NOT_EDITABLE",
            ),
            (
                DomainError::CancellationWindowClosed { lead_time_hours: 24 },
                "CANCELLATION_WINDOW_CLOSED",
            ),
            (DomainError::DuplicateReview, "DUPLICATE_REVIEW"),
        ];
        for (domain, code) in cases {
            let err = AppError::from(domain);
            assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(err.code, code);
        }
    }

    #[test]
    fn test_validation_carries_field_errors() {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("after_check_in");
        error.message = Some("The check out date must be after the check in date".into());
        errors.add("check_out_date", error);
        errors.add("guests", ValidationError::new("range"));

        let err = AppError::from(DomainError::Validation(errors));
        assert_eq!(err.code, "VALIDATION_ERROR");

        let fields = err.errors.unwrap_or_default();
        assert_eq!(
            fields["check_out_date"],
            vec!["The check out date must be after the check in date".to_string()]
        );
        assert_eq!(fields["guests"], vec!["The guests field is invalid (range)".to_string()]);
    }

    #[test]
    fn test_storage_errors_hide_details() {
        let err = AppError::from(DomainError::Storage("connection refused".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "An internal error occurred");
        assert!(err.source.is_some());
    }

    #[test]
    fn test_forbidden() {
        let err = AppError::from(DomainError::forbidden("Only the guest can edit"));
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Only the guest can edit");
    }
}
