//! Reservation endpoints.
//!
//! - POST /api/reservations - Book a stay (status `pending`)
//! - GET /api/reservations - The caller's reservations
//! - GET /api/reservations/:id - Details (guest, property owner or admin)
//! - PUT /api/reservations/:id - Change dates/guests of a pending reservation
//! - DELETE /api/reservations/:id - Soft-delete a pending reservation
//! - POST /api/reservations/:id/cancel - Cancel under the cancellation policy
//! - PATCH /api/reservations/:id/status - Move through the lifecycle
//! - GET /api/properties/:id/reservations - A property's bookings (owner or admin)
//!
//! # State Machine
//!
//! ```text
//! pending ──▶ confirmed ──▶ completed
//!    │            │
//!    └────────────┴──▶ cancelled
//! ```

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use estate_core::inputs::{ChangeStatusInput, CreateReservationInput, UpdateReservationInput};
use estate_core::types::{PropertyId, Reservation, ReservationId};
use estate_web::{AppError, CorrelationId, JsonBody};
use uuid::Uuid;

/// Book a stay.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/reservations \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "property_id": "550e8400-e29b-41d4-a716-446655440000",
///     "check_in_date": "2024-06-01",
///     "check_out_date": "2024-06-04",
///     "guests": 2
///   }'
/// ```
///
/// Responds 201 with the reservation (`"status": "pending"`,
/// `"total_price": "300.00"` at 100.00 per night), or 422 with code
/// `RESERVATION_CONFLICT` when the dates are taken.
pub async fn create_reservation(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    user: AuthUser,
    JsonBody(input): JsonBody<CreateReservationInput>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let reservation = state.reservations.create(&user.actor, input).await?;
    tracing::info!(
        correlation_id = %correlation_id.0,
        reservation_id = %reservation.id,
        total_price = %reservation.total_price,
        "Reservation created"
    );
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// The caller's reservations, newest first.
pub async fn list_my_reservations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Reservation>>, AppError> {
    Ok(Json(state.reservations.list_mine(&user.actor).await?))
}

/// Reservations of a property, by check-in date.
pub async fn list_property_reservations(
    State(state): State<AppState>,
    user: AuthUser,
    Path(property_id): Path<Uuid>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = state
        .reservations
        .list_for_property(&user.actor, PropertyId::from_uuid(property_id))
        .await?;
    Ok(Json(reservations))
}

/// Reservation details.
pub async fn get_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .get(&user.actor, ReservationId::from_uuid(id))
        .await?;
    Ok(Json(reservation))
}

/// Change dates, guests or requests of a pending reservation.
pub async fn update_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(input): JsonBody<UpdateReservationInput>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .update(&user.actor, ReservationId::from_uuid(id), input)
        .await?;
    Ok(Json(reservation))
}

/// Soft-delete a pending reservation.
pub async fn delete_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .reservations
        .delete(&user.actor, ReservationId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel a reservation.
///
/// Pending reservations always cancel; confirmed ones only before the
/// lead time (422 `CANCELLATION_WINDOW_CLOSED` after it).
pub async fn cancel_reservation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .cancel(&user.actor, ReservationId::from_uuid(id))
        .await?;
    Ok(Json(reservation))
}

/// Move a reservation to `{"status": "confirmed" | "completed" | "cancelled"}`.
pub async fn change_reservation_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    JsonBody(input): JsonBody<ChangeStatusInput>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .change_status(&user.actor, ReservationId::from_uuid(id), input)
        .await?;
    Ok(Json(reservation))
}
