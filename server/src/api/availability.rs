//! Availability and price quotes.
//!
//! - GET /api/properties/:id/availability?check_in_date=&check_out_date=

use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::NaiveDate;
use estate_core::services::AvailabilityQuote;
use estate_core::types::PropertyId;
use estate_web::{AppError, QueryParams};
use serde::Deserialize;
use uuid::Uuid;

/// Dates to quote.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// First night
    pub check_in_date: NaiveDate,
    /// Departure day (exclusive)
    pub check_out_date: NaiveDate,
}

/// Whether the dates are free, and what the stay would cost.
///
/// Public endpoint.
///
/// # Example
///
/// ```bash
/// curl 'http://localhost:8080/api/properties/550e8400-e29b-41d4-a716-446655440000/availability?check_in_date=2024-06-01&check_out_date=2024-06-04'
/// ```
///
/// Response:
/// ```json
/// { "available": true, "nights": 3, "total_price": "300.00" }
/// ```
pub async fn get_availability(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
    QueryParams(query): QueryParams<AvailabilityQuery>,
) -> Result<Json<AvailabilityQuote>, AppError> {
    let quote = state
        .reservations
        .quote(
            PropertyId::from_uuid(property_id),
            query.check_in_date,
            query.check_out_date,
        )
        .await?;
    Ok(Json(quote))
}
