//! Router configuration for the Estate API.

use crate::api::{availability, favorites, properties, reservations, reviews, users};
use crate::state::AppState;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post, put},
    Json,
};
use estate_web::correlation_id_layer;
use estate_web::handlers::{HealthReport, health_check, readiness};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// `GET /ready`: pings the configured dependency.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    readiness(state.readiness.as_ref()).await
}

/// Build the complete Axum router.
///
/// - `/health`, `/ready`: probes, no authentication
/// - `/api/...`: the JSON API; catalogue reads are public, everything else
///   needs a bearer token
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Properties
        .route(
            "/properties",
            get(properties::list_properties).post(properties::create_property),
        )
        .route(
            "/properties/:id",
            get(properties::get_property)
                .put(properties::update_property)
                .delete(properties::delete_property),
        )
        .route(
            "/properties/:id/availability",
            get(availability::get_availability),
        )
        .route(
            "/properties/:id/reservations",
            get(reservations::list_property_reservations),
        )
        .route(
            "/properties/:id/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        // Reservations
        .route(
            "/reservations",
            get(reservations::list_my_reservations).post(reservations::create_reservation),
        )
        .route(
            "/reservations/:id",
            get(reservations::get_reservation)
                .put(reservations::update_reservation)
                .delete(reservations::delete_reservation),
        )
        .route(
            "/reservations/:id/cancel",
            post(reservations::cancel_reservation),
        )
        .route(
            "/reservations/:id/status",
            patch(reservations::change_reservation_status),
        )
        // Reviews
        .route(
            "/reviews/:id",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        // Favorites
        .route("/favorites", get(favorites::list_favorites))
        .route(
            "/favorites/:property_id",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        // Users
        .route("/users/me", get(users::me).put(users::update_me));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
