//! Health check endpoints.
//!
//! `GET /health` answers as long as the process serves requests;
//! `GET /ready` also asks a [`ReadinessProbe`] (the database) and returns
//! 503 when it fails, so load balancers stop routing to the instance.

use async_trait::async_trait;
use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Dependency the service needs before it can take traffic.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Component name reported in the response
    fn component(&self) -> &'static str;

    /// Check the dependency.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the dependency is unusable.
    async fn check(&self) -> Result<(), String>;
}

/// Health response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `"ok"` or `"unavailable"`
    pub status: &'static str,
    /// Component that was checked, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<&'static str>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness: 200 while the process is up. Does not touch dependencies.
///
/// ```text
/// GET /health  →  {"status": "ok"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthReport>) {
    (
        StatusCode::OK,
        Json(HealthReport {
            status: "ok",
            component: None,
            message: None,
        }),
    )
}

/// Readiness: 200 when `probe` passes, 503 otherwise.
///
/// ```text
/// GET /ready  →  {"status": "ok", "component": "database"}
/// ```
pub async fn readiness<P>(probe: &P) -> (StatusCode, Json<HealthReport>)
where
    P: ReadinessProbe + ?Sized,
{
    let component = Some(probe.component());
    match probe.check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthReport {
                status: "ok",
                component,
                message: None,
            }),
        ),
        Err(reason) => {
            tracing::warn!(component = probe.component(), %reason, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport {
                    status: "unavailable",
                    component,
                    message: Some(reason),
                }),
            )
        }
    }
}
