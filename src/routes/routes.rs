//! Defines routes for resource metadata operations.
//!
//! ## Structure
//! - **Health endpoints**
//!   - `GET    /healthz` — liveness
//!   - `GET    /readyz`  — readiness (SQLite ping)
//!
//! - **Resource endpoints** (bearer token required)
//!   - `GET    /api/v2/resources`      — list the caller's resources
//!   - `PATCH  /api/v2/resources/{id}` — masked partial update
//!   - `DELETE /api/v2/resources/{id}` — delete an owned resource

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        resource_handlers::{delete_resource, list_resources, update_resource},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, patch},
};

/// Build the router. State is attached by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/v2/resources", get(list_resources))
        .route(
            "/api/v2/resources/{id}",
            patch(update_resource).delete(delete_resource),
        )
}
