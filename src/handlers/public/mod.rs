pub mod auth;
pub mod catalog;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::DatabaseManager;

/// GET / - Service name, version and route overview
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Storefront API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/auth/login/customer, /auth/login/employee, /auth/register (public)",
            "catalog": "/api/products[/:id], /api/categories[/:id] (public reads)",
            "customers": "/api/customers[/:id] (protected)",
            "employees": "/api/employees[/:id] (staff)",
            "orders": "/api/orders[/:id] (protected)",
            "whoami": "/api/auth/whoami (protected)"
        }
    }))
}

/// GET /health - Liveness plus a `SELECT 1` against the pool
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
