// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route prefix: none for `/` and `/health`, `/api/v1/submission/*` for respondents.
// Rate limited per client IP when enabled.

pub mod submission;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::database::DatabaseManager;
use crate::state::AppState;

pub async fn root() -> Json<serde_json::Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Form Builder API",
            "version": version,
            "description": "Multi-tenant form builder backend with versioned publishing",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "submission": "/api/v1/submission/:domain[/responses[/:id]|/uploads] (public)",
                "teams": "/api/v1/teams[/:team_id[/members|/projects]] (protected)",
                "projects": "/api/v1/projects/:project_id[/forms] (protected)",
                "forms": "/api/v1/forms/:form_id[/publish|/draft|/versions|/questions|/edges|/uploads|/dashboard|/responses] (protected)",
                "questions": "/api/v1/questions/:question_id (protected)",
                "edges": "/api/v1/edges/:edge_id (protected)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "code": "SERVICE_UNAVAILABLE",
                    "message": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
