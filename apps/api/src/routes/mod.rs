pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;
use crate::templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Template catalog (read-only reference data)
        .route("/api/v1/templates", get(templates::handle_list_templates))
        // Builder sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_discard_session),
        )
        .route(
            "/api/v1/sessions/:id/sections",
            put(handlers::handle_update_section),
        )
        .route(
            "/api/v1/sessions/:id/navigate",
            post(handlers::handle_navigate),
        )
        .route(
            "/api/v1/sessions/:id/completion",
            get(handlers::handle_completion),
        )
        .route("/api/v1/sessions/:id/save", post(handlers::handle_save))
        // Content assistant
        .route(
            "/api/v1/sessions/:id/assistant/generate",
            post(handlers::handle_assistant_generate),
        )
        .route(
            "/api/v1/sessions/:id/assistant/analyze",
            post(handlers::handle_assistant_analyze),
        )
        .route(
            "/api/v1/sessions/:id/assistant/optimize",
            post(handlers::handle_assistant_optimize),
        )
        .route(
            "/api/v1/sessions/:id/assistant/optimize/confirm",
            post(handlers::handle_optimize_confirm),
        )
        // Export
        .route("/api/v1/sessions/:id/export", post(handlers::handle_export))
        .with_state(state)
}
