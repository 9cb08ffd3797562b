pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::form::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        // Form editing
        .route(
            "/api/v1/sessions/:id/profiles/:mode/fields/:field",
            put(handlers::handle_set_field),
        )
        .route("/api/v1/sessions/:id/mode", post(handlers::handle_switch_mode))
        .route(
            "/api/v1/sessions/:id/profiles/:mode/reset",
            post(handlers::handle_reset),
        )
        // Documents
        .route(
            "/api/v1/sessions/:id/upload",
            post(handlers::handle_upload).delete(handlers::handle_remove_file),
        )
        // Analysis
        .route("/api/v1/sessions/:id/analyze", post(handlers::handle_analyze))
        .route("/api/v1/sessions/:id/result", get(handlers::handle_get_result))
        .route(
            "/api/v1/sessions/:id/result/text",
            get(handlers::handle_get_result_text),
        )
        .layer(upload_limit)
        .with_state(state)
}
