use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Identity provider events
        .route("/webhooks/identity", post(handlers::identity_webhook))
        // Account
        .route("/me", get(handlers::get_me).delete(handlers::delete_me))
        .route("/me/name", put(handlers::update_name))
        .route("/me/email", put(handlers::update_email))
        .route(
            "/me/notifications",
            get(handlers::get_notifications).put(handlers::update_notifications),
        )
        // Template catalogue
        .route("/templates", get(handlers::list_templates))
        .route("/templates/popular", get(handlers::popular_templates))
        .route("/templates/recommended", get(handlers::recommended_templates))
        .route("/templates/facets", get(handlers::template_facets))
        .route("/templates/:id", get(handlers::get_template))
        // Practice sessions
        .route("/practice/:template_id/start", post(handlers::start_practice))
        .route("/sessions", get(handlers::recent_sessions))
        .route("/sessions/:id/call/start", post(handlers::start_call))
        .route("/sessions/:id/call/stop", post(handlers::stop_call))
        .route("/sessions/:id/call/status", get(handlers::call_status))
        .route(
            "/sessions/:id/feedback",
            get(handlers::get_feedback).post(handlers::generate_feedback),
        )
        .route("/sessions/:id/complete", post(handlers::complete_session))
        // Admin console
        .route(
            "/admin/templates",
            get(handlers::list_all_templates).post(handlers::create_template),
        )
        .route(
            "/admin/templates/:id",
            put(handlers::update_template).delete(handlers::delete_template),
        )
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/users/:id/role", put(handlers::set_role))
        .route("/admin/stats", get(handlers::stats))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
