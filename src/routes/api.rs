use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// Read-only catalog endpoints plus the session helpers. Mounted under
/// `/api`, which the page guard skips.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // --- Catalog ---
        .route("/users", get(handlers::list_users))
        .route("/users/{id}", get(handlers::get_user))
        // GET /courses?difficulty=...&search=...
        .route("/courses", get(handlers::list_courses))
        .route("/courses/{id}", get(handlers::get_course))
        .route("/series", get(handlers::list_series))
        .route("/series/{id}", get(handlers::get_series))
        // Courses, series and videos merged, newest first.
        .route("/browse", get(handlers::browse))
        // --- Session ---
        .route("/session", get(handlers::get_session))
        .route("/navigation", get(handlers::get_navigation))
        // Development login; refused outside Env::Local.
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
}
