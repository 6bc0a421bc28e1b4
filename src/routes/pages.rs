use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Page paths served by the portal. Order does not matter here; access is
/// decided by the guard's rule list, not by this table.
const PAGES: [&str; 20] = [
    "/",
    "/browse",
    "/courses",
    "/courses/create",
    "/courses/{id}",
    "/series",
    "/series/{id}",
    "/login",
    "/signup",
    "/forgot-password",
    "/reset-password/{token}",
    "/profile",
    "/profile/settings",
    "/settings",
    "/admin",
    "/unauthorized",
    "/contact",
    "/maintenance",
    "/privacy-policy",
    "/terms-of-service",
];

/// Pages Router Module
///
/// Every page renders the same way: the page context for the visitor. Unknown
/// paths fall through to the not-found page.
pub fn page_routes() -> Router<AppState> {
    PAGES
        .iter()
        .fold(Router::new(), |router, path| {
            router.route(path, get(handlers::render_page))
        })
        .fallback(handlers::page_not_found)
}
