use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod access;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod handlers;
pub mod models;
pub mod navigation;

// Routing split by how the access guard treats each group.
pub mod routes;
use routes::{api, pages, public};

// --- Public Re-exports ---

pub use access::{AccessPolicy, Decision, PolicyState};
pub use auth::Session;
pub use catalog::{CatalogState, JsonCatalog};
pub use config::AppConfig;

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_users, handlers::get_user, handlers::list_courses, handlers::get_course,
        handlers::list_series, handlers::get_series, handlers::browse,
        handlers::get_session, handlers::get_navigation, handlers::login, handlers::logout
    ),
    components(
        schemas(
            models::Role, models::User, models::Course, models::CourseModule, models::Series,
            models::Episode, models::VideoContent, models::SeriesDetails,
            models::BrowseItem, models::MessageResponse, models::PageContext,
            models::LoginRequest, models::LoginResponse, auth::Session,
            navigation::NavItem, navigation::NavigationMenu,
        )
    ),
    tags(
        (name = "course-portal", description = "Course portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything handlers and the access guard share. Cloned per request; all
/// members are cheap handles to immutable data.
#[derive(Clone)]
pub struct AppState {
    /// Fixture-backed content.
    pub catalog: CatalogState,
    /// Route rules and public prefixes, built once at startup.
    pub policy: PolicyState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for CatalogState {
    fn from_ref(app_state: &AppState) -> CatalogState {
        app_state.catalog.clone()
    }
}

impl FromRef<AppState> for PolicyState {
    fn from_ref(app_state: &AppState) -> PolicyState {
        app_state.policy.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// access_guard
///
/// Middleware in front of every page. Resolves the visitor's session, asks
/// the policy for a decision and either passes the request through or answers
/// with a 307 redirect. Paths outside the guard's scope (API, assets) pass
/// untouched.
async fn access_guard(
    State(policy): State<PolicyState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !access::is_guarded_path(&path) {
        return next.run(request).await;
    }

    match policy.decide(&path, &session) {
        Decision::Allow => {
            tracing::debug!(%path, role = %session.role, "access allowed");
            next.run(request).await
        }
        Decision::RedirectTo(redirect) => {
            let location = redirect.location_with_query(request.uri().query());
            tracing::info!(
                %path,
                role = %session.role,
                authenticated = session.is_authenticated,
                %location,
                "access redirected"
            );
            axum::response::Redirect::temporary(&location).into_response()
        }
    }
}

/// create_router
///
/// Assembles the routing structure (Swagger UI, health, the JSON API and the
/// guarded pages), applies the access guard to the pages only, registers the
/// application state and wraps everything in the observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header used to correlate every log line of one request.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Health probe, never guarded.
        .merge(public::public_routes())
        // JSON API: the guard's scope excludes `/api`, so no layer here.
        .nest("/api", api::api_routes())
        // Pages, including the not-found fallback, sit behind the access guard.
        // A redirect answered here never reaches the page handler.
        .merge(
            pages::page_routes()
                .layer(middleware::from_fn_with_state(state.clone(), access_guard)),
        )
        // Apply the shared state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                // 3b. Request Tracing: one span per request, tagged with the
                // request ID by `trace_span_logger`.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with the `x-request-id` set above so
/// every log line of the request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
