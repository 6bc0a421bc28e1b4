use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri, header},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    auth::{self, Session},
    config::Env,
    models::{
        BrowseItem, Course, Difficulty, LoginRequest, LoginResponse,
        MessageResponse, PageContext, Series, SeriesDetails, User,
    },
    navigation::NavigationMenu,
};

// --- Filter Structs ---

/// CourseFilter
///
/// Query parameters of GET /api/courses.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilter {
    /// Only courses of this difficulty level.
    pub difficulty: Option<Difficulty>,
    /// Case-insensitive match against title, description and tags.
    pub search: Option<String>,
}

// --- Catalog Handlers ---

/// list_users
///
/// [API] Every portal member from the user fixture.
#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.catalog.users().await)
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 404, description = "User not found", body = MessageResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, (StatusCode, Json<MessageResponse>)> {
    state.catalog.user(&id).await.map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("User not found")),
        )
    })
}

/// list_courses
///
/// [API] Courses, optionally narrowed by difficulty and a search term.
#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilter),
    responses((status = 200, description = "Filtered courses", body = [Course]))
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> Json<Vec<Course>> {
    Json(state.catalog.courses(filter.difficulty, filter.search).await)
}

/// get_course
///
/// [API] One course as stored in the fixture. Clients resolve the
/// instructor through GET /api/users/{id}.
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Found", body = Course),
        (status = 404, description = "Course not found", body = MessageResponse)
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, (StatusCode, Json<MessageResponse>)> {
    match state.catalog.course(&id).await {
        Some(course) => Ok(Json(course)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("Course not found")),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/series",
    responses((status = 200, description = "All series", body = [Series]))
)]
pub async fn list_series(State(state): State<AppState>) -> Json<Vec<Series>> {
    Json(state.catalog.series().await)
}

/// get_series
///
/// [API] One series with its episodes (by episode number) and creator.
#[utoipa::path(
    get,
    path = "/api/series/{id}",
    params(("id" = String, Path, description = "Series ID")),
    responses(
        (status = 200, description = "Found", body = SeriesDetails),
        (status = 404, description = "Series not found", body = MessageResponse)
    )
)]
pub async fn get_series(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SeriesDetails>, (StatusCode, Json<MessageResponse>)> {
    match state.catalog.series_details(&id).await {
        Some(details) => Ok(Json(details)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("Series not found")),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/browse",
    responses((status = 200, description = "Unified feed, newest first", body = [BrowseItem]))
)]
pub async fn browse(State(state): State<AppState>) -> Json<Vec<BrowseItem>> {
    Json(state.catalog.browse().await)
}

// --- Session Handlers ---

/// get_session
///
/// [API] The session resolved from the request's `auth_token` cookie.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current session", body = Session))
)]
pub async fn get_session(session: Session) -> Json<Session> {
    Json(session)
}

/// get_navigation
///
/// [API] The side navigation visible to the current session.
#[utoipa::path(
    get,
    path = "/api/navigation",
    responses((status = 200, description = "Visible navigation", body = NavigationMenu))
)]
pub async fn get_navigation(session: Session) -> Json<NavigationMenu> {
    Json(NavigationMenu::for_session(&session))
}

/// login
///
/// [API, Local only] Development sign-in: stores the demo token for the
/// requested role in the session cookie. Guests have no token and are
/// refused; production has no development login at all.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Role cannot sign in"),
        (status = 403, description = "Disabled in production")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if state.config.env != Env::Local {
        return Err(StatusCode::FORBIDDEN);
    }
    let token = auth::demo_token_for(payload.role).ok_or(StatusCode::BAD_REQUEST)?;

    tracing::info!(role = %payload.role, "development login");

    let body = LoginResponse {
        session: Session::authenticated(payload.role),
        redirect_to: post_login_target(payload.redirected_from.as_deref()),
    };
    Ok((
        [(header::SET_COOKIE, auth::session_cookie(token))],
        Json(body),
    ))
}

/// logout
///
/// [API] Clears the session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Signed out", body = Session))
)]
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        Json(Session::anonymous()),
    )
}

// Only same-site absolute paths are honoured as post-login targets. Browsers
// read `/\` as `//` and drop tabs and newlines, so those never pass.
fn post_login_target(redirected_from: Option<&str>) -> String {
    match redirected_from {
        Some(path) if is_same_site_path(path) => path.to_string(),
        _ => "/".to_string(),
    }
}

fn is_same_site_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(|c| c.is_ascii_control())
}

// --- Page Handlers ---

/// render_page
///
/// [Page] Reached only after the access guard allowed the request. Returns
/// what the renderer needs to draw the page for this visitor.
pub async fn render_page(session: Session, uri: Uri) -> Json<PageContext> {
    Json(page_context(session, &uri))
}

/// page_not_found
///
/// [Page] Fallback for paths no page is registered for.
pub async fn page_not_found(session: Session, uri: Uri) -> (StatusCode, Json<PageContext>) {
    (StatusCode::NOT_FOUND, Json(page_context(session, &uri)))
}

fn page_context(session: Session, uri: &Uri) -> PageContext {
    PageContext {
        path: uri.path().to_string(),
        session,
        navigation: NavigationMenu::for_session(&session),
    }
}

