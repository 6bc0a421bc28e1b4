use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use course_portal::{
    AccessPolicy, AppConfig, AppState, JsonCatalog, create_router,
    models::{Course, PageContext, Role},
};
use reqwest::redirect::Policy;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

// --- Test Harness ---

fn test_state() -> AppState {
    let course = Course {
        id: "course_ts101".to_string(),
        title: "TypeScript Basics".to_string(),
        ..Course::default()
    };
    AppState {
        catalog: Arc::new(JsonCatalog::new(vec![], vec![course], vec![], vec![], vec![])),
        policy: Arc::new(AccessPolicy::standard().unwrap()),
        config: AppConfig::default(),
    }
}

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

async fn spawn_app() -> TestApp {
    let router = create_router(test_state());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Redirects are what we assert on, so never follow them.
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestApp { address, client }
}

fn with_token(path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(Body::empty())
        .unwrap()
}

// --- Server Tests ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_anonymous_profile_visit_redirects_to_login() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(format!("{}/profile", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?redirectedFrom=%2Fprofile"
    );
}

#[tokio::test]
async fn test_login_cookie_unlocks_profile() {
    let app = spawn_app().await;

    let login = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "role": "student", "redirectedFrom": "/profile" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = login.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let profile = app
        .client
        .get(format!("{}/profile", app.address))
        .header(header::COOKIE, cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(profile.status(), StatusCode::OK);
    let page: PageContext = profile.json().await.unwrap();
    assert_eq!(page.session.role, Role::Student);
}

#[tokio::test]
async fn test_course_api_round_trip() {
    let app = spawn_app().await;

    let found = app
        .client
        .get(format!("{}/api/courses/course_ts101", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let course: Course = found.json().await.unwrap();
    assert_eq!(course.title, "TypeScript Basics");

    let missing = app
        .client
        .get(format!("{}/api/courses/nope", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert_eq!(body["message"], "Course not found");
}

// --- Router Tests (no socket) ---

#[tokio::test]
async fn test_student_is_sent_to_unauthorized_from_admin() {
    let router = create_router(test_state());

    let response = router
        .oneshot(with_token("/admin", "valid-student-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/unauthorized");
}

#[tokio::test]
async fn test_admin_reaches_admin_page() {
    let router = create_router(test_state());

    let response = router
        .oneshot(with_token("/admin", "valid-admin-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signed_in_visitor_is_bounced_off_login_page() {
    let router = create_router(test_state());

    let response = router
        .oneshot(with_token("/login", "valid-instructor-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_anonymous_admin_subpath_is_guarded_before_not_found() {
    let router = create_router(test_state());

    let response = router
        .oneshot(Request::builder().uri("/admin/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?redirectedFrom=%2Fadmin%2Fusers"
    );
}

#[tokio::test]
async fn test_redirects_keep_the_request_query() {
    let router = create_router(test_state());

    let anonymous = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/profile?tab=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        anonymous.headers()[header::LOCATION],
        "/login?tab=2&redirectedFrom=%2Fprofile"
    );

    let student = router
        .oneshot(with_token("/admin?tab=2", "valid-student-token"))
        .await
        .unwrap();
    assert_eq!(student.headers()[header::LOCATION], "/unauthorized?tab=2");
}

#[tokio::test]
async fn test_user_lookup_endpoint() {
    let router = create_router(test_state());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/users/user_missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_public_page_is_not_found() {
    let router = create_router(test_state());

    let response = router
        .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_is_outside_the_guard() {
    // No public prefixes at all: every unmatched page needs a session.
    let state = AppState {
        policy: Arc::new(AccessPolicy::new(vec![], vec![])),
        ..test_state()
    };

    let page = create_router(state.clone())
        .oneshot(Request::builder().uri("/contact").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::TEMPORARY_REDIRECT);

    let api = create_router(state)
        .oneshot(Request::builder().uri("/api/session").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::OK);
}
