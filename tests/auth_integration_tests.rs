use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, header, request::Parts},
};
use course_portal::{
    AppConfig, AppState, JsonCatalog, Session,
    access::AccessPolicy,
    auth::{self, Claims},
    config::Env,
    models::Role,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::Duration};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn config(env: Env) -> AppConfig {
    AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn create_app_state(env: Env) -> AppState {
    AppState {
        catalog: Arc::new(JsonCatalog::default()),
        policy: Arc::new(AccessPolicy::standard().unwrap()),
        config: config(env),
    }
}

fn get_request_parts(cookie: Option<&str>) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

// --- resolve_session ---

#[test]
fn test_missing_or_empty_token_is_anonymous() {
    let config = config(Env::Local);
    assert_eq!(auth::resolve_session(None, &config), Session::anonymous());
    assert_eq!(auth::resolve_session(Some(""), &config), Session::anonymous());
}

#[test]
fn test_demo_tokens_resolve_in_local() {
    let config = config(Env::Local);
    let cases = [
        ("valid-admin-token", Role::Admin),
        ("valid-instructor-token", Role::Instructor),
        ("valid-student-token", Role::Student),
    ];
    for (token, role) in cases {
        assert_eq!(
            auth::resolve_session(Some(token), &config),
            Session::authenticated(role)
        );
    }
}

#[test]
fn test_demo_tokens_are_ignored_in_production() {
    let config = config(Env::Production);
    assert_eq!(
        auth::resolve_session(Some("valid-admin-token"), &config),
        Session::anonymous()
    );
}

#[test]
fn test_signed_token_resolves_role_in_production() {
    let token = auth::issue_token(
        TEST_JWT_SECRET,
        "user_42",
        Role::Instructor,
        Duration::from_secs(3600),
    )
    .unwrap();

    let session = auth::resolve_session(Some(&token), &config(Env::Production));
    assert_eq!(session, Session::authenticated(Role::Instructor));
}

#[test]
fn test_token_signed_with_another_secret_is_rejected() {
    let token = auth::issue_token("other-secret", "user_42", Role::Admin, Duration::from_secs(3600))
        .unwrap();
    assert_eq!(
        auth::resolve_session(Some(&token), &config(Env::Production)),
        Session::anonymous()
    );
}

#[test]
fn test_expired_token_is_rejected() {
    // Well past the default validation leeway.
    let claims = Claims {
        sub: "user_42".to_string(),
        role: Role::Admin,
        iat: 1_000,
        exp: 2_000,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(
        auth::resolve_session(Some(&token), &config(Env::Production)),
        Session::anonymous()
    );
}

#[test]
fn test_garbage_token_is_anonymous() {
    assert_eq!(
        auth::resolve_session(Some("not.a.jwt"), &config(Env::Local)),
        Session::anonymous()
    );
}

// --- Cookie handling ---

#[test]
fn test_session_token_is_found_among_other_cookies() {
    let mut headers = axum::http::HeaderMap::new();
    headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
    headers.append(
        header::COOKIE,
        HeaderValue::from_static("lang=en; auth_token=valid-student-token; tz=UTC"),
    );
    assert_eq!(auth::session_token(&headers), Some("valid-student-token"));
}

#[test]
fn test_session_cookie_values() {
    assert_eq!(
        auth::session_cookie("abc"),
        "auth_token=abc; Path=/; HttpOnly; SameSite=Lax"
    );
    assert!(auth::clear_session_cookie().contains("Max-Age=0"));
}

#[test]
fn test_demo_token_lookup() {
    assert_eq!(auth::demo_token_for(Role::Admin), Some("valid-admin-token"));
    assert_eq!(auth::demo_token_for(Role::Guest), None);
}

// --- Session extractor ---

#[tokio::test]
async fn test_extractor_resolves_cookie_session() {
    let app_state = create_app_state(Env::Local);
    let mut parts = get_request_parts(Some("auth_token=valid-admin-token"));

    let session = Session::from_request_parts(&mut parts, &app_state).await.unwrap();

    assert_eq!(session, Session::authenticated(Role::Admin));
}

#[tokio::test]
async fn test_extractor_without_cookie_is_anonymous() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(None);

    let session = Session::from_request_parts(&mut parts, &app_state).await.unwrap();

    assert!(!session.is_authenticated);
    assert_eq!(session.role, Role::Guest);
}
