use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    config::{AppConfig, Env},
    models::Role,
};

/// Name of the cookie holding the session credential.
pub const SESSION_COOKIE: &str = "auth_token";

/// Development tokens accepted in `Env::Local`, one per signed-in role.
const DEMO_TOKENS: [(&str, Role); 3] = [
    ("valid-admin-token", Role::Admin),
    ("valid-instructor-token", Role::Instructor),
    ("valid-student-token", Role::Student),
];

/// Session
///
/// The resolved authentication state of one request. Passed explicitly to
/// every decision instead of living in ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Session {
    pub is_authenticated: bool,
    pub role: Role,
}

impl Session {
    /// An anonymous visitor. Always carries the `Guest` role.
    pub const fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            role: Role::Guest,
        }
    }

    pub const fn authenticated(role: Role) -> Self {
        Self {
            is_authenticated: true,
            role,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Claims
///
/// Payload of a signed session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id the token was issued for.
    pub sub: String,
    pub role: Role,
    /// Expiration time (seconds since epoch).
    pub exp: usize,
    /// Issued at (seconds since epoch).
    pub iat: usize,
}

/// The development token that signs a visitor in as `role`, if one exists.
pub fn demo_token_for(role: Role) -> Option<&'static str> {
    DEMO_TOKENS
        .iter()
        .find(|(_, demo_role)| *demo_role == role)
        .map(|(token, _)| *token)
}

/// issue_token
///
/// Mints an HS256 session token for `sub` carrying `role`, valid for `ttl`.
pub fn issue_token(
    secret: &str,
    sub: &str,
    role: Role,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        sub: sub.to_string(),
        role,
        exp: now + ttl.as_secs() as usize,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// resolve_session
///
/// Turns an optional credential into a `Session`. Demo tokens count only in
/// `Env::Local`; signed tokens are verified (signature and expiry) in every
/// environment. Anything unrecognized yields an anonymous session.
pub fn resolve_session(token: Option<&str>, config: &AppConfig) -> Session {
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        return Session::anonymous();
    };

    if config.env == Env::Local {
        if let Some((_, role)) = DEMO_TOKENS.iter().find(|(demo, _)| *demo == token) {
            return Session::authenticated(*role);
        }
    }

    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Session::authenticated(data.claims.role),
        Err(e) => {
            tracing::debug!(error = %e, "rejected session token");
            Session::anonymous()
        }
    }
}

/// Extracts the `auth_token` value from the request's Cookie headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// `Set-Cookie` value storing `token` as the session credential.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value removing the session credential.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Session Extractor Implementation
///
/// Makes `Session` usable as a handler or middleware argument. Never rejects:
/// a missing or invalid credential resolves to an anonymous session and the
/// access guard decides what that visitor may see.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(resolve_session(session_token(&parts.headers), &config))
    }
}
