use std::{fs, path::Path, sync::Arc};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::{auth::Session, models::Role};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated visitors without the required role are sent.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
/// Query parameter carrying the originally requested path to the login page.
pub const REDIRECTED_FROM_PARAM: &str = "redirectedFrom";

/// PolicyError
///
/// Failures while building an `AccessPolicy` from configuration. All of them
/// are fatal at startup.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read access policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid access policy document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid route pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// RouteRule
///
/// A path-pattern-keyed access policy entry. Rules are evaluated in order and
/// the first whose pattern matches the request path decides.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pattern: Regex,
    required_roles: Option<Vec<Role>>,
    allow_unauthenticated: bool,
    redirect_if_authenticated: Option<String>,
}

impl RouteRule {
    pub fn new(pattern: &str) -> Result<Self, PolicyError> {
        let pattern = Regex::new(pattern).map_err(|source| PolicyError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern,
            required_roles: None,
            allow_unauthenticated: false,
            redirect_if_authenticated: None,
        })
    }

    pub fn require_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles = Some(roles.into_iter().collect());
        self
    }

    pub fn allow_unauthenticated(mut self) -> Self {
        self.allow_unauthenticated = true;
        self
    }

    pub fn redirect_if_authenticated(mut self, target: impl Into<String>) -> Self {
        self.redirect_if_authenticated = Some(target.into());
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn required_roles(&self) -> Option<&[Role]> {
        self.required_roles.as_deref()
    }
}

/// Redirect
///
/// Target of a `Decision::RedirectTo`. Login redirects remember the path the
/// visitor asked for so the login page can send them back afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub redirected_from: Option<String>,
}

impl Redirect {
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            redirected_from: None,
        }
    }

    pub fn to_login(requested: &str) -> Self {
        Self {
            path: LOGIN_PATH.to_string(),
            redirected_from: Some(requested.to_string()),
        }
    }

    /// The value of the `Location` header: the target path plus the
    /// percent-encoded `redirectedFrom` parameter when present.
    pub fn location(&self) -> String {
        self.location_with_query(None)
    }

    /// Like `location`, keeping the parameters of the request's query string.
    /// A `redirectedFrom` already in the query is replaced on login redirects.
    pub fn location_with_query(&self, query: Option<&str>) -> String {
        let kept = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
            .filter(|(key, _)| self.redirected_from.is_none() || key != REDIRECTED_FROM_PARAM);

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(kept);
        if let Some(from) = &self.redirected_from {
            serializer.append_pair(REDIRECTED_FROM_PARAM, from);
        }

        let query = serializer.finish();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }
}

/// Decision
///
/// The allow/redirect outcome of evaluating one request against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(Redirect),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Redirect target path without the query string, if any.
    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectTo(redirect) => Some(&redirect.path),
        }
    }
}

/// AccessPolicy
///
/// The immutable route rule list and public-path prefixes, built once at
/// process start and shared read-only by the guard.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<RouteRule>,
    public_paths: Vec<String>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<RouteRule>, public_paths: Vec<String>) -> Self {
        Self {
            rules,
            public_paths,
        }
    }

    /// The portal's built-in rules. Order is significant.
    pub fn standard() -> Result<Self, PolicyError> {
        let members = [Role::Admin, Role::Instructor, Role::Student];
        let rules = vec![
            RouteRule::new(r"^/login$")?.redirect_if_authenticated("/"),
            RouteRule::new(r"^/signup$")?.redirect_if_authenticated("/"),
            RouteRule::new(r"^/admin(/.*)?$")?.require_roles([Role::Admin]),
            RouteRule::new(r"^/courses/create$")?.require_roles([Role::Instructor]),
            RouteRule::new(r"^/profile$")?.require_roles(members),
            RouteRule::new(r"^/settings$")?.require_roles(members),
        ];
        let public_paths = ["/", "/browse", "/courses/", "/series/", "/unauthorized"]
            .into_iter()
            .map(String::from)
            .collect();

        Ok(Self::new(rules, public_paths))
    }

    /// Builds a policy from a JSON document on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        let document: PolicyDocument = serde_json::from_str(raw)?;
        let rules = document
            .rules
            .into_iter()
            .map(RouteRuleDocument::into_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules, document.public_paths))
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn public_paths(&self) -> &[String] {
        &self.public_paths
    }

    fn is_public(&self, path: &str) -> bool {
        self.public_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// decide
    ///
    /// Evaluates `path` for `session`. Pure: the same inputs always produce
    /// the same decision.
    ///
    /// 1. The first rule matching the path applies (first match, not best).
    /// 2. An authenticated visitor on a `redirect_if_authenticated` rule is
    ///    sent to its target, whatever the role.
    /// 3. Without a rule, anonymous visitors are sent to login unless the path
    ///    starts with a public prefix.
    /// 4. With a role-restricted rule, anonymous visitors go to login (unless
    ///    the rule allows them) and authenticated visitors without a listed
    ///    role go to `/unauthorized`.
    pub fn decide(&self, path: &str, session: &Session) -> Decision {
        let rule = self.rules.iter().find(|rule| rule.matches(path));

        let Some(rule) = rule else {
            if !session.is_authenticated && !self.is_public(path) {
                return Decision::RedirectTo(Redirect::to_login(path));
            }
            return Decision::Allow;
        };

        if session.is_authenticated {
            if let Some(target) = &rule.redirect_if_authenticated {
                return Decision::RedirectTo(Redirect::to(target.clone()));
            }
        }

        if let Some(roles) = &rule.required_roles {
            if !session.is_authenticated && !rule.allow_unauthenticated {
                return Decision::RedirectTo(Redirect::to_login(path));
            }
            if session.is_authenticated && !roles.contains(&session.role) {
                return Decision::RedirectTo(Redirect::to(UNAUTHORIZED_PATH));
            }
        }

        Decision::Allow
    }
}

/// PolicyState
///
/// The shared handle stored in the application state.
pub type PolicyState = Arc<AccessPolicy>;

/// is_guarded_path
///
/// Whether the access guard runs for this path at all. API calls, build
/// assets, the favicon and images bypass it.
pub fn is_guarded_path(path: &str) -> bool {
    const SKIPPED_PREFIXES: [&str; 4] = ["api", "_next/static", "_next/image", "favicon.ico"];
    const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".svg"];

    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if SKIPPED_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix)) {
        return false;
    }
    !IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

// --- Policy document (ACCESS_POLICY_FILE) ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyDocument {
    #[serde(default)]
    rules: Vec<RouteRuleDocument>,
    #[serde(default)]
    public_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteRuleDocument {
    path: String,
    #[serde(default)]
    required_roles: Option<Vec<Role>>,
    #[serde(default)]
    allow_unauthenticated: bool,
    #[serde(default)]
    redirect_if_authenticated: Option<String>,
}

impl RouteRuleDocument {
    fn into_rule(self) -> Result<RouteRule, PolicyError> {
        let mut rule = RouteRule::new(&self.path)?;
        rule.required_roles = self.required_roles;
        rule.allow_unauthenticated = self.allow_unauthenticated;
        rule.redirect_if_authenticated = self.redirect_if_authenticated;
        Ok(rule)
    }
}
