use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{auth::Session, navigation::NavigationMenu};

// --- Access Control ---

/// Role
///
/// The closed set of portal roles. Every session carries exactly one; an
/// unauthenticated session is always `Guest`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Instructor,
    Student,
    #[default]
    Guest,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Catalog Schemas (Mapped to the JSON fixtures) ---

/// User
///
/// A portal member as stored in `users.json`. `role_id` references a role
/// record such as `role_instructor`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Unlisted,
}

/// ContentType
///
/// Discriminator of the playable/browsable content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContentType {
    Course,
    Series,
    Episode,
    Vlog,
    Song,
    Movie,
    #[default]
    Standalone,
}

impl ContentType {
    /// Capitalized label shown on browse cards ("Vlog", "Movie", ...).
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Course => "Course",
            ContentType::Series => "Series",
            ContentType::Episode => "Episode",
            ContentType::Vlog => "Vlog",
            ContentType::Song => "Song",
            ContentType::Movie => "Movie",
            ContentType::Standalone => "Standalone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct CourseModule {
    pub id: String,
    pub title: String,
    pub order: u32,
}

/// Course
///
/// A structured course. Shares the video metadata (title, thumbnail, upload
/// date) but acts as a container for its lessons (`content_ids`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    /// Duration in seconds.
    pub duration: u32,
    #[ts(type = "string")]
    pub upload_date: DateTime<Utc>,
    pub visibility: Visibility,
    pub creator_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub modules: Vec<CourseModule>,
    pub instructor_id: String,
    pub difficulty_level: Difficulty,
    #[serde(default)]
    pub content_ids: Vec<String>,
}

/// Series
///
/// A multi-part collection. Episodes are referenced by id so the fixture
/// stays normalized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Series {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub creator_id: String,
    #[serde(default)]
    pub episode_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub duration: u32,
    #[ts(type = "string")]
    pub upload_date: DateTime<Utc>,
    pub visibility: Visibility,
    pub creator_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
}

/// VideoContent
///
/// Standalone playable content (vlogs, songs, movies) from `videoContent.json`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VideoContent {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub thumbnail_url: String,
    pub duration: u32,
    #[ts(type = "string")]
    pub upload_date: DateTime<Utc>,
    pub visibility: Visibility,
    pub creator_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

// --- Response Payloads (Output Schemas) ---

/// SeriesDetails
///
/// Output of GET /api/series/{id}. Episodes are ordered by episode number.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SeriesDetails {
    pub series: Series,
    pub episodes: Vec<Episode>,
    pub creator: Option<User>,
}

/// BrowseItem
///
/// One card of the unified browse feed. `href` points at the page that
/// renders the underlying content.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BrowseItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub content_type: String,
    pub href: String,
    #[ts(type = "string")]
    pub display_date: DateTime<Utc>,
}

/// Generic JSON error body, e.g. `{"message": "Course not found"}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// PageContext
///
/// What a page renderer needs for one request: the path it serves, the
/// resolved session and the navigation visible to that session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageContext {
    pub path: String,
    pub session: Session,
    pub navigation: NavigationMenu,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input for the development login (POST /api/auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default = "default_login_role")]
    pub role: Role,
    /// The page the user was bounced from, echoed back as the redirect target.
    #[serde(default)]
    pub redirected_from: Option<String>,
}

fn default_login_role() -> Role {
    Role::Student
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub session: Session,
    pub redirect_to: String,
}
