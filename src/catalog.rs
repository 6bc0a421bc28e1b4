use std::{cmp::Reverse, io::ErrorKind, path::Path, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{
    BrowseItem, Course, Difficulty, Episode, Series, SeriesDetails, User, VideoContent,
};

/// Catalog Trait
///
/// Read-only access to the portal's content. Handlers depend on this
/// contract only, so tests can swap in their own implementation.
#[async_trait]
pub trait Catalog: Send + Sync {
    // --- Users ---
    async fn users(&self) -> Vec<User>;
    async fn user(&self, id: &str) -> Option<User>;

    // --- Courses ---
    // Optional difficulty filter plus case-insensitive search over title,
    // description and tags.
    async fn courses(&self, difficulty: Option<Difficulty>, search: Option<String>) -> Vec<Course>;
    async fn course(&self, id: &str) -> Option<Course>;

    // --- Series ---
    async fn series(&self) -> Vec<Series>;
    async fn series_details(&self, id: &str) -> Option<SeriesDetails>;

    // --- Browse ---
    // Courses, series and standalone videos merged into one feed, newest first.
    async fn browse(&self) -> Vec<BrowseItem>;
}

/// CatalogState
///
/// The shared handle stored in the application state.
pub type CatalogState = Arc<dyn Catalog>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed fixture {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JsonCatalog
///
/// Catalog backed by the JSON fixtures, read once and served from memory.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    users: Vec<User>,
    courses: Vec<Course>,
    series: Vec<Series>,
    episodes: Vec<Episode>,
    videos: Vec<VideoContent>,
    // Date given to series whose episodes are all missing from the fixtures.
    loaded_at: DateTime<Utc>,
}

impl JsonCatalog {
    pub fn new(
        users: Vec<User>,
        courses: Vec<Course>,
        series: Vec<Series>,
        episodes: Vec<Episode>,
        videos: Vec<VideoContent>,
    ) -> Self {
        Self {
            users,
            courses,
            series,
            episodes,
            videos,
            loaded_at: Utc::now(),
        }
    }

    /// load
    ///
    /// Reads `users.json`, `courses.json` and `series.json` from `dir`.
    /// `episodes.json` and `videoContent.json` are optional and load as empty
    /// when absent.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let users: Vec<User> = read_fixture(dir, "users.json", true).await?;
        let courses: Vec<Course> = read_fixture(dir, "courses.json", true).await?;
        let series: Vec<Series> = read_fixture(dir, "series.json", true).await?;
        let episodes: Vec<Episode> = read_fixture(dir, "episodes.json", false).await?;
        let videos: Vec<VideoContent> = read_fixture(dir, "videoContent.json", false).await?;

        tracing::info!(
            users = users.len(),
            courses = courses.len(),
            series = series.len(),
            episodes = episodes.len(),
            videos = videos.len(),
            "catalog fixtures loaded from {}",
            dir.display()
        );

        Ok(Self::new(users, courses, series, episodes, videos))
    }

    fn find_user(&self, id: &str) -> Option<User> {
        self.users.iter().find(|user| user.id == id).cloned()
    }

    // The upload date of the first fixture episode that belongs to `series`.
    fn series_date(&self, series: &Series) -> DateTime<Utc> {
        self.episodes
            .iter()
            .find(|episode| series.episode_ids.contains(&episode.id))
            .map(|episode| episode.upload_date)
            .unwrap_or(self.loaded_at)
    }
}

async fn read_fixture<T: DeserializeOwned>(
    dir: &Path,
    name: &str,
    required: bool,
) -> Result<Vec<T>, CatalogError> {
    let path = dir.join(name);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if !required && e.kind() == ErrorKind::NotFound => {
            tracing::debug!("optional fixture {} not found", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(CatalogError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };
    serde_json::from_str(&raw).map_err(|source| CatalogError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn matches_search(course: &Course, needle: &str) -> bool {
    course.title.to_lowercase().contains(needle)
        || course.description.to_lowercase().contains(needle)
        || course
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

#[async_trait]
impl Catalog for JsonCatalog {
    async fn users(&self) -> Vec<User> {
        self.users.clone()
    }

    async fn user(&self, id: &str) -> Option<User> {
        self.find_user(id)
    }

    async fn courses(&self, difficulty: Option<Difficulty>, search: Option<String>) -> Vec<Course> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        self.courses
            .iter()
            .filter(|course| difficulty.is_none_or(|d| course.difficulty_level == d))
            .filter(|course| needle.as_deref().is_none_or(|n| matches_search(course, n)))
            .cloned()
            .collect()
    }

    async fn course(&self, id: &str) -> Option<Course> {
        self.courses.iter().find(|course| course.id == id).cloned()
    }

    async fn series(&self) -> Vec<Series> {
        self.series.clone()
    }

    async fn series_details(&self, id: &str) -> Option<SeriesDetails> {
        let series = self.series.iter().find(|series| series.id == id)?.clone();

        let mut episodes: Vec<Episode> = self
            .episodes
            .iter()
            .filter(|episode| series.episode_ids.contains(&episode.id))
            .cloned()
            .collect();
        episodes.sort_by_key(|episode| episode.episode_number.unwrap_or(0));

        let creator = self.find_user(&series.creator_id);
        Some(SeriesDetails {
            series,
            episodes,
            creator,
        })
    }

    async fn browse(&self) -> Vec<BrowseItem> {
        let courses = self.courses.iter().map(|course| BrowseItem {
            id: course.id.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            thumbnail_url: course.thumbnail_url.clone(),
            content_type: "Course".to_string(),
            href: format!("/courses/{}", course.id),
            display_date: course.upload_date,
        });

        let series = self.series.iter().map(|series| BrowseItem {
            id: series.id.clone(),
            title: series.title.clone(),
            description: series.description.clone(),
            thumbnail_url: series.thumbnail_url.clone(),
            content_type: "Series".to_string(),
            href: format!("/series/{}", series.id),
            display_date: self.series_date(series),
        });

        let videos = self.videos.iter().map(|video| BrowseItem {
            id: video.id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            content_type: video.content_type.label().to_string(),
            href: format!("/watch/{}", video.id),
            display_date: video.upload_date,
        });

        let mut feed: Vec<BrowseItem> = courses.chain(series).chain(videos).collect();
        feed.sort_by_key(|item| Reverse(item.display_date));
        feed
    }
}
