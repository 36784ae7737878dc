use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    CoverStory,
    PerformanceReview,
    EditorPick,
    Interview,
    Exhibition,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::CoverStory,
        Category::PerformanceReview,
        Category::EditorPick,
        Category::Interview,
        Category::Exhibition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CoverStory => "COVER_STORY",
            Category::PerformanceReview => "PERFORMANCE_REVIEW",
            Category::EditorPick => "EDITOR_PICK",
            Category::Interview => "INTERVIEW",
            Category::Exhibition => "EXHIBITION",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown article category: {}", s))
    }
}

/// The slice of a magazine an article carries when joined for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagazineRef {
    pub id: i64,
    pub title: String,
    pub issue: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub category: Category,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub magazine: Option<MagazineRef>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Magazine {
    pub id: i64,
    pub issue: i64,
    pub title: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone)]
pub struct NewMagazine {
    pub issue: i64,
    pub title: String,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub category: Category,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub magazine_id: Option<i64>,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, content: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            content: content.into(),
            category,
            image_url: None,
            author: None,
            magazine_id: None,
        }
    }
}
