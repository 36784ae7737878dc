//! Read interface the chat core and the article routes query.
//!
//! Articles are authored elsewhere; the core only searches and lists them.

use async_trait::async_trait;

use super::types::{Article, Category, Magazine};
use crate::core::errors::ApiError;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Articles matching ANY keyword as a case-insensitive substring of the
    /// title, subtitle or body, newest first.
    async fn search(&self, keywords: &[String], limit: usize) -> Result<Vec<Article>, ApiError>;

    /// The `limit` most recently created articles, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<Article>, ApiError>;

    async fn get(&self, id: i64) -> Result<Option<Article>, ApiError>;

    /// All articles, optionally restricted to one category, newest first.
    async fn list(&self, category: Option<Category>) -> Result<Vec<Article>, ApiError>;

    /// Magazines ordered by issue number, highest first, each carrying its
    /// articles newest first.
    async fn list_magazines(&self) -> Result<Vec<Magazine>, ApiError>;

    async fn get_magazine(&self, id: i64) -> Result<Option<Magazine>, ApiError>;

    async fn magazine_by_issue(&self, issue: i64) -> Result<Option<Magazine>, ApiError>;
}
