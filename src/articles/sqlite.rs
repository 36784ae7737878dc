//! SQLite-backed article store.
//!
//! Keyword search scans rows newest first and matches in Rust, so the number
//! of keywords never shapes the SQL and case folding covers all of Unicode.
//! The magazine corpus is small enough that no full-text index is needed.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::store::ArticleStore;
use super::types::{Article, Category, Magazine, MagazineRef, NewArticle, NewMagazine};
use crate::core::db::{format_timestamp, parse_timestamp};
use crate::core::errors::ApiError;

const SELECT_ARTICLES: &str = "SELECT a.id, a.title, a.subtitle, a.content, a.category, \
     a.image_url, a.author, a.created_at, \
     m.id AS magazine_id, m.title AS magazine_title, m.issue AS magazine_issue \
     FROM articles a LEFT JOIN magazines m ON m.id = a.magazine_id";

const NEWEST_FIRST: &str = " ORDER BY a.created_at DESC, a.id DESC";

const SELECT_MAGAZINES: &str = "SELECT id, issue, title, cover_image, created_at FROM magazines";

#[derive(Clone)]
pub struct SqliteArticleStore {
    pool: SqlitePool,
}

impl SqliteArticleStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, ApiError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS magazines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                issue INTEGER NOT NULL UNIQUE,
                title TEXT NOT NULL,
                cover_image TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init magazines table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                subtitle TEXT,
                content TEXT NOT NULL,
                category TEXT NOT NULL,
                image_url TEXT,
                author TEXT,
                magazine_id INTEGER REFERENCES magazines(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init articles table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    pub async fn insert_magazine(&self, magazine: NewMagazine) -> Result<Magazine, ApiError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO magazines (issue, title, cover_image, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(magazine.issue)
        .bind(&magazine.title)
        .bind(&magazine.cover_image)
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(Magazine {
            id: result.last_insert_rowid(),
            issue: magazine.issue,
            title: magazine.title,
            cover_image: magazine.cover_image,
            created_at: now,
            articles: Vec::new(),
        })
    }

    pub async fn insert_article(&self, article: NewArticle) -> Result<Article, ApiError> {
        let result = sqlx::query(
            "INSERT INTO articles (title, subtitle, content, category, image_url, author, magazine_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&article.title)
        .bind(&article.subtitle)
        .bind(&article.content)
        .bind(article.category.as_str())
        .bind(&article.image_url)
        .bind(&article.author)
        .bind(article.magazine_id)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        self.get(result.last_insert_rowid())
            .await?
            .ok_or_else(|| ApiError::internal("Inserted article vanished"))
    }

    fn row_to_article(row: &SqliteRow) -> Result<Article, ApiError> {
        let category: String = row.try_get("category").map_err(ApiError::internal)?;
        let created_at: String = row.try_get("created_at").map_err(ApiError::internal)?;

        let magazine = match row
            .try_get::<Option<i64>, _>("magazine_id")
            .map_err(ApiError::internal)?
        {
            Some(id) => Some(MagazineRef {
                id,
                title: row.try_get("magazine_title").map_err(ApiError::internal)?,
                issue: row.try_get("magazine_issue").map_err(ApiError::internal)?,
            }),
            None => None,
        };

        Ok(Article {
            id: row.try_get("id").map_err(ApiError::internal)?,
            title: row.try_get("title").map_err(ApiError::internal)?,
            subtitle: row.try_get("subtitle").map_err(ApiError::internal)?,
            content: row.try_get("content").map_err(ApiError::internal)?,
            category: category.parse::<Category>().map_err(ApiError::Internal)?,
            image_url: row.try_get("image_url").map_err(ApiError::internal)?,
            author: row.try_get("author").map_err(ApiError::internal)?,
            magazine,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn rows_to_articles(rows: &[SqliteRow]) -> Result<Vec<Article>, ApiError> {
        rows.iter().map(Self::row_to_article).collect()
    }

    /// Magazine columns only; `articles` is left empty.
    fn row_to_magazine(row: &SqliteRow) -> Result<Magazine, ApiError> {
        let created_at: String = row.try_get("created_at").map_err(ApiError::internal)?;
        Ok(Magazine {
            id: row.try_get("id").map_err(ApiError::internal)?,
            issue: row.try_get("issue").map_err(ApiError::internal)?,
            title: row.try_get("title").map_err(ApiError::internal)?,
            cover_image: row.try_get("cover_image").map_err(ApiError::internal)?,
            created_at: parse_timestamp(&created_at)?,
            articles: Vec::new(),
        })
    }

    async fn with_articles(&self, row: Option<SqliteRow>) -> Result<Option<Magazine>, ApiError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut magazine = Self::row_to_magazine(&row)?;

        let rows = sqlx::query(&format!(
            "{} WHERE a.magazine_id = ?{}",
            SELECT_ARTICLES, NEWEST_FIRST
        ))
        .bind(magazine.id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;
        magazine.articles = Self::rows_to_articles(&rows)?;

        Ok(Some(magazine))
    }
}

/// True when any lowercased needle occurs in the title, subtitle or body.
fn matches_any(article: &Article, needles: &[String]) -> bool {
    let fields = [
        article.title.to_lowercase(),
        article.subtitle.as_deref().unwrap_or_default().to_lowercase(),
        article.content.to_lowercase(),
    ];
    needles
        .iter()
        .any(|needle| fields.iter().any(|field| field.contains(needle.as_str())))
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    async fn search(&self, keywords: &[String], limit: usize) -> Result<Vec<Article>, ApiError> {
        let needles: Vec<String> = keywords
            .iter()
            .map(|keyword| keyword.to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        if needles.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!("{}{}", SELECT_ARTICLES, NEWEST_FIRST);
        let mut rows = sqlx::query(&sql).fetch(&self.pool);

        let mut found = Vec::new();
        while let Some(row) = rows.try_next().await.map_err(ApiError::internal)? {
            let article = Self::row_to_article(&row)?;
            if matches_any(&article, &needles) {
                found.push(article);
                if found.len() == limit {
                    break;
                }
            }
        }
        Ok(found)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Article>, ApiError> {
        let rows = sqlx::query(&format!("{}{} LIMIT ?", SELECT_ARTICLES, NEWEST_FIRST))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Self::rows_to_articles(&rows)
    }

    async fn get(&self, id: i64) -> Result<Option<Article>, ApiError> {
        let row = sqlx::query(&format!("{} WHERE a.id = ?", SELECT_ARTICLES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        row.as_ref().map(Self::row_to_article).transpose()
    }

    async fn list(&self, category: Option<Category>) -> Result<Vec<Article>, ApiError> {
        let rows = match category {
            Some(category) => {
                sqlx::query(&format!(
                    "{} WHERE a.category = ?{}",
                    SELECT_ARTICLES, NEWEST_FIRST
                ))
                .bind(category.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!("{}{}", SELECT_ARTICLES, NEWEST_FIRST))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(ApiError::internal)?;
        Self::rows_to_articles(&rows)
    }

    async fn list_magazines(&self) -> Result<Vec<Magazine>, ApiError> {
        let rows = sqlx::query(&format!("{} ORDER BY issue DESC", SELECT_MAGAZINES))
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        let mut magazines = rows
            .iter()
            .map(Self::row_to_magazine)
            .collect::<Result<Vec<_>, _>>()?;

        let rows = sqlx::query(&format!(
            "{} WHERE a.magazine_id IS NOT NULL{}",
            SELECT_ARTICLES, NEWEST_FIRST
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut by_magazine: HashMap<i64, Vec<Article>> = HashMap::new();
        for article in Self::rows_to_articles(&rows)? {
            if let Some(magazine) = &article.magazine {
                by_magazine.entry(magazine.id).or_default().push(article);
            }
        }
        for magazine in &mut magazines {
            magazine.articles = by_magazine.remove(&magazine.id).unwrap_or_default();
        }

        Ok(magazines)
    }

    async fn get_magazine(&self, id: i64) -> Result<Option<Magazine>, ApiError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_MAGAZINES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        self.with_articles(row).await
    }

    async fn magazine_by_issue(&self, issue: i64) -> Result<Option<Magazine>, ApiError> {
        let row = sqlx::query(&format!("{} WHERE issue = ?", SELECT_MAGAZINES))
            .bind(issue)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        self.with_articles(row).await
    }
}
