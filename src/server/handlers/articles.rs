use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::articles::Category;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    pub category: Option<String>,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<Category>().map_err(ApiError::BadRequest)?),
    };
    let articles = state.articles.list(category).await?;
    Ok(Json(articles))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let article = state
        .articles
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Article {} not found", id)))?;
    Ok(Json(article))
}

pub async fn list_magazines(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let magazines = state.articles.list_magazines().await?;
    Ok(Json(magazines))
}

pub async fn get_magazine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let magazine = state
        .articles
        .get_magazine(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Magazine {} not found", id)))?;
    Ok(Json(magazine))
}

pub async fn get_magazine_by_issue(
    State(state): State<Arc<AppState>>,
    Path(issue): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let magazine = state
        .articles
        .magazine_by_issue(issue)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Magazine issue {} not found", issue)))?;
    Ok(Json(magazine))
}
