use std::sync::Arc;

use crate::articles::{Article, ArticleStore};
use crate::core::config::RagSettings;
use crate::core::errors::ApiError;

use super::context_builder::render_context;
use super::keywords::extract_keywords;

/// Picks the articles for a user message and renders them as a context block.
///
/// Keyword hits win. A query with no usable keywords, or whose keywords hit
/// nothing, falls back to the newest articles. An empty corpus yields an
/// empty block.
#[derive(Clone)]
pub struct ContextRetriever {
    store: Arc<dyn ArticleStore>,
    search_limit: usize,
    fallback_limit: usize,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn ArticleStore>, settings: &RagSettings) -> Self {
        Self {
            store,
            search_limit: settings.search_limit,
            fallback_limit: settings.fallback_limit,
        }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<Article>, ApiError> {
        let keywords: Vec<String> = extract_keywords(query).into_iter().collect();
        tracing::debug!("Extracted {} search keywords: {:?}", keywords.len(), keywords);

        if !keywords.is_empty() {
            let hits = self.store.search(&keywords, self.search_limit).await?;
            if !hits.is_empty() {
                tracing::debug!("Keyword search matched {} articles", hits.len());
                return Ok(hits);
            }
        }

        let recent = self.store.recent(self.fallback_limit).await?;
        tracing::debug!("Falling back to {} recent articles", recent.len());
        Ok(recent)
    }

    pub async fn build_context(&self, query: &str) -> Result<String, ApiError> {
        let articles = self.retrieve(query).await?;
        Ok(render_context(&articles))
    }
}
