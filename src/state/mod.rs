use std::sync::Arc;

use crate::articles::{ArticleStore, SqliteArticleStore};
use crate::chat::ChatOrchestrator;
use crate::core::config::{AppPaths, AppSettings, ConfigService};
use crate::core::db::connect_sqlite;
use crate::history::HistoryStore;
use crate::llm::{build_completion_client, CompletionClient};
use crate::rag::ContextRetriever;

pub mod error;

pub use error::InitializationError;

/// Application state shared across all routes.
///
/// Both stores share one SQLite pool at `paths.db_path`.
#[derive(Clone)]
pub struct AppState {
    pub settings: AppSettings,
    pub history: HistoryStore,
    pub articles: Arc<dyn ArticleStore>,
    pub chat: ChatOrchestrator,
}

impl AppState {
    /// Loads configuration, opens the database and wires the chat pipeline
    /// to the configured completion provider.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let raw = config
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        let settings = AppSettings::from_config(&raw).apply_env_overrides();

        let client = build_completion_client(&settings.llm);
        tracing::info!(
            "Using {} completion provider with model {}",
            client.name(),
            settings.llm.model
        );

        Self::with_client(paths, settings, client).await
    }

    /// Builds the state around an already constructed completion client.
    pub async fn with_client(
        paths: Arc<AppPaths>,
        settings: AppSettings,
        client: Arc<dyn CompletionClient>,
    ) -> Result<Arc<Self>, InitializationError> {
        let pool = connect_sqlite(&paths.db_path)
            .await
            .map_err(|e| InitializationError::Database(e.into()))?;

        let history = HistoryStore::new(pool.clone())
            .await
            .map_err(|e| InitializationError::History(e.into()))?;

        let articles: Arc<dyn ArticleStore> = Arc::new(
            SqliteArticleStore::new(pool)
                .await
                .map_err(|e| InitializationError::Articles(e.into()))?,
        );

        let chat = ChatOrchestrator::new(
            history.clone(),
            ContextRetriever::new(articles.clone(), &settings.rag),
            client,
            &settings.llm,
            &settings.chat,
        );

        Ok(Arc::new(AppState {
            settings,
            history,
            articles,
            chat,
        }))
    }
}
