use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::defaults::default_cors_origins;
use crate::server::handlers::{articles, chat, health};
use crate::state::AppState;

/// Creates the application router.
///
/// - `/health`
/// - chat: blocking, streamed (SSE) and per-session history
/// - read-only article and magazine listings
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_allowed_origins);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        .route("/api/chat/stream", post(chat::chat_stream))
        .route(
            "/api/chat/:session_id",
            get(chat::get_history).delete(chat::clear_history),
        )
        .route("/api/articles", get(articles::list_articles))
        .route("/api/articles/:id", get(articles::get_article))
        .route("/api/magazines", get(articles::list_magazines))
        .route("/api/magazines/:id", get(articles::get_magazine))
        .route(
            "/api/magazines/issue/:issue",
            get(articles::get_magazine_by_issue),
        )
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let mut allowed = parse_origins(origins);
        if allowed.is_empty() {
            tracing::warn!("No valid CORS origins configured; using local defaults");
            allowed = parse_origins(&default_cors_origins());
        }
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect()
}
