use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use docent_backend::articles::{Category, NewArticle, NewMagazine, SqliteArticleStore};
use docent_backend::core::config::{AppPaths, AppSettings};
use docent_backend::core::db::connect_sqlite;
use docent_backend::core::errors::ApiError;
use docent_backend::llm::{ChatRequest, CompletionClient, CompletionStream};
use docent_backend::server::router;
use docent_backend::state::AppState;

/// Answers with a fixed reply and remembers the system prompts it was given.
struct CannedClient {
    systems: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionClient for CannedClient {
    fn name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ApiError> {
        self.systems
            .lock()
            .unwrap()
            .push(request.system.unwrap_or_default());
        Ok("안녕하세요".to_string())
    }

    async fn stream(&self, request: ChatRequest) -> Result<CompletionStream, ApiError> {
        self.systems
            .lock()
            .unwrap()
            .push(request.system.unwrap_or_default());
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            for fragment in ["안", "녕"] {
                if tx.send(Ok(fragment.to_string())).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

struct TestApp {
    state: Arc<AppState>,
    client: Arc<CannedClient>,
    articles: SqliteArticleStore,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let paths = Arc::new(AppPaths::with_data_dir(
            dir.path().to_path_buf(),
            dir.path().to_path_buf(),
        ));
        let settings = AppSettings::from_config(&json!({}));
        let client = Arc::new(CannedClient {
            systems: Mutex::new(Vec::new()),
        });

        let state = AppState::with_client(paths.clone(), settings, client.clone())
            .await
            .unwrap();
        let articles = SqliteArticleStore::new(connect_sqlite(&paths.db_path).await.unwrap())
            .await
            .unwrap();

        Self {
            state,
            client,
            articles,
            _dir: dir,
        }
    }

    fn app(&self) -> Router {
        router(self.state.clone())
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.app().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new().await;
    let (status, body) = app.json(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn blocking_chat_round_trip_and_history() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/chat",
            Some(json!({"sessionId": "s1", "message": "안녕"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"sessionId": "s1", "message": "안녕하세요"}));

    let (status, history) = app.json(Method::GET, "/api/chat/s1", None).await;
    assert_eq!(status, StatusCode::OK);
    let turns = history.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["sessionId"], "s1");
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "안녕");
    assert_eq!(turns[1]["role"], "assistant");
    assert_eq!(turns[1]["content"], "안녕하세요");
}

#[tokio::test]
async fn streamed_chat_emits_sse_records_then_persists() {
    let app = TestApp::new().await;

    let (status, bytes) = app
        .send(
            Method::POST,
            "/api/chat/stream",
            Some(json!({"sessionId": "s2", "message": "인사해줘"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(bytes).unwrap();
    let records: Vec<Value> = text
        .split("\n\n")
        .filter_map(|record| record.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();
    assert_eq!(
        records,
        vec![
            json!({"type": "delta", "content": "안"}),
            json!({"type": "delta", "content": "녕"}),
            json!({"type": "done"}),
        ]
    );

    let (_, history) = app.json(Method::GET, "/api/chat/s2", None).await;
    let turns = history.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1]["content"], "안녕");
}

#[tokio::test]
async fn clearing_history_reports_the_deleted_count() {
    let app = TestApp::new().await;
    app.json(
        Method::POST,
        "/api/chat",
        Some(json!({"sessionId": "s3", "message": "질문"})),
    )
    .await;

    let (status, body) = app.json(Method::DELETE, "/api/chat/s3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 2}));

    let (_, body) = app.json(Method::DELETE, "/api/chat/s3", None).await;
    assert_eq!(body, json!({"count": 0}));

    let (_, history) = app.json(Method::GET, "/api/chat/s3", None).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn chat_prompt_is_grounded_in_stored_articles() {
    let app = TestApp::new().await;
    app.articles
        .insert_article(NewArticle::new(
            "발레 입문",
            "호두까기 인형 이야기",
            Category::EditorPick,
        ))
        .await
        .unwrap();

    app.json(
        Method::POST,
        "/api/chat",
        Some(json!({"sessionId": "s4", "message": "발레 추천"})),
    )
    .await;

    let systems = app.client.systems.lock().unwrap();
    assert!(systems[0].contains("[기사 1] 발레 입문"));
}

#[tokio::test]
async fn article_routes_list_filter_and_miss() {
    let app = TestApp::new().await;
    let magazine = app
        .articles
        .insert_magazine(NewMagazine {
            issue: 12,
            title: "월간 아트".to_string(),
            cover_image: None,
        })
        .await
        .unwrap();
    app.articles
        .insert_magazine(NewMagazine {
            issue: 13,
            title: "월간 아트".to_string(),
            cover_image: None,
        })
        .await
        .unwrap();

    let mut interview = NewArticle::new("지휘자를 만나다", "대담", Category::Interview);
    interview.magazine_id = Some(magazine.id);
    let interview = app.articles.insert_article(interview).await.unwrap();
    app.articles
        .insert_article(NewArticle::new("가을 전시", "전시 소식", Category::Exhibition))
        .await
        .unwrap();

    let (status, all) = app.json(Method::GET, "/api/articles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, filtered) = app
        .json(Method::GET, "/api/articles?category=INTERVIEW", None)
        .await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["title"], "지휘자를 만나다");
    assert_eq!(filtered[0]["magazine"]["issue"], 12);

    let (status, _) = app
        .json(Method::GET, "/api/articles?category=GOSSIP", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, one) = app
        .json(Method::GET, &format!("/api/articles/{}", interview.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["category"], "INTERVIEW");

    let (status, _) = app.json(Method::GET, "/api/articles/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, magazines) = app.json(Method::GET, "/api/magazines", None).await;
    let issues: Vec<i64> = magazines
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["issue"].as_i64().unwrap())
        .collect();
    assert_eq!(issues, vec![13, 12]);
}

#[tokio::test]
async fn magazine_routes_include_articles() {
    let app = TestApp::new().await;
    let magazine = app
        .articles
        .insert_magazine(NewMagazine {
            issue: 21,
            title: "겨울호".to_string(),
            cover_image: Some("/covers/21.jpg".to_string()),
        })
        .await
        .unwrap();
    let mut cover = NewArticle::new("겨울 오페라", "라 보엠", Category::CoverStory);
    cover.magazine_id = Some(magazine.id);
    app.articles.insert_article(cover).await.unwrap();

    let (_, magazines) = app.json(Method::GET, "/api/magazines", None).await;
    assert_eq!(magazines[0]["articles"][0]["title"], "겨울 오페라");

    let (status, by_id) = app
        .json(Method::GET, &format!("/api/magazines/{}", magazine.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["issue"], 21);
    assert_eq!(by_id["coverImage"], "/covers/21.jpg");
    assert_eq!(by_id["articles"].as_array().unwrap().len(), 1);

    let (status, by_issue) = app.json(Method::GET, "/api/magazines/issue/21", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_issue["id"], magazine.id);
    assert_eq!(by_issue["articles"][0]["magazine"]["issue"], 21);

    let (status, _) = app.json(Method::GET, "/api/magazines/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.json(Method::GET, "/api/magazines/issue/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("99"));
}
