#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use storyteller_api::auth::jwt::JwtConfig;
use storyteller_api::config::{MediaBackend, MediaConfig, ServerConfig};
use storyteller_api::media::build_media_store;
use storyteller_api::router::build_app_router;
use storyteller_api::state::AppState;
use storyteller_provider::{
    Completion, CompletionRequest, GenerationProvider, ProviderConfig, ProviderError, Usage,
};

/// Bytes returned for every generated image.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image";

/// Bytes returned for every narration.
pub const FAKE_AUDIO: &[u8] = b"ID3fake-audio";

// ---------------------------------------------------------------------------
// Provider double
// ---------------------------------------------------------------------------

/// Deterministic provider: answers story prompts with as many sections as
/// requested and learning prompts with a fixed pack.
#[derive(Default)]
pub struct MockProvider {
    /// When set, every call fails with a 503 from "upstream".
    pub failing: bool,
    /// When set, image and speech calls never return.
    pub hanging: bool,
    pub completion_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
}

impl MockProvider {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hanging: true,
            ..Self::default()
        }
    }

    async fn stall(&self) {
        if self.hanging {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }

    fn outage() -> ProviderError {
        ProviderError::Api {
            status: 503,
            body: "upstream unavailable".into(),
        }
    }
}

/// Section count requested by a story prompt.
fn requested_sections(prompt: &str) -> usize {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix("Number of sections/pages:"))
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(5)
}

fn story_json(count: usize) -> Value {
    let sections: Vec<Value> = (1..=count)
        .map(|i| {
            json!({
                "id": i,
                "title": format!("Part {i}"),
                "text": format!("The little fox found lantern number {i}. It glowed softly in the dark wood."),
                "image_prompt": format!("A small fox holding glowing lantern number {i} in a forest"),
            })
        })
        .collect();
    json!({ "title": "The Lantern Fox", "sections": sections })
}

fn learning_json() -> Value {
    json!({
        "summary": "A fox collects lanterns and lights up the forest.",
        "questions": [
            { "question": "What did the fox find?", "answer": "Lanterns." },
            { "question": "Where did the fox walk?", "answer": "In the wood." },
            { "question": "How did the lanterns glow?", "answer": "Softly." }
        ],
        "vocabulary": [
            { "word": "lantern", "definition": "A light you can carry.", "example": "She held a lantern." },
            { "word": "glow", "definition": "To shine gently.", "example": "The moon glows." },
            { "word": "wood", "definition": "A small forest.", "example": "We walked in the wood." }
        ]
    })
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn complete_json(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Self::outage());
        }

        let body = if request.prompt.starts_with("You are a child-friendly educator") {
            learning_json()
        } else {
            story_json(requested_sections(&request.prompt))
        };
        Ok(Completion {
            text: body.to_string(),
            usage: Usage {
                model: request.model.clone(),
                input_tokens: Some(120),
                output_tokens: Some(380),
                total_tokens: Some(500),
            },
        })
    }

    async fn generate_image(
        &self,
        _model: &str,
        _prompt: &str,
        _size: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.failing {
            return Err(Self::outage());
        }
        Ok(FAKE_PNG.to_vec())
    }

    async fn synthesize_speech(
        &self,
        _model: &str,
        _voice: &str,
        _text: &str,
        _format: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.failing {
            return Err(Self::outage());
        }
        Ok(FAKE_AUDIO.to_vec())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// A fresh media directory under the system temp dir.
fn media_dir() -> PathBuf {
    std::env::temp_dir().join(format!("storyteller-test-{}", uuid::Uuid::new_v4().simple()))
}

/// Build a test `ServerConfig` with safe defaults and local media under
/// `media_dir`.
pub fn test_config(media_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        public_base_url: "http://localhost:8000".to_string(),
        web_dir: None,
        jwt: JwtConfig {
            secret: "test-secret-with-enough-length-for-hs256".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        media: MediaConfig {
            backend: MediaBackend::Local,
            dir: media_dir,
        },
    }
}

pub fn test_provider_config() -> ProviderConfig {
    ProviderConfig {
        api_key: "test-key".into(),
        base_url: "http://localhost:9".into(),
        story_model: "story-test-model".into(),
        learning_model: "learning-test-model".into(),
        image_model: "dall-e-2".into(),
        image_fallback_models: Vec::new(),
        allow_gpt_image: false,
        image_size: "512x512".into(),
        tts_model: "tts-test-model".into(),
        timeout_secs: 5,
    }
}

/// Build the full application router around a [`MockProvider`].
///
/// Uses the same `build_app_router` as `main.rs`, so the middleware stack
/// and `/media` mount match production.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(MockProvider::default()))
}

/// Like [`build_test_app`] but with a caller-supplied provider.
pub fn build_test_app_with(pool: PgPool, provider: Arc<MockProvider>) -> Router {
    build_test_app_from(pool, provider, test_config(media_dir()))
}

/// Like [`build_test_app_with`] but with a short request timeout.
pub fn build_test_app_with_timeout(
    pool: PgPool,
    provider: Arc<MockProvider>,
    request_timeout_secs: u64,
) -> Router {
    let config = ServerConfig {
        request_timeout_secs,
        ..test_config(media_dir())
    };
    build_test_app_from(pool, provider, config)
}

fn build_test_app_from(pool: PgPool, provider: Arc<MockProvider>, config: ServerConfig) -> Router {
    let http = reqwest::Client::new();
    let media = build_media_store(&config.media, http.clone());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        provider,
        provider_config: Arc::new(test_provider_config()),
        media,
        http,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("router is infallible")
}

fn json_request(method: Method, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("valid request")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, empty_request(Method::GET, uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request(Method::GET, uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, json_request(Method::POST, uri, &body, None)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request(Method::POST, uri, &body, Some(token))).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request(Method::POST, uri, Some(token))).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request(Method::PUT, uri, &body, Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request(Method::DELETE, uri, Some(token))).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const TEST_PASSWORD: &str = "lantern-123";

/// Register a parent and return the access token.
pub async fn register(app: Router, email: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "email": email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["access_token"]
        .as_str()
        .expect("access_token present")
        .to_string()
}

/// Poll a story until its status is `expected`, for resets that run on a
/// spawned task.
pub async fn wait_for_status(pool: &PgPool, token: &str, story_id: i64, expected: &str) -> Value {
    let uri = format!("/api/v1/stories/{story_id}");
    for _ in 0..50 {
        let json = body_json(get_auth(build_test_app(pool.clone()), &uri, token).await).await;
        if json["data"]["status"] == expected {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("story {story_id} never reached status {expected}");
}

/// Generate a story without images and return its JSON.
pub async fn create_story(app: Router, token: &str, sections: u8) -> Value {
    let response = post_json_auth(
        app,
        "/api/v1/stories",
        json!({
            "prompt": "A fox who collects lanterns",
            "sections": sections,
            "generate_images": false,
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}
