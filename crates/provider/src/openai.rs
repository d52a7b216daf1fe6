//! REST client for an OpenAI-compatible API.
//!
//! Wraps `POST /chat/completions`, `POST /images/generations` and
//! `POST /audio/speech` using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::traits::GenerationProvider;
use crate::types::{Completion, CompletionRequest, Usage};

/// HTTP client for one provider account.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default, alias = "input_tokens")]
    prompt_tokens: Option<i32>,
    #[serde(default, alias = "output_tokens")]
    completion_tokens: Option<i32>,
    #[serde(default)]
    total_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Where the generated image can be found.
#[derive(Debug, PartialEq, Eq)]
enum ImagePayload {
    Bytes(Vec<u8>),
    Url(String),
}

impl OpenAiProvider {
    /// Create a provider client from configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.api_key.clone(),
        ))
    }

    /// Create a provider reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, returning a
    /// [`ProviderError::Api`] with the status and body text otherwise.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    async fn complete_json(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let body = chat_request_body(request);
        let response = self.post_json("/chat/completions", &body).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let completion = completion_from_response(parsed, &request.model)?;

        tracing::debug!(
            model = %completion.usage.model,
            total_tokens = ?completion.usage.total_tokens,
            "Chat completion received"
        );
        Ok(completion)
    }

    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        size: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let body = image_request_body(model, prompt, size);
        let response = self.post_json("/images/generations", &body).await?;
        let parsed: ImagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        match image_payload(parsed, model)? {
            ImagePayload::Bytes(bytes) => Ok(bytes),
            ImagePayload::Url(url) => {
                tracing::debug!(model, "Downloading generated image");
                self.download(&url).await
            }
        }
    }

    async fn synthesize_speech(
        &self,
        model: &str,
        voice: &str,
        text: &str,
        format: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let body = serde_json::json!({
            "model": model,
            "voice": voice,
            "input": text,
            "response_format": format,
        });
        let response = self.post_json("/audio/speech", &body).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::Empty(format!(
                "speech model '{model}' returned no audio"
            )));
        }
        Ok(bytes.to_vec())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

fn chat_request_body(request: &CompletionRequest) -> serde_json::Value {
    serde_json::json!({
        "model": request.model,
        "messages": [{ "role": "user", "content": request.prompt }],
        "temperature": request.temperature,
        "response_format": request.response_format.to_json(),
    })
}

fn completion_from_response(
    response: ChatResponse,
    requested_model: &str,
) -> Result<Completion, ProviderError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ProviderError::Empty("chat completion had no message content".into()))?;

    let usage = response.usage;
    Ok(Completion {
        text,
        usage: Usage {
            model: response
                .model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| requested_model.to_string()),
            input_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            output_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
            total_tokens: usage.as_ref().and_then(|u| u.total_tokens),
        },
    })
}

/// Only the DALL-E models accept `response_format`; gpt-image models always
/// return base64.
fn image_request_body(model: &str, prompt: &str, size: &str) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "prompt": prompt,
        "size": size,
        "n": 1,
    });
    if model.to_lowercase().starts_with("dall-e") {
        body["response_format"] = serde_json::Value::String("b64_json".into());
    }
    body
}

fn image_payload(response: ImagesResponse, model: &str) -> Result<ImagePayload, ProviderError> {
    let first = response.data.into_iter().next();
    if let Some(b64) = first
        .as_ref()
        .and_then(|d| d.b64_json.as_deref())
        .filter(|s| !s.is_empty())
    {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map_err(|e| ProviderError::Parse(format!("invalid base64 image: {e}")))?;
        return Ok(ImagePayload::Bytes(bytes));
    }
    if let Some(url) = first.and_then(|d| d.url).filter(|u| !u.is_empty()) {
        return Ok(ImagePayload::Url(url));
    }
    Err(ProviderError::Empty(format!(
        "Image API returned no data for model '{model}'"
    )))
}
