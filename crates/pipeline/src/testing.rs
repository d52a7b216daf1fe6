//! Scripted provider used by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use storyteller_provider::{
    Completion, CompletionRequest, GenerationProvider, ProviderError, Usage,
};

/// One recorded image call: `(model, prompt, size)`.
pub type ImageCall = (String, String, String);

/// Replays queued results in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedProvider {
    completions: Mutex<VecDeque<Result<String, ProviderError>>>,
    images: Mutex<VecDeque<Result<Vec<u8>, ProviderError>>>,
    pub completion_requests: Mutex<Vec<CompletionRequest>>,
    pub image_calls: Mutex<Vec<ImageCall>>,
    pub speech_inputs: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn with_completions(items: Vec<Result<String, ProviderError>>) -> Self {
        let provider = Self::default();
        provider.completions.lock().unwrap().extend(items);
        provider
    }

    pub fn with_images(items: Vec<Result<Vec<u8>, ProviderError>>) -> Self {
        let provider = Self::default();
        provider.images.lock().unwrap().extend(items);
        provider
    }

    pub fn api_error(status: u16, body: &str) -> ProviderError {
        ProviderError::Api {
            status,
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn complete_json(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        self.completion_requests.lock().unwrap().push(request.clone());
        let next = self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Empty("script exhausted".into())));
        next.map(|text| Completion {
            text,
            usage: Usage {
                model: request.model.clone(),
                input_tokens: Some(10),
                output_tokens: Some(20),
                total_tokens: Some(30),
            },
        })
    }

    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        size: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.image_calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string(), size.to_string()));
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Empty("script exhausted".into())))
    }

    async fn synthesize_speech(
        &self,
        _model: &str,
        _voice: &str,
        text: &str,
        _format: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.speech_inputs.lock().unwrap().push(text.to_string());
        Ok(b"ID3audio".to_vec())
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
