/// Provider configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Bearer key for the provider API.
    pub api_key: String,
    /// API root including the version segment (default: `https://api.openai.com/v1`).
    pub base_url: String,
    /// Chat model for stories (default: `gpt-4o-mini`).
    pub story_model: String,
    /// Chat model for learning packs (default: the story model).
    pub learning_model: String,
    /// Preferred image model (default: `dall-e-2`).
    pub image_model: String,
    /// Image models tried after `image_model`, in order.
    pub image_fallback_models: Vec<String>,
    /// Whether `gpt-image-*` models may be used (they need a verified org).
    pub allow_gpt_image: bool,
    /// Default image size (default: `512x512`).
    pub image_size: String,
    /// Speech model (default: `gpt-4o-mini-tts`).
    pub tts_model: String,
    /// Per-request timeout in seconds (default: `120`).
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                      |
    /// |-------------------------|------------------------------|
    /// | `OPENAI_API_KEY`        | (required)                   |
    /// | `OPENAI_BASE_URL`       | `https://api.openai.com/v1`  |
    /// | `STORY_MODEL`           | `gpt-4o-mini`                |
    /// | `LEARNING_MODEL`        | `STORY_MODEL`                |
    /// | `IMAGE_MODEL`           | `dall-e-2`                   |
    /// | `IMAGE_FALLBACK_MODELS` | (empty, comma-separated)     |
    /// | `ALLOW_GPT_IMAGE`       | `false`                      |
    /// | `IMAGE_SIZE`            | `512x512`                    |
    /// | `TTS_MODEL`             | `gpt-4o-mini-tts`            |
    /// | `PROVIDER_TIMEOUT_SECS` | `120`                        |
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into())
            .trim_end_matches('/')
            .to_string();

        let story_model = std::env::var("STORY_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let learning_model =
            std::env::var("LEARNING_MODEL").unwrap_or_else(|_| story_model.clone());

        let image_model = std::env::var("IMAGE_MODEL").unwrap_or_else(|_| "dall-e-2".into());
        let image_fallback_models =
            parse_model_list(&std::env::var("IMAGE_FALLBACK_MODELS").unwrap_or_default());
        let allow_gpt_image = parse_flag(&std::env::var("ALLOW_GPT_IMAGE").unwrap_or_default());

        let image_size = std::env::var("IMAGE_SIZE").unwrap_or_else(|_| "512x512".into());
        let tts_model = std::env::var("TTS_MODEL").unwrap_or_else(|_| "gpt-4o-mini-tts".into());

        let timeout_secs: u64 = std::env::var("PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("PROVIDER_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            base_url,
            story_model,
            learning_model,
            image_model,
            image_fallback_models,
            allow_gpt_image,
            image_size,
            tts_model,
            timeout_secs,
        }
        .with_image_policy()
    }

    /// Replace a disallowed `gpt-image-*` primary model with `dall-e-2` and
    /// drop disallowed fallbacks.
    pub fn with_image_policy(mut self) -> Self {
        if !self.allow_gpt_image {
            if is_gpt_image_model(&self.image_model) {
                tracing::warn!(
                    model = %self.image_model,
                    "gpt-image models not allowed, falling back to dall-e-2"
                );
                self.image_model = "dall-e-2".into();
            }
            self.image_fallback_models.retain(|m| !is_gpt_image_model(m));
        }
        self
    }
}

/// `gpt-image-*` models (case-insensitive).
pub fn is_gpt_image_model(model: &str) -> bool {
    model.trim().to_lowercase().starts_with("gpt-image-")
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
