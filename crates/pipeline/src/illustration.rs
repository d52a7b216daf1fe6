//! Illustration generation with an image-model fallback chain.

use storyteller_core::safety::{sanitize_image_prompt, SAFE_GENERIC_PROMPT};
use storyteller_provider::config::is_gpt_image_model;
use storyteller_provider::{GenerationProvider, ProviderConfig};

use crate::error::PipelineError;

/// Last-resort model appended to every candidate list.
pub const BASELINE_IMAGE_MODEL: &str = "dall-e-2";

/// Size used when the requested one is not valid for the model.
pub const DEFAULT_MODEL_SIZE: &str = "1024x1024";

const GPT_IMAGE_SIZES: &[&str] = &["1024x1024", "1024x1536", "1536x1024", "auto"];
const DALLE2_SIZES: &[&str] = &["256x256", "512x512", "1024x1024"];
const DALLE3_SIZES: &[&str] = &["1024x1024", "1792x1024", "1024x1792"];

/// Models to try, in order: the configured model, its fallbacks, then
/// [`BASELINE_IMAGE_MODEL`]. Duplicates are dropped and `gpt-image-*`
/// models are removed unless allowed.
pub fn image_model_candidates(config: &ProviderConfig) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    let all = std::iter::once(config.image_model.as_str())
        .chain(config.image_fallback_models.iter().map(String::as_str))
        .chain(std::iter::once(BASELINE_IMAGE_MODEL));

    for model in all {
        let model = model.trim();
        if model.is_empty() || models.iter().any(|m| m == model) {
            continue;
        }
        if !config.allow_gpt_image && is_gpt_image_model(model) {
            continue;
        }
        models.push(model.to_string());
    }
    models
}

/// Clamp `size` to what `model` accepts.
pub fn normalize_image_size(model: &str, size: &str) -> String {
    let size = size.trim().to_lowercase();
    let model = model.trim().to_lowercase();

    let allowed = if model.starts_with("gpt-image-") {
        GPT_IMAGE_SIZES
    } else if model == "dall-e-2" {
        DALLE2_SIZES
    } else if model == "dall-e-3" {
        DALLE3_SIZES
    } else if size.is_empty() {
        return DEFAULT_MODEL_SIZE.to_string();
    } else {
        return size;
    };

    if allowed.contains(&size.as_str()) {
        size
    } else {
        DEFAULT_MODEL_SIZE.to_string()
    }
}

/// Append the optional visual style: `"{prompt}. Style: {style}."`.
pub fn styled_prompt(prompt: &str, style: Option<&str>) -> String {
    match style.map(str::trim) {
        Some(style) if !style.is_empty() => format!("{prompt}. Style: {style}."),
        _ => prompt.to_string(),
    }
}

/// Generate one illustration for `prompt`.
///
/// The prompt is sanitized first. A model that needs organization
/// verification is skipped; a content-policy rejection is retried once on
/// the same model with [`SAFE_GENERIC_PROMPT`].
pub async fn generate_illustration(
    provider: &dyn GenerationProvider,
    config: &ProviderConfig,
    prompt: &str,
    size: &str,
) -> Result<Vec<u8>, PipelineError> {
    let safe_prompt = sanitize_image_prompt(prompt);
    let mut last_error: Option<String> = None;

    for model in image_model_candidates(config) {
        let model_size = normalize_image_size(&model, size);

        let err = match provider.generate_image(&model, &safe_prompt, &model_size).await {
            Ok(bytes) => {
                tracing::debug!(model = %model, size = %model_size, bytes = bytes.len(), "Image generated");
                return Ok(bytes);
            }
            Err(e) => e,
        };

        if err.is_verification_required() {
            tracing::warn!(model = %model, "Image model requires verification, trying next");
            last_error.get_or_insert_with(|| err.to_string());
            continue;
        }

        if err.is_content_policy_violation() {
            tracing::warn!(model = %model, "Image prompt rejected, retrying with generic prompt");
            match provider
                .generate_image(&model, SAFE_GENERIC_PROMPT, &model_size)
                .await
            {
                Ok(bytes) => return Ok(bytes),
                Err(retry_err) => {
                    last_error = Some(retry_err.to_string());
                    continue;
                }
            }
        }

        tracing::warn!(model = %model, error = %err, "Image generation failed");
        last_error = Some(err.to_string());
    }

    Err(PipelineError::Image(
        last_error.unwrap_or_else(|| "no image models available".into()),
    ))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::testing::ScriptedProvider;

    fn config(model: &str, fallbacks: &[&str], allow: bool) -> ProviderConfig {
        ProviderConfig {
            api_key: "k".into(),
            base_url: "http://localhost".into(),
            story_model: "gpt-4o-mini".into(),
            learning_model: "gpt-4o-mini".into(),
            image_model: model.into(),
            image_fallback_models: fallbacks.iter().map(|s| s.to_string()).collect(),
            allow_gpt_image: allow,
            image_size: "512x512".into(),
            tts_model: "gpt-4o-mini-tts".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn candidates_are_deduplicated_with_baseline_last() {
        let cfg = config("dall-e-3", &["dall-e-2", "dall-e-3"], false);
        assert_eq!(image_model_candidates(&cfg), vec!["dall-e-3", "dall-e-2"]);
    }

    #[test]
    fn gpt_image_candidates_need_permission() {
        let denied = config("gpt-image-1", &["gpt-image-1-mini"], false);
        assert_eq!(image_model_candidates(&denied), vec!["dall-e-2"]);

        let allowed = config("gpt-image-1", &[], true);
        assert_eq!(image_model_candidates(&allowed), vec!["gpt-image-1", "dall-e-2"]);
    }

    #[test]
    fn sizes_are_clamped_per_model() {
        assert_eq!(normalize_image_size("dall-e-2", "512x512"), "512x512");
        assert_eq!(normalize_image_size("dall-e-2", "1792x1024"), "1024x1024");
        assert_eq!(normalize_image_size("dall-e-3", "1792x1024"), "1792x1024");
        assert_eq!(normalize_image_size("dall-e-3", "512x512"), "1024x1024");
        assert_eq!(normalize_image_size("gpt-image-1", "AUTO"), "auto");
        assert_eq!(normalize_image_size("gpt-image-1", "256x256"), "1024x1024");
        assert_eq!(normalize_image_size("other", "640x480"), "640x480");
        assert_eq!(normalize_image_size("other", " "), "1024x1024");
    }

    #[test]
    fn style_suffix() {
        assert_eq!(styled_prompt("An owl", Some("watercolor")), "An owl. Style: watercolor.");
        assert_eq!(styled_prompt("An owl", Some("  ")), "An owl");
        assert_eq!(styled_prompt("An owl", None), "An owl");
    }

    #[tokio::test]
    async fn first_model_success_uses_sanitized_prompt() {
        let provider = ScriptedProvider::with_images(vec![Ok(vec![1, 2, 3])]);
        let cfg = config("dall-e-2", &[], false);

        let bytes = generate_illustration(&provider, &cfg, "An owl with a knife", "512x512")
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        let calls = provider.image_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "dall-e-2");
        assert!(!calls[0].1.to_lowercase().contains("knife"));
        assert!(calls[0].1.contains("Children's book illustration"));
        assert_eq!(calls[0].2, "512x512");
    }

    #[tokio::test]
    async fn verification_error_moves_to_next_model() {
        let provider = ScriptedProvider::with_images(vec![
            Err(ScriptedProvider::api_error(403, "Your organization must verify")),
            Ok(vec![9]),
        ]);
        let cfg = config("dall-e-3", &[], false);

        let bytes = generate_illustration(&provider, &cfg, "A fox", "512x512").await.unwrap();
        assert_eq!(bytes, vec![9]);

        let calls = provider.image_calls.lock().unwrap();
        assert_eq!(calls[0].0, "dall-e-3");
        assert_eq!(calls[0].2, "1024x1024");
        assert_eq!(calls[1].0, "dall-e-2");
        assert_eq!(calls[1].2, "512x512");
    }

    #[tokio::test]
    async fn content_policy_retries_with_generic_prompt() {
        let provider = ScriptedProvider::with_images(vec![
            Err(ScriptedProvider::api_error(400, "content_policy_violation")),
            Ok(vec![7]),
        ]);
        let cfg = config("dall-e-2", &[], false);

        let bytes = generate_illustration(&provider, &cfg, "A fox", "512x512").await.unwrap();
        assert_eq!(bytes, vec![7]);

        let calls = provider.image_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "dall-e-2");
        assert_eq!(calls[1].1, SAFE_GENERIC_PROMPT);
    }

    #[tokio::test]
    async fn all_models_failing_reports_last_error() {
        let provider = ScriptedProvider::with_images(vec![
            Err(ScriptedProvider::api_error(500, "first")),
            Err(ScriptedProvider::api_error(500, "second")),
        ]);
        let cfg = config("dall-e-3", &[], false);

        let err = generate_illustration(&provider, &cfg, "A fox", "512x512")
            .await
            .unwrap_err();
        assert_matches!(&err, PipelineError::Image(msg) if msg.contains("second"));
        assert!(err
            .to_string()
            .starts_with("Image generation returned empty result. "));
    }
}
