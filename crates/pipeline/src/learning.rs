//! Learning-pack generation.

use storyteller_core::learning::{normalize_learning, trim_story_text, LearningPack, LEARNING_TEXT_LIMIT};
use storyteller_provider::{CompletionRequest, GenerationProvider, ResponseFormat};

use crate::error::PipelineError;
use crate::story::parse_json_lenient;

const LEARNING_SCHEMA_NAME: &str = "LearningPack";
const LEARNING_TEMPERATURE: f32 = 0.4;

/// Story metadata and text the pack is built from.
#[derive(Debug, Clone)]
pub struct LearningRequest {
    pub title: String,
    pub age_group: String,
    pub language: String,
    pub style: String,
    pub story_text: String,
}

/// Join section texts the way they are presented to the model.
pub fn join_section_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts
        .into_iter()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_learning_prompt(request: &LearningRequest) -> String {
    let trimmed = trim_story_text(&request.story_text, LEARNING_TEXT_LIMIT);
    format!(
        "You are a child-friendly educator. Create a learning pack for a short story.\n\
         Story title: {title}\n\
         Reader age: {age}\n\
         Language: {language}\n\
         Style: {style}\n\n\
         Return:\n\
         - A 2-3 sentence summary.\n\
         - 3-5 comprehension questions with short answers.\n\
         - 3-6 vocabulary words with kid-friendly definitions and simple examples.\n\
         Keep everything age-appropriate and gentle.\n\n\
         STORY TEXT:\n\
         {trimmed}\n\n\
         OUTPUT FORMAT: Return ONLY valid JSON that matches the provided JSON schema.",
        title = request.title,
        age = request.age_group,
        language = request.language,
        style = request.style,
    )
}

pub fn learning_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "summary": { "type": "string" },
            "questions": {
                "type": "array",
                "minItems": 3,
                "maxItems": 5,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "question": { "type": "string" },
                        "answer": { "type": "string" }
                    },
                    "required": ["question", "answer"]
                }
            },
            "vocabulary": {
                "type": "array",
                "minItems": 3,
                "maxItems": 8,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "word": { "type": "string" },
                        "definition": { "type": "string" },
                        "example": { "type": "string" }
                    },
                    "required": ["word", "definition", "example"]
                }
            }
        },
        "required": ["summary", "questions", "vocabulary"]
    })
}

/// Ask the model for a learning pack: schema first, then plain JSON.
pub async fn generate_learning_pack(
    provider: &dyn GenerationProvider,
    model: &str,
    request: &LearningRequest,
) -> Result<LearningPack, PipelineError> {
    let prompt = build_learning_prompt(request);
    let formats = [
        ResponseFormat::JsonSchema {
            name: LEARNING_SCHEMA_NAME.into(),
            schema: learning_schema(),
        },
        ResponseFormat::JsonObject,
    ];

    let mut last_error = String::from("unknown error");
    for (attempt, response_format) in formats.into_iter().enumerate() {
        let completion_request = CompletionRequest {
            model: model.to_string(),
            prompt: prompt.clone(),
            temperature: LEARNING_TEMPERATURE,
            response_format,
        };

        let result = match provider.complete_json(&completion_request).await {
            Ok(completion) => match parse_json_lenient(&completion.text) {
                Ok(value) if value.is_object() => Ok(normalize_learning(&value)),
                Ok(_) => Err("Model returned non-object JSON.".to_string()),
                Err(e) => Err(format!("Model returned invalid JSON: {e}")),
            },
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(pack) => {
                tracing::info!(
                    attempt = attempt + 1,
                    questions = pack.questions.len(),
                    vocabulary = pack.vocabulary.len(),
                    "Learning pack generated"
                );
                return Ok(pack);
            }
            Err(e) => {
                tracing::warn!(attempt = attempt + 1, error = %e, "Learning pack attempt failed");
                last_error = e;
            }
        }
    }

    Err(PipelineError::Learning(last_error))
}
