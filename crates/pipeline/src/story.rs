//! Story generation: prompt, schema, and normalization of model output.
//!
//! Two attempts are made: a strict JSON-schema request at temperature 0.7,
//! then a plain JSON-object request at 0.3. Whatever comes back is parsed
//! leniently and forced into exactly the requested number of sections.

use serde_json::{Map, Value};
use storyteller_core::story::{
    default_section_title, fallback_image_prompt, reading_level_for_age, split_into_sections,
    SectionDraft,
};
use storyteller_provider::{CompletionRequest, GenerationProvider, ResponseFormat, Usage};

use crate::error::PipelineError;

/// Title used when the model omits one.
pub const UNTITLED_STORY: &str = "Untitled Story";

/// Schema name sent with the structured-output request.
const STORY_SCHEMA_NAME: &str = "Story";

const SECTION_LIST_KEYS: &[&str] = &["sections", "chapters", "pages", "parts"];
const FALLBACK_TEXT_KEYS: &[&str] = &["text", "story", "content", "output", "body"];
const SECTION_TEXT_KEYS: &[&str] = &["text", "content", "story", "body"];
const NESTED_TEXT_KEYS: &[&str] = &["text", "content", "story"];
const IMAGE_PROMPT_KEYS: &[&str] = &["image_prompt", "imagePrompt", "illustration_prompt", "prompt"];
const TITLE_KEYS: &[&str] = &["title", "heading", "name"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The child a story is written for.
#[derive(Debug, Clone)]
pub struct ChildPersona {
    pub name: String,
    pub age: i32,
    pub interests: String,
}

/// Validated input for one story generation.
#[derive(Debug, Clone)]
pub struct StoryRequest {
    pub prompt: String,
    pub age_group: String,
    pub language: String,
    pub style: String,
    pub sections: u8,
    pub title_hint: Option<String>,
    pub child: Option<ChildPersona>,
}

/// A normalized story as returned by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedStory {
    pub title: String,
    pub sections: Vec<SectionDraft>,
    pub usage: Usage,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate a story with `request.sections` sections.
pub async fn generate_story(
    provider: &dyn GenerationProvider,
    model: &str,
    request: &StoryRequest,
) -> Result<GeneratedStory, PipelineError> {
    let prompt = build_story_prompt(request);
    let count = usize::from(request.sections.max(1));

    let attempts = [
        (
            ResponseFormat::JsonSchema {
                name: STORY_SCHEMA_NAME.into(),
                schema: story_schema(count),
            },
            0.7,
        ),
        (ResponseFormat::JsonObject, 0.3),
    ];

    let mut last_error = String::from("unknown error");
    for (attempt, (response_format, temperature)) in attempts.into_iter().enumerate() {
        let completion_request = CompletionRequest {
            model: model.to_string(),
            prompt: prompt.clone(),
            temperature,
            response_format,
        };

        let result = match provider.complete_json(&completion_request).await {
            Ok(completion) => normalize_completion(&completion.text, count).map(|(title, sections)| {
                GeneratedStory {
                    title,
                    sections,
                    usage: completion.usage,
                }
            }),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(story) => {
                tracing::info!(
                    provider = provider.provider_name(),
                    attempt = attempt + 1,
                    sections = story.sections.len(),
                    "Story generated"
                );
                return Ok(story);
            }
            Err(e) => {
                tracing::warn!(attempt = attempt + 1, error = %e, "Story attempt failed");
                last_error = e;
            }
        }
    }

    Err(PipelineError::Story(last_error))
}

fn normalize_completion(text: &str, count: usize) -> Result<(String, Vec<SectionDraft>), String> {
    let value = parse_json_lenient(text).map_err(|e| format!("Model returned invalid JSON: {e}"))?;
    normalize_story(&value, text, count)
}

/// Build the generation prompt.
pub fn build_story_prompt(request: &StoryRequest) -> String {
    let title_line = match request.title_hint.as_deref().map(str::trim) {
        Some(hint) if !hint.is_empty() => format!("Title hint: {hint}\n"),
        _ => String::new(),
    };
    let child_line = match &request.child {
        Some(child) => format!(
            "Main character: {}, age {}, who loves {}.\n",
            child.name.trim(),
            child.age,
            child.interests.trim()
        ),
        None => String::new(),
    };

    format!(
        "You are a children's story generator.\n\n\
         Target language: {language}\n\
         Target reader age: {age}\n\
         Reading level: {level}\n\
         Narrative style/tone: {style}\n\
         Number of sections/pages: {count}\n\n\
         {title_line}{child_line}\
         CONTENT GUIDELINES:\n\
         - Keep vocabulary appropriate for the target age.\n\
         - Make each section self-contained and ~3-6 sentences.\n\
         - Add a few more concrete details in each section while staying age-appropriate.\n\
         - Gently educational, warm and engaging.\n\
         - Avoid violence, weapons, blood, alcohol, drugs, or any adult themes.\n\
         - Give each section a short title.\n\
         - For each section include an 'image_prompt' that describes a single coherent scene \
         in a kids-book illustration style (no text overlays), concise but specific.\n\
         - Image prompts must be kid-safe and fully clothed, no nudity or sexual content.\n\n\
         STORY IDEA / USER PROMPT:\n\
         {prompt}\n\n\
         OUTPUT FORMAT:\n\
         Return ONLY valid JSON that matches the provided JSON Schema. Do not include explanations.",
        language = request.language,
        age = request.age_group,
        level = reading_level_for_age(&request.age_group),
        style = request.style,
        count = request.sections,
        prompt = request.prompt,
    )
}

/// JSON schema requiring a title and exactly `count` sections.
pub fn story_schema(count: usize) -> Value {
    serde_json::json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "title": { "type": "string" },
            "sections": {
                "type": "array",
                "minItems": count,
                "maxItems": count,
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "id": { "type": "integer" },
                        "title": { "type": "string" },
                        "text": { "type": "string" },
                        "image_prompt": { "type": "string" }
                    },
                    "required": ["id", "text", "image_prompt"]
                }
            }
        },
        "required": ["title", "sections"]
    })
}

// ---------------------------------------------------------------------------
// Parsing and normalization
// ---------------------------------------------------------------------------

/// Parse JSON, falling back to the outermost `{...}` span when the model
/// wrapped its answer in prose or code fences.
pub fn parse_json_lenient(raw: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(raw) {
        Ok(value) => Ok(value),
        Err(err) => match (raw.find('{'), raw.rfind('}')) {
            (Some(start), Some(end)) if end > start => serde_json::from_str(&raw[start..=end]),
            _ => Err(err),
        },
    }
}

/// Normalize model output into a title and exactly `count` sections with
/// ids `1..=count`.
///
/// `raw_text` is split into sections when the JSON carries no usable
/// section list.
pub fn normalize_story(
    data: &Value,
    raw_text: &str,
    count: usize,
) -> Result<(String, Vec<SectionDraft>), String> {
    let count = count.max(1);

    let (title, items) = match data {
        Value::Object(obj) => {
            let title = non_blank_str(obj, &["title"])
                .unwrap_or(UNTITLED_STORY)
                .to_string();
            (title, find_section_list(obj))
        }
        Value::Array(items) if !items.is_empty() => {
            (UNTITLED_STORY.to_string(), Some(items.clone()))
        }
        _ => return Err("Model returned non-object JSON.".into()),
    };

    let mut sections = match items {
        Some(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| normalize_section(i as i32 + 1, item))
            .collect::<Result<Vec<_>, _>>()?,
        None => {
            let fallback = match data {
                Value::Object(obj) => non_blank_str(obj, FALLBACK_TEXT_KEYS).unwrap_or(raw_text),
                _ => raw_text,
            };
            split_into_sections(fallback, count)
        }
    };

    if sections.is_empty() {
        return Err("Model JSON sections must be a non-empty list.".into());
    }

    if sections.len() != count {
        let combined = sections
            .iter()
            .map(|s| s.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        sections = split_into_sections(&combined, count);
        if sections.is_empty() {
            return Err("Model JSON sections missing text.".into());
        }
    }

    for (i, section) in sections.iter_mut().enumerate() {
        section.id = i as i32 + 1;
    }

    Ok((title, sections))
}

/// Locate the section list: a `story` block first (list, or object holding
/// a list or a `content` string), then the top-level keys.
fn find_section_list(obj: &Map<String, Value>) -> Option<Vec<Value>> {
    match obj.get("story") {
        Some(Value::Array(items)) if !items.is_empty() => return Some(items.clone()),
        Some(Value::Object(block)) => {
            if let Some(items) = first_non_empty_list(block, SECTION_LIST_KEYS) {
                return Some(items.clone());
            }
            if let Some(content) = non_blank_str(block, &["content"]) {
                return Some(vec![Value::String(content.to_string())]);
            }
        }
        _ => {}
    }
    first_non_empty_list(obj, SECTION_LIST_KEYS).cloned()
}

fn normalize_section(id: i32, item: &Value) -> Result<SectionDraft, String> {
    let obj = match item {
        Value::String(text) => return Ok(SectionDraft::from_text(id, text)),
        Value::Object(obj) => obj,
        _ => return Err("Model JSON sections must be objects or strings.".into()),
    };

    let mut text = non_blank_str(obj, SECTION_TEXT_KEYS)
        .ok_or_else(|| "Model JSON sections missing text.".to_string())?
        .to_string();

    if text.starts_with('{') || text.starts_with('[') {
        if let Some(combined) = combine_nested_text(&text) {
            text = combined;
        }
    }

    let image_prompt = non_blank_str(obj, IMAGE_PROMPT_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_image_prompt(&text));
    let title = non_blank_str(obj, TITLE_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| default_section_title(id));

    Ok(SectionDraft {
        id,
        title,
        text,
        image_prompt,
    })
}

/// Some models nest a whole story object inside a section's `text`.
fn combine_nested_text(text: &str) -> Option<String> {
    let nested = parse_json_lenient(text).ok()?;
    let obj = nested.as_object()?;
    let mut keys = SECTION_LIST_KEYS.to_vec();
    keys.push("story");
    let items = first_non_empty_list(obj, &keys)?;

    let combined = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(o) => non_blank_str(o, NESTED_TEXT_KEYS),
            Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ");

    (!combined.is_empty()).then_some(combined)
}

fn first_non_empty_list<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    })
}

/// First value under `keys` that is a non-blank string, trimmed.
fn non_blank_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}
