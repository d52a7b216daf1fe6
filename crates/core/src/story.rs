//! Story domain types, age-group helpers, and section splitting.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default age group when a request does not specify one.
pub const DEFAULT_AGE_GROUP: &str = "3-5";

/// Default story language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default narrative style.
pub const DEFAULT_STYLE: &str = "default";

/// Default number of sections in a generated story.
pub const DEFAULT_SECTION_COUNT: u8 = 5;

/// Characters of section text reused for a fallback image prompt.
const FALLBACK_PROMPT_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle of a persisted story while media is being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoryStatus {
    Ready,
    GeneratingImages,
    GeneratingAudio,
}

impl StoryStatus {
    /// Database / wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::GeneratingImages => "generating-images",
            Self::GeneratingAudio => "generating-audio",
        }
    }

    /// Parse from the database value.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "ready" => Ok(Self::Ready),
            "generating-images" => Ok(Self::GeneratingImages),
            "generating-audio" => Ok(Self::GeneratingAudio),
            other => Err(CoreError::Validation(format!(
                "Unknown story status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// A generated section before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDraft {
    /// 1-based position within the story.
    pub id: i32,
    pub title: String,
    pub text: String,
    pub image_prompt: String,
}

impl SectionDraft {
    /// Build a section from bare text, deriving title and image prompt.
    pub fn from_text(id: i32, text: &str) -> Self {
        let text = text.trim().to_string();
        Self {
            id,
            title: default_section_title(id),
            image_prompt: fallback_image_prompt(&text),
            text,
        }
    }
}

/// `Section {n}`.
pub fn default_section_title(id: i32) -> String {
    format!("Section {id}")
}

/// Image prompt derived from the first characters of the section text.
pub fn fallback_image_prompt(text: &str) -> String {
    let head: String = text.chars().take(FALLBACK_PROMPT_CHARS).collect();
    format!("Kids book illustration of: {head}")
}

// ---------------------------------------------------------------------------
// Age groups
// ---------------------------------------------------------------------------

/// Writing guidance for an age group, used in generation prompts.
pub fn reading_level_for_age(age_group: &str) -> &'static str {
    match age_group.split_whitespace().next().unwrap_or_default() {
        "3-5" => "Very short sentences, lots of repetition, simple words, gentle plot.",
        "6-8" => "Short paragraphs, clear events, simple dialogue, friendly tone.",
        "9-12" => "Longer paragraphs, more detail and vocabulary, light suspense/conflict.",
        _ => "Simple, positive tone with age-appropriate vocabulary.",
    }
}

/// Map a child's age in years to an age group label.
pub fn age_to_group(age: i32) -> &'static str {
    if age <= 5 {
        "3-5"
    } else if age <= 8 {
        "6-8"
    } else {
        "9-12"
    }
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Split free text into sentences on `.`, `!` or `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(['.', '!', '?']) {
            sentences.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        sentences.push(current.join(" "));
    }
    sentences
}

/// Split free text into exactly `count` sections of roughly equal sentence
/// counts. Returns an empty list for blank text.
///
/// Short texts are padded by repeating the last chunk so callers always get
/// the section count they asked for.
pub fn split_into_sections(text: &str, count: usize) -> Vec<SectionDraft> {
    let count = count.max(1);
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Vec::new();
    }

    let size = sentences.len().div_ceil(count).max(1);
    let mut chunks: Vec<String> = sentences.chunks(size).map(|c| c.join(" ")).collect();

    while chunks.len() < count {
        let last = chunks.last().cloned().unwrap_or_default();
        chunks.push(last);
    }
    if chunks.len() > count {
        let tail = chunks.split_off(count - 1).join(" ");
        chunks.push(tail);
    }

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| SectionDraft::from_text(i as i32 + 1, chunk))
        .collect()
}
