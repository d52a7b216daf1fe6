//! Heuristic safety and readability report for a generated story.
//!
//! Metrics are the textbook word/sentence counts and the Flesch-Kincaid
//! grade level; flags come from the keyword scans in [`crate::safety`].
//! The report is advisory only and says so in its `notes`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::safety::{scan_image_prompts, scan_story_text};
use crate::types::{DbId, Timestamp};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9']+").expect("valid regex"));

static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

/// Disclaimers attached to every report.
pub const REPORT_NOTES: &[&str] = &[
    "Heuristic report only; not a safety guarantee.",
    "For maximum safety, enable provider moderation and review outputs.",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Story-level fields echoed into the report.
#[derive(Debug, Clone)]
pub struct ReportMeta<'a> {
    pub story_id: DbId,
    pub title: &'a str,
    pub age_group: &'a str,
    pub language: &'a str,
    pub style: &'a str,
}

/// The text content of one section as seen by the report.
#[derive(Debug, Clone, Copy)]
pub struct SectionContent<'a> {
    pub text: &'a str,
    pub image_prompt: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityMetrics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_sentence_words: Option<f64>,
    /// Only computed for English stories.
    pub flesch_kincaid_grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlags {
    pub blocked_terms_in_story: Vec<String>,
    pub blocked_terms_in_image_prompts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryReport {
    pub story_id: DbId,
    pub title: String,
    pub age_group: String,
    pub language: String,
    pub style: String,
    pub generated_at: Timestamp,
    pub metrics: ReadabilityMetrics,
    pub flags: SafetyFlags,
    pub notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Compute the report for a story from its sections.
pub fn build_story_report<'a>(
    meta: &ReportMeta<'_>,
    sections: impl IntoIterator<Item = SectionContent<'a>>,
) -> StoryReport {
    let sections: Vec<SectionContent<'a>> = sections.into_iter().collect();
    let story_text = sections
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n");
    let image_prompts = sections
        .iter()
        .map(|s| s.image_prompt.trim())
        .collect::<Vec<_>>()
        .join("\n");

    let word_count = word_count(&story_text);
    let sentence_count = sentence_count(&story_text);
    let avg_sentence_words =
        (sentence_count > 0).then(|| word_count as f64 / sentence_count as f64);
    let flesch_kincaid_grade = if is_english(meta.language) {
        flesch_kincaid_grade(&story_text)
    } else {
        None
    };

    StoryReport {
        story_id: meta.story_id,
        title: meta.title.to_string(),
        age_group: meta.age_group.to_string(),
        language: meta.language.to_string(),
        style: meta.style.to_string(),
        generated_at: chrono::Utc::now(),
        metrics: ReadabilityMetrics {
            word_count,
            sentence_count,
            avg_sentence_words,
            flesch_kincaid_grade,
        },
        flags: SafetyFlags {
            blocked_terms_in_story: scan_story_text(&story_text),
            blocked_terms_in_image_prompts: scan_image_prompts(&image_prompts),
        },
        notes: REPORT_NOTES.iter().map(|n| n.to_string()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Whether the readability formula applies. Blank defaults to English.
pub fn is_english(language: &str) -> bool {
    let lang = language.trim().to_lowercase();
    lang.is_empty() || lang.starts_with("en")
}

pub fn word_count(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

pub fn sentence_count(text: &str) -> usize {
    SENTENCE_END_RE
        .split(text.trim())
        .filter(|chunk| !chunk.trim().is_empty())
        .count()
}

/// Vowel-group syllable estimate with a silent-`e` adjustment. Minimum 1
/// for any word containing letters, 0 otherwise.
pub fn syllable_count(word: &str) -> usize {
    let letters: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    if letters.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut prev_vowel = false;
    for ch in &letters {
        let is_vowel = "aeiouy".contains(*ch);
        if is_vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = is_vowel;
    }
    if letters.last() == Some(&'e') && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Flesch-Kincaid grade level rounded to two decimals.
pub fn flesch_kincaid_grade(text: &str) -> Option<f64> {
    let words: Vec<&str> = WORD_RE.find_iter(text).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return None;
    }
    let sentences = sentence_count(text);
    if sentences == 0 {
        return None;
    }
    let syllables: usize = words.iter().map(|w| syllable_count(w)).sum();
    let word_count = words.len() as f64;
    let grade = 0.39 * (word_count / sentences as f64) + 11.8 * (syllables as f64 / word_count)
        - 15.59;
    Some((grade * 100.0).round() / 100.0)
}
