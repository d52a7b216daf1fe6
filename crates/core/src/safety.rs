//! Keyword blocklists and kid-safety checks.
//!
//! Term matching is case-insensitive and word-bounded. Multi-word terms such
//! as `"bathing suit"` match any run of whitespace between their words.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Term lists
// ---------------------------------------------------------------------------

/// Story-text blocklist, grouped by category.
pub const STORY_BLOCKLIST: &[(&str, &[&str])] = &[
    (
        "violence",
        &["kill", "murder", "blood", "weapon", "gun", "knife", "gore"],
    ),
    (
        "adult",
        &["alcohol", "drugs", "sex", "nude", "nudity", "bra", "bikini"],
    ),
];

/// Terms stripped from image prompts and flagged in reports.
pub const IMAGE_TERMS: &[&str] = &[
    "nude",
    "nudity",
    "naked",
    "lingerie",
    "bikini",
    "swimsuit",
    "swimwear",
    "bathing suit",
    "bra",
    "underwear",
    "cleavage",
    "sexy",
    "erotic",
    "porn",
    "blood",
    "gore",
    "weapon",
    "gun",
    "knife",
    "kill",
    "murder",
    "alcohol",
    "drug",
    "drugs",
    "smoking",
    "cigarette",
];

/// Appended to every image prompt before it reaches the provider.
pub const SAFE_IMAGE_SUFFIX: &str = "Children's book illustration. Family-friendly, gentle, and wholesome. \
     Fully clothed characters, modest outfits, and a cheerful tone. \
     No adult themes, no graphic content, no weapons, no substances. \
     Non-photorealistic, cartoon or watercolor style.";

/// Substitute prompt used when the provider rejects a prompt on policy grounds.
pub const SAFE_GENERIC_PROMPT: &str = "A cheerful children's book illustration of friendly animal characters \
     wearing colorful clothes, playing in a sunny garden. Soft watercolor style. No text.";

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// A compiled set of word-bounded, case-insensitive term patterns.
pub struct TermMatcher {
    patterns: Vec<(String, Regex)>,
}

impl TermMatcher {
    /// Compile a matcher from a list of terms. Blank terms are skipped.
    pub fn new<'a>(terms: impl IntoIterator<Item = &'a str>) -> Self {
        let patterns = terms
            .into_iter()
            .filter_map(|term| {
                let pattern = term_pattern(term)?;
                let re = Regex::new(&pattern).ok()?;
                Some((term.trim().to_lowercase(), re))
            })
            .collect();
        Self { patterns }
    }

    /// Return the sorted, de-duplicated lowercase terms found in `text`.
    pub fn scan(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<String> = self
            .patterns
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(term, _)| term.clone())
            .collect();
        hits.sort();
        hits.dedup();
        hits
    }

    /// Remove every occurrence of every term from `text`.
    pub fn strip(&self, text: &str) -> String {
        self.patterns
            .iter()
            .fold(text.to_string(), |acc, (_, re)| re.replace_all(&acc, "").into_owned())
    }
}

/// Build the regex source for a single term, or `None` for a blank term.
fn term_pattern(term: &str) -> Option<String> {
    let parts: Vec<String> = term.split_whitespace().map(regex::escape).collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!(r"(?i)\b{}\b", parts.join(r"\s+")))
}

static STORY_MATCHER: LazyLock<TermMatcher> = LazyLock::new(|| {
    TermMatcher::new(
        STORY_BLOCKLIST
            .iter()
            .flat_map(|(_, terms)| terms.iter().copied()),
    )
});

static IMAGE_MATCHER: LazyLock<TermMatcher> =
    LazyLock::new(|| TermMatcher::new(IMAGE_TERMS.iter().copied()));

// ---------------------------------------------------------------------------
// Public helpers
// ---------------------------------------------------------------------------

/// Scan story text against the story blocklist.
pub fn scan_story_text(text: &str) -> Vec<String> {
    STORY_MATCHER.scan(text)
}

/// Scan image prompts against the image-term list.
pub fn scan_image_prompts(text: &str) -> Vec<String> {
    IMAGE_MATCHER.scan(text)
}

/// Reject a story prompt that contains any blocklisted term.
pub fn check_prompt(prompt: &str) -> Result<(), CoreError> {
    let hits = scan_story_text(prompt);
    if hits.is_empty() {
        return Ok(());
    }
    Err(CoreError::Validation(format!(
        "Your prompt includes content not suitable for kids: {}. Please rephrase.",
        hits.join(", ")
    )))
}

/// Strip unsafe terms from an image prompt and append the kid-safe suffix.
pub fn sanitize_image_prompt(prompt: &str) -> String {
    let stripped = IMAGE_MATCHER.strip(prompt);
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{collapsed}. {SAFE_IMAGE_SUFFIX}")
}
