//! Input validation for account, child-profile, story, and media requests.
//!
//! Every function returns [`CoreError::Validation`] with a human-readable
//! message so handlers can surface it as a 400 response unchanged.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const MIN_EMAIL_LENGTH: usize = 5;
pub const MAX_EMAIL_LENGTH: usize = 120;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 200;

pub const MIN_CHILD_AGE: i32 = 2;
pub const MAX_CHILD_AGE: i32 = 12;
pub const MAX_CHILD_NAME_LENGTH: usize = 80;
pub const MIN_INTERESTS_LENGTH: usize = 2;
pub const MAX_INTERESTS_LENGTH: usize = 200;

pub const MIN_STORY_PROMPT_LENGTH: usize = 3;
pub const MAX_STORY_PROMPT_LENGTH: usize = 400;
pub const MIN_LANGUAGE_LENGTH: usize = 2;
pub const MAX_LANGUAGE_LENGTH: usize = 10;
pub const MAX_STYLE_LENGTH: usize = 60;
pub const MAX_AGE_GROUP_LENGTH: usize = 40;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MIN_SECTIONS: u8 = 1;
pub const MAX_SECTIONS: u8 = 10;

pub const MIN_IMAGE_PROMPT_LENGTH: usize = 3;
pub const MAX_IMAGE_PROMPT_LENGTH: usize = 800;
pub const MAX_IMAGE_STYLE_LENGTH: usize = 40;
pub const MAX_VOICE_LENGTH: usize = 40;

pub const MAX_SUMMARY_LENGTH: usize = 2000;
pub const MAX_QA_LENGTH: usize = 400;
pub const MAX_WORD_LENGTH: usize = 80;

/// Longest lifetime a share link may be given, in days.
pub const MAX_SHARE_DAYS: i64 = 3650;

/// Audio container formats accepted for narration.
pub const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "aac", "flac", "opus"];

static IMAGE_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(auto|\d{2,4}x\d{2,4})$").expect("valid regex"));

static VOICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), CoreError> {
    let len = char_len(value);
    if len < min || len > max {
        return Err(CoreError::Validation(format!(
            "{field} must be between {min} and {max} characters (got {len})"
        )));
    }
    Ok(())
}

fn check_max(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let len = char_len(value);
    if len > max {
        return Err(CoreError::Validation(format!(
            "{field} exceeds maximum length of {max} characters (got {len})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Trim and lowercase an email address, then validate it.
///
/// Returns the normalized address.
pub fn normalize_email(email: &str) -> Result<String, CoreError> {
    let email = email.trim().to_lowercase();
    check_length("Email", &email, MIN_EMAIL_LENGTH, MAX_EMAIL_LENGTH)?;
    if !email.contains('@') {
        return Err(CoreError::Validation("Please enter a valid email.".into()));
    }
    Ok(email)
}

/// Validate password length.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    check_length("Password", password, MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH)
}

// ---------------------------------------------------------------------------
// Child profiles
// ---------------------------------------------------------------------------

/// Validate a child's name, returning it trimmed.
pub fn validate_child_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Child name is required.".into()));
    }
    check_max("Child name", name, MAX_CHILD_NAME_LENGTH)?;
    Ok(name.to_string())
}

/// Validate a child's age in years.
pub fn validate_child_age(age: i32) -> Result<(), CoreError> {
    if !(MIN_CHILD_AGE..=MAX_CHILD_AGE).contains(&age) {
        return Err(CoreError::Validation(format!(
            "Age must be between {MIN_CHILD_AGE} and {MAX_CHILD_AGE}."
        )));
    }
    Ok(())
}

/// Validate a child's interests, returning them trimmed.
pub fn validate_interests(interests: &str) -> Result<String, CoreError> {
    let interests = interests.trim();
    if interests.is_empty() {
        return Err(CoreError::Validation("Interests are required.".into()));
    }
    check_length(
        "Interests",
        interests,
        MIN_INTERESTS_LENGTH,
        MAX_INTERESTS_LENGTH,
    )?;
    Ok(interests.to_string())
}

// ---------------------------------------------------------------------------
// Stories
// ---------------------------------------------------------------------------

pub fn validate_story_prompt(prompt: &str) -> Result<(), CoreError> {
    check_length(
        "Prompt",
        prompt,
        MIN_STORY_PROMPT_LENGTH,
        MAX_STORY_PROMPT_LENGTH,
    )
}

pub fn validate_language(language: &str) -> Result<(), CoreError> {
    check_length(
        "Language",
        language,
        MIN_LANGUAGE_LENGTH,
        MAX_LANGUAGE_LENGTH,
    )
}

pub fn validate_style(style: &str) -> Result<(), CoreError> {
    check_max("Style", style, MAX_STYLE_LENGTH)
}

pub fn validate_age_group(age_group: &str) -> Result<(), CoreError> {
    if age_group.trim().is_empty() {
        return Err(CoreError::Validation("Age group is required.".into()));
    }
    check_max("Age group", age_group, MAX_AGE_GROUP_LENGTH)
}

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    check_max("Title", title, MAX_TITLE_LENGTH)
}

pub fn validate_section_count(sections: u8) -> Result<(), CoreError> {
    if !(MIN_SECTIONS..=MAX_SECTIONS).contains(&sections) {
        return Err(CoreError::Validation(format!(
            "Sections must be between {MIN_SECTIONS} and {MAX_SECTIONS} (got {sections})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// Validate an image size: `auto` or `WIDTHxHEIGHT` with 2-4 digit sides.
pub fn validate_image_size(size: &str) -> Result<(), CoreError> {
    if IMAGE_SIZE_RE.is_match(size) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid image size '{size}'. Expected 'auto' or WIDTHxHEIGHT"
        )))
    }
}

/// Trim and lowercase an image size, then validate it.
///
/// Returns the normalized size.
pub fn normalize_image_size(size: &str) -> Result<String, CoreError> {
    let size = size.trim().to_lowercase();
    validate_image_size(&size)?;
    Ok(size)
}

pub fn validate_image_style(style: &str) -> Result<(), CoreError> {
    check_max("Image style", style, MAX_IMAGE_STYLE_LENGTH)
}

pub fn validate_image_prompt(prompt: &str) -> Result<(), CoreError> {
    check_length(
        "Image prompt",
        prompt,
        MIN_IMAGE_PROMPT_LENGTH,
        MAX_IMAGE_PROMPT_LENGTH,
    )
}

pub fn validate_audio_format(format: &str) -> Result<(), CoreError> {
    if AUDIO_FORMATS.contains(&format) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid audio format '{format}'. Must be one of: {AUDIO_FORMATS:?}"
        )))
    }
}

pub fn validate_voice(voice: &str) -> Result<(), CoreError> {
    check_length("Voice", voice, 1, MAX_VOICE_LENGTH)?;
    if !VOICE_RE.is_match(voice) {
        return Err(CoreError::Validation(format!(
            "Invalid voice '{voice}'. Use letters, digits, '-' or '_'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sharing
// ---------------------------------------------------------------------------

/// Validate a requested share lifetime. Non-positive values mean the link
/// never expires and are accepted.
pub fn validate_share_days(days: i64) -> Result<(), CoreError> {
    if days > MAX_SHARE_DAYS {
        return Err(CoreError::Validation(format!(
            "Share expiry must be at most {MAX_SHARE_DAYS} days (got {days})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Learning packs
// ---------------------------------------------------------------------------

pub fn validate_summary(summary: &str) -> Result<(), CoreError> {
    check_max("Summary", summary, MAX_SUMMARY_LENGTH)
}

pub fn validate_question(question: &str, answer: &str) -> Result<(), CoreError> {
    check_max("Question", question, MAX_QA_LENGTH)?;
    check_max("Answer", answer, MAX_QA_LENGTH)
}

pub fn validate_vocabulary(word: &str, definition: &str, example: &str) -> Result<(), CoreError> {
    check_max("Word", word, MAX_WORD_LENGTH)?;
    check_max("Definition", definition, MAX_QA_LENGTH)?;
    check_max("Example", example, MAX_QA_LENGTH)
}
