//! Learning pack types and normalization of model output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::validation;

/// Maximum characters of story text sent to the model for a learning pack.
pub const LEARNING_TEXT_LIMIT: usize = 3200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub example: String,
}

/// Summary, comprehension questions, and vocabulary for one story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningPack {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub questions: Vec<LearningQuestion>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyItem>,
}

impl LearningPack {
    /// Trim every field and validate lengths of a hand-edited pack.
    pub fn validated(self) -> Result<Self, CoreError> {
        let summary = self.summary.trim().to_string();
        validation::validate_summary(&summary)?;

        let questions = self
            .questions
            .into_iter()
            .map(|q| {
                let q = LearningQuestion {
                    question: q.question.trim().to_string(),
                    answer: q.answer.trim().to_string(),
                };
                validation::validate_question(&q.question, &q.answer).map(|()| q)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let vocabulary = self
            .vocabulary
            .into_iter()
            .map(|v| {
                let v = VocabularyItem {
                    word: v.word.trim().to_string(),
                    definition: v.definition.trim().to_string(),
                    example: v.example.trim().to_string(),
                };
                validation::validate_vocabulary(&v.word, &v.definition, &v.example).map(|()| v)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            summary,
            questions,
            vocabulary,
        })
    }
}

fn str_field<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or_default().trim()
}

/// Coerce loosely-shaped model JSON into a [`LearningPack`].
///
/// - Questions need both a question and an answer; bare strings become
///   questions with an empty answer.
/// - Vocabulary entries need a word and a definition.
/// - Anything else is dropped.
pub fn normalize_learning(data: &Value) -> LearningPack {
    let summary = data
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let questions = data
        .get("questions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => {
                        let question = str_field(obj, "question");
                        let answer = str_field(obj, "answer");
                        (!question.is_empty() && !answer.is_empty()).then(|| LearningQuestion {
                            question: question.to_string(),
                            answer: answer.to_string(),
                        })
                    }
                    Value::String(s) if !s.trim().is_empty() => Some(LearningQuestion {
                        question: s.trim().to_string(),
                        answer: String::new(),
                    }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let vocabulary = data
        .get("vocabulary")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|obj| {
                    let word = str_field(obj, "word");
                    let definition = str_field(obj, "definition");
                    (!word.is_empty() && !definition.is_empty()).then(|| VocabularyItem {
                        word: word.to_string(),
                        definition: definition.to_string(),
                        example: str_field(obj, "example").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    LearningPack {
        summary,
        questions,
        vocabulary,
    }
}

/// Collapse whitespace and truncate to `max_chars`, ending with an ellipsis
/// when truncated.
pub fn trim_story_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let head: String = cleaned.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}\u{2026}", head.trim_end())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalize_keeps_complete_entries() {
        let raw = json!({
            "summary": "  A cat finds a friend. ",
            "questions": [
                {"question": "Who is the hero?", "answer": "The cat"},
                {"question": "Missing answer"},
                "What did the cat eat?",
                42
            ],
            "vocabulary": [
                {"word": "brave", "definition": "not afraid"},
                {"word": "", "definition": "nothing"},
                "loose string"
            ]
        });
        let pack = normalize_learning(&raw);

        assert_eq!(pack.summary, "A cat finds a friend.");
        assert_eq!(pack.questions.len(), 2);
        assert_eq!(pack.questions[0].answer, "The cat");
        assert_eq!(pack.questions[1].question, "What did the cat eat?");
        assert_eq!(pack.questions[1].answer, "");
        assert_eq!(pack.vocabulary.len(), 1);
        assert_eq!(pack.vocabulary[0].example, "");
    }

    #[test]
    fn normalize_tolerates_wrong_shapes() {
        let pack = normalize_learning(&json!({"questions": "nope", "vocabulary": {}}));
        assert_eq!(pack, LearningPack::default());
    }

    #[test]
    fn trim_short_text_is_unchanged_apart_from_whitespace() {
        assert_eq!(trim_story_text("a  b\n\nc", 10), "a b c");
    }

    #[test]
    fn trim_long_text_adds_ellipsis() {
        let out = trim_story_text(&"word ".repeat(20), 12);
        assert_eq!(out.chars().count(), 10 + 1);
        assert!(out.ends_with('\u{2026}'));
    }

    #[test]
    fn validated_trims_and_checks_lengths() {
        let pack = LearningPack {
            summary: " ok ".into(),
            questions: vec![LearningQuestion {
                question: " q ".into(),
                answer: " a ".into(),
            }],
            vocabulary: vec![],
        }
        .validated()
        .unwrap();
        assert_eq!(pack.summary, "ok");
        assert_eq!(pack.questions[0].question, "q");

        let too_long = LearningPack {
            summary: "s".repeat(2001),
            ..Default::default()
        };
        assert!(too_long.validated().is_err());
    }
}
