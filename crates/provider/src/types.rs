//! Request and response types shared by providers.

use serde::{Deserialize, Serialize};

/// Structured-output mode requested from the chat model.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Constrain output to a named JSON schema.
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
    /// Any valid JSON object.
    JsonObject,
}

impl ResponseFormat {
    /// Wire representation for the `response_format` field.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::JsonSchema { name, schema } => serde_json::json!({
                "type": "json_schema",
                "json_schema": { "name": name, "schema": schema },
            }),
            Self::JsonObject => serde_json::json!({ "type": "json_object" }),
        }
    }
}

/// A single-turn JSON completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub model: String,
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

/// Raw completion text plus usage.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}
