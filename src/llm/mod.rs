//! LLM collaborator
//!
//! One client object, built once and injected into whatever needs text
//! generation. Response bodies are normalized through [`LlmResponse`], a
//! closed set of known shapes.

pub mod http;

pub use http::HttpLlmClient;

use crate::Result;
use serde_json::Value;

/// Text generation behind a trait so tests can substitute a double
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Known response shapes of text-generation endpoints
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    /// `{"choices":[{"message":{"content":..}}]}` or `{"message":{"content":..}}`
    Chat(String),
    /// `{"choices":[{"text":..}]}`
    Completion(String),
    /// `{"response":..}`, `{"text":..}`, `{"content":..}` or `{"output":..}`
    DirectField(String),
    /// Anything else, raw body kept for logging
    Unparsed(String),
}

const DIRECT_FIELDS: [&str; 4] = ["response", "text", "content", "output"];

impl LlmResponse {
    pub fn parse(body: &str) -> Self {
        let Ok(json) = serde_json::from_str::<Value>(body) else {
            return LlmResponse::Unparsed(body.to_string());
        };

        Self::chat(&json)
            .map(LlmResponse::Chat)
            .or_else(|| Self::completion(&json).map(LlmResponse::Completion))
            .or_else(|| Self::direct_field(&json).map(LlmResponse::DirectField))
            .unwrap_or_else(|| LlmResponse::Unparsed(body.to_string()))
    }

    fn chat(json: &Value) -> Option<String> {
        json.pointer("/choices/0/message/content")
            .or_else(|| json.pointer("/message/content"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn completion(json: &Value) -> Option<String> {
        json.pointer("/choices/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn direct_field(json: &Value) -> Option<String> {
        DIRECT_FIELDS
            .iter()
            .find_map(|field| json.get(field).and_then(Value::as_str))
            .map(str::to_string)
    }

    /// Generated text, or `None` for an unrecognized shape
    pub fn into_text(self) -> Option<String> {
        match self {
            LlmResponse::Chat(text)
            | LlmResponse::Completion(text)
            | LlmResponse::DirectField(text) => Some(text),
            LlmResponse::Unparsed(_) => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_shapes() {
        assert_eq!(
            LlmResponse::parse(r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#),
            LlmResponse::Chat("hi".into())
        );
        assert_eq!(
            LlmResponse::parse(r#"{"model":"llama3.1","message":{"content":"hey"}}"#),
            LlmResponse::Chat("hey".into())
        );
    }

    #[test]
    fn test_completion_shape() {
        assert_eq!(
            LlmResponse::parse(r#"{"choices":[{"text":"done","index":0}]}"#),
            LlmResponse::Completion("done".into())
        );
    }

    #[test]
    fn test_direct_field_shape() {
        assert_eq!(
            LlmResponse::parse(r#"{"model":"llama3.1:8b","response":"{\"intent\":\"other\"}","done":true}"#),
            LlmResponse::DirectField(r#"{"intent":"other"}"#.into())
        );
    }

    #[test]
    fn test_unrecognized_shapes_are_unparsed() {
        assert_eq!(
            LlmResponse::parse("plain text"),
            LlmResponse::Unparsed("plain text".into())
        );
        let odd = r#"{"data":{"deep":{"text":"hidden"}}}"#;
        assert_eq!(LlmResponse::parse(odd), LlmResponse::Unparsed(odd.into()));
        assert_eq!(LlmResponse::parse(odd).into_text(), None);
        // A non-string field does not count as a match
        assert!(matches!(LlmResponse::parse(r#"{"response": 3}"#), LlmResponse::Unparsed(_)));
    }
}
