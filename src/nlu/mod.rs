//! Intent classification and entity extraction
//!
//! Turns a free-text turn into an intent label plus raw slot values. Any
//! classifier failure degrades to [`Classification::safe_default`]; the turn
//! never fails because of NLU.

pub mod llm;
pub mod rules;

pub use llm::LlmClassifier;
pub use rules::RuleBasedClassifier;

use crate::intake::Slot;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    GeneralQuestion,
    PortfolioRequest,
    ProvidingInfo,
    Other,
}

impl Intent {
    /// Unknown labels map to `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "general_question" => Intent::GeneralQuestion,
            "portfolio_request" => Intent::PortfolioRequest,
            "providing_info" => Intent::ProvidingInfo,
            _ => Intent::Other,
        }
    }

    /// Intents that feed the intake instead of the general Q&A path
    pub fn drives_intake(&self) -> bool {
        matches!(self, Intent::PortfolioRequest | Intent::ProvidingInfo)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub entities: Session,
}

impl Classification {
    pub fn safe_default() -> Self {
        Self {
            intent: Intent::GeneralQuestion,
            entities: Session::new(),
        }
    }
}

/// NLU collaborator. `awaiting` is the slot the previous follow-up asked for,
/// which lets a bare answer like "50000" land in the right slot.
#[async_trait::async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, message: &str, awaiting: Option<Slot>) -> Classification;
}

/// Pull a JSON object out of model output: a ```json fence first, then the
/// outermost `{ ... }` span.
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    if let Some(start) = text.find("```json") {
        let after = &text[start + 7..];
        if let Some(end) = after.find("```") {
            if let Ok(Value::Object(obj)) = serde_json::from_str(after[..end].trim()) {
                return Some(obj);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&text[start..=end]) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// Strict reading of a classifier answer; `None` means malformed
pub fn parse_classification(text: &str) -> Option<Classification> {
    let obj = extract_json_object(text)?;
    let intent = Intent::from_label(obj.get("intent")?.as_str()?);
    let entities = match obj.get("entities") {
        Some(Value::Object(entities)) => entities.clone(),
        None | Some(Value::Null) => Session::new(),
        Some(_) => return None,
    };
    Some(Classification { intent, entities })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_labels() {
        assert_eq!(Intent::from_label("portfolio_request"), Intent::PortfolioRequest);
        assert_eq!(Intent::from_label(" Providing_Info "), Intent::ProvidingInfo);
        assert_eq!(Intent::from_label("greeting"), Intent::Other);
        assert!(Intent::ProvidingInfo.drives_intake());
        assert!(!Intent::Other.drives_intake());
    }

    #[test]
    fn test_parse_fenced_answer() {
        let text = "Sure!\n```json\n{\"intent\": \"providing_info\", \"entities\": {\"capital\": 50000}}\n```";
        let parsed = parse_classification(text).unwrap();
        assert_eq!(parsed.intent, Intent::ProvidingInfo);
        assert_eq!(parsed.entities["capital"], json!(50000));
    }

    #[test]
    fn test_parse_answer_wrapped_in_prose() {
        let text = r#"Here you go: {"intent": "portfolio_request", "entities": {}} hope it helps"#;
        let parsed = parse_classification(text).unwrap();
        assert_eq!(parsed.intent, Intent::PortfolioRequest);
        assert!(parsed.entities.is_empty());
    }

    #[test]
    fn test_malformed_answers() {
        assert!(parse_classification("I think it's a question").is_none());
        assert!(parse_classification(r#"{"entities": {}}"#).is_none());
        assert!(parse_classification(r#"{"intent": "other", "entities": [1]}"#).is_none());
        assert!(parse_classification("} backwards {").is_none());
    }
}
