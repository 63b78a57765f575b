//! LLM-backed intent classifier

use crate::intake::Slot;
use crate::llm::LlmClient;
use crate::nlu::{parse_classification, Classification, IntentClassifier};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LlmClassifier {
    llm: Arc<dyn LlmClient>,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait::async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, message: &str, awaiting: Option<Slot>) -> Classification {
        let prompt = build_classification_prompt(message, awaiting);

        let answer = match self.llm.complete(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Classifier LLM call failed, using safe default: {}", e);
                return Classification::safe_default();
            }
        };

        match parse_classification(&answer) {
            Some(classification) => {
                debug!(
                    intent = ?classification.intent,
                    entities = classification.entities.len(),
                    "Message classified"
                );
                classification
            }
            None => {
                warn!("Unparseable classifier output, using safe default");
                Classification::safe_default()
            }
        }
    }
}

fn build_classification_prompt(message: &str, awaiting: Option<Slot>) -> String {
    let mut prompt = String::from(
        r#"You classify messages sent to an investment planning assistant.

Return ONLY a JSON object of the form:
{"intent": "<intent>", "entities": {<entities>}}

Intents:
- portfolio_request: the user wants an investment plan or portfolio
- providing_info: the user is answering a question about their finances
- general_question: a general finance question
- other: greetings, thanks, anything else

Entities (include only the ones the message states; use null otherwise):
- capital: total amount to invest now, integer rupees (1 lakh = 100000)
- monthly_contribution: amount per month, integer rupees
- risk_tier: one of "low", "medium", "high"
- preferred_tags: list of preferred investment types, e.g. ["stocks", "mutual funds", "bonds", "debt funds", "gold"]
"#,
    );

    if let Some(slot) = awaiting {
        prompt.push_str(&format!(
            "\nThe assistant's last question was: \"{}\" (slot: {}). A bare answer belongs to that slot.\n",
            slot.follow_up_question(),
            slot.key()
        ));
    }

    prompt.push_str("\nMessage: ");
    prompt.push_str(message);
    prompt
}
