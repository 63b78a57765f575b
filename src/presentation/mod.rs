//! Presentation of plans, follow-up questions and general answers
//!
//! With an LLM configured, plans and general answers are phrased by the
//! model; every LLM failure degrades to fixed wording so a turn never fails
//! because of presentation.

use crate::llm::LlmClient;
use crate::models::AllocationPlan;
use std::sync::Arc;
use tracing::{debug, warn};

pub const PLAN_FALLBACK: &str = "I've generated your portfolio! Here are the details.";

pub const GENERAL_FALLBACK: &str =
    "I'm sorry, I can't answer that right now. I can still help you build an investment plan: just tell me how much you'd like to invest.";

/// Which allocations a plan actually carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Both,
    LumpSumOnly,
    RecurringOnly,
    Empty,
}

impl PlanKind {
    /// A recurring plan only counts when its total is positive
    pub fn of(plan: &AllocationPlan) -> Self {
        let has_lump_sum = !plan.lump_sum.is_empty();
        let has_recurring = plan.recurring_total() > 0;

        match (has_lump_sum, has_recurring) {
            (true, true) => PlanKind::Both,
            (true, false) => PlanKind::LumpSumOnly,
            (false, true) => PlanKind::RecurringOnly,
            (false, false) => PlanKind::Empty,
        }
    }

    fn prompt_context(&self) -> &'static str {
        match self {
            PlanKind::Both => concat!(
                "The user has provided both a one-time 'lump sum' and a 'monthly SIP' amount. ",
                "Acknowledge that you have created two separate, balanced plans for them. ",
                "Example: 'Great! I've built a complete financial plan for you. It includes a strategy ",
                "for your lump sum and a separate plan for your monthly SIP. Here are the details.'"
            ),
            PlanKind::LumpSumOnly => concat!(
                "The user has provided a one-time 'lump sum' amount. ",
                "Acknowledge that you have created a plan for this. ",
                "Example: 'Okay, I've created a custom, diversified plan for your lump sum investment. ",
                "Here's the breakdown.'"
            ),
            PlanKind::RecurringOnly => concat!(
                "The user has provided a 'monthly SIP' amount. ",
                "Acknowledge that you have created a plan for their monthly investments. ",
                "Example: 'Perfect! I've created a diversified plan for your monthly SIP. ",
                "Here's how it's allocated.'"
            ),
            PlanKind::Empty => "",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            PlanKind::Both => "Great! I've built a complete financial plan for you. It includes a strategy for your lump sum and a separate plan for your monthly SIP. Here are the details.",
            PlanKind::LumpSumOnly => "Okay, I've created a custom, diversified plan for your lump sum investment. Here's the breakdown.",
            PlanKind::RecurringOnly => "Perfect! I've created a diversified plan for your monthly SIP. Here's how it's allocated.",
            PlanKind::Empty => PLAN_FALLBACK,
        }
    }
}

/// Renders advisor output as user-facing text
pub struct Presenter {
    llm: Option<Arc<dyn LlmClient>>,
}

impl Presenter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm: Some(llm) }
    }

    /// Deterministic wording, no LLM involved
    pub fn template() -> Self {
        Self { llm: None }
    }

    pub fn render_follow_up(&self, question: &str) -> String {
        question.to_string()
    }

    pub async fn render_plan(&self, plan: &AllocationPlan) -> String {
        let kind = PlanKind::of(plan);
        let Some(llm) = &self.llm else {
            return kind.template().to_string();
        };

        let prompt = match plan_prompt(kind, plan) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Plan could not be serialized for presentation: {}", e);
                return PLAN_FALLBACK.to_string();
            }
        };

        match llm.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("LLM returned an empty plan summary");
                PLAN_FALLBACK.to_string()
            }
            Err(e) => {
                warn!("Plan presentation via LLM failed: {}", e);
                PLAN_FALLBACK.to_string()
            }
        }
    }

    pub async fn answer_general(&self, message: &str) -> String {
        let Some(llm) = &self.llm else {
            return GENERAL_FALLBACK.to_string();
        };

        let prompt = format!(
            "You are a friendly financial assistant focused on Indian personal finance. \
             Answer concisely and clearly.\n\nAnswer this question: {}",
            message
        );

        match llm.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(chars = text.len(), "General answer from LLM");
                text.trim().to_string()
            }
            Ok(_) => GENERAL_FALLBACK.to_string(),
            Err(e) => {
                warn!("General answer via LLM failed: {}", e);
                GENERAL_FALLBACK.to_string()
            }
        }
    }
}

fn plan_prompt(kind: PlanKind, plan: &AllocationPlan) -> serde_json::Result<String> {
    let mut prompt = String::from(
        "You are a friendly, encouraging financial advisor. \
         You just generated a new investment plan for a user. \
         Your job is to present this plan to them in a brief, 2-3 sentence summary. Be natural and clear.\n",
    );
    prompt.push_str(kind.prompt_context());
    prompt.push_str("\n\nHere is the raw data of the plan (do NOT just repeat this JSON): ");
    prompt.push_str(&serde_json::to_string(plan)?);
    Ok(prompt)
}
