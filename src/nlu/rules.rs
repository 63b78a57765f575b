//! Rule-based intent classifier
//!
//! Offline fallback used when no LLM endpoint is configured. Keyword scoring
//! decides the intent; regexes pull amounts, the risk tier and preferences.

use crate::intake::Slot;
use crate::nlu::{Classification, Intent, IntentClassifier};
use crate::session::Session;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

/// Static keyword lists — zero allocation
const PORTFOLIO_KEYWORDS: &[&str] = &[
    "portfolio", "invest", "allocat", "diversif", "plan", "build", "create", "suggest", "recommend",
];

const QUESTION_KEYWORDS: &[&str] = &["what", "how", "why", "explain", "difference", "meaning", "should"];

const MONTHLY_MARKERS: &[&str] = &["month", "sip", "p.m.", "recurring"];

const CAPITAL_MARKERS: &[&str] = &["capital", "lump", "corpus", "savings", "total", "one time", "upfront"];

const NEGATIVE_ANSWERS: &[&str] = &[
    "no", "none", "nothing", "nil", "zero", "no preference", "any", "anything", "not really",
];

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(
        r"(?i)(?:₹|rs\.?|inr)?\s*(\d[\d,]*(?:\.\d+)?)\s*(k|thousand|lakhs?|lacs?|l|crores?|cr)?\b"
    )
    .unwrap();
    static ref RISK_RE: Regex = Regex::new(r"(?i)\b(low|medium|moderate|high)\b").unwrap();
    static ref PREFERENCE_RES: Vec<(&'static str, Regex)> = vec![
        ("stocks", Regex::new(r"(?i)\b(stocks?|shares?|direct equity)\b").unwrap()),
        ("mutual funds", Regex::new(r"(?i)\b(mutual funds?|mfs?)\b").unwrap()),
        ("bonds", Regex::new(r"(?i)\bbonds?\b").unwrap()),
        ("debt funds", Regex::new(r"(?i)\bdebt funds?\b").unwrap()),
        ("gold", Regex::new(r"(?i)\bgold\b").unwrap()),
    ];
}

pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn extract(message: &str, awaiting: Option<Slot>) -> Classification {
        let lowered = message.to_lowercase();
        let mut entities = Session::new();

        extract_amounts(message, awaiting, &mut entities);
        extract_risk_tier(&lowered, awaiting, &mut entities);
        extract_preferences(message, awaiting, &mut entities);

        if awaiting == Some(Slot::MonthlyContribution)
            && !entities.contains_key(Slot::MonthlyContribution.key())
            && is_negative_answer(&lowered)
        {
            entities.insert(Slot::MonthlyContribution.key().into(), json!(0));
        }

        let intent = classify_intent(&lowered, awaiting, !entities.is_empty());
        if intent == Intent::GeneralQuestion {
            // Tags named inside a question are not answers
            entities.clear();
        }
        Classification { intent, entities }
    }
}

#[async_trait::async_trait]
impl IntentClassifier for RuleBasedClassifier {
    async fn classify(&self, message: &str, awaiting: Option<Slot>) -> Classification {
        Self::extract(message, awaiting)
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Word-level match so "explain" does not count as "plan"
fn has_word_prefix(text: &str, prefixes: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| prefixes.iter().any(|prefix| word.starts_with(prefix)))
}

fn is_question(lowered: &str) -> bool {
    lowered.contains('?') || lowered.contains("tell me") || has_word_prefix(lowered, QUESTION_KEYWORDS)
}

fn is_negative_answer(lowered: &str) -> bool {
    let trimmed = lowered.trim().trim_end_matches(['.', '!']);
    NEGATIVE_ANSWERS.contains(&trimmed)
        || trimmed.starts_with("no ")
        || trimmed.starts_with("nothing")
}

fn classify_intent(lowered: &str, awaiting: Option<Slot>, has_entities: bool) -> Intent {
    let wants_portfolio = has_word_prefix(lowered, PORTFOLIO_KEYWORDS);
    let question = is_question(lowered);

    if question && !wants_portfolio && awaiting.is_none() {
        Intent::GeneralQuestion
    } else if has_entities {
        if wants_portfolio && awaiting.is_none() {
            Intent::PortfolioRequest
        } else {
            Intent::ProvidingInfo
        }
    } else if wants_portfolio && !question {
        Intent::PortfolioRequest
    } else if question {
        Intent::GeneralQuestion
    } else if awaiting.is_some() {
        // An answer we could not read still belongs to the intake
        Intent::ProvidingInfo
    } else {
        Intent::Other
    }
}

fn unit_multiplier(unit: Option<&str>) -> f64 {
    match unit.map(|u| u.to_lowercase()) {
        Some(u) if u == "k" || u == "thousand" => 1_000.0,
        Some(u) if u.starts_with("lakh") || u.starts_with("lac") || u == "l" => 100_000.0,
        Some(u) if u.starts_with("cr") => 10_000_000.0,
        _ => 1.0,
    }
}

/// Slot named by the marker closest to an amount, looking both ways
fn nearest_label(leading: &str, trailing: &str) -> Option<Slot> {
    let labels = [
        (Slot::MonthlyContribution, MONTHLY_MARKERS),
        (Slot::Capital, CAPITAL_MARKERS),
    ];

    let mut best: Option<(usize, Slot)> = None;
    for (slot, markers) in labels {
        for marker in markers {
            let after = trailing.find(marker);
            let before = leading
                .rfind(marker)
                .map(|pos| leading.len() - (pos + marker.len()));
            for distance in [after, before].into_iter().flatten() {
                if best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, slot));
                }
            }
        }
    }
    best.map(|(_, slot)| slot)
}

/// A lone unlabelled amount answers the awaited slot; any other unlabelled
/// amount is the capital.
fn extract_amounts(message: &str, awaiting: Option<Slot>, entities: &mut Session) {
    let matches: Vec<(usize, usize, i64)> = AMOUNT_RE
        .captures_iter(message)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if message[whole.end()..].trim_start().starts_with('%') {
                return None;
            }
            let value = caps.get(1)?.as_str().replace(',', "").parse::<f64>().ok()?;
            let amount = value * unit_multiplier(caps.get(2).map(|m| m.as_str()));
            Some((whole.start(), whole.end(), amount.round() as i64))
        })
        .collect();

    for (i, &(start, end, amount)) in matches.iter().enumerate() {
        let prev_end = if i == 0 { 0 } else { matches[i - 1].1 };
        let next_start = matches.get(i + 1).map(|m| m.0).unwrap_or(message.len());
        let leading = message[prev_end..start].to_lowercase();
        let trailing = message[end..next_start].to_lowercase();

        let slot = match nearest_label(&leading, &trailing) {
            Some(slot) => slot,
            None if matches.len() == 1 && awaiting == Some(Slot::MonthlyContribution) => {
                Slot::MonthlyContribution
            }
            None => Slot::Capital,
        };

        entities.entry(slot.key()).or_insert(json!(amount));
    }
}

fn extract_risk_tier(lowered: &str, awaiting: Option<Slot>, entities: &mut Session) {
    let talks_about_risk = lowered.contains("risk")
        || awaiting == Some(Slot::RiskTier)
        || lowered.split_whitespace().count() == 1;
    if !talks_about_risk {
        return;
    }
    if let Some(caps) = RISK_RE.captures(lowered) {
        let tier = match &caps[1] {
            "moderate" => "medium",
            other => other,
        };
        entities.insert(Slot::RiskTier.key().into(), Value::String(tier.to_string()));
    }
}

fn extract_preferences(message: &str, awaiting: Option<Slot>, entities: &mut Session) {
    let tags: Vec<Value> = PREFERENCE_RES
        .iter()
        .filter(|(_, re)| re.is_match(message))
        .map(|(tag, _)| Value::String(tag.to_string()))
        .collect();

    if !tags.is_empty() {
        entities.insert(Slot::PreferredTags.key().into(), Value::Array(tags));
    } else if awaiting == Some(Slot::PreferredTags) && is_negative_answer(&message.to_lowercase()) {
        entities.insert(Slot::PreferredTags.key().into(), Value::Array(vec![]));
    }
}
