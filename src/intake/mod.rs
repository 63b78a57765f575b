//! Slot-filling intake manager
//!
//! Accumulates the four required slots across turns. Whether the intake is
//! complete is never stored: it is re-derived from the session snapshot on
//! every turn.
//!
//! COLLECTING(first missing slot) → READY(IntakeRequest)

pub mod coerce;

use crate::models::IntakeRequest;
use crate::session::{is_empty_value, merge, Session};
use crate::Result;
use std::fmt;
use tracing::debug;

/// Required slots, in the order they are asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Capital,
    MonthlyContribution,
    RiskTier,
    PreferredTags,
}

impl Slot {
    pub const PRIORITY: [Slot; 4] = [
        Slot::Capital,
        Slot::MonthlyContribution,
        Slot::RiskTier,
        Slot::PreferredTags,
    ];

    /// Session key the slot is stored under
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Capital => "capital",
            Slot::MonthlyContribution => "monthly_contribution",
            Slot::RiskTier => "risk_tier",
            Slot::PreferredTags => "preferred_tags",
        }
    }

    /// Older key names some extractors still emit
    pub fn legacy_key(&self) -> Option<&'static str> {
        match self {
            Slot::Capital => None,
            Slot::MonthlyContribution => Some("monthly_investment"),
            Slot::RiskTier => Some("risk_appetite"),
            Slot::PreferredTags => Some("preferred_tools"),
        }
    }

    pub fn follow_up_question(&self) -> &'static str {
        match self {
            Slot::Capital => "What's the total capital (in INR) you'd like to invest?",
            Slot::MonthlyContribution => "How much can you invest monthly (in INR)?",
            Slot::RiskTier => "What's your risk appetite? (low, medium, or high)",
            Slot::PreferredTags => {
                "Do you prefer any specific investment types? (e.g. stocks, mutual funds, bonds, gold)"
            }
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Where the intake stands for a given session snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeState {
    Collecting(Slot),
    Ready(IntakeRequest),
}

/// Outcome of one turn through the intake manager
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeOutcome {
    FollowUp { slot: Slot, question: &'static str },
    ReadyIntake(IntakeRequest),
}

fn is_missing(session: &Session, slot: Slot) -> bool {
    session.get(slot.key()).map(is_empty_value).unwrap_or(true)
}

/// First missing slot in priority order, if any
pub fn first_missing_slot(session: &Session) -> Option<Slot> {
    Slot::PRIORITY.into_iter().find(|slot| is_missing(session, *slot))
}

/// Recompute the intake state from a snapshot. Pure; no I/O.
///
/// Fails with a client input error when every slot is present but one of them
/// cannot be coerced.
pub fn derive_state(session: &Session) -> Result<IntakeState> {
    if let Some(slot) = first_missing_slot(session) {
        return Ok(IntakeState::Collecting(slot));
    }

    let request = coerce::intake_request(session)?;
    Ok(IntakeState::Ready(request))
}

/// Rename legacy slot keys to their canonical names. A canonical key already
/// present in the same update wins over its legacy alias.
pub fn canonicalize_keys(entities: &Session) -> Session {
    let mut canonical = Session::new();
    for (key, value) in entities {
        let renamed = Slot::PRIORITY
            .into_iter()
            .find(|slot| slot.legacy_key() == Some(key.as_str()))
            .map(|slot| slot.key());

        match renamed {
            Some(target) if entities.contains_key(target) => {}
            Some(target) => {
                canonical.insert(target.to_string(), value.clone());
            }
            None => {
                canonical.insert(key.clone(), value.clone());
            }
        }
    }
    canonical
}

/// Merge one turn's entities into the session and decide what happens next.
/// Returns the merged session alongside the outcome.
pub fn advance(session: &Session, entities: &Session) -> Result<(Session, IntakeOutcome)> {
    let merged = merge(session, &canonicalize_keys(entities));

    let outcome = match derive_state(&merged)? {
        IntakeState::Collecting(slot) => {
            debug!(slot = %slot, "Intake incomplete, asking follow-up");
            IntakeOutcome::FollowUp {
                slot,
                question: slot.follow_up_question(),
            }
        }
        IntakeState::Ready(request) => {
            debug!("Intake complete");
            IntakeOutcome::ReadyIntake(request)
        }
    };

    Ok((merged, outcome))
}
