//! Slot coercion
//!
//! Turns raw session values into a typed [`IntakeRequest`]. Every failure is a
//! client input error.

use crate::error::AdvisorError;
use crate::intake::Slot;
use crate::models::{IntakeRequest, RiskTier};
use crate::session::Session;
use crate::Result;
use serde_json::Value;

/// Largest accepted money amount (2^53); beyond it `f64` no longer holds every
/// integer and weighted amounts drift past their total
pub const MAX_AMOUNT: u64 = 1 << 53;

pub fn intake_request(session: &Session) -> Result<IntakeRequest> {
    let capital = integer(session, Slot::Capital)?;
    if capital <= 0 {
        return Err(AdvisorError::InvalidInput(format!(
            "capital must be positive, got {}",
            capital
        )));
    }

    let monthly = integer(session, Slot::MonthlyContribution)?;
    if monthly < 0 {
        return Err(AdvisorError::InvalidInput(format!(
            "monthly_contribution must not be negative, got {}",
            monthly
        )));
    }

    for (slot, amount) in [(Slot::Capital, capital), (Slot::MonthlyContribution, monthly)] {
        if amount as u64 > MAX_AMOUNT {
            return Err(AdvisorError::InvalidInput(format!(
                "{} must not exceed {}, got {}",
                slot, MAX_AMOUNT, amount
            )));
        }
    }

    Ok(IntakeRequest {
        capital: capital as u64,
        monthly_contribution: monthly as u64,
        risk_tier: risk_tier(slot_value(session, Slot::RiskTier)?)?,
        preferred_tags: preferred_tags(slot_value(session, Slot::PreferredTags)?)?,
    })
}

fn slot_value(session: &Session, slot: Slot) -> Result<&Value> {
    session
        .get(slot.key())
        .ok_or_else(|| AdvisorError::InvalidInput(format!("{} is missing", slot)))
}

/// Integers, finite floats (truncated toward zero) and trimmed numeric strings
fn integer(session: &Session, slot: Slot) -> Result<i64> {
    let value = slot_value(session, slot)?;
    let invalid = || AdvisorError::InvalidInput(format!("{} is not an integer: {}", slot, value));

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                if f.trunc() > i64::MAX as f64 || f.trunc() < i64::MIN as f64 {
                    return Err(invalid());
                }
                Ok(f.trunc() as i64)
            } else {
                Err(invalid())
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn risk_tier(value: &Value) -> Result<RiskTier> {
    match value {
        Value::String(s) => s.parse(),
        other => Err(AdvisorError::UnknownRiskTier(other.to_string())),
    }
}

/// A list of strings or one comma-separated string. Empty tokens are dropped
/// and duplicates removed case-insensitively, keeping the first spelling.
pub fn preferred_tags(value: &Value) -> Result<Vec<String>> {
    let raw: Vec<String> = match value {
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(AdvisorError::InvalidInput(format!(
                    "preferred_tags entries must be strings, got {}",
                    other
                ))),
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(AdvisorError::InvalidInput(format!(
                "preferred_tags must be a list or a comma-separated string, got {}",
                other
            )))
        }
    };

    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(trimmed)) {
            tags.push(trimmed.to_string());
        }
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(value: Value) -> Session {
        value.as_object().cloned().unwrap()
    }

    fn complete(capital: Value, monthly: Value) -> Session {
        session(json!({
            "capital": capital,
            "monthly_contribution": monthly,
            "risk_tier": "low",
            "preferred_tags": []
        }))
    }

    #[test]
    fn test_integer_shapes() {
        let req = intake_request(&complete(json!(" 250000 "), json!(5000.9))).unwrap();
        assert_eq!(req.capital, 250_000);
        assert_eq!(req.monthly_contribution, 5_000);
        assert!(req.preferred_tags.is_empty());
    }

    #[test]
    fn test_non_numeric_amounts_are_rejected() {
        for bad in [json!("lots"), json!("1,00,000"), json!(true), json!({"v": 1}), json!("12.5")] {
            let err = intake_request(&complete(bad.clone(), json!(0))).unwrap_err();
            assert!(err.is_client_error(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_capital_must_be_positive_and_monthly_non_negative() {
        assert!(intake_request(&complete(json!(0), json!(0))).is_err());
        assert!(intake_request(&complete(json!(-5), json!(0))).is_err());
        assert!(intake_request(&complete(json!(10), json!(-1))).is_err());
        assert!(intake_request(&complete(json!(10), json!(0))).is_ok());
    }

    #[test]
    fn test_amounts_above_two_pow_53_are_rejected() {
        let top = MAX_AMOUNT as i64;
        assert_eq!(intake_request(&complete(json!(top), json!(top))).unwrap().capital, MAX_AMOUNT);

        for (capital, monthly) in [(top + 1, 0), (i64::MAX, 0), (10, top + 1)] {
            let err = intake_request(&complete(json!(capital), json!(monthly))).unwrap_err();
            assert!(err.is_client_error(), "{} / {} should be rejected", capital, monthly);
        }
    }

    #[test]
    fn test_tags_from_string_and_list() {
        assert_eq!(
            preferred_tags(&json!(" stocks , ,Gold,")).unwrap(),
            vec!["stocks".to_string(), "Gold".to_string()]
        );
        assert_eq!(
            preferred_tags(&json!(["Stocks", "stocks", " bonds "])).unwrap(),
            vec!["Stocks".to_string(), "bonds".to_string()]
        );
    }

    #[test]
    fn test_malformed_tags_are_rejected() {
        assert!(preferred_tags(&json!(42)).is_err());
        assert!(preferred_tags(&json!(["stocks", 3])).is_err());
        assert!(preferred_tags(&json!({"stocks": true})).is_err());
    }

    #[test]
    fn test_non_string_risk_tier_is_rejected() {
        let mut s = complete(json!(10), json!(1));
        s.insert("risk_tier".into(), json!(2));
        assert!(matches!(
            intake_request(&s).unwrap_err(),
            AdvisorError::UnknownRiskTier(_)
        ));
    }
}
