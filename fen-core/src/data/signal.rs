//! External decision schema.
//!
//! Signal producers (LLM pipelines, indicator calculators, humans) hand
//! the runtime a map of per-symbol decisions. The schema is deliberately
//! small: an action verb, a quantity, and a confidence score in [0, 100].

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Per-symbol decision set, keyed by symbol.
pub type SignalMap = HashMap<String, Decision>;

/// Action verb of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    /// Raise the long target by `quantity`.
    Buy,
    /// Lower the long target by `quantity`, floored at zero.
    Sell,
    /// Lower the target by `quantity`; the target may go negative.
    Short,
    /// Raise the target by `quantity` (buy back short exposure).
    Cover,
    /// Leave the target unchanged.
    Hold,
}

/// Returned when an action verb is not part of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown decision action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for DecisionAction {
    type Err = UnknownAction;

    /// Case-insensitive parse of the wire verb.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(DecisionAction::Buy),
            "sell" => Ok(DecisionAction::Sell),
            "short" => Ok(DecisionAction::Short),
            "cover" => Ok(DecisionAction::Cover),
            "hold" => Ok(DecisionAction::Hold),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

// Deserialization goes through `FromStr` so the wire format is
// case-insensitive; a verb outside the schema is a hard error.
impl<'de> Deserialize<'de> for DecisionAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let verb = String::deserialize(deserializer)?;
        verb.parse().map_err(serde::de::Error::custom)
    }
}

/// One instruction from an external decision producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    /// Quantity the action applies to; must be nonnegative.
    pub quantity: Decimal,
    /// Producer confidence in [0, 100]. Advisory only.
    pub confidence: u8,
}

impl Decision {
    pub fn new(action: DecisionAction, quantity: Decimal, confidence: u8) -> Self {
        Self {
            action,
            quantity,
            confidence,
        }
    }

    /// A `hold` decision, the schema's explicit no-op.
    pub fn hold() -> Self {
        Self::new(DecisionAction::Hold, Decimal::ZERO, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_action_parse_case_insensitive() {
        assert_eq!("buy".parse::<DecisionAction>().unwrap(), DecisionAction::Buy);
        assert_eq!("SELL".parse::<DecisionAction>().unwrap(), DecisionAction::Sell);
        assert_eq!("Short".parse::<DecisionAction>().unwrap(), DecisionAction::Short);
        assert_eq!("cOvEr".parse::<DecisionAction>().unwrap(), DecisionAction::Cover);
        assert_eq!("HOLD".parse::<DecisionAction>().unwrap(), DecisionAction::Hold);
    }

    #[test]
    fn test_action_parse_unknown() {
        let err = "yolo".parse::<DecisionAction>().unwrap_err();
        assert_eq!(err, UnknownAction("yolo".to_string()));
    }

    #[test]
    fn test_decision_json_shape() {
        let json = r#"{"action":"buy","quantity":0.01,"confidence":75}"#;
        let decision: Decision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.action, DecisionAction::Buy);
        assert_eq!(decision.quantity, dec!(0.01));
        assert_eq!(decision.confidence, 75);
    }

    #[test]
    fn test_decision_json_action_is_case_insensitive() {
        let json = r#"{"action":"BUY","quantity":0.01,"confidence":75}"#;
        let decision: Decision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.action, DecisionAction::Buy);

        let json = r#"{"action":"Sell","quantity":1,"confidence":50}"#;
        let decision: Decision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.action, DecisionAction::Sell);
    }

    #[test]
    fn test_decision_json_unknown_action_is_rejected() {
        let json = r#"{"action":"yolo","quantity":1,"confidence":50}"#;
        let err = serde_json::from_str::<Decision>(json).unwrap_err();
        assert!(err.to_string().contains("unknown decision action"));
    }

    #[test]
    fn test_action_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DecisionAction::Cover).unwrap(),
            "\"cover\""
        );
    }
}
