//! Core enumerations for the trading runtime.
//!
//! Single-byte enums with explicit serde names. The lowercase names double
//! as the id fragments used in composite keys (`AAPL.long`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order / position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    Long = 0,
    Short = 1,
}

impl Direction {
    /// Lowercase name used in composite position ids.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an order opens new exposure or closes existing exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Action {
    Open = 0,
    Close = 1,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Open => f.write_str("open"),
            Action::Close => f.write_str("close"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum OrderType {
    Limit = 0,
    Market = 1,
}

/// Order lifecycle state.
///
/// `Submitting`, `NotTraded` and `PartTraded` are the *active* states: an
/// order in one of them is still working and eligible for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Status {
    Submitting = 0,
    NotTraded = 1,
    PartTraded = 2,
    AllTraded = 3,
    Cancelled = 4,
    Rejected = 5,
}

impl Status {
    /// True while the order can still trade or be cancelled.
    pub const fn is_active(&self) -> bool {
        matches!(self, Status::Submitting | Status::NotTraded | Status::PartTraded)
    }

    /// True once the order has reached a terminal state.
    pub const fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_statuses() {
        assert!(Status::Submitting.is_active());
        assert!(Status::NotTraded.is_active());
        assert!(Status::PartTraded.is_active());

        assert!(Status::AllTraded.is_terminal());
        assert!(Status::Cancelled.is_terminal());
        assert!(Status::Rejected.is_terminal());
    }

    #[test]
    fn test_direction_names() {
        assert_eq!(Direction::Long.as_str(), "long");
        assert_eq!(Direction::Short.as_str(), "short");
        assert_eq!(format!("{}", Direction::Long), "long");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Direction::Short).unwrap(), "\"short\"");
        assert_eq!(serde_json::to_string(&Status::AllTraded).unwrap(), "\"all_traded\"");
        assert_eq!(serde_json::to_string(&OrderType::Limit).unwrap(), "\"limit\"");
    }
}
