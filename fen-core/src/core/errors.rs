//! Domain error types.
//!
//! The runtime is event-oriented: order placement and cancellation never
//! return errors, they complete by publishing the matching `eOrder` event
//! (a rejected request becomes an `Order(Rejected)` event). The errors here
//! cover the synchronous seams - configuration and connectivity.

use thiserror::Error;

/// Errors surfaced by synchronous gateway operations such as `connect`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required configuration key was absent from the setting map.
    #[error("missing required setting `{0}`")]
    MissingSetting(&'static str),

    /// A configuration key was present but its value could not be used.
    #[error("invalid value for setting `{key}`: {reason}")]
    InvalidSetting {
        /// The offending key.
        key: &'static str,
        /// Why the value was unusable.
        reason: String,
    },

    /// The caller named a gateway that is not registered.
    #[error("unknown gateway `{0}`")]
    UnknownGateway(String),

    /// The exchange could not be reached.
    #[error("transport failure: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::MissingSetting("api_key");
        assert_eq!(format!("{err}"), "missing required setting `api_key`");

        let err = GatewayError::InvalidSetting {
            key: "initial_cash",
            reason: "expected a number".to_string(),
        };
        assert!(format!("{err}").contains("initial_cash"));
    }
}
