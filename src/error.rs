use thiserror::Error;

use crate::platform::PlatformError;
use crate::state_machine::AccessValue;

pub type Result<T> = std::result::Result<T, AccessError>;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Invalid access mode: {0}")]
    InvalidAccessMode(String),

    #[error("`local-off` is reserved for automatic outage handling")]
    ReservedAccessValue,

    #[error("Illegal access transition: {from} -> {to}")]
    IllegalTransition { from: AccessValue, to: AccessValue },

    #[error("Malformed lock owner: {0:?}")]
    MalformedLockOwner(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AccessError {
    /// Classifies the error for logging and pass-continuation decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            AccessError::InvalidAccessMode(_)
            | AccessError::ReservedAccessValue
            | AccessError::IllegalTransition { .. } => ErrorClass::Configuration,
            AccessError::MalformedLockOwner(_) | AccessError::Json(_) => ErrorClass::MalformedState,
            AccessError::Store(_)
            | AccessError::Notify(_)
            | AccessError::Platform(_)
            | AccessError::Io(_) => ErrorClass::Transient,
        }
    }
}

/// Classifies a failure by how the enclosing pass reacts to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// External call failed (probe, ACL push, notification). Logged; the next tick retries.
    Transient,
    /// Internal record could not be interpreted. The entry is skipped.
    MalformedState,
    /// Request rejected before any external call was made.
    Configuration,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Transient => write!(f, "Transient"),
            ErrorClass::MalformedState => write!(f, "MalformedState"),
            ErrorClass::Configuration => write!(f, "Configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_classified() {
        assert_eq!(
            AccessError::InvalidAccessMode("sideways".into()).class(),
            ErrorClass::Configuration
        );
        assert_eq!(AccessError::ReservedAccessValue.class(), ErrorClass::Configuration);
        assert_eq!(
            AccessError::IllegalTransition {
                from: AccessValue::LocalOff,
                to: AccessValue::Off,
            }
            .class(),
            ErrorClass::Configuration
        );
    }

    #[test]
    fn runtime_errors_are_classified() {
        assert_eq!(
            AccessError::MalformedLockOwner("w1".into()).class(),
            ErrorClass::MalformedState
        );
        assert_eq!(
            AccessError::Notify("smtp down".into()).class(),
            ErrorClass::Transient
        );
    }

    #[test]
    fn illegal_transition_display() {
        let err = AccessError::IllegalTransition {
            from: AccessValue::LocalOff,
            to: AccessValue::Readonly,
        };
        assert_eq!(err.to_string(), "Illegal access transition: local-off -> readonly");
    }
}
