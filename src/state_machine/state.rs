use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};

/// The four values of the platform access flag.
///
/// `On`, `Readonly` and `Off` express admin intent. `LocalOff` is written
/// only by the probe-driven outage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessValue {
    On,
    LocalOff,
    Readonly,
    Off,
}

impl fmt::Display for AccessValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessValue::On => write!(f, "on"),
            AccessValue::LocalOff => write!(f, "local-off"),
            AccessValue::Readonly => write!(f, "readonly"),
            AccessValue::Off => write!(f, "off"),
        }
    }
}

impl FromStr for AccessValue {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(AccessValue::On),
            "local-off" => Ok(AccessValue::LocalOff),
            "readonly" => Ok(AccessValue::Readonly),
            "off" => Ok(AccessValue::Off),
            other => Err(AccessError::InvalidAccessMode(other.to_string())),
        }
    }
}

/// How far a revoke pass lowers collaborator access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevokeLevel {
    Reader,
    NoAccess,
}

impl fmt::Display for RevokeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevokeLevel::Reader => write!(f, "reader"),
            RevokeLevel::NoAccess => write!(f, "no-access"),
        }
    }
}

impl FromStr for RevokeLevel {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reader" => Ok(RevokeLevel::Reader),
            "no-access" => Ok(RevokeLevel::NoAccess),
            other => Err(AccessError::InvalidAccessMode(other.to_string())),
        }
    }
}

/// What a bulk permission pass should do to managed workspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkMode {
    Revoke(RevokeLevel),
    Restore,
}

impl fmt::Display for BulkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkMode::Revoke(level) => write!(f, "revoke({level})"),
            BulkMode::Restore => write!(f, "restore"),
        }
    }
}

/// Which admin alert a transition asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Outage,
    Recovery,
}

/// Persisted access flag together with the alert latch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessState {
    pub value: AccessValue,
    /// True until an outage alert has been sent for the current episode.
    pub notifier_armed: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for AccessState {
    fn default() -> Self {
        Self {
            value: AccessValue::On,
            notifier_armed: true,
            updated_at: Utc::now(),
        }
    }
}

/// A committed change of the access flag and the side effects it requires.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: AccessValue,
    pub to: AccessValue,
    pub alert: Option<AlertKind>,
    pub bulk: BulkMode,
}

/// Owns every legal change of [`AccessState`].
pub struct AccessStateMachine;

impl AccessStateMachine {
    /// Compute and apply the automatic transition for a probe result.
    ///
    /// - unavailable while `On` enters `LocalOff`, alerting once per episode;
    /// - available while `LocalOff` returns to `On`, alerting once on recovery
    ///   and re-arming the latch;
    /// - every other combination leaves the state untouched.
    ///
    /// The latch is disarmed separately, by [`AccessStateMachine::alert_delivered`].
    pub fn on_probe(
        state: &mut AccessState,
        available: bool,
        outage_level: RevokeLevel,
    ) -> Option<Transition> {
        let transition = match (state.value, available) {
            (AccessValue::On, false) => Transition {
                from: AccessValue::On,
                to: AccessValue::LocalOff,
                alert: state.notifier_armed.then_some(AlertKind::Outage),
                bulk: BulkMode::Revoke(outage_level),
            },
            (AccessValue::LocalOff, true) => Transition {
                from: AccessValue::LocalOff,
                to: AccessValue::On,
                alert: (!state.notifier_armed).then_some(AlertKind::Recovery),
                bulk: BulkMode::Restore,
            },
            _ => return None,
        };

        state.value = transition.to;
        if transition.to == AccessValue::On {
            state.notifier_armed = true;
        }
        state.updated_at = Utc::now();
        Some(transition)
    }

    /// Records that an alert asked for by a transition reached the admins.
    ///
    /// Only a delivered outage alert disarms the latch; an undelivered one
    /// leaves it armed so the episode is never reported as recovered.
    pub fn alert_delivered(state: &mut AccessState, kind: AlertKind) -> bool {
        if kind == AlertKind::Outage && state.notifier_armed {
            state.notifier_armed = false;
            state.updated_at = Utc::now();
            return true;
        }
        false
    }

    /// Compute and apply a transition requested by an admin.
    ///
    /// `LocalOff` can never be requested. While in `LocalOff` the only
    /// accepted request is `On`, which ends the episode silently and re-arms
    /// the notifier. Requesting the current value is a no-op.
    pub fn admin_set(state: &mut AccessState, requested: AccessValue) -> Result<Option<Transition>> {
        if requested == AccessValue::LocalOff {
            return Err(AccessError::ReservedAccessValue);
        }
        if requested == state.value {
            return Ok(None);
        }
        if state.value == AccessValue::LocalOff && requested != AccessValue::On {
            return Err(AccessError::IllegalTransition {
                from: state.value,
                to: requested,
            });
        }

        let bulk = match requested {
            AccessValue::On => BulkMode::Restore,
            AccessValue::Readonly => BulkMode::Revoke(RevokeLevel::Reader),
            AccessValue::Off => BulkMode::Revoke(RevokeLevel::NoAccess),
            AccessValue::LocalOff => return Err(AccessError::ReservedAccessValue),
        };

        let transition = Transition {
            from: state.value,
            to: requested,
            alert: None,
            bulk,
        };
        if transition.from == AccessValue::LocalOff {
            state.notifier_armed = true;
        }
        state.value = requested;
        state.updated_at = Utc::now();
        Ok(Some(transition))
    }
}
