//! Parking session status and its transition rules.
//!
//! Statuses are stored in their canonical upper-case form and every inbound
//! value goes through [`SessionStatus::from_str`], which trims and upper-cases
//! before matching against the closed set. Mixed-case values never reach the
//! database.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

pub const STATUS_PARKED: &str = "PARKED";
pub const STATUS_PAID: &str = "PAID";
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// All canonical status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_PARKED, STATUS_PAID, STATUS_COMPLETED];

/// Statuses that hold a slot in a lot.
pub const ACTIVE_STATUSES: &[&str] = &[STATUS_PARKED, STATUS_PAID];

/// Lifecycle state of a parking session.
///
/// `Parked` is the initial state and `Completed` the terminal one. `Paid` is
/// accepted when reading rows but no operation produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Parked,
    Paid,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parked => STATUS_PARKED,
            Self::Paid => STATUS_PAID,
            Self::Completed => STATUS_COMPLETED,
        }
    }

    /// Whether a session in this state still occupies a slot.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Parked | Self::Paid)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Parked, Self::Completed) | (Self::Paid, Self::Completed)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid session status '{0}'. Must be one of: PARKED, PAID, COMPLETED")]
pub struct InvalidStatus(pub String);

impl FromStr for SessionStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            STATUS_PARKED => Ok(Self::Parked),
            STATUS_PAID => Ok(Self::Paid),
            STATUS_COMPLETED => Ok(Self::Completed),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for SessionStatus {
    type Error = InvalidStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl<'de> Deserialize<'de> for SessionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
