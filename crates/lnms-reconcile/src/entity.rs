// ── Entity identity ──
//
// Every managed object is addressed by the positive integer LibreNMS
// assigns on creation. `EntityKind` and `Operation` tag errors and log
// lines with what was being reconciled.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

// ── EntityId ────────────────────────────────────────────────────────

/// Remote-assigned identifier. Always ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct EntityId(u32);

/// Why a string is not an [`EntityId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdError {
    #[error("not a number: {0}")]
    NotNumeric(#[from] ParseIntError),
    #[error("identifier must be positive")]
    NotPositive,
}

impl EntityId {
    pub fn new(raw: u32) -> Result<Self, ParseIdError> {
        if raw == 0 {
            Err(ParseIdError::NotPositive)
        } else {
            Ok(Self(raw))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('-') {
            return Err(ParseIdError::NotPositive);
        }
        Self::new(s.parse()?)
    }
}

impl TryFrom<u32> for EntityId {
    type Error = ParseIdError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// ── Kinds & operations ──────────────────────────────────────────────

/// The managed entity types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Device,
    DeviceGroup,
    AlertRule,
    Location,
    Service,
}

/// Lifecycle operations, for error and log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids() {
        let id: EntityId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn rejects_zero_negative_and_text() {
        assert_eq!("0".parse::<EntityId>(), Err(ParseIdError::NotPositive));
        assert_eq!("-3".parse::<EntityId>(), Err(ParseIdError::NotPositive));
        assert!(matches!(
            "abc".parse::<EntityId>(),
            Err(ParseIdError::NotNumeric(_))
        ));
        assert!(matches!(
            "99999999999".parse::<EntityId>(),
            Err(ParseIdError::NotNumeric(_))
        ));
    }

    #[test]
    fn serde_rejects_zero() {
        assert!(serde_json::from_str::<EntityId>("0").is_err());
        assert_eq!(serde_json::from_str::<EntityId>("5").unwrap().get(), 5);
    }

    #[test]
    fn kinds_display_snake_case() {
        assert_eq!(EntityKind::DeviceGroup.to_string(), "device_group");
        assert_eq!(Operation::Import.to_string(), "import");
    }
}
