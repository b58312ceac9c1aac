//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types and event entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A wall-clock field did not parse as `HH:MM`.
    #[error("{field} time must be HH:MM, got {value:?}")]
    InvalidTime { field: &'static str, value: String },

    /// Start and end are the same instant.
    #[error("start and end times are equal; an event needs a non-zero duration")]
    ZeroLengthInterval,

    /// The value is not a usable event identity.
    #[error("invalid event ID: {value:?}")]
    InvalidId { value: String },
}

/// A stable, globally unique event identifier.
///
/// Identities are assigned once, when the event is created (or when a legacy
/// record without one is first loaded), and never change across edits.
/// Serialized as a hyphenated UUID without braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(Uuid);

impl EventId {
    /// Generates a fresh random identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for EventId {
    type Err = ValidationError;

    /// Accepts hyphenated, simple, braced and URN forms. The nil UUID is
    /// rejected because it cannot identify anything.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Uuid::parse_str(s) {
            Ok(uuid) if !uuid.is_nil() => Ok(Self(uuid)),
            _ => Err(ValidationError::InvalidId {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for EventId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.to_string()
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
