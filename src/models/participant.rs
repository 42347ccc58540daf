//! Message and session participants
//!
//! Senders, recipients, read-cursor owners and session principals are all
//! stored as short strings: `admin:<id>`, `intern:<id>` or `all_admins`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::ParseEnumError;

/// Stored form of the shared admin inbox
pub const ADMIN_TEAM: &str = "all_admins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Participant {
    Admin(i64),
    Intern(i64),
    /// Every admin at once; only ever a recipient
    AdminTeam,
}

impl Participant {
    pub fn is_admin_side(&self) -> bool {
        matches!(self, Participant::Admin(_) | Participant::AdminTeam)
    }

    pub fn intern_id(&self) -> Option<i64> {
        match self {
            Participant::Intern(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::Admin(id) => write!(f, "admin:{}", id),
            Participant::Intern(id) => write!(f, "intern:{}", id),
            Participant::AdminTeam => f.write_str(ADMIN_TEAM),
        }
    }
}

impl FromStr for Participant {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == ADMIN_TEAM {
            return Ok(Participant::AdminTeam);
        }

        let (kind, id) = trimmed
            .split_once(':')
            .ok_or_else(|| ParseEnumError::new("Participant", s))?;
        let id: i64 = id
            .parse()
            .map_err(|_| ParseEnumError::new("Participant", s))?;

        match kind {
            "admin" => Ok(Participant::Admin(id)),
            "intern" => Ok(Participant::Intern(id)),
            _ => Err(ParseEnumError::new("Participant", s)),
        }
    }
}

impl TryFrom<String> for Participant {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Participant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Participant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
