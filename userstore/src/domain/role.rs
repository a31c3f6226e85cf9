//! Subscription role attached to every user account.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Subscription tier for a user account.
///
/// Stored in the database as its lowercase string value. New accounts
/// default to [`Role::Demo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Trial access.
    #[default]
    Demo,
    /// Regular subscription.
    Basic,
    /// Extended subscription.
    Pro,
}

impl Role {
    /// Stored string value for this role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Basic => "basic",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role value is not one of the known tiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised role value: {value}")]
pub struct ParseRoleError {
    value: String,
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "demo" => Ok(Self::Demo),
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            other => Err(ParseRoleError {
                value: other.to_owned(),
            }),
        }
    }
}
