use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Actor role carried by every principal.
///
/// The wire literal is lowercase (`"diner"`, `"merchant"`), matching the
/// `role` claim minted by the token issuer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Browses venues and places orders.
    Diner,
    /// Owns venues and fulfills their orders.
    Merchant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Diner => "diner",
            Role::Merchant => "merchant",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diner" => Ok(Role::Diner),
            "merchant" => Ok(Role::Merchant),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
