//! One-time verification code purposes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a verification code unlocks.
///
/// Wire format: kebab-case string (`"signup"`, `"password-reset"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodePurpose {
    Signup,
    PasswordReset,
}

impl CodePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::PasswordReset => "password-reset",
        }
    }
}

impl fmt::Display for CodePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown code purpose: {0}")]
pub struct UnknownPurpose(pub String);

impl FromStr for CodePurpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(Self::Signup),
            "password-reset" => Ok(Self::PasswordReset),
            other => Err(UnknownPurpose(other.to_owned())),
        }
    }
}
