//! The interactions a client can drive against an LSD server.

use serde::{Deserialize, Serialize};

/// One protocol interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    /// GET the Status Document.
    Fetch,
    /// GET the License Document linked from the Status Document.
    FetchLicense,
    /// POST to the `register` link.
    Register,
    /// PUT to the `renew` link with a new end date.
    Renew,
    /// PUT to the `return` link.
    Return,
}

impl Interaction {
    pub const ALL: [Interaction; 5] = [
        Self::Fetch,
        Self::FetchLicense,
        Self::Register,
        Self::Renew,
        Self::Return,
    ];

    /// Name used on the command line and in verdicts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::FetchLicense => "fetch_license",
            Self::Register => "register",
            Self::Renew => "renew",
            Self::Return => "return",
        }
    }
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Interaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| format!("unknown interaction {s:?}"))
    }
}
