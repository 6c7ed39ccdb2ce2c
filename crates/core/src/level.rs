//! Sticker levels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sticker level
///
/// The declaration order is the natural progression order, but the active
/// progression is defined by the [`ThresholdTable`](crate::ThresholdTable),
/// not by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Starting level of every sticker
    Bronze,
    /// Second level
    Silver,
    /// Third level
    Gold,
    /// Highest level
    Platinum,
}

impl Level {
    /// All levels in progression order
    pub const ALL: [Level; 4] = [Level::Bronze, Level::Silver, Level::Gold, Level::Platinum];

    /// Lowercase name, as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Bronze => "bronze",
            Level::Silver => "silver",
            Level::Gold => "gold",
            Level::Platinum => "platinum",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bronze" => Ok(Level::Bronze),
            "silver" => Ok(Level::Silver),
            "gold" => Ok(Level::Gold),
            "platinum" => Ok(Level::Platinum),
            other => Err(crate::Error::InvalidInput(format!("unknown level: {}", other))),
        }
    }
}
