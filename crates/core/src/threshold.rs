//! Level threshold table
//!
//! The table is an ordered chain of entries `(level, stars_required,
//! next_level)`. A record at `level` moves to `next_level` once its star count
//! reaches `stars_required`. The last entry has no `next_level`; its
//! `stars_required` is never consulted and defaults to `u32::MAX`.
//!
//! A table can only be built through [`ThresholdTable::new`], which enforces:
//! - at least one entry, starting at [`Level::Bronze`]
//! - unique levels
//! - `stars_required` strictly ascending, the first one at least 1
//! - each `next_level` names the following entry; only the last has none
//!
//! Together with one-star increments these rules mean a single purchase can
//! cross at most one threshold.

use crate::error::{Error, Result};
use crate::level::Level;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn unbounded() -> u32 {
    u32::MAX
}

/// One row of the threshold table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    /// Level this row describes
    pub level: Level,
    /// Star count at which a record leaves `level`
    #[serde(default = "unbounded")]
    pub stars_required: u32,
    /// Level reached at `stars_required`; `None` on the highest level
    #[serde(default)]
    pub next_level: Option<Level>,
}

impl LevelThreshold {
    /// A row that advances to `next` at `stars_required`
    pub fn advancing(level: Level, stars_required: u32, next: Level) -> Self {
        Self {
            level,
            stars_required,
            next_level: Some(next),
        }
    }

    /// The terminal row
    pub fn terminal(level: Level) -> Self {
        Self {
            level,
            stars_required: unbounded(),
            next_level: None,
        }
    }
}

static STANDARD: Lazy<ThresholdTable> = Lazy::new(|| ThresholdTable {
    entries: vec![
        LevelThreshold::advancing(Level::Bronze, 5, Level::Silver),
        LevelThreshold::advancing(Level::Silver, 15, Level::Gold),
        LevelThreshold::advancing(Level::Gold, 30, Level::Platinum),
        LevelThreshold::terminal(Level::Platinum),
    ],
});

/// Validated, immutable level progression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ThresholdTable {
    entries: Vec<LevelThreshold>,
}

impl ThresholdTable {
    /// Validate and build a table
    ///
    /// # Errors
    ///
    /// [`Error::InvalidThresholdConfig`] naming the first rule the entries break.
    pub fn new(entries: Vec<LevelThreshold>) -> Result<Self> {
        validate(&entries)?;
        Ok(Self { entries })
    }

    /// The built-in table: bronze→silver at 5, silver→gold at 15,
    /// gold→platinum at 30
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    /// Rows in progression order
    pub fn entries(&self) -> &[LevelThreshold] {
        &self.entries
    }

    /// Level every new record starts at
    pub fn first_level(&self) -> Level {
        self.entries[0].level
    }

    /// Row describing `level`, if the table contains it
    pub fn entry(&self, level: Level) -> Option<&LevelThreshold> {
        self.entries.iter().find(|e| e.level == level)
    }

    /// Level the table assigns to `star_count`
    pub fn level_for(&self, star_count: u64) -> Level {
        let mut level = self.first_level();
        for entry in &self.entries {
            match entry.next_level {
                Some(next) if star_count >= u64::from(entry.stars_required) => level = next,
                _ => break,
            }
        }
        level
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a validated table
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for ThresholdTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<LevelThreshold>::deserialize(deserializer)?;
        ThresholdTable::new(entries).map_err(serde::de::Error::custom)
    }
}

fn validate(entries: &[LevelThreshold]) -> Result<()> {
    let invalid = |msg: String| Err(Error::InvalidThresholdConfig(msg));

    let first = match entries.first() {
        Some(first) => first,
        None => return invalid("threshold table is empty".to_string()),
    };
    if first.level != Level::Bronze {
        return invalid(format!("table must start at bronze, starts at {}", first.level));
    }
    if first.next_level.is_some() && first.stars_required == 0 {
        return invalid("first threshold must require at least 1 star".to_string());
    }

    let mut seen = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        if !seen.insert(entry.level) {
            return invalid(format!("duplicate level {}", entry.level));
        }

        match (entries.get(i + 1), entry.next_level) {
            (Some(following), Some(next)) => {
                if next != following.level {
                    return invalid(format!(
                        "{} advances to {} but the next row is {}",
                        entry.level, next, following.level
                    ));
                }
                if following.stars_required <= entry.stars_required {
                    return invalid(format!(
                        "stars_required must ascend: {} needs {}, {} needs {}",
                        entry.level,
                        entry.stars_required,
                        following.level,
                        following.stars_required
                    ));
                }
            }
            (Some(_), None) => {
                return invalid(format!("{} has no next_level but is not the last row", entry.level));
            }
            (None, Some(next)) => {
                return invalid(format!("last row {} advances to missing level {}", entry.level, next));
            }
            (None, None) => {}
        }
    }
    Ok(())
}
