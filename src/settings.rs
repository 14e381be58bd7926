//! Match settings
//!
//! Owned by the match aggregate and persisted with it. The service layer
//! usually builds these from a preset or a JSON request body.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Common match formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MatchFormat {
    /// 301, single leg
    Quick,
    /// 501, best of 3 legs
    #[default]
    Standard,
    /// 501, best of 5 sets of best of 5 legs, clear by two
    Championship,
}

impl MatchFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchFormat::Quick => "Quick",
            MatchFormat::Standard => "Standard",
            MatchFormat::Championship => "Championship",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quick" => Some(MatchFormat::Quick),
            "standard" | "std" => Some(MatchFormat::Standard),
            "championship" | "champ" => Some(MatchFormat::Championship),
            _ => None,
        }
    }

    /// Starting score for this format
    pub fn x01(&self) -> u32 {
        match self {
            MatchFormat::Quick => 301,
            MatchFormat::Standard | MatchFormat::Championship => 501,
        }
    }

    /// Best-of targets for this format
    pub fn best_of(&self) -> BestOf {
        match self {
            MatchFormat::Quick => BestOf { sets: 1, legs: 1 },
            MatchFormat::Standard => BestOf { sets: 1, legs: 3 },
            MatchFormat::Championship => BestOf { sets: 5, legs: 5 },
        }
    }
}

/// Best-of targets per level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestOf {
    pub sets: u32,
    pub legs: u32,
}

impl Default for BestOf {
    fn default() -> Self {
        Self { sets: 1, legs: 3 }
    }
}

/// Clear-by-two rule for one level (legs within a set, or sets within a match)
///
/// When enabled, a leader must be two wins clear unless `limit` extra
/// entities beyond the best-of target have already been played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearByTwo {
    pub enabled: bool,
    /// Extra entities allowed beyond best-of before a decision is forced
    pub limit: u32,
}

impl Default for ClearByTwo {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: 2,
        }
    }
}

impl ClearByTwo {
    pub fn enabled(limit: u32) -> Self {
        Self {
            enabled: true,
            limit,
        }
    }

    /// Highest entity number that may ever be created for a best-of target
    pub fn ceiling(&self, best_of: u32) -> u32 {
        if self.enabled {
            best_of + self.limit
        } else {
            best_of
        }
    }
}

/// Settings for a single match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Starting score of every leg (301, 501, ...)
    pub x01: u32,
    pub best_of: BestOf,
    /// Applied when deciding a set from its legs
    #[serde(default)]
    pub clear_by_two_legs: ClearByTwo,
    /// Applied when deciding the match from its sets
    #[serde(default)]
    pub clear_by_two_sets: ClearByTwo,
    /// Record doubles missed per turn (otherwise always 0)
    #[serde(default)]
    pub track_doubles: bool,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self::from_format(MatchFormat::Standard)
    }
}

impl MatchSettings {
    /// Create settings from a format preset
    pub fn from_format(format: MatchFormat) -> Self {
        let clear_by_two = if format == MatchFormat::Championship {
            ClearByTwo::enabled(2)
        } else {
            ClearByTwo::default()
        };
        Self {
            x01: format.x01(),
            best_of: format.best_of(),
            clear_by_two_legs: clear_by_two,
            clear_by_two_sets: clear_by_two,
            track_doubles: false,
        }
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::invalid(format!("settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(101..=1001).contains(&self.x01) || self.x01 % 100 != 1 {
            return Err(EngineError::invalid(format!(
                "x01 must be one of 101, 201, ... 1001 (got {})",
                self.x01
            )));
        }
        if self.best_of.sets == 0 || self.best_of.legs == 0 {
            return Err(EngineError::invalid("best-of values must be at least 1"));
        }
        for (level, rule) in [
            ("legs", self.clear_by_two_legs),
            ("sets", self.clear_by_two_sets),
        ] {
            if rule.enabled && rule.limit == 0 {
                return Err(EngineError::invalid(format!(
                    "clear-by-two limit for {level} must be at least 1 when enabled"
                )));
            }
        }
        Ok(())
    }

    /// Most legs a single set can ever hold
    pub fn max_legs(&self) -> u32 {
        self.clear_by_two_legs.ceiling(self.best_of.legs)
    }

    /// Most sets a match can ever hold
    pub fn max_sets(&self) -> u32 {
        self.clear_by_two_sets.ceiling(self.best_of.sets)
    }
}
