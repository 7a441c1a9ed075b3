//! Session settings and operator overrides
//!
//! Loaded from JSON by the host; the core never touches storage itself.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ARENA_HEIGHT, DEFAULT_ARENA_WIDTH};
use crate::error::SettingsError;

/// Difficulty slider position (1 = easiest, 10 = hardest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Build a slider value, rejecting anything outside 1..=10
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Slider position normalized to 0..=1
    pub fn slider_factor(self) -> f64 {
        f64::from(self.0 - 1) / 9.0
    }

    /// Easy settings get a late-game catch-up boost
    pub fn is_easy(self) -> bool {
        self.0 <= 3
    }

    pub fn as_str(self) -> &'static str {
        match self.0 {
            1..=3 => "Easy",
            4..=6 => "Moderate",
            _ => "Hard",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = SettingsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(SettingsError::Difficulty(value))
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

/// Operator/debug switches injected into the read paths that honour them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOverrides {
    /// Purchases never cost gold
    pub infinite_gold: bool,
    /// Castle ignores incoming damage
    pub infinite_health: bool,
    /// Waves schedule no enemies
    pub no_enemies: bool,
    /// Every scheduled spawn fires immediately
    pub fast_waves: bool,
    /// Waves only end through force-end
    pub manual_wave_end: bool,
    /// Golden box is sold this wave regardless of wave number
    pub force_golden_box: bool,
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub arena_width: f64,
    pub arena_height: f64,
    /// RNG seed for the session
    pub seed: u64,
    pub debug: DebugOverrides,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            arena_width: DEFAULT_ARENA_WIDTH,
            arena_height: DEFAULT_ARENA_HEIGHT,
            seed: 0x5EED,
            debug: DebugOverrides::default(),
        }
    }
}

impl Settings {
    /// Parse settings; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings = serde_json::from_str(json)?;
        log::info!("Loaded settings from json");
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }
}
