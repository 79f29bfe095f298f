//! Core type definitions used throughout the codebase

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a persisted battle record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Battle outcome as reported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Victory,
    Defeat,
}

impl Outcome {
    /// Parse a reported result string. Anything other than the two
    /// allowed values is a validation failure, not a third state.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "victory" => Some(Outcome::Victory),
            "defeat" => Some(Outcome::Defeat),
            _ => None,
        }
    }

    pub fn is_victory(&self) -> bool {
        matches!(self, Outcome::Victory)
    }
}

/// 2D map position as percentages of map extent
///
/// Values are expected in [0, 100] but are not clamped on ingestion;
/// out-of-range submissions only affect statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The unit of aggregation: a (map, enemy-type) pair
///
/// Both halves are matched by exact, case-sensitive string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub map: String,
    pub enemy: String,
}

impl ScenarioKey {
    pub fn new(map: impl Into<String>, enemy: impl Into<String>) -> Self {
        Self {
            map: map.into(),
            enemy: enemy.into(),
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.map, self.enemy)
    }
}

/// The four unit categories recognized by composition and zone math.
///
/// Category strings on deployments are open-ended; anything outside this
/// set is stored and round-tripped but excluded from the four-category
/// composition/zone summaries.
pub const RECOGNIZED_CATEGORIES: [&str; 4] = ["recon", "attack", "defense", "equipment"];

/// Total units in every recommended composition, data-driven or default
pub const SQUAD_SIZE: u32 = 6;

/// Units seen fewer times than this are excluded from top-unit rankings
pub const MIN_APPEARANCES: u32 = 2;

/// Maximum number of top units returned
pub const TOP_UNITS_LIMIT: usize = 5;

/// Confidence gained per recorded battle; saturates at 100 (10 battles)
pub const CONFIDENCE_PER_BATTLE: u32 = 10;

pub fn is_recognized_category(cat: &str) -> bool {
    RECOGNIZED_CATEGORIES.contains(&cat)
}
