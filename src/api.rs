//! Request/response wire types
//!
//! These JSON shapes are the binding contract with the simulator client.
//! Field spellings (`maxHp`, `damageDealt`, `initialPositions`) come from
//! the client payload and are preserved via serde renames.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::RecordId;

/// One completed battle as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub map: String,
    #[serde(default)]
    pub enemy: String,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub spent: i64,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub timer: f64,
    #[serde(default)]
    pub allies: Vec<AllyPayload>,
    #[serde(default)]
    pub enemies: Vec<EnemyPayload>,
    /// Starting positions keyed by ally id; absent ids simply have none
    #[serde(default, rename = "initialPositions")]
    pub initial_positions: HashMap<String, PointPayload>,
}

/// One allied unit's end-of-battle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllyPayload {
    pub id: String,
    pub name: String,
    pub cat: String,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub hp: f64,
    #[serde(default, rename = "maxHp")]
    pub max_hp: f64,
    #[serde(default)]
    pub kills: u32,
    #[serde(default, rename = "damageDealt")]
    pub damage_dealt: f64,
}

/// One enemy unit, recorded for completeness; not aggregated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hp: f64,
    #[serde(default, rename = "maxHp")]
    pub max_hp: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointPayload {
    pub x: f64,
    pub y: f64,
}

/// Acknowledgement for a persisted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAck {
    pub success: bool,
    pub record_id: RecordId,
    pub message: String,
}

/// Scenario selector for recommendation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub map: String,
    #[serde(default)]
    pub enemy: String,
    #[serde(default)]
    pub budget: i64,
}

/// Global statistics across all stored battles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_simulations: u64,
    pub unique_sessions: u64,
    pub scenarios: Vec<ScenarioStats>,
    pub flywheel_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStats {
    pub map_id: String,
    pub enemy_type: String,
    pub count: u64,
    pub win_rate: f64,
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub narrative_enabled: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Service identity returned from the root route.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: &'static [&'static str],
}

/// Post-battle feedback response; `feedback` present only on generator success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
