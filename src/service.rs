//! Service facade tying the store, composer and narrative adapter together
//!
//! Each method is one independent unit of work; the store is the only
//! shared resource. Aggregates are recomputed fresh on every
//! recommendation request.

use std::collections::{BTreeMap, HashSet};

use crate::advisor::{recommend, Recommendation};
use crate::aggregate::{round1, ScenarioSnapshot};
use crate::api::{
    FeedbackResponse, HealthResponse, RecommendRequest, ScenarioStats, StatsResponse, SubmitAck,
    SubmitRequest,
};
use crate::core::error::Result;
use crate::core::types::ScenarioKey;
use crate::llm::{narrative, LlmClient};
use crate::store::EventStore;

/// Flywheel status thresholds (total submissions)
const FLYWHEEL_ACCUMULATING: u64 = 10;
const FLYWHEEL_ESTABLISHED: u64 = 100;

pub struct AdvisorService {
    store: EventStore,
    llm: Option<LlmClient>,
}

impl AdvisorService {
    pub fn new(store: EventStore, llm: Option<LlmClient>) -> Self {
        Self { store, llm }
    }

    pub fn narrative_enabled(&self) -> bool {
        self.llm.is_some()
    }

    /// Persist one submitted battle.
    pub fn submit(&self, submission: &SubmitRequest) -> Result<SubmitAck> {
        let record_id = self.store.record(submission)?;
        tracing::info!(
            %record_id,
            map = %submission.map,
            enemy = %submission.enemy,
            result = %submission.result,
            "Simulation recorded"
        );
        Ok(SubmitAck {
            success: true,
            record_id,
            message: "Simulation recorded".into(),
        })
    }

    /// Structured recommendation for a scenario; empty scenarios yield
    /// the default recommendation, never an error.
    pub fn recommend(&self, request: &RecommendRequest) -> Result<Recommendation> {
        let key = ScenarioKey::new(request.map.clone(), request.enemy.clone());
        let battles = self.store.by_scenario(&key)?;
        let snapshot = ScenarioSnapshot::build(&battles);
        tracing::info!(
            scenario = %key,
            data_points = snapshot.total,
            "Recommendation computed"
        );
        Ok(recommend(&key, request.budget, &snapshot))
    }

    /// Structured recommendation plus a prose briefing when the text
    /// generator is configured and succeeds; structurally identical
    /// otherwise.
    pub async fn recommend_with_narrative(
        &self,
        request: &RecommendRequest,
    ) -> Result<Recommendation> {
        let mut rec = self.recommend(request)?;
        rec.narrative = narrative::narrate(self.llm.as_ref(), &rec).await;
        Ok(rec)
    }

    /// Post-battle feedback; degrades to an unsuccessful-but-200 payload
    /// when the generator is unavailable.
    pub async fn feedback(&self, battle: &SubmitRequest) -> FeedbackResponse {
        match narrative::battle_feedback(self.llm.as_ref(), battle).await {
            Some(feedback) => FeedbackResponse {
                success: true,
                feedback: Some(feedback),
                error: None,
            },
            None => FeedbackResponse {
                success: false,
                feedback: None,
                error: Some("Could not generate feedback".into()),
            },
        }
    }

    /// Global statistics across all stored battles.
    pub fn stats(&self) -> Result<StatsResponse> {
        let battles = self.store.all()?;

        let total = battles.len() as u64;
        let unique_sessions = battles
            .iter()
            .map(|b| b.record.session_id.as_str())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<_>>()
            .len() as u64;

        let mut per_scenario: BTreeMap<(String, String), (u64, u64)> = BTreeMap::new();
        for battle in &battles {
            let entry = per_scenario
                .entry((battle.record.map.clone(), battle.record.enemy.clone()))
                .or_default();
            entry.0 += 1;
            if battle.record.outcome.is_victory() {
                entry.1 += 1;
            }
        }

        let scenarios = per_scenario
            .into_iter()
            .map(|((map_id, enemy_type), (count, wins))| ScenarioStats {
                map_id,
                enemy_type,
                count,
                win_rate: round1(wins as f64 / count as f64 * 100.0),
            })
            .collect();

        Ok(StatsResponse {
            total_simulations: total,
            unique_sessions,
            scenarios,
            flywheel_status: flywheel_status(total).into(),
        })
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy",
            narrative_enabled: self.narrative_enabled(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// How much data the feedback loop has accumulated so far.
fn flywheel_status(total_simulations: u64) -> &'static str {
    if total_simulations >= FLYWHEEL_ESTABLISHED {
        "established"
    } else if total_simulations >= FLYWHEEL_ACCUMULATING {
        "accumulating"
    } else {
        "bootstrapping"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flywheel_status_tracks_volume() {
        assert_eq!(flywheel_status(0), "bootstrapping");
        assert_eq!(flywheel_status(9), "bootstrapping");
        assert_eq!(flywheel_status(10), "accumulating");
        assert_eq!(flywheel_status(99), "accumulating");
        assert_eq!(flywheel_status(100), "established");
    }
}
