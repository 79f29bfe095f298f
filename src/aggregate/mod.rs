//! Scenario-scoped statistical rollup
//!
//! Pure computation over materialized battle rows; recomputed fresh on
//! every recommendation request. All math is guarded against zero rows —
//! an empty scenario yields a zeroed snapshot, never an error.

use std::collections::HashMap;

use crate::core::types::is_recognized_category;
use crate::store::StoredBattle;

/// Rolling stats for one unit display name.
///
/// Units are keyed by name alone; category and cost are the last seen.
/// A display name that changes category over time blends its history
/// into one entry. Known limitation, kept deliberately.
#[derive(Debug, Clone)]
pub struct UnitStats {
    pub name: String,
    pub category: String,
    pub cost: i64,
    pub appearances: u32,
    pub wins: u32,
    pub kill_total: u64,
}

impl UnitStats {
    pub fn win_rate(&self) -> f64 {
        if self.appearances == 0 {
            0.0
        } else {
            self.wins as f64 / self.appearances as f64 * 100.0
        }
    }

    pub fn avg_kills(&self) -> f64 {
        if self.appearances == 0 {
            0.0
        } else {
            self.kill_total as f64 / self.appearances as f64
        }
    }
}

/// Rolling stats for one recognized category within a scenario.
#[derive(Debug, Clone, Default)]
pub struct CategoryStats {
    pub appearances: u32,
    pub wins: u32,
    sum_x: f64,
    sum_y: f64,
}

impl CategoryStats {
    pub fn win_rate(&self) -> f64 {
        if self.appearances == 0 {
            0.0
        } else {
            self.wins as f64 / self.appearances as f64 * 100.0
        }
    }

    /// Mean final x across all appearances of this category
    pub fn mean_x(&self) -> f64 {
        if self.appearances == 0 {
            0.0
        } else {
            self.sum_x / self.appearances as f64
        }
    }

    /// Mean final y across all appearances of this category
    pub fn mean_y(&self) -> f64 {
        if self.appearances == 0 {
            0.0
        } else {
            self.sum_y / self.appearances as f64
        }
    }
}

/// Everything the composer needs about one scenario.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSnapshot {
    pub total: u32,
    pub wins: u32,
    /// Per-unit-name stats, any category string
    pub units: HashMap<String, UnitStats>,
    /// Per-category stats, recognized categories only
    pub categories: HashMap<String, CategoryStats>,
}

impl ScenarioSnapshot {
    /// Roll up a scenario's battle rows, in insertion order.
    pub fn build(battles: &[StoredBattle]) -> Self {
        let mut snapshot = Self::default();

        for battle in battles {
            let won = battle.record.outcome.is_victory();
            snapshot.total += 1;
            if won {
                snapshot.wins += 1;
            }

            for ally in &battle.allies {
                let unit = snapshot
                    .units
                    .entry(ally.name.clone())
                    .or_insert_with(|| UnitStats {
                        name: ally.name.clone(),
                        category: ally.category.clone(),
                        cost: ally.cost,
                        appearances: 0,
                        wins: 0,
                        kill_total: 0,
                    });
                unit.appearances += 1;
                if won {
                    unit.wins += 1;
                }
                unit.kill_total += u64::from(ally.kills);
                // last-seen category and cost win
                unit.category = ally.category.clone();
                unit.cost = ally.cost;

                if is_recognized_category(&ally.category) {
                    let cat = snapshot
                        .categories
                        .entry(ally.category.clone())
                        .or_default();
                    cat.appearances += 1;
                    if won {
                        cat.wins += 1;
                    }
                    cat.sum_x += ally.position.x;
                    cat.sum_y += ally.position.y;
                }
            }
        }

        snapshot
    }

    /// Overall win rate in percent, rounded to 1 decimal; 0.0 for an
    /// empty scenario.
    pub fn overall_win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            round1(self.wins as f64 / self.total as f64 * 100.0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Round to 1 decimal place
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Outcome, Position, RecordId};
    use crate::store::{BattleRecord, UnitDeployment};

    fn deployment(name: &str, category: &str, kills: u32, x: f64, y: f64) -> UnitDeployment {
        UnitDeployment {
            unit_id: format!("{}-id", name),
            name: name.into(),
            category: category.into(),
            cost: 50_000,
            position: Position::new(x, y),
            initial_position: None,
            hp: 50.0,
            max_hp: 100.0,
            kills,
            damage_dealt: kills as f64 * 100.0,
        }
    }

    fn battle(outcome: Outcome, allies: Vec<UnitDeployment>) -> StoredBattle {
        StoredBattle {
            record: BattleRecord {
                id: RecordId::new(),
                session_id: "s".into(),
                map: "urban".into(),
                enemy: "army".into(),
                budget: 1_000_000,
                spent: 800_000,
                outcome,
                timer_secs: 120.0,
                created_at: chrono::Utc::now(),
            },
            allies,
            enemies: Vec::new(),
        }
    }

    #[test]
    fn empty_input_yields_zeroed_snapshot() {
        let snapshot = ScenarioSnapshot::build(&[]);
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.overall_win_rate(), 0.0);
        assert!(snapshot.units.is_empty());
        assert!(snapshot.categories.is_empty());
    }

    #[test]
    fn overall_win_rate_rounds_to_one_decimal() {
        let battles = vec![
            battle(Outcome::Victory, vec![]),
            battle(Outcome::Victory, vec![]),
            battle(Outcome::Defeat, vec![]),
        ];
        let snapshot = ScenarioSnapshot::build(&battles);
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.wins, 2);
        assert_eq!(snapshot.overall_win_rate(), 66.7);
    }

    #[test]
    fn unit_stats_track_appearances_wins_and_kills() {
        let battles = vec![
            battle(
                Outcome::Victory,
                vec![deployment("Raven", "recon", 2, 50.0, 85.0)],
            ),
            battle(
                Outcome::Defeat,
                vec![deployment("Raven", "recon", 0, 60.0, 75.0)],
            ),
        ];
        let snapshot = ScenarioSnapshot::build(&battles);
        let raven = &snapshot.units["Raven"];
        assert_eq!(raven.appearances, 2);
        assert_eq!(raven.wins, 1);
        assert_eq!(raven.win_rate(), 50.0);
        assert_eq!(raven.avg_kills(), 1.0);
    }

    #[test]
    fn unit_identity_blends_on_category_change_last_seen_wins() {
        let battles = vec![
            battle(
                Outcome::Victory,
                vec![deployment("Hornet", "recon", 0, 50.0, 85.0)],
            ),
            battle(
                Outcome::Victory,
                vec![deployment("Hornet", "attack", 1, 30.0, 90.0)],
            ),
        ];
        let snapshot = ScenarioSnapshot::build(&battles);
        assert_eq!(snapshot.units.len(), 1);
        let hornet = &snapshot.units["Hornet"];
        assert_eq!(hornet.appearances, 2);
        assert_eq!(hornet.category, "attack");
    }

    #[test]
    fn category_means_average_final_positions() {
        let battles = vec![
            battle(
                Outcome::Victory,
                vec![
                    deployment("Raven", "recon", 0, 40.0, 80.0),
                    deployment("Hornet", "recon", 0, 60.0, 90.0),
                ],
            ),
            battle(
                Outcome::Defeat,
                vec![deployment("Raven", "recon", 0, 50.0, 70.0)],
            ),
        ];
        let snapshot = ScenarioSnapshot::build(&battles);
        let recon = &snapshot.categories["recon"];
        assert_eq!(recon.appearances, 3);
        assert_eq!(recon.wins, 2);
        assert!((recon.mean_x() - 50.0).abs() < 1e-9);
        assert!((recon.mean_y() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn unrecognized_categories_stay_out_of_category_stats() {
        let battles = vec![battle(
            Outcome::Victory,
            vec![
                deployment("Howitzer", "artillery", 3, 20.0, 95.0),
                deployment("Raven", "recon", 0, 50.0, 85.0),
            ],
        )];
        let snapshot = ScenarioSnapshot::build(&battles);
        assert!(snapshot.units.contains_key("Howitzer"));
        assert!(!snapshot.categories.contains_key("artillery"));
        assert!(snapshot.categories.contains_key("recon"));
    }
}
