//! Append-only event store for submitted battles
//!
//! Every submission becomes one JSON line holding the battle record plus
//! all of its unit rows, so a record and its deployments are durable
//! together or not at all. Reads materialize the full log; the volumes
//! involved are low thousands of rows.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::SubmitRequest;
use crate::core::error::{AdvisorError, Result};
use crate::core::types::{Outcome, Position, RecordId, ScenarioKey};

/// One submitted simulation outcome. Created once on submission, never
/// mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleRecord {
    pub id: RecordId,
    pub session_id: String,
    pub map: String,
    pub enemy: String,
    pub budget: i64,
    /// Not validated against budget; submissions are trusted as-is
    pub spent: i64,
    pub outcome: Outcome,
    pub timer_secs: f64,
    pub created_at: DateTime<Utc>,
}

/// One allied unit's participation in one battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDeployment {
    pub unit_id: String,
    pub name: String,
    /// Open-ended category string; only the recognized four enter
    /// composition and zone math
    pub category: String,
    pub cost: i64,
    pub position: Position,
    pub initial_position: Option<Position>,
    pub hp: f64,
    pub max_hp: f64,
    pub kills: u32,
    pub damage_dealt: f64,
}

/// Enemy roster entry, stored for debugging; not aggregated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyUnit {
    pub unit_id: String,
    pub name: String,
    pub hp: f64,
    pub max_hp: f64,
}

/// The unit of durability: one line in the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBattle {
    pub record: BattleRecord,
    pub allies: Vec<UnitDeployment>,
    pub enemies: Vec<EnemyUnit>,
}

impl StoredBattle {
    pub fn scenario(&self) -> ScenarioKey {
        ScenarioKey::new(self.record.map.clone(), self.record.enemy.clone())
    }
}

/// Durable append-only log of battles.
pub struct EventStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl EventStore {
    /// Open (or create) a store backed by the given log file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Validate and persist a submission. The append happens under the
    /// store lock as a single write, so concurrent readers never observe
    /// a record without its deployments.
    pub fn record(&self, submission: &SubmitRequest) -> Result<RecordId> {
        let battle = Self::validate(submission)?;
        let id = battle.record.id;

        let line = serde_json::to_string(&battle)?;
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        tracing::debug!(record_id = %id, scenario = %battle.scenario(), "Battle recorded");
        Ok(id)
    }

    /// All battles for a scenario, in insertion order.
    pub fn by_scenario(&self, key: &ScenarioKey) -> Result<Vec<StoredBattle>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|b| b.record.map == key.map && b.record.enemy == key.enemy)
            .collect())
    }

    /// Every stored battle, in insertion order.
    pub fn all(&self) -> Result<Vec<StoredBattle>> {
        self.read_all()
    }

    fn read_all(&self) -> Result<Vec<StoredBattle>> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut battles = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredBattle>(line) {
                Ok(battle) => battles.push(battle),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unparseable log line");
                }
            }
        }
        Ok(battles)
    }

    /// Check required fields and convert the wire payload into the
    /// stored shape. No semantic validation of costs or positions is
    /// performed; garbage values only affect statistics.
    fn validate(submission: &SubmitRequest) -> Result<StoredBattle> {
        if submission.map.trim().is_empty() {
            return Err(AdvisorError::Validation("map is required".into()));
        }
        if submission.enemy.trim().is_empty() {
            return Err(AdvisorError::Validation("enemy is required".into()));
        }
        let outcome = Outcome::parse(&submission.result).ok_or_else(|| {
            AdvisorError::Validation(format!(
                "result must be \"victory\" or \"defeat\", got {:?}",
                submission.result
            ))
        })?;

        let allies = submission
            .allies
            .iter()
            .map(|a| UnitDeployment {
                unit_id: a.id.clone(),
                name: a.name.clone(),
                category: a.cat.clone(),
                cost: a.cost,
                position: Position::new(a.x, a.y),
                initial_position: submission
                    .initial_positions
                    .get(&a.id)
                    .map(|p| Position::new(p.x, p.y)),
                hp: a.hp,
                max_hp: a.max_hp,
                kills: a.kills,
                damage_dealt: a.damage_dealt,
            })
            .collect();

        let enemies = submission
            .enemies
            .iter()
            .map(|e| EnemyUnit {
                unit_id: e.id.clone(),
                name: e.name.clone(),
                hp: e.hp,
                max_hp: e.max_hp,
            })
            .collect();

        Ok(StoredBattle {
            record: BattleRecord {
                id: RecordId::new(),
                session_id: submission.session_id.clone(),
                map: submission.map.clone(),
                enemy: submission.enemy.clone(),
                budget: submission.budget,
                spent: submission.spent,
                outcome,
                timer_secs: submission.timer,
                created_at: Utc::now(),
            },
            allies,
            enemies,
        })
    }
}

fn poisoned() -> AdvisorError {
    AdvisorError::Storage("store lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AllyPayload;

    fn submission(map: &str, enemy: &str, result: &str) -> SubmitRequest {
        SubmitRequest {
            session_id: "s-1".into(),
            map: map.into(),
            enemy: enemy.into(),
            budget: 2_000_000,
            spent: 1_200_000,
            result: result.into(),
            timer: 180.0,
            allies: vec![AllyPayload {
                id: "u1".into(),
                name: "RQ-11 Raven".into(),
                cat: "recon".into(),
                cost: 35_000,
                x: 50.0,
                y: 85.0,
                hp: 80.0,
                max_hp: 100.0,
                kills: 1,
                damage_dealt: 120.0,
            }],
            enemies: Vec::new(),
            initial_positions: Default::default(),
        }
    }

    fn temp_store() -> (tempfile::TempDir, EventStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open(dir.path().join("battles.jsonl")).unwrap();
        (dir, store)
    }

    #[test]
    fn record_rejects_missing_required_fields() {
        let (_dir, store) = temp_store();

        let err = store.record(&submission("", "army", "victory")).unwrap_err();
        assert!(matches!(err, AdvisorError::Validation(_)));

        let err = store.record(&submission("urban", "", "victory")).unwrap_err();
        assert!(matches!(err, AdvisorError::Validation(_)));

        let err = store.record(&submission("urban", "army", "draw")).unwrap_err();
        assert!(matches!(err, AdvisorError::Validation(_)));
    }

    #[test]
    fn record_then_query_round_trips_in_insertion_order() {
        let (_dir, store) = temp_store();
        let key = ScenarioKey::new("urban", "army");

        let first = store.record(&submission("urban", "army", "victory")).unwrap();
        let second = store.record(&submission("urban", "army", "defeat")).unwrap();
        store.record(&submission("desert", "army", "victory")).unwrap();

        let battles = store.by_scenario(&key).unwrap();
        assert_eq!(battles.len(), 2);
        assert_eq!(battles[0].record.id, first);
        assert_eq!(battles[1].record.id, second);
        assert_eq!(battles[0].record.outcome, Outcome::Victory);
        assert_eq!(battles[0].allies.len(), 1);
        assert_eq!(battles[0].allies[0].name, "RQ-11 Raven");
    }

    #[test]
    fn unknown_category_and_overspend_are_stored_untouched() {
        let (_dir, store) = temp_store();

        let mut sub = submission("urban", "army", "victory");
        sub.allies[0].cat = "artillery".into();
        sub.spent = sub.budget + 500_000;
        store.record(&sub).unwrap();

        let battles = store.by_scenario(&ScenarioKey::new("urban", "army")).unwrap();
        assert_eq!(battles[0].allies[0].category, "artillery");
        assert!(battles[0].record.spent > battles[0].record.budget);
    }

    #[test]
    fn initial_positions_attach_per_unit_id() {
        let (_dir, store) = temp_store();

        let mut sub = submission("urban", "army", "victory");
        sub.initial_positions
            .insert("u1".into(), crate::api::PointPayload { x: 10.0, y: 92.0 });
        store.record(&sub).unwrap();

        let battles = store.by_scenario(&ScenarioKey::new("urban", "army")).unwrap();
        let pos = battles[0].allies[0].initial_position.unwrap();
        assert_eq!(pos.x, 10.0);
        assert_eq!(pos.y, 92.0);
    }

    #[test]
    fn corrupt_lines_are_skipped_not_fatal() {
        let (dir, store) = temp_store();
        store.record(&submission("urban", "army", "victory")).unwrap();

        let path = dir.path().join("battles.jsonl");
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{not json}\n");
        std::fs::write(&path, content).unwrap();
        store.record(&submission("urban", "army", "defeat")).unwrap();

        assert_eq!(store.all().unwrap().len(), 2);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert!(store.all().unwrap().is_empty());
        assert!(store
            .by_scenario(&ScenarioKey::new("urban", "army"))
            .unwrap()
            .is_empty());
    }
}
