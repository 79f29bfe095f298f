//! Recommendation composer
//!
//! Turns a scenario snapshot into the structured suggestion returned to
//! the client: a six-unit category split, top performers, mean deployment
//! zones and rule-based tactical notes. The empty scenario is the
//! contract's happy path, not an error; it yields the fixed defaults at
//! confidence zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::{round1, ScenarioSnapshot};
use crate::core::types::{
    ScenarioKey, CONFIDENCE_PER_BATTLE, MIN_APPEARANCES, RECOGNIZED_CATEGORIES, SQUAD_SIZE,
    TOP_UNITS_LIMIT,
};

/// Default category split, summing to `SQUAD_SIZE`. Defense starts empty;
/// the zero-data path adds one slot against "army" opponents, which field
/// drone cover worth defending from.
const DEFAULT_SPLIT: [(&str, u32); 4] =
    [("recon", 2), ("attack", 3), ("defense", 0), ("equipment", 1)];

/// The scenario a recommendation was computed for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    pub map: String,
    pub enemy: String,
    /// Carried through for display; does not filter aggregation
    pub budget: i64,
}

/// Recommended unit count per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    pub recon: u32,
    pub attack: u32,
    pub defense: u32,
    pub equipment: u32,
    pub explanation: String,
}

impl Composition {
    pub fn total(&self) -> u32 {
        self.recon + self.attack + self.defense + self.equipment
    }

    fn set(&mut self, category: &str, count: u32) {
        match category {
            "recon" => self.recon = count,
            "attack" => self.attack = count,
            "defense" => self.defense = count,
            "equipment" => self.equipment = count,
            _ => {}
        }
    }
}

/// One high-performing unit in the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUnit {
    pub name: String,
    pub category: String,
    pub cost: i64,
    pub win_rate: f64,
    pub avg_kills: f64,
}

/// Mean final position of a category's units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentZone {
    pub x: f64,
    pub y: f64,
    pub sample_size: u32,
}

/// The full structured suggestion (§ external contract shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub scenario: ScenarioDescriptor,
    pub data_points: u32,
    pub confidence: u32,
    pub overall_win_rate: f64,
    pub recommended_composition: Composition,
    pub top_units: Vec<TopUnit>,
    pub deployment_zones: BTreeMap<String, DeploymentZone>,
    pub tactical_notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// Compose a recommendation from a scenario snapshot.
pub fn recommend(key: &ScenarioKey, budget: i64, snapshot: &ScenarioSnapshot) -> Recommendation {
    let scenario = ScenarioDescriptor {
        map: key.map.clone(),
        enemy: key.enemy.clone(),
        budget,
    };

    if snapshot.is_empty() {
        return default_recommendation(scenario);
    }

    let confidence = (snapshot.total * CONFIDENCE_PER_BATTLE).min(100);

    Recommendation {
        data_points: snapshot.total,
        confidence,
        overall_win_rate: snapshot.overall_win_rate(),
        recommended_composition: compose(snapshot),
        top_units: top_units(snapshot),
        deployment_zones: deployment_zones(snapshot),
        tactical_notes: tactical_notes(&scenario, snapshot),
        narrative: None,
        scenario,
    }
}

/// Fixed fallback when no battles have been recorded for the scenario.
fn default_recommendation(scenario: ScenarioDescriptor) -> Recommendation {
    let against_army = scenario.enemy == "army";

    let composition = Composition {
        recon: 2,
        attack: 3,
        defense: if against_army { 1 } else { 0 },
        equipment: 1,
        explanation: format!(
            "No recorded battles for {} vs {} yet; baseline doctrine split.",
            scenario.map, scenario.enemy
        ),
    };

    let mut zones = BTreeMap::new();
    zones.insert(
        "recon".to_string(),
        DeploymentZone { x: 50.0, y: 85.0, sample_size: 0 },
    );
    zones.insert(
        "attack".to_string(),
        DeploymentZone { x: 30.0, y: 90.0, sample_size: 0 },
    );
    zones.insert(
        "defense".to_string(),
        DeploymentZone { x: 70.0, y: 90.0, sample_size: 0 },
    );

    let notes = match scenario.enemy.as_str() {
        "army" => vec![
            "Focus on counter-drone operations.".to_string(),
            "Expect organized resistance with its own UAS cover.".to_string(),
            "Use terrain for cover.".to_string(),
        ],
        "guerrilla" => vec![
            "Watch for ambush positions.".to_string(),
            "Infantry will use buildings.".to_string(),
            "Spread recon wide.".to_string(),
        ],
        "mercenary" => vec![
            "Fast and aggressive enemies; prioritize eliminating scouts.".to_string(),
            "No enemy drone cover expected; defense slots reallocated.".to_string(),
        ],
        _ => vec!["Assess threat before committing forces.".to_string()],
    };

    Recommendation {
        data_points: 0,
        confidence: 0,
        overall_win_rate: 0.0,
        recommended_composition: composition,
        top_units: Vec::new(),
        deployment_zones: zones,
        tactical_notes: notes,
        narrative: None,
        scenario,
    }
}

/// Allocate `SQUAD_SIZE` slots across the four recognized categories.
///
/// Categories absent from the data keep their default share; the rest of
/// the slots are apportioned to observed categories proportionally to
/// their win rates, using largest-remainder rounding so the total is
/// always preserved.
fn compose(snapshot: &ScenarioSnapshot) -> Composition {
    let mut composition = Composition {
        recon: 0,
        attack: 0,
        defense: 0,
        equipment: 0,
        explanation: String::new(),
    };

    let mut observed: Vec<&str> = Vec::new();
    let mut fixed_total = 0u32;
    for (category, default_count) in DEFAULT_SPLIT {
        match snapshot.categories.get(category) {
            Some(stats) if stats.appearances > 0 => observed.push(category),
            _ => {
                composition.set(category, default_count);
                fixed_total += default_count;
            }
        }
    }

    let remaining = SQUAD_SIZE.saturating_sub(fixed_total);
    if !observed.is_empty() && remaining > 0 {
        // Weight by win rate; an all-defeat scenario falls back to the
        // default shares so the split stays meaningful.
        let mut weights: Vec<f64> = observed
            .iter()
            .map(|c| snapshot.categories[*c].win_rate())
            .collect();
        if weights.iter().all(|w| *w <= 0.0) {
            weights = observed
                .iter()
                .map(|c| default_share(c).max(1) as f64)
                .collect();
        }
        let weight_sum: f64 = weights.iter().sum();

        // Largest-remainder apportionment
        let quotas: Vec<f64> = weights
            .iter()
            .map(|w| remaining as f64 * w / weight_sum)
            .collect();
        let mut counts: Vec<u32> = quotas.iter().map(|q| q.floor() as u32).collect();
        let mut leftover = remaining - counts.iter().sum::<u32>();

        let mut order: Vec<usize> = (0..observed.len()).collect();
        order.sort_by(|&a, &b| {
            let frac_a = quotas[a] - quotas[a].floor();
            let frac_b = quotas[b] - quotas[b].floor();
            frac_b
                .partial_cmp(&frac_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let sa = &snapshot.categories[observed[a]];
                    let sb = &snapshot.categories[observed[b]];
                    sb.win_rate()
                        .partial_cmp(&sa.win_rate())
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(sb.appearances.cmp(&sa.appearances))
                })
        });
        for &i in &order {
            if leftover == 0 {
                break;
            }
            counts[i] += 1;
            leftover -= 1;
        }

        for (i, category) in observed.iter().enumerate() {
            composition.set(category, counts[i]);
        }
    }

    composition.explanation = format!(
        "Based on {} recorded battles: {} recon / {} attack / {} defense / {} equipment, weighted by category win rates.",
        snapshot.total,
        composition.recon,
        composition.attack,
        composition.defense,
        composition.equipment,
    );
    composition
}

fn default_share(category: &str) -> u32 {
    DEFAULT_SPLIT
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, n)| *n)
        .unwrap_or(0)
}

/// Highest win-rate units with enough appearances to trust.
fn top_units(snapshot: &ScenarioSnapshot) -> Vec<TopUnit> {
    let mut units: Vec<TopUnit> = snapshot
        .units
        .values()
        .filter(|u| u.appearances >= MIN_APPEARANCES)
        .map(|u| TopUnit {
            name: u.name.clone(),
            category: u.category.clone(),
            cost: u.cost,
            win_rate: round1(u.win_rate()),
            avg_kills: round1(u.avg_kills()),
        })
        .collect();

    units.sort_by(|a, b| {
        b.win_rate
            .partial_cmp(&a.win_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.avg_kills
                    .partial_cmp(&a.avg_kills)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| {
                let app_a = snapshot.units[&a.name].appearances;
                let app_b = snapshot.units[&b.name].appearances;
                app_b.cmp(&app_a)
            })
    });
    units.truncate(TOP_UNITS_LIMIT);
    units
}

/// Mean final positions per recognized category, 1 decimal.
fn deployment_zones(snapshot: &ScenarioSnapshot) -> BTreeMap<String, DeploymentZone> {
    let mut zones = BTreeMap::new();
    for category in RECOGNIZED_CATEGORIES {
        if let Some(stats) = snapshot.categories.get(category) {
            if stats.appearances > 0 {
                zones.insert(
                    category.to_string(),
                    DeploymentZone {
                        x: round1(stats.mean_x()),
                        y: round1(stats.mean_y()),
                        sample_size: stats.appearances,
                    },
                );
            }
        }
    }
    zones
}

const LOW_WIN_RATE: f64 = 50.0;
const HIGH_WIN_RATE: f64 = 70.0;

/// Rule-based notes from map keywords, enemy type and win-rate bands.
fn tactical_notes(scenario: &ScenarioDescriptor, snapshot: &ScenarioSnapshot) -> Vec<String> {
    let mut notes = Vec::new();

    let map = scenario.map.to_lowercase();
    if map.contains("urban") || map.contains("city") {
        notes.push("Dense structures limit sightlines; keep recon above rooftop level.".to_string());
    } else if map.contains("desert") || map.contains("open") {
        notes.push("Open terrain favors long sightlines; expect early contact.".to_string());
    } else if map.contains("forest") || map.contains("wood") {
        notes.push("Canopy degrades optics; push recon closer than usual.".to_string());
    }

    match scenario.enemy.as_str() {
        "army" => notes.push("Organized opposition fields its own drones; budget for counter-UAS.".to_string()),
        "guerrilla" => notes.push("Scattered infantry; wide recon coverage pays off.".to_string()),
        "mercenary" => notes.push("Fast, aggressive opposition without drone cover; strike first.".to_string()),
        _ => {}
    }

    let win_rate = snapshot.overall_win_rate();
    if win_rate < LOW_WIN_RATE {
        notes.push(format!(
            "Win rate below {:.0}% - consider adjusting composition.",
            LOW_WIN_RATE
        ));
    } else if win_rate >= HIGH_WIN_RATE {
        notes.push(format!(
            "Win rate above {:.0}% - current doctrine is working; refine rather than overhaul.",
            HIGH_WIN_RATE
        ));
    }

    notes
}
