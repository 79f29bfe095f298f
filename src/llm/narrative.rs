//! Narrative paraphrase of structured recommendations
//!
//! Builds compact, stable prompt payloads from the structured output and
//! degrades to "no narrative" on any generator failure. The structured
//! response path never depends on this module succeeding.

use crate::advisor::Recommendation;
use crate::api::SubmitRequest;
use crate::llm::client::LlmClient;

const SYSTEM_PROMPT: &str = "You are a tactical AI advisor for BattleBottle, a military drone \
warfare simulator. Analyze battle data and provide concise, actionable tactical \
recommendations. Focus on: unit composition, deployment positioning, and strategic \
priorities. Keep responses brief and structured. Use military terminology appropriately.";

/// Compact textual summary of a recommendation, used as the prompt payload.
///
/// The layout is deliberately stable: same section order and field order
/// on every call, so generator behavior is reproducible for a given
/// recommendation.
pub fn summarize(rec: &Recommendation) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Scenario: {} vs {} (budget ${})\n",
        rec.scenario.map, rec.scenario.enemy, rec.scenario.budget
    ));
    out.push_str(&format!(
        "Data: {} battles recorded, {:.1}% win rate, confidence {}/100\n",
        rec.data_points, rec.overall_win_rate, rec.confidence
    ));

    let c = &rec.recommended_composition;
    out.push_str(&format!(
        "Recommended composition: {} recon, {} attack, {} defense, {} equipment\n",
        c.recon, c.attack, c.defense, c.equipment
    ));

    if !rec.top_units.is_empty() {
        out.push_str("Top units:\n");
        for unit in &rec.top_units {
            out.push_str(&format!(
                "- {} ({}): {:.1}% win rate, {:.1} avg kills\n",
                unit.name, unit.category, unit.win_rate, unit.avg_kills
            ));
        }
    }

    if !rec.deployment_zones.is_empty() {
        out.push_str("Deployment zones (mean final position, % of map):\n");
        for (category, zone) in &rec.deployment_zones {
            out.push_str(&format!(
                "- {}: x={:.1} y={:.1} (n={})\n",
                category, zone.x, zone.y, zone.sample_size
            ));
        }
    }

    if !rec.tactical_notes.is_empty() {
        out.push_str("Notes:\n");
        for note in &rec.tactical_notes {
            out.push_str(&format!("- {}\n", note));
        }
    }

    out.push_str("\nRewrite this recommendation as a short tactical briefing (3-5 sentences).");
    out
}

/// Generate a prose briefing for a recommendation.
///
/// Any failure (no client configured, timeout, HTTP error, bad payload)
/// is logged and collapses to `None`; the caller returns the structured
/// recommendation unchanged.
pub async fn narrate(client: Option<&LlmClient>, rec: &Recommendation) -> Option<String> {
    let client = client?;
    match client.complete(SYSTEM_PROMPT, &summarize(rec)).await {
        Ok(text) => Some(text.trim().to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Narrative generation failed; returning structured response only");
            None
        }
    }
}

/// Post-battle assessment of one submitted battle.
pub async fn battle_feedback(client: Option<&LlmClient>, battle: &SubmitRequest) -> Option<String> {
    let client = client?;

    let total_allies = battle.allies.len();
    let survivors = battle.allies.iter().filter(|a| a.hp > 0.0).count();
    let total_kills: u32 = battle.allies.iter().map(|a| a.kills).sum();

    let mut per_category: std::collections::BTreeMap<&str, (u32, u32, u32)> = Default::default();
    for ally in &battle.allies {
        let entry = per_category.entry(ally.cat.as_str()).or_default();
        entry.0 += 1;
        if ally.hp > 0.0 {
            entry.1 += 1;
        }
        entry.2 += ally.kills;
    }

    let mut prompt = format!(
        "Battle completed on {} vs {}:\n- Result: {}\n- Budget: ${} / Spent: ${}\n- Duration: {:.0} seconds\n- Allies deployed: {}, survived: {}\n- Total kills: {}\n",
        battle.map,
        battle.enemy,
        battle.result.to_uppercase(),
        battle.budget,
        battle.spent,
        battle.timer,
        total_allies,
        survivors,
        total_kills,
    );
    if !per_category.is_empty() {
        prompt.push_str("Unit breakdown:\n");
        for (cat, (count, survived, kills)) in &per_category {
            prompt.push_str(&format!(
                "- {}: {} deployed, {} survived, {} kills\n",
                cat, count, survived, kills
            ));
        }
    }
    prompt.push_str(
        "\nGive brief tactical feedback: what worked, what to improve, and one specific change to try next battle.",
    );

    match client.complete(SYSTEM_PROMPT, &prompt).await {
        Ok(text) => Some(text.trim().to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Post-battle feedback generation failed");
            None
        }
    }
}
