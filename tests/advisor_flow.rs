//! End-to-end tests over the advisor service facade

use std::sync::Arc;

use battlebottle::api::{AllyPayload, RecommendRequest, SubmitRequest};
use battlebottle::store::EventStore;
use battlebottle::AdvisorService;

fn service(dir: &tempfile::TempDir) -> AdvisorService {
    let store = EventStore::open(dir.path().join("battles.jsonl")).unwrap();
    AdvisorService::new(store, None)
}

fn ally(id: &str, name: &str, cat: &str, kills: u32) -> AllyPayload {
    AllyPayload {
        id: id.into(),
        name: name.into(),
        cat: cat.into(),
        cost: 60_000,
        x: 45.0,
        y: 80.0,
        hp: 30.0,
        max_hp: 100.0,
        kills,
        damage_dealt: kills as f64 * 150.0,
    }
}

fn submission(session: &str, map: &str, enemy: &str, result: &str) -> SubmitRequest {
    SubmitRequest {
        session_id: session.into(),
        map: map.into(),
        enemy: enemy.into(),
        budget: 2_000_000,
        spent: 1_400_000,
        result: result.into(),
        timer: 210.0,
        allies: vec![
            ally("u1", "RQ-11 Raven", "recon", 0),
            ally("u2", "Switchblade 600", "attack", 2),
        ],
        enemies: Vec::new(),
        initial_positions: Default::default(),
    }
}

#[test]
fn submit_then_recommend_matches_literal_win_fraction() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir);

    for result in ["victory", "victory", "victory", "defeat"] {
        svc.submit(&submission("s-1", "urban", "army", result)).unwrap();
    }

    let rec = svc
        .recommend(&RecommendRequest {
            map: "urban".into(),
            enemy: "army".into(),
            budget: 2_000_000,
        })
        .unwrap();

    assert_eq!(rec.data_points, 4);
    assert_eq!(rec.overall_win_rate, 75.0);
    assert_eq!(rec.confidence, 40);
    assert_eq!(rec.recommended_composition.total(), 6);
    assert_eq!(rec.scenario.map, "urban");
    assert_eq!(rec.scenario.budget, 2_000_000);
}

#[test]
fn scenarios_do_not_bleed_into_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir);

    svc.submit(&submission("s-1", "urban", "army", "victory")).unwrap();
    svc.submit(&submission("s-1", "desert", "army", "defeat")).unwrap();
    svc.submit(&submission("s-1", "urban", "guerrilla", "defeat")).unwrap();

    let rec = svc
        .recommend(&RecommendRequest {
            map: "urban".into(),
            enemy: "army".into(),
            budget: 0,
        })
        .unwrap();
    assert_eq!(rec.data_points, 1);
    assert_eq!(rec.overall_win_rate, 100.0);
}

#[test]
fn empty_scenario_gets_default_recommendation_with_army_conditioned_defense() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir);

    let vs_army = svc
        .recommend(&RecommendRequest {
            map: "nowhere".into(),
            enemy: "army".into(),
            budget: 0,
        })
        .unwrap();
    assert_eq!(vs_army.confidence, 0);
    assert_eq!(vs_army.data_points, 0);
    assert_eq!(vs_army.recommended_composition.defense, 1);
    assert!(vs_army.top_units.is_empty());

    let vs_mercs = svc
        .recommend(&RecommendRequest {
            map: "nowhere".into(),
            enemy: "mercenary".into(),
            budget: 0,
        })
        .unwrap();
    assert_eq!(vs_mercs.recommended_composition.defense, 0);
}

#[test]
fn unknown_category_is_stored_but_kept_out_of_summaries() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir);

    let mut sub = submission("s-1", "urban", "army", "victory");
    sub.allies = vec![ally("u1", "Howitzer", "artillery", 4)];
    svc.submit(&sub).unwrap();
    let mut sub2 = submission("s-1", "urban", "army", "victory");
    sub2.allies = vec![ally("u1", "Howitzer", "artillery", 2)];
    svc.submit(&sub2).unwrap();

    let rec = svc
        .recommend(&RecommendRequest {
            map: "urban".into(),
            enemy: "army".into(),
            budget: 0,
        })
        .unwrap();

    assert!(!rec.deployment_zones.contains_key("artillery"));
    assert_eq!(rec.recommended_composition.total(), 6);
    // the unit is still visible in top units under its raw category
    assert!(rec.top_units.iter().any(|u| u.category == "artillery"));
}

#[tokio::test]
async fn narrative_request_degrades_to_structured_response() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir);
    svc.submit(&submission("s-1", "urban", "army", "victory")).unwrap();

    // No narrative client configured: same structured shape, no narrative
    let rec = svc
        .recommend_with_narrative(&RecommendRequest {
            map: "urban".into(),
            enemy: "army".into(),
            budget: 0,
        })
        .await
        .unwrap();

    assert!(rec.narrative.is_none());
    assert_eq!(rec.data_points, 1);
    let json = serde_json::to_value(&rec).unwrap();
    assert!(json.get("narrative").is_none());
}

#[tokio::test]
async fn feedback_without_generator_reports_unavailable_not_failure() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir);

    let response = svc.feedback(&submission("s-1", "urban", "army", "defeat")).await;
    assert!(!response.success);
    assert!(response.feedback.is_none());
    assert!(response.error.is_some());
}

#[test]
fn concurrent_submissions_all_persist_independently() {
    let dir = tempfile::tempdir().unwrap();
    let svc = Arc::new(service(&dir));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let svc = Arc::clone(&svc);
            std::thread::spawn(move || {
                let result = if i % 4 == 0 { "defeat" } else { "victory" };
                svc.submit(&submission(&format!("s-{}", i), "urban", "army", result))
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let rec = svc
        .recommend(&RecommendRequest {
            map: "urban".into(),
            enemy: "army".into(),
            budget: 0,
        })
        .unwrap();
    assert_eq!(rec.data_points, 16);
    assert_eq!(rec.overall_win_rate, 75.0);

    let stats = svc.stats().unwrap();
    assert_eq!(stats.total_simulations, 16);
    assert_eq!(stats.unique_sessions, 16);
}

#[test]
fn stats_summarize_per_scenario_and_flywheel_state() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir);

    svc.submit(&submission("s-1", "urban", "army", "victory")).unwrap();
    svc.submit(&submission("s-1", "urban", "army", "defeat")).unwrap();
    svc.submit(&submission("s-2", "desert", "guerrilla", "victory")).unwrap();

    let stats = svc.stats().unwrap();
    assert_eq!(stats.total_simulations, 3);
    assert_eq!(stats.unique_sessions, 2);
    assert_eq!(stats.flywheel_status, "bootstrapping");

    let urban = stats
        .scenarios
        .iter()
        .find(|s| s.map_id == "urban" && s.enemy_type == "army")
        .unwrap();
    assert_eq!(urban.count, 2);
    assert_eq!(urban.win_rate, 50.0);

    let desert = stats
        .scenarios
        .iter()
        .find(|s| s.map_id == "desert")
        .unwrap();
    assert_eq!(desert.count, 1);
    assert_eq!(desert.win_rate, 100.0);
}

#[test]
fn validation_failures_leave_no_partial_state() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir);

    let mut bad = submission("s-1", "urban", "army", "stalemate");
    assert!(svc.submit(&bad).is_err());
    bad.result = String::new();
    assert!(svc.submit(&bad).is_err());

    let stats = svc.stats().unwrap();
    assert_eq!(stats.total_simulations, 0);
}
