//! Browser smoke tests, run with `wasm-pack test --headless --chrome`

#![cfg(target_arch = "wasm32")]

use skirmish_matchmaking::{compare_profiles, run_simulation, MatchmakingEngine, SimulationEngine};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const FACTIONS: &str = r#"[{"faction_a": "Empire", "faction_b": "Sturgia", "win_differential": 1.0}]"#;
const CHEAP_CONFIG: &str = r#"{"balance_strategy": "Heuristic", "heuristic_iterations": 40, "partition_strategy": "Sampled", "partition_sample_iterations": 20}"#;

fn players_json(count: usize) -> String {
    let players: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"id": "Player_{}", "proficiency": {{"Infantry": 5, "Cavalry": {}, "Archer": {}}}, "mmr": {}, "igl": false}}"#,
                i + 1,
                i % 11,
                (i * 3) % 11,
                3000 + i * 50
            )
        })
        .collect();
    format!("[{}]", players.join(","))
}

#[wasm_bindgen_test]
fn engine_builds_matches() {
    let mut engine = MatchmakingEngine::new_with_config(3, CHEAP_CONFIG).unwrap();
    engine.set_factions(FACTIONS).unwrap();

    let output = engine.find_matches(&players_json(24)).unwrap();
    assert!(output.contains("\"matches\""));
    assert!(output.contains("Team 1"));
}

#[wasm_bindgen_test]
fn engine_rejects_thirteen_players() {
    let mut engine = MatchmakingEngine::new(3);
    engine.set_factions(FACTIONS).unwrap();
    assert!(engine.find_matches(&players_json(13)).is_err());
}

#[wasm_bindgen_test]
fn simulation_engine_runs_rounds() {
    let mut engine = SimulationEngine::new_with_config(9, CHEAP_CONFIG).unwrap();
    engine.set_factions(FACTIONS).unwrap();
    engine.set_maps(r#"["Sargot"]"#).unwrap();
    engine.generate_population(24, false);
    engine.run(2).unwrap();
    assert_eq!(engine.get_round(), 2);
    assert!(engine.get_stats().contains("mean_disparity"));
}

#[wasm_bindgen_test]
fn free_functions_return_stats() {
    let stats = run_simulation(CHEAP_CONFIG, FACTIONS, 12, 2, 5).unwrap();
    assert!(stats.contains("\"rounds\":2"));

    let comparison = compare_profiles(CHEAP_CONFIG, FACTIONS, 12, 1, 5).unwrap();
    assert!(comparison.contains("cavalry_heavy"));
}
