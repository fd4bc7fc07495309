pub mod balancer;
pub mod error;
pub mod matchmaker;
pub mod matchup;
pub mod outcome;
pub mod partition;
pub mod roles;
pub mod simulation;
pub mod types;

pub use error::{ErrorKind, MatchmakingError};
pub use matchmaker::Matchmaker;
pub use roles::RoleCache;
pub use simulation::{PopulationProfile, Simulation, SimulationStats};
pub use types::*;

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

/// Forwards `log` records to the browser console
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

fn to_js(err: MatchmakingError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_config(config_json: &str) -> Result<MatchmakingConfig, MatchmakingError> {
    Ok(serde_json::from_str(config_json)?)
}

fn parse_factions(factions_json: &str) -> Result<Vec<FactionMatchup>, MatchmakingError> {
    Ok(serde_json::from_str(factions_json)?)
}

fn parse_maps(maps_json: &str) -> Result<Vec<String>, MatchmakingError> {
    let maps: Vec<String> = serde_json::from_str(maps_json)?;
    error::validate_maps(&maps)?;
    Ok(maps)
}

fn default_maps() -> Vec<String> {
    DEFAULT_MAP_POOL.iter().map(|m| m.to_string()).collect()
}

/// WASM-exposed matchmaking wrapper
#[wasm_bindgen]
pub struct MatchmakingEngine {
    matchmaker: Matchmaker,
    factions: Vec<FactionMatchup>,
    maps: Vec<String>,
    seed: u64,
    /// Calls to `find_matches` so far, mixed into the seed
    runs: u64,
}

#[wasm_bindgen]
impl MatchmakingEngine {
    /// Create an engine with default config and map catalog
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> MatchmakingEngine {
        Self::with_config(MatchmakingConfig::default(), seed)
    }

    /// Create with custom config
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<MatchmakingEngine, JsValue> {
        let config = parse_config(config_json).map_err(to_js)?;
        Ok(Self::with_config(config, seed))
    }

    /// Load the faction matchup table
    pub fn set_factions(&mut self, factions_json: &str) -> Result<(), JsValue> {
        self.load_factions(factions_json).map_err(to_js)
    }

    /// Replace the map catalog
    pub fn set_maps(&mut self, maps_json: &str) -> Result<(), JsValue> {
        self.load_maps(maps_json).map_err(to_js)
    }

    /// Build matches for a JSON array of players.
    ///
    /// Returns `{"matches": [...], "players": [...]}` with each player's role filled in.
    pub fn find_matches(&mut self, players_json: &str) -> Result<String, JsValue> {
        self.match_players(players_json).map_err(to_js)
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&MatchmakingConfig::default()).unwrap_or_default()
    }

    /// Get current config as JSON
    pub fn get_config(&self) -> String {
        serde_json::to_string(self.matchmaker.config()).unwrap_or_default()
    }

    /// Update matchmaking config
    pub fn update_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config = parse_config(config_json).map_err(to_js)?;
        self.matchmaker = Matchmaker::new(config);
        Ok(())
    }
}

impl MatchmakingEngine {
    pub fn with_config(config: MatchmakingConfig, seed: u64) -> MatchmakingEngine {
        MatchmakingEngine {
            matchmaker: Matchmaker::new(config),
            factions: Vec::new(),
            maps: default_maps(),
            seed,
            runs: 0,
        }
    }

    pub fn load_factions(&mut self, factions_json: &str) -> Result<(), MatchmakingError> {
        let factions = parse_factions(factions_json)?;
        error::validate_factions(&factions)?;
        self.factions = factions;
        Ok(())
    }

    pub fn load_maps(&mut self, maps_json: &str) -> Result<(), MatchmakingError> {
        self.maps = parse_maps(maps_json)?;
        Ok(())
    }

    pub fn match_players(&mut self, players_json: &str) -> Result<String, MatchmakingError> {
        let mut players: Vec<Player> = serde_json::from_str(players_json)?;
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.runs));
        self.runs += 1;

        let matches = self
            .matchmaker
            .run(&mut players, &self.factions, &self.maps, &mut rng)?;

        Ok(serde_json::json!({
            "matches": matches,
            "players": players,
        })
        .to_string())
    }
}

/// WASM-exposed rating simulation wrapper
#[wasm_bindgen]
pub struct SimulationEngine {
    sim: Simulation,
}

#[wasm_bindgen]
impl SimulationEngine {
    /// Create a new simulation with default config
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> SimulationEngine {
        SimulationEngine {
            sim: Simulation::new(MatchmakingConfig::default(), seed),
        }
    }

    /// Create with custom config
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<SimulationEngine, JsValue> {
        let config = parse_config(config_json).map_err(to_js)?;
        Ok(SimulationEngine {
            sim: Simulation::new(config, seed),
        })
    }

    pub fn set_factions(&mut self, factions_json: &str) -> Result<(), JsValue> {
        let factions = parse_factions(factions_json).map_err(to_js)?;
        self.sim.set_factions(factions);
        Ok(())
    }

    /// Replace the map catalog
    pub fn set_maps(&mut self, maps_json: &str) -> Result<(), JsValue> {
        let maps = parse_maps(maps_json).map_err(to_js)?;
        self.sim.set_maps(maps);
        Ok(())
    }

    /// Generate player population
    pub fn generate_population(&mut self, count: usize, cavalry_heavy: bool) {
        let profile = if cavalry_heavy {
            PopulationProfile::CavalryHeavy
        } else {
            PopulationProfile::Mixed
        };
        self.sim.generate_population(count, profile);
    }

    /// Run a single round, returning its matches as JSON
    pub fn run_round(&mut self) -> Result<String, JsValue> {
        let matches = self.sim.run_round().map_err(to_js)?;
        serde_json::to_string(matches)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Run multiple rounds
    pub fn run(&mut self, rounds: u64) -> Result<(), JsValue> {
        self.sim.run(rounds).map_err(to_js)
    }

    /// Get current simulation state as JSON
    pub fn get_state(&self) -> String {
        self.sim.get_state_json()
    }

    pub fn get_round(&self) -> u64 {
        self.sim.round
    }

    pub fn get_total_players(&self) -> usize {
        self.sim.players.len()
    }

    /// Get players with current ratings and roles as JSON
    pub fn get_players(&self) -> String {
        serde_json::to_string(&self.sim.players).unwrap_or_default()
    }

    /// Get statistics JSON
    pub fn get_stats(&self) -> String {
        serde_json::to_string(&self.sim.stats).unwrap_or_default()
    }

    /// Reset statistics (keep population)
    pub fn reset_stats(&mut self) {
        self.sim.stats = SimulationStats::default();
    }
}

/// Generate a population, run it for `rounds` rounds and collect the stats
pub fn simulate(
    config: MatchmakingConfig,
    factions: Vec<FactionMatchup>,
    profile: PopulationProfile,
    population: usize,
    rounds: u64,
    seed: u64,
) -> Result<SimulationStats, MatchmakingError> {
    let mut sim = Simulation::new(config, seed);
    sim.set_factions(factions);
    sim.generate_population(population, profile);
    sim.run(rounds)?;
    Ok(sim.stats)
}

/// Run a mixed-population simulation and return its stats as JSON
#[wasm_bindgen]
pub fn run_simulation(
    config_json: &str,
    factions_json: &str,
    population: usize,
    rounds: u64,
    seed: u64,
) -> Result<String, JsValue> {
    let config = parse_config(config_json).map_err(to_js)?;
    let factions = parse_factions(factions_json).map_err(to_js)?;
    let stats = simulate(config, factions, PopulationProfile::Mixed, population, rounds, seed)
        .map_err(to_js)?;

    serde_json::to_string(&stats)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Compare mixed and cavalry-heavy populations under one config
#[wasm_bindgen]
pub fn compare_profiles(
    config_json: &str,
    factions_json: &str,
    population: usize,
    rounds: u64,
    seed: u64,
) -> Result<String, JsValue> {
    let config = parse_config(config_json).map_err(to_js)?;
    let factions = parse_factions(factions_json).map_err(to_js)?;

    let mixed = simulate(
        config.clone(),
        factions.clone(),
        PopulationProfile::Mixed,
        population,
        rounds,
        seed,
    )
    .map_err(to_js)?;
    let cavalry = simulate(config, factions, PopulationProfile::CavalryHeavy, population, rounds, seed)
        .map_err(to_js)?;

    let comparison = serde_json::json!({
        "mixed": mixed,
        "cavalry_heavy": cavalry,
    });

    serde_json::to_string(&comparison)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTIONS: &str = r#"[
        {"faction_a": "Empire", "faction_b": "Sturgia", "win_differential": 2.5},
        {"faction_a": "Vlandia", "faction_b": "Aserai", "win_differential": -1.5}
    ]"#;

    fn players_json(count: usize) -> String {
        let players: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "id": format!("Player_{}", i + 1),
                    "proficiency": {"Infantry": (i % 3) as f64 * 5.0, "Cavalry": ((i + 1) % 3) as f64 * 5.0},
                    "mmr": 2000 + (i as i64 * 977) % 6000,
                    "igl": i < 8,
                })
            })
            .collect();
        serde_json::to_string(&players).unwrap()
    }

    fn engine() -> MatchmakingEngine {
        let config = MatchmakingConfig {
            balance_strategy: BalanceStrategy::Heuristic,
            heuristic_iterations: 60,
            partition_strategy: PartitionStrategy::Sampled,
            partition_sample_iterations: 30,
            ..MatchmakingConfig::default()
        };
        let mut engine = MatchmakingEngine::with_config(config, 42);
        engine.load_factions(FACTIONS).unwrap();
        engine
    }

    #[test]
    fn test_engine_find_matches() {
        let mut engine = engine();
        let output: serde_json::Value =
            serde_json::from_str(&engine.match_players(&players_json(24)).unwrap()).unwrap();

        let matches = output["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["id"], 1);
        assert_eq!(matches[1]["id"], 2);
        assert_eq!(matches[0]["team_one"]["player_ids"].as_array().unwrap().len(), 6);

        let players = output["players"].as_array().unwrap();
        assert_eq!(players.len(), 24);
        assert!(players.iter().all(|p| p["role"].is_string()));
        assert_eq!(players[0]["leader"], true);
    }

    #[test]
    fn test_engine_rejects_bad_input() {
        let mut engine = engine();
        let err = engine.match_players(&players_json(13)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = engine.match_players("not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);

        let err = engine.load_factions("[]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = engine.load_maps("[]").unwrap_err();
        assert!(matches!(err, MatchmakingError::EmptyMapCatalog));
    }

    #[test]
    fn test_engine_without_factions() {
        let mut engine = MatchmakingEngine::with_config(MatchmakingConfig::default(), 1);
        let err = engine.match_players(&players_json(12)).unwrap_err();
        assert!(matches!(err, MatchmakingError::EmptyFactionTable));
    }

    #[test]
    fn test_engine_custom_maps() {
        let mut engine = engine();
        engine.load_maps(r#"["Sargot"]"#).unwrap();
        let output: serde_json::Value =
            serde_json::from_str(&engine.match_players(&players_json(12)).unwrap()).unwrap();
        assert_eq!(output["matches"][0]["map"], "Sargot");
    }

    #[test]
    fn test_engine_seeds_advance_between_runs() {
        let mut a = engine();
        let mut b = engine();
        let first_a = a.match_players(&players_json(24)).unwrap();
        let first_b = b.match_players(&players_json(24)).unwrap();
        assert_eq!(first_a, first_b);
        assert_eq!(a.runs, 1);
    }

    #[test]
    fn test_parse_maps() {
        assert_eq!(parse_maps(r#"["Sargot", "Epicrotea"]"#).unwrap().len(), 2);
        assert!(matches!(parse_maps("[]"), Err(MatchmakingError::EmptyMapCatalog)));
        assert_eq!(parse_maps("{}").unwrap_err().kind(), ErrorKind::Input);
    }

    #[test]
    fn test_default_config_round_trips() {
        let json = MatchmakingEngine::get_default_config();
        let config = parse_config(&json).unwrap();
        assert_eq!(config.high_rating_threshold, 6000);
        assert_eq!(config.partition_strategy, PartitionStrategy::Auto);
    }

    #[test]
    fn test_simulate_stats() {
        let config = parse_config(r#"{"balance_strategy": "Heuristic", "heuristic_iterations": 40, "partition_strategy": "Sampled", "partition_sample_iterations": 20}"#).unwrap();
        let factions = parse_factions(FACTIONS).unwrap();
        let stats = simulate(config, factions, PopulationProfile::CavalryHeavy, 24, 2, 5).unwrap();

        assert_eq!(stats.rounds, 2);
        assert_eq!(stats.total_matches, 4);
        assert_eq!(stats.probability_samples.len(), 4);
    }

    #[test]
    fn test_simulate_invalid_population() {
        let err = simulate(
            MatchmakingConfig::default(),
            parse_factions(FACTIONS).unwrap(),
            PopulationProfile::Mixed,
            20,
            1,
            5,
        )
        .unwrap_err();
        assert!(matches!(err, MatchmakingError::InvalidPlayerCount(20)));
    }
}
