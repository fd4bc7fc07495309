use crate::error::MatchmakingError;
use crate::matchmaker::Matchmaker;
use crate::types::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Players flagged as leaders after generation, taken from the top of the ladder
const LEADER_COUNT: usize = 8;
const RATING_RANGE: std::ops::RangeInclusive<i64> = 2000..=8000;

/// Shape of a generated population
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopulationProfile {
    /// Every player is a 10/5/0 specialist in some order of roles
    Mixed,
    /// Every player is a full cavalry specialist with weaker foot skills
    CavalryHeavy,
}

/// Aggregates over every match played so far
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub rounds: u64,
    pub total_matches: usize,
    /// Matches won by the roster listed first
    pub team_one_wins: usize,

    /// Absolute rating disparity per match
    pub disparity_samples: Vec<i64>,
    pub mean_disparity: f64,
    pub median_disparity: f64,
    pub mode_disparity: i64,
    pub min_disparity: i64,
    pub max_disparity: i64,

    /// Predicted probability that the first roster wins, per match
    pub probability_samples: Vec<f64>,
    pub avg_outcome_probability: f64,
}

impl SimulationStats {
    /// Recompute summary values from the samples
    pub fn summarize(&mut self) {
        let samples = &self.disparity_samples;
        if samples.is_empty() {
            return;
        }

        let n = samples.len();
        self.mean_disparity = samples.iter().sum::<i64>() as f64 / n as f64;

        let mut sorted = samples.clone();
        sorted.sort_unstable();
        self.median_disparity = if n % 2 == 1 {
            sorted[n / 2] as f64
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
        };
        self.min_disparity = sorted[0];
        self.max_disparity = sorted[n - 1];

        // Most frequent value; ties go to the one seen first
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for &d in samples {
            *counts.entry(d).or_insert(0) += 1;
        }
        let mut mode = samples[0];
        let mut best = 0;
        for &d in samples {
            let count = counts[&d];
            if count > best {
                best = count;
                mode = d;
            }
        }
        self.mode_disparity = mode;

        if !self.probability_samples.is_empty() {
            self.avg_outcome_probability =
                self.probability_samples.iter().sum::<f64>() / self.probability_samples.len() as f64;
        }
    }
}

/// Snapshot returned to callers
#[derive(Serialize)]
struct SimulationState<'a> {
    round: u64,
    total_players: usize,
    stats: &'a SimulationStats,
    config: &'a MatchmakingConfig,
}

/// Repeated matchmaking rounds over a fixed population, with rating updates
#[derive(Serialize, Deserialize)]
pub struct Simulation {
    /// Rounds played
    pub round: u64,
    pub players: Vec<Player>,
    pub config: MatchmakingConfig,
    pub factions: Vec<FactionMatchup>,
    pub maps: Vec<String>,
    pub stats: SimulationStats,
    /// Matches from the most recent round
    pub last_matches: Vec<MatchRecord>,
    rng_seed: u64,
}

impl Simulation {
    pub fn new(config: MatchmakingConfig, seed: u64) -> Self {
        Self {
            round: 0,
            players: Vec::new(),
            config,
            factions: Vec::new(),
            maps: DEFAULT_MAP_POOL.iter().map(|m| m.to_string()).collect(),
            stats: SimulationStats::default(),
            last_matches: Vec::new(),
            rng_seed: seed,
        }
    }

    pub fn set_factions(&mut self, factions: Vec<FactionMatchup>) {
        self.factions = factions;
    }

    pub fn set_maps(&mut self, maps: Vec<String>) {
        self.maps = maps;
    }

    /// Replace the population with `count` generated players.
    ///
    /// Ratings are uniform in [2000, 8000]. The pool is ordered by rating,
    /// highest first, and the top eight are flagged as leaders.
    pub fn generate_population(&mut self, count: usize, profile: PopulationProfile) {
        let mut rng = StdRng::seed_from_u64(self.rng_seed);

        let mut players: Vec<Player> = (0..count)
            .map(|i| {
                let proficiency = generate_proficiency(profile, &mut rng);
                let rating = rng.gen_range(RATING_RANGE);
                Player::new(format!("Player_{}", i + 1), proficiency, rating)
            })
            .collect();

        players.sort_by_key(|p| Reverse(p.rating));
        for player in players.iter_mut().take(LEADER_COUNT) {
            player.leader = true;
        }

        log::info!("Generated {} players ({:?})", count, profile);
        self.players = players;
    }

    /// Matchmake the population once and play every match.
    ///
    /// Each winner is drawn with the predicted probability; winners gain and
    /// losers drop `rating_step`.
    pub fn run_round(&mut self) -> Result<&[MatchRecord], MatchmakingError> {
        let mut rng = StdRng::seed_from_u64(self.rng_seed.wrapping_add(self.round));
        let matchmaker = Matchmaker::new(self.config.clone());
        let matches = matchmaker.run(&mut self.players, &self.factions, &self.maps, &mut rng)?;

        let step = self.config.rating_step;
        for m in &matches {
            let (winners, losers) = if rng.gen_bool(m.outcome_probability) {
                self.stats.team_one_wins += 1;
                (&m.team_one, &m.team_two)
            } else {
                (&m.team_two, &m.team_one)
            };
            let winners: HashSet<&str> = winners.player_ids.iter().map(String::as_str).collect();
            let losers: HashSet<&str> = losers.player_ids.iter().map(String::as_str).collect();

            for player in self.players.iter_mut() {
                if winners.contains(player.id.as_str()) {
                    player.rating += step;
                } else if losers.contains(player.id.as_str()) {
                    player.rating -= step;
                }
            }

            self.stats.disparity_samples.push(m.rating_disparity.abs());
            self.stats.probability_samples.push(m.outcome_probability);
            self.stats.total_matches += 1;
        }

        self.round += 1;
        self.stats.rounds = self.round;
        self.stats.summarize();
        log::info!(
            "Round {}: {} matches, mean disparity {:.1}",
            self.round,
            matches.len(),
            self.stats.mean_disparity
        );

        self.last_matches = matches;
        Ok(&self.last_matches)
    }

    /// Run `rounds` rounds, stopping at the first error
    pub fn run(&mut self, rounds: u64) -> Result<(), MatchmakingError> {
        for _ in 0..rounds {
            self.run_round()?;
        }
        Ok(())
    }

    pub fn get_state_json(&self) -> String {
        serde_json::to_string(&SimulationState {
            round: self.round,
            total_players: self.players.len(),
            stats: &self.stats,
            config: &self.config,
        })
        .unwrap_or_default()
    }
}

fn generate_proficiency(profile: PopulationProfile, rng: &mut impl Rng) -> Proficiency {
    match profile {
        PopulationProfile::Mixed => {
            let mut levels = [10.0, 5.0, 0.0];
            levels.shuffle(rng);
            Proficiency {
                cavalry: levels[0],
                infantry: levels[1],
                archer: levels[2],
            }
        }
        PopulationProfile::CavalryHeavy => {
            let mut foot = || (rng.gen_range(0.0..=5.0f64) * 10.0).round() / 10.0;
            let infantry = foot();
            let archer = foot();
            Proficiency::new(infantry, 10.0, archer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn test_config() -> MatchmakingConfig {
        MatchmakingConfig {
            balance_strategy: BalanceStrategy::Heuristic,
            heuristic_iterations: 60,
            partition_strategy: PartitionStrategy::Sampled,
            partition_sample_iterations: 30,
            ..MatchmakingConfig::default()
        }
    }

    fn create_test_simulation(count: usize) -> Simulation {
        let mut sim = Simulation::new(test_config(), 42);
        sim.set_factions(vec![
            FactionMatchup::new("Empire", "Sturgia", 3.0),
            FactionMatchup::new("Aserai", "Vlandia", -3.0),
        ]);
        sim.generate_population(count, PopulationProfile::Mixed);
        sim
    }

    #[test]
    fn test_mixed_population() {
        let sim = create_test_simulation(24);
        assert_eq!(sim.players.len(), 24);

        let ids: HashSet<&str> = sim.players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), 24);
        assert!(ids.contains("Player_1") && ids.contains("Player_24"));

        for player in &sim.players {
            assert!(RATING_RANGE.contains(&player.rating));
            let mut levels: Vec<f64> = Role::ALL.iter().map(|&r| player.proficiency.get(r)).collect();
            levels.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(levels, vec![0.0, 5.0, 10.0]);
        }

        assert!(sim.players.windows(2).all(|w| w[0].rating >= w[1].rating));
        assert!(sim.players[..LEADER_COUNT].iter().all(|p| p.leader));
        assert!(sim.players[LEADER_COUNT..].iter().all(|p| !p.leader));
    }

    #[test]
    fn test_cavalry_heavy_population() {
        let mut sim = Simulation::new(test_config(), 7);
        sim.generate_population(12, PopulationProfile::CavalryHeavy);

        for player in &sim.players {
            assert_eq!(player.proficiency.cavalry, 10.0);
            for value in [player.proficiency.infantry, player.proficiency.archer] {
                assert!((0.0..=5.0).contains(&value));
                assert!(((value * 10.0).round() - value * 10.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_population_deterministic_per_seed() {
        let a = create_test_simulation(36);
        let b = create_test_simulation(36);
        assert_eq!(a.players, b.players);
    }

    #[test]
    fn test_round_conserves_total_rating() {
        let mut sim = create_test_simulation(24);
        let before: i64 = sim.players.iter().map(|p| p.rating).sum();

        let matches = sim.run_round().unwrap().len();
        assert_eq!(matches, 2);

        let after: i64 = sim.players.iter().map(|p| p.rating).sum();
        assert_eq!(before, after);
        assert_eq!(sim.stats.total_matches, 2);
        assert_eq!(sim.stats.rounds, 1);
        assert!(sim.players.iter().all(|p| p.role.is_some()));
    }

    #[test]
    fn test_round_moves_ratings_by_step() {
        let mut sim = create_test_simulation(12);
        let before: HashMap<String, i64> = sim.players.iter().map(|p| (p.id.clone(), p.rating)).collect();
        sim.run_round().unwrap();

        for player in &sim.players {
            let delta = player.rating - before[&player.id];
            assert_eq!(delta.abs(), sim.config.rating_step);
        }
    }

    #[test]
    fn test_run_accumulates_stats() {
        let mut sim = create_test_simulation(24);
        sim.run(3).unwrap();

        let stats = &sim.stats;
        assert_eq!(stats.rounds, 3);
        assert_eq!(stats.total_matches, 6);
        assert_eq!(stats.disparity_samples.len(), 6);
        assert!(stats.team_one_wins <= 6);
        assert!(stats.min_disparity as f64 <= stats.median_disparity);
        assert!(stats.median_disparity <= stats.max_disparity as f64);
        assert!(stats.avg_outcome_probability > 0.0 && stats.avg_outcome_probability < 1.0);
    }

    #[test]
    fn test_run_is_deterministic() {
        let mut a = create_test_simulation(24);
        let mut b = create_test_simulation(24);
        a.run(2).unwrap();
        b.run(2).unwrap();
        assert_eq!(a.players, b.players);
        assert_eq!(a.stats.disparity_samples, b.stats.disparity_samples);
    }

    #[test]
    fn test_custom_map_catalog() {
        let mut sim = create_test_simulation(24);
        sim.set_maps(vec!["Sargot".to_string()]);
        let matches = sim.run_round().unwrap();
        assert!(matches.iter().all(|m| m.map == "Sargot"));

        sim.set_maps(Vec::new());
        assert_eq!(sim.run_round().unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_round_errors() {
        let mut empty = Simulation::new(test_config(), 1);
        empty.set_factions(vec![FactionMatchup::new("Empire", "Sturgia", 0.0)]);
        assert_eq!(empty.run_round().unwrap_err().kind(), ErrorKind::Validation);

        let mut no_factions = Simulation::new(test_config(), 1);
        no_factions.generate_population(12, PopulationProfile::Mixed);
        assert_eq!(no_factions.run_round().unwrap_err().kind(), ErrorKind::Configuration);
        assert_eq!(no_factions.round, 0);
    }

    #[test]
    fn test_summary_values() {
        let mut stats = SimulationStats {
            disparity_samples: vec![300, 100, 0, 100],
            probability_samples: vec![0.4, 0.6],
            ..SimulationStats::default()
        };
        stats.summarize();

        assert_eq!(stats.mean_disparity, 125.0);
        assert_eq!(stats.median_disparity, 100.0);
        assert_eq!(stats.mode_disparity, 100);
        assert_eq!(stats.min_disparity, 0);
        assert_eq!(stats.max_disparity, 300);
        assert!((stats.avg_outcome_probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mode_tie_keeps_first_seen() {
        let mut stats = SimulationStats {
            disparity_samples: vec![50, 20, 20, 50],
            ..SimulationStats::default()
        };
        stats.summarize();
        assert_eq!(stats.mode_disparity, 50);
    }

    #[test]
    fn test_state_json() {
        let mut sim = create_test_simulation(12);
        sim.run_round().unwrap();
        let state: serde_json::Value = serde_json::from_str(&sim.get_state_json()).unwrap();
        assert_eq!(state["round"], 1);
        assert_eq!(state["total_players"], 12);
        assert_eq!(state["stats"]["total_matches"], 1);
    }
}
