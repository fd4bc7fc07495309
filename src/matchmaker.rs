use std::cmp::Reverse;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{validate_factions, validate_maps, validate_pool, MatchmakingError};
use crate::matchup::MatchupSelector;
use crate::outcome::OutcomeModel;
use crate::partition::PoolPartitioner;
use crate::roles::{RoleAssignment, RoleCache};
use crate::types::*;

/// The matchmaking engine
pub struct Matchmaker {
    config: MatchmakingConfig,
}

impl Matchmaker {
    pub fn new(config: MatchmakingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    /// Build matches for the whole pool with a fresh role cache.
    ///
    /// Roles are written onto `players` once their roster is final.
    pub fn run<R: Rng + ?Sized>(
        &self,
        players: &mut [Player],
        factions: &[FactionMatchup],
        maps: &[String],
        rng: &mut R,
    ) -> Result<Vec<MatchRecord>, MatchmakingError> {
        let mut cache = RoleCache::new();
        self.run_with_cache(players, factions, maps, &mut cache, rng)
    }

    /// Same as [`Matchmaker::run`] with a caller-owned cache.
    ///
    /// The cache must only have been filled under the same role penalty
    /// weight as this matchmaker's configuration.
    pub fn run_with_cache<R: Rng + ?Sized>(
        &self,
        players: &mut [Player],
        factions: &[FactionMatchup],
        maps: &[String],
        cache: &mut RoleCache,
        rng: &mut R,
    ) -> Result<Vec<MatchRecord>, MatchmakingError> {
        validate_pool(players)?;
        validate_factions(factions)?;
        validate_maps(maps)?;

        let partitioner = PoolPartitioner::new(&self.config);
        let partition = partitioner.partition(players, cache, rng)?;
        let solver = partitioner.balancer().solver();
        let selector = MatchupSelector::new();
        let model = OutcomeModel::new(&self.config);

        let mut matches = Vec::with_capacity(partition.splits.len());
        for (i, split) in partition.splits.iter().enumerate() {
            let assignment_one = cache.get_or_solve(solver, players, &split.roster_one).clone();
            let assignment_two = cache.get_or_solve(solver, players, &split.roster_two).clone();
            assign_roles(players, &split.roster_one, &assignment_one);
            assign_roles(players, &split.roster_two, &assignment_two);

            let margin = assignment_one.net_score - assignment_two.net_score;
            let matchup = selector.select(margin, factions)?;
            let prediction = model.predict(
                players,
                &split.roster_one,
                &split.roster_two,
                matchup.win_differential,
                solver,
                cache,
            );
            let map = maps.choose(rng).ok_or(MatchmakingError::EmptyMapCatalog)?;

            log::debug!(
                "Match {}: gap {}, role margin {:.1}, {} vs {} ({:+.1}), p = {:.3}",
                i + 1,
                prediction.rating_gap,
                margin,
                matchup.faction_a,
                matchup.faction_b,
                matchup.win_differential,
                prediction.probability
            );

            matches.push(MatchRecord {
                id: i + 1,
                map: map.clone(),
                team_one: roster_record("Team 1", &matchup.faction_a, players, &split.roster_one, &assignment_one),
                team_two: roster_record("Team 2", &matchup.faction_b, players, &split.roster_two, &assignment_two),
                outcome_probability: prediction.probability,
                rating_disparity: prediction.rating_gap,
                win_differential: matchup.win_differential,
            });
        }

        log::info!(
            "Built {} matches from {} players (cost {:.2}); role cache {} entries, {} hits, {} misses",
            matches.len(),
            players.len(),
            partition.total_cost,
            cache.len(),
            cache.hits(),
            cache.misses()
        );

        Ok(matches)
    }
}

fn assign_roles(players: &mut [Player], roster: &[usize; ROSTER_SIZE], assignment: &RoleAssignment) {
    debug_assert!(Role::ALL
        .iter()
        .all(|&role| role.cap().map_or(true, |cap| assignment.count(role) <= cap)));
    for &idx in roster {
        let role = assignment.role_of(&players[idx].id);
        players[idx].role = role;
    }
}

fn roster_record(
    label: &str,
    faction: &str,
    players: &[Player],
    roster: &[usize; ROSTER_SIZE],
    assignment: &RoleAssignment,
) -> RosterRecord {
    let mut order = roster.to_vec();
    order.sort_by_key(|&i| Reverse(players[i].rating));

    RosterRecord {
        label: label.to_string(),
        faction: faction.to_string(),
        player_ids: order.iter().map(|&i| players[i].id.clone()).collect(),
        total_rating: roster.iter().map(|&i| players[i].rating).sum(),
        role_score: assignment.net_score,
    }
}
