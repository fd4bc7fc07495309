use rand::Rng;

use crate::roles::{RoleCache, RoleSolver};
use crate::types::{BalanceStrategy, MatchmakingConfig, Player, GROUP_SIZE, ROSTER_SIZE};

/// Breakdown of the split objective
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitScore {
    /// |Σ ratings(one) − Σ ratings(two)|
    pub rating_gap: f64,
    /// Σ |rating_i(one) − rating_i(two)| over both rosters sorted descending
    pub rank_gap: f64,
    /// Difference in head count at or above the high-rating threshold
    pub high_rating_imbalance: f64,
    pub role_score_gap: f64,
    /// Signed role score of roster one minus roster two
    pub role_margin: f64,
    pub objective: f64,
}

/// Two rosters of six drawn from one group
#[derive(Clone, Debug)]
pub struct BalancedSplit {
    pub roster_one: [usize; ROSTER_SIZE],
    pub roster_two: [usize; ROSTER_SIZE],
    pub score: SplitScore,
    /// Search stopped on a split that cannot be improved on
    pub early_exit: bool,
    /// Objective of the snake-draft seed (heuristic only)
    pub seed_objective: Option<f64>,
    /// Number of splits scored
    pub evaluations: usize,
}

impl BalancedSplit {
    pub fn objective(&self) -> f64 {
        self.score.objective
    }
}

/// Splits a group of 12 into two balanced rosters
#[derive(Clone, Debug)]
pub struct RosterBalancer {
    strategy: BalanceStrategy,
    iterations: usize,
    weight_rank_gap: f64,
    weight_high_rating: f64,
    weight_role_gap: f64,
    high_rating_threshold: i64,
    solver: RoleSolver,
}

impl RosterBalancer {
    pub fn new(config: &MatchmakingConfig) -> Self {
        Self {
            strategy: config.balance_strategy,
            iterations: config.heuristic_iterations,
            weight_rank_gap: config.weight_rank_gap,
            weight_high_rating: config.weight_high_rating,
            weight_role_gap: config.weight_role_gap,
            high_rating_threshold: config.high_rating_threshold,
            solver: RoleSolver::new(config),
        }
    }

    pub fn with_strategy(mut self, strategy: BalanceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn solver(&self) -> &RoleSolver {
        &self.solver
    }

    /// Score an arbitrary split
    pub fn score(
        &self,
        pool: &[Player],
        one: &[usize; ROSTER_SIZE],
        two: &[usize; ROSTER_SIZE],
        cache: &mut RoleCache,
    ) -> SplitScore {
        let sums = (rating_sum(pool, one), rating_sum(pool, two));
        self.evaluate(pool, one, two, sums, cache)
    }

    /// Score a split whose rating totals are already known
    fn evaluate(
        &self,
        pool: &[Player],
        one: &[usize; ROSTER_SIZE],
        two: &[usize; ROSTER_SIZE],
        sums: (i64, i64),
        cache: &mut RoleCache,
    ) -> SplitScore {
        let rating_gap = (sums.0 - sums.1).abs() as f64;

        let ranked_one = ratings_descending(pool, one);
        let ranked_two = ratings_descending(pool, two);
        let rank_gap: i64 = ranked_one
            .iter()
            .zip(ranked_two.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();

        let high_one = ranked_one.iter().filter(|&&r| r >= self.high_rating_threshold).count();
        let high_two = ranked_two.iter().filter(|&&r| r >= self.high_rating_threshold).count();
        let high_rating_imbalance = high_one.abs_diff(high_two) as f64;

        let role_one = self.solver.net_score(pool, one, cache);
        let role_two = self.solver.net_score(pool, two, cache);
        let role_margin = role_one - role_two;
        let role_score_gap = role_margin.abs();

        let objective = rating_gap
            + self.weight_rank_gap * rank_gap as f64
            + self.weight_high_rating * high_rating_imbalance
            + self.weight_role_gap * role_score_gap;

        SplitScore {
            rating_gap,
            rank_gap: rank_gap as f64,
            high_rating_imbalance,
            role_score_gap,
            role_margin,
            objective,
        }
    }

    /// Balance one group with the configured strategy
    pub fn balance<R: Rng + ?Sized>(
        &self,
        pool: &[Player],
        group: &[usize; GROUP_SIZE],
        cache: &mut RoleCache,
        rng: &mut R,
    ) -> BalancedSplit {
        match self.strategy {
            BalanceStrategy::Exact => self.balance_exact(pool, group, cache),
            BalanceStrategy::Heuristic => self.balance_heuristic(pool, group, cache, rng),
        }
    }

    /// Score all C(12, 6) choices of roster one and keep the first minimum.
    ///
    /// Stops at the first split with zero rating gap whose remaining terms are
    /// also zero, since nothing can beat it.
    pub fn balance_exact(
        &self,
        pool: &[Player],
        group: &[usize; GROUP_SIZE],
        cache: &mut RoleCache,
    ) -> BalancedSplit {
        let mut picks = [0usize; ROSTER_SIZE];
        for (i, pick) in picks.iter_mut().enumerate() {
            *pick = i;
        }

        let (one, two) = split_from_picks(group, &picks);
        let score = self.score(pool, &one, &two, cache);
        let mut best = BalancedSplit {
            roster_one: one,
            roster_two: two,
            score,
            early_exit: is_perfect(&score),
            seed_objective: None,
            evaluations: 1,
        };

        while !best.early_exit && next_combination(&mut picks, GROUP_SIZE) {
            let (one, two) = split_from_picks(group, &picks);
            let score = self.score(pool, &one, &two, cache);
            best.evaluations += 1;

            if score.objective < best.score.objective {
                best.roster_one = one;
                best.roster_two = two;
                best.score = score;
                best.early_exit = is_perfect(&score);
            }
        }

        if best.early_exit {
            log::debug!(
                "Exact balance hit zero disparity after {} of 924 splits",
                best.evaluations
            );
        }

        best
    }

    /// Snake-draft seed, then random one-for-one swaps kept only on strict improvement
    pub fn balance_heuristic<R: Rng + ?Sized>(
        &self,
        pool: &[Player],
        group: &[usize; GROUP_SIZE],
        cache: &mut RoleCache,
        rng: &mut R,
    ) -> BalancedSplit {
        let (mut one, mut two) = snake_split(pool, group);
        let mut sums = (rating_sum(pool, &one), rating_sum(pool, &two));
        let mut current = self.evaluate(pool, &one, &two, sums, cache);
        let seed_objective = current.objective;
        let mut evaluations = 1;
        let mut early_exit = is_perfect(&current);

        for _ in 0..self.iterations {
            if early_exit {
                break;
            }

            let a = rng.gen_range(0..ROSTER_SIZE);
            let b = rng.gen_range(0..ROSTER_SIZE);
            let rating_a = pool[one[a]].rating;
            let rating_b = pool[two[b]].rating;

            std::mem::swap(&mut one[a], &mut two[b]);
            let trial_sums = (sums.0 - rating_a + rating_b, sums.1 - rating_b + rating_a);
            let trial = self.evaluate(pool, &one, &two, trial_sums, cache);
            evaluations += 1;

            if trial.objective < current.objective {
                current = trial;
                sums = trial_sums;
                early_exit = is_perfect(&current);
            } else {
                std::mem::swap(&mut one[a], &mut two[b]);
            }
        }

        BalancedSplit {
            roster_one: one,
            roster_two: two,
            score: current,
            early_exit,
            seed_objective: Some(seed_objective),
            evaluations,
        }
    }
}

fn is_perfect(score: &SplitScore) -> bool {
    score.rating_gap == 0.0 && score.objective <= 0.0
}

fn rating_sum(pool: &[Player], roster: &[usize; ROSTER_SIZE]) -> i64 {
    roster.iter().map(|&idx| pool[idx].rating).sum()
}

fn ratings_descending(pool: &[Player], roster: &[usize; ROSTER_SIZE]) -> [i64; ROSTER_SIZE] {
    let mut ratings = roster.map(|idx| pool[idx].rating);
    ratings.sort_unstable_by(|a, b| b.cmp(a));
    ratings
}

/// Advance `picks` to the next k-combination of `0..n` in lexicographic order
pub fn next_combination(picks: &mut [usize], n: usize) -> bool {
    let k = picks.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if picks[i] < n - k + i {
            picks[i] += 1;
            for j in i + 1..k {
                picks[j] = picks[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

/// Roster one takes the picked positions of the group, roster two the rest
fn split_from_picks(
    group: &[usize; GROUP_SIZE],
    picks: &[usize; ROSTER_SIZE],
) -> ([usize; ROSTER_SIZE], [usize; ROSTER_SIZE]) {
    let one = picks.map(|p| group[p]);
    let mut two = [0usize; ROSTER_SIZE];
    let mut filled = 0;
    for (pos, &member) in group.iter().enumerate() {
        if !picks.contains(&pos) {
            two[filled] = member;
            filled += 1;
        }
    }
    (one, two)
}

/// Snake draft by rating, highest first: one, two, two, one, one, two, ...
pub fn snake_split(
    pool: &[Player],
    group: &[usize; GROUP_SIZE],
) -> ([usize; ROSTER_SIZE], [usize; ROSTER_SIZE]) {
    let mut order = *group;
    order.sort_by(|&a, &b| pool[b].rating.cmp(&pool[a].rating));

    let mut rosters = [[0usize; ROSTER_SIZE]; 2];
    let mut filled = [0usize; 2];
    let mut forward = true;
    let mut team_idx = 0;

    for member in order {
        rosters[team_idx][filled[team_idx]] = member;
        filled[team_idx] += 1;

        if forward {
            if team_idx == 1 {
                forward = false;
            } else {
                team_idx += 1;
            }
        } else if team_idx == 0 {
            forward = true;
        } else {
            team_idx -= 1;
        }
    }

    (rosters[0], rosters[1])
}
