use crate::roles::{RoleCache, RoleSolver};
use crate::types::{MatchmakingConfig, Player, ROSTER_SIZE};

/// Smallest and largest probabilities the model reports
const MIN_PROBABILITY: f64 = f64::MIN_POSITIVE;
const MAX_PROBABILITY: f64 = 1.0 - f64::EPSILON / 2.0;

/// Inputs and result of one win probability prediction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    /// Σ ratings(one) − Σ ratings(two)
    pub rating_gap: i64,
    /// Net role score of roster one minus roster two
    pub role_margin: f64,
    pub win_differential: f64,
    /// Probability that roster one wins
    pub probability: f64,
}

/// Logistic model over rating gap, role margin and faction differential
#[derive(Clone, Copy, Debug)]
pub struct OutcomeModel {
    k_rating: f64,
    k_role: f64,
    k_faction: f64,
}

impl OutcomeModel {
    pub fn new(config: &MatchmakingConfig) -> Self {
        Self {
            k_rating: config.k_rating,
            k_role: config.k_role,
            k_faction: config.k_faction,
        }
    }

    /// Logit before the logistic transform
    pub fn logit(&self, rating_gap: f64, role_margin: f64, win_differential: f64) -> f64 {
        self.k_rating * (rating_gap / 1000.0)
            + self.k_role * (role_margin / 1000.0)
            + self.k_faction * (win_differential / 10.0)
    }

    /// Probability that roster one wins, strictly inside (0, 1).
    ///
    /// Saturated tails are pulled back to the nearest representable values
    /// inside the interval, and a NaN logit reports an even match.
    pub fn win_probability(&self, rating_gap: f64, role_margin: f64, win_differential: f64) -> f64 {
        let x = self.logit(rating_gap, role_margin, win_differential);
        let p = 1.0 / (1.0 + (-x).exp());
        if p.is_finite() {
            p.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
        } else {
            0.5
        }
    }

    /// Predict a match between two rosters, reusing cached role scores
    pub fn predict(
        &self,
        pool: &[Player],
        one: &[usize; ROSTER_SIZE],
        two: &[usize; ROSTER_SIZE],
        win_differential: f64,
        solver: &RoleSolver,
        cache: &mut RoleCache,
    ) -> Prediction {
        let rating = |roster: &[usize; ROSTER_SIZE]| -> i64 {
            roster.iter().map(|&i| pool[i].rating).sum()
        };
        let rating_gap = rating(one) - rating(two);
        let role_margin = solver.net_score(pool, one, cache) - solver.net_score(pool, two, cache);

        Prediction {
            rating_gap,
            role_margin,
            win_differential,
            probability: self.win_probability(rating_gap as f64, role_margin, win_differential),
        }
    }
}
