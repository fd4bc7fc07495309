use serde::{Deserialize, Serialize};

/// Players per match
pub const GROUP_SIZE: usize = 12;
/// Players per roster
pub const ROSTER_SIZE: usize = 6;
/// Pool sizes accepted by the partitioner
pub const VALID_POOL_SIZES: [usize; 4] = [12, 24, 36, 48];

/// Default map catalog
pub const DEFAULT_MAP_POOL: [&str; 8] = [
    "Xauna",
    "Echerion",
    "Trading post",
    "Town outskirts",
    "Sharis",
    "Urikskalaar",
    "Zendyar",
    "Port Omor",
];

/// Combat roles a player can take in a roster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Infantry,
    Cavalry,
    Archer,
}

impl Role {
    /// Enumeration order used by the role solver. Changing it changes tie-breaks.
    pub const ALL: [Role; 3] = [Role::Infantry, Role::Cavalry, Role::Archer];

    pub fn index(&self) -> usize {
        match self {
            Role::Infantry => 0,
            Role::Cavalry => 1,
            Role::Archer => 2,
        }
    }

    /// Score a player with proficiency 10 contributes in this role
    pub fn base_score(&self) -> f64 {
        match self {
            Role::Infantry => 160.0,
            Role::Cavalry => 200.0,
            Role::Archer => 250.0,
        }
    }

    /// Composition the penalty term pulls towards
    pub fn ideal_count(&self) -> usize {
        match self {
            Role::Infantry => 4,
            Role::Cavalry => 1,
            Role::Archer => 1,
        }
    }

    /// Hard cap per roster, `None` when uncapped
    pub fn cap(&self) -> Option<usize> {
        match self {
            Role::Infantry => None,
            Role::Cavalry => Some(2),
            Role::Archer => Some(2),
        }
    }
}

/// Per-role skill in [0, 10]. Missing roles deserialize as 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Proficiency {
    #[serde(rename = "Infantry", default)]
    pub infantry: f64,
    #[serde(rename = "Cavalry", default)]
    pub cavalry: f64,
    #[serde(rename = "Archer", default)]
    pub archer: f64,
}

impl Proficiency {
    pub fn new(infantry: f64, cavalry: f64, archer: f64) -> Self {
        Self { infantry, cavalry, archer }
    }

    pub fn get(&self, role: Role) -> f64 {
        match role {
            Role::Infantry => self.infantry,
            Role::Cavalry => self.cavalry,
            Role::Archer => self.archer,
        }
    }

    /// Entries sorted by role name, the order used in cache signatures
    pub fn sorted_entries(&self) -> [(Role, f64); 3] {
        [
            (Role::Archer, self.archer),
            (Role::Cavalry, self.cavalry),
            (Role::Infantry, self.infantry),
        ]
    }
}

/// A player in the matchmaking pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    #[serde(default)]
    pub proficiency: Proficiency,
    /// Skill rating (MMR)
    #[serde(alias = "mmr")]
    pub rating: i64,
    /// In-game leader flag, carried through untouched
    #[serde(alias = "igl", default)]
    pub leader: bool,
    /// Role written once the player's roster is final
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Player {
    pub fn new(id: impl Into<String>, proficiency: Proficiency, rating: i64) -> Self {
        Self {
            id: id.into(),
            proficiency,
            rating,
            leader: false,
            role: None,
        }
    }
}

/// One row of the external faction statistics table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactionMatchup {
    pub faction_a: String,
    pub faction_b: String,
    /// Historical advantage of `faction_a` over `faction_b`
    pub win_differential: f64,
}

impl FactionMatchup {
    pub fn new(faction_a: &str, faction_b: &str, win_differential: f64) -> Self {
        Self {
            faction_a: faction_a.to_string(),
            faction_b: faction_b.to_string(),
            win_differential,
        }
    }
}

/// A finalized roster as emitted for reporting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub label: String,
    pub faction: String,
    /// Player ids, highest rating first
    pub player_ids: Vec<String>,
    pub total_rating: i64,
    /// Net score of the roster's role assignment
    pub role_score: f64,
}

/// A finished match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: usize,
    pub map: String,
    pub team_one: RosterRecord,
    pub team_two: RosterRecord,
    /// Probability that `team_one` wins, strictly inside (0, 1)
    pub outcome_probability: f64,
    /// Signed rating total of team one minus team two
    pub rating_disparity: i64,
    /// Differential of the selected faction pairing
    pub win_differential: f64,
}

/// How a 12-player group is split into two rosters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceStrategy {
    /// All 924 splits
    Exact,
    /// Snake seed followed by random swap local search
    Heuristic,
}

/// How the pool is divided into groups of 12
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionStrategy {
    /// First-improvement sweep over every cross-group swap, restarted on improvement
    Exhaustive,
    /// Fixed number of random cross-group swaps
    Sampled,
    /// Exhaustive up to `exhaustive_group_limit` groups, sampled above
    Auto,
}

/// Matchmaking configuration parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    /// Penalty per unit of deviation from the ideal role composition
    pub role_penalty_weight: f64,
    /// Role enumeration stops once a candidate is this close to the upper bound
    pub role_bound_tolerance: f64,

    /// Weight of the pairwise rank gap (γ)
    pub weight_rank_gap: f64,
    /// Weight of the high-rating head count imbalance (β)
    pub weight_high_rating: f64,
    /// Weight of the role score gap (θ)
    pub weight_role_gap: f64,
    /// Players at or above this rating count as high rated
    pub high_rating_threshold: i64,

    pub balance_strategy: BalanceStrategy,
    /// Swap trials for the heuristic balancer
    pub heuristic_iterations: usize,

    pub partition_strategy: PartitionStrategy,
    /// Upper bound on sweeps (including restarts) for the exhaustive partitioner
    pub partition_max_sweeps: usize,
    /// Swap trials for the sampled partitioner
    pub partition_sample_iterations: usize,
    /// Largest group count `Auto` still searches exhaustively
    pub exhaustive_group_limit: usize,

    /// Outcome weight on rating gap (k1)
    pub k_rating: f64,
    /// Outcome weight on role score margin (k2)
    pub k_role: f64,
    /// Outcome weight on faction win differential (k3)
    pub k_faction: f64,

    /// Rating change applied to each player after a simulated match
    pub rating_step: i64,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            role_penalty_weight: 50.0,
            role_bound_tolerance: 1e-6,
            weight_rank_gap: 0.1,
            weight_high_rating: 100.0,
            weight_role_gap: 1.0,
            high_rating_threshold: 6000,
            balance_strategy: BalanceStrategy::Exact,
            heuristic_iterations: 924,
            partition_strategy: PartitionStrategy::Auto,
            partition_max_sweeps: 1000,
            partition_sample_iterations: 200,
            exhaustive_group_limit: 2,
            k_rating: 1.0,
            k_role: 1.0,
            k_faction: 0.1,
            rating_step: 25,
        }
    }
}

impl MatchmakingConfig {
    /// Partition strategy after resolving `Auto` for a pool of `groups` groups
    pub fn resolved_partition_strategy(&self, groups: usize) -> PartitionStrategy {
        match self.partition_strategy {
            PartitionStrategy::Auto if groups <= self.exhaustive_group_limit => {
                PartitionStrategy::Exhaustive
            }
            PartitionStrategy::Auto => PartitionStrategy::Sampled,
            other => other,
        }
    }
}
