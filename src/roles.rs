use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::types::{MatchmakingConfig, Player, Role, ROSTER_SIZE};

/// 3^6 role vectors for a six-player roster
const ASSIGNMENT_SPACE: usize = 729;

/// A role vector within the caps, with its distance from the ideal composition
struct CappedVector {
    /// `Role::ALL` index per slot
    digits: [u8; ROSTER_SIZE],
    deviation: u8,
}

/// All capped role vectors in enumeration order (player 0 most significant)
fn capped_vectors() -> &'static [CappedVector] {
    static TABLE: OnceLock<Vec<CappedVector>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = Vec::new();
        for code in 0..ASSIGNMENT_SPACE {
            let mut digits = [0u8; ROSTER_SIZE];
            let mut rest = code;
            for slot in (0..ROSTER_SIZE).rev() {
                digits[slot] = (rest % 3) as u8;
                rest /= 3;
            }

            let mut counts = [0usize; 3];
            for &d in &digits {
                counts[d as usize] += 1;
            }
            let within_caps = Role::ALL
                .iter()
                .all(|role| role.cap().map_or(true, |cap| counts[role.index()] <= cap));
            if !within_caps {
                continue;
            }

            let deviation: usize = Role::ALL
                .iter()
                .map(|role| counts[role.index()].abs_diff(role.ideal_count()))
                .sum();
            table.push(CappedVector {
                digits,
                deviation: deviation as u8,
            });
        }
        table
    })
}

/// Proficiency bits sorted by role name, plus rating
type SignatureBody = (i64, [u64; 3]);

fn signature_body(player: &Player) -> SignatureBody {
    let entries = player.proficiency.sorted_entries();
    (
        player.rating,
        [entries[0].1.to_bits(), entries[1].1.to_bits(), entries[2].1.to_bits()],
    )
}

/// Canonical order of roster members: id, then rating, then proficiencies
fn canonical_cmp(a: &Player, b: &Player) -> Ordering {
    a.id
        .cmp(&b.id)
        .then_with(|| signature_body(a).cmp(&signature_body(b)))
}

/// Order-independent key for a set of six players, one interned token per
/// distinct (id, rating, proficiency) signature
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct RosterKey([u32; ROSTER_SIZE]);

/// Best role assignment found for one roster
#[derive(Clone, Debug, PartialEq)]
pub struct RoleAssignment {
    pub net_score: f64,
    /// (player id, role) in canonical order
    pub roles: Vec<(String, Role)>,
}

impl RoleAssignment {
    pub fn role_of(&self, player_id: &str) -> Option<Role> {
        self.roles
            .iter()
            .find(|(id, _)| id == player_id)
            .map(|(_, role)| *role)
    }

    pub fn count(&self, role: Role) -> usize {
        self.roles.iter().filter(|(_, r)| *r == role).count()
    }
}

/// Memo table for role assignments, owned by one matchmaking run.
///
/// Entries are keyed by roster signature only, so a cache must not be shared
/// between solvers with different penalty settings. It is not synchronized:
/// parallel callers need one cache per worker or a lock around it.
#[derive(Debug, Default)]
pub struct RoleCache {
    entries: HashMap<RosterKey, RoleAssignment>,
    /// id -> signatures seen for that id with their tokens
    tokens: HashMap<String, Vec<(SignatureBody, u32)>>,
    next_token: u32,
    hits: u64,
    misses: u64,
}

impl RoleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop all entries and interned signatures and reset the counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tokens.clear();
        self.next_token = 0;
        self.hits = 0;
        self.misses = 0;
    }

    fn token(&mut self, player: &Player) -> u32 {
        let body = signature_body(player);
        if let Some(seen) = self.tokens.get_mut(player.id.as_str()) {
            if let Some((_, token)) = seen.iter().find(|(b, _)| *b == body) {
                return *token;
            }
            let token = self.next_token;
            self.next_token += 1;
            seen.push((body, token));
            return token;
        }
        let token = self.next_token;
        self.next_token += 1;
        self.tokens.insert(player.id.clone(), vec![(body, token)]);
        token
    }

    /// Key for `members` (indices into `pool`)
    fn key(&mut self, pool: &[Player], members: &[usize]) -> RosterKey {
        let mut tokens = [0u32; ROSTER_SIZE];
        for (slot, &idx) in members.iter().enumerate() {
            tokens[slot] = self.token(&pool[idx]);
        }
        tokens.sort_unstable();
        RosterKey(tokens)
    }

    /// Cached assignment for `members`, solving on a miss
    pub fn get_or_solve(
        &mut self,
        solver: &RoleSolver,
        pool: &[Player],
        members: &[usize],
    ) -> &RoleAssignment {
        let key = self.key(pool, members);
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.entries.entry(key).or_insert_with(|| {
            let mut order = members.to_vec();
            order.sort_by(|&a, &b| canonical_cmp(&pool[a], &pool[b]));
            solver.solve(pool, &order)
        })
    }
}

/// Picks each roster member's role to maximize the net role score
#[derive(Clone, Debug)]
pub struct RoleSolver {
    penalty_weight: f64,
    tolerance: f64,
}

impl RoleSolver {
    pub fn new(config: &MatchmakingConfig) -> Self {
        Self {
            penalty_weight: config.role_penalty_weight,
            tolerance: config.role_bound_tolerance,
        }
    }

    /// Score of a player in a role before composition penalties
    pub fn role_gain(player: &Player, role: Role) -> f64 {
        player.proficiency.get(role) / 10.0 * role.base_score()
    }

    /// Penalty for a role count vector indexed by `Role::index`
    pub fn composition_penalty(&self, counts: &[usize; 3]) -> f64 {
        let deviation: usize = Role::ALL
            .iter()
            .map(|role| counts[role.index()].abs_diff(role.ideal_count()))
            .sum();
        self.penalty_weight * deviation as f64
    }

    /// Cached net score of a roster
    pub fn net_score(&self, pool: &[Player], members: &[usize], cache: &mut RoleCache) -> f64 {
        cache.get_or_solve(self, pool, members).net_score
    }

    /// Enumerate every capped role vector for `members`, keeping the first best.
    ///
    /// Vectors are visited in base-3 order with player 0 as the most
    /// significant digit and digits following `Role::ALL`. Stops early once a
    /// candidate reaches the uncapped, penalty-free upper bound.
    pub fn solve(&self, pool: &[Player], members: &[usize]) -> RoleAssignment {
        debug_assert_eq!(members.len(), ROSTER_SIZE);

        let mut gains = [[0.0f64; 3]; ROSTER_SIZE];
        for (slot, &idx) in members.iter().enumerate() {
            for role in Role::ALL {
                gains[slot][role.index()] = Self::role_gain(&pool[idx], role);
            }
        }
        let upper_bound: f64 = gains
            .iter()
            .map(|row| row.iter().cloned().fold(f64::MIN, f64::max))
            .sum();

        let mut best_score = f64::NEG_INFINITY;
        let mut best_digits = [0u8; ROSTER_SIZE];

        for vector in capped_vectors() {
            let raw: f64 = vector
                .digits
                .iter()
                .enumerate()
                .map(|(slot, &d)| gains[slot][d as usize])
                .sum();
            let score = raw - self.penalty_weight * vector.deviation as f64;

            if score > best_score {
                best_score = score;
                best_digits = vector.digits;
                if best_score >= upper_bound - self.tolerance {
                    break;
                }
            }
        }

        RoleAssignment {
            net_score: best_score,
            roles: members
                .iter()
                .zip(best_digits.iter())
                .map(|(&idx, &d)| (pool[idx].id.clone(), Role::ALL[d as usize]))
                .collect(),
        }
    }
}
