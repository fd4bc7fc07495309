use rand::Rng;

use crate::balancer::{BalancedSplit, RosterBalancer};
use crate::error::{validate_pool_size, MatchmakingError};
use crate::roles::RoleCache;
use crate::types::{MatchmakingConfig, PartitionStrategy, Player, GROUP_SIZE};

/// Groups of 12 with their balanced splits.
///
/// The swap search only guarantees a local optimum: beyond a single group,
/// and whenever the heuristic balancer prices the groups, the total cost is
/// a heuristic value and not a proven minimum.
#[derive(Clone, Debug)]
pub struct Partition {
    /// Indices into the pool, one array per match
    pub groups: Vec<[usize; GROUP_SIZE]>,
    /// Split for each group, same order as `groups`
    pub splits: Vec<BalancedSplit>,
    pub total_cost: f64,
    /// Cost of the contiguous starting groups
    pub initial_cost: f64,
    /// Strategy actually used once `Auto` is resolved
    pub strategy: PartitionStrategy,
    pub accepted_swaps: usize,
    /// Swap trials evaluated
    pub trials: usize,
}

/// Assigns the pool to groups, minimizing the summed split objective
#[derive(Clone, Debug)]
pub struct PoolPartitioner {
    config: MatchmakingConfig,
    balancer: RosterBalancer,
}

impl PoolPartitioner {
    pub fn new(config: &MatchmakingConfig) -> Self {
        Self {
            config: config.clone(),
            balancer: RosterBalancer::new(config),
        }
    }

    pub fn balancer(&self) -> &RosterBalancer {
        &self.balancer
    }

    /// Partition `pool` into groups of 12.
    ///
    /// Starts from contiguous slices of the input order and improves by
    /// swapping single players across groups, rebalancing only the two
    /// groups a swap touches.
    pub fn partition<R: Rng + ?Sized>(
        &self,
        pool: &[Player],
        cache: &mut RoleCache,
        rng: &mut R,
    ) -> Result<Partition, MatchmakingError> {
        let group_count = validate_pool_size(pool.len())?;

        let groups: Vec<[usize; GROUP_SIZE]> = (0..group_count)
            .map(|g| {
                let mut group = [0usize; GROUP_SIZE];
                for (i, slot) in group.iter_mut().enumerate() {
                    *slot = g * GROUP_SIZE + i;
                }
                group
            })
            .collect();
        let splits: Vec<BalancedSplit> = groups
            .iter()
            .map(|group| self.balancer.balance(pool, group, cache, rng))
            .collect();

        let initial_cost = splits.iter().map(|s| s.objective()).sum();
        let mut partition = Partition {
            groups,
            splits,
            total_cost: initial_cost,
            initial_cost,
            strategy: self.config.resolved_partition_strategy(group_count),
            accepted_swaps: 0,
            trials: 0,
        };

        match partition.strategy {
            PartitionStrategy::Exhaustive => self.sweep(pool, &mut partition, cache, rng),
            PartitionStrategy::Sampled | PartitionStrategy::Auto => {
                self.sample(pool, &mut partition, cache, rng)
            }
        }

        partition.total_cost = partition.splits.iter().map(|s| s.objective()).sum();
        log::info!(
            "Partitioned {} players into {} groups ({:?}): cost {:.2}, {} swaps accepted over {} trials",
            pool.len(),
            group_count,
            partition.strategy,
            partition.total_cost,
            partition.accepted_swaps,
            partition.trials
        );

        Ok(partition)
    }

    /// First-improvement sweep over all group pairs and member pairs,
    /// restarting from the top after every accepted swap
    fn sweep<R: Rng + ?Sized>(
        &self,
        pool: &[Player],
        partition: &mut Partition,
        cache: &mut RoleCache,
        rng: &mut R,
    ) {
        let group_count = partition.groups.len();
        let mut sweeps = 0;

        'search: while sweeps < self.config.partition_max_sweeps {
            sweeps += 1;
            for gi in 0..group_count {
                for gj in gi + 1..group_count {
                    for p in 0..GROUP_SIZE {
                        for q in 0..GROUP_SIZE {
                            if self.try_swap(pool, partition, (gi, p), (gj, q), cache, rng) {
                                continue 'search;
                            }
                        }
                    }
                }
            }
            log::debug!("Sweep {} found no improving swap", sweeps);
            return;
        }

        log::debug!("Sweep budget of {} exhausted", self.config.partition_max_sweeps);
    }

    /// Random cross-group swaps for a fixed number of trials
    fn sample<R: Rng + ?Sized>(
        &self,
        pool: &[Player],
        partition: &mut Partition,
        cache: &mut RoleCache,
        rng: &mut R,
    ) {
        let group_count = partition.groups.len();
        if group_count < 2 {
            return;
        }

        for _ in 0..self.config.partition_sample_iterations {
            let gi = rng.gen_range(0..group_count);
            let mut gj = rng.gen_range(0..group_count - 1);
            if gj >= gi {
                gj += 1;
            }
            let p = rng.gen_range(0..GROUP_SIZE);
            let q = rng.gen_range(0..GROUP_SIZE);
            self.try_swap(pool, partition, (gi, p), (gj, q), cache, rng);
        }
    }

    /// Swap one member between two groups, keeping the swap only if the
    /// two groups' combined objective strictly drops
    fn try_swap<R: Rng + ?Sized>(
        &self,
        pool: &[Player],
        partition: &mut Partition,
        (gi, p): (usize, usize),
        (gj, q): (usize, usize),
        cache: &mut RoleCache,
        rng: &mut R,
    ) -> bool {
        partition.trials += 1;
        let before = partition.splits[gi].objective() + partition.splits[gj].objective();

        swap_members(&mut partition.groups, (gi, p), (gj, q));
        let split_i = self.balancer.balance(pool, &partition.groups[gi], cache, rng);
        let split_j = self.balancer.balance(pool, &partition.groups[gj], cache, rng);

        if split_i.objective() + split_j.objective() < before {
            log::debug!(
                "Swapped {} (group {}) with {} (group {}): {:.2} -> {:.2}",
                pool[partition.groups[gj][q]].id,
                gi,
                pool[partition.groups[gi][p]].id,
                gj,
                before,
                split_i.objective() + split_j.objective()
            );
            partition.splits[gi] = split_i;
            partition.splits[gj] = split_j;
            partition.accepted_swaps += 1;
            true
        } else {
            swap_members(&mut partition.groups, (gi, p), (gj, q));
            false
        }
    }
}

fn swap_members(groups: &mut [[usize; GROUP_SIZE]], (gi, p): (usize, usize), (gj, q): (usize, usize)) {
    let held = groups[gi][p];
    groups[gi][p] = groups[gj][q];
    groups[gj][q] = held;
}
