use prometheus::{Gauge, IntGauge, Registry};

/// Metrics tracking the consensus component.
#[derive(Debug)]
pub(super) struct Metrics {
    /// The checkpoint most recently finalized.
    pub(super) current_checkpoint: IntGauge,
    /// Masternodes penalized at the most recent checkpoint.
    pub(super) penalized_masternodes: IntGauge,
    /// Snapshots currently held in the cache.
    pub(super) snapshot_cache_entries: IntGauge,
    /// Time spent computing the most recent penalty list, in seconds.
    pub(super) penalty_computation_time: Gauge,
    /// Time spent distributing the most recent reward, in seconds.
    pub(super) reward_computation_time: Gauge,
}

impl Metrics {
    pub(super) fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let current_checkpoint = IntGauge::new(
            "posv_current_checkpoint",
            "height of the most recently finalized checkpoint",
        )?;
        let penalized_masternodes = IntGauge::new(
            "posv_penalized_masternodes",
            "number of masternodes penalized at the most recent checkpoint",
        )?;
        let snapshot_cache_entries = IntGauge::new(
            "posv_snapshot_cache_entries",
            "number of signer snapshots currently cached",
        )?;
        let penalty_computation_time = Gauge::new(
            "posv_penalty_computation_time",
            "seconds spent computing the most recent penalty list",
        )?;
        let reward_computation_time = Gauge::new(
            "posv_reward_computation_time",
            "seconds spent distributing the most recent reward",
        )?;

        registry.register(Box::new(current_checkpoint.clone()))?;
        registry.register(Box::new(penalized_masternodes.clone()))?;
        registry.register(Box::new(snapshot_cache_entries.clone()))?;
        registry.register(Box::new(penalty_computation_time.clone()))?;
        registry.register(Box::new(reward_computation_time.clone()))?;

        Ok(Metrics {
            current_checkpoint,
            penalized_masternodes,
            snapshot_cache_entries,
            penalty_computation_time,
            reward_computation_time,
        })
    }
}
