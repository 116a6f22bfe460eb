use std::num::NonZeroUsize;
use std::ops::Range;

/// The identity of one worker within a fixed-size training group.
///
/// Exactly one worker is the leader; single-writer steps (regularization
/// decay, global log lines) are gated on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCtx {
    worker_id: usize,
    num_workers: NonZeroUsize,
}

impl WorkerCtx {
    /// The worker id that acts as the designated single writer by default.
    pub const LEADER: usize = 0;

    /// Creates the context for `worker_id` in a group of `num_workers`.
    ///
    /// # Panics
    /// If `worker_id` is not below `num_workers`.
    pub fn new(worker_id: usize, num_workers: NonZeroUsize) -> Self {
        assert!(worker_id < num_workers.get(), "worker_id out of range");
        Self {
            worker_id,
            num_workers,
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn num_workers(&self) -> NonZeroUsize {
        self.num_workers
    }

    /// Whether this worker is the designated coordinator of the group.
    pub fn is_leader(&self) -> bool {
        self.worker_id == Self::LEADER
    }

    /// Returns this worker's shard of `total` records.
    ///
    /// Shards are contiguous, disjoint, cover `[0..total)` and differ in
    /// size by at most one record.
    pub fn shard_range(&self, total: usize) -> Range<usize> {
        let workers = self.num_workers.get();
        let base = total / workers;
        let rem = total % workers;

        let start = self.worker_id * base + self.worker_id.min(rem);
        let extra = usize::from(self.worker_id < rem);

        start..start + base + extra
    }
}
