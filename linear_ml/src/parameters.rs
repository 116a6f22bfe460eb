use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::error::{MlErr, Result};

/// Parameters per shard mutex. Updates to distinct shards never contend.
const TARGET_SHARD_LEN: usize = 64;

/// The shared parameter vector of one model.
///
/// Cloning is cheap and yields another handle to the same storage; every
/// worker of a job holds one. Mutation is restricted to commutative
/// [`update`] deltas, so the value after a round is independent of the order
/// in which workers applied their updates. [`snapshot`] gathers a consistent
/// copy, which workers take only after the previous round's barrier.
///
/// [`update`]: SharedParams::update
/// [`snapshot`]: SharedParams::snapshot
#[derive(Debug, Clone)]
pub struct SharedParams {
    shards: Arc<[Mutex<Box<[f64]>>]>,
    shard_size: usize,
    len: usize,
}

impl SharedParams {
    /// Allocates `len` parameters, each starting at `fill`.
    pub fn new(len: usize, fill: f64) -> Self {
        let count = len.div_ceil(TARGET_SHARD_LEN).max(1);
        let shard_size = len.div_ceil(count).max(1);

        let shards: Vec<_> = (0..count)
            .map(|i| {
                let start = i * shard_size;
                let end = (start + shard_size).min(len);
                Mutex::new(vec![fill; end.saturating_sub(start)].into_boxed_slice())
            })
            .collect();

        Self {
            shards: Arc::from(shards),
            shard_size,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads one parameter.
    pub fn get(&self, index: usize) -> Result<f64> {
        self.check(index)?;
        let shard = self.shards[index / self.shard_size].lock();
        Ok(shard[index % self.shard_size])
    }

    /// Adds `delta` to one parameter.
    ///
    /// Atomic with respect to concurrent updates from other workers;
    /// commutative and associative, so any interleaving between two round
    /// barriers produces the same final value.
    pub fn update(&self, index: usize, delta: f64) -> Result<()> {
        self.check(index)?;
        let mut shard = self.shards[index / self.shard_size].lock();
        shard[index % self.shard_size] += delta;
        Ok(())
    }

    /// Copies the whole vector out, shard by shard in parallel.
    pub fn snapshot(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len];

        self.shards
            .par_iter()
            .zip(out.par_chunks_mut(self.shard_size))
            .for_each(|(shard, chunk)| {
                chunk.copy_from_slice(&shard.lock());
            });

        out
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.len {
            Ok(())
        } else {
            Err(MlErr::OutOfRange {
                index,
                len: self.len,
            })
        }
    }
}
