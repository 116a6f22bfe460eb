use std::mem;
use std::num::NonZeroUsize;
use std::ops::AddAssign;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// A per-worker handle to a barrier-and-sum collective.
///
/// Each worker accumulates into its own local partial with [`contribute`],
/// then calls [`sync`]: the partials are summed, every worker blocks until
/// the whole group has arrived, and all of them receive the identical
/// global total. The collective resets itself on release, so one instance
/// serves every round of a job.
///
/// Cloning yields a new handle for another worker of the same group; the
/// clone starts with an empty local partial.
///
/// [`contribute`]: Aggregator::contribute
/// [`sync`]: Aggregator::sync
pub struct Aggregator<T> {
    shared: Arc<Shared<T>>,
    local: T,
}

struct Shared<T> {
    workers: usize,
    state: Mutex<State<T>>,
    released: Condvar,
}

struct State<T> {
    total: T,
    result: T,
    arrived: usize,
    round: u64,
}

impl<T: Copy + Default + AddAssign> Aggregator<T> {
    pub fn new(workers: NonZeroUsize) -> Self {
        Self {
            shared: Arc::new(Shared {
                workers: workers.get(),
                state: Mutex::new(State {
                    total: T::default(),
                    result: T::default(),
                    arrived: 0,
                    round: 0,
                }),
                released: Condvar::new(),
            }),
            local: T::default(),
        }
    }

    /// Adds `partial` to this worker's local partial. Lock-free; call as
    /// many times per round as needed.
    pub fn contribute(&mut self, partial: T) {
        self.local += partial;
    }

    /// Publishes the local partial, blocks until every worker of the group
    /// has done the same, and returns the global sum.
    ///
    /// All workers observe the same value. The local partial is cleared, and
    /// the shared state resets for the next round once the group is released.
    pub fn sync(&mut self) -> T {
        let partial = mem::take(&mut self.local);

        let mut state = self.shared.state.lock();
        state.total += partial;
        state.arrived += 1;

        if state.arrived == self.shared.workers {
            state.result = state.total;
            state.total = T::default();
            state.arrived = 0;
            state.round += 1;
            self.shared.released.notify_all();
            state.result
        } else {
            let round = state.round;
            while state.round == round {
                self.shared.released.wait(&mut state);
            }
            state.result
        }
    }
}

impl<T: Default> Clone for Aggregator<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            local: T::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn solo_sync_returns_own_partial() {
        let mut agg = Aggregator::<f64>::new(NonZeroUsize::MIN);
        agg.contribute(1.5);
        agg.contribute(2.5);
        assert_eq!(agg.sync(), 4.0);
        // Reset: nothing carries over into the next round.
        assert_eq!(agg.sync(), 0.0);
    }

    #[test]
    fn all_workers_receive_the_same_sum() {
        const WORKERS: usize = 3;

        let agg = Aggregator::<usize>::new(NonZeroUsize::new(WORKERS).unwrap());

        let totals = thread::scope(|scope| {
            let handles: Vec<_> = (0..WORKERS)
                .map(|id| {
                    let mut agg = agg.clone();
                    scope.spawn(move || {
                        agg.contribute(id + 1);
                        agg.sync()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        assert_eq!(totals, vec![6, 6, 6]);
    }

    #[test]
    fn reuse_across_rounds_does_not_leak_between_rounds() {
        const WORKERS: usize = 2;
        const ROUNDS: usize = 4;

        let agg = Aggregator::<f64>::new(NonZeroUsize::new(WORKERS).unwrap());

        thread::scope(|scope| {
            for id in 0..WORKERS {
                let mut agg = agg.clone();
                scope.spawn(move || {
                    for round in 0..ROUNDS {
                        agg.contribute((round + id) as f64);
                        let expected = (2 * round + 1) as f64; // round + (round + 1)
                        assert_eq!(agg.sync(), expected);
                    }
                });
            }
        });
    }
}
