use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// A reusable rendezvous point for a fixed group of worker threads.
///
/// Every round boundary passes through one `wait` per worker; generation
/// counting makes the barrier safe to reuse round after round. Exactly one
/// caller per generation observes `true` (the release leader), mirroring
/// the leader flag workers use to elect a single writer.
#[derive(Clone)]
pub struct Barrier {
    shared: Arc<Shared>,
}

struct Shared {
    workers: usize,
    state: Mutex<State>,
    released: Condvar,
}

#[derive(Default)]
struct State {
    arrived: usize,
    generation: u64,
}

impl Barrier {
    pub fn new(workers: NonZeroUsize) -> Self {
        Self {
            shared: Arc::new(Shared {
                workers: workers.get(),
                state: Mutex::new(State::default()),
                released: Condvar::new(),
            }),
        }
    }

    /// Blocks until every worker in the group has arrived.
    ///
    /// # Returns
    /// `true` for exactly one worker per generation.
    pub fn wait(&self) -> bool {
        let mut state = self.shared.state.lock();
        state.arrived += 1;

        if state.arrived == self.shared.workers {
            state.arrived = 0;
            state.generation += 1;
            self.shared.released.notify_all();
            true
        } else {
            let generation = state.generation;
            while state.generation == generation {
                self.shared.released.wait(&mut state);
            }
            false
        }
    }
}
