use std::num::NonZeroUsize;

use crate::{Aggregator, Barrier, WorkerCtx};

/// One worker's view of a training job: its identity plus the collectives
/// shared by the whole group.
///
/// Sessions are created as a coherent group so that every worker's barrier
/// and aggregators point at the same shared state. A session is not `Clone`
/// on purpose: the collectives count arrivals, and a duplicated member
/// would stall the group.
pub struct Session {
    pub ctx: WorkerCtx,
    /// Round boundary; one `wait` per worker per round.
    pub round: Barrier,
    /// Sum-reduce for record counts.
    pub counts: Aggregator<usize>,
    /// Sum-reduce for error/loss statistics.
    pub values: Aggregator<f64>,
}

impl Session {
    /// Creates the sessions for a group of `workers`, one per worker id, all
    /// wired to the same collectives.
    pub fn group(workers: NonZeroUsize) -> Vec<Session> {
        let round = Barrier::new(workers);
        let counts = Aggregator::new(workers);
        let values = Aggregator::new(workers);

        (0..workers.get())
            .map(|id| Session {
                ctx: WorkerCtx::new(id, workers),
                round: round.clone(),
                counts: counts.clone(),
                values: values.clone(),
            })
            .collect()
    }

    /// A single-worker session, handy for local runs and tests.
    pub fn solo() -> Session {
        Self::group(NonZeroUsize::MIN).remove(0)
    }
}
