use std::thread;

use log::debug;

use crate::Session;

/// Runs one scoped worker thread per session and collects their results in
/// worker-id order.
///
/// The whole group operates in lockstep: `job` is expected to drive the same
/// sequence of collective operations on every worker, and a panicking worker
/// fails the job (there is no partial-round recovery).
pub fn run_workers<F, R>(sessions: Vec<Session>, job: F) -> Vec<R>
where
    F: Fn(Session) -> R + Sync,
    R: Send,
{
    debug!("spawning {} lockstep workers", sessions.len());

    thread::scope(|scope| {
        let job = &job;
        let handles: Vec<_> = sessions
            .into_iter()
            .map(|session| scope.spawn(move || job(session)))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    #[test]
    fn results_come_back_in_worker_order() {
        let sessions = Session::group(NonZeroUsize::new(4).unwrap());
        let ids = run_workers(sessions, |session| session.ctx.worker_id());
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn workers_run_in_lockstep_rounds() {
        const ROUNDS: usize = 5;

        let sessions = Session::group(NonZeroUsize::new(3).unwrap());
        let sums = run_workers(sessions, |mut session| {
            let mut sums = Vec::with_capacity(ROUNDS);
            for round in 0..ROUNDS {
                session.values.contribute((round * session.ctx.worker_id()) as f64);
                sums.push(session.values.sync());
                session.round.wait();
            }
            sums
        });

        // Every worker observed the same global value each round.
        let expected: Vec<f64> = (0..ROUNDS).map(|round| (round * 3) as f64).collect();
        for sums in sums {
            assert_eq!(sums, expected);
        }
    }
}
