use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use collective::{Session, run_workers};

const WORKERS: NonZeroUsize = NonZeroUsize::new(4).unwrap();

#[test]
fn full_round_protocol_stays_consistent_across_rounds() {
    const ROUNDS: usize = 6;

    let leader_steps = AtomicUsize::new(0);
    let sessions = Session::group(WORKERS);

    let reports = run_workers(sessions, |mut session| {
        let mut reports = Vec::with_capacity(ROUNDS);
        for round in 0..ROUNDS {
            // Local work: contribute a count and a value, like one
            // evaluation pass over a shard.
            session.counts.contribute(session.ctx.worker_id() + 1);
            session.values.contribute((round + 1) as f64);

            let count = session.counts.sync();
            let value = session.values.sync();
            reports.push((count, value));

            // Single-writer step, gated on the release leader.
            if session.round.wait() {
                leader_steps.fetch_add(1, Ordering::SeqCst);
            }
        }
        reports
    });

    let expected: Vec<(usize, f64)> = (0..ROUNDS)
        .map(|round| (1 + 2 + 3 + 4, ((round + 1) * WORKERS.get()) as f64))
        .collect();

    for report in reports {
        assert_eq!(report, expected);
    }
    assert_eq!(leader_steps.load(Ordering::SeqCst), ROUNDS);
}

#[test]
fn shards_partition_the_dataset() {
    let total = 103;
    let sessions = Session::group(WORKERS);

    let ranges = run_workers(sessions, |session| session.ctx.shard_range(total));

    let mut covered = 0;
    for (i, range) in ranges.iter().enumerate() {
        if i > 0 {
            assert_eq!(range.start, ranges[i - 1].end);
        }
        covered += range.len();
    }
    assert_eq!(ranges[0].start, 0);
    assert_eq!(ranges.last().unwrap().end, total);
    assert_eq!(covered, total);
}
