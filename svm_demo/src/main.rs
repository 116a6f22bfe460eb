//! Trains a linear SVM on synthetic data across several in-process workers.
//!
//! Run with `RUST_LOG=info` to see the per-round loss and the final model.

use std::error::Error;
use std::num::NonZeroUsize;

use collective::{Session, run_workers};
use linear_ml::{LabeledPoint, MlErr, Svm};
use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};

const WORKERS: NonZeroUsize = NonZeroUsize::new(4).unwrap();
const FEATURES: usize = 2;
const SAMPLES: usize = 4_000;
const ROUNDS: usize = 50;
const LEARNING_RATE: f64 = 0.1;
const LAMBDA: f64 = 0.01;

/// Two classes split by the line `x0 + x1 = 0`.
fn synthetic_dataset(seed: u64) -> Vec<LabeledPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..SAMPLES)
        .map(|_| {
            let x = [rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)];
            let label = if x[0] + x[1] > 0.0 { 1.0 } else { -1.0 };
            LabeledPoint::dense(x.to_vec(), label)
        })
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let data = synthetic_dataset(7);
    info!(
        "training on {SAMPLES} records across {WORKERS} workers, {ROUNDS} rounds"
    );

    let mut svm = Svm::new(FEATURES)?;
    svm.set_regularization_factor(LAMBDA);
    svm.set_report_per_round(true);

    let sessions = Session::group(WORKERS);
    let results = run_workers(sessions, |mut session| {
        let shard = &data[session.ctx.shard_range(data.len())];
        let mut svm = svm.clone();
        svm.train(&mut session, shard, ROUNDS, LEARNING_RATE)?;

        let error = svm.avg_error(&mut session, shard)?;
        if session.ctx.is_leader() {
            svm.present_params();
        }
        Ok::<f64, MlErr>(error)
    });

    let error = results
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?
        .remove(0);
    info!("final misclassification rate = {error:.4}");

    Ok(())
}
