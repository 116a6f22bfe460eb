use std::sync::Arc;

use collective::Session;

use crate::{
    error::{MlErr, Result},
    model::GradientFn,
    optimization::Optimizer,
    parameters::SharedParams,
    point::LabeledPoint,
};

/// Regularization norms. `L1` is declared for configuration compatibility
/// but has no implementation; selecting it fails instead of silently doing
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    L1,
    L2,
}

struct Regularization {
    lambda: f64,
    /// Exactly one worker applies the decay each round.
    applied_by: usize,
}

/// Stochastic gradient descent over a shared parameter store.
///
/// One round, in order: snapshot the store, rendezvous with the group so
/// every worker holds its snapshot before any update lands, optionally
/// apply L2 decay (the designated worker only), walk the local shard
/// evaluating the gradient against the snapshot and pushing scaled deltas
/// into the store, then block on the round barrier. Each delta is scaled by
/// `learning_rate / global_samples`, so the deltas of all workers sum to a
/// single mean-gradient step and partitioning the data differently cannot
/// change the post-round vector.
pub struct Sgd {
    gradient: Arc<dyn GradientFn>,
    learning_rate: f64,
    regularization: Option<Regularization>,
}

impl Sgd {
    pub fn new(gradient: Arc<dyn GradientFn>, learning_rate: f64) -> Self {
        Self {
            gradient,
            learning_rate,
            regularization: None,
        }
    }

    /// Enables regularization. `applied_by` names the single worker that
    /// performs the decay each round (normally [`WorkerCtx::LEADER`]); the
    /// decay would be over-applied if every worker ran it.
    ///
    /// # Errors
    /// [`MlErr::Unsupported`] for [`Penalty::L1`], which is declared but not
    /// implemented.
    ///
    /// [`WorkerCtx::LEADER`]: collective::WorkerCtx::LEADER
    pub fn set_regularization(
        &mut self,
        penalty: Penalty,
        lambda: f64,
        applied_by: usize,
    ) -> Result<()> {
        match penalty {
            Penalty::L1 => Err(MlErr::Unsupported {
                what: "l1 regularization",
            }),
            Penalty::L2 => {
                self.regularization = Some(Regularization { lambda, applied_by });
                Ok(())
            }
        }
    }
}

impl Optimizer for Sgd {
    fn round(
        &mut self,
        session: &mut Session,
        data: &[LabeledPoint],
        params: &SharedParams,
        global_samples: usize,
    ) -> Result<()> {
        if self.learning_rate == 0.0 {
            return Err(MlErr::ZeroLearningRate);
        }
        if global_samples == 0 {
            return Err(MlErr::EmptyDataset);
        }

        // Post-barrier state of the previous round; every gradient this
        // round is evaluated against it.
        let snapshot = params.snapshot();

        // No update may land before every worker holds its snapshot: a fast
        // worker's deltas would otherwise leak into a slow worker's view of
        // the previous round.
        session.round.wait();

        if let Some(reg) = &self.regularization {
            if session.ctx.worker_id() == reg.applied_by {
                // L2 decay from the snapshot values, so the round result
                // does not depend on how far other workers have progressed.
                for (index, value) in snapshot.iter().enumerate() {
                    params.update(index, -self.learning_rate * reg.lambda * value)?;
                }
            }
        }

        let step = self.learning_rate / global_samples as f64;
        for point in data {
            let gradient = self.gradient.gradient(point, &snapshot);
            for (index, value) in gradient.components() {
                params.update(index, value * step)?;
            }
        }

        // Round boundary: nobody snapshots the next round until every
        // worker's updates are in.
        session.round.wait();
        Ok(())
    }
}
