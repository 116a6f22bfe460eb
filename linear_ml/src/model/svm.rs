use std::sync::Arc;

use collective::{Session, WorkerCtx};
use log::info;

use crate::{
    error::Result,
    model::{ErrorFn, GradientFn, Model, PredictFn, global_sample_count},
    optimization::{Optimizer, Penalty, Sgd},
    point::{Gradient, LabeledPoint},
};

/// Raw classifier output `w·x + b`. The bias lives in the last parameter
/// slot, after the feature weights.
fn score(point: &LabeledPoint, params: &[f64]) -> f64 {
    debug_assert!(!params.is_empty());
    point.features.dot(params) + params[params.len() - 1]
}

/// Hinge margin `y * (w·x + b)`.
fn margin(point: &LabeledPoint, params: &[f64]) -> f64 {
    point.label * score(point, params)
}

/// Hinge-loss subgradient. Inside the margin (`margin < 1`) the step
/// direction is `y·x` on the weights and `y` on the bias; at and beyond the
/// margin boundary the gradient is zero.
pub struct HingeGradient;

impl GradientFn for HingeGradient {
    fn gradient(&self, point: &LabeledPoint, params: &[f64]) -> Gradient {
        let mut grad = Gradient::new();
        if margin(point, params) < 1.0 {
            let y = point.label;
            for (index, x) in point.features.components() {
                grad.push(index, y * x);
            }
            grad.push(params.len() - 1, y);
        }
        grad
    }
}

/// Misclassification indicator: `1` iff `y * (w·x + b) <= 0`. A point on
/// the decision boundary counts as an error.
pub struct MisclassificationError;

impl ErrorFn for MisclassificationError {
    fn error(&self, point: &LabeledPoint, params: &[f64]) -> f64 {
        if margin(point, params) <= 0.0 { 1.0 } else { 0.0 }
    }
}

/// Predicts the sign of the classifier output, as a `±1` label.
pub struct SignPredict;

impl PredictFn for SignPredict {
    fn predict(&self, point: &LabeledPoint, params: &[f64]) -> f64 {
        if score(point, params) >= 0.0 { 1.0 } else { -1.0 }
    }
}

/// A linear support-vector classifier for `±1` labels, trained by
/// distributed SGD on the hinge loss.
#[derive(Clone)]
pub struct Svm {
    model: Model,
    lambda: f64,
}

impl Svm {
    /// Builds an SVM over `num_features` features plus a bias slot.
    pub fn new(num_features: usize) -> Result<Self> {
        let mut model = Model::with_params(num_features + 1)?;
        model.set_gradient(Arc::new(HingeGradient));
        model.set_error(Arc::new(MisclassificationError));
        model.set_predict(Arc::new(SignPredict));
        Ok(Self { model, lambda: 0.0 })
    }

    /// Sets the L2 regularization strength; zero disables decay.
    pub fn set_regularization_factor(&mut self, lambda: f64) {
        self.lambda = lambda;
    }

    pub fn set_report_per_round(&mut self, report: bool) {
        self.model.report_per_round = report;
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn predict(&self, data: &mut [LabeledPoint]) -> Result<()> {
        self.model.predict(data)
    }

    pub fn avg_error(&self, session: &mut Session, data: &[LabeledPoint]) -> Result<f64> {
        self.model.avg_error(session, data)
    }

    pub fn present_params(&self) {
        self.model.present_params();
    }

    /// Runs `iters` rounds of SGD, with the leader applying L2 decay when a
    /// regularization factor is set. When `report_per_round` is on, the
    /// global mean hinge loss of the just-updated parameters is logged each
    /// round.
    pub fn train(
        &mut self,
        session: &mut Session,
        data: &[LabeledPoint],
        iters: usize,
        learning_rate: f64,
    ) -> Result<()> {
        let mut opt = self.optimizer(learning_rate)?;
        self.train_with(session, data, iters, &mut opt)
    }

    /// As [`train`](Svm::train), with a caller-supplied optimizer.
    pub fn train_with<O: Optimizer>(
        &mut self,
        session: &mut Session,
        data: &[LabeledPoint],
        iters: usize,
        opt: &mut O,
    ) -> Result<()> {
        let global_samples = global_sample_count(session, data.len())?;
        if session.ctx.is_leader() {
            info!("training set size = {global_samples}");
        }

        for round in 0..iters {
            opt.round(session, data, self.model.params(), global_samples)?;

            if self.model.report_per_round {
                let params = self.model.params().snapshot();
                let local: f64 = data
                    .iter()
                    .map(|p| (1.0 - margin(p, &params)).max(0.0))
                    .sum();

                session.values.contribute(local);
                let loss = session.values.sync() / global_samples as f64;
                if session.ctx.is_leader() {
                    info!("round {}: hinge loss = {loss}", round + 1);
                }
            }
        }

        self.model.trained = true;
        Ok(())
    }

    /// Trains with held-out early stopping on the misclassification rate.
    ///
    /// # Returns
    /// The number of rounds actually applied.
    pub fn train_with_early_stop(
        &mut self,
        session: &mut Session,
        data: &[LabeledPoint],
        held_out: &[LabeledPoint],
        iters: usize,
        learning_rate: f64,
    ) -> Result<usize> {
        let mut opt = self.optimizer(learning_rate)?;
        self.model
            .fit_watched(session, data, held_out, iters, &mut opt)
    }

    fn optimizer(&self, learning_rate: f64) -> Result<Sgd> {
        let mut opt = Sgd::new(self.model.gradient()?, learning_rate);
        if self.lambda != 0.0 {
            opt.set_regularization(Penalty::L2, self.lambda, WorkerCtx::LEADER)?;
        }
        Ok(opt)
    }
}
