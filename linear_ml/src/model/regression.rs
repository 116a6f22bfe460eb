use std::sync::Arc;

use collective::Session;

use crate::{
    error::Result,
    model::{ErrorFn, GradientFn, Model, PredictFn},
    optimization::{Optimizer, Sgd},
    point::{Gradient, LabeledPoint},
};

/// Affine prediction `w·x + b`; the bias occupies the last parameter slot.
fn affine(point: &LabeledPoint, params: &[f64]) -> f64 {
    debug_assert!(!params.is_empty());
    point.features.dot(params) + params[params.len() - 1]
}

/// Least-squares step direction: `r·x` on the weights and `r` on the bias,
/// where `r = y - (w·x + b)` is the residual.
pub struct LeastSquaresGradient;

impl GradientFn for LeastSquaresGradient {
    fn gradient(&self, point: &LabeledPoint, params: &[f64]) -> Gradient {
        let residual = point.label - affine(point, params);

        let mut grad = Gradient::new();
        for (index, x) in point.features.components() {
            grad.push(index, residual * x);
        }
        grad.push(params.len() - 1, residual);
        grad
    }
}

/// Squared residual, averaged globally by `avg_error`.
pub struct SquaredError;

impl ErrorFn for SquaredError {
    fn error(&self, point: &LabeledPoint, params: &[f64]) -> f64 {
        let residual = point.label - affine(point, params);
        residual * residual
    }
}

pub struct LinearPredict;

impl PredictFn for LinearPredict {
    fn predict(&self, point: &LabeledPoint, params: &[f64]) -> f64 {
        affine(point, params)
    }
}

/// Linear regression with an intercept, trained by distributed SGD on the
/// squared loss.
#[derive(Clone)]
pub struct LinearRegression {
    model: Model,
}

impl LinearRegression {
    /// Builds a regression over `num_features` features plus an intercept.
    pub fn new(num_features: usize) -> Result<Self> {
        let mut model = Model::with_params(num_features + 1)?;
        model.set_gradient(Arc::new(LeastSquaresGradient));
        model.set_error(Arc::new(SquaredError));
        model.set_predict(Arc::new(LinearPredict));
        Ok(Self { model })
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

    /// Runs `iters` rounds of SGD unconditionally.
    pub fn train(
        &mut self,
        session: &mut Session,
        data: &[LabeledPoint],
        iters: usize,
        learning_rate: f64,
    ) -> Result<()> {
        let mut opt = Sgd::new(self.model.gradient()?, learning_rate);
        self.model.fit(session, data, iters, &mut opt)
    }

    /// As [`train`](LinearRegression::train), with a caller-supplied
    /// optimizer.
    pub fn train_with<O: Optimizer>(
        &mut self,
        session: &mut Session,
        data: &[LabeledPoint],
        iters: usize,
        opt: &mut O,
    ) -> Result<()> {
        self.model.fit(session, data, iters, opt)
    }

    /// Trains with held-out early stopping: stops at the first round whose
    /// held-out error is exactly zero or rose against the previous round.
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
        let mut opt = Sgd::new(self.model.gradient()?, learning_rate);
        self.model
            .fit_watched(session, data, held_out, iters, &mut opt)
    }
}
