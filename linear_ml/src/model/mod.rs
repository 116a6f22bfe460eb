mod regression;
mod svm;

pub use regression::{LeastSquaresGradient, LinearPredict, LinearRegression, SquaredError};
pub use svm::{HingeGradient, MisclassificationError, SignPredict, Svm};

use std::sync::Arc;

use collective::Session;
use log::info;

use crate::{
    error::{MlErr, Result},
    optimization::Optimizer,
    parameters::SharedParams,
    point::{Gradient, LabeledPoint},
};

/// Produces the descent-step direction for one record against a parameter
/// snapshot. Returned components are added to the shared store by the
/// optimizer, scaled by the learning rate.
pub trait GradientFn: Send + Sync {
    fn gradient(&self, point: &LabeledPoint, params: &[f64]) -> Gradient;
}

/// Scores one record against a parameter snapshot; averaged globally by
/// [`Model::avg_error`].
pub trait ErrorFn: Send + Sync {
    fn error(&self, point: &LabeledPoint, params: &[f64]) -> f64;
}

/// Computes the predicted label for one record.
pub trait PredictFn: Send + Sync {
    fn predict(&self, point: &LabeledPoint, params: &[f64]) -> f64;
}

/// A pluggable linear model: one shared parameter store plus the strategies
/// that define it.
///
/// Configure the model (parameter count, strategies, flags) before handing
/// clones to the worker group. A clone shares the parameter storage, so all
/// workers train the same vector. `report_per_round` must be set identically
/// on every worker: the per-round report runs collective operations, and a
/// group that disagrees on it deadlocks.
#[derive(Clone)]
pub struct Model {
    params: SharedParams,
    gradient: Option<Arc<dyn GradientFn>>,
    error: Option<Arc<dyn ErrorFn>>,
    predict: Option<Arc<dyn PredictFn>>,
    trained: bool,
    pub report_per_round: bool,
}

impl Model {
    pub fn new() -> Self {
        Self {
            params: SharedParams::new(0, 0.0),
            gradient: None,
            error: None,
            predict: None,
            trained: false,
            report_per_round: false,
        }
    }

    pub fn with_params(num_params: usize) -> Result<Self> {
        let mut model = Self::new();
        model.set_num_params(num_params)?;
        Ok(model)
    }

    /// Allocates the parameter store, zero-filled.
    pub fn set_num_params(&mut self, num_params: usize) -> Result<()> {
        if num_params == 0 {
            return Err(MlErr::ZeroParams);
        }
        self.params = SharedParams::new(num_params, 0.0);
        Ok(())
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &SharedParams {
        &self.params
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn set_gradient(&mut self, gradient: Arc<dyn GradientFn>) {
        self.gradient = Some(gradient);
    }

    pub fn set_error(&mut self, error: Arc<dyn ErrorFn>) {
        self.error = Some(error);
    }

    pub fn set_predict(&mut self, predict: Arc<dyn PredictFn>) {
        self.predict = Some(predict);
    }

    pub(crate) fn gradient(&self) -> Result<Arc<dyn GradientFn>> {
        self.gradient
            .clone()
            .ok_or(MlErr::FunctionNotSpecified { which: "gradient" })
    }

    /// Writes the predicted label into every local record. Touches nothing
    /// but the label field.
    pub fn predict(&self, data: &mut [LabeledPoint]) -> Result<()> {
        let predict = self
            .predict
            .as_deref()
            .ok_or(MlErr::FunctionNotSpecified { which: "predict" })?;
        if self.params.is_empty() {
            return Err(MlErr::ZeroParams);
        }

        let params = self.params.snapshot();
        for point in data.iter_mut() {
            point.label = predict.predict(point, &params);
        }
        Ok(())
    }

    /// Global mean of the error function over all shards.
    ///
    /// Deterministic for a fixed snapshot and dataset. Fails with
    /// [`MlErr::EmptyDataset`] when the group holds no records at all.
    pub fn avg_error(&self, session: &mut Session, data: &[LabeledPoint]) -> Result<f64> {
        let error = self
            .error
            .as_deref()
            .ok_or(MlErr::FunctionNotSpecified { which: "error" })?;
        if self.params.is_empty() {
            return Err(MlErr::ZeroParams);
        }

        let params = self.params.snapshot();
        let local: f64 = data.iter().map(|p| error.error(p, &params)).sum();

        session.values.contribute(local);
        session.counts.contribute(data.len());
        let total = session.values.sync();
        let samples = session.counts.sync();

        if samples == 0 {
            return Err(MlErr::EmptyDataset);
        }
        Ok(total / samples as f64)
    }

    /// Logs the parameter vector. Diagnostic only; does nothing until the
    /// model has been trained.
    pub fn present_params(&self) {
        if self.trained {
            info!("model parameters: {:?}", self.params.snapshot());
        }
    }

    /// Runs `iters` rounds unconditionally, reporting the global error after
    /// each round when `report_per_round` is set.
    pub(crate) fn fit<O: Optimizer>(
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
            opt.round(session, data, &self.params, global_samples)?;

            if self.report_per_round {
                let error = self.avg_error(session, data)?;
                if session.ctx.is_leader() {
                    info!("round {}: error = {error}", round + 1);
                }
            }
        }

        self.trained = true;
        Ok(())
    }

    /// Runs up to `iters` rounds, stopping early on the held-out error: the
    /// first round whose error is exactly zero, or (after round 0) strictly
    /// above the previous round's, ends training. The lookback is one step,
    /// so a noisy held-out sequence stops at its first uptick.
    ///
    /// # Returns
    /// The number of rounds actually applied.
    pub(crate) fn fit_watched<O: Optimizer>(
        &mut self,
        session: &mut Session,
        data: &[LabeledPoint],
        held_out: &[LabeledPoint],
        iters: usize,
        opt: &mut O,
    ) -> Result<usize> {
        let global_samples = global_sample_count(session, data.len())?;
        if session.ctx.is_leader() {
            info!("training set size = {global_samples}");
        }

        let mut past_error = 0.0;
        let mut applied = 0;

        for round in 0..iters {
            opt.round(session, data, &self.params, global_samples)?;
            applied += 1;

            let current = self.avg_error(session, held_out)?;
            if self.report_per_round && session.ctx.is_leader() {
                info!("round {}: held-out error = {current}", round + 1);
            }

            if current == 0.0 || (round != 0 && current > past_error) {
                if session.ctx.is_leader() {
                    info!("early stopping after round {}", round + 1);
                }
                break;
            }
            past_error = current;
        }

        self.trained = true;
        Ok(applied)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregates the global record count once, up front. Every worker must
/// call this at the same point of the job.
pub(crate) fn global_sample_count(session: &mut Session, local: usize) -> Result<usize> {
    session.counts.contribute(local);
    let samples = session.counts.sync();
    if samples == 0 {
        return Err(MlErr::EmptyDataset);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::FeatureVec;

    struct ConstError(f64);

    impl ErrorFn for ConstError {
        fn error(&self, _point: &LabeledPoint, _params: &[f64]) -> f64 {
            self.0
        }
    }

    struct FirstParamPredict;

    impl PredictFn for FirstParamPredict {
        fn predict(&self, _point: &LabeledPoint, params: &[f64]) -> f64 {
            params[0]
        }
    }

    #[test]
    fn zero_param_count_is_rejected() {
        let mut model = Model::new();
        assert_eq!(model.set_num_params(0), Err(MlErr::ZeroParams));
        assert!(model.set_num_params(3).is_ok());
        assert_eq!(model.num_params(), 3);
    }

    #[test]
    fn missing_strategies_fail_loudly() {
        let model = Model::with_params(2).unwrap();
        let mut data = vec![LabeledPoint::dense(vec![1.0], 0.0)];
        let mut session = Session::solo();

        assert_eq!(
            model.predict(&mut data),
            Err(MlErr::FunctionNotSpecified { which: "predict" })
        );
        assert_eq!(
            model.avg_error(&mut session, &data),
            Err(MlErr::FunctionNotSpecified { which: "error" })
        );
        assert_eq!(
            model.gradient().err(),
            Some(MlErr::FunctionNotSpecified { which: "gradient" })
        );
    }

    #[test]
    fn avg_error_divides_by_the_global_count() {
        let mut model = Model::with_params(1).unwrap();
        model.set_error(Arc::new(ConstError(0.5)));

        let data = vec![LabeledPoint::dense(vec![0.0], 1.0); 4];
        let mut session = Session::solo();

        assert_eq!(model.avg_error(&mut session, &data).unwrap(), 0.5);
    }

    #[test]
    fn avg_error_on_an_empty_dataset_is_an_error() {
        let mut model = Model::with_params(1).unwrap();
        model.set_error(Arc::new(ConstError(1.0)));

        let mut session = Session::solo();
        assert_eq!(
            model.avg_error(&mut session, &[]),
            Err(MlErr::EmptyDataset)
        );
    }

    #[test]
    fn predict_rewrites_only_the_label() {
        let mut model = Model::with_params(1).unwrap();
        model.set_predict(Arc::new(FirstParamPredict));
        model.params().update(0, 7.0).unwrap();

        let mut data = vec![LabeledPoint::dense(vec![1.0, 2.0], -1.0)];
        model.predict(&mut data).unwrap();

        assert_eq!(data[0].label, 7.0);
        assert_eq!(data[0].features, FeatureVec::Dense(vec![1.0, 2.0]));
    }

    #[test]
    fn unsized_model_rejects_predict_and_avg_error() {
        // Strategies set, but the parameter store was never sized.
        let mut model = Model::new();
        model.set_predict(Arc::new(FirstParamPredict));
        model.set_error(Arc::new(ConstError(1.0)));

        let mut data = vec![LabeledPoint::dense(vec![1.0], 0.0)];
        let mut session = Session::solo();

        assert_eq!(model.predict(&mut data), Err(MlErr::ZeroParams));
        assert_eq!(
            model.avg_error(&mut session, &data),
            Err(MlErr::ZeroParams)
        );
    }

    #[test]
    fn present_params_is_gated_on_training() {
        struct NoOpOptimizer;

        impl Optimizer for NoOpOptimizer {
            fn round(
                &mut self,
                session: &mut Session,
                _data: &[LabeledPoint],
                _params: &SharedParams,
                _global_samples: usize,
            ) -> crate::error::Result<()> {
                session.round.wait();
                Ok(())
            }
        }

        let mut model = Model::with_params(1).unwrap();
        let mut session = Session::solo();

        assert!(!model.is_trained());
        model.present_params();
        // Untrained: the diagnostic stays silent and flips nothing.
        assert!(!model.is_trained());

        let data = vec![LabeledPoint::dense(vec![1.0], 1.0)];
        model.fit(&mut session, &data, 1, &mut NoOpOptimizer).unwrap();

        assert!(model.is_trained());
        model.present_params();
    }
}
