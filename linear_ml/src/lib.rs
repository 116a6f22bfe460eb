//! Distributed synchronous gradient descent for linear models.
//!
//! Training runs in bulk-synchronous-parallel rounds over data partitioned
//! across workers: every worker snapshots the shared [`SharedParams`]
//! vector, walks its own shard computing per-record gradients against that
//! snapshot, pushes commutative scaled deltas back into the store, and
//! blocks on the round barrier so the next snapshot is globally consistent.
//! The collectives themselves live in the `collective` crate.
//!
//! [`Svm`] and [`LinearRegression`] wire concrete gradient/error/predict
//! strategies into the generic [`Model`] contract; [`Sgd`] implements the
//! round protocol.

pub mod error;
pub mod model;
pub mod optimization;
pub mod parameters;
pub mod point;

pub use error::{MlErr, Result};
pub use model::{
    ErrorFn, GradientFn, LinearRegression, Model, PredictFn, Svm,
};
pub use optimization::{Optimizer, Penalty, Sgd};
pub use parameters::SharedParams;
pub use point::{FeatureVec, Gradient, LabeledPoint};
