//! Lockstep primitives for bulk-synchronous-parallel training.
//!
//! A training job runs one worker per data shard. The workers share nothing
//! except the parameter store and the collectives defined here: a reusable
//! round [`Barrier`] and sum-reduce [`Aggregator`]s that broadcast an
//! identical global value to every worker before any of them proceeds.

pub mod aggregator;
pub mod barrier;
pub mod ctx;
pub mod execution;
pub mod session;

pub use aggregator::Aggregator;
pub use barrier::Barrier;
pub use ctx::WorkerCtx;
pub use execution::run_workers;
pub use session::Session;
