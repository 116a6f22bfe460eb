use collective::Session;

use crate::{error::Result, parameters::SharedParams, point::LabeledPoint};

/// A gradient-descent strategy: applies one full training round to the
/// shared parameter store.
///
/// A round is complete only once every worker has returned from `round`; the
/// implementation must end with the group's round barrier so that the next
/// snapshot reflects the synchronized state.
pub trait Optimizer {
    /// Applies one round of updates computed from this worker's shard.
    ///
    /// # Arguments
    /// * `session` - This worker's collectives and identity.
    /// * `data` - The locally held records.
    /// * `params` - The parameter store shared by the group.
    /// * `global_samples` - Record count across all shards, aggregated once
    ///   at the start of training.
    fn round(
        &mut self,
        session: &mut Session,
        data: &[LabeledPoint],
        params: &SharedParams,
        global_samples: usize,
    ) -> Result<()>;
}
