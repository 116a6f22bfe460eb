use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, MlErr>;

/// Configuration and usage failures of the training core.
///
/// All of these abort the job; none are recoverable mid-round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MlErr {
    /// A model operation needs a strategy that was never assigned.
    FunctionNotSpecified { which: &'static str },
    /// The parameter store was sized to zero.
    ZeroParams,
    /// Training was started with a learning rate of zero.
    ZeroLearningRate,
    /// Parameter access outside the store.
    OutOfRange { index: usize, len: usize },
    /// A global statistic was requested over zero records.
    EmptyDataset,
    /// A declared option with no implementation was configured.
    Unsupported { what: &'static str },
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::FunctionNotSpecified { which } => {
                write!(f, "{which} function is not specified")
            }
            MlErr::ZeroParams => f.write_str("the number of parameters is zero"),
            MlErr::ZeroLearningRate => f.write_str("learning rate is set to zero"),
            MlErr::OutOfRange { index, len } => {
                write!(f, "parameter index {index} out of range for {len} parameters")
            }
            MlErr::EmptyDataset => f.write_str("the global dataset holds no records"),
            MlErr::Unsupported { what } => write!(f, "{what} is not implemented"),
        }
    }
}

impl Error for MlErr {}
