use tch::TchError;
use thiserror::Error;

/// Error raised on tensor level operations, flattened to `String` origin so it
/// stays `Send + Sync` regardless of what torch reports.
#[derive(Error, Debug, Clone)]
pub enum TensorError{
    #[error("Torch error: {origin} in context: {context:}")]
    Torch{
        origin: String,
        context: String,
    },
}

impl TensorError{
    pub fn from_tch_with_context(error: TchError, context: String) -> Self{
        Self::Torch{
            origin: format!("{error}"),
            context,
        }
    }
}

/// Top level error type of this crate.
#[derive(Error, Debug)]
pub enum ImitatorRlError{
    /// Variant wrapping error captured by [`tch`]
    #[error("Torch error: {source} in context: {context:}")]
    Torch{
        #[source]
        source: TchError,
        context: String
    },
    /// Error in tensor operation with flattened origin
    #[error("Tensor error: {error}")]
    Tensor{
        #[source]
        error: TensorError
    },
    /// Error reported by [`tboard`], flattened to `String`
    #[error("Tensorboard error: {error} in context: {context:}")]
    TboardFlattened{
        context: String,
        error: String,
    },
    #[error("Empty training data")]
    NoTrainingData,
}

impl From<TchError> for ImitatorRlError{
    fn from(value: TchError) -> Self {
        Self::Torch{
            source: value,
            context: String::from("unspecified")
        }
    }
}

impl From<TensorError> for ImitatorRlError{
    fn from(error: TensorError) -> Self {
        Self::Tensor{ error }
    }
}
