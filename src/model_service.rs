use crate::{error::InferenceError, preprocess::BatchedTensor, selection::PredictionVector};

/// Narrow boundary to the trained classifier: one batched image in, one row
/// of class scores out.
pub trait ModelService: Send + Sync + 'static {
    fn predict(&self, input: &BatchedTensor) -> Result<PredictionVector, InferenceError>;
}
