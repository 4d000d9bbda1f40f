use crate::{
    error::{InferenceError, PredictError},
    model_service::ModelService,
    preprocess::{decode_image, normalize},
    selection::{select_class, PredictionResult},
};
use std::sync::Arc;

/// Runs the full request pipeline: decode, normalize, batch, infer, select.
#[derive(Debug)]
pub struct InferenceService<M: ModelService> {
    model_service: Arc<M>,
}

impl<M: ModelService> Clone for InferenceService<M> {
    fn clone(&self) -> Self {
        Self {
            model_service: self.model_service.clone(),
        }
    }
}

impl<M: ModelService> InferenceService<M> {
    pub fn new(model_service: M) -> Self {
        Self {
            model_service: Arc::new(model_service),
        }
    }

    pub fn classify(&self, image_data: &[u8]) -> Result<PredictionResult, PredictError> {
        let decoded = decode_image(image_data)?;
        tracing::debug!(
            "Decoded {}x{} image in {:?} mode",
            decoded.width(),
            decoded.height(),
            decoded.color_mode()
        );

        let batch = normalize(decoded).into_batch();
        let scores = self.model_service.predict(&batch)?;
        if !scores.is_finite() {
            return Err(InferenceError::NonFiniteScores(*scores.scores()).into());
        }
        let result = select_class(&scores);

        tracing::debug!(
            "Predicted class={}, confidence={:.3}, scores={:?}",
            result.class,
            result.confidence,
            scores.scores()
        );

        Ok(result)
    }
}
