use crate::{
    config::{ModelConfig, Validatable},
    error::{InferenceError, StartupError},
    model_service::ModelService,
    preprocess::BatchedTensor,
    selection::PredictionVector,
};
use ndarray::{ArrayViewD, Axis};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

/// ONNX Runtime backed classifier. Sessions are created once at startup and
/// handed out round-robin; each one serves a single request at a time.
pub struct OrtModelService {
    sessions: Vec<Mutex<Session>>,
    counter: AtomicUsize,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, StartupError> {
        model_config
            .validate()
            .map_err(StartupError::InvalidModelConfig)?;

        ort::init().with_name("blight_prediction").commit()?;

        let model_path = model_config.get_path();
        let num_instances = model_config.num_instances;
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(&model_path)?;
                Ok(Mutex::new(session))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        tracing::info!(
            "Created {} ONNX sessions from {:?}",
            num_instances,
            model_path
        );

        Ok(Self {
            sessions,
            counter: AtomicUsize::new(0),
        })
    }

    fn run_inference(&self, input: &BatchedTensor) -> Result<PredictionVector, InferenceError> {
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session = self.sessions[index]
            .lock()
            .map_err(|e| InferenceError::Poisoned(e.to_string()))?;

        tracing::debug!("Handling request with session {}", index);

        let tensor_ref = TensorRef::from_array_view(input.view())?;
        let outputs = session.run(ort::inputs![tensor_ref])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let array = ndarray::ArrayD::from_shape_vec(shape.to_ixdyn(), data.to_vec())
            .map_err(|_| InferenceError::UnexpectedOutputShape(vec![data.len()]))?;

        single_row(array.view())
    }
}

/// Strips the batch axis from a `(1, NUM_CLASSES)` output.
fn single_row(output: ArrayViewD<'_, f32>) -> Result<PredictionVector, InferenceError> {
    let shape_error = || InferenceError::UnexpectedOutputShape(output.shape().to_vec());

    if output.ndim() != 2 || output.len_of(Axis(0)) != 1 {
        return Err(shape_error());
    }

    let row: Vec<f32> = output.index_axis(Axis(0), 0).iter().copied().collect();
    PredictionVector::try_from(row.as_slice()).map_err(|_| shape_error())
}

impl ModelService for OrtModelService {
    fn predict(&self, input: &BatchedTensor) -> Result<PredictionVector, InferenceError> {
        self.run_inference(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array3};
    use std::path::PathBuf;

    #[test]
    fn test_single_row_strips_batch_axis() {
        let output = arr2(&[[0.1f32, 0.7, 0.2]]).into_dyn();
        let vector = single_row(output.view()).unwrap();
        assert_eq!(vector.scores(), &[0.1, 0.7, 0.2]);
    }

    #[test]
    fn test_single_row_rejects_wrong_class_count() {
        let output = arr2(&[[0.1f32, 0.7, 0.1, 0.1]]).into_dyn();
        let err = single_row(output.view()).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::UnexpectedOutputShape(ref shape) if shape == &vec![1, 4]
        ));
    }

    #[test]
    fn test_single_row_rejects_batches_and_flat_outputs() {
        let batched = arr2(&[[0.1f32, 0.7, 0.2], [0.3, 0.3, 0.4]]).into_dyn();
        assert!(single_row(batched.view()).is_err());

        let flat = arr1(&[0.1f32, 0.7, 0.2]).into_dyn();
        assert!(single_row(flat.view()).is_err());

        let cube = Array3::<f32>::zeros((1, 3, 1)).into_dyn();
        assert!(single_row(cube.view()).is_err());
    }

    #[test]
    fn test_new_fails_on_missing_model() {
        let config = ModelConfig {
            onnx_file: "missing.onnx".to_string(),
            model_dir: PathBuf::from("./does_not_exist"),
            num_instances: 1,
        };

        let result = OrtModelService::new(&config);
        assert!(matches!(result, Err(StartupError::InvalidModelConfig(_))));
    }

    #[test]
    fn test_new_fails_on_zero_instances() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"onnx").unwrap();
        let config = ModelConfig {
            onnx_file: "model.onnx".to_string(),
            model_dir: dir.path().to_path_buf(),
            num_instances: 0,
        };

        let result = OrtModelService::new(&config);
        assert!(matches!(
            result,
            Err(StartupError::InvalidModelConfig(ref msg)) if msg.contains("num_instances")
        ));
    }
}
