mod error;
mod inference_service;
mod labels;
mod model_service;
mod ort_service;
mod preprocess;
mod routes;
mod selection;
mod server;

pub mod config;

pub use error::{DecodeError, InferenceError, PredictError, StartupError};
pub use inference_service::InferenceService;
pub use labels::PlantClass;
pub use model_service::ModelService;
pub use ort_service::OrtModelService;
pub use preprocess::{
    decode_image, normalize, BatchedTensor, ColorMode, DecodedImage, NormalizedTensor, IMAGE_SIZE,
};
pub use routes::{FILE_FIELD, LIVENESS_MESSAGE};
pub use selection::{select_class, PredictionResult, PredictionVector};
pub use server::{build_router, start_server, HttpServer};
