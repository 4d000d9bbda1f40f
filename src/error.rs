use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::labels::NUM_CLASSES;
use image::ColorType;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unrecognized image format")]
    UnknownFormat,
    #[error("Failed to read image payload: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unsupported color mode: {0:?}")]
    UnsupportedColorMode(ColorType),
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference session failed: {0}")]
    Session(#[from] ort::Error),
    #[error("Session mutex poisoned: {0}")]
    Poisoned(String),
    #[error("Unexpected model output shape {0:?}")]
    UnexpectedOutputShape(Vec<usize>),
    #[error("Model returned non-finite scores {0:?}")]
    NonFiniteScores([f32; NUM_CLASSES]),
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Missing `file` field in multipart form")]
    MissingFile,
    #[error("Invalid upload: {0}")]
    Upload(#[from] MultipartError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("Prediction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PredictError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MissingFile | PredictError::Decode(_) => StatusCode::BAD_REQUEST,
            PredictError::Upload(err) => err.status(),
            PredictError::Inference(_) | PredictError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Prediction failed: {}", self);
        } else {
            tracing::warn!("Rejected prediction request: {}", self);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid model configuration: {0}")]
    InvalidModelConfig(String),
    #[error("Failed to load model: {0}")]
    ModelLoad(#[from] ort::Error),
    #[error("Invalid CORS origin `{0}`")]
    InvalidOrigin(String),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}
