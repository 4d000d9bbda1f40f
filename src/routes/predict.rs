use crate::{
    error::PredictError, model_service::ModelService, selection::PredictionResult,
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use tracing::instrument;

/// Form field carrying the uploaded image.
pub const FILE_FIELD: &str = "file";

#[instrument(skip(state, multipart))]
pub async fn predict<M: ModelService>(
    State(state): State<SharedState<M>>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResult>, PredictError> {
    let image_data = read_file_field(&mut multipart).await?;
    tracing::debug!("Received upload of {} bytes", image_data.len());

    let inference_service = state.inference_service.clone();
    let result =
        tokio::task::spawn_blocking(move || inference_service.classify(&image_data)).await??;

    tracing::info!(
        class = %result.class,
        confidence = result.confidence,
        "Prediction served"
    );

    Ok(Json(result))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Bytes, PredictError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(PredictError::MissingFile)
}
