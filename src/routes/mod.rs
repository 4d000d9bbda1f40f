mod ping;
mod predict;

pub use ping::LIVENESS_MESSAGE;
pub use predict::FILE_FIELD;

use crate::{model_service::ModelService, server::SharedState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes<M: ModelService>() -> Router<SharedState<M>> {
    Router::new()
        .route("/ping", get(ping::ping))
        .route("/predict", post(predict::predict::<M>))
}
