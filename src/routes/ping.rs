use axum::Json;

pub const LIVENESS_MESSAGE: &str = "Hello, I am alive";

pub async fn ping() -> Json<&'static str> {
    Json(LIVENESS_MESSAGE)
}
