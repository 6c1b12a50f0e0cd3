//! Premium prediction API.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use super::{message, run_blocking, ApiResult};
use crate::adapters::model::LogisticClassifier;
use crate::adapters::sqlite::SqliteAuditLog;
use crate::application::{Health, PredictionService};
use crate::{Prediction, PredictionInput};

/// Shared handler state.
pub type SharedPrediction = Arc<PredictionService<LogisticClassifier, SqliteAuditLog>>;

/// Build the prediction API router.
pub fn router(service: SharedPrediction) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/predict", post(predict_premium))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn home() -> impl IntoResponse {
    message("Welcome to Insurance Premium Prediction API")
}

async fn health(State(service): State<SharedPrediction>) -> Json<Health> {
    Json(service.health())
}

async fn predict_premium(
    State(service): State<SharedPrediction>,
    payload: Result<Json<PredictionInput>, JsonRejection>,
) -> ApiResult<Json<Prediction>> {
    let Json(input) = payload?;
    run_blocking(move || service.predict(&input))
        .await
        .map(Json)
}
