//! Patient record API.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use super::{message, run_blocking, ApiResult};
use crate::adapters::json_file::JsonFileStore;
use crate::application::RecordService;
use crate::domain::{PatientEntry, PatientMap};
use crate::{HealthdeskError, Patient, PatientPatch, PatientRecord};

/// Shared handler state.
pub type SharedRecords = Arc<RecordService<JsonFileStore>>;

#[derive(Debug, Deserialize)]
struct SortQuery {
    sort_by: Option<String>,
    order: Option<String>,
}

/// Build the record API router.
pub fn router(service: SharedRecords) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/view", get(view_patients))
        .route("/patient/:patient_id", get(view_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/:patient_id", put(update_patient))
        .route("/delete/:patient_id", delete(delete_patient))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn home() -> impl IntoResponse {
    message("Patient Management System API")
}

async fn about() -> impl IntoResponse {
    message("This API is designed to manage patient records efficiently.")
}

async fn view_patients(State(service): State<SharedRecords>) -> ApiResult<Json<PatientMap>> {
    tracing::debug!("Listing patients");
    run_blocking(move || service.list()).await.map(Json)
}

async fn view_patient(
    State(service): State<SharedRecords>,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<PatientRecord>> {
    tracing::debug!("Fetching patient {}", patient_id);
    run_blocking(move || service.get(&patient_id))
        .await
        .map(Json)
}

async fn sort_patients(
    State(service): State<SharedRecords>,
    Query(query): Query<SortQuery>,
) -> ApiResult<Json<Vec<PatientEntry>>> {
    let field = query.sort_by.ok_or_else(|| {
        HealthdeskError::InvalidArgument("Query parameter sort_by is required".to_string())
    })?;
    let order = query.order.unwrap_or_else(|| "asc".to_string());

    run_blocking(move || service.sort(&field, &order))
        .await
        .map(Json)
}

async fn create_patient(
    State(service): State<SharedRecords>,
    payload: Result<Json<Patient>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(patient) = payload?;
    run_blocking(move || service.create(patient)).await?;
    Ok((
        StatusCode::CREATED,
        message("Patient created successfully"),
    ))
}

async fn update_patient(
    State(service): State<SharedRecords>,
    Path(patient_id): Path<String>,
    payload: Result<Json<PatientPatch>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(patch) = payload?;
    run_blocking(move || service.update(&patient_id, &patch)).await?;
    Ok(message("Patient updated successfully"))
}

async fn delete_patient(
    State(service): State<SharedRecords>,
    Path(patient_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    run_blocking(move || service.delete(&patient_id)).await?;
    Ok(message("Patient deleted successfully"))
}
