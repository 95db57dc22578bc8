//! Handlers for the `/measurements` resource.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use thermo_core::error::CoreError;
use thermo_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use thermo_core::types::DbId;
use thermo_db::models::measurement::{CreateMeasurement, Measurement};
use thermo_db::repositories::MeasurementRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /measurements
///
/// Measurements recorded by this device, newest first.
pub async fn list_measurements(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Measurement>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let measurements =
        MeasurementRepo::list_for_device(&state.pool, &state.device_id, limit, offset).await?;

    Ok(Json(DataResponse { data: measurements }))
}

/// POST /measurements
///
/// Stores a reading for this device. Any client-supplied id or device id is
/// ignored.
pub async fn create_measurement(
    State(state): State<AppState>,
    payload: Result<Json<CreateMeasurement>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<Measurement>>)> {
    let Json(input) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    input.validate()?;

    let measurement = MeasurementRepo::insert(&state.pool, &state.device_id, &input).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: measurement }),
    ))
}

/// GET /measurements/{id}
pub async fn get_measurement(
    State(state): State<AppState>,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<DataResponse<Measurement>>> {
    let Path(id) = id.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let measurement = MeasurementRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Measurement",
            id,
        })?;

    Ok(Json(DataResponse { data: measurement }))
}
