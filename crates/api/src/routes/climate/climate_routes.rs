use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    AppState, Error, PrecipitationByDate, TemperatureRange, TemperatureSummary, TobsEntry,
};

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NoDataFound(_) => StatusCode::NOT_FOUND,
            Error::MalformedDate { .. }
            | Error::DateFormat(_)
            | Error::Query(_)
            | Error::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("error handling request: {}", self);
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

#[utoipa::path(
    get,
    path = "/api/v1.0/precipitation",
    responses(
        (status = OK, description = "Precipitation by date from 365 days before the latest measurement onward", content_type = "application/json", body = std::collections::BTreeMap<String, Option<f64>>),
        (status = NOT_FOUND, description = "Dataset has no measurements", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query dataset", body = ErrorResponse)
    ))]
pub async fn precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PrecipitationByDate>, Error> {
    let by_date = state.climate_db.precipitation().await?;
    Ok(Json(by_date))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/stations",
    responses(
        (status = OK, description = "Every station identifier", content_type = "application/json", body = Vec<String>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query dataset", body = ErrorResponse)
    ))]
pub async fn stations(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, Error> {
    let stations = state.climate_db.stations().await?;
    Ok(Json(stations))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/tobs",
    responses(
        (status = OK, description = "Temperature observations of the most active station over its last 365 days", content_type = "application/json", body = Vec<TobsEntry>),
        (status = NOT_FOUND, description = "Dataset has no measurements", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query dataset", body = ErrorResponse)
    ))]
pub async fn tobs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TobsEntry>>, Error> {
    let entries = state.climate_db.most_active_tobs().await?;
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/{start}",
    params(
        ("start" = String, Path, description = "Inclusive lower date bound, YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "Temperature min/avg/max from start onward, null when nothing matches", content_type = "application/json", body = TemperatureSummary),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query dataset", body = ErrorResponse)
    ))]
pub async fn temperature_from(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<TemperatureSummary>, Error> {
    let range = TemperatureRange::starting_at(start);
    let summary = state.climate_db.temperature_summary(&range).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/{start}/{end}",
    params(
        ("start" = String, Path, description = "Inclusive lower date bound, YYYY-MM-DD"),
        ("end" = String, Path, description = "Inclusive upper date bound, YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "Temperature min/avg/max between start and end, null when nothing matches", content_type = "application/json", body = TemperatureSummary),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to query dataset", body = ErrorResponse)
    ))]
pub async fn temperature_between(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<TemperatureSummary>, Error> {
    let range = TemperatureRange::between(start, end);
    let summary = state.climate_db.temperature_summary(&range).await?;
    Ok(Json(summary))
}
