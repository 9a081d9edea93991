mod date_window;
pub mod schema;
mod sqlite;

pub use date_window::{DateWindow, DAYS_IN_WINDOW};
pub use sqlite::ClimateStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No data found: {0}")]
    NoDataFound(String),
    #[error("Stored date '{value}' is not a valid YYYY-MM-DD date: {source}")]
    MalformedDate {
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("Failed to format date: {0}")]
    DateFormat(#[from] time::error::Format),
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Dataset schema mismatch: {0}")]
    Schema(String),
}

/// Precipitation keyed by measurement date, in ascending date order.
pub type PrecipitationByDate = BTreeMap<String, Option<f64>>;

/// Read-only queries over the observation dataset.
#[async_trait]
pub trait ClimateData: Sync + Send {
    /// Precipitation for every measurement on or after the start of the last-year window.
    async fn precipitation(&self) -> Result<PrecipitationByDate, Error>;
    /// Every station identifier in the station table.
    async fn stations(&self) -> Result<Vec<String>, Error>;
    /// Temperature observations of the station with the most measurements,
    /// on or after the start of that station's last-year window.
    async fn most_active_tobs(&self) -> Result<Vec<TobsEntry>, Error>;
    /// MIN/AVG/MAX temperature over `date >= start` and, if given, `date <= end`.
    async fn temperature_summary(
        &self,
        range: &TemperatureRange,
    ) -> Result<TemperatureSummary, Error>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema, sqlx::FromRow)]
pub struct TobsEntry {
    pub date: String,
    pub tobs: Option<f64>,
}

/// Unvalidated date bounds taken straight from the request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemperatureRange {
    pub start: String,
    pub end: Option<String>,
}

impl TemperatureRange {
    pub fn starting_at(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: None,
        }
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: Some(end.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct TemperatureSummary {
    pub start_date: String,
    pub end_date: Option<String>,
    #[serde(rename = "TMIN")]
    pub tmin: Option<f64>,
    #[serde(rename = "TAVG")]
    pub tavg: Option<f64>,
    #[serde(rename = "TMAX")]
    pub tmax: Option<f64>,
}
