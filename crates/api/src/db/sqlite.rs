use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use climate_api_core::is_file;
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::time::Duration;

use super::{
    schema::{TableSchema, REQUIRED_TABLES},
    ClimateData, DateWindow, Error, PrecipitationByDate, TemperatureRange, TemperatureSummary,
    TobsEntry,
};

/// Read-only handle to the observation dataset, built once at startup and shared by every request
pub struct ClimateStore {
    pool: SqlitePool,
}

impl ClimateStore {
    pub async fn connect(path: &str, max_connections: u32) -> Result<Self> {
        if !is_file(path) {
            return Err(anyhow!("dataset file not found: {}", path));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .pragma("busy_timeout", "5000")
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open dataset at {}", path))?;

        let store = Self { pool };
        store.health_check().await?;
        store
            .verify_schema()
            .await
            .with_context(|| format!("Dataset at {} is missing required tables", path))?;

        info!("SQLite dataset opened read-only at: {}", path);
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database connectivity and integrity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database connectivity check failed")?;

        let result: String = sqlx::query_scalar("PRAGMA quick_check;")
            .fetch_one(&self.pool)
            .await
            .context("Database integrity check failed")?;
        if result != "ok" {
            return Err(anyhow!("Database integrity check failed: {}", result));
        }

        Ok(())
    }

    /// Every declared table must exist with at least its declared columns.
    pub async fn verify_schema(&self) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        for table in REQUIRED_TABLES {
            verify_table(&mut conn, table).await?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("SQLite dataset closed");
    }
}

async fn verify_table(conn: &mut SqliteConnection, table: &TableSchema) -> Result<(), Error> {
    let present: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table.name)
        .fetch_all(&mut *conn)
        .await?;

    if present.is_empty() {
        return Err(Error::Schema(format!("table '{}' does not exist", table.name)));
    }

    let missing = table.missing_columns(&present);
    if !missing.is_empty() {
        return Err(Error::Schema(format!(
            "table '{}' is missing columns: {}",
            table.name,
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Window ending at the latest measurement date, optionally for one station only.
async fn date_window(
    conn: &mut SqliteConnection,
    station: Option<&str>,
) -> Result<DateWindow, Error> {
    let latest: Option<String> = match station {
        Some(station) => {
            sqlx::query_scalar("SELECT MAX(date) FROM measurement WHERE station = ?")
                .bind(station)
                .fetch_one(&mut *conn)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT MAX(date) FROM measurement")
                .fetch_one(&mut *conn)
                .await?
        }
    };

    let latest = latest.ok_or_else(|| match station {
        Some(station) => Error::NoDataFound(format!("no measurements for station {}", station)),
        None => Error::NoDataFound("measurement table is empty".to_string()),
    })?;

    DateWindow::ending_at(&latest)
}

#[async_trait]
impl ClimateData for ClimateStore {
    async fn precipitation(&self) -> Result<PrecipitationByDate, Error> {
        let mut conn = self.pool.acquire().await?;
        let window = date_window(&mut conn, None).await?;
        debug!("precipitation window: {} to {}", window.start, window.end);

        // Only the lower bound is applied; the window end is the table max anyway
        let rows: Vec<(String, Option<f64>)> = sqlx::query_as(
            "SELECT date, CAST(prcp AS REAL) AS prcp FROM measurement WHERE date >= ?",
        )
        .bind(&window.start)
        .fetch_all(&mut *conn)
        .await?;

        // Several stations report per date: later rows overwrite earlier ones
        let mut by_date = PrecipitationByDate::new();
        for (date, prcp) in rows {
            by_date.insert(date, prcp);
        }
        Ok(by_date)
    }

    async fn stations(&self) -> Result<Vec<String>, Error> {
        let mut conn = self.pool.acquire().await?;
        let stations: Vec<String> = sqlx::query_scalar("SELECT station FROM station")
            .fetch_all(&mut *conn)
            .await?;
        Ok(stations)
    }

    async fn most_active_tobs(&self) -> Result<Vec<TobsEntry>, Error> {
        let mut conn = self.pool.acquire().await?;

        // Ties on count resolve to the smallest station id
        let most_active: Option<(String, i64)> = sqlx::query_as(
            "SELECT station, COUNT(station) AS observations
             FROM measurement
             WHERE station IS NOT NULL
             GROUP BY station
             ORDER BY observations DESC, station ASC
             LIMIT 1",
        )
        .fetch_optional(&mut *conn)
        .await?;

        let (station, observations) = most_active
            .ok_or_else(|| Error::NoDataFound("measurement table is empty".to_string()))?;

        let window = date_window(&mut conn, Some(&station)).await?;
        debug!(
            "most active station {} ({} rows), window: {} to {}",
            station, observations, window.start, window.end
        );

        let entries: Vec<TobsEntry> = sqlx::query_as(
            "SELECT date, CAST(tobs AS REAL) AS tobs
             FROM measurement
             WHERE station = ? AND date >= ?
             ORDER BY date ASC",
        )
        .bind(&station)
        .bind(&window.start)
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }

    async fn temperature_summary(
        &self,
        range: &TemperatureRange,
    ) -> Result<TemperatureSummary, Error> {
        let mut conn = self.pool.acquire().await?;

        // Bounds are compared as plain strings, malformed input simply matches nothing
        let (tmin, tavg, tmax): (Option<f64>, Option<f64>, Option<f64>) = match &range.end {
            Some(end) => {
                sqlx::query_as(
                    "SELECT CAST(MIN(tobs) AS REAL), AVG(tobs), CAST(MAX(tobs) AS REAL)
                     FROM measurement
                     WHERE date >= ? AND date <= ?",
                )
                .bind(&range.start)
                .bind(end)
                .fetch_one(&mut *conn)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT CAST(MIN(tobs) AS REAL), AVG(tobs), CAST(MAX(tobs) AS REAL)
                     FROM measurement
                     WHERE date >= ?",
                )
                .bind(&range.start)
                .fetch_one(&mut *conn)
                .await?
            }
        };

        Ok(TemperatureSummary {
            start_date: range.start.clone(),
            end_date: range.end.clone(),
            tmin,
            tavg,
            tmax,
        })
    }
}
