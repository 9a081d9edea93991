use crate::helpers::{seed_dataset, seed_raw, spawn_store_app, tobs_entry, MeasurementRow};
use axum::http::StatusCode;
use climate_api::{ClimateData, ClimateStore, DateWindow, Error, TemperatureSummary, TobsEntry};
use serde_json::json;

const YEAR_OF_DATA: &[MeasurementRow<'static>] = &[
    ("S1", "2016-08-22", Some(0.5), Some(60.0)),
    ("S1", "2016-08-23", Some(0.1), Some(62.0)),
    ("S1", "2017-01-01", Some(0.0), Some(65.0)),
    ("S1", "2017-08-23", Some(0.3), Some(70.0)),
    ("S2", "2017-06-01", None, Some(68.0)),
    ("S2", "2017-08-23", Some(0.9), Some(71.0)),
    ("S3", "2015-01-01", Some(2.0), Some(55.0)),
];

const RANGE_DATA: &[MeasurementRow<'static>] = &[
    ("S1", "2017-08-01", None, Some(70.0)),
    ("S1", "2017-08-05", Some(0.2), None),
    ("S1", "2017-08-10", None, Some(80.0)),
    ("S1", "2017-08-20", None, Some(75.0)),
];

#[tokio::test]
async fn precipitation_covers_last_365_days_with_last_write_wins() {
    let dataset = seed_dataset(&["S1", "S2", "S3"], YEAR_OF_DATA).await;
    let (test_app, _store) = spawn_store_app(&dataset).await;

    let (status, body) = test_app.get_json("/api/v1.0/precipitation").await;
    assert_eq!(status, StatusCode::OK);

    // Latest date is 2017-08-23, so the window starts at 2016-08-23
    assert_eq!(
        body,
        json!({
            "2016-08-23": 0.1,
            "2017-01-01": 0.0,
            "2017-06-01": null,
            "2017-08-23": 0.9
        })
    );

    let window = DateWindow::ending_at("2017-08-23").unwrap();
    for date in body.as_object().unwrap().keys() {
        assert!(date.as_str() >= window.start.as_str(), "{date} is before the window");
    }
}

#[tokio::test]
async fn stations_match_station_table() {
    let dataset = seed_dataset(&["S1", "S2", "S3"], YEAR_OF_DATA).await;
    let (test_app, _store) = spawn_store_app(&dataset).await;

    let (status, body) = test_app.get_json("/api/v1.0/stations").await;
    assert_eq!(status, StatusCode::OK);

    let mut stations: Vec<String> = serde_json::from_value(body).unwrap();
    stations.sort();
    assert_eq!(stations, vec!["S1", "S2", "S3"]);
}

#[tokio::test]
async fn tobs_uses_most_active_station() {
    let dataset = seed_dataset(&["S1", "S2", "S3"], YEAR_OF_DATA).await;
    let (test_app, _store) = spawn_store_app(&dataset).await;

    let (status, body) = test_app.get_json("/api/v1.0/tobs").await;
    assert_eq!(status, StatusCode::OK);

    let entries: Vec<TobsEntry> = serde_json::from_value(body).unwrap();
    assert_eq!(
        entries,
        vec![
            tobs_entry("2016-08-23", Some(62.0)),
            tobs_entry("2017-01-01", Some(65.0)),
            tobs_entry("2017-08-23", Some(70.0)),
        ]
    );
}

#[tokio::test]
async fn tobs_window_is_relative_to_the_station_latest_date() {
    // S1 is the most active but stopped reporting in 2016; the window spans 2016-02-29
    let rows: &[MeasurementRow] = &[
        ("S1", "2015-03-01", None, Some(61.0)),
        ("S1", "2015-03-02", None, Some(62.0)),
        ("S1", "2016-03-01", None, Some(63.0)),
        ("S2", "2017-08-23", None, Some(80.0)),
    ];
    let dataset = seed_dataset(&["S1", "S2"], rows).await;
    let (_test_app, store) = spawn_store_app(&dataset).await;

    let entries = store.most_active_tobs().await.unwrap();
    assert_eq!(
        entries,
        vec![
            tobs_entry("2015-03-02", Some(62.0)),
            tobs_entry("2016-03-01", Some(63.0)),
        ]
    );
}

#[tokio::test]
async fn most_active_tie_goes_to_smallest_station_id() {
    let rows: &[MeasurementRow] = &[
        ("S2", "2017-08-01", None, Some(90.0)),
        ("S2", "2017-08-02", None, Some(91.0)),
        ("S1", "2017-08-01", None, Some(70.0)),
        ("S1", "2017-08-02", None, Some(71.0)),
    ];
    let dataset = seed_dataset(&["S1", "S2"], rows).await;
    let (_test_app, store) = spawn_store_app(&dataset).await;

    let entries = store.most_active_tobs().await.unwrap();
    assert_eq!(
        entries,
        vec![
            tobs_entry("2017-08-01", Some(70.0)),
            tobs_entry("2017-08-02", Some(71.0)),
        ]
    );
}

#[tokio::test]
async fn temperature_range_with_both_bounds() {
    let dataset = seed_dataset(&["S1"], RANGE_DATA).await;
    let (test_app, _store) = spawn_store_app(&dataset).await;

    let (status, body) = test_app.get_json("/api/v1.0/2017-08-01/2017-08-10").await;
    assert_eq!(status, StatusCode::OK);

    // The null observation on 2017-08-05 is left out of the average
    let summary: TemperatureSummary = serde_json::from_value(body).unwrap();
    assert_eq!(
        summary,
        TemperatureSummary {
            start_date: "2017-08-01".into(),
            end_date: Some("2017-08-10".into()),
            tmin: Some(70.0),
            tavg: Some(75.0),
            tmax: Some(80.0),
        }
    );
}

#[tokio::test]
async fn temperature_range_with_start_only() {
    let dataset = seed_dataset(&["S1"], RANGE_DATA).await;
    let (test_app, _store) = spawn_store_app(&dataset).await;

    let (status, body) = test_app.get_json("/api/v1.0/2017-08-15").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "start_date": "2017-08-15",
            "end_date": null,
            "TMIN": 75.0,
            "TAVG": 75.0,
            "TMAX": 75.0
        })
    );
}

#[tokio::test]
async fn temperature_range_without_matches_is_all_null() {
    let dataset = seed_dataset(&["S1"], RANGE_DATA).await;
    let (test_app, _store) = spawn_store_app(&dataset).await;

    for uri in [
        "/api/v1.0/2018-01-01",
        "/api/v1.0/2017-08-11/2017-08-19",
        "/api/v1.0/2017-08-10/2017-08-01",
        "/api/v1.0/not-a-date",
    ] {
        let (status, body) = test_app.get_json(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["TMIN"], json!(null), "{uri}");
        assert_eq!(body["TAVG"], json!(null), "{uri}");
        assert_eq!(body["TMAX"], json!(null), "{uri}");
    }
}

#[tokio::test]
async fn empty_measurements_are_not_found() {
    let dataset = seed_dataset(&["S1"], &[]).await;
    let (test_app, store) = spawn_store_app(&dataset).await;

    let (status, body) = test_app.get_json("/api/v1.0/precipitation").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = test_app.get_json("/api/v1.0/tobs").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = test_app.get_json("/api/v1.0/stations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["S1"]));

    let (status, body) = test_app.get_json("/api/v1.0/2017-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["TAVG"], json!(null));

    assert!(matches!(
        store.precipitation().await,
        Err(Error::NoDataFound(_))
    ));
}

#[tokio::test]
async fn connections_are_released_after_failed_lookups() {
    let dataset = seed_dataset(&["S1"], &[]).await;
    let store = ClimateStore::connect(&dataset.path, 1).await.unwrap();

    // With a single pooled connection, a leaked one would stall the next acquire
    for _ in 0..3 {
        assert!(store.precipitation().await.is_err());
        assert!(store.most_active_tobs().await.is_err());
    }
    assert_eq!(store.stations().await.unwrap(), vec!["S1".to_string()]);
    assert_eq!(store.pool().size(), 1);
}

#[tokio::test]
async fn startup_fails_when_dataset_is_missing() {
    let result = ClimateStore::connect("/nonexistent/path/hawaii.sqlite", 1).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn startup_fails_without_station_table() {
    let dataset = seed_raw(&[
        "CREATE TABLE measurement (id INTEGER PRIMARY KEY, station TEXT, date TEXT, prcp FLOAT, tobs FLOAT)",
    ])
    .await;

    let err = ClimateStore::connect(&dataset.path, 1)
        .await
        .err()
        .expect("missing station table should fail startup");
    assert!(format!("{:#}", err).contains("'station' does not exist"));
}

#[tokio::test]
async fn startup_fails_when_columns_are_missing() {
    let dataset = seed_raw(&[
        "CREATE TABLE measurement (id INTEGER PRIMARY KEY, station TEXT, date TEXT, prcp FLOAT)",
        "CREATE TABLE station (id INTEGER PRIMARY KEY, station TEXT)",
    ])
    .await;

    let err = ClimateStore::connect(&dataset.path, 1)
        .await
        .err()
        .expect("missing tobs column should fail startup");
    assert!(format!("{:#}", err).contains("missing columns: tobs"));
}
