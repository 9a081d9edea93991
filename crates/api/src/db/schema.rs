//! Static declaration of the two tables the API reads.
//!
//! The dataset is provisioned out of band, so nothing here creates tables;
//! the declarations are checked against the file once at startup.

pub const MEASUREMENT_TABLE: &str = "measurement";
pub const STATION_TABLE: &str = "station";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// `measurement(id, station, date, prcp, tobs)`, one row per station per day
pub const MEASUREMENT: TableSchema = TableSchema {
    name: MEASUREMENT_TABLE,
    columns: &["station", "date", "prcp", "tobs"],
};

/// `station(id, station, name, latitude, longitude, elevation)`
pub const STATION: TableSchema = TableSchema {
    name: STATION_TABLE,
    columns: &["station"],
};

pub const REQUIRED_TABLES: &[TableSchema] = &[MEASUREMENT, STATION];

impl TableSchema {
    /// Declared columns absent from `present`
    pub fn missing_columns(&self, present: &[String]) -> Vec<&'static str> {
        self.columns
            .iter()
            .copied()
            .filter(|column| !present.iter().any(|p| p.eq_ignore_ascii_case(column)))
            .collect()
    }
}
