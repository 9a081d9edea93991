//! Climate API Core Library
//!
//! Shared utilities for the climate observation service:
//! - Configuration loading (XDG-compliant)
//! - File system checks for the dataset file
//! - Common defaults

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};
pub use fs::{is_file, path_exists};

/// Application name used for XDG paths
pub const APP_NAME: &str = "climate-api";

/// Default API port
pub const DEFAULT_API_PORT: u16 = 5000;

/// Default location of the pre-loaded observation dataset
pub const DEFAULT_DATABASE_PATH: &str = "./hawaii.sqlite";

/// Default size of the read-only connection pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
