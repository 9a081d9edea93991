pub mod climate_routes;

pub use climate_routes::*;
