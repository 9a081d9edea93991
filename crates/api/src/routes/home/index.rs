use axum::response::Html;

use crate::templates::home_page;

pub const AVAILABLE_ROUTES: &[&str] = &[
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/<start>",
    "/api/v1.0/<start>/<end>",
];

pub async fn index_handler() -> Html<String> {
    Html(home_page(AVAILABLE_ROUTES).into_string())
}
