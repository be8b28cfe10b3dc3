pub mod analytics;
pub mod calibration;
pub mod seats;
pub mod streams;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(seats::routes())
        .merge(calibration::routes())
        .merge(analytics::routes())
}
