use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::analytics;
use crate::models::SeatStatus;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(get_seats))
        .route("/summary", get(get_summary))
}

/// GET /api/seats
///
/// Последний снимок активного источника. Минуты дотягиваются до "сейчас",
/// чтобы счётчики на панели шли в реальном времени между сменами статуса.
async fn get_seats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let rx = state.source.subscribe();
    let snapshot = rx.borrow().clone();

    let mut seats = snapshot.seats;
    analytics::extrapolate_minutes(&mut seats, Utc::now());

    Json(json!({
        "success": true,
        "seats": seats,
        "updatedAt": snapshot.updated_at,
        "error": snapshot.last_error,
    }))
}

/// GET /api/summary - счётчики для шапки панели.
async fn get_summary(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let rx = state.source.subscribe();
    let snapshot = rx.borrow().clone();

    let occupied = snapshot
        .seats
        .iter()
        .filter(|s| s.status == SeatStatus::Occupied)
        .count();

    Json(json!({
        "success": true,
        "total": snapshot.seats.len(),
        "available": snapshot.seats.len() - occupied,
        "occupied": occupied,
    }))
}
