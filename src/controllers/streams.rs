//! streams.rs
//!
//! Корневые маршруты-прокси к детектору: живой MJPEG-поток, CSV-отчёт и
//! сырой `/status` старой панели. Байты прокидываются как есть, гейтвей
//! их не декодирует.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::models::SeatState;
use crate::AppState;

pub fn root_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/video_feed", get(video_feed))
        .route("/download_report", get(download_report))
        .route("/status", get(raw_status))
}

// GET /video_feed
async fn video_feed(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let upstream = state.backend.video_feed().await.map_err(|e| {
        tracing::error!("video_feed proxy failed: {e}");
        (
            StatusCode::BAD_GATEWAY,
            "Видеопоток детектора недоступен".to_string(),
        )
    })?;

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("multipart/x-mixed-replace; boundary=frame")
        .to_string();

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from_stream(upstream.bytes_stream()))
        .unwrap())
}

// GET /download_report - CSV открывается браузером как скачивание
async fn download_report(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let upstream = state.backend.download_report().await.map_err(|e| {
        tracing::error!("download_report proxy failed: {e}");
        (
            StatusCode::BAD_GATEWAY,
            "Отчёт детектора недоступен".to_string(),
        )
    })?;

    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"Seat_Report.csv\"",
        )
        .body(Body::from_stream(upstream.bytes_stream()))
        .unwrap())
}

// GET /status - совместимость со старой панелью
async fn raw_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SeatState>>, (StatusCode, String)> {
    let states = state.backend.fetch_status().await.map_err(|e| {
        tracing::error!("status proxy failed: {e}");
        (
            StatusCode::BAD_GATEWAY,
            "Детектор недоступен".to_string(),
        )
    })?;
    Ok(Json(states))
}
