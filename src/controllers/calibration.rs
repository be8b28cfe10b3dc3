//! calibration.rs
//!
//! HTTP-обвязка сессии разметки мест.
//!
//! Вся логика конечного автомата живёт в [`crate::capture`]; здесь только
//! транспорт: приём pointer-событий от панели калибровки, выдача снимка
//! сессии и сохранение готовой схемы в детектор через `/save_seats`.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::capture::{CaptureSession, CaptureStrategy, PointerOutcome, SurfaceGeometry};
use crate::models::{Point, SeatRegion};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/calibration", get(get_session))
        .route("/calibration/start", post(start_session))
        .route("/calibration/pointer", post(pointer_event))
        .route("/calibration/save", post(save_layout))
        .route("/calibration/reset", post(reset_session))
        .route("/background", post(capture_background))
}

fn session_view(session: &CaptureSession) -> serde_json::Value {
    json!({
        "mode": session.mode(),
        "strategy": session.strategy(),
        "units": session.units(),
        "targetCount": session.target_count(),
        "strictCountMatch": session.strict_count_match(),
        "committed": session.committed(),
        "preview": session.preview(),
    })
}

/* ---------- SESSION LIFECYCLE ---------- */

#[derive(Debug, Deserialize)]
struct StartRequest {
    #[serde(rename = "targetCount")]
    target_count: Option<usize>,
    strategy: Option<CaptureStrategy>,
    strict: Option<bool>,
}

// POST /api/calibration/start
async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Json<serde_json::Value> {
    let mut session = state.calibration.lock().await;
    // Новая сессия поверх старой: прошлая разметка оператору больше не нужна.
    *session = CaptureSession::new(
        req.strategy.unwrap_or(state.config.capture.strategy),
        req.target_count.unwrap_or(state.config.capture.target_seats),
        req.strict.or(state.config.capture.strict_count_match),
    );
    session.begin_placing();
    Json(json!({ "success": true, "session": session_view(&session) }))
}

// GET /api/calibration
async fn get_session(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let session = state.calibration.lock().await;
    Json(json!({ "success": true, "session": session_view(&session) }))
}

// POST /api/calibration/reset
async fn reset_session(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let mut session = state.calibration.lock().await;
    session.reset();
    Json(json!({ "success": true, "session": session_view(&session) }))
}

/* ---------- POINTER EVENTS ---------- */

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

#[derive(Debug, Deserialize)]
struct PointerRequest {
    kind: PointerKind,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    /// Текущий bounding box поверхности; обязателен для координатных
    /// событий и замеряется панелью заново на каждый ивент.
    surface: Option<SurfaceGeometry>,
}

fn outcome_label(outcome: PointerOutcome) -> &'static str {
    match outcome {
        PointerOutcome::Ignored => "ignored",
        PointerOutcome::Started => "started",
        PointerOutcome::Preview => "preview",
        PointerOutcome::Committed { .. } => "committed",
        PointerOutcome::Discarded => "discarded",
        PointerOutcome::Cancelled => "cancelled",
    }
}

// POST /api/calibration/pointer
async fn pointer_event(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PointerRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut session = state.calibration.lock().await;

    let result = match req.kind {
        PointerKind::Cancel => Ok(session.pointer_cancel()),
        PointerKind::Leave => Ok(session.pointer_leave()),
        PointerKind::Down | PointerKind::Move | PointerKind::Up => {
            let surface = req.surface.ok_or((
                StatusCode::BAD_REQUEST,
                "surface geometry обязательна для координатных событий".to_string(),
            ))?;
            let point = Point { x: req.x, y: req.y };
            match req.kind {
                PointerKind::Down => session.pointer_down(point, &surface),
                PointerKind::Move => Ok(session.pointer_move(point, &surface)),
                PointerKind::Up => session.pointer_up(point, &surface),
                _ => unreachable!(),
            }
        }
    };

    match result {
        Ok(outcome) => {
            let done = matches!(outcome, PointerOutcome::Committed { done: true, .. });
            Ok(Json(json!({
                "success": true,
                "outcome": outcome_label(outcome),
                "done": done,
                "session": session_view(&session),
            })))
        }
        // Потолок количества мест: набор не изменился, оператору - уведомление.
        Err(e) => Err((StatusCode::CONFLICT, e.to_string())),
    }
}

/* ---------- SAVE ---------- */

// POST /api/calibration/save
async fn save_layout(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut session = state.calibration.lock().await;

    let payload: Vec<SeatRegion> = match session.begin_save() {
        Ok(regions) => regions.to_vec(),
        // Не хватает мест (strict) либо пусто: сохранение блокируется.
        Err(e) => return Err((StatusCode::CONFLICT, e.to_string())),
    };

    // Локальное состояние не трогаем, пока детектор не подтвердил запись:
    // при сбое оператор повторяет сохранение без перерисовки.
    match state.backend.save_layout(&payload).await {
        Ok(()) => {
            session.confirm_saved();
            Ok(Json(json!({
                "success": true,
                "message": "Configuration saved",
                "seats": payload.len(),
            })))
        }
        Err(e) => {
            tracing::error!("save_layout failed: {e}");
            Err((
                StatusCode::BAD_GATEWAY,
                format!("Не удалось сохранить схему мест: {e}"),
            ))
        }
    }
}

/* ---------- BACKGROUND ---------- */

// POST /api/background - пересъёмка фона детектора
async fn capture_background(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.backend.capture_background().await.map_err(|e| {
        tracing::error!("capture_background failed: {e}");
        (
            StatusCode::BAD_GATEWAY,
            "Не удалось переснять фон детектора".to_string(),
        )
    })?;
    Ok(Json(json!({ "success": true, "message": "Background captured" })))
}
