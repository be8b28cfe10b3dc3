//! analytics.rs
//!
//! Модуль для выдачи аналитики занятости мест.
//!
//! Включает в себя следующую функциональность:
//! - Суммарное доступное/занятое время и общая загрузка.
//! - Самое занятое место и сравнение мест между собой.
//! - Пиковые часы за сегодня по истории событий занятости.
//!
//! Сами расчёты живут в [`crate::analytics`]; здесь только HTTP-слой.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{Local, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::analytics;
use crate::AppState;

/// Определяет маршруты, связанные с аналитикой.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/analytics", get(get_analytics))
}

/// GET /api/analytics
///
/// Возвращает отчёт по последнему снимку активного источника. Перед
/// расчётом минуты дотягиваются до текущего момента, как и в `/api/seats`.
async fn get_analytics(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let rx = state.source.subscribe();
    let snapshot = rx.borrow().clone();

    let mut seats = snapshot.seats;
    analytics::extrapolate_minutes(&mut seats, Utc::now());
    let report = analytics::build_report(&seats, Local::now());

    Json(json!({
        "success": true,
        "analytics": report,
        "updatedAt": snapshot.updated_at,
    }))
}
