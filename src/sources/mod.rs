//! Источники состояния мест.
//!
//! Панель мониторинга не знает, откуда приходят данные: опрос детектора по
//! таймеру или push-подписка на коллекцию снимков. Оба варианта публикуют
//! последний снимок в `watch`-канал; рендер-слой просто подписывается.

pub mod polling;
pub mod realtime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::models::SeatRuntime;

pub use polling::PollingSource;
pub use realtime::RealtimeSource;

/// Последний известный снимок состояния мест.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceState {
    pub seats: Vec<SeatRuntime>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Транспортная ошибка, если политика view велит её показывать.
    /// Последний удачный снимок при этом сохраняется.
    #[serde(rename = "lastError")]
    pub last_error: Option<String>,
}

/// Единая абстракция "откуда берётся состояние мест".
pub trait SeatStateSource: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<SourceState>;
}

/// Ошибки инициализации источника.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Неудачная инициализация push-источника фатальна для view: чтения
    /// отключены, восстановление только вручную.
    #[error("realtime backend connection failed: {reason}; check REALTIME_STREAM_URL and that the sync service is running, then reload the dashboard")]
    Init { reason: String },
}
