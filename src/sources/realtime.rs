//! Push-источник: управляемая подписка на коллекцию мест.
//!
//! Бэкенд синхронизации шлёт полные снимки коллекции (NDJSON, одна строка -
//! один снимок) при каждом изменении, документы упорядочены по id места.
//! `last_change_time` документа - либо серверный timestamp
//! `{"seconds": ...}`, либо локальные миллисекунды, пока серверный ещё не
//! присвоен; см. [`ChangeTime`].

use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{SeatStateSource, SourceError, SourceState};
use crate::config::RealtimeConfig;
use crate::models::{ChangeTime, SeatRuntime, SeatStatus};

/// Документ одного места в снимке push-бекенда.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeSeat {
    pub id: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub w: f64,
    #[serde(default)]
    pub h: f64,
    #[serde(default)]
    pub status: SeatStatus,
    pub last_change_time: ChangeTime,
    #[serde(rename = "availableMinutes", default)]
    pub available_minutes: f64,
    #[serde(rename = "occupiedMinutes", default)]
    pub occupied_minutes: f64,
}

impl From<RealtimeSeat> for SeatRuntime {
    fn from(doc: RealtimeSeat) -> Self {
        SeatRuntime {
            id: doc.id,
            x: doc.x,
            y: doc.y,
            w: doc.w,
            h: doc.h,
            status: doc.status,
            last_status_change: doc.last_change_time.to_utc(),
            available_minutes: doc.available_minutes,
            occupied_minutes: doc.occupied_minutes,
            occupancy_history: Vec::new(),
        }
    }
}

/// Одна строка стрима - полный снимок коллекции.
fn parse_snapshot(line: &str) -> Result<Vec<SeatRuntime>, serde_json::Error> {
    let docs: Vec<RealtimeSeat> = serde_json::from_str(line)?;
    let mut seats: Vec<SeatRuntime> = docs.into_iter().map(SeatRuntime::from).collect();
    seats.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(seats)
}

/// Push-источник состояния мест. Ресурс конструируется и разрушается
/// явно view-ом, а не живёт глобально.
#[derive(Debug)]
pub struct RealtimeSource {
    rx: watch::Receiver<SourceState>,
    handle: JoinHandle<()>,
}

impl RealtimeSource {
    /// Подключается к стриму снимков. Неудача здесь фатальна для view:
    /// никаких чтений дальше не будет, пользователь получает ошибку с
    /// инструкцией сразу.
    pub async fn connect(
        config: &RealtimeConfig,
        surface_errors: bool,
    ) -> Result<Self, SourceError> {
        if config.stream_url.is_empty() {
            return Err(SourceError::Init {
                reason: "REALTIME_STREAM_URL is not set".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        let resp = client
            .get(&config.stream_url)
            .send()
            .await
            .map_err(|e| SourceError::Init {
                reason: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(SourceError::Init {
                reason: format!("HTTP {}", resp.status()),
            });
        }

        let (tx, rx) = watch::channel(SourceState::default());
        let handle = tokio::task::spawn(read_loop(resp, tx, surface_errors));
        Ok(Self { rx, handle })
    }
}

async fn read_loop(resp: reqwest::Response, tx: watch::Sender<SourceState>, surface_errors: bool) {
    let mut stream = resp.bytes_stream();
    let mut buf = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                // Обрыв стрима: автоповторов нет, восстановление -
                // действие пользователя (перезагрузка страницы).
                warn!("Realtime stream error: {e}");
                if surface_errors {
                    tx.send_modify(|state| state.last_error = Some(e.to_string()));
                }
                return;
            }
        };
        buf.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buf.find('\n') {
            let line: String = buf.drain(..=pos).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_snapshot(line) {
                Ok(seats) => {
                    tx.send_modify(|state| {
                        state.seats = seats;
                        state.updated_at = Some(Utc::now());
                        state.last_error = None;
                    });
                }
                Err(e) => warn!("Malformed realtime snapshot skipped: {e}"),
            }
        }
    }
    debug!("Realtime stream closed");
}

impl SeatStateSource for RealtimeSource {
    fn subscribe(&self) -> watch::Receiver<SourceState> {
        self.rx.clone()
    }
}

impl Drop for RealtimeSource {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
