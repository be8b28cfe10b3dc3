use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use super::{SeatStateSource, SourceState};
use crate::services::BackendClient;

/// Опрос детектора по фиксированному интервалу (по умолчанию 1000 мс).
/// Интервал не зависит от состояния сессии разметки.
pub struct PollingSource {
    rx: watch::Receiver<SourceState>,
    handle: JoinHandle<()>,
}

impl PollingSource {
    pub fn spawn(backend: BackendClient, interval: Duration, surface_errors: bool) -> Self {
        let (tx, rx) = watch::channel(SourceState::default());
        let handle = tokio::task::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match backend.fetch_seats().await {
                    Ok(seats) => {
                        tx.send_modify(|state| {
                            state.seats = seats;
                            state.updated_at = Some(Utc::now());
                            state.last_error = None;
                        });
                    }
                    Err(e) => {
                        // Кратковременный обрыв сети не должен "мигать"
                        // панелью: по умолчанию только предупреждение в лог.
                        warn!("Seat poll failed: {e}");
                        if surface_errors {
                            tx.send_modify(|state| state.last_error = Some(e.to_string()));
                        }
                    }
                }
            }
        });
        Self { rx, handle }
    }
}

impl SeatStateSource for PollingSource {
    fn subscribe(&self) -> watch::Receiver<SourceState> {
        self.rx.clone()
    }
}

impl Drop for PollingSource {
    /// Опрос останавливается вместе с владеющим view - таймер не утекает.
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> BackendClient {
        BackendClient::from_config(&BackendConfig {
            base_url: server.uri(),
            request_timeout_secs: 5,
        })
    }

    fn seat_json() -> serde_json::Value {
        serde_json::json!([{
            "id": "seat-1",
            "status": "occupied",
            "lastStatusChange": "2026-08-07T10:00:00Z"
        }])
    }

    #[tokio::test]
    async fn publishes_snapshots_on_interval() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/seats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(seat_json()))
            .mount(&server)
            .await;

        let source = PollingSource::spawn(backend_for(&server), Duration::from_millis(20), false);
        let mut rx = source.subscribe();
        tokio::time::timeout(Duration::from_secs(2), async {
            while rx.borrow().seats.is_empty() {
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("no snapshot arrived");

        let state = rx.borrow().clone();
        assert_eq!(state.seats.len(), 1);
        assert!(state.updated_at.is_some());
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn failures_keep_last_good_snapshot() {
        let server = MockServer::start().await;
        // Первый опрос успешен, дальше бэкенд падает.
        Mock::given(method("GET"))
            .and(path("/api/seats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(seat_json()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/seats"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = PollingSource::spawn(backend_for(&server), Duration::from_millis(20), true);
        let mut rx = source.subscribe();
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                rx.changed().await.unwrap();
                let state = rx.borrow();
                if state.last_error.is_some() {
                    assert_eq!(state.seats.len(), 1, "last good snapshot must survive");
                    break;
                }
            }
        })
        .await
        .expect("error was never surfaced");
    }
}
