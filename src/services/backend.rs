//! backend.rs
//!
//! Клиент внешнего видео-детектора. Гейтвей не декодирует видео и не
//! повторяет детекцию - он ходит только в документированные endpoints:
//! `/api/seats`, `/status`, `/save_seats`, `/capture_background`,
//! `/video_feed`, `/download_report`.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::BackendConfig;
use crate::models::{SeatRegion, SeatRuntime, SeatState};

/// Ошибки границы с детектором.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("detection backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("detection backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Клиент для взаимодействия с API детектора.
#[derive(Clone)]
pub struct BackendClient {
    /// Базовый URL детектора.
    base_url: String,
    /// Асинхронный HTTP-клиент для JSON-вызовов.
    http: reqwest::Client,
    /// Отдельный клиент для потоков (MJPEG, отчёт): общий таймаут убил бы
    /// бесконечный поток, поэтому здесь ограничена только установка
    /// соединения.
    stream: reqwest::Client,
}

impl BackendClient {
    /// Создает и конфигурирует клиент на основе настроек приложения.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
            stream: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(BackendError::Status { status, body })
    }

    /// GET /api/seats - конфигурация мест, обогащённая аналитикой.
    pub async fn fetch_seats(&self) -> Result<Vec<SeatRuntime>, BackendError> {
        let resp = self
            .http
            .get(format!("{}/api/seats", self.base_url))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// GET /status - сырые runtime-состояния (формат старой панели).
    pub async fn fetch_status(&self) -> Result<Vec<SeatState>, BackendError> {
        let resp = self
            .http
            .get(format!("{}/status", self.base_url))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// POST /save_seats - единственная точка записи схемы мест.
    pub async fn save_layout(&self, regions: &[SeatRegion]) -> Result<(), BackendError> {
        let resp = self
            .http
            .post(format!("{}/save_seats", self.base_url))
            .json(regions)
            .send()
            .await?;
        Self::check(resp).await?;
        info!("Saved layout of {} seats to detection backend", regions.len());
        Ok(())
    }

    /// POST /capture_background - пересъёмка фона детектора. Сбрасывает
    /// статусы и таймеры всех мест на стороне детектора.
    pub async fn capture_background(&self) -> Result<(), BackendError> {
        let resp = self
            .http
            .post(format!("{}/capture_background", self.base_url))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// GET /video_feed - живой MJPEG-поток, проксируется как есть.
    pub async fn video_feed(&self) -> Result<reqwest::Response, BackendError> {
        let resp = self
            .stream
            .get(format!("{}/video_feed", self.base_url))
            .send()
            .await?;
        Self::check(resp).await
    }

    /// GET /download_report - CSV-отчёт по занятости.
    pub async fn download_report(&self) -> Result<reqwest::Response, BackendError> {
        let resp = self
            .stream
            .get(format!("{}/download_report", self.base_url))
            .send()
            .await?;
        Self::check(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::from_config(&BackendConfig {
            base_url: server.uri(),
            request_timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn fetch_seats_parses_backend_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/seats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": "seat-1",
                    "x": 10.0, "y": 10.0, "w": 20.0, "h": 20.0,
                    "status": "available",
                    "lastStatusChange": "2026-08-07T10:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let seats = client_for(&server).fetch_seats().await.unwrap();
        assert_eq!(seats.len(), 1);
        assert_eq!(seats[0].id, "seat-1");
    }

    #[tokio::test]
    async fn save_layout_posts_region_array() {
        let server = MockServer::start().await;
        let regions = vec![SeatRegion {
            id: Some("seat-a".to_string()),
            x: 1.0,
            y: 2.0,
            w: 10.0,
            h: 10.0,
        }];
        Mock::given(method("POST"))
            .and(path("/save_seats"))
            .and(body_json(&regions))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "Saved"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).save_layout(&regions).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_is_reported_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/save_seats"))
            .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
            .mount(&server)
            .await;

        let err = client_for(&server).save_layout(&[]).await.unwrap_err();
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "disk full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
