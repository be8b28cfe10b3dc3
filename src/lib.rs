pub mod analytics;
pub mod capture;
pub mod config;
pub mod controllers;
pub mod models;
pub mod services;
pub mod sources;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use capture::CaptureSession;
use config::Config;
use services::BackendClient;
use sources::{PollingSource, RealtimeSource, SeatStateSource};

// Shared state для всего приложения
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    /// Активный источник состояния мест: опрос или push-подписка.
    pub source: Box<dyn SeatStateSource>,
    /// Сессией разметки владеет ровно один активный оператор.
    pub calibration: Mutex<CaptureSession>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let backend = BackendClient::from_config(&config.backend);

        let source: Box<dyn SeatStateSource> = if config.realtime.enabled {
            // Сбой инициализации push-источника фатален: панель без
            // данных не поднимаем.
            Box::new(RealtimeSource::connect(&config.realtime, config.poll.surface_errors).await?)
        } else {
            Box::new(PollingSource::spawn(
                backend.clone(),
                Duration::from_millis(config.poll.interval_ms),
                config.poll.surface_errors,
            ))
        };

        let calibration = Mutex::new(CaptureSession::new(
            config.capture.strategy,
            config.capture.target_seats,
            config.capture.strict_count_match,
        ));

        Ok(Arc::new(Self {
            config,
            backend,
            source,
            calibration,
        }))
    }
}

/// Собирает роутер приложения; слои (trace, cors) навешивает main.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Seat Monitor API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .merge(controllers::streams::root_routes())
        .with_state(state)
}
