use serde::Deserialize;
use std::env;

use crate::capture::CaptureStrategy;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub backend: BackendConfig,
    pub capture: CaptureConfig,
    pub poll: PollConfig,
    pub realtime: RealtimeConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки видео-детектора (внешний backend)
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

// Настройки разметки мест (capture session)
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    pub target_seats: usize,
    pub strategy: CaptureStrategy,
    /// None = взять политику по умолчанию для выбранной стратегии.
    pub strict_count_match: Option<bool>,
}

// Настройки опроса состояния мест
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    pub interval_ms: u64,
    /// Показывать ли ошибки опроса в ответах API. По умолчанию выключено:
    /// кратковременный обрыв сети не должен ронять всю панель.
    pub surface_errors: bool,
}

// Настройки push-источника (realtime-синхронизация)
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    pub enabled: bool,
    pub stream_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "seat_monitor=debug,tower_http=debug".to_string()),
            },
            backend: BackendConfig {
                base_url: env::var("BACKEND_URL")
                    .unwrap_or_else(|_| "http://localhost:5000".to_string()),
                request_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("BACKEND_TIMEOUT_SECS must be a valid number"),
            },
            capture: CaptureConfig {
                target_seats: env::var("TARGET_SEATS")
                    .unwrap_or_else(|_| "6".to_string())
                    .parse()
                    .expect("TARGET_SEATS must be a valid number"),
                strategy: env::var("CAPTURE_STRATEGY")
                    .unwrap_or_else(|_| "drag".to_string())
                    .parse()
                    .expect("CAPTURE_STRATEGY must be 'drag' or 'two_click'"),
                strict_count_match: env::var("STRICT_COUNT_MATCH")
                    .ok()
                    .map(|v| v.parse().expect("STRICT_COUNT_MATCH must be true or false")),
            },
            poll: PollConfig {
                interval_ms: env::var("POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .expect("POLL_INTERVAL_MS must be a valid number"),
                surface_errors: env::var("SURFACE_POLL_ERRORS")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .expect("SURFACE_POLL_ERRORS must be true or false"),
            },
            realtime: RealtimeConfig {
                enabled: env::var("REALTIME_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .expect("REALTIME_ENABLED must be true or false"),
                stream_url: env::var("REALTIME_STREAM_URL").unwrap_or_default(),
            },
        }
    }
}
