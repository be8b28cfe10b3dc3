use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Статус места, как его отдаёт детектор.
// Детектор пишет статус то с большой, то с маленькой буквы,
// поэтому парсим без учёта регистра.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    #[default]
    Available,
    Occupied,
}

impl<'de> Deserialize<'de> for SeatStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_lowercase().as_str() {
            "available" => Ok(SeatStatus::Available),
            "occupied" => Ok(SeatStatus::Occupied),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["available", "occupied"],
            )),
        }
    }
}

/// Одна запись истории занятости места.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEvent {
    pub timestamp: DateTime<Utc>,
    pub status: SeatStatus,
}

/// Полное состояние места из `GET /api/seats`: регион разметки плюс
/// накопленная детектором аналитика. Гейтвей это состояние только читает,
/// владеет им детектор.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRuntime {
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
    #[serde(rename = "lastStatusChange")]
    pub last_status_change: DateTime<Utc>,
    #[serde(rename = "availableMinutes", default)]
    pub available_minutes: f64,
    #[serde(rename = "occupiedMinutes", default)]
    pub occupied_minutes: f64,
    #[serde(rename = "occupancyHistory", default)]
    pub occupancy_history: Vec<OccupancyEvent>,
}

/// Сырое runtime-состояние из `GET /status` (старый формат детектора).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatState {
    pub id: i64,
    pub status: SeatStatus,
    /// Unix-время последней смены статуса, секунды.
    pub last_change_time: f64,
}

/// Отметка времени из push-источника. Серверный timestamp приходит как
/// объект `{"seconds": ...}`; пока сервер его не присвоил, документ несёт
/// локальные миллисекунды эпохи. Порядок вариантов важен: сначала
/// проверяется серверная форма, затем локальный fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangeTime {
    Resolved { seconds: i64 },
    Pending(i64),
}

impl ChangeTime {
    pub fn is_resolved(self) -> bool {
        matches!(self, ChangeTime::Resolved { .. })
    }

    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            ChangeTime::Resolved { seconds } => {
                Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
            }
            ChangeTime::Pending(millis) => {
                Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_any_case() {
        let s: SeatStatus = serde_json::from_str("\"Available\"").unwrap();
        assert_eq!(s, SeatStatus::Available);
        let s: SeatStatus = serde_json::from_str("\"occupied\"").unwrap();
        assert_eq!(s, SeatStatus::Occupied);
        assert!(serde_json::from_str::<SeatStatus>("\"waiting\"").is_err());
    }

    #[test]
    fn change_time_prefers_server_shape() {
        let t: ChangeTime = serde_json::from_str(r#"{"seconds": 1712000000}"#).unwrap();
        assert_eq!(t, ChangeTime::Resolved { seconds: 1712000000 });
        assert!(t.is_resolved());
        assert_eq!(t.to_utc().timestamp(), 1712000000);
    }

    #[test]
    fn change_time_falls_back_to_local_millis() {
        let t: ChangeTime = serde_json::from_str("1712000000123").unwrap();
        assert_eq!(t, ChangeTime::Pending(1712000000123));
        assert!(!t.is_resolved());
        assert_eq!(t.to_utc().timestamp_millis(), 1712000000123);
    }

    #[test]
    fn seat_runtime_deserializes_backend_payload() {
        let json = r#"{
            "id": "seat-1712000000",
            "x": 10.0, "y": 20.0, "w": 15.0, "h": 12.0,
            "status": "occupied",
            "lastStatusChange": "2026-08-07T10:00:00Z",
            "availableMinutes": 42.5,
            "occupiedMinutes": 17.25,
            "occupancyHistory": [
                {"timestamp": "2026-08-07T09:30:00Z", "status": "occupied"}
            ]
        }"#;
        let seat: SeatRuntime = serde_json::from_str(json).unwrap();
        assert_eq!(seat.status, SeatStatus::Occupied);
        assert_eq!(seat.occupancy_history.len(), 1);
        assert_eq!(seat.available_minutes, 42.5);
    }

    #[test]
    fn seat_runtime_defaults_missing_analytics_fields() {
        // Старые конфиги мест приходят без аналитических полей.
        let json = r#"{"id": "s1", "lastStatusChange": "2026-08-07T10:00:00Z"}"#;
        let seat: SeatRuntime = serde_json::from_str(json).unwrap();
        assert_eq!(seat.status, SeatStatus::Available);
        assert_eq!(seat.occupied_minutes, 0.0);
        assert!(seat.occupancy_history.is_empty());
    }
}
