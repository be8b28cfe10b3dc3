//! analytics.rs
//!
//! Расчёт аналитики занятости по снимку состояния мест.
//!
//! Включает в себя следующую функциональность:
//! - Экстраполяция "незакрытого" времени с последней смены статуса.
//! - Суммарное доступное/занятое время и общая загрузка.
//! - Самое занятое место и сравнение мест между собой.
//! - Пиковые часы за сегодня по истории событий занятости.

use chrono::{DateTime, Local, Timelike, Utc};
use serde::Serialize;

use crate::models::{SeatRuntime, SeatStatus};

/// Добавляет к накопленным минутам время, прошедшее с последней смены
/// статуса. Только для отображения: владеет счётчиками детектор, гейтвей
/// ничего не персистит.
pub fn extrapolate_minutes(seats: &mut [SeatRuntime], now: DateTime<Utc>) {
    for seat in seats {
        let elapsed = ((now - seat.last_status_change).num_milliseconds() as f64 / 60_000.0).max(0.0);
        match seat.status {
            SeatStatus::Available => seat.available_minutes += elapsed,
            SeatStatus::Occupied => seat.occupied_minutes += elapsed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeatComparison {
    pub name: String,
    pub available: f64,
    pub occupied: f64,
}

#[derive(Debug, Serialize)]
pub struct MostOccupied {
    pub name: String,
    pub minutes: f64,
}

#[derive(Debug, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    pub label: String,
    /// Доля "occupied" среди событий этого часа, проценты.
    pub occupancy: f64,
    pub samples: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_available_minutes: f64,
    pub total_occupied_minutes: f64,
    /// Общая загрузка: occupied / (occupied + available), проценты.
    pub occupancy_rate: f64,
    pub most_occupied: Option<MostOccupied>,
    pub seats: Vec<SeatComparison>,
    pub peak_hours: Vec<HourBucket>,
    pub has_data_today: bool,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// 13 -> "1PM", 0 -> "12AM"
fn hour_label(h: u32) -> String {
    match h {
        0 => "12AM".to_string(),
        1..=11 => format!("{h}AM"),
        12 => "12PM".to_string(),
        _ => format!("{}PM", h - 12),
    }
}

/// Пиковые часы за сегодня (системная дата, локальное время): 24 корзины,
/// в каждой - процент событий "occupied" среди всех событий этого часа.
fn peak_hours(seats: &[SeatRuntime], now: DateTime<Local>) -> Vec<HourBucket> {
    let today = now.date_naive();
    let mut occupied = [0u32; 24];
    let mut total = [0u32; 24];

    for seat in seats {
        for entry in &seat.occupancy_history {
            let local = entry.timestamp.with_timezone(&Local);
            if local.date_naive() != today {
                continue;
            }
            let hour = local.hour() as usize;
            total[hour] += 1;
            if entry.status == SeatStatus::Occupied {
                occupied[hour] += 1;
            }
        }
    }

    (0..24)
        .map(|h| HourBucket {
            hour: h as u32,
            label: hour_label(h as u32),
            occupancy: if total[h] > 0 {
                round1(occupied[h] as f64 / total[h] as f64 * 100.0)
            } else {
                0.0
            },
            samples: total[h],
        })
        .collect()
}

pub fn build_report(seats: &[SeatRuntime], now: DateTime<Local>) -> AnalyticsReport {
    let total_available: f64 = seats.iter().map(|s| s.available_minutes).sum();
    let total_occupied: f64 = seats.iter().map(|s| s.occupied_minutes).sum();
    let denom = total_available + total_occupied;
    let occupancy_rate = if denom > 0.0 {
        round1(total_occupied / denom * 100.0)
    } else {
        0.0
    };

    let most_occupied = seats
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.occupied_minutes.total_cmp(&b.occupied_minutes))
        .filter(|(_, s)| s.occupied_minutes > 0.0)
        .map(|(i, s)| MostOccupied {
            name: format!("Seat {}", i + 1),
            minutes: round1(s.occupied_minutes),
        });

    let comparison = seats
        .iter()
        .enumerate()
        .map(|(i, s)| SeatComparison {
            name: format!("Seat {}", i + 1),
            available: round1(s.available_minutes),
            occupied: round1(s.occupied_minutes),
        })
        .collect();

    let peak_hours = peak_hours(seats, now);
    let has_data_today = peak_hours.iter().any(|b| b.samples > 0);

    AnalyticsReport {
        total_available_minutes: round1(total_available),
        total_occupied_minutes: round1(total_occupied),
        occupancy_rate,
        most_occupied,
        seats: comparison,
        peak_hours,
        has_data_today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OccupancyEvent;
    use chrono::TimeZone;

    fn seat(status: SeatStatus, available: f64, occupied: f64) -> SeatRuntime {
        SeatRuntime {
            id: format!("seat-{status:?}-{available}-{occupied}"),
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
            status,
            last_status_change: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
            available_minutes: available,
            occupied_minutes: occupied,
            occupancy_history: Vec::new(),
        }
    }

    #[test]
    fn extrapolation_adds_elapsed_to_current_status_bucket() {
        let mut seats = vec![
            seat(SeatStatus::Occupied, 10.0, 5.0),
            seat(SeatStatus::Available, 2.0, 0.0),
        ];
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 10, 30, 0).unwrap();
        extrapolate_minutes(&mut seats, now);
        assert_eq!(seats[0].occupied_minutes, 35.0);
        assert_eq!(seats[0].available_minutes, 10.0);
        assert_eq!(seats[1].available_minutes, 32.0);
    }

    #[test]
    fn extrapolation_ignores_clock_skew_into_the_past() {
        let mut seats = vec![seat(SeatStatus::Occupied, 0.0, 5.0)];
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0).unwrap();
        extrapolate_minutes(&mut seats, now);
        assert_eq!(seats[0].occupied_minutes, 5.0);
    }

    #[test]
    fn totals_and_rate() {
        let seats = vec![
            seat(SeatStatus::Available, 30.0, 10.0),
            seat(SeatStatus::Occupied, 10.0, 30.0),
        ];
        let report = build_report(&seats, Local::now());
        assert_eq!(report.total_available_minutes, 40.0);
        assert_eq!(report.total_occupied_minutes, 40.0);
        assert_eq!(report.occupancy_rate, 50.0);
        let most = report.most_occupied.unwrap();
        assert_eq!(most.name, "Seat 2");
        assert_eq!(most.minutes, 30.0);
    }

    #[test]
    fn empty_snapshot_yields_zero_rate_and_no_leader() {
        let report = build_report(&[], Local::now());
        assert_eq!(report.occupancy_rate, 0.0);
        assert!(report.most_occupied.is_none());
        assert!(!report.has_data_today);
        assert_eq!(report.peak_hours.len(), 24);
    }

    #[test]
    fn all_idle_snapshot_has_no_most_occupied() {
        let seats = vec![seat(SeatStatus::Available, 30.0, 0.0)];
        let report = build_report(&seats, Local::now());
        assert!(report.most_occupied.is_none());
    }

    #[test]
    fn peak_hours_buckets_todays_events_by_local_hour() {
        let now = Local.with_ymd_and_hms(2026, 8, 7, 18, 0, 0).unwrap();
        let at = |h: u32, status: SeatStatus| OccupancyEvent {
            timestamp: Local
                .with_ymd_and_hms(2026, 8, 7, h, 15, 0)
                .unwrap()
                .with_timezone(&Utc),
            status,
        };
        let mut s = seat(SeatStatus::Occupied, 0.0, 0.0);
        s.occupancy_history = vec![
            at(9, SeatStatus::Occupied),
            at(9, SeatStatus::Available),
            at(14, SeatStatus::Occupied),
            // Вчерашнее событие в корзины не попадает.
            OccupancyEvent {
                timestamp: Local
                    .with_ymd_and_hms(2026, 8, 6, 9, 0, 0)
                    .unwrap()
                    .with_timezone(&Utc),
                status: SeatStatus::Occupied,
            },
        ];

        let report = build_report(&[s], now);
        assert!(report.has_data_today);
        let nine = &report.peak_hours[9];
        assert_eq!(nine.samples, 2);
        assert_eq!(nine.occupancy, 50.0);
        assert_eq!(nine.label, "9AM");
        let fourteen = &report.peak_hours[14];
        assert_eq!(fourteen.samples, 1);
        assert_eq!(fourteen.occupancy, 100.0);
        assert_eq!(fourteen.label, "2PM");
    }

    #[test]
    fn hour_labels_wrap_midnight_and_noon() {
        assert_eq!(hour_label(0), "12AM");
        assert_eq!(hour_label(11), "11AM");
        assert_eq!(hour_label(12), "12PM");
        assert_eq!(hour_label(23), "11PM");
    }
}
