use serde::{Deserialize, Serialize};

/// Точка в координатах поверхности захвата.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Прямоугольная область одного места поверх видеопотока.
/// `x,y` - левый верхний угол, `w,h` - размеры. Единицы измерения
/// (проценты или пиксели) задаются стратегией сессии разметки.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatRegion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl SeatRegion {
    /// Прямоугольник по двум произвольным углам: левый верхний угол -
    /// покомпонентный минимум, размеры - модуль разности.
    pub fn from_corners(a: Point, b: Point) -> Self {
        SeatRegion {
            id: None,
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            w: (a.x - b.x).abs(),
            h: (a.y - b.y).abs(),
        }
    }
}
