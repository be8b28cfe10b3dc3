//! capture.rs
//!
//! Этот модуль реализует движок разметки мест: превращает последовательность
//! pointer-событий поверх видеоповерхности в ограниченный набор
//! нормализованных прямоугольников и отдаёт готовую конфигурацию на
//! сохранение.
//!
//! Ключевые компоненты:
//! 1.  **SurfaceGeometry / Units**: пересчёт координат окна в координаты
//!     поверхности. Геометрия передаётся с каждым событием и никогда не
//!     кешируется: контейнер видео может менять размер в любой момент.
//! 2.  **CaptureStrategy**: два протокола взаимодействия - протяжка
//!     прямоугольника (проценты) и разметка в два клика (пиксели).
//! 3.  **CaptureSession**: конечный автомат сессии разметки
//!     (Idle → Pending/Drawing → Idle) с лимитом количества мест и
//!     политикой сохранения strict_count_match.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Point, SeatRegion};

/// Текущий bounding box поверхности захвата в координатах окна.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SurfaceGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Единицы измерения координат региона.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Проценты от размеров поверхности, 0-100.
    Percent,
    /// Пиксели относительно левого верхнего угла поверхности.
    Pixel,
}

impl Units {
    /// Минимальный размер стороны: прямоугольники меньше считаются
    /// случайным кликом и молча отбрасываются.
    pub fn min_extent(self) -> f64 {
        match self {
            Units::Percent => 1.0,
            Units::Pixel => 5.0,
        }
    }

    /// Переводит координаты окна в координаты поверхности.
    pub fn to_surface(self, client: Point, surface: &SurfaceGeometry) -> Point {
        let x = client.x - surface.left;
        let y = client.y - surface.top;
        match self {
            Units::Pixel => Point { x, y },
            Units::Percent => Point {
                x: x / surface.width * 100.0,
                y: y / surface.height * 100.0,
            },
        }
    }
}

/// Протокол взаимодействия оператора с поверхностью.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStrategy {
    /// Зажать кнопку, протянуть, отпустить.
    DragRectangle,
    /// Первый клик - начало, второй - фиксация, правый клик - отмена.
    TwoClick,
}

impl CaptureStrategy {
    pub fn default_units(self) -> Units {
        match self {
            CaptureStrategy::DragRectangle => Units::Percent,
            CaptureStrategy::TwoClick => Units::Pixel,
        }
    }

    /// Политика сохранения по умолчанию: two-click вариант требует точного
    /// совпадения с целевым количеством, drag-вариант сохраняет любой
    /// непустой набор.
    pub fn default_strict(self) -> bool {
        matches!(self, CaptureStrategy::TwoClick)
    }
}

impl std::str::FromStr for CaptureStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drag" | "drag_rectangle" => Ok(CaptureStrategy::DragRectangle),
            "two_click" => Ok(CaptureStrategy::TwoClick),
            other => Err(format!("unknown capture strategy: {other}")),
        }
    }
}

/// Режим сессии.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// **Viewing**: пассивный просмотр, pointer-события игнорируются.
    Viewing,
    /// **Placing**: активная разметка.
    Placing,
}

/// Состояние текущего (незакоммиченного) прямоугольника.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DrawState {
    /// Ничего не рисуется.
    Idle,
    /// Two-click: первый клик сделан, ждём второй.
    Pending { start: Point },
    /// Drag: кнопка зажата, идёт протяжка.
    Drawing { start: Point },
}

/// Результат обработки одного pointer-события.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// Событие не относится к текущему состоянию сессии.
    Ignored,
    /// Начат новый прямоугольник.
    Started,
    /// Обновлён live-превью.
    Preview,
    /// Прямоугольник зафиксирован; `done` - достигнут ли целевой счётчик.
    Committed { count: usize, done: bool },
    /// Прямоугольник меньше минимального размера, молча отброшен.
    Discarded,
    /// Незавершённый прямоугольник отменён.
    Cancelled,
}

/// Ошибки движка разметки.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("maximum number of seats reached ({target})")]
    LimitReached { target: usize },
    #[error("layout requires exactly {target} seats, {committed} of {target} drawn")]
    CountMismatch { committed: usize, target: usize },
    #[error("no seats drawn yet")]
    EmptyLayout,
}

/// Сессия разметки. Владеет ей ровно один активный view - блокировок
/// внутри нет.
#[derive(Debug)]
pub struct CaptureSession {
    strategy: CaptureStrategy,
    units: Units,
    target_count: usize,
    strict_count_match: bool,
    committed: Vec<SeatRegion>,
    draw: DrawState,
    preview: Option<SeatRegion>,
    mode: Mode,
}

impl CaptureSession {
    pub fn new(strategy: CaptureStrategy, target_count: usize, strict: Option<bool>) -> Self {
        CaptureSession {
            strategy,
            units: strategy.default_units(),
            target_count,
            strict_count_match: strict.unwrap_or_else(|| strategy.default_strict()),
            committed: Vec::new(),
            draw: DrawState::Idle,
            preview: None,
            mode: Mode::Viewing,
        }
    }

    pub fn strategy(&self) -> CaptureStrategy {
        self.strategy
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn strict_count_match(&self) -> bool {
        self.strict_count_match
    }

    pub fn committed(&self) -> &[SeatRegion] {
        &self.committed
    }

    pub fn preview(&self) -> Option<&SeatRegion> {
        self.preview.as_ref()
    }

    /// Переход Viewing → Placing. Рабочий набор очищается: разметка
    /// всегда начинается с чистого листа.
    pub fn begin_placing(&mut self) {
        self.committed.clear();
        self.draw = DrawState::Idle;
        self.preview = None;
        self.mode = Mode::Placing;
    }

    /// Нажатие основной кнопки.
    pub fn pointer_down(
        &mut self,
        client: Point,
        surface: &SurfaceGeometry,
    ) -> Result<PointerOutcome, CaptureError> {
        if self.mode != Mode::Placing {
            return Ok(PointerOutcome::Ignored);
        }
        let p = self.units.to_surface(client, surface);

        match self.strategy {
            CaptureStrategy::DragRectangle => {
                if self.committed.len() >= self.target_count {
                    return Err(CaptureError::LimitReached {
                        target: self.target_count,
                    });
                }
                self.draw = DrawState::Drawing { start: p };
                self.preview = Some(SeatRegion::from_corners(p, p));
                Ok(PointerOutcome::Started)
            }
            CaptureStrategy::TwoClick => match self.draw {
                DrawState::Idle => {
                    if self.committed.len() >= self.target_count {
                        return Err(CaptureError::LimitReached {
                            target: self.target_count,
                        });
                    }
                    self.draw = DrawState::Pending { start: p };
                    self.preview = Some(SeatRegion::from_corners(p, p));
                    Ok(PointerOutcome::Started)
                }
                DrawState::Pending { start } => {
                    self.draw = DrawState::Idle;
                    self.preview = None;
                    self.try_commit(start, p)
                }
                DrawState::Drawing { .. } => Ok(PointerOutcome::Ignored),
            },
        }
    }

    /// Перемещение указателя: обновляет live-превью, пока прямоугольник
    /// не завершён.
    pub fn pointer_move(&mut self, client: Point, surface: &SurfaceGeometry) -> PointerOutcome {
        let (DrawState::Pending { start } | DrawState::Drawing { start }) = self.draw else {
            return PointerOutcome::Ignored;
        };
        let p = self.units.to_surface(client, surface);
        self.preview = Some(SeatRegion::from_corners(start, p));
        PointerOutcome::Preview
    }

    /// Отпускание основной кнопки (значимо только для drag-протокола).
    pub fn pointer_up(
        &mut self,
        client: Point,
        surface: &SurfaceGeometry,
    ) -> Result<PointerOutcome, CaptureError> {
        let DrawState::Drawing { start } = self.draw else {
            return Ok(PointerOutcome::Ignored);
        };
        self.draw = DrawState::Idle;
        self.preview = None;
        let p = self.units.to_surface(client, surface);
        self.try_commit(start, p)
    }

    /// Правый клик: отмена незавершённого прямоугольника.
    pub fn pointer_cancel(&mut self) -> PointerOutcome {
        self.abandon_draw()
    }

    /// Указатель покинул поверхность захвата.
    pub fn pointer_leave(&mut self) -> PointerOutcome {
        self.abandon_draw()
    }

    fn abandon_draw(&mut self) -> PointerOutcome {
        if self.draw == DrawState::Idle {
            return PointerOutcome::Ignored;
        }
        self.draw = DrawState::Idle;
        self.preview = None;
        PointerOutcome::Cancelled
    }

    fn try_commit(&mut self, a: Point, b: Point) -> Result<PointerOutcome, CaptureError> {
        let mut region = SeatRegion::from_corners(a, b);
        let min = self.units.min_extent();
        if region.w <= min || region.h <= min {
            return Ok(PointerOutcome::Discarded);
        }
        if self.committed.len() >= self.target_count {
            return Err(CaptureError::LimitReached {
                target: self.target_count,
            });
        }
        region.id = Some(format!("seat-{}", Uuid::new_v4()));
        self.committed.push(region);
        let done = self.committed.len() == self.target_count;
        if done {
            // Целевой счётчик достигнут - режим разметки завершается сам.
            self.mode = Mode::Viewing;
        }
        Ok(PointerOutcome::Committed {
            count: self.committed.len(),
            done,
        })
    }

    /// Атомарно очищает зафиксированные регионы, незавершённый
    /// прямоугольник и превью; режим разметки завершается.
    pub fn reset(&mut self) {
        self.committed.clear();
        self.draw = DrawState::Idle;
        self.preview = None;
        self.mode = Mode::Viewing;
    }

    /// Валидация перед сохранением. Состояние сессии не меняется:
    /// при неудачной отправке оператор повторяет сохранение без
    /// перерисовки.
    pub fn begin_save(&self) -> Result<&[SeatRegion], CaptureError> {
        if self.committed.is_empty() {
            return Err(CaptureError::EmptyLayout);
        }
        if self.strict_count_match && self.committed.len() != self.target_count {
            return Err(CaptureError::CountMismatch {
                committed: self.committed.len(),
                target: self.target_count,
            });
        }
        Ok(&self.committed)
    }

    /// Вызывается только после того, как backend принял конфигурацию:
    /// зафиксированный набор становится действующей схемой мест, режим
    /// разметки завершается.
    pub fn confirm_saved(&mut self) {
        self.draw = DrawState::Idle;
        self.preview = None;
        self.mode = Mode::Viewing;
    }
}
