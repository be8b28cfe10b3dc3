pub mod region;
pub mod seat;

pub use region::{Point, SeatRegion};
pub use seat::{ChangeTime, OccupancyEvent, SeatRuntime, SeatState, SeatStatus};
