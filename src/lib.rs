pub mod action_log;
pub mod config;
pub mod error;
pub mod generation;
pub mod grid;
pub mod layout;
pub mod pathfinding;

pub use config::Config;
pub use error::{ReverseAStarError, Result};
pub use grid::{Cell, CellCoord, Grid};
pub use pathfinding::{ReverseAStar, SearchState};
