//! Text layouts for grids and search overlays.
//!
//! Glyphs:
//! - `■`: obstacle
//! - `□`: clear cell
//! - `s`: source (search origin, visual end)
//! - `d`: destination (search goal, visual start)
//! - `o`: frontier cell
//! - `x`: visited cell
//! - `*`: cell on the current path
//!
//! Overlay glyphs (`o`, `x`, `*`) parse back as clear cells.

use crate::error::{ReverseAStarError, Result};
use crate::grid::{CellCoord, Grid};
use crate::pathfinding::ReverseAStar;
use std::collections::HashSet;

pub const OBSTACLE: char = '■';
pub const CLEAR: char = '□';
pub const SOURCE: char = 's';
pub const DESTINATION: char = 'd';
pub const FRONTIER: char = 'o';
pub const VISITED: char = 'x';
pub const PATH: char = '*';

const VALID_CHARS: [char; 7] = [OBSTACLE, CLEAR, SOURCE, DESTINATION, FRONTIER, VISITED, PATH];

/// Render a grid, optionally overlaid with a search's frontier, visited set and path
pub fn render(grid: &Grid, search: Option<&ReverseAStar>) -> String {
    let path: HashSet<CellCoord> = search
        .map(|s| s.path().into_iter().collect())
        .unwrap_or_default();

    let mut result = String::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let coord = CellCoord::new(row, col);
            let symbol = if grid.source() == Some(coord) {
                SOURCE
            } else if grid.destination() == Some(coord) {
                DESTINATION
            } else if grid.is_obstacle(row, col) {
                OBSTACLE
            } else if path.contains(&coord) {
                PATH
            } else if search.is_some_and(|s| s.frontier().contains(&coord)) {
                FRONTIER
            } else if search.is_some_and(|s| s.visited().contains(&coord)) {
                VISITED
            } else {
                CLEAR
            };
            result.push(symbol);
        }
        result.push('\n');
    }

    result
}

/// Parse a layout back into a grid.
///
/// Blank lines are skipped. Endpoints are set only when both `s` and `d`
/// appear exactly once.
pub fn parse(text: &str) -> Result<Grid> {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(ReverseAStarError::Layout("no grid rows found".to_string()));
    }

    let cols = lines[0].chars().count();
    let mut obstacles = Vec::new();
    let mut source = None;
    let mut destination = None;

    for (row, line) in lines.iter().enumerate() {
        if line.chars().count() != cols {
            return Err(ReverseAStarError::Layout(format!(
                "row {} has {} cells, expected {}",
                row,
                line.chars().count(),
                cols
            )));
        }

        for (col, ch) in line.chars().enumerate() {
            let coord = CellCoord::new(row as i32, col as i32);
            match ch {
                OBSTACLE => obstacles.push((coord.row, coord.col)),
                SOURCE => {
                    if source.replace(coord).is_some() {
                        return Err(ReverseAStarError::Layout("more than one source".to_string()));
                    }
                }
                DESTINATION => {
                    if destination.replace(coord).is_some() {
                        return Err(ReverseAStarError::Layout(
                            "more than one destination".to_string(),
                        ));
                    }
                }
                c if VALID_CHARS.contains(&c) => {}
                c => {
                    return Err(ReverseAStarError::Layout(format!(
                        "unknown glyph '{}' at ({}, {})",
                        c, row, col
                    )));
                }
            }
        }
    }

    let mut grid = Grid::with_obstacles(lines.len() as i32, cols as i32, &obstacles);
    if let (Some(source), Some(destination)) = (source, destination) {
        grid.set_endpoints(source, destination)?;
    }
    Ok(grid)
}
