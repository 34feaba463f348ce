//! Random layout generation for the grid world.
//!
//! A layout is produced in three passes: independent random obstacles, one
//! clustering pass that reads a frozen copy of the random layout, and
//! endpoint selection in the lower-left and upper-right corner blocks.

use crate::error::{ReverseAStarError, Result};
use crate::grid::{count_surrounding, CellCoord, Grid};
use log::{debug, info, warn};
use rand::Rng;
use std::ops::Range;

/// Cells with more obstacle neighbors than this become obstacles
const FILL_ABOVE: usize = 3;

/// Cells with fewer obstacle neighbors than this become clear
const CLEAR_BELOW: usize = 2;

impl Grid {
    /// Regenerate the layout using the thread-local RNG
    pub fn generate(&mut self, density: f64) -> Result<()> {
        let mut rng = rand::rng();
        self.generate_with_rng(density, &mut rng)
    }

    /// Regenerate the layout from scratch: random obstacles, one smoothing
    /// pass, then source/destination selection.
    ///
    /// When a corner block has no clear cell the whole layout is thrown away
    /// and rebuilt, up to `max_attempts` times. On failure the grid is left
    /// fully clear with no endpoints.
    pub fn generate_with_rng<R: Rng>(&mut self, density: f64, rng: &mut R) -> Result<()> {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        let cell_count = self.cells().len();

        for attempt in 1..=self.max_attempts {
            let obstacles: Vec<bool> = (0..cell_count)
                .map(|_| rng.random::<f64>() < density)
                .collect();
            self.replace_obstacles(&obstacles);
            self.smooth_obstacles();

            let (destination, source) = self.select_endpoints();
            match (source, destination) {
                (Some(source), Some(destination)) => {
                    self.set_endpoints(source, destination)?;
                    info!(
                        "Generated {}x{} grid (density {:.2}) on attempt {}: source ({},{}) destination ({},{})",
                        self.rows(),
                        self.cols(),
                        density,
                        attempt,
                        source.row,
                        source.col,
                        destination.row,
                        destination.col
                    );
                    return Ok(());
                }
                _ => {
                    debug!("Generation attempt {} rejected: no clear cell in a corner block", attempt);
                }
            }
        }

        self.replace_obstacles(&vec![false; cell_count]);
        warn!(
            "Giving up on grid generation after {} attempts at density {:.2}",
            self.max_attempts, density
        );
        Err(ReverseAStarError::GenerationFailure {
            attempts: self.max_attempts,
            density,
        })
    }

    /// One clustering pass over the whole grid.
    ///
    /// Neighbor counts are read from a snapshot taken before the pass, so the
    /// result does not depend on sweep order. Any endpoints are dropped since
    /// the layout underneath them changes.
    pub fn smooth_obstacles(&mut self) {
        let snapshot = self.obstacle_map();
        let was_obstacle = |coord: CellCoord| self.index(coord).is_some_and(|idx| snapshot[idx]);
        let smoothed: Vec<bool> = self
            .cells()
            .iter()
            .map(|cell| {
                let count = count_surrounding(cell.coord, was_obstacle);
                if count > FILL_ABOVE {
                    true
                } else if count < CLEAR_BELOW {
                    false
                } else {
                    cell.obstacle
                }
            })
            .collect();
        self.replace_obstacles(&smoothed);
    }

    /// Pick (destination, source): the least crowded clear cell of the
    /// lower-left block and of the upper-right block. Blocks are
    /// rows/8 by cols/8 cells.
    pub fn select_endpoints(&self) -> (Option<CellCoord>, Option<CellCoord>) {
        let block_rows = self.rows() / 8;
        let block_cols = self.cols() / 8;

        let destination =
            self.least_crowded_clear_cell(self.rows() - block_rows..self.rows(), 0..block_cols);
        let source =
            self.least_crowded_clear_cell(0..block_rows, self.cols() - block_cols..self.cols());

        (destination, source)
    }

    /// Clear cell in the given block with the fewest obstacle neighbors.
    /// Ties go to the first cell in row-major order; `None` when the block is
    /// empty or fully blocked.
    pub fn least_crowded_clear_cell(&self, rows: Range<i32>, cols: Range<i32>) -> Option<CellCoord> {
        let mut best: Option<(CellCoord, usize)> = None;

        for row in rows {
            for col in cols.clone() {
                if self.is_obstacle(row, col) {
                    continue;
                }
                let coord = CellCoord::new(row, col);
                let count = self.obstacle_neighbor_count(coord);
                if best.map_or(true, |(_, best_count)| count < best_count) {
                    best = Some((coord, count));
                }
            }
        }

        best.map(|(coord, _)| coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid_from_rows(pattern: &[&str]) -> Grid {
        let mut obstacles = Vec::new();
        for (row, line) in pattern.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch == '#' {
                    obstacles.push((row as i32, col as i32));
                }
            }
        }
        Grid::with_obstacles(pattern.len() as i32, pattern[0].len() as i32, &obstacles)
    }

    fn rows_of(grid: &Grid) -> Vec<String> {
        (0..grid.rows())
            .map(|row| {
                (0..grid.cols())
                    .map(|col| if grid.is_obstacle(row, col) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_smoothing_reads_frozen_snapshot() {
        let mut grid = grid_from_rows(&["#.#..", "##...", "..#.#", "#.##.", "...#."]);
        grid.smooth_obstacles();
        // Hand-checked against pre-pass neighbor counts; an in-place sweep
        // would instead yield "###..", "####.", ".####", "..###", "...#."
        assert_eq!(rows_of(&grid), vec!["##...", "##...", ".###.", "..##.", "...#."]);
    }

    #[test]
    fn test_smoothing_keeps_two_or_three_neighbor_cells() {
        // Center has exactly 2 obstacle neighbors and stays clear
        let mut grid = grid_from_rows(&["#.#", "...", "..."]);
        grid.smooth_obstacles();
        assert!(!grid.is_obstacle(1, 1));
        // Corners each have 0 obstacle neighbors and clear out
        assert!(!grid.is_obstacle(0, 0));
        assert!(!grid.is_obstacle(0, 2));
    }

    #[test]
    fn test_least_crowded_prefers_first_in_scan_order() {
        let grid = Grid::new(4, 4);
        assert_eq!(
            grid.least_crowded_clear_cell(0..2, 2..4),
            Some(CellCoord::new(0, 2))
        );
        assert_eq!(grid.least_crowded_clear_cell(0..0, 0..4), None);
    }

    #[test]
    fn test_least_crowded_skips_obstacles() {
        let grid = Grid::with_obstacles(3, 3, &[(0, 0), (0, 1)]);
        // (0,2) and (1,2) both have 1 obstacle neighbor; (0,2) scans first
        assert_eq!(
            grid.least_crowded_clear_cell(0..2, 0..3),
            Some(CellCoord::new(0, 2))
        );
    }

    #[test]
    fn test_generate_empty_density_picks_block_corners() {
        let mut grid = Grid::default();
        let mut rng = StdRng::seed_from_u64(7);
        grid.generate_with_rng(0.0, &mut rng).unwrap();

        assert!(grid.obstacle_map().iter().all(|&o| !o));
        assert_eq!(grid.destination(), Some(CellCoord::new(29, 0)));
        assert_eq!(grid.source(), Some(CellCoord::new(0, 29)));
    }

    #[test]
    fn test_generate_full_density_fails_bounded() {
        let mut grid = Grid::default().with_max_attempts(5);
        let mut rng = StdRng::seed_from_u64(1);
        let err = grid.generate_with_rng(1.0, &mut rng).unwrap_err();

        assert_eq!(err, ReverseAStarError::GenerationFailure { attempts: 5, density: 1.0 });
        assert!(grid.source().is_none());
        assert!(grid.destination().is_none());
        assert!(grid.obstacle_map().iter().all(|&o| !o));
    }

    #[test]
    fn test_generate_small_grid_has_no_corner_block() {
        let mut grid = Grid::new(5, 5).with_max_attempts(3);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            grid.generate_with_rng(0.2, &mut rng),
            Err(ReverseAStarError::GenerationFailure { attempts: 3, .. })
        ));
    }

    #[test]
    fn test_generate_clamps_density() {
        let mut grid = Grid::default();
        let mut rng = StdRng::seed_from_u64(11);
        grid.generate_with_rng(-3.0, &mut rng).unwrap();
        assert!(grid.obstacle_map().iter().all(|&o| !o));

        grid.generate_with_rng(f64::NAN, &mut rng).unwrap();
        assert!(grid.source().is_some());
    }

    #[test]
    fn test_generate_endpoints_are_clear() {
        let mut grid = Grid::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            if grid.generate_with_rng(0.35, &mut rng).is_ok() {
                let source = grid.source().unwrap();
                let destination = grid.destination().unwrap();
                assert!(!grid.is_obstacle(source.row, source.col));
                assert!(!grid.is_obstacle(destination.row, destination.col));
                assert!(source.row < 4 && source.col >= 29);
                assert!(destination.row >= 29 && destination.col < 4);
            }
        }
    }
}
