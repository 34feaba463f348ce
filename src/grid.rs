use crate::error::{ReverseAStarError, Result};

/// Default grid dimension (rows and columns)
pub const DEFAULT_SIZE: i32 = 33;

/// Default number of full regenerations before giving up on a layout
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Largest supported row or column count
pub const MAX_DIMENSION: i32 = 4096;

/// A (row, column) coordinate on the grid. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub row: i32,
    pub col: i32,
}

impl CellCoord {
    pub fn new(row: i32, col: i32) -> Self {
        CellCoord { row, col }
    }

    /// Offset this coordinate by (d_row, d_col), saturating at the `i32` range
    pub fn offset(&self, d_row: i32, d_col: i32) -> Self {
        CellCoord::new(self.row.saturating_add(d_row), self.col.saturating_add(d_col))
    }
}

impl From<(i32, i32)> for CellCoord {
    fn from((row, col): (i32, i32)) -> Self {
        CellCoord::new(row, col)
    }
}

/// A grid cell: its obstacle flag plus the search metadata written by the engine
#[derive(Debug, Clone)]
pub struct Cell {
    pub coord: CellCoord,
    pub obstacle: bool,
    /// Cheapest known cost from the search origin; infinite until discovered
    pub cost_so_far: f64,
    /// `cost_so_far` plus the heuristic to the search destination
    pub estimated_total_cost: f64,
    /// Back-pointer into the owning grid, used for path reconstruction
    pub predecessor: Option<CellCoord>,
}

impl Cell {
    pub fn new(coord: CellCoord) -> Self {
        Cell {
            coord,
            obstacle: false,
            cost_so_far: f64::INFINITY,
            estimated_total_cost: f64::INFINITY,
            predecessor: None,
        }
    }

    fn clear_search_state(&mut self) {
        self.cost_so_far = f64::INFINITY;
        self.estimated_total_cost = f64::INFINITY;
        self.predecessor = None;
    }
}

// Cells are identified by coordinate, never by their attribute values
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Eq for Cell {}

/// Neighbor offsets in query order: up, down, left, right
const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Diagonal offsets in query order: up-left, up-right, down-left, down-right
const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Occupancy grid owning every cell plus the source/destination designation.
///
/// `source` is where the search starts (the visual end cell) and
/// `destination` is where it stops (the visual start cell).
#[derive(Debug, Clone)]
pub struct Grid {
    rows: i32,
    cols: i32,
    cells: Vec<Cell>,
    source: Option<CellCoord>,
    destination: Option<CellCoord>,
    pub(crate) max_attempts: u32,
    /// Incremented whenever obstacles or endpoints change
    revision: u64,
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new(DEFAULT_SIZE, DEFAULT_SIZE)
    }
}

impl Grid {
    /// Create a new grid with every cell clear and no endpoints.
    /// Dimensions are clamped to `0..=MAX_DIMENSION`.
    pub fn new(rows: i32, cols: i32) -> Self {
        let rows = rows.clamp(0, MAX_DIMENSION);
        let cols = cols.clamp(0, MAX_DIMENSION);
        let mut cells = Vec::with_capacity(rows as usize * cols as usize);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell::new(CellCoord::new(row, col)));
            }
        }

        Grid {
            rows,
            cols,
            cells,
            source: None,
            destination: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            revision: 0,
        }
    }

    /// Create a grid with specific obstacle cells; out-of-range entries are ignored
    pub fn with_obstacles(rows: i32, cols: i32, obstacles: &[(i32, i32)]) -> Self {
        let mut grid = Self::new(rows, cols);
        for &(row, col) in obstacles {
            if let Some(idx) = grid.index(CellCoord::new(row, col)) {
                grid.cells[idx].obstacle = true;
            }
        }
        grid
    }

    /// Set how many full regenerations `generate` may try before failing
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn in_bounds(&self, coord: CellCoord) -> bool {
        coord.row >= 0 && coord.row < self.rows && coord.col >= 0 && coord.col < self.cols
    }

    pub(crate) fn index(&self, coord: CellCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some((coord.row * self.cols + coord.col) as usize)
        } else {
            None
        }
    }

    fn out_of_range(&self, coord: CellCoord) -> ReverseAStarError {
        ReverseAStarError::OutOfRange {
            row: coord.row,
            col: coord.col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Check whether (row, col) is an obstacle. Off-grid cells count as open.
    pub fn is_obstacle(&self, row: i32, col: i32) -> bool {
        self.index(CellCoord::new(row, col))
            .map(|idx| self.cells[idx].obstacle)
            .unwrap_or(false)
    }

    pub fn cell(&self, coord: CellCoord) -> Result<&Cell> {
        match self.index(coord) {
            Some(idx) => Ok(&self.cells[idx]),
            None => Err(self.out_of_range(coord)),
        }
    }

    pub fn cell_mut(&mut self, coord: CellCoord) -> Result<&mut Cell> {
        match self.index(coord) {
            Some(idx) => Ok(&mut self.cells[idx]),
            None => Err(self.out_of_range(coord)),
        }
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mark or clear an obstacle. Placing an obstacle on an endpoint drops that endpoint.
    pub fn set_obstacle(&mut self, row: i32, col: i32, obstacle: bool) -> Result<()> {
        let coord = CellCoord::new(row, col);
        let idx = self.index(coord).ok_or_else(|| self.out_of_range(coord))?;
        if self.cells[idx].obstacle != obstacle {
            self.cells[idx].obstacle = obstacle;
            if obstacle {
                if self.source == Some(coord) {
                    self.source = None;
                }
                if self.destination == Some(coord) {
                    self.destination = None;
                }
            }
            self.revision += 1;
        }
        Ok(())
    }

    /// Designate the search source (visual end) and destination (visual start)
    pub fn set_endpoints(&mut self, source: CellCoord, destination: CellCoord) -> Result<()> {
        for coord in [source, destination] {
            if self.cell(coord)?.obstacle {
                return Err(ReverseAStarError::BlockedEndpoint {
                    row: coord.row,
                    col: coord.col,
                });
            }
        }
        self.source = Some(source);
        self.destination = Some(destination);
        self.revision += 1;
        Ok(())
    }

    pub fn source(&self) -> Option<CellCoord> {
        self.source
    }

    pub fn destination(&self) -> Option<CellCoord> {
        self.destination
    }

    pub fn source_cell(&self) -> Result<&Cell> {
        let coord = self.source.ok_or(ReverseAStarError::NotGenerated)?;
        self.cell(coord)
    }

    pub fn destination_cell(&self) -> Result<&Cell> {
        let coord = self.destination.ok_or(ReverseAStarError::NotGenerated)?;
        self.cell(coord)
    }

    /// Traversable neighbors of `coord` in the fixed order up, down, left,
    /// right, up-left, up-right, down-left, down-right.
    ///
    /// A diagonal step is only allowed when at least one of the two
    /// orthogonal cells it cuts past is open, so the search never squeezes
    /// between two obstacles touching at a corner.
    pub fn traversable_neighbors(&self, coord: CellCoord) -> Vec<CellCoord> {
        let mut neighbors = Vec::with_capacity(8);

        for (d_row, d_col) in ORTHOGONAL {
            let n = coord.offset(d_row, d_col);
            if self.in_bounds(n) && !self.is_obstacle(n.row, n.col) {
                neighbors.push(n);
            }
        }

        for (d_row, d_col) in DIAGONAL {
            let n = coord.offset(d_row, d_col);
            if !self.in_bounds(n) || self.is_obstacle(n.row, n.col) {
                continue;
            }
            let vertical = coord.offset(d_row, 0);
            let horizontal = coord.offset(0, d_col);
            let vertical_open = !self.is_obstacle(vertical.row, vertical.col);
            let horizontal_open = !self.is_obstacle(horizontal.row, horizontal.col);
            if vertical_open || horizontal_open {
                neighbors.push(n);
            }
        }

        neighbors
    }

    /// Count obstacle cells among the 8 surrounding cells
    pub fn obstacle_neighbor_count(&self, coord: CellCoord) -> usize {
        count_surrounding(coord, |n| self.is_obstacle(n.row, n.col))
    }

    /// Reset every cell's cost fields and predecessor
    pub fn clear_search_state(&mut self) {
        for cell in &mut self.cells {
            cell.clear_search_state();
        }
    }

    /// Overwrite all obstacle flags at once and drop the endpoints
    pub(crate) fn replace_obstacles(&mut self, obstacles: &[bool]) {
        for (cell, &obstacle) in self.cells.iter_mut().zip(obstacles) {
            cell.obstacle = obstacle;
            cell.clear_search_state();
        }
        self.source = None;
        self.destination = None;
        self.revision += 1;
    }

    /// Snapshot of all obstacle flags in row-major order
    pub fn obstacle_map(&self) -> Vec<bool> {
        self.cells.iter().map(|cell| cell.obstacle).collect()
    }
}

/// Count the cells around `coord` for which `is_obstacle` holds
pub(crate) fn count_surrounding(coord: CellCoord, is_obstacle: impl Fn(CellCoord) -> bool) -> usize {
    ORTHOGONAL
        .iter()
        .chain(DIAGONAL.iter())
        .filter(|&&(d_row, d_col)| is_obstacle(coord.offset(d_row, d_col)))
        .count()
}
