//! Incremental reverse A* over the grid world.
//!
//! The search starts at the grid's source (the visual end cell) and runs
//! toward its destination (the visual start cell), one expansion per
//! [`ReverseAStar::step`] call. Reading the predecessor chain from the
//! destination therefore walks the path from visual start to visual end.

use crate::error::Result;
use crate::grid::{CellCoord, Grid};
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Lifecycle of a search run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// `reset` has not succeeded yet
    Uninitialized,
    /// Frontier holds only the source, nothing expanded
    Ready,
    Running,
    /// The destination was expanded
    Done,
    /// The frontier ran dry before reaching the destination
    Unsolvable,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchState::Done | SearchState::Unsolvable)
    }
}

/// Straight-line distance between two cell centers
pub fn euclidean_distance(a: CellCoord, b: CellCoord) -> f64 {
    let d_row = (a.row - b.row) as f64;
    let d_col = (a.col - b.col) as f64;
    (d_row * d_row + d_col * d_col).sqrt()
}

/// Heap entry for the open set
#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    coord: CellCoord,
    estimated_total_cost: f64,
    /// Insertion sequence of the cell into the frontier
    seq: u64,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .estimated_total_cost
            .total_cmp(&self.estimated_total_cost)
            // Tie-breaker: earliest inserted cell wins
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Cells discovered but not yet expanded.
///
/// Membership is keyed by coordinate; ordering comes from a min-heap on
/// (estimated total cost, insertion sequence) with lazy removal of entries
/// that were superseded by a cheaper cost.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    members: HashMap<CellCoord, u64>,
    heap: BinaryHeap<FrontierEntry>,
    next_seq: u64,
}

impl Frontier {
    pub fn contains(&self, coord: &CellCoord) -> bool {
        self.members.contains_key(coord)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Frontier cells in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &CellCoord> + '_ {
        self.members.keys()
    }

    fn clear(&mut self) {
        self.members.clear();
        self.heap.clear();
        self.next_seq = 0;
    }

    /// Add a new member, or re-key an existing one at its original position
    fn push(&mut self, coord: CellCoord, estimated_total_cost: f64) {
        let seq = match self.members.get(&coord) {
            Some(&seq) => seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.members.insert(coord, seq);
                seq
            }
        };
        self.heap.push(FrontierEntry {
            coord,
            estimated_total_cost,
            seq,
        });
    }

    /// Remove and return the member with the lowest estimated total cost
    fn pop_min(&mut self, grid: &Grid) -> Option<CellCoord> {
        while let Some(entry) = self.heap.pop() {
            if self.members.get(&entry.coord) != Some(&entry.seq) {
                continue;
            }
            let current_cost = grid
                .cell(entry.coord)
                .map(|cell| cell.estimated_total_cost)
                .unwrap_or(f64::INFINITY);
            if entry.estimated_total_cost != current_cost {
                // Superseded by a cheaper entry for the same cell
                continue;
            }
            self.members.remove(&entry.coord);
            return Some(entry.coord);
        }
        None
    }
}

/// Reverse A* search bound to the grid it owns.
///
/// Driven externally: call [`reset`](Self::reset) once the grid has
/// endpoints, then [`step`](Self::step) until [`state`](Self::state) is
/// terminal, reading the inspection accessors between steps.
#[derive(Debug, Clone)]
pub struct ReverseAStar {
    grid: Grid,
    frontier: Frontier,
    visited: HashSet<CellCoord>,
    current: Option<CellCoord>,
    origin: Option<CellCoord>,
    destination: Option<CellCoord>,
    state: SearchState,
    steps_taken: usize,
    /// Grid revision captured at the last reset
    revision: u64,
}

impl ReverseAStar {
    pub fn new(grid: Grid) -> Self {
        let revision = grid.revision();
        ReverseAStar {
            grid,
            frontier: Frontier::default(),
            visited: HashSet::new(),
            current: None,
            origin: None,
            destination: None,
            state: SearchState::Uninitialized,
            steps_taken: 0,
            revision,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable access to the bound grid. Call `reset` after changing it.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Discard all search state and start over from the grid's current
    /// source and destination.
    pub fn reset(&mut self) -> Result<()> {
        self.frontier.clear();
        self.visited.clear();
        self.current = None;
        self.steps_taken = 0;
        self.state = SearchState::Uninitialized;
        self.grid.clear_search_state();

        let origin = self.grid.source_cell()?.coord;
        let destination = self.grid.destination_cell()?.coord;

        let estimate = euclidean_distance(origin, destination);
        let cell = self.grid.cell_mut(origin)?;
        cell.cost_so_far = 0.0;
        cell.estimated_total_cost = estimate;
        self.frontier.push(origin, estimate);

        self.origin = Some(origin);
        self.destination = Some(destination);
        self.revision = self.grid.revision();
        self.state = SearchState::Ready;

        debug!(
            "Search reset: origin ({},{}) destination ({},{}), estimate {:.3}",
            origin.row, origin.col, destination.row, destination.col, estimate
        );
        Ok(())
    }

    /// Expand one cell.
    ///
    /// No-op once the search is `Done` or `Unsolvable`.
    ///
    /// # Panics
    ///
    /// Panics when called before a successful [`reset`](Self::reset), or
    /// when the grid changed since the last one.
    pub fn step(&mut self) -> SearchState {
        assert!(
            self.state != SearchState::Uninitialized,
            "ReverseAStar::step called before a successful reset"
        );
        assert!(
            !self.is_stale(),
            "ReverseAStar::step called on a grid that changed since the last reset"
        );
        if self.state.is_terminal() {
            return self.state;
        }
        let next = self.frontier.pop_min(&self.grid);
        let (Some(destination), Some(current)) = (self.destination, next) else {
            self.state = SearchState::Unsolvable;
            debug!("Frontier exhausted after {} steps: unsolvable", self.steps_taken);
            return self.state;
        };
        self.visited.insert(current);
        self.current = Some(current);
        self.steps_taken += 1;

        if current == destination {
            self.state = SearchState::Done;
            debug!("Reached destination after {} steps", self.steps_taken);
        } else {
            self.state = SearchState::Running;
        }

        // Neighbors are relaxed even on the step that reaches the destination
        self.expand(current, destination);
        self.state
    }

    fn expand(&mut self, current: CellCoord, destination: CellCoord) {
        let current_cost = match self.grid.cell(current) {
            Ok(cell) => cell.cost_so_far,
            Err(_) => return,
        };

        trace!(
            "Expanding ({},{}) cost {:.3}, frontier {} visited {}",
            current.row,
            current.col,
            current_cost,
            self.frontier.len(),
            self.visited.len()
        );

        for neighbor in self.grid.traversable_neighbors(current) {
            let tentative = current_cost + euclidean_distance(current, neighbor);
            let in_frontier = self.frontier.contains(&neighbor);
            let Ok(cell) = self.grid.cell_mut(neighbor) else {
                continue;
            };

            if self.visited.contains(&neighbor) && tentative >= cell.cost_so_far {
                continue;
            }
            if in_frontier && tentative >= cell.cost_so_far {
                continue;
            }

            let estimate = tentative + euclidean_distance(neighbor, destination);
            cell.predecessor = Some(current);
            cell.cost_so_far = tentative;
            cell.estimated_total_cost = estimate;

            // A finalized cell that improves goes back to the open set
            self.visited.remove(&neighbor);
            self.frontier.push(neighbor, estimate);
        }
    }

    /// Step until the search is terminal or `max_steps` expansions were made.
    /// Same precondition as [`step`](Self::step).
    pub fn run_to_completion(&mut self, max_steps: Option<usize>) -> SearchState {
        let mut taken = 0;
        while !self.state.is_terminal() {
            if max_steps.is_some_and(|max| taken >= max) {
                break;
            }
            self.step();
            taken += 1;
        }
        self.state
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn visited(&self) -> &HashSet<CellCoord> {
        &self.visited
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Most recently expanded cell
    pub fn current(&self) -> Option<CellCoord> {
        self.current
    }

    pub fn is_done(&self) -> bool {
        self.state == SearchState::Done
    }

    /// False only once the frontier has run dry without reaching the destination
    pub fn is_solvable(&self) -> bool {
        self.state != SearchState::Unsolvable
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    pub fn origin(&self) -> Option<CellCoord> {
        self.origin
    }

    pub fn destination(&self) -> Option<CellCoord> {
        self.destination
    }

    /// Whether the grid changed since the last reset
    pub fn is_stale(&self) -> bool {
        self.grid.revision() != self.revision
    }

    /// Predecessor chain from the current cell back to the origin
    pub fn path(&self) -> Vec<CellCoord> {
        match self.current {
            Some(current) => reconstruct_path(&self.grid, current),
            None => Vec::new(),
        }
    }
}

/// Walk predecessor links from `from` until a cell has none.
///
/// The walk is capped at the number of cells in the grid.
pub fn reconstruct_path(grid: &Grid, from: CellCoord) -> Vec<CellCoord> {
    let mut path = Vec::new();
    let max_len = grid.cells().len();
    let mut next = Some(from);

    while let Some(coord) = next {
        if path.len() >= max_len {
            break;
        }
        path.push(coord);
        next = grid.cell(coord).ok().and_then(|cell| cell.predecessor);
    }

    path
}

/// Sum of Euclidean step lengths along a path
pub fn path_cost(path: &[CellCoord]) -> f64 {
    path.windows(2)
        .map(|pair| euclidean_distance(pair[0], pair[1]))
        .sum()
}

/// Format path for display
pub fn format_path(path: &[CellCoord]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    path.iter()
        .map(|coord| format!("({},{})", coord.row, coord.col))
        .collect::<Vec<_>>()
        .join(" -> ")
}
