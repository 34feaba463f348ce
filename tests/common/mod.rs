#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use reverse_astar::grid::{CellCoord, Grid};
use reverse_astar::layout;
use reverse_astar::pathfinding::{euclidean_distance, ReverseAStar, SearchState};
use std::collections::{HashMap, HashSet};

/// Parse a layout and return a search that has already been reset
pub fn search_on(text: &str) -> ReverseAStar {
    let grid = layout::parse(text).expect("valid layout");
    let mut search = ReverseAStar::new(grid);
    search.reset().expect("layout has both endpoints");
    search
}

/// Generate a grid from a fixed seed
pub fn seeded_grid(rows: i32, cols: i32, density: f64, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = Grid::new(rows, cols);
    grid.generate_with_rng(density, &mut rng)
        .expect("seeded generation should succeed");
    grid
}

/// Step until terminal, panicking if it takes more than `limit` steps
pub fn run_until_terminal(search: &mut ReverseAStar, limit: usize) -> SearchState {
    for _ in 0..limit {
        let state = search.step();
        if state.is_terminal() {
            return state;
        }
    }
    panic!("search did not terminate within {} steps", limit);
}

/// Print the board with overlays, handy when an assertion fails
pub fn visualize(search: &ReverseAStar) -> String {
    let text = layout::render(search.grid(), Some(search));
    println!("\n{}", text);
    text
}

/// Snapshot of every finite cost_so_far on the grid
pub fn cost_snapshot(grid: &Grid) -> HashMap<CellCoord, f64> {
    grid.cells()
        .iter()
        .filter(|cell| cell.cost_so_far.is_finite())
        .map(|cell| (cell.coord, cell.cost_so_far))
        .collect()
}

/// Plain Dijkstra over the same neighbor rules, used as ground truth for path cost
pub fn reference_cost(grid: &Grid, from: CellCoord, to: CellCoord) -> Option<f64> {
    let mut dist: HashMap<CellCoord, f64> = HashMap::new();
    let mut done: HashSet<CellCoord> = HashSet::new();
    dist.insert(from, 0.0);

    loop {
        let (coord, d) = dist
            .iter()
            .filter(|(coord, _)| !done.contains(*coord))
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&coord, &d)| (coord, d))?;

        if coord == to {
            return Some(d);
        }
        done.insert(coord);

        for n in grid.traversable_neighbors(coord) {
            let candidate = d + euclidean_distance(coord, n);
            let entry = dist.entry(n).or_insert(f64::INFINITY);
            if candidate < *entry {
                *entry = candidate;
            }
        }
    }
}
