mod common;

use common::{
    cost_snapshot, reference_cost, run_until_terminal, search_on, seeded_grid, visualize,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reverse_astar::grid::{CellCoord, Grid};
use reverse_astar::pathfinding::{path_cost, reconstruct_path, ReverseAStar, SearchState};
use std::collections::HashSet;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {:.6}, got {:.6}",
        expected,
        actual
    );
}

#[test]
fn test_small_diagonal_search() {
    let mut search = search_on("d□□\n□□□\n□□s\n");
    assert_eq!(search.state(), SearchState::Ready);

    assert_eq!(search.step(), SearchState::Running);
    assert_eq!(search.current(), Some(CellCoord::new(2, 2)));
    assert_eq!(search.step(), SearchState::Running);
    assert_eq!(search.current(), Some(CellCoord::new(1, 1)));
    assert_eq!(search.step(), SearchState::Done);
    assert_eq!(search.current(), Some(CellCoord::new(0, 0)));

    let path = search.path();
    visualize(&search);
    assert_eq!(
        path,
        vec![CellCoord::new(0, 0), CellCoord::new(1, 1), CellCoord::new(2, 2)]
    );
    assert_eq!(path.len() - 1, 2);
    assert_close(path_cost(&path), 2.0 * SQRT_2);
    assert!(search.is_done());
    assert!(search.is_solvable());
}

#[test]
fn test_goal_neighbors_relaxed_on_final_step() {
    // (0,0) is only adjacent to the destination
    let mut search = search_on("□ds\n");
    assert_eq!(search.step(), SearchState::Running);
    assert!(!search.frontier().contains(&CellCoord::new(0, 0)));

    assert_eq!(search.step(), SearchState::Done);
    let cell = search.grid().cell(CellCoord::new(0, 0)).unwrap();
    assert!(search.frontier().contains(&CellCoord::new(0, 0)));
    assert_close(cell.cost_so_far, 2.0);
    assert_eq!(cell.predecessor, Some(CellCoord::new(0, 1)));
}

#[test]
fn test_enclosed_destination_is_unsolvable() {
    let mut search = search_on(
        "s□□□□\n\
         □■■■□\n\
         □■d■□\n\
         □■■■□\n\
         □□□□□\n",
    );

    let state = run_until_terminal(&mut search, 100);
    visualize(&search);

    assert_eq!(state, SearchState::Unsolvable);
    assert!(!search.is_solvable());
    assert!(!search.is_done());
    assert_eq!(search.visited().len(), 16);
    assert!(search.frontier().is_empty());
}

#[test]
fn test_diagonal_squeeze_is_unsolvable() {
    let mut search = search_on("s■\n■d\n");
    assert_eq!(run_until_terminal(&mut search, 10), SearchState::Unsolvable);
    assert_eq!(search.visited().len(), 1);
}

#[test]
fn test_path_goes_through_wall_gap() {
    let mut search = search_on(
        "□□□□s\n\
         ■■■□■\n\
         d□□□□\n",
    );
    assert_eq!(run_until_terminal(&mut search, 50), SearchState::Done);
    visualize(&search);

    let path = search.path();
    assert!(path.contains(&CellCoord::new(1, 3)));
    assert_eq!(path.first(), Some(&CellCoord::new(2, 0)));
    assert_eq!(path.last(), Some(&CellCoord::new(0, 4)));
    assert_close(path_cost(&path), 2.0 * SQRT_2 + 2.0);
}

#[test]
fn test_terminal_steps_are_noops() {
    let mut search = search_on("d□□\n□□□\n□□s\n");
    run_until_terminal(&mut search, 10);

    let visited = search.visited().clone();
    let frontier: HashSet<CellCoord> = search.frontier().iter().copied().collect();
    let current = search.current();
    let steps = search.steps_taken();

    for _ in 0..5 {
        assert_eq!(search.step(), SearchState::Done);
    }
    let frontier_after: HashSet<CellCoord> = search.frontier().iter().copied().collect();
    assert_eq!(search.visited(), &visited);
    assert_eq!(frontier_after, frontier);
    assert_eq!(search.current(), current);
    assert_eq!(search.steps_taken(), steps);

    let mut blocked = search_on("s■\n■d\n");
    run_until_terminal(&mut blocked, 10);
    let visited = blocked.visited().clone();
    assert_eq!(blocked.step(), SearchState::Unsolvable);
    assert_eq!(blocked.visited(), &visited);
}

#[test]
fn test_invariants_hold_every_step() {
    for seed in [3, 17, 99] {
        let grid = seeded_grid(33, 33, 0.3, seed);
        let mut search = ReverseAStar::new(grid);
        search.reset().unwrap();

        let mut previous = cost_snapshot(search.grid());
        loop {
            let state = search.step();

            // Frontier and visited stay disjoint
            assert!(search.frontier().iter().all(|c| !search.visited().contains(c)));

            // Costs only ever go down
            let costs = cost_snapshot(search.grid());
            for (coord, old) in &previous {
                assert!(costs[coord] <= *old, "cost of {:?} increased", coord);
            }
            previous = costs;

            // Predecessor chains end at the origin without repeating a cell
            let current = search.current().unwrap();
            let chain = reconstruct_path(search.grid(), current);
            let unique: HashSet<_> = chain.iter().collect();
            assert_eq!(unique.len(), chain.len());
            assert!(chain.len() - 1 <= search.visited().len());
            assert_eq!(chain.last().copied(), search.origin());

            // The last step is checked too, since it still relaxes neighbors
            if state.is_terminal() {
                break;
            }
        }
    }
}

#[test]
#[should_panic(expected = "changed since the last reset")]
fn test_step_on_regenerated_grid_without_reset_panics() {
    let mut search = ReverseAStar::new(seeded_grid(16, 16, 0.3, 4));
    search.reset().unwrap();
    search.step();
    search.step();

    let mut rng = StdRng::seed_from_u64(1);
    search
        .grid_mut()
        .generate_with_rng(0.3, &mut rng)
        .unwrap();
    search.step();
}

#[test]
fn test_repeated_runs_are_deterministic() {
    let grid = seeded_grid(33, 33, 0.3, 2024);
    let mut first = ReverseAStar::new(grid.clone());
    let mut second = ReverseAStar::new(grid);
    first.reset().unwrap();
    second.reset().unwrap();

    loop {
        let a = first.step();
        let b = second.step();
        assert_eq!(a, b);
        assert_eq!(first.current(), second.current());
        assert_eq!(first.visited(), second.visited());
        let fa: HashSet<_> = first.frontier().iter().collect();
        let fb: HashSet<_> = second.frontier().iter().collect();
        assert_eq!(fa, fb);
        if a.is_terminal() {
            break;
        }
    }

    // A reset on the same grid replays the same sequence
    let expected: Vec<_> = {
        let mut replay = first.clone();
        replay.reset().unwrap();
        let mut order = Vec::new();
        while !replay.step().is_terminal() {
            order.push(replay.current());
        }
        order
    };
    first.reset().unwrap();
    let mut order = Vec::new();
    while !first.step().is_terminal() {
        order.push(first.current());
    }
    assert_eq!(order, expected);
}

#[test]
fn test_path_cost_matches_reference() {
    for seed in [5, 8, 13, 21] {
        let grid = seeded_grid(33, 33, 0.3, seed);
        let source = grid.source().unwrap();
        let destination = grid.destination().unwrap();
        let expected = reference_cost(&grid, source, destination);

        let mut search = ReverseAStar::new(grid);
        search.reset().unwrap();
        let state = search.run_to_completion(None);

        match expected {
            Some(cost) => {
                assert_eq!(state, SearchState::Done, "seed {} should be solvable", seed);
                let path = search.path();
                assert_eq!(path.first(), Some(&destination));
                assert_eq!(path.last(), Some(&source));
                assert_close(path_cost(&path), cost);
            }
            None => assert_eq!(state, SearchState::Unsolvable),
        }
    }
}

#[test]
fn test_open_grid_path_cost() {
    let mut grid = Grid::new(10, 10);
    grid.set_endpoints(CellCoord::new(0, 9), CellCoord::new(9, 0)).unwrap();
    let mut search = ReverseAStar::new(grid);
    search.reset().unwrap();

    assert_eq!(search.run_to_completion(None), SearchState::Done);
    assert_close(path_cost(&search.path()), 9.0 * SQRT_2);
    // A straight diagonal only ever expands cells on the diagonal
    assert_eq!(search.steps_taken(), 10);
}

#[test]
fn test_run_to_completion_respects_cap() {
    let mut grid = Grid::new(10, 10);
    grid.set_endpoints(CellCoord::new(0, 9), CellCoord::new(9, 0)).unwrap();
    let mut search = ReverseAStar::new(grid);
    search.reset().unwrap();

    assert_eq!(search.run_to_completion(Some(3)), SearchState::Running);
    assert_eq!(search.steps_taken(), 3);
    assert_eq!(search.run_to_completion(None), SearchState::Done);
}

#[test]
fn test_reset_picks_up_regenerated_grid() {
    let mut grid = Grid::new(10, 10);
    grid.set_endpoints(CellCoord::new(0, 9), CellCoord::new(9, 0)).unwrap();
    let mut search = ReverseAStar::new(grid);
    search.reset().unwrap();
    search.run_to_completion(None);

    search
        .grid_mut()
        .set_endpoints(CellCoord::new(5, 5), CellCoord::new(5, 0))
        .unwrap();
    assert!(search.is_stale());

    search.reset().unwrap();
    assert!(!search.is_stale());
    assert_eq!(search.state(), SearchState::Ready);
    assert_eq!(search.origin(), Some(CellCoord::new(5, 5)));
    assert!(search.visited().is_empty());
    assert_eq!(search.current(), None);
    assert!(search.path().is_empty());

    // Metadata from the previous run is gone
    let stale = search.grid().cell(CellCoord::new(0, 9)).unwrap();
    assert!(stale.cost_so_far.is_infinite());
    assert!(stale.predecessor.is_none());

    assert_eq!(search.run_to_completion(None), SearchState::Done);
    assert_close(path_cost(&search.path()), 5.0);
}
