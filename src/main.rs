use ::rand::rngs::StdRng;
use ::rand::SeedableRng;
use arboard::Clipboard;
use log::{info, warn};
use macroquad::prelude::*;
use reverse_astar::action_log::{Action, ActionLog, Overlay};
use reverse_astar::config::{Config, OverlayConfig};
use reverse_astar::grid::{CellCoord, Grid};
use reverse_astar::layout;
use reverse_astar::pathfinding::{format_path, path_cost, ReverseAStar, SearchState};

/// Height of the status panel under the grid
const PANEL_HEIGHT: f32 = 130.0;

const DENSITY_STEP: f64 = 0.05;

fn make_rng(config: &Config) -> StdRng {
    match config.generation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn make_search(config: &Config) -> ReverseAStar {
    let grid = Grid::new(config.grid.rows, config.grid.cols)
        .with_max_attempts(config.generation.max_attempts);
    ReverseAStar::new(grid)
}

/// Visualization state
struct VisState {
    search: ReverseAStar,
    config: Config,
    rng: StdRng,
    density: f64,
    overlay: OverlayConfig,
    running: bool,
    last_step_time: f64,
    status: String,
    action_log: ActionLog,
}

impl VisState {
    fn new(config: Config) -> Self {
        let mut state = VisState {
            search: make_search(&config),
            rng: make_rng(&config),
            density: config.generation.density,
            overlay: config.overlay.clone(),
            running: false,
            last_step_time: 0.0,
            status: String::new(),
            action_log: ActionLog::new(config.logging.enable_action_log),
            config,
        };
        state.setup();
        state
    }

    /// A search can only be stepped after a reset on the current layout
    fn is_ready(&self) -> bool {
        self.search.state() != SearchState::Uninitialized && !self.search.is_stale()
    }

    /// Regenerate the grid and restart the search on it
    fn setup(&mut self) {
        self.running = false;
        let result = self
            .search
            .grid_mut()
            .generate_with_rng(self.density, &mut self.rng)
            .and_then(|_| self.search.reset());

        match result {
            Ok(()) => {
                self.status = format!("New grid at density {:.2}", self.density);
                self.action_log.log(Action::Setup { density: self.density, ok: true });
            }
            Err(e) => {
                warn!("Setup failed: {}", e);
                self.status = format!("Setup failed: {}", e);
                self.action_log.log(Action::Setup { density: self.density, ok: false });
            }
        }
    }

    fn reset(&mut self) {
        self.running = false;
        match self.search.reset() {
            Ok(()) => {
                self.status = "Search reset".to_string();
                self.action_log.log(Action::Reset);
            }
            Err(e) => self.status = format!("Cannot reset: {}", e),
        }
    }

    fn step_once(&mut self) -> SearchState {
        let before = self.search.state();
        let after = self.search.step();
        if after.is_terminal() && !before.is_terminal() {
            self.on_finished(after);
        }
        after
    }

    fn manual_step(&mut self) {
        if !self.is_ready() {
            return;
        }
        let state = self.step_once();
        self.action_log.log(Action::Step { state: format!("{:?}", state) });
    }

    fn on_finished(&mut self, state: SearchState) {
        self.running = false;
        let steps = self.search.steps_taken();
        self.status = match state {
            SearchState::Done => {
                let path = self.search.path();
                info!("Path found: {}", format_path(&path));
                format!("Done in {} steps, path cost {:.2}", steps, path_cost(&path))
            }
            _ => format!("Unsolvable after {} steps", steps),
        };
        info!("{}", self.status);
        self.action_log.log(Action::Finished { state: format!("{:?}", state), steps });
    }

    fn toggle_run(&mut self) {
        if !self.is_ready() || self.search.state().is_terminal() {
            return;
        }
        self.running = !self.running;
        self.last_step_time = get_time();
        self.action_log.log(if self.running { Action::Run } else { Action::Pause });
    }

    fn tick(&mut self) {
        if !self.running || !self.is_ready() {
            return;
        }
        let interval = self.config.animation.step_interval_ms as f64 / 1000.0;
        let now = get_time();
        if now - self.last_step_time < interval {
            return;
        }
        self.last_step_time = now;
        for _ in 0..self.config.animation.steps_per_tick.max(1) {
            if self.step_once().is_terminal() {
                break;
            }
        }
    }

    fn adjust_density(&mut self, delta: f64) {
        self.density = (self.density + delta).clamp(0.0, 1.0);
        self.status = format!("Density {:.2} (press S to regenerate)", self.density);
        self.action_log.log(Action::SetDensity { density: self.density });
    }

    fn toggle_overlay(&mut self, overlay: Overlay) {
        let flag = match overlay {
            Overlay::Frontier => &mut self.overlay.show_frontier,
            Overlay::Visited => &mut self.overlay.show_visited,
            Overlay::Path => &mut self.overlay.show_path,
        };
        *flag = !*flag;
        let enabled = *flag;
        self.action_log.log(Action::ToggleOverlay { overlay, enabled });
    }

    fn copy_to_clipboard(&mut self, text: String, what: &str) {
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(&text) {
                    warn!("Failed to copy {} to clipboard: {}", what, e);
                } else {
                    info!("{} copied to clipboard", what);
                    self.status = format!("{} copied to clipboard", what);
                    // Keep clipboard alive for a moment so clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => warn!("Failed to access clipboard: {}", e),
        }
    }

    fn copy_layout(&mut self) {
        let text = layout::render(self.search.grid(), Some(&self.search));
        self.copy_to_clipboard(text, "Grid layout");
        self.action_log.log(Action::CopyLayout);
    }

    fn copy_action_log(&mut self) {
        match self.action_log.to_json() {
            Ok(json) => self.copy_to_clipboard(json, "Action log"),
            Err(e) => warn!("Failed to serialize action log: {}", e),
        }
    }

    fn handle_input(&mut self) {
        if is_key_pressed(KeyCode::S) {
            self.setup();
        }
        if is_key_pressed(KeyCode::R) {
            self.reset();
        }
        if is_key_pressed(KeyCode::Space) || is_key_pressed(KeyCode::N) {
            self.manual_step();
        }
        if is_key_pressed(KeyCode::Enter) {
            self.toggle_run();
        }
        if is_key_pressed(KeyCode::Up) {
            self.adjust_density(DENSITY_STEP);
        }
        if is_key_pressed(KeyCode::Down) {
            self.adjust_density(-DENSITY_STEP);
        }
        if is_key_pressed(KeyCode::F) {
            self.toggle_overlay(Overlay::Frontier);
        }
        if is_key_pressed(KeyCode::V) {
            self.toggle_overlay(Overlay::Visited);
        }
        if is_key_pressed(KeyCode::P) {
            self.toggle_overlay(Overlay::Path);
        }
        if is_key_pressed(KeyCode::C) {
            self.copy_layout();
        }
        if is_key_pressed(KeyCode::L) {
            self.copy_action_log();
        }
    }

    fn cell_color(&self, coord: CellCoord, path: &[CellCoord]) -> Color {
        let grid = self.search.grid();
        if grid.source() == Some(coord) {
            RED
        } else if grid.destination() == Some(coord) {
            GREEN
        } else if grid.is_obstacle(coord.row, coord.col) {
            Color::from_rgba(50, 50, 60, 255)
        } else if self.search.current() == Some(coord) {
            ORANGE
        } else if self.overlay.show_path && path.contains(&coord) {
            YELLOW
        } else if self.overlay.show_frontier && self.search.frontier().contains(&coord) {
            Color::from_rgba(90, 160, 230, 255)
        } else if self.overlay.show_visited && self.search.visited().contains(&coord) {
            Color::from_rgba(120, 90, 170, 255)
        } else {
            Color::from_rgba(200, 200, 200, 255)
        }
    }

    fn draw(&self) {
        let visual = &self.config.visual;
        clear_background(Color::from_rgba(
            visual.background_r,
            visual.background_g,
            visual.background_b,
            255,
        ));

        let grid = self.search.grid();
        let cell_size = self.config.grid.cell_size;
        let path = if self.overlay.show_path { self.search.path() } else { Vec::new() };

        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let coord = CellCoord::new(row, col);
                let px = col as f32 * cell_size;
                let py = row as f32 * cell_size;
                draw_rectangle(px, py, cell_size - 1.0, cell_size - 1.0, self.cell_color(coord, &path));
            }
        }

        let panel_y = grid.rows() as f32 * cell_size + 20.0;
        let info = [
            format!(
                "State: {:?}  Steps: {}  Frontier: {}  Visited: {}",
                self.search.state(),
                self.search.steps_taken(),
                self.search.frontier().len(),
                self.search.visited().len()
            ),
            format!(
                "Density: {:.2}  Overlays: frontier={} visited={} path={}",
                self.density, self.overlay.show_frontier, self.overlay.show_visited, self.overlay.show_path
            ),
            self.status.clone(),
            "S: setup  R: reset  Space/N: step  Enter: run/pause  Up/Down: density".to_string(),
            "F/V/P: overlays  C: copy grid  L: copy action log  Esc: quit".to_string(),
        ];
        for (i, line) in info.iter().enumerate() {
            draw_text(line, 10.0, panel_y + i as f32 * 20.0, 18.0, WHITE);
        }
    }
}

/// Generate one grid, search it to completion, and print the result
fn run_headless(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = make_rng(config);
    let mut search = make_search(config);
    search
        .grid_mut()
        .generate_with_rng(config.generation.density, &mut rng)?;
    search.reset()?;

    let state = search.run_to_completion(None);
    let path = search.path();

    println!("{}", layout::render(search.grid(), Some(&search)));
    println!("State: {:?} after {} steps", state, search.steps_taken());
    if state == SearchState::Done {
        println!("Path: {}", format_path(&path));
        println!("Path cost: {:.3}", path_cost(&path));
    }
    Ok(())
}

fn window_conf(config: &Config) -> Conf {
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: (config.grid.cols as f32 * config.grid.cell_size) as i32 + 20,
        window_height: (config.grid.rows as f32 * config.grid.cell_size + PANEL_HEIGHT) as i32,
        ..Default::default()
    }
}

async fn run_window(config: Config) {
    let mut state = VisState::new(config);

    loop {
        state.handle_input();

        // Close window on Escape
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        state.tick();
        state.draw();

        next_frame().await
    }

    state.action_log.print();
    info!("{}", state.action_log.summary());
}

fn main() {
    let config = Config::load();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--headless" {
        if let Err(e) = run_headless(&config) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    macroquad::Window::from_config(window_conf(&config), run_window(config));
}
