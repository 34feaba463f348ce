use log::info;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Overlay layers the driver can toggle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overlay {
    Frontier,
    Visited,
    Path,
}

/// Driver actions against the grid and the search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Regenerate the grid at a density; `ok` is false when generation gave up
    Setup { density: f64, ok: bool },
    /// Restart the search on the current grid
    Reset,
    /// Single manual step and the state it produced
    Step { state: String },
    /// Start timed stepping
    Run,
    /// Stop timed stepping
    Pause,
    /// Search reached a terminal state after `steps` expansions
    Finished { state: String, steps: usize },
    SetDensity { density: f64 },
    ToggleOverlay { overlay: Overlay, enabled: bool },
    /// Board text copied to the clipboard
    CopyLayout,
}

/// Logged action with timestamp
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedAction {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    pub action: Action,
}

/// In-memory action logger for a visualizer session
pub struct ActionLog {
    start_time: Instant,
    actions: Vec<LoggedAction>,
    enabled: bool,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ActionLog {
    pub fn new(enabled: bool) -> Self {
        ActionLog {
            start_time: Instant::now(),
            actions: Vec::new(),
            enabled,
        }
    }

    /// Log an action with current timestamp
    pub fn log(&mut self, action: Action) {
        if !self.enabled {
            return;
        }
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.actions.push(LoggedAction {
            timestamp_ms,
            action,
        });
    }

    pub fn actions(&self) -> &[LoggedAction] {
        &self.actions
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.actions)
    }

    /// Emit the log through the `log` facade
    pub fn print(&self) {
        info!("=== Action Log ({} events) ===", self.actions.len());
        for (i, logged) in self.actions.iter().enumerate() {
            info!("[{:6}ms] #{:3} {:?}", logged.timestamp_ms, i + 1, logged.action);
        }
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut setups = 0;
        let mut failed_setups = 0;
        let mut resets = 0;
        let mut manual_steps = 0;
        let mut runs = 0;
        let mut finished = 0;

        for logged in &self.actions {
            match &logged.action {
                Action::Setup { ok, .. } => {
                    setups += 1;
                    if !ok {
                        failed_setups += 1;
                    }
                }
                Action::Reset => resets += 1,
                Action::Step { .. } => manual_steps += 1,
                Action::Run => runs += 1,
                Action::Finished { .. } => finished += 1,
                _ => {}
            }
        }

        let duration = self.actions.last().map_or(0, |last| last.timestamp_ms);

        format!(
            "Session Duration: {}ms\n\
             Total Events: {}\n\
             Grids: {} generated ({} failed), {} resets\n\
             Search: {} manual steps, {} runs, {} finished",
            duration,
            self.actions.len(),
            setups,
            failed_setups,
            resets,
            manual_steps,
            runs,
            finished
        )
    }
}
