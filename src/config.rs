use crate::error::{ReverseAStarError, Result};
use crate::grid::{DEFAULT_MAX_ATTEMPTS, DEFAULT_SIZE, MAX_DIMENSION};
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default config file, looked up in the working directory
pub const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_rows")]
    pub rows: i32,
    #[serde(default = "default_cols")]
    pub cols: i32,
    /// Side length of a drawn cell in pixels
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationConfig {
    /// Probability of each cell starting out as an obstacle
    #[serde(default = "default_density")]
    pub density: f64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed RNG seed for reproducible layouts
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnimationConfig {
    /// Delay between automatic steps while running
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
    #[serde(default = "default_steps_per_tick")]
    pub steps_per_tick: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "default_true")]
    pub show_frontier: bool,
    #[serde(default = "default_true")]
    pub show_visited: bool,
    #[serde(default = "default_true")]
    pub show_path: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Default `env_logger` filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub enable_action_log: bool,
}

// Default values
fn default_rows() -> i32 { DEFAULT_SIZE }
fn default_cols() -> i32 { DEFAULT_SIZE }
fn default_cell_size() -> f32 { 18.0 }
fn default_density() -> f64 { 0.3 }
fn default_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn default_step_interval_ms() -> u64 { 50 }
fn default_steps_per_tick() -> usize { 1 }
fn default_true() -> bool { true }
fn default_window_title() -> String { "Reverse A*".to_string() }
fn default_bg_r() -> u8 { 30 }
fn default_bg_g() -> u8 { 30 }
fn default_bg_b() -> u8 { 30 }
fn default_log_level() -> String { "info".to_string() }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            cell_size: default_cell_size(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            density: default_density(),
            max_attempts: default_max_attempts(),
            seed: None,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: default_step_interval_ms(),
            steps_per_tick: default_steps_per_tick(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            show_frontier: true,
            show_visited: true,
            show_path: true,
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            enable_action_log: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            generation: GenerationConfig::default(),
            animation: AnimationConfig::default(),
            overlay: OverlayConfig::default(),
            visual: VisualConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `config.toml`, or use defaults if it is missing or invalid
    pub fn load() -> Self {
        if !Path::new(CONFIG_PATH).exists() {
            info!("No {} found, using default configuration", CONFIG_PATH);
            return Config::default();
        }
        match Self::load_from(CONFIG_PATH) {
            Ok(config) => {
                info!("Loaded configuration from {}", CONFIG_PATH);
                config
            }
            Err(e) => {
                warn!("Failed to load {}: {}", CONFIG_PATH, e);
                warn!("Using default configuration");
                Config::default()
            }
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            ReverseAStarError::Config(format!(
                "cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject grid dimensions the grid world cannot hold
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("rows", self.grid.rows), ("cols", self.grid.cols)] {
            if !(1..=MAX_DIMENSION).contains(&value) {
                return Err(ReverseAStarError::Config(format!(
                    "grid.{} must be between 1 and {}, got {}",
                    name, MAX_DIMENSION, value
                )));
            }
        }
        Ok(())
    }
}
