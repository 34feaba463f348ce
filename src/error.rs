//! Error types for the grid world and search engine

use thiserror::Error;

/// Errors surfaced by grid queries, generation, and search setup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReverseAStarError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfRange {
        row: i32,
        col: i32,
        rows: i32,
        cols: i32,
    },

    #[error("no valid source/destination pair after {attempts} attempts at density {density:.2}")]
    GenerationFailure { attempts: u32, density: f64 },

    #[error("cell ({row}, {col}) is an obstacle and cannot be an endpoint")]
    BlockedEndpoint { row: i32, col: i32 },

    #[error("grid has no source/destination; generate it or set endpoints first")]
    NotGenerated,

    #[error("layout error: {0}")]
    Layout(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for ReverseAStarError {
    fn from(e: toml::de::Error) -> Self {
        ReverseAStarError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReverseAStarError>;
