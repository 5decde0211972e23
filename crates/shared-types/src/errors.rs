//! Error types used across the chart canvas crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Setup-level failures: configuration, GPU initialisation, texture limits.
///
/// Per-frame and per-item problems never surface as this type; malformed
/// input is reported through [`GeometryIssue`] and the item is dropped.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum ChartCanvasError {
    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        field: Option<String>,
    },

    #[error("Configuration parse error ({format}): {message}")]
    ConfigParse { message: String, format: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    // GPU/Rendering errors
    #[error("GPU initialization failed: {message}")]
    GpuInit { message: String },

    #[error("Texture {width}x{height} exceeds the device limit of {max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("Unknown marker shape: {name}")]
    UnknownMarker { name: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<std::io::Error> for ChartCanvasError {
    fn from(err: std::io::Error) -> Self {
        ChartCanvasError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for chart canvas operations
pub type ChartCanvasResult<T> = Result<T, ChartCanvasError>;

/// A single malformed input item that a renderable group skipped.
///
/// `index` is the position of the item in the batch handed to the group.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryIssue {
    #[error("item {index}: {len} point(s), at least {min} required")]
    TooFewPoints { index: usize, len: usize, min: usize },

    #[error("item {index}: {field} has {actual} entries, expected {expected}")]
    MismatchedLengths {
        index: usize,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("item {index}: non-finite coordinate at point {point}")]
    NonFiniteCoordinate { index: usize, point: usize },

    #[error("item {index}: direction vector has zero length")]
    ZeroDirection { index: usize },

    #[error("item {index}: hole {hole} has {len} point(s), at least 3 required")]
    DegenerateHole { index: usize, hole: usize, len: usize },

    #[error("item {index}: polygon could not be tessellated: {message}")]
    Tessellation { index: usize, message: String },
}

impl GeometryIssue {
    pub fn index(&self) -> usize {
        match self {
            GeometryIssue::TooFewPoints { index, .. }
            | GeometryIssue::MismatchedLengths { index, .. }
            | GeometryIssue::NonFiniteCoordinate { index, .. }
            | GeometryIssue::ZeroDirection { index }
            | GeometryIssue::DegenerateHole { index, .. }
            | GeometryIssue::Tessellation { index, .. } => *index,
        }
    }
}

/// Helper macro for converting Results into ChartCanvasResult
#[macro_export]
macro_rules! map_chart_error {
    ($result:expr, $error_variant:ident, $message:expr) => {
        $result.map_err(|e| $crate::errors::ChartCanvasError::$error_variant {
            message: format!("{}: {}", $message, e),
        })
    };
}
