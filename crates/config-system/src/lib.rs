//! Configuration system for chart canvas
//! Chart bounds, gesture tuning and rendering constants, loadable from JSON or TOML

use chart_canvas_shared::{ChartCanvasError, ChartRegion, DataRange, Rgba, VisibleRange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod parser;
pub mod validation;

pub use parser::{ConfigFormat, ConfigParser, ConfigSerializer};
pub use validation::ConfigValidator;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for ChartCanvasError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => e.into(),
            ConfigError::Parse(message) => ChartCanvasError::ConfigParse {
                message,
                format: "config".to_string(),
            },
            ConfigError::Validation(message) => ChartCanvasError::InvalidConfig {
                message,
                field: None,
            },
        }
    }
}

/// Everything a chart surface needs to know before the first frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartCanvasConfig {
    /// Absolute bound for pan and zoom, `[x1, y1, x2, y2]`.
    pub data_range: DataRange,
    /// Normalized `[left, top, right, bottom]` area of the canvas used for plotting.
    #[serde(default)]
    pub chart_region: ChartRegion,
    /// Window restored on double-click; the full data range when absent.
    #[serde(default)]
    pub default_visible_range: Option<VisibleRange>,
    /// Smallest allowed visible extent per axis, `[width, height]`.
    #[serde(default)]
    pub max_zoom: Option<[f64; 2]>,
    #[serde(default)]
    pub gestures: GestureTuning,
    #[serde(default)]
    pub rendering: RenderTuning,
    #[serde(default)]
    pub grid: GridStyle,
}

impl ChartCanvasConfig {
    pub fn new(data_range: DataRange) -> Self {
        Self {
            data_range,
            chart_region: ChartRegion::default(),
            default_visible_range: None,
            max_zoom: None,
            gestures: GestureTuning::default(),
            rendering: RenderTuning::default(),
            grid: GridStyle::default(),
        }
    }

    pub fn with_chart_region(mut self, region: ChartRegion) -> Self {
        self.chart_region = region;
        self
    }

    pub fn with_default_visible_range(mut self, range: VisibleRange) -> Self {
        self.default_visible_range = Some(range);
        self
    }

    pub fn with_max_zoom(mut self, width: f64, height: f64) -> Self {
        self.max_zoom = Some([width, height]);
        self
    }

    /// Window shown initially and restored on reset.
    pub fn initial_visible_range(&self) -> VisibleRange {
        self.default_visible_range.unwrap_or(self.data_range)
    }
}

impl Default for ChartCanvasConfig {
    fn default() -> Self {
        Self::new(DataRange::new(0.0, 0.0, 1.0, 1.0))
    }
}

/// Pan/zoom gesture constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Edge scale per wheel step when zooming in.
    pub zoom_in_factor: f64,
    /// Edge scale per wheel step when zooming out.
    pub zoom_out_factor: f64,
    /// Pinch axis lock threshold in region-relative units.
    pub axis_lock_epsilon: f64,
    /// Pointer travel in pixels above which a gesture no longer counts as a click.
    pub click_slop_px: f64,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            zoom_in_factor: 0.9,
            zoom_out_factor: 1.1,
            axis_lock_epsilon: 0.1,
            click_slop_px: 3.0,
        }
    }
}

/// Geometry and texture constants shared by the renderable groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderTuning {
    /// A path whose first and last points are closer than this is closed.
    pub closed_path_epsilon: f64,
    /// Direction buckets of the dash-phase arc length histogram.
    pub histogram_buckets: u32,
    /// Row width limit of the histogram texture.
    pub max_histogram_texture_width: u32,
    /// Dash pattern used by styled paths when none is given.
    pub default_path_dash: Vec<f32>,
    /// Dash pattern used by lines when none is given.
    pub default_line_dash: Vec<f32>,
    pub clear_color: Rgba,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            closed_path_epsilon: 1e-4,
            histogram_buckets: 5,
            max_histogram_texture_width: 4096,
            default_path_dash: vec![5.0, 5.0],
            default_line_dash: vec![15.0, 10.0],
            clear_color: Rgba::WHITE,
        }
    }
}

/// Lines drawn at every tick of the visible range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridStyle {
    pub enabled: bool,
    pub color: Rgba,
    /// Stroke width in pixels.
    pub width: f32,
    /// Draw order among the groups; the grid sits under the data by default.
    pub z_order: f32,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Rgba::from_packed(0xccccccff),
            width: 1.0,
            z_order: -10.0,
        }
    }
}
