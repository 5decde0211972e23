//! Configuration validation utilities

use crate::{ChartCanvasConfig, ConfigError, GestureTuning, GridStyle, RenderTuning, Result};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &ChartCanvasConfig) -> Result<()> {
        Self::validate_ranges(config)?;
        Self::validate_gestures(&config.gestures)?;
        Self::validate_rendering(&config.rendering)?;
        Self::validate_grid(&config.grid)?;
        Ok(())
    }

    fn validate_ranges(config: &ChartCanvasConfig) -> Result<()> {
        if !config.data_range.is_valid() {
            return Err(ConfigError::Validation(format!(
                "Invalid data_range: {:?}. Edges must be finite with x1 < x2 and y1 < y2",
                config.data_range
            )));
        }

        if !config.chart_region.is_valid() {
            return Err(ConfigError::Validation(format!(
                "Invalid chart_region: {:?}. Must lie inside [0, 1] with left < right and top < bottom",
                config.chart_region
            )));
        }

        if let Some(range) = config.default_visible_range {
            if !range.is_valid() || !config.data_range.contains(&range) {
                return Err(ConfigError::Validation(format!(
                    "default_visible_range {:?} must be a non-empty window inside data_range {:?}",
                    range, config.data_range
                )));
            }
        }

        if let Some([w, h]) = config.max_zoom {
            if !(w >= 0.0 && h >= 0.0) {
                return Err(ConfigError::Validation(format!(
                    "Invalid max_zoom: [{}, {}]. Extents must be non-negative",
                    w, h
                )));
            }
            if w > config.data_range.width() || h > config.data_range.height() {
                log::warn!(
                    "[ConfigValidator] max_zoom [{}, {}] exceeds the data range, zooming is disabled on that axis",
                    w,
                    h
                );
            }
        }

        Ok(())
    }

    fn validate_gestures(gestures: &GestureTuning) -> Result<()> {
        if !(gestures.zoom_in_factor > 0.0 && gestures.zoom_in_factor < 1.0) {
            return Err(ConfigError::Validation(format!(
                "Invalid zoom_in_factor: {}. Must be between 0 and 1 (exclusive)",
                gestures.zoom_in_factor
            )));
        }

        if !(gestures.zoom_out_factor > 1.0 && gestures.zoom_out_factor.is_finite()) {
            return Err(ConfigError::Validation(format!(
                "Invalid zoom_out_factor: {}. Must be greater than 1",
                gestures.zoom_out_factor
            )));
        }

        if !(gestures.axis_lock_epsilon >= 0.0 && gestures.axis_lock_epsilon < 1.0) {
            return Err(ConfigError::Validation(format!(
                "Invalid axis_lock_epsilon: {}. Must be in [0, 1)",
                gestures.axis_lock_epsilon
            )));
        }

        if gestures.click_slop_px < 0.0 {
            return Err(ConfigError::Validation(format!(
                "Invalid click_slop_px: {}. Must be non-negative",
                gestures.click_slop_px
            )));
        }

        Ok(())
    }

    fn validate_rendering(rendering: &RenderTuning) -> Result<()> {
        if !(2..=8).contains(&rendering.histogram_buckets) {
            return Err(ConfigError::Validation(format!(
                "Invalid histogram_buckets: {}. Must be between 2 and 8",
                rendering.histogram_buckets
            )));
        }

        if rendering.max_histogram_texture_width < rendering.histogram_buckets {
            return Err(ConfigError::Validation(format!(
                "max_histogram_texture_width {} cannot hold a single point of {} buckets",
                rendering.max_histogram_texture_width, rendering.histogram_buckets
            )));
        }

        if !(rendering.closed_path_epsilon >= 0.0) {
            return Err(ConfigError::Validation(format!(
                "Invalid closed_path_epsilon: {}",
                rendering.closed_path_epsilon
            )));
        }

        for (name, pattern) in [
            ("default_path_dash", &rendering.default_path_dash),
            ("default_line_dash", &rendering.default_line_dash),
        ] {
            Self::validate_dash_pattern(name, pattern)?;
        }

        Ok(())
    }

    fn validate_grid(grid: &GridStyle) -> Result<()> {
        if !(grid.width >= 0.0 && grid.width.is_finite()) {
            return Err(ConfigError::Validation(format!(
                "Invalid grid width: {}. Must be finite and non-negative",
                grid.width
            )));
        }
        if !grid.z_order.is_finite() {
            return Err(ConfigError::Validation(format!(
                "Invalid grid z_order: {}",
                grid.z_order
            )));
        }
        Ok(())
    }

    /// A dash pattern needs at least one run, no negative runs and a positive total.
    pub fn validate_dash_pattern(name: &str, pattern: &[f32]) -> Result<()> {
        let total: f32 = pattern.iter().sum();
        if pattern.is_empty() || pattern.iter().any(|v| !(*v >= 0.0)) || !(total > 0.0) {
            return Err(ConfigError::Validation(format!(
                "Invalid dash pattern {}: {:?}",
                name, pattern
            )));
        }
        Ok(())
    }
}
