//! Editor policy configuration.
//!
//! Every tunable the store, auto-fit, animation layer and interaction
//! controller consult lives in [`EditorConfig`]. Defaults mirror
//! [`crate::consts`]; a host may override any subset from JSON.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    BLOCK_EDGE_MARGIN, CREATE_OPACITY, CREATE_SCALE, DRAG_INTERIOR_PADDING, DUPLICATE_OFFSET, FIT_PADDING,
    GUIDE_OVERLAP_RATIO, GUIDE_TOLERANCE, HANDLE_INSET, HANDLE_SIZE, HOVER_THRESHOLD, TWEEN_MS, ZONE_EDGE_MARGIN,
    ZONE_MIN_H, ZONE_MIN_W,
};

/// Error returned by [`EditorConfig::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The payload is not valid JSON for this shape.
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field parsed but holds a value the editor cannot work with.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Policy values for the editor core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub zone_min_w: f64,
    pub zone_min_h: f64,
    pub fit_padding: f64,
    pub drag_interior_padding: f64,
    pub hover_threshold: f64,
    pub guide_overlap_ratio: f64,
    pub guide_tolerance: f64,
    /// Tween duration in milliseconds for creation and auto updates.
    pub tween_ms: f64,
    pub create_opacity: f64,
    pub create_scale: f64,
    pub duplicate_offset: f64,
    pub handle_size: f64,
    pub handle_inset: f64,
    pub block_edge_margin: f64,
    pub zone_edge_margin: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            zone_min_w: ZONE_MIN_W,
            zone_min_h: ZONE_MIN_H,
            fit_padding: FIT_PADDING,
            drag_interior_padding: DRAG_INTERIOR_PADDING,
            hover_threshold: HOVER_THRESHOLD,
            guide_overlap_ratio: GUIDE_OVERLAP_RATIO,
            guide_tolerance: GUIDE_TOLERANCE,
            tween_ms: TWEEN_MS,
            create_opacity: CREATE_OPACITY,
            create_scale: CREATE_SCALE,
            duplicate_offset: DUPLICATE_OFFSET,
            handle_size: HANDLE_SIZE,
            handle_inset: HANDLE_INSET,
            block_edge_margin: BLOCK_EDGE_MARGIN,
            zone_edge_margin: ZONE_EDGE_MARGIN,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON. Missing fields take their defaults and
    /// unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value fails [`EditorConfig::validate`].
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for a usable value.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as [`ConfigError::Invalid`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("fit_padding", self.fit_padding),
            ("drag_interior_padding", self.drag_interior_padding),
            ("hover_threshold", self.hover_threshold),
            ("guide_tolerance", self.guide_tolerance),
            ("tween_ms", self.tween_ms),
            ("create_opacity", self.create_opacity),
            ("create_scale", self.create_scale),
            ("duplicate_offset", self.duplicate_offset),
            ("handle_size", self.handle_size),
            ("handle_inset", self.handle_inset),
            ("block_edge_margin", self.block_edge_margin),
            ("zone_edge_margin", self.zone_edge_margin),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::Invalid { field, reason: "must be finite" });
            }
            if value < 0.0 {
                return Err(ConfigError::Invalid { field, reason: "must not be negative" });
            }
        }
        for (field, value) in [("zone_min_w", self.zone_min_w), ("zone_min_h", self.zone_min_h)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid { field, reason: "must be a positive number" });
            }
        }
        if !(0.0..=1.0).contains(&self.guide_overlap_ratio) {
            return Err(ConfigError::Invalid { field: "guide_overlap_ratio", reason: "must be within [0, 1]" });
        }
        if self.create_opacity > 1.0 {
            return Err(ConfigError::Invalid { field: "create_opacity", reason: "must be within [0, 1]" });
        }
        Ok(())
    }
}
