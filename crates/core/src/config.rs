//! Overlay configuration and its JSON form.
//!
//! Every tunable lives in one of four sections (grid, contour, cache,
//! streamline), each with a `Default` carrying the stock values. The JSON
//! form is a flat object; missing or mistyped keys fall back to defaults so a
//! host can override only what it cares about.

use serde_json::{json, Value};

use crate::cache::CacheConfig;
use crate::contour::ContourConfig;
use crate::error::OverlayError;
use crate::grid::GridConfig;
use crate::streamline::StreamlineConfig;

/// All overlay tunables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayConfig {
    pub grid: GridConfig,
    pub contour: ContourConfig,
    pub cache: CacheConfig,
    pub streamline: StreamlineConfig,
}

fn f64_or(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

fn usize_or(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

fn u64_or(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}

/// A JSON array of numbers; anything else (including a single non-numeric
/// element) yields the default.
fn f64_list_or(params: &Value, name: &str, default: &[f64]) -> Vec<f64> {
    params
        .get(name)
        .and_then(Value::as_array)
        .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>())
        .unwrap_or_else(|| default.to_vec())
}

/// Caps on values that size allocations.
const MAX_GRID_DIM: usize = 4096;
const MAX_RAYS_PER_SOURCE: usize = 360;
const MAX_STREAMLINE_STEPS: usize = 10_000;

fn require_at_most(name: &str, value: usize, max: usize) -> Result<(), OverlayError> {
    if value <= max {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be at most {max}")))
    }
}

fn invalid(name: &str, reason: &str) -> OverlayError {
    OverlayError::InvalidConfig {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), OverlayError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, "must be a positive finite number"))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), OverlayError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, "must be a non-negative finite number"))
    }
}

impl OverlayConfig {
    /// Reads a flat JSON object, falling back to defaults key by key.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            grid: GridConfig {
                screen_interval: f64_or(params, "screen_interval", d.grid.screen_interval),
                min_step: f64_or(params, "min_step", d.grid.min_step),
                max_dim: usize_or(params, "max_dim", d.grid.max_dim),
                close_threshold: f64_or(params, "close_threshold", d.grid.close_threshold),
            },
            contour: ContourConfig {
                levels: f64_list_or(params, "levels", &d.contour.levels),
                lod_medium: usize_or(params, "lod_medium", d.contour.lod_medium),
                lod_sparse: usize_or(params, "lod_sparse", d.contour.lod_sparse),
            },
            cache: CacheConfig {
                cadence: u64_or(params, "cadence", d.cache.cadence),
                movement_threshold_sq: f64_or(
                    params,
                    "movement_threshold_sq",
                    d.cache.movement_threshold_sq,
                ),
                strength_epsilon: f64_or(params, "strength_epsilon", d.cache.strength_epsilon),
                viewport_epsilon: f64_or(params, "viewport_epsilon", d.cache.viewport_epsilon),
            },
            streamline: StreamlineConfig {
                rays_per_source: usize_or(params, "rays_per_source", d.streamline.rays_per_source),
                start_offset: f64_or(params, "start_offset", d.streamline.start_offset),
                max_steps: usize_or(params, "max_steps", d.streamline.max_steps),
                step_length: f64_or(params, "step_length", d.streamline.step_length),
                // Streamlines stop where the sampler stops sampling.
                close_threshold: f64_or(params, "close_threshold", d.streamline.close_threshold),
                min_field: f64_or(params, "min_field", d.streamline.min_field),
            },
        }
    }

    /// Current values in the same flat shape `from_json` reads.
    pub fn to_json(&self) -> Value {
        json!({
            "screen_interval": self.grid.screen_interval,
            "min_step": self.grid.min_step,
            "max_dim": self.grid.max_dim,
            "close_threshold": self.grid.close_threshold,
            "levels": self.contour.levels,
            "lod_medium": self.contour.lod_medium,
            "lod_sparse": self.contour.lod_sparse,
            "cadence": self.cache.cadence,
            "movement_threshold_sq": self.cache.movement_threshold_sq,
            "strength_epsilon": self.cache.strength_epsilon,
            "viewport_epsilon": self.cache.viewport_epsilon,
            "rays_per_source": self.streamline.rays_per_source,
            "start_offset": self.streamline.start_offset,
            "max_steps": self.streamline.max_steps,
            "step_length": self.streamline.step_length,
            "min_field": self.streamline.min_field,
        })
    }

    /// Describes every key: type, default, and meaning.
    pub fn schema() -> Value {
        let d = Self::default();
        json!({
            "screen_interval": {"type": "number", "default": d.grid.screen_interval,
                "description": "On-screen contour sampling interval in pixels"},
            "min_step": {"type": "number", "default": d.grid.min_step,
                "description": "Smallest world-space grid step"},
            "max_dim": {"type": "integer", "default": d.grid.max_dim, "max": MAX_GRID_DIM,
                "description": "Maximum grid nodes per axis"},
            "close_threshold": {"type": "number", "default": d.grid.close_threshold,
                "description": "Near-field radius: invalid grid nodes and streamline sinks"},
            "levels": {"type": "array", "default": d.contour.levels,
                "description": "Equipotential levels to draw"},
            "lod_medium": {"type": "integer", "default": d.contour.lod_medium,
                "description": "Source count from which the weakest levels are dropped"},
            "lod_sparse": {"type": "integer", "default": d.contour.lod_sparse,
                "description": "Source count from which only the strongest levels remain"},
            "cadence": {"type": "integer", "default": d.cache.cadence,
                "description": "Frames between unconditional contour recomputes (0 = never)"},
            "movement_threshold_sq": {"type": "number", "default": d.cache.movement_threshold_sq,
                "description": "Squared source drift that invalidates cached contours"},
            "strength_epsilon": {"type": "number", "default": d.cache.strength_epsilon,
                "description": "Strength change that invalidates cached contours"},
            "viewport_epsilon": {"type": "number", "default": d.cache.viewport_epsilon,
                "description": "Summed viewport corner movement that invalidates cached contours"},
            "rays_per_source": {"type": "integer", "default": d.streamline.rays_per_source,
                "max": MAX_RAYS_PER_SOURCE,
                "description": "Field lines seeded around each source"},
            "start_offset": {"type": "number", "default": d.streamline.start_offset,
                "description": "Distance from the source where a field line starts"},
            "max_steps": {"type": "integer", "default": d.streamline.max_steps,
                "max": MAX_STREAMLINE_STEPS,
                "description": "Maximum integration steps per field line"},
            "step_length": {"type": "number", "default": d.streamline.step_length,
                "description": "World-space length of one integration step"},
            "min_field": {"type": "number", "default": d.streamline.min_field,
                "description": "Field magnitude below which a field line stops"},
        })
    }

    /// Rejects values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<(), OverlayError> {
        require_positive("screen_interval", self.grid.screen_interval)?;
        require_positive("min_step", self.grid.min_step)?;
        if self.grid.max_dim < 2 {
            return Err(invalid("max_dim", "must be at least 2"));
        }
        require_at_most("max_dim", self.grid.max_dim, MAX_GRID_DIM)?;
        require_non_negative("close_threshold", self.grid.close_threshold)?;
        if self.contour.levels.is_empty() {
            return Err(invalid("levels", "must not be empty"));
        }
        if self.contour.levels.iter().any(|l| !l.is_finite()) {
            return Err(invalid("levels", "must all be finite"));
        }
        if self.contour.lod_sparse < self.contour.lod_medium {
            return Err(invalid("lod_sparse", "must not be below lod_medium"));
        }
        require_non_negative("movement_threshold_sq", self.cache.movement_threshold_sq)?;
        require_non_negative("strength_epsilon", self.cache.strength_epsilon)?;
        require_non_negative("viewport_epsilon", self.cache.viewport_epsilon)?;
        require_at_most(
            "rays_per_source",
            self.streamline.rays_per_source,
            MAX_RAYS_PER_SOURCE,
        )?;
        require_at_most("max_steps", self.streamline.max_steps, MAX_STREAMLINE_STEPS)?;
        require_non_negative("start_offset", self.streamline.start_offset)?;
        require_positive("step_length", self.streamline.step_length)?;
        require_non_negative("min_field", self.streamline.min_field)?;
        Ok(())
    }
}
