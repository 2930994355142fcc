//! Simulation settings
//!
//! Loaded from a JSON file; every field falls back to its default when absent.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Axis-aligned region where entities may be spawned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min: Vec2::new(-1000.0, -1000.0),
            max: Vec2::new(12000.0, 6000.0),
        }
    }
}

impl WorldBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Inclusive containment check
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Tuning for the physics step and the scoring rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Physics ===
    /// Gravity applied to dynamic bodies
    pub gravity: Vec2,
    /// Solver iterations per step
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    /// Host frame deltas are clamped to this before stepping
    pub max_frame_dt: f32,
    /// Spawns outside these bounds are rejected
    pub bounds: WorldBounds,

    // === Rules ===
    /// Approach speed a target must exceed to take damage from walls or other targets
    pub target_break_speed: f32,
    /// Points for a projectile striking a target
    pub projectile_hit_points: u32,
    /// Points for a target breaking against a wall
    pub target_topple_points: u32,
    /// Points for a target leaving the arena
    pub target_lost_points: u32,
    /// Launches the player gets per level unless the level overrides it
    pub launch_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, GRAVITY_Y),
            velocity_iterations: VELOCITY_ITERATIONS,
            position_iterations: POSITION_ITERATIONS,
            max_frame_dt: MAX_FRAME_DT,
            bounds: WorldBounds::default(),

            target_break_speed: TARGET_BREAK_SPEED,
            projectile_hit_points: PROJECTILE_HIT_POINTS,
            target_topple_points: TARGET_TOPPLE_POINTS,
            target_lost_points: TARGET_LOST_POINTS,
            launch_attempts: LAUNCH_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings from `path` if given, falling back to defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load(path).unwrap_or_else(|e| {
                log::warn!("{e}; using default settings");
                Self::default()
            }),
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Frame delta actually handed to the physics world, or `None` if the step must be skipped
    pub fn effective_dt(&self, dt: f32) -> Option<f32> {
        if dt.is_finite() && dt > 0.0 {
            Some(dt.min(self.max_frame_dt))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "velocity_iterations": 8 }"#).unwrap();
        assert_eq!(settings.velocity_iterations, 8);
        assert_eq!(settings.position_iterations, POSITION_ITERATIONS);
        assert_eq!(settings.gravity, Vec2::new(0.0, GRAVITY_Y));
    }

    #[test]
    fn test_effective_dt() {
        let settings = Settings::default();
        assert_eq!(settings.effective_dt(0.0), None);
        assert_eq!(settings.effective_dt(-0.016), None);
        assert_eq!(settings.effective_dt(f32::NAN), None);
        assert_eq!(settings.effective_dt(0.016), Some(0.016));
        assert_eq!(settings.effective_dt(5.0), Some(MAX_FRAME_DT));
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = WorldBounds::new(Vec2::ZERO, Vec2::new(100.0, 50.0));
        assert!(bounds.contains(Vec2::new(100.0, 50.0)));
        assert!(!bounds.contains(Vec2::new(100.1, 10.0)));
        assert!(!bounds.contains(Vec2::new(10.0, -0.1)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/nonexistent/angr-settings.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
