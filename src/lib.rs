//! Angr - simulation and scoring core for a 2D projectile physics game
//!
//! Core modules:
//! - `sim`: Physics stepping, collision classification, deferred destruction, game state
//! - `settings`: Data-driven tuning loaded from JSON
//! - `assets`: Explicit asset lifetime tracking for levels and screens
//! - `screen`: Screen lifecycle (preload, show, render, unload)
//! - `error`: Error types for spawning and configuration

pub mod assets;
pub mod error;
pub mod screen;
pub mod settings;
pub mod sim;

pub use assets::AssetContext;
pub use error::{ConfigError, SpawnError};
pub use screen::{GameScreen, Screen};
pub use settings::{Settings, WorldBounds};

/// Game configuration constants
pub mod consts {
    /// Earth-like gravity along -Y
    pub const GRAVITY_Y: f32 = -9.8;
    /// Solver iterations handed to the physics world every step
    pub const VELOCITY_ITERATIONS: u32 = 6;
    pub const POSITION_ITERATIONS: u32 = 2;
    /// Host deltas above this are clamped before stepping
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Scoring
    pub const PROJECTILE_HIT_POINTS: u32 = 10;
    pub const TARGET_TOPPLE_POINTS: u32 = 5;
    pub const TARGET_LOST_POINTS: u32 = 10;
    /// Minimum approach speed for a target to take damage from walls or other targets
    pub const TARGET_BREAK_SPEED: f32 = 150.0;

    /// Launch attempts granted per level
    pub const LAUNCH_ATTEMPTS: u32 = 5;

    /// Entity defaults
    pub const CRATE_HALF_EXTENT: f32 = 40.0;
    pub const GRENADE_RADIUS: f32 = 12.0;
    pub const GRENADE_BLAST_RADIUS: f32 = 120.0;
}

