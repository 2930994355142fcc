//! Error types
//!
//! Spawn errors are reported to the caller and never abort a frame or a
//! level load. Config errors surface from JSON loading.

use std::path::PathBuf;

use glam::Vec2;
use thiserror::Error;

use crate::sim::EntityKind;

/// Why the entity factory refused to create an entity
#[derive(Debug, Error, PartialEq)]
pub enum SpawnError {
    #[error("{kind:?} spawn at ({}, {}) is outside the world bounds", .position.x, .position.y)]
    OutOfBounds { kind: EntityKind, position: Vec2 },
    #[error("{kind:?} spawn has a non-finite position, rotation or velocity")]
    NonFinite { kind: EntityKind },
    #[error("{kind:?} fixture is invalid: {reason}")]
    InvalidFixture { kind: EntityKind, reason: &'static str },
    #[error("{kind:?} fixture declares no collision category")]
    EmptyCategory { kind: EntityKind },
    #[error("no launch attempts left")]
    NoAttemptsLeft,
}

/// Failure loading settings or level declarations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
