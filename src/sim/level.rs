//! Level declarations
//!
//! A level is plain data: the assets it needs, per-kind fixture overrides and
//! a list of spawn declarations. The built-in levels are a closed set of
//! variants; custom levels can be loaded from JSON.

use std::path::Path;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::entity::EntityKind;
use super::factory::{FixtureOverride, SpawnParams};
use super::stage::Stage;
use super::tick::{LoadSummary, Simulation};
use super::world::{PhysicsWorld, Shape};
use crate::assets::{AssetContext, AssetKind};
use crate::consts::CRATE_HALF_EXTENT;
use crate::error::ConfigError;

/// One entity placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnDecl {
    pub kind: EntityKind,
    pub position: Vec2,
    /// Radians
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub params: SpawnParams,
}

impl SpawnDecl {
    pub fn new(kind: EntityKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            rotation: 0.0,
            params: SpawnParams::default(),
        }
    }

    pub fn rotated(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.params.fixture.shape = Some(shape);
        self
    }

    pub fn with_health(mut self, health: u32) -> Self {
        self.params.health = Some(health);
        self
    }
}

/// Complete description of a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub name: String,
    /// Map asset path
    pub map: String,
    #[serde(default)]
    pub music: Option<String>,
    /// Launch attempts; falls back to the settings value
    #[serde(default)]
    pub attempts: Option<u32>,
    /// Fixture overrides layered onto the per-kind defaults
    #[serde(default)]
    pub overrides: Vec<(EntityKind, FixtureOverride)>,
    pub spawns: Vec<SpawnDecl>,
}

impl LevelDef {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Declared targets (some may still be rejected at spawn time)
    pub fn declared_targets(&self) -> usize {
        self.spawns.iter().filter(|s| s.kind.counts_as_target()).count()
    }

    /// Asset paths with their kinds
    pub fn assets(&self) -> Vec<(&str, AssetKind)> {
        let mut assets = vec![(self.map.as_str(), AssetKind::Map)];
        if let Some(music) = &self.music {
            assets.push((music.as_str(), AssetKind::Music));
        }
        assets
    }
}

/// Built-in and custom levels
#[derive(Debug, Clone, PartialEq)]
pub enum Level {
    /// Ten crates and five falling grenades over flat ground
    Proving,
    /// Seeded crate stacks
    Barrage { seed: u64 },
    Custom(LevelDef),
}

/// Ground top sits at y = 0 across the whole playfield
const GROUND_CENTER: Vec2 = Vec2::new(5000.0, -50.0);
const GROUND_HALF_EXTENTS: Vec2 = Vec2::new(6000.0, 50.0);
const KILL_ZONE_CENTER: Vec2 = Vec2::new(5000.0, -800.0);
const KILL_ZONE_HALF_EXTENTS: Vec2 = Vec2::new(7000.0, 100.0);

/// Ground fixture used by the built-in levels
fn ground_override() -> FixtureOverride {
    FixtureOverride {
        density: Some(0.6),
        friction: Some(0.7),
        restitution: Some(0.3),
        category: Some(Category::WALL),
        ..Default::default()
    }
}

/// Ground slab plus the kill zone below it
fn terrain() -> Vec<SpawnDecl> {
    vec![
        SpawnDecl::new(EntityKind::Ground, GROUND_CENTER).with_shape(Shape::Rect {
            half_extents: GROUND_HALF_EXTENTS,
        }),
        SpawnDecl::new(EntityKind::KillZone, KILL_ZONE_CENTER).with_shape(Shape::Rect {
            half_extents: KILL_ZONE_HALF_EXTENTS,
        }),
    ]
}

impl Level {
    pub fn name(&self) -> &str {
        match self {
            Level::Proving => "proving",
            Level::Barrage { .. } => "barrage",
            Level::Custom(def) => &def.name,
        }
    }

    /// Build the declaration for this level
    pub fn definition(&self) -> LevelDef {
        match self {
            Level::Proving => proving(),
            Level::Barrage { seed } => barrage(*seed),
            Level::Custom(def) => def.clone(),
        }
    }

    pub fn preload(&self, assets: &mut AssetContext) {
        for (path, kind) in self.definition().assets() {
            assets.load(path, kind);
        }
    }

    /// Populate the simulation with this level
    pub fn show<W: PhysicsWorld, S: Stage>(&self, sim: &mut Simulation<W, S>) -> LoadSummary {
        sim.load_level(&self.definition())
    }

    pub fn unload(&self, assets: &mut AssetContext) {
        for (path, _) in self.definition().assets() {
            assets.unload(path);
        }
    }
}

fn proving() -> LevelDef {
    let mut spawns = terrain();

    for i in 0..10 {
        spawns.push(SpawnDecl::new(
            EntityKind::Crate,
            Vec2::new(1000.0 + i as f32 * 300.0, 400.0),
        ));
    }

    for i in 0..5 {
        spawns.push(
            SpawnDecl::new(EntityKind::Grenade, Vec2::new(1000.0 + i as f32 * 450.0, 500.0))
                .rotated(90f32.to_radians()),
        );
    }

    LevelDef {
        name: "proving".into(),
        map: "mappi".into(),
        music: Some("data/march.mp3".into()),
        attempts: None,
        overrides: vec![(EntityKind::Ground, ground_override())],
        spawns,
    }
}

fn barrage(seed: u64) -> LevelDef {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut spawns = terrain();

    let stacks: u32 = rng.random_range(3..=6);
    let spacing = 6000.0 / stacks as f32;
    for stack in 0..stacks {
        let x = 3000.0 + stack as f32 * spacing + rng.random_range(0.0..spacing * 0.5);
        let height: u32 = rng.random_range(1..=4);
        for layer in 0..height {
            // One unit gap so stacked crates start just apart
            let y = CRATE_HALF_EXTENT + layer as f32 * (2.0 * CRATE_HALF_EXTENT + 1.0) + 1.0;
            let health = if rng.random_bool(0.25) { 2 } else { 1 };
            spawns.push(SpawnDecl::new(EntityKind::Crate, Vec2::new(x, y)).with_health(health));
        }
    }

    log::info!("Barrage seed {}: {} stacks", seed, stacks);

    LevelDef {
        name: format!("barrage-{seed}"),
        map: "barrage".into(),
        music: Some("data/march.mp3".into()),
        attempts: Some(3 + stacks),
        overrides: vec![(EntityKind::Ground, ground_override())],
        spawns,
    }
}
