//! Screen lifecycle
//!
//! A screen is driven through preload, show, render (once per frame) and
//! unload. Assets are passed in explicitly; screens never reach for a global
//! cache.

use crate::assets::AssetContext;
use crate::sim::{FrameReport, HudSnapshot, Level, LoadSummary, PhysicsWorld, Simulation, Stage};

pub trait Screen {
    /// Acquire everything the screen needs before it is shown
    fn preload(&mut self, assets: &mut AssetContext);
    fn show(&mut self, assets: &AssetContext);
    /// Advance one frame. Returns `None` while the screen is not shown.
    fn render(&mut self, delta: f32) -> Option<FrameReport>;
    /// Release what `preload` acquired
    fn unload(&mut self, assets: &mut AssetContext);
}

/// Gameplay screen: one level running in a simulation
pub struct GameScreen<W: PhysicsWorld, S: Stage> {
    level: Level,
    sim: Simulation<W, S>,
    last_report: Option<FrameReport>,
    shown: bool,
}

impl<W: PhysicsWorld, S: Stage> GameScreen<W, S> {
    pub fn new(level: Level, sim: Simulation<W, S>) -> Self {
        Self {
            level,
            sim,
            last_report: None,
            shown: false,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn simulation(&self) -> &Simulation<W, S> {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation<W, S> {
        &mut self.sim
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    pub fn hud(&self) -> HudSnapshot {
        self.sim.snapshot()
    }

    /// Rebuild the level in place
    pub fn restart(&mut self) -> LoadSummary {
        self.last_report = None;
        self.sim.restart()
    }
}

impl<W: PhysicsWorld, S: Stage> Screen for GameScreen<W, S> {
    fn preload(&mut self, assets: &mut AssetContext) {
        self.level.preload(assets);
    }

    fn show(&mut self, assets: &AssetContext) {
        let def = self.level.definition();
        for (path, _) in def.assets() {
            if !assets.is_loaded(path) {
                log::warn!("Showing '{}' without asset {}", self.level.name(), path);
            }
        }
        self.level.show(&mut self.sim);
        self.last_report = None;
        self.shown = true;
    }

    fn render(&mut self, delta: f32) -> Option<FrameReport> {
        if !self.shown {
            return None;
        }
        let report = self.sim.tick(delta);
        self.last_report = Some(report.clone());
        Some(report)
    }

    fn unload(&mut self, assets: &mut AssetContext) {
        self.sim.unload_level();
        self.level.unload(assets);
        self.last_report = None;
        self.shown = false;
    }
}
