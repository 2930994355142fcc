//! Simulation loop
//!
//! Once per frame `tick` drains the destruction queue, then steps the
//! physics world. Contact callbacks fired during the step only record
//! intents (score changes, queued removals); bodies are destroyed at the
//! start of the following tick, never while the world is stepping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::classifier::{CollisionClassifier, ContactRouter, Effects, GameEvent, RuleTable};
use super::destruction::DestructionQueue;
use super::entity::{EntityId, EntityKind, EntityRegistry};
use super::factory::{EntityFactory, SpawnParams, TemplateTable};
use super::level::LevelDef;
use super::stage::Stage;
use super::state::{GameState, GameStatus, HudSnapshot, LevelGoal};
use super::world::PhysicsWorld;
use crate::error::SpawnError;
use crate::settings::Settings;

/// An entity taken out of the world during a drain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Removal {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Last known position, for explosion and debris effects
    pub position: Vec2,
    pub blast_radius: Option<f32>,
}

/// What happened during one `tick`
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Entities removed before the step
    pub removed: Vec<Removal>,
    /// Rules that fired during the step
    pub events: Vec<GameEvent>,
    /// False when the delta was degenerate and the step was skipped
    pub stepped: bool,
    pub hud: HudSnapshot,
}

/// Outcome of loading a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    pub spawned: usize,
    pub rejected: usize,
}

/// Owns the world and everything that coordinates around its step
pub struct Simulation<W: PhysicsWorld, S: Stage> {
    world: W,
    stage: S,
    settings: Settings,
    factory: EntityFactory,
    registry: EntityRegistry,
    queue: DestructionQueue,
    classifier: CollisionClassifier,
    state: GameState,
    level: Option<LevelDef>,
    last_status: GameStatus,
    frame: u64,
}

impl<W: PhysicsWorld, S: Stage> Simulation<W, S> {
    pub fn new(mut world: W, stage: S, settings: Settings) -> Self {
        world.set_gravity(settings.gravity);
        let rules = RuleTable::standard(&settings);
        let state = GameState::new(LevelGoal {
            targets: 0,
            attempts: settings.launch_attempts,
        });
        Self {
            world,
            stage,
            factory: EntityFactory::new(TemplateTable::new(), settings.bounds),
            registry: EntityRegistry::new(),
            queue: DestructionQueue::new(),
            classifier: CollisionClassifier::new(rules),
            last_status: state.status(),
            state,
            settings,
            level: None,
            frame: 0,
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &DestructionQueue {
        &self.queue
    }

    pub fn classifier(&self) -> &CollisionClassifier {
        &self.classifier
    }

    /// Replace the rule table (content-specific gameplay)
    pub fn set_rules(&mut self, rules: RuleTable) {
        self.classifier = CollisionClassifier::new(rules);
    }

    pub fn level(&self) -> Option<&LevelDef> {
        self.level.as_ref()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn snapshot(&self) -> HudSnapshot {
        self.state.snapshot()
    }

    /// Create an entity; projectiles and targets are counted in the game state
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        rotation: f32,
        params: &SpawnParams,
    ) -> Result<EntityId, SpawnError> {
        let id = self.factory.spawn(
            &mut self.world,
            &mut self.stage,
            &mut self.registry,
            kind,
            position,
            rotation,
            params,
        )?;
        if kind.is_projectile() {
            self.state.projectile_spawned();
        }
        if kind.counts_as_target() {
            self.state.target_added();
        }
        Ok(id)
    }

    /// Player launch: consumes an attempt, then spawns a projectile
    pub fn launch(&mut self, position: Vec2, velocity: Vec2) -> Result<EntityId, SpawnError> {
        if self.state.attempts_remaining() == 0 {
            return Err(SpawnError::NoAttemptsLeft);
        }
        let id = self.spawn(
            EntityKind::Grenade,
            position,
            velocity.y.atan2(velocity.x),
            &SpawnParams::with_velocity(velocity),
        )?;
        self.state.consume_attempt();
        log::debug!("Launched {:?}, {} attempts left", id, self.state.attempts_remaining());
        Ok(id)
    }

    /// Tear down the current level and build `level` from scratch
    pub fn load_level(&mut self, level: &LevelDef) -> LoadSummary {
        self.clear_entities();
        self.classifier.reset();

        let templates = self.factory.templates_mut();
        templates.reset();
        for (kind, o) in &level.overrides {
            templates.apply_override(*kind, o);
        }

        self.state.reset(LevelGoal {
            targets: 0,
            attempts: level.attempts.unwrap_or(self.settings.launch_attempts),
        });

        let mut summary = LoadSummary::default();
        for decl in &level.spawns {
            match self.spawn(decl.kind, decl.position, decl.rotation, &decl.params) {
                Ok(_) => summary.spawned += 1,
                Err(e) => {
                    log::warn!("Level '{}': {}", level.name, e);
                    summary.rejected += 1;
                }
            }
        }

        self.level = Some(level.clone());
        self.last_status = self.state.status();
        log::info!(
            "Level '{}' loaded: {} entities, {} rejected, {} targets",
            level.name,
            summary.spawned,
            summary.rejected,
            self.state.targets_remaining()
        );
        summary
    }

    /// Reload the current level; with no level loaded just resets counters
    pub fn restart(&mut self) -> LoadSummary {
        match self.level.clone() {
            Some(level) => self.load_level(&level),
            None => {
                self.clear_entities();
                self.classifier.reset();
                self.state.reset(LevelGoal {
                    targets: 0,
                    attempts: self.settings.launch_attempts,
                });
                LoadSummary::default()
            }
        }
    }

    /// Remove every entity and forget the level
    pub fn unload_level(&mut self) {
        self.clear_entities();
        self.classifier.reset();
        if let Some(level) = self.level.take() {
            log::info!("Level '{}' unloaded", level.name);
        }
    }

    /// Route every live entity through the destruction queue
    fn clear_entities(&mut self) {
        self.queue.clear();
        let ids: Vec<EntityId> = self.registry.iter().map(|e| e.id).collect();
        for id in ids {
            self.queue.enqueue(id);
        }
        self.drain_destruction();
    }

    /// Remove queued entities from the world and the stage
    fn drain_destruction(&mut self) -> Vec<Removal> {
        let ids = self.queue.drain_and_clear();
        let mut removed = Vec::with_capacity(ids.len());

        for id in ids {
            let Some(entity) = self.registry.remove(id) else {
                log::debug!("{:?} already removed", id);
                continue;
            };

            let position = self
                .world
                .body_position(entity.body)
                .map(|(pos, _)| pos)
                .unwrap_or_default();
            // Clear the back-reference before the body goes away
            self.world.set_user_data(entity.body, None);
            if !self.world.destroy_body(entity.body) {
                log::debug!("Body for {:?} was already gone", id);
            }
            if !self.stage.remove_actor(entity.actor) {
                log::debug!("Actor for {:?} was already detached", id);
            }

            removed.push(Removal {
                id,
                kind: entity.kind,
                position,
                blast_radius: entity.payload.blast_radius,
            });
        }

        if !removed.is_empty() {
            log::debug!("Frame {}: removed {} entities", self.frame, removed.len());
        }
        removed
    }

    /// Queue projectiles whose bodies left the world bounds
    fn retire_escaped_projectiles(&mut self) {
        let bounds = self.settings.bounds;
        for entity in self.registry.iter().filter(|e| e.kind.is_projectile()) {
            let Some((position, _)) = self.world.body_position(entity.body) else {
                continue;
            };
            if bounds.contains(position) || !self.queue.enqueue(entity.id) {
                continue;
            }
            self.state.projectile_spent();
            log::debug!("{:?} left the world at ({}, {})", entity.id, position.x, position.y);
        }
    }

    /// Advance one frame
    pub fn tick(&mut self, dt: f32) -> FrameReport {
        let removed = self.drain_destruction();

        let mut events = Vec::new();
        let stepped = match self.settings.effective_dt(dt) {
            Some(step_dt) => {
                let mut router = ContactRouter {
                    classifier: &mut self.classifier,
                    effects: Effects {
                        state: &mut self.state,
                        queue: &mut self.queue,
                        registry: &mut self.registry,
                        events: &mut events,
                    },
                };
                self.world.step(
                    step_dt,
                    self.settings.velocity_iterations,
                    self.settings.position_iterations,
                    &mut router,
                );
                self.classifier.end_step();
                self.retire_escaped_projectiles();
                true
            }
            None => {
                log::trace!("Skipping step for degenerate delta {}", dt);
                false
            }
        };

        self.frame += 1;

        let status = self.state.status();
        if status != self.last_status {
            log::info!("Status {:?} -> {:?} (score {})", self.last_status, status, self.state.score());
            self.last_status = status;
        }

        FrameReport {
            removed,
            events,
            stepped,
            hud: self.state.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arcade::ArcadeWorld;
    use crate::sim::classifier::CollisionEvent;
    use crate::sim::level::{Level, SpawnDecl};
    use crate::sim::stage::HeadlessStage;

    const DT: f32 = 1.0 / 60.0;

    fn sim() -> Simulation<ArcadeWorld, HeadlessStage> {
        let settings = Settings::default();
        Simulation::new(ArcadeWorld::new(settings.gravity), HeadlessStage::new(), settings)
    }

    fn drop_test_level() -> LevelDef {
        LevelDef {
            name: "drop".into(),
            map: "drop".into(),
            music: None,
            attempts: Some(2),
            overrides: Vec::new(),
            spawns: vec![
                SpawnDecl::new(EntityKind::Ground, Vec2::new(0.0, -50.0)),
                SpawnDecl::new(EntityKind::Crate, Vec2::new(0.0, 40.0)),
            ],
        }
    }

    #[test]
    fn test_degenerate_delta_skips_step() {
        let mut sim = sim();
        sim.load_level(&drop_test_level());
        let grenade = sim
            .spawn(EntityKind::Grenade, Vec2::new(0.0, 300.0), 0.0, &SpawnParams::default())
            .unwrap();
        let body = sim.registry().get(grenade).unwrap().body;
        let before = sim.world().body_position(body);

        for dt in [0.0, -1.0, f32::NAN] {
            let report = sim.tick(dt);
            assert!(!report.stepped);
        }
        assert_eq!(sim.world().body_position(body), before);
        assert_eq!(sim.frame(), 3);
    }

    #[test]
    fn test_grenade_dropped_on_crate_scores_and_is_removed_next_tick() {
        let mut sim = sim();
        sim.load_level(&drop_test_level());
        assert_eq!(sim.state().targets_remaining(), 1);

        let grenade = sim
            .spawn(EntityKind::Grenade, Vec2::new(0.0, 100.0), 0.0, &SpawnParams::default())
            .unwrap();

        let mut hit_frame = None;
        for frame in 0..600 {
            let report = sim.tick(DT);
            if report
                .events
                .iter()
                .any(|e| e.event == CollisionEvent::ProjectileHitTarget)
            {
                hit_frame = Some(frame);
                // Doomed but still in the world until the next drain
                assert!(sim.registry().contains(grenade));
                assert!(sim.queue().contains(grenade));
                break;
            }
        }
        assert!(hit_frame.is_some(), "grenade never hit the crate");

        let report = sim.tick(DT);
        assert_eq!(report.removed.len(), 2);
        assert!(!sim.registry().contains(grenade));
        assert_eq!(sim.snapshot().score, 10);
        assert_eq!(sim.snapshot().status, GameStatus::Won);
        assert_eq!(sim.stage().actor_count(), 1);
    }

    #[test]
    fn test_launch_consumes_attempts() {
        let mut sim = sim();
        sim.load_level(&drop_test_level());
        sim.launch(Vec2::new(0.0, 500.0), Vec2::new(10.0, 0.0)).unwrap();
        sim.launch(Vec2::new(0.0, 600.0), Vec2::new(10.0, 0.0)).unwrap();
        assert_eq!(
            sim.launch(Vec2::new(0.0, 700.0), Vec2::ZERO),
            Err(SpawnError::NoAttemptsLeft)
        );
        assert_eq!(sim.state().launches(), 2);
        assert_eq!(sim.state().projectiles_in_flight(), 2);
    }

    #[test]
    fn test_rejected_launch_keeps_attempt() {
        let mut sim = sim();
        sim.load_level(&drop_test_level());
        let err = sim.launch(Vec2::new(-50_000.0, 0.0), Vec2::X).unwrap_err();
        assert!(matches!(err, SpawnError::OutOfBounds { .. }));
        assert_eq!(sim.state().attempts_remaining(), 2);
    }

    #[test]
    fn test_escaped_projectiles_are_retired() {
        let mut sim = sim();
        sim.load_level(&drop_test_level());
        let far_right = Vec2::new(11_900.0, 5_000.0);
        let first = sim.launch(far_right, Vec2::new(6_000.0, 0.0)).unwrap();
        let second = sim.launch(far_right, Vec2::new(6_000.0, 200.0)).unwrap();
        assert_eq!(sim.state().attempts_remaining(), 0);
        assert_eq!(sim.snapshot().status, GameStatus::InProgress);

        let mut removed = Vec::new();
        for _ in 0..10 {
            let report = sim.tick(DT);
            removed.extend(report.removed.iter().map(|r| r.id));
        }

        assert!(removed.contains(&first) && removed.contains(&second));
        assert_eq!(sim.state().projectiles_in_flight(), 0);
        assert_eq!(sim.snapshot().status, GameStatus::Lost);
        assert_eq!(sim.world().body_count(), 2);
    }

    #[test]
    fn test_restart_twice_is_stable() {
        let mut sim = sim();
        sim.load_level(&Level::Proving.definition());
        for _ in 0..120 {
            sim.tick(DT);
        }

        sim.restart();
        let first = sim.state().clone();
        assert!(sim.queue().is_empty());
        sim.restart();
        assert_eq!(sim.state(), &first);
        assert!(sim.queue().is_empty());
        assert_eq!(sim.registry().len(), sim.world().body_count());
        assert_eq!(sim.registry().len(), sim.stage().actor_count());
    }

    #[test]
    fn test_unload_removes_everything() {
        let mut sim = sim();
        sim.load_level(&Level::Proving.definition());
        assert!(sim.world().body_count() > 0);
        sim.unload_level();
        assert_eq!(sim.world().body_count(), 0);
        assert_eq!(sim.stage().actor_count(), 0);
        assert!(sim.registry().is_empty());
        assert!(sim.level().is_none());
    }
}
