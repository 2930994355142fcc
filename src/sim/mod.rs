//! Simulation core
//!
//! Everything that runs inside or around the physics step:
//! - The physics world seam and the built-in arcade backend
//! - Collision classification by category pair
//! - Deferred destruction through a per-frame queue
//! - Entity construction from per-kind templates
//! - Score and progress counters
//!
//! Nothing here renders or touches the platform.

pub mod arcade;
pub mod category;
pub mod classifier;
pub mod collision;
pub mod destruction;
pub mod entity;
pub mod factory;
pub mod level;
pub mod stage;
pub mod state;
pub mod tick;
pub mod world;

pub use arcade::ArcadeWorld;
pub use category::{Category, PairKey};
pub use classifier::{CollisionClassifier, CollisionEvent, Fate, GameEvent, PairRule, RuleTable};
pub use collision::CollisionResult;
pub use destruction::DestructionQueue;
pub use entity::{Entity, EntityId, EntityKind, EntityRegistry, Payload};
pub use factory::{EntityFactory, FixtureOverride, FixtureTemplate, SpawnParams, TemplateTable};
pub use level::{Level, LevelDef, SpawnDecl};
pub use stage::{ActorHandle, HeadlessStage, Stage};
pub use state::{GameState, GameStatus, HudSnapshot, LevelGoal};
pub use tick::{FrameReport, LoadSummary, Removal, Simulation};
pub use world::{
    BodyDef, BodyHandle, BodyType, Contact, ContactListener, FixtureDef, FixtureView, PhysicsWorld, Shape,
};
