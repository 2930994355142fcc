//! Collision classification
//!
//! Turns raw begin-contact notifications into game events. Routing is a table
//! keyed by the unordered pair of fixture categories; each rule names the
//! semantic event, an impact threshold, the points awarded and what happens
//! to each participant. Effects only touch game state and the destruction
//! queue, never the physics world.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::category::{Category, PairKey};
use super::destruction::DestructionQueue;
use super::entity::{EntityId, EntityRegistry};
use super::state::GameState;
use super::world::{BodyHandle, Contact, ContactListener, FixtureView};
use crate::settings::Settings;

/// Semantic meaning of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionEvent {
    ProjectileHitWall,
    ProjectileHitTarget,
    TargetHitWall,
    TargetHitTarget,
    ProjectileLeftArena,
    TargetLeftArena,
}

/// What a rule does to one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fate {
    Keep,
    Destroy,
    /// Remove this much health; destroyed once depleted
    Damage(u32),
}

/// Rule as declared for an ordered pair `(a, b)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairRule {
    pub event: CollisionEvent,
    /// Contacts slower than this along the normal are ignored
    pub min_impact_speed: f32,
    pub points: u32,
    pub fate_a: Fate,
    pub fate_b: Fate,
}

/// Rule stored against the normalized key
#[derive(Debug, Clone, Copy, PartialEq)]
struct StoredRule {
    event: CollisionEvent,
    min_impact_speed: f32,
    points: u32,
    fate_low: Fate,
    fate_high: Fate,
}

/// Routing table from category pairs to rules
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<PairKey, StoredRule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default gameplay rules
    pub fn standard(settings: &Settings) -> Self {
        let mut table = Self::new();
        table.insert(
            Category::PROJECTILE,
            Category::WALL,
            PairRule {
                event: CollisionEvent::ProjectileHitWall,
                min_impact_speed: 0.0,
                points: 0,
                fate_a: Fate::Destroy,
                fate_b: Fate::Keep,
            },
        );
        table.insert(
            Category::PROJECTILE,
            Category::TARGET,
            PairRule {
                event: CollisionEvent::ProjectileHitTarget,
                min_impact_speed: 0.0,
                points: settings.projectile_hit_points,
                fate_a: Fate::Destroy,
                fate_b: Fate::Damage(1),
            },
        );
        table.insert(
            Category::TARGET,
            Category::WALL,
            PairRule {
                event: CollisionEvent::TargetHitWall,
                min_impact_speed: settings.target_break_speed,
                points: settings.target_topple_points,
                fate_a: Fate::Damage(1),
                fate_b: Fate::Keep,
            },
        );
        table.insert(
            Category::TARGET,
            Category::TARGET,
            PairRule {
                event: CollisionEvent::TargetHitTarget,
                min_impact_speed: settings.target_break_speed,
                points: 0,
                fate_a: Fate::Damage(1),
                fate_b: Fate::Damage(1),
            },
        );
        table.insert(
            Category::PROJECTILE,
            Category::SENSOR,
            PairRule {
                event: CollisionEvent::ProjectileLeftArena,
                min_impact_speed: 0.0,
                points: 0,
                fate_a: Fate::Destroy,
                fate_b: Fate::Keep,
            },
        );
        table.insert(
            Category::TARGET,
            Category::SENSOR,
            PairRule {
                event: CollisionEvent::TargetLeftArena,
                min_impact_speed: 0.0,
                points: settings.target_lost_points,
                fate_a: Fate::Destroy,
                fate_b: Fate::Keep,
            },
        );
        table
    }

    /// Register a rule for `(a, b)`. For `a == b` the fate of `a` applies to both sides.
    pub fn insert(&mut self, a: Category, b: Category, rule: PairRule) {
        let (fate_low, fate_high) = if a == b {
            (rule.fate_a, rule.fate_a)
        } else if PairKey::is_ordered(a, b) {
            (rule.fate_a, rule.fate_b)
        } else {
            (rule.fate_b, rule.fate_a)
        };
        self.rules.insert(
            PairKey::new(a, b),
            StoredRule {
                event: rule.event,
                min_impact_speed: rule.min_impact_speed,
                points: rule.points,
                fate_low,
                fate_high,
            },
        );
    }

    pub fn remove(&mut self, a: Category, b: Category) {
        self.rules.remove(&PairKey::new(a, b));
    }

    /// Rule oriented to the query order: `fate_a` applies to `a`
    pub fn lookup(&self, a: Category, b: Category) -> Option<PairRule> {
        let rule = self.rules.get(&PairKey::new(a, b))?;
        let (fate_a, fate_b) = if PairKey::is_ordered(a, b) {
            (rule.fate_low, rule.fate_high)
        } else {
            (rule.fate_high, rule.fate_low)
        };
        Some(PairRule {
            event: rule.event,
            min_impact_speed: rule.min_impact_speed,
            points: rule.points,
            fate_a,
            fate_b,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Emitted whenever a rule fires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub event: CollisionEvent,
    /// Participants in category-key order, so (A, B) and (B, A) report identically
    pub first: Option<EntityId>,
    pub second: Option<EntityId>,
    pub points: u32,
    pub impact_speed: f32,
    /// Where the bodies met, for impact effects
    pub point: Vec2,
}

/// Everything a rule is allowed to touch
pub struct Effects<'a> {
    pub state: &'a mut GameState,
    pub queue: &'a mut DestructionQueue,
    pub registry: &'a mut EntityRegistry,
    pub events: &'a mut Vec<GameEvent>,
}

impl Effects<'_> {
    /// Apply one participant's fate, updating counters if it is newly doomed.
    /// Entities already pending removal are left alone.
    fn apply_fate(&mut self, id: Option<EntityId>, fate: Fate) {
        let Some(id) = id else {
            return;
        };
        if self.queue.contains(id) {
            return;
        }
        let Some(entity) = self.registry.get_mut(id) else {
            log::debug!("Contact references removed entity {:?}", id);
            return;
        };

        let destroyed = match fate {
            Fate::Keep => false,
            Fate::Destroy => true,
            Fate::Damage(amount) => entity.payload.take_damage(amount),
        };
        if !destroyed {
            return;
        }

        let kind = entity.kind;
        if self.queue.enqueue(id) {
            if kind.counts_as_target() {
                self.state.target_destroyed();
            }
            if kind.is_projectile() {
                self.state.projectile_spent();
            }
        }
    }

    fn is_doomed(&self, id: Option<EntityId>) -> bool {
        id.is_some_and(|id| self.queue.contains(id))
    }
}

/// Stateful classifier: rule table plus per-step and per-level bookkeeping
#[derive(Debug, Default)]
pub struct CollisionClassifier {
    rules: RuleTable,
    /// Body pairs already handled during the current step
    processed: HashSet<(BodyHandle, BodyHandle)>,
    /// Unhandled category pairs already reported
    misses_logged: HashSet<PairKey>,
}

impl CollisionClassifier {
    pub fn new(rules: RuleTable) -> Self {
        Self {
            rules,
            processed: HashSet::new(),
            misses_logged: HashSet::new(),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleTable {
        &mut self.rules
    }

    /// Semantic event for a category pair, independent of order
    pub fn classify(&self, a: Category, b: Category) -> Option<CollisionEvent> {
        self.rules.lookup(a, b).map(|rule| rule.event)
    }

    /// Forget which pairs were handled; called after every step
    pub fn end_step(&mut self) {
        self.processed.clear();
    }

    /// Clear all bookkeeping; called on level (re)start
    pub fn reset(&mut self) {
        self.processed.clear();
        self.misses_logged.clear();
    }

    /// Number of distinct unhandled category pairs seen since the last reset
    pub fn miss_count(&self) -> usize {
        self.misses_logged.len()
    }

    /// Handle one begin-contact notification
    pub fn begin_contact(&mut self, contact: &Contact, effects: &mut Effects<'_>) {
        let Contact { a, b, .. } = *contact;

        if a.body == b.body || (a.user_data.is_some() && a.user_data == b.user_data) {
            log::trace!("Ignoring self-contact on {:?}", a.body);
            return;
        }

        if !a.category.is_recognized() || !b.category.is_recognized() {
            self.record_miss(a.category, b.category);
            return;
        }

        let (a, b) = normalize(a, b);
        let pair = (a.body.min(b.body), a.body.max(b.body));
        if self.processed.contains(&pair) {
            log::trace!("Pair {:?} already handled this step", pair);
            return;
        }

        let Some(rule) = self.rules.lookup(a.category, b.category) else {
            self.record_miss(a.category, b.category);
            return;
        };

        // A slow report leaves the pair open for a harder one later in the step
        if contact.impact_speed < rule.min_impact_speed {
            return;
        }
        self.processed.insert(pair);

        match (effects.is_doomed(a.user_data), effects.is_doomed(b.user_data)) {
            (false, false) => {
                effects.state.add_points(rule.points);
                effects.apply_fate(a.user_data, rule.fate_a);
                effects.apply_fate(b.user_data, rule.fate_b);
                effects.events.push(GameEvent {
                    event: rule.event,
                    first: a.user_data,
                    second: b.user_data,
                    points: rule.points,
                    impact_speed: contact.impact_speed,
                    point: contact.point,
                });
            }
            (true, true) => {
                log::trace!("{:?} between two entities already pending removal", rule.event);
            }
            // A doomed partner scores nothing and deals no damage, but the
            // live side still self-destructs
            (a_doomed, _) => {
                let (live, fate) = if a_doomed {
                    (b.user_data, rule.fate_b)
                } else {
                    (a.user_data, rule.fate_a)
                };
                if fate == Fate::Destroy {
                    effects.apply_fate(live, fate);
                }
                log::trace!("{:?} with a partner already pending removal", rule.event);
            }
        }
    }

    fn record_miss(&mut self, a: Category, b: Category) {
        let key = PairKey::new(a, b);
        if self.misses_logged.insert(key) {
            log::warn!(
                "No collision rule for {:?} x {:?}; contact ignored",
                key.low(),
                key.high()
            );
        }
    }
}

/// Order fixtures by category, then by body handle for equal categories
fn normalize(a: FixtureView, b: FixtureView) -> (FixtureView, FixtureView) {
    if a.category == b.category {
        if a.body <= b.body { (a, b) } else { (b, a) }
    } else if PairKey::is_ordered(a.category, b.category) {
        (a, b)
    } else {
        (b, a)
    }
}

/// Contact listener handed to the physics world for one step
pub struct ContactRouter<'a> {
    pub classifier: &'a mut CollisionClassifier,
    pub effects: Effects<'a>,
}

impl ContactListener for ContactRouter<'_> {
    fn begin_contact(&mut self, contact: &Contact) {
        self.classifier.begin_contact(contact, &mut self.effects);
    }
}
