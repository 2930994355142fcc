//! Game state: score and progress counters
//!
//! Status is derived from the counters on every query, so it can never drift
//! out of sync with them.

use serde::{Deserialize, Serialize};

/// Outcome of the current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    /// Every target destroyed
    Won,
    /// Targets remain, no attempts left and nothing in flight
    Lost,
}

/// Starting counters for a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelGoal {
    pub targets: u32,
    pub attempts: u32,
}

/// Read-only copy of the counters for HUD consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub targets_total: u32,
    pub targets_remaining: u32,
    pub attempts_remaining: u32,
    pub projectiles_in_flight: u32,
    pub status: GameStatus,
}

/// Authoritative score and progress counters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameState {
    score: u64,
    targets_total: u32,
    targets_remaining: u32,
    attempts_remaining: u32,
    projectiles_in_flight: u32,
    launches: u32,
}

impl GameState {
    pub fn new(goal: LevelGoal) -> Self {
        let mut state = Self::default();
        state.reset(goal);
        state
    }

    /// Put every counter back to the level's starting values
    pub fn reset(&mut self, goal: LevelGoal) {
        *self = Self {
            score: 0,
            targets_total: goal.targets,
            targets_remaining: goal.targets,
            attempts_remaining: goal.attempts,
            projectiles_in_flight: 0,
            launches: 0,
        };
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn targets_remaining(&self) -> u32 {
        self.targets_remaining
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn projectiles_in_flight(&self) -> u32 {
        self.projectiles_in_flight
    }

    pub fn launches(&self) -> u32 {
        self.launches
    }

    pub fn status(&self) -> GameStatus {
        if self.targets_remaining == 0 {
            GameStatus::Won
        } else if self.attempts_remaining == 0 && self.projectiles_in_flight == 0 {
            GameStatus::Lost
        } else {
            GameStatus::InProgress
        }
    }

    pub fn snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.score,
            targets_total: self.targets_total,
            targets_remaining: self.targets_remaining,
            attempts_remaining: self.attempts_remaining,
            projectiles_in_flight: self.projectiles_in_flight,
            status: self.status(),
        }
    }

    // === Mutations (collision handling and level lifecycle only) ===

    pub fn add_points(&mut self, points: u32) {
        self.score += u64::from(points);
    }

    /// A target entered the world
    pub fn target_added(&mut self) {
        self.targets_total += 1;
        self.targets_remaining += 1;
    }

    /// A target was committed to destruction
    pub fn target_destroyed(&mut self) {
        self.targets_remaining = self.targets_remaining.saturating_sub(1);
    }

    /// A projectile entered the world
    pub fn projectile_spawned(&mut self) {
        self.projectiles_in_flight += 1;
    }

    /// A projectile was committed to destruction
    pub fn projectile_spent(&mut self) {
        self.projectiles_in_flight = self.projectiles_in_flight.saturating_sub(1);
    }

    /// Consume one launch attempt. Returns `false` if none were left.
    pub fn consume_attempt(&mut self) -> bool {
        if self.attempts_remaining == 0 {
            return false;
        }
        self.attempts_remaining -= 1;
        self.launches += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal() -> LevelGoal {
        LevelGoal {
            targets: 3,
            attempts: 2,
        }
    }

    #[test]
    fn test_status_is_derived() {
        let mut state = GameState::new(goal());
        assert_eq!(state.status(), GameStatus::InProgress);

        for _ in 0..3 {
            state.target_destroyed();
        }
        assert_eq!(state.status(), GameStatus::Won);
        state.target_destroyed();
        assert_eq!(state.targets_remaining(), 0);
    }

    #[test]
    fn test_lost_waits_for_projectiles_in_flight() {
        let mut state = GameState::new(goal());
        assert!(state.consume_attempt());
        state.projectile_spawned();
        assert!(state.consume_attempt());
        assert!(!state.consume_attempt());
        assert_eq!(state.launches(), 2);
        assert_eq!(state.status(), GameStatus::InProgress);

        state.projectile_spent();
        assert_eq!(state.status(), GameStatus::Lost);
    }

    #[test]
    fn test_reset_twice() {
        let mut state = GameState::new(goal());
        state.add_points(40);
        state.target_destroyed();

        state.reset(goal());
        let first = state.clone();
        state.reset(goal());
        assert_eq!(state, first);
        assert_eq!(state.snapshot().score, 0);
        assert_eq!(state.snapshot().targets_remaining, 3);
    }
}
