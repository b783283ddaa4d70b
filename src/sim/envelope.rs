//! Movement envelope: how far the player can currently jump
//!
//! Derived from the loadout and the level's speed scaling. Recompute before
//! every generation call; an upgrade purchase changes the result.

use serde::{Deserialize, Serialize};

use super::state::GameMode;
use crate::Loadout;
use crate::consts::*;

/// Classic mode speed grows by this much per level
const CLASSIC_SPEED_STEP: f32 = 0.015;
/// Levels past which classic speed stops growing
const CLASSIC_SPEED_LEVEL_CAP: u32 = 20;
/// Fixed speed multiplier for race and speedrun
const RACE_SPEED_SCALE: f32 = 1.25;

/// Jump and traversal limits for the current loadout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementEnvelope {
    /// Upward impulse of a ground jump
    pub jump_velocity: f32,
    /// Horizontal run speed
    pub horizontal_speed: f32,
    /// Highest reachable rise (jump apex)
    pub max_up: f32,
    /// Deepest drop the generator will ask for
    pub max_down: f32,
    /// Widest gap the generator will ask for
    pub max_dist: f32,
}

/// Level-dependent run speed multiplier
pub fn speed_scale(mode: GameMode, level: u32) -> f32 {
    match mode {
        GameMode::Classic => {
            let steps = level.saturating_sub(1).min(CLASSIC_SPEED_LEVEL_CAP);
            1.0 + steps as f32 * CLASSIC_SPEED_STEP
        }
        GameMode::Race { .. } | GameMode::Speedrun => RACE_SPEED_SCALE,
    }
}

impl MovementEnvelope {
    /// Derive the envelope from raw tiers
    pub fn from_tiers(jump_tier: u8, speed_tier: u8, speed_scale: f32) -> Self {
        let jump_tier = crate::clamp_tier(jump_tier) as f32;
        let speed_tier = crate::clamp_tier(speed_tier) as f32;

        let jump_velocity = BASE_JUMP + jump_tier * JUMP_INCREMENT;
        let horizontal_speed = (BASE_SPEED + speed_tier * SPEED_INCREMENT) * speed_scale;

        let time_to_apex = jump_velocity / GRAVITY;
        let max_height = (jump_velocity * jump_velocity) / (2.0 * GRAVITY);
        let airtime = time_to_apex * 2.0;
        let max_dist = horizontal_speed * airtime * TICK_SCALE * REACH_SAFETY_FACTOR;

        Self {
            jump_velocity,
            horizontal_speed,
            max_up: max_height,
            max_down: max_height * DOWNWARD_SLACK,
            max_dist,
        }
    }

    /// Derive the envelope for a loadout playing the given mode and level
    pub fn compute(loadout: &Loadout, mode: GameMode, level: u32) -> Self {
        Self::from_tiers(
            loadout.effective_jump_tier(),
            loadout.effective_speed_tier(),
            speed_scale(mode, level),
        )
    }
}
