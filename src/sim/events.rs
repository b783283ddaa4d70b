//! Events emitted by the simulation for collaborators (audio, UI, saves)

use serde::{Deserialize, Serialize};

use super::state::GameMode;

/// What killed the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Hazard,
    Enemy,
    Fall,
}

/// What a bullet destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillTarget {
    Hazard { id: u32 },
    Enemy { id: u32 },
}

/// Discrete gameplay events, in emission order within a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Jump impulse applied
    Jumped { double: bool },
    /// Weapon fired
    Shot { bullets: u32 },
    /// Player touched down after being airborne
    Landed,
    /// Death-reset applied
    Died { cause: DeathCause },
    /// Player entered the portal
    PortalReached { mode: GameMode, round: u32 },
    /// Bullet destroyed a target; `reward` already includes the coin multiplier
    BulletKill { target: KillTarget, reward: u32 },
    /// Classic level cleared; `seed` regenerates the level
    LevelComplete { level: u32, seed: u32, reward: u32 },
    /// Race round cleared, next round loading
    RoundComplete { round: u32, rounds: u32, round_time: f32 },
    /// Timed run finished
    RaceComplete {
        mode: GameMode,
        rounds: u32,
        total_time: f32,
        reward: u32,
    },
}

impl GameEvent {
    /// Coins granted by this event
    pub fn coins(&self) -> u32 {
        match self {
            GameEvent::BulletKill { reward, .. }
            | GameEvent::LevelComplete { reward, .. }
            | GameEvent::RaceComplete { reward, .. } => *reward,
            _ => 0,
        }
    }
}
