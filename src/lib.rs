//! Hopforge - procedural platformer runtime
//!
//! Core modules:
//! - `sim`: Deterministic simulation (level generation, physics, collisions)
//! - `loadout`: Upgrade tiers and equipped weapon, read-only during a level
//! - `records`: Completed levels, recorded seeds and best race times

pub mod loadout;
pub mod records;
pub mod sim;

pub use loadout::{Loadout, LoadoutError, WeaponKind, WeaponSpec};
pub use records::{RecordsError, RunRecords};

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the simulation accepts (seconds)
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// Velocities are expressed per 1/60 s; positions integrate `v * TICK_SCALE * dt`
    pub const TICK_SCALE: f32 = 60.0;

    /// Viewport dimensions
    pub const VIEW_WIDTH: f32 = 1280.0;
    pub const VIEW_HEIGHT: f32 = 720.0;

    /// Gravity (per tick, per tick)
    pub const GRAVITY: f32 = 0.6;
    /// Jump impulse at tier 0
    pub const BASE_JUMP: f32 = 13.0;
    /// Jump impulse added per jump tier
    pub const JUMP_INCREMENT: f32 = 1.5;
    /// Run speed at tier 0
    pub const BASE_SPEED: f32 = 6.5;
    /// Run speed added per speed tier
    pub const SPEED_INCREMENT: f32 = 0.6;
    /// Highest purchasable tier for every upgrade
    pub const MAX_UPGRADE_TIER: u8 = 5;
    /// Double jump impulse relative to a ground jump
    pub const DOUBLE_JUMP_FACTOR: f32 = 0.85;

    /// Fraction of the ideal jump distance the generator trusts
    pub const REACH_SAFETY_FACTOR: f32 = 0.85;
    /// Tolerated drop relative to the jump apex height
    pub const DOWNWARD_SLACK: f32 = 1.4;
    /// Minimum horizontal gap between consecutive platforms
    pub const MIN_PLATFORM_GAP: f32 = 60.0;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 30.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;
    /// Spawn offset from the spawn platform's left edge
    pub const SPAWN_OFFSET_X: f32 = 20.0;
    /// Spawn clearance above the spawn platform's top
    pub const SPAWN_CLEARANCE: f32 = 4.0;
    /// Extra depth below a platform top that still counts as standing on it
    pub const SUPPORT_TOLERANCE: f32 = 8.0;
    /// Falling below this world y is fatal
    pub const FALL_DEATH_Y: f32 = 900.0;

    /// Camera easing per frame
    pub const CAMERA_SMOOTHING: f32 = 0.1;
    /// Vertical camera band
    pub const CAMERA_MIN_Y: f32 = -200.0;
    pub const CAMERA_MAX_Y: f32 = 200.0;

    /// Bullet dimensions
    pub const BULLET_WIDTH: f32 = 10.0;
    pub const BULLET_HEIGHT: f32 = 4.0;
    /// Bullets this far outside the view are culled
    pub const BULLET_CULL_MARGIN: f32 = 100.0;
}

/// Clamp a tier into `[0, MAX_UPGRADE_TIER]`
#[inline]
pub fn clamp_tier(tier: u8) -> u8 {
    tier.min(consts::MAX_UPGRADE_TIER)
}
