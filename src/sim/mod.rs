//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (Park-Miller for layouts, per-level PCG for enemy jitter)
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or storage dependencies

pub mod collision;
pub mod envelope;
pub mod events;
pub mod generate;
pub mod geom;
pub mod reach;
pub mod rng;
pub mod session;
pub mod state;
pub mod tick;

pub use collision::{CollisionOutcome, resolve};
pub use envelope::{MovementEnvelope, speed_scale};
pub use events::{DeathCause, GameEvent, KillTarget};
pub use generate::{
    FeatureOverrides, GenerateParams, Level, LevelFeatures, generate_level, generate_level_with,
};
pub use geom::Aabb;
pub use reach::can_reach;
pub use rng::{ParkMiller, RandomSource, normalize_seed};
pub use session::{Game, level_params, seed_for_level};
pub use state::{
    Bullet, Camera, Enemy, EnemyKind, GameMode, GamePhase, Hazard, HazardKind, Platform,
    PlatformMotion, Player, SPEEDRUN_ROUNDS, WorldState,
};
pub use tick::{TickInput, advance, step_world};
