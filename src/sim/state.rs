//! World state and entity types
//!
//! Everything a frame reads or writes lives in [`WorldState`]. Entity
//! collections are id-tagged arenas kept sorted by id; removals happen in an
//! explicit compaction pass after collision resolution.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::generate::Level;
use super::geom::Aabb;
use crate::consts::*;

/// Which progression the session is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Endless numbered levels
    Classic,
    /// Fixed-seed rounds against the clock
    Race { rounds: u32 },
    /// Fifty-round race
    Speedrun,
}

/// Rounds in a speedrun
pub const SPEEDRUN_ROUNDS: u32 = 50;

impl GameMode {
    /// Number of rounds for timed modes
    pub fn rounds(&self) -> Option<u32> {
        match self {
            GameMode::Classic => None,
            GameMode::Race { rounds } => Some(*rounds),
            GameMode::Speedrun => Some(SPEEDRUN_ROUNDS),
        }
    }

    /// Key under which a best time for this mode is kept
    pub fn record_key(&self) -> Option<String> {
        match self {
            GameMode::Classic => None,
            GameMode::Race { rounds } => Some(format!("race_{}", rounds)),
            GameMode::Speedrun => Some(format!("speedrun_{}", SPEEDRUN_ROUNDS)),
        }
    }

    pub fn is_timed(&self) -> bool {
        !matches!(self, GameMode::Classic)
    }
}

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Frozen; ticks are skipped without touching state
    Paused,
    /// Timed run completed
    Finished,
}

/// Platform motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlatformMotion {
    Static,
    /// Horizontal oscillation around `origin_x`
    Moving {
        origin_x: f32,
        amplitude: f32,
        /// Radians per second (sign gives direction)
        angular_speed: f32,
        phase: f32,
        /// Left edge before this frame's animation
        prev_x: f32,
    },
}

/// A walkable platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub rect: Aabb,
    pub motion: PlatformMotion,
}

impl Platform {
    pub fn new_static(id: u32, rect: Aabb) -> Self {
        Self {
            id,
            rect,
            motion: PlatformMotion::Static,
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.motion, PlatformMotion::Moving { .. })
    }

    /// Horizontal displacement applied by the last animation step
    pub fn delta_x(&self) -> f32 {
        match self.motion {
            PlatformMotion::Static => 0.0,
            PlatformMotion::Moving { prev_x, .. } => self.rect.pos.x - prev_x,
        }
    }

    /// Move to the oscillation position for `time`, remembering where it was
    pub fn animate(&mut self, time: f32) {
        if let PlatformMotion::Moving {
            origin_x,
            amplitude,
            angular_speed,
            phase,
            ref mut prev_x,
        } = self.motion
        {
            *prev_x = self.rect.pos.x;
            self.rect.pos.x = origin_x + (time * angular_speed + phase).sin() * amplitude;
        }
    }
}

/// Hazard variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardKind {
    /// Fixed spike strip
    Spike,
    /// Circular orb sweeping along a baseline with a small vertical wobble
    Orb {
        radius: f32,
        /// Center at rest
        base: Vec2,
        /// Horizontal sweep amplitude
        range: f32,
        speed: f32,
        phase: f32,
        /// Coins granted when shot
        reward: u32,
    },
}

/// Vertical wobble amplitude of orbs
pub const ORB_WOBBLE: f32 = 4.0;
/// Orb wobble frequency relative to its sweep
pub const ORB_WOBBLE_RATE: f32 = 0.7;

/// An instant-death obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub rect: Aabb,
    pub kind: HazardKind,
    /// Marked by a bullet this frame; removed on compaction
    #[serde(skip)]
    pub hit: bool,
}

impl Hazard {
    pub fn new(id: u32, rect: Aabb, kind: HazardKind) -> Self {
        Self {
            id,
            rect,
            kind,
            hit: false,
        }
    }

    /// Bullets can destroy this hazard
    pub fn is_shootable(&self) -> bool {
        matches!(self.kind, HazardKind::Orb { .. })
    }

    pub fn reward(&self) -> u32 {
        match self.kind {
            HazardKind::Spike => 0,
            HazardKind::Orb { reward, .. } => reward,
        }
    }

    pub fn animate(&mut self, time: f32) {
        if let HazardKind::Orb {
            radius,
            base,
            range,
            speed,
            phase,
            ..
        } = self.kind
        {
            let cx = base.x + (time * speed + phase).sin() * range;
            let cy = base.y + (time * speed * ORB_WOBBLE_RATE + phase).cos() * ORB_WOBBLE;
            self.rect = Aabb::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0);
        }
    }
}

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Walks back and forth on its platform
    Crawler {
        base_x: f32,
        range: f32,
        speed: f32,
        /// -1.0 or 1.0
        dir: f32,
        platform_y: f32,
    },
    /// Patrols and periodically leaps
    Hopper {
        vel: Vec2,
        min_x: f32,
        max_x: f32,
        platform_y: f32,
        /// Seconds until the next leap once grounded
        jump_timer: f32,
    },
    /// Drifts around a point in two dimensions, ignoring gravity
    Floater {
        base: Vec2,
        range: Vec2,
        speed: f32,
        phase: f32,
    },
}

/// A shootable enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub rect: Aabb,
    pub kind: EnemyKind,
    /// Coins granted when shot
    pub reward: u32,
    #[serde(skip)]
    pub hit: bool,
}

/// Hopper gravity relative to the player's
pub const HOPPER_GRAVITY_FACTOR: f32 = 0.85;
/// Hopper leap impulse
pub const HOPPER_LEAP_VELOCITY: f32 = 9.5;
/// Ground enemies rest this far above their platform
pub const ENEMY_CLEARANCE: f32 = 2.0;
/// Floater vertical frequency relative to horizontal
pub const FLOATER_Y_RATE: f32 = 0.8;

impl Enemy {
    pub fn new(id: u32, rect: Aabb, kind: EnemyKind, reward: u32) -> Self {
        Self {
            id,
            rect,
            kind,
            reward,
            hit: false,
        }
    }

    /// Advance this enemy's motion. `rng` supplies hopper leap jitter.
    pub fn animate(&mut self, time: f32, dt: f32, rng: &mut Pcg32) {
        use rand::Rng;

        let h = self.rect.size.y;
        match &mut self.kind {
            EnemyKind::Floater {
                base,
                range,
                speed,
                phase,
            } => {
                self.rect.pos.x = base.x + (time * *speed + *phase).sin() * range.x;
                let wave_y = (time * *speed * FLOATER_Y_RATE + *phase).cos();
                self.rect.pos.y = base.y + wave_y * range.y;
            }
            EnemyKind::Hopper {
                vel,
                min_x,
                max_x,
                platform_y,
                jump_timer,
            } => {
                let pos = &mut self.rect.pos;
                pos.x += vel.x * TICK_SCALE * dt;
                if pos.x < *min_x {
                    pos.x = *min_x;
                    vel.x = vel.x.abs();
                } else if pos.x > *max_x {
                    pos.x = *max_x;
                    vel.x = -vel.x.abs();
                }

                *jump_timer -= dt;
                vel.y += GRAVITY * HOPPER_GRAVITY_FACTOR * TICK_SCALE * dt;
                pos.y += vel.y * TICK_SCALE * dt;

                let floor_y = *platform_y - h - ENEMY_CLEARANCE;
                if pos.y >= floor_y {
                    pos.y = floor_y;
                    vel.y = 0.0;
                    if *jump_timer <= 0.0 {
                        vel.y = -HOPPER_LEAP_VELOCITY;
                        *jump_timer = rng.random_range(0.8..2.0);
                    }
                }
            }
            EnemyKind::Crawler {
                base_x,
                range,
                speed,
                dir,
                platform_y,
            } => {
                let pos = &mut self.rect.pos;
                pos.x += *dir * *speed * TICK_SCALE * dt;
                if pos.x < *base_x - *range {
                    pos.x = *base_x - *range;
                    *dir = 1.0;
                } else if pos.x > *base_x + *range {
                    pos.x = *base_x + *range;
                    *dir = -1.0;
                }
                pos.y = *platform_y - h - ENEMY_CLEARANCE;
            }
        }
    }
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub rect: Aabb,
    pub vel: Vec2,
    /// Coins granted for a target that carries no reward of its own
    pub reward: u32,
}

/// The player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub rect: Aabb,
    pub vel: Vec2,
    pub grounded: bool,
    /// Grounded state at the end of the previous frame
    pub was_grounded: bool,
    /// A mid-air jump is still available this airborne phase
    pub can_double_jump: bool,
    /// Jump input state last frame (edge detection)
    pub last_jump_held: bool,
    /// Feet height before this frame's integration; landing is swept from here
    pub prev_bottom: f32,
}

impl Player {
    /// Place the player without sweeping through anything in between
    pub fn teleport(&mut self, pos: Vec2) {
        self.rect.pos = pos;
        self.prev_bottom = self.rect.bottom();
    }
}

impl Default for Player {
    fn default() -> Self {
        Self {
            rect: Aabb::new(0.0, 0.0, PLAYER_WIDTH, PLAYER_HEIGHT),
            vel: Vec2::ZERO,
            grounded: false,
            was_grounded: false,
            can_double_jump: false,
            last_jump_held: false,
            prev_bottom: PLAYER_HEIGHT,
        }
    }
}

/// Smoothed follow camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Vec2,
    pub target: Vec2,
    pub smoothing: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            target: Vec2::ZERO,
            smoothing: CAMERA_SMOOTHING,
        }
    }
}

impl Camera {
    /// Ease toward the view centered on `focus`
    pub fn follow(&mut self, focus: Vec2) {
        self.target = focus - Vec2::new(VIEW_WIDTH / 2.0, VIEW_HEIGHT / 2.0);
        self.pos += (self.target - self.pos) * self.smoothing;
        self.pos.x = self.pos.x.max(0.0);
        self.pos.y = self.pos.y.clamp(CAMERA_MIN_Y, CAMERA_MAX_Y);
    }

    pub fn reset(&mut self) {
        self.pos = Vec2::ZERO;
        self.target = Vec2::ZERO;
    }
}

/// Complete live world (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    /// Seed the current level was generated from
    pub seed: u32,
    /// Level index the layout was generated for
    pub level_index: u32,
    /// Seconds since level load
    pub time: f32,
    pub player: Player,
    /// Platform chain; index 0 is the spawn platform
    pub platforms: Vec<Platform>,
    pub hazards: Vec<Hazard>,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub portal: Aabb,
    pub camera: Camera,
    /// Seconds until the weapon may fire again
    pub gun_cooldown: f32,
    /// Per-level stream for enemy timing jitter
    pub motion_rng: Pcg32,
    /// Next entity ID
    next_id: u32,
}

impl WorldState {
    /// Build a world holding a freshly generated level
    pub fn new(level: Level) -> Self {
        let mut world = Self {
            seed: level.seed,
            level_index: level.level_index,
            time: 0.0,
            player: Player::default(),
            platforms: Vec::new(),
            hazards: Vec::new(),
            enemies: Vec::new(),
            bullets: Vec::new(),
            portal: level.portal,
            camera: Camera::default(),
            gun_cooldown: 0.0,
            motion_rng: Pcg32::seed_from_u64(level.seed as u64),
            next_id: 1,
        };
        world.load_level(level);
        world
    }

    /// Replace all level content; the player survives and returns to spawn
    pub fn load_level(&mut self, level: Level) {
        self.seed = level.seed;
        self.level_index = level.level_index;
        self.time = 0.0;
        self.platforms = level.platforms;
        self.hazards = level.hazards;
        self.enemies = level.enemies;
        self.bullets.clear();
        self.portal = level.portal;
        self.gun_cooldown = 0.0;
        self.motion_rng = Pcg32::seed_from_u64(level.seed as u64);
        self.next_id = level.next_id;

        self.reset_player_to_spawn();
        self.player.was_grounded = false;
        self.player.last_jump_held = false;
        self.camera.reset();
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The spawn platform
    pub fn spawn(&self) -> Option<&Platform> {
        self.platforms.first()
    }

    /// Where the player is placed on load and after a death
    pub fn spawn_point(&self) -> Vec2 {
        let spawn = self
            .spawn()
            .map(|p| p.rect)
            .unwrap_or_else(super::generate::spawn_rect);
        Vec2::new(
            spawn.left() + SPAWN_OFFSET_X,
            spawn.top() - self.player.rect.size.y - SPAWN_CLEARANCE,
        )
    }

    /// Full death reset: back to spawn, motionless, airborne
    pub fn reset_player_to_spawn(&mut self) {
        let spawn = self.spawn_point();
        self.player.teleport(spawn);
        self.player.vel = Vec2::ZERO;
        self.player.grounded = false;
        self.player.can_double_jump = false;
    }

    /// Drop entities marked as hit this frame
    pub fn compact(&mut self) {
        self.hazards.retain(|h| !h.hit);
        self.enemies.retain(|e| !e.hit);
    }

    /// Ensure arenas are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.platforms.sort_by_key(|p| p.id);
        self.hazards.sort_by_key(|h| h.id);
        self.enemies.sort_by_key(|e| e.id);
        self.bullets.sort_by_key(|b| b.id);
    }
}
