//! Constructive level generation
//!
//! Builds a platform chain from a fixed spawn platform, validating every
//! candidate against the movement envelope. Each platform gets a bounded
//! number of attempts before a deterministic fallback is placed, so
//! generation always terminates with a completable level.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::envelope::MovementEnvelope;
use super::geom::Aabb;
use super::reach::can_reach;
use super::rng::{ParkMiller, RandomSource, normalize_seed};
use super::state::{Enemy, EnemyKind, Hazard, HazardKind, Platform, PlatformMotion};
use super::state::ENEMY_CLEARANCE;
use crate::consts::*;

/// Candidate attempts per platform before the fallback is used
pub const MAX_ATTEMPTS: u32 = 20;
/// Upper bound on requested platform count
pub const MAX_PLATFORMS: u32 = 200;
/// Default platform count when none is requested
pub const DEFAULT_PLATFORM_COUNT: u32 = 10;
/// Default probability that a candidate steps upward
pub const DEFAULT_VERTICAL_BIAS: f64 = 0.72;

/// Spawn platform geometry
const SPAWN_X: f32 = 100.0;
const SPAWN_Y: f32 = 520.0;
const SPAWN_W: f32 = 220.0;
const SPAWN_H: f32 = 22.0;

/// Playable band for platform tops
const MIN_PLATFORM_Y: f32 = 100.0;
const MAX_PLATFORM_Y: f32 = 600.0;
const PLATFORM_H: f32 = 20.0;

/// Candidate offsets are measured from the previous platform's left edge
const STEP_X_MIN: f32 = 90.0;
const STEP_X_SPAN: f32 = 120.0;
const STEP_Y_MIN: f32 = 35.0;
const STEP_Y_SPAN: f32 = 110.0;
const WIDTH_MIN: f32 = 90.0;
const WIDTH_SPAN: f32 = 80.0;

/// Moving platform parameters
const MOVE_RANGE_MIN: f32 = 40.0;
const MOVE_RANGE_SPAN: f32 = 70.0;
const MOVE_SPEED_MIN: f32 = 0.8;
const MOVE_SPEED_SPAN: f32 = 1.6;

/// Fallback platform: right of the previous platform, a little higher
const FALLBACK_GAP: f32 = 80.0;
const FALLBACK_RISE: f32 = 50.0;
const FALLBACK_W: f32 = 140.0;

/// Hazard sizing
const SPIKE_MIN_PLATFORM_W: f32 = 80.0;
const ORB_MIN_PLATFORM_W: f32 = 110.0;
const SPIKE_W: f32 = 28.0;
const SPIKE_H: f32 = 18.0;
const ORB_RADIUS_MIN: f32 = 12.0;
const ORB_RADIUS_SPAN: f32 = 8.0;
const ORB_LIFT: f32 = 34.0;
const ORB_RANGE_MIN: f32 = 30.0;
const ORB_RANGE_SPAN: f32 = 60.0;
const ORB_SPEED_MIN: f32 = 1.2;
const ORB_SPEED_SPAN: f32 = 1.4;
pub const ORB_REWARD: u32 = 5;

/// Enemy placement
const ENEMY_MIN_PLATFORM_W: f32 = 90.0;
pub const HOPPER_UNLOCK_LEVEL: u32 = 35;
pub const FLOATER_UNLOCK_LEVEL: u32 = 40;
pub const CRAWLER_REWARD: u32 = 6;
pub const HOPPER_REWARD: u32 = 7;
pub const FLOATER_REWARD: u32 = 8;

/// Portal placement
const PORTAL_W: f32 = 40.0;
const PORTAL_H: f32 = 60.0;
const PORTAL_GAP: f32 = 70.0;
const PORTAL_RISE: f32 = 50.0;
const PORTAL_FALLBACK_RISE: f32 = 40.0;

/// The fixed first platform of every level
pub fn spawn_rect() -> Aabb {
    Aabb::new(SPAWN_X, SPAWN_Y, SPAWN_W, SPAWN_H)
}

/// Platforms per classic level
pub fn platform_count_for_level(level: u32) -> u32 {
    (8 + (level as f32 * 0.4).floor() as u32).min(14)
}

/// Probabilities driving a level's content
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelFeatures {
    pub moving_chance: f64,
    pub spike_chance: f64,
    pub orb_chance: f64,
    pub enemy_chance: f64,
}

/// Explicit per-call probability overrides; `None` keeps the level default
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureOverrides {
    pub moving_chance: Option<f64>,
    pub spike_chance: Option<f64>,
    pub orb_chance: Option<f64>,
    pub enemy_chance: Option<f64>,
}

/// Linear ramp from `start` at `from`, `step` per level, capped at `cap`
fn ramp(level: u32, from: u32, start: f64, step: f64, cap: f64) -> f64 {
    (start + (level - from) as f64 * step).min(cap)
}

impl LevelFeatures {
    /// Default feature curves for a level index
    pub fn for_level(level: u32) -> Self {
        let moving_chance = if level >= 5 { 0.25 } else { 0.0 };
        let spike_chance = match level {
            15..=29 => ramp(level, 15, 0.18, 0.008, 0.35),
            50.. => ramp(level, 50, 0.18, 0.008, 0.35),
            _ => 0.0,
        };
        let orb_chance = if level >= 25 {
            ramp(level, 25, 0.16, 0.01, 0.32)
        } else {
            0.0
        };
        let enemy_chance = if level >= 30 {
            ramp(level, 30, 0.18, 0.01, 0.35)
        } else {
            0.0
        };
        Self {
            moving_chance,
            spike_chance,
            orb_chance,
            enemy_chance,
        }
    }

    /// Apply overrides, clamping every probability into `[0, 1]`
    pub fn with_overrides(self, overrides: &FeatureOverrides) -> Self {
        Self {
            moving_chance: clamp_probability(overrides.moving_chance.unwrap_or(self.moving_chance)),
            spike_chance: clamp_probability(overrides.spike_chance.unwrap_or(self.spike_chance)),
            orb_chance: clamp_probability(overrides.orb_chance.unwrap_or(self.orb_chance)),
            enemy_chance: clamp_probability(overrides.enemy_chance.unwrap_or(self.enemy_chance)),
        }
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
}

/// Inputs to one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateParams {
    pub seed: i64,
    /// Platforms after the spawn platform
    pub platform_count: u32,
    /// Probability that a candidate steps upward
    pub vertical_bias: f64,
    pub level_index: u32,
    pub overrides: FeatureOverrides,
    /// Keep hazards off moving platforms
    pub no_hazard_on_moving: bool,
    /// At most one hazard per platform
    pub single_hazard_per_platform: bool,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            seed: 1,
            platform_count: DEFAULT_PLATFORM_COUNT,
            vertical_bias: DEFAULT_VERTICAL_BIAS,
            level_index: 1,
            overrides: FeatureOverrides::default(),
            no_hazard_on_moving: true,
            single_hazard_per_platform: true,
        }
    }
}

impl GenerateParams {
    /// Clamp out-of-range inputs to safe values
    pub fn sanitized(&self) -> Self {
        let platform_count = match self.platform_count {
            0 => DEFAULT_PLATFORM_COUNT,
            n => n.min(MAX_PLATFORMS),
        };
        let vertical_bias = if self.vertical_bias.is_finite() {
            self.vertical_bias.clamp(0.0, 1.0)
        } else {
            DEFAULT_VERTICAL_BIAS
        };
        Self {
            platform_count,
            vertical_bias,
            level_index: self.level_index.max(1),
            ..self.clone()
        }
    }
}

/// A generated level's static content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    /// Normalized seed the layout was drawn from
    pub seed: u32,
    pub level_index: u32,
    /// Spawn platform first, then the chain in placement order
    pub platforms: Vec<Platform>,
    pub hazards: Vec<Hazard>,
    pub enemies: Vec<Enemy>,
    pub portal: Aabb,
    /// Platforms that needed the fallback placement
    pub fallback_platforms: u32,
    /// The portal needed the fallback placement
    pub portal_fallback: bool,
    /// First entity ID not used by the layout
    pub next_id: u32,
}

impl Level {
    pub fn spawn(&self) -> &Platform {
        &self.platforms[0]
    }
}

/// Generate a level from its seed
pub fn generate_level(params: &GenerateParams, envelope: &MovementEnvelope) -> Level {
    let mut rng = ParkMiller::new(params.seed);
    generate_level_with(&mut rng, params, envelope)
}

/// Generate a level from an arbitrary random source
pub fn generate_level_with<R: RandomSource>(
    rng: &mut R,
    params: &GenerateParams,
    envelope: &MovementEnvelope,
) -> Level {
    let params = params.sanitized();
    let features = LevelFeatures::for_level(params.level_index).with_overrides(&params.overrides);

    let mut builder = LevelBuilder {
        rng,
        envelope,
        features,
        params: &params,
        platforms: Vec::with_capacity(params.platform_count as usize + 1),
        hazards: Vec::new(),
        enemies: Vec::new(),
        next_id: 1,
    };

    let spawn_id = builder.next_entity_id();
    builder.platforms.push(Platform::new_static(spawn_id, spawn_rect()));

    let mut fallback_platforms = 0;
    for _ in 0..params.platform_count {
        let last = builder.last_rect();
        let platform = match builder.propose_platform(&last) {
            Some(platform) => platform,
            None => {
                fallback_platforms += 1;
                builder.fallback_platform(&last)
            }
        };
        let placed = platform.clone();
        builder.platforms.push(platform);

        builder.place_hazards(&placed);
        builder.place_enemy(&placed);
    }

    let last = builder.last_rect();
    let (portal, portal_fallback) = place_portal(&last, envelope);

    let level = Level {
        seed: normalize_seed(params.seed),
        level_index: params.level_index,
        platforms: builder.platforms,
        hazards: builder.hazards,
        enemies: builder.enemies,
        portal,
        fallback_platforms,
        portal_fallback,
        next_id: builder.next_id,
    };

    log::info!(
        "Level {} (seed {}): {} platforms, {} hazards, {} enemies, {} fallbacks",
        level.level_index,
        level.seed,
        level.platforms.len(),
        level.hazards.len(),
        level.enemies.len(),
        level.fallback_platforms
    );

    level
}

/// Portal ahead of and above `last`, or the guaranteed offset if that fails
fn place_portal(last: &Aabb, envelope: &MovementEnvelope) -> (Aabb, bool) {
    let portal = Aabb::new(
        last.right() + PORTAL_GAP,
        last.top() - PORTAL_RISE,
        PORTAL_W,
        PORTAL_H,
    );
    if can_reach(last, &portal, envelope) {
        return (portal, false);
    }

    log::debug!("Portal repositioned to fallback offset");
    let rise = PORTAL_FALLBACK_RISE.min(envelope.max_up.max(0.0));
    let portal = Aabb::new(
        last.right() + MIN_PLATFORM_GAP,
        last.top() - rise,
        PORTAL_W,
        PORTAL_H,
    );
    (portal, true)
}

struct LevelBuilder<'a, R: RandomSource> {
    rng: &'a mut R,
    envelope: &'a MovementEnvelope,
    features: LevelFeatures,
    params: &'a GenerateParams,
    platforms: Vec<Platform>,
    hazards: Vec<Hazard>,
    enemies: Vec<Enemy>,
    next_id: u32,
}

impl<R: RandomSource> LevelBuilder<'_, R> {
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn last_rect(&self) -> Aabb {
        self.platforms.last().map(|p| p.rect).unwrap_or_else(spawn_rect)
    }

    /// Draw candidates until one is reachable from `last`
    fn propose_platform(&mut self, last: &Aabb) -> Option<Platform> {
        for _ in 0..MAX_ATTEMPTS {
            let up = self.rng.next() < self.params.vertical_bias;
            let moving = self.rng.next() < self.features.moving_chance;

            let x = last.left() + self.rng.span(STEP_X_MIN, STEP_X_SPAN);
            let step_y = self.rng.span(STEP_Y_MIN, STEP_Y_SPAN);
            let y = last.top() + if up { -step_y } else { step_y };
            let w = self.rng.span(WIDTH_MIN, WIDTH_SPAN);
            let rect = Aabb::new(x, y.clamp(MIN_PLATFORM_Y, MAX_PLATFORM_Y), w, PLATFORM_H);

            let motion = if moving {
                let amplitude = self.rng.span(MOVE_RANGE_MIN, MOVE_RANGE_SPAN);
                let sign = self.rng.sign();
                let angular_speed = sign * self.rng.span(MOVE_SPEED_MIN, MOVE_SPEED_SPAN);
                let phase = self.rng.next_f32() * TAU;
                PlatformMotion::Moving {
                    origin_x: x,
                    amplitude,
                    angular_speed,
                    phase,
                    prev_x: x,
                }
            } else {
                PlatformMotion::Static
            };

            if can_reach(last, &rect, self.envelope) {
                let id = self.next_entity_id();
                return Some(Platform { id, rect, motion });
            }
        }
        None
    }

    /// Guaranteed-reachable static platform to the right of `last`
    fn fallback_platform(&mut self, last: &Aabb) -> Platform {
        let gap = FALLBACK_GAP.min(self.envelope.max_dist).max(MIN_PLATFORM_GAP);
        let rise = FALLBACK_RISE.min(self.envelope.max_up.max(0.0));
        let y = (last.top() - rise).clamp(MIN_PLATFORM_Y, MAX_PLATFORM_Y);
        log::debug!("Fallback platform at x={} y={}", last.right() + gap, y);

        let id = self.next_entity_id();
        Platform::new_static(id, Aabb::new(last.right() + gap, y, FALLBACK_W, PLATFORM_H))
    }

    fn place_hazards(&mut self, platform: &Platform) {
        if self.params.no_hazard_on_moving && platform.is_moving() {
            return;
        }

        let spike_rate = self.features.spike_chance;
        let orb_rate = self.features.orb_chance;
        let width = platform.rect.size.x;
        let can_spike = spike_rate > 0.0 && width > SPIKE_MIN_PLATFORM_W;
        let can_orb = orb_rate > 0.0 && width > ORB_MIN_PLATFORM_W;

        if self.params.single_hazard_per_platform {
            if !(can_spike || can_orb) {
                return;
            }
            // One roll decides whether, one weighted roll decides which
            let total = spike_rate + orb_rate;
            if self.rng.next() < total.min(1.0) {
                let pick = self.rng.next() * total;
                if can_spike && pick < spike_rate {
                    self.push_spike(&platform.rect);
                } else if can_orb {
                    self.push_orb(&platform.rect);
                }
            }
        } else {
            if can_spike && self.rng.next() < spike_rate {
                self.push_spike(&platform.rect);
            }
            if can_orb && self.rng.next() < orb_rate {
                self.push_orb(&platform.rect);
            }
        }
    }

    fn push_spike(&mut self, on: &Aabb) {
        let id = self.next_entity_id();
        let rect = Aabb::new(
            on.left() + on.size.x * 0.5 - SPIKE_W / 2.0,
            on.top() - SPIKE_H,
            SPIKE_W,
            SPIKE_H,
        );
        self.hazards.push(Hazard::new(id, rect, HazardKind::Spike));
    }

    fn push_orb(&mut self, on: &Aabb) {
        let radius = self.rng.span(ORB_RADIUS_MIN, ORB_RADIUS_SPAN);
        let base = Vec2::new(on.left() + on.size.x * 0.5, on.top() - ORB_LIFT);
        let range = self.rng.span(ORB_RANGE_MIN, ORB_RANGE_SPAN);
        let speed = self.rng.span(ORB_SPEED_MIN, ORB_SPEED_SPAN);
        let phase = self.rng.next_f32() * TAU;

        let id = self.next_entity_id();
        let rect = Aabb::new(base.x - radius, base.y - radius, radius * 2.0, radius * 2.0);
        self.hazards.push(Hazard::new(
            id,
            rect,
            HazardKind::Orb {
                radius,
                base,
                range,
                speed,
                phase,
                reward: ORB_REWARD,
            },
        ));
    }

    fn place_enemy(&mut self, platform: &Platform) {
        let rate = self.features.enemy_chance;
        let on = platform.rect;
        if rate <= 0.0 || platform.is_moving() || on.size.x <= ENEMY_MIN_PLATFORM_W {
            return;
        }
        if self.rng.next() >= rate {
            return;
        }

        let pool = enemy_pool(self.params.level_index);
        let index = ((self.rng.next() * pool.len() as f64) as usize).min(pool.len() - 1);
        let base_x = on.left() + 10.0 + self.rng.next_f32() * (on.size.x - 40.0);

        let enemy = match pool[index] {
            EnemyType::Floater => {
                let size = 26.0;
                let rect = Aabb::new(base_x, on.top() - 80.0, size, size);
                let range = Vec2::new(self.rng.span(20.0, 40.0), self.rng.span(14.0, 30.0));
                let speed = self.rng.span(0.9, 1.1);
                let phase = self.rng.next_f32() * TAU;
                let kind = EnemyKind::Floater {
                    base: Vec2::new(base_x, on.top() - 60.0),
                    range,
                    speed,
                    phase,
                };
                (rect, kind, FLOATER_REWARD)
            }
            EnemyType::Hopper => {
                let (w, h) = (26.0, 30.0);
                let rect = Aabb::new(base_x, on.top() - h - ENEMY_CLEARANCE, w, h);
                let sign = self.rng.sign();
                let vx = sign * self.rng.span(0.9, 1.1);
                let jump_timer = self.rng.span(0.6, 1.2);
                let kind = EnemyKind::Hopper {
                    vel: Vec2::new(vx, 0.0),
                    min_x: on.left() + 6.0,
                    max_x: on.right() - w - 6.0,
                    platform_y: on.top(),
                    jump_timer,
                };
                (rect, kind, HOPPER_REWARD)
            }
            EnemyType::Crawler => {
                let size = 28.0;
                let rect = Aabb::new(base_x, on.top() - size - ENEMY_CLEARANCE, size, size);
                let range = self.rng.span(20.0, 50.0);
                let speed = self.rng.span(0.8, 1.2);
                let dir = self.rng.sign();
                let kind = EnemyKind::Crawler {
                    base_x,
                    range,
                    speed,
                    dir,
                    platform_y: on.top(),
                };
                (rect, kind, CRAWLER_REWARD)
            }
        };

        let (rect, kind, reward) = enemy;
        let id = self.next_entity_id();
        self.enemies.push(Enemy::new(id, rect, kind, reward));
    }
}

/// Enemy subtype tags for pool selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnemyType {
    Crawler,
    Hopper,
    Floater,
}

/// Subtypes unlocked at a level index, in draw order
fn enemy_pool(level: u32) -> Vec<EnemyType> {
    let mut pool = vec![EnemyType::Crawler];
    if level >= HOPPER_UNLOCK_LEVEL {
        pool.push(EnemyType::Hopper);
    }
    if level >= FLOATER_UNLOCK_LEVEL {
        pool.push(EnemyType::Floater);
    }
    pool
}
