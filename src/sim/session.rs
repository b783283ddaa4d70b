//! Play session: mode, progression and level transitions
//!
//! Owns the [`WorldState`] and decides what gets generated next when the
//! portal is reached.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::envelope::MovementEnvelope;
use super::events::GameEvent;
use super::generate::{
    FeatureOverrides, GenerateParams, Level, generate_level, platform_count_for_level,
};
use super::rng::normalize_seed;
use super::state::{GameMode, GamePhase, WorldState};
use crate::Loadout;

/// Race rounds draw seeds from here upward
pub const RACE_BASE_SEED: i64 = 12_345;
/// Level index race rounds are generated at
pub const RACE_LEVEL_INDEX: u32 = 10;
/// Stride between derived classic seeds
const LEVEL_SEED_STRIDE: i64 = 997;
/// Coins for clearing a classic level (before multiplier)
pub const LEVEL_REWARD: u32 = 10;
/// Coins per race round on completion (before multiplier)
pub const RACE_ROUND_REWARD: u32 = 5;

/// A running game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub world: WorldState,
    pub loadout: Loadout,
    pub mode: GameMode,
    pub phase: GamePhase,
    /// Classic level index (1-based)
    pub level: u32,
    /// Current race round (0-based)
    pub round: u32,
    /// Limits the current level was generated against
    pub envelope: MovementEnvelope,
    /// Coins granted this session (multiplier applied)
    pub coins_earned: u64,
    /// Seconds spent in the current round
    pub round_time: f32,
    /// Seconds across all rounds of a timed run
    pub total_time: f32,
    /// Previously recorded seeds by classic level
    pub level_seeds: BTreeMap<u32, u32>,
    /// Base for seeds of levels without a recorded one
    pub entropy: u64,
    /// Pause input state last frame (edge detection)
    #[serde(default)]
    pub pause_held: bool,
}

impl Game {
    /// Start classic progression at `start_level`
    pub fn classic(
        loadout: Loadout,
        start_level: u32,
        level_seeds: BTreeMap<u32, u32>,
        entropy: u64,
    ) -> Self {
        Self::start(loadout, GameMode::Classic, start_level.max(1), level_seeds, entropy)
    }

    /// Start a race of `rounds` rounds
    pub fn race(loadout: Loadout, rounds: u32) -> Self {
        Self::start(
            loadout,
            GameMode::Race { rounds: rounds.max(1) },
            RACE_LEVEL_INDEX,
            BTreeMap::new(),
            0,
        )
    }

    /// Start a speedrun
    pub fn speedrun(loadout: Loadout) -> Self {
        Self::start(loadout, GameMode::Speedrun, RACE_LEVEL_INDEX, BTreeMap::new(), 0)
    }

    fn start(
        mut loadout: Loadout,
        mode: GameMode,
        level: u32,
        level_seeds: BTreeMap<u32, u32>,
        entropy: u64,
    ) -> Self {
        loadout.sanitize();
        let envelope = MovementEnvelope::compute(&loadout, mode, level);
        let params = level_params(mode, level, 0, &level_seeds, entropy);
        let world = WorldState::new(generate_level(&params, &envelope));

        Self {
            world,
            loadout,
            mode,
            phase: GamePhase::Playing,
            level,
            round: 0,
            envelope,
            coins_earned: 0,
            round_time: 0.0,
            total_time: 0.0,
            level_seeds,
            entropy,
            pause_held: false,
        }
    }

    /// Generation inputs for the current level or round
    pub fn current_params(&self) -> GenerateParams {
        level_params(self.mode, self.level, self.round, &self.level_seeds, self.entropy)
    }

    /// Regenerate the current level or round and reset the player
    pub fn load_current_level(&mut self) {
        // Upgrades may have changed since the last level
        self.envelope = MovementEnvelope::compute(&self.loadout, self.mode, self.level);
        let level: Level = generate_level(&self.current_params(), &self.envelope);
        self.world.load_level(level);
        self.round_time = 0.0;
    }

    /// Swap in a new loadout; takes effect from the next generated level
    pub fn set_loadout(&mut self, mut loadout: Loadout) {
        loadout.sanitize();
        self.loadout = loadout;
    }

    /// Flip between playing and paused. Finished sessions stay finished.
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            GamePhase::Finished => GamePhase::Finished,
        };
    }

    fn grant(&mut self, base: u32) -> u32 {
        let reward = base * self.loadout.coin_multiplier();
        self.coins_earned += reward as u64;
        reward
    }

    /// Portal reached: advance the level or round
    pub(crate) fn complete_level(&mut self, events: &mut Vec<GameEvent>) {
        match self.mode.rounds() {
            None => {
                events.push(GameEvent::PortalReached {
                    mode: self.mode,
                    round: self.level,
                });
                let reward = self.grant(LEVEL_REWARD);
                let seed = self.world.seed;
                self.level_seeds.entry(self.level).or_insert(seed);
                events.push(GameEvent::LevelComplete {
                    level: self.level,
                    seed,
                    reward,
                });
                log::debug!("Level {} complete (seed {})", self.level, seed);

                self.level += 1;
                self.load_current_level();
            }
            Some(rounds) => {
                events.push(GameEvent::PortalReached {
                    mode: self.mode,
                    round: self.round,
                });
                let round_time = self.round_time;
                self.round += 1;

                if self.round >= rounds {
                    let reward = self.grant(rounds * RACE_ROUND_REWARD);
                    events.push(GameEvent::RaceComplete {
                        mode: self.mode,
                        rounds,
                        total_time: self.total_time,
                        reward,
                    });
                    log::debug!("Race complete in {:.2}s", self.total_time);
                    self.phase = GamePhase::Finished;
                } else {
                    events.push(GameEvent::RoundComplete {
                        round: self.round,
                        rounds,
                        round_time,
                    });
                    self.load_current_level();
                }
            }
        }
    }
}

/// Seed for a classic level: the recorded one, else derived from `entropy`
pub fn seed_for_level(level: u32, level_seeds: &BTreeMap<u32, u32>, entropy: u64) -> i64 {
    match level_seeds.get(&level) {
        Some(&seed) => seed as i64,
        None => {
            let derived = (entropy as i64).wrapping_add(level as i64 * LEVEL_SEED_STRIDE);
            normalize_seed(derived) as i64
        }
    }
}

/// Generation inputs for a mode at a level (classic) or round (timed)
pub fn level_params(
    mode: GameMode,
    level: u32,
    round: u32,
    level_seeds: &BTreeMap<u32, u32>,
    entropy: u64,
) -> GenerateParams {
    match mode {
        GameMode::Classic => GenerateParams {
            seed: seed_for_level(level, level_seeds, entropy),
            platform_count: platform_count_for_level(level),
            vertical_bias: 0.72,
            level_index: level,
            overrides: FeatureOverrides::default(),
            no_hazard_on_moving: true,
            single_hazard_per_platform: true,
        },
        GameMode::Race { .. } | GameMode::Speedrun => GenerateParams {
            seed: RACE_BASE_SEED + round as i64,
            platform_count: 10,
            vertical_bias: 0.7,
            level_index: RACE_LEVEL_INDEX,
            overrides: FeatureOverrides {
                moving_chance: Some(0.3),
                spike_chance: Some(0.25),
                orb_chance: Some(0.15),
                enemy_chance: None,
            },
            no_hazard_on_moving: true,
            single_hazard_per_platform: true,
        },
    }
}
