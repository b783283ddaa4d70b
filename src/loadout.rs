//! Player loadout: upgrade tiers and equipped weapon
//!
//! Owned by the save-state collaborator and handed to the simulation
//! read-only at level start.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clamp_tier;

/// Errors from parsing loadout names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadoutError {
    #[error("unknown weapon `{0}` (expected pulse, rapid or scatter)")]
    UnknownWeapon(String),
}

/// Weapon types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    #[default]
    Pulse,
    Rapid,
    Scatter,
}

/// Firing characteristics of a weapon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    /// Bullets per shot
    pub ammo: u32,
    /// Seconds between shots
    pub cooldown: f32,
    /// Bullet speed (per tick)
    pub speed: f32,
    /// Angular offset between adjacent bullets of one shot
    pub spread: f32,
    /// Coins a bullet is worth when its target carries no reward
    pub reward: u32,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [WeaponKind::Pulse, WeaponKind::Rapid, WeaponKind::Scatter];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Pulse => "pulse",
            WeaponKind::Rapid => "rapid",
            WeaponKind::Scatter => "scatter",
        }
    }

    /// Catalog entry for this weapon
    pub fn spec(&self) -> WeaponSpec {
        match self {
            WeaponKind::Pulse => WeaponSpec {
                ammo: 1,
                cooldown: 0.22,
                speed: 16.0,
                spread: 0.0,
                reward: 5,
            },
            WeaponKind::Rapid => WeaponSpec {
                ammo: 1,
                cooldown: 0.12,
                speed: 15.0,
                spread: 0.0,
                reward: 4,
            },
            WeaponKind::Scatter => WeaponSpec {
                ammo: 3,
                cooldown: 0.3,
                speed: 14.0,
                spread: 0.12,
                reward: 4,
            },
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeaponKind {
    type Err = LoadoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pulse" => Ok(WeaponKind::Pulse),
            "rapid" => Ok(WeaponKind::Rapid),
            "scatter" => Ok(WeaponKind::Scatter),
            other => Err(LoadoutError::UnknownWeapon(other.to_string())),
        }
    }
}

/// Upgrade state and equipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    // === Owned tiers ===
    /// Purchased jump tier
    pub jump_tier: u8,
    /// Purchased speed tier
    pub speed_tier: u8,
    /// Purchased coin multiplier tier
    pub coin_tier: u8,

    // === Chosen tiers ===
    /// Jump tier actually in use (None = owned tier)
    #[serde(default)]
    pub jump_use: Option<u8>,
    /// Speed tier actually in use (None = owned tier)
    #[serde(default)]
    pub speed_use: Option<u8>,

    // === Abilities ===
    pub double_jump_owned: bool,
    #[serde(default = "default_true")]
    pub double_jump_enabled: bool,
    /// Equipped weapon (None = unarmed)
    #[serde(default)]
    pub weapon: Option<WeaponKind>,
}

fn default_true() -> bool {
    true
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            jump_tier: 0,
            speed_tier: 0,
            coin_tier: 0,
            jump_use: None,
            speed_use: None,
            double_jump_owned: false,
            double_jump_enabled: true,
            weapon: None,
        }
    }
}

impl Loadout {
    /// Clamp every tier into range and every chosen tier under its owned tier
    pub fn sanitize(&mut self) {
        self.jump_tier = clamp_tier(self.jump_tier);
        self.speed_tier = clamp_tier(self.speed_tier);
        self.coin_tier = clamp_tier(self.coin_tier);
        self.jump_use = self.jump_use.map(|t| t.min(self.jump_tier));
        self.speed_use = self.speed_use.map(|t| t.min(self.speed_tier));
    }

    /// Jump tier feeding the movement envelope
    pub fn effective_jump_tier(&self) -> u8 {
        let owned = clamp_tier(self.jump_tier);
        self.jump_use.unwrap_or(owned).min(owned)
    }

    /// Speed tier feeding the movement envelope
    pub fn effective_speed_tier(&self) -> u8 {
        let owned = clamp_tier(self.speed_tier);
        self.speed_use.unwrap_or(owned).min(owned)
    }

    /// Multiplier applied to every coin grant
    pub fn coin_multiplier(&self) -> u32 {
        1 + clamp_tier(self.coin_tier) as u32
    }

    /// Double jump is both owned and switched on
    pub fn double_jump_active(&self) -> bool {
        self.double_jump_owned && self.double_jump_enabled
    }

    /// Catalog entry of the equipped weapon
    pub fn weapon_spec(&self) -> Option<WeaponSpec> {
        self.weapon.map(|w| w.spec())
    }
}
