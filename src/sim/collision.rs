//! Ordered collision resolution
//!
//! Runs after every entity has moved for the frame. The order is fixed:
//! support, hazards, enemies, fall depth, portal, bullet impacts. Only one
//! death is processed per frame; once the player is reset the remaining
//! death checks are skipped.

use super::events::{DeathCause, GameEvent, KillTarget};
use super::state::WorldState;
use crate::consts::*;

/// Slack for feet resting on a platform top after the snap rounds
const SUPPORT_EPSILON: f32 = 1e-3;

/// Summary of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionOutcome {
    /// Player touched down this frame
    pub landed: bool,
    /// Death-reset applied this frame
    pub death: Option<DeathCause>,
    /// Player overlaps the portal
    pub portal_reached: bool,
    /// Coins granted by bullet kills (multiplier applied)
    pub coins: u32,
}

/// Resolve all collisions for the frame, mutating `world` and appending events
pub fn resolve(
    world: &mut WorldState,
    coin_multiplier: u32,
    events: &mut Vec<GameEvent>,
) -> CollisionOutcome {
    let mut outcome = CollisionOutcome {
        landed: resolve_support(world),
        ..Default::default()
    };
    if outcome.landed {
        events.push(GameEvent::Landed);
    }

    outcome.death = check_hazards(world)
        .or_else(|| check_enemies(world))
        .or_else(|| check_fall(world));
    if let Some(cause) = outcome.death {
        log::debug!("Player died ({:?}) at {:?}", cause, world.player.rect.pos);
        world.reset_player_to_spawn();
        events.push(GameEvent::Died { cause });
    }

    outcome.portal_reached = world.player.rect.overlaps(&world.portal);

    outcome.coins = resolve_bullet_impacts(world, coin_multiplier, events);
    world.compact();

    outcome
}

/// Snap a falling player onto the platform under their feet.
///
/// A platform supports the player when their feet are at or below its top
/// and either still inside the tolerance band or were above the top before
/// this frame's move. The sweep keeps fast falls from passing through; of
/// several crossed platforms the highest wins. Returns true on the
/// airborne-to-grounded transition.
pub fn resolve_support(world: &mut WorldState) -> bool {
    let player = &mut world.player;
    player.grounded = false;

    if player.vel.y >= 0.0 {
        let bottom = player.rect.bottom();
        let support = world
            .platforms
            .iter()
            .filter(|p| {
                let top = p.rect.top();
                player.rect.overlaps_x(&p.rect)
                    && bottom >= top - SUPPORT_EPSILON
                    && (bottom < p.rect.bottom() + SUPPORT_TOLERANCE
                        || player.prev_bottom <= top + SUPPORT_EPSILON)
            })
            .min_by(|a, b| a.rect.top().total_cmp(&b.rect.top()));

        if let Some(platform) = support {
            player.rect.pos.y = platform.rect.top() - player.rect.size.y;
            player.vel.y = 0.0;
            player.grounded = true;
            player.can_double_jump = true;
            // Carry
            player.rect.pos.x += platform.delta_x();
        }
    }

    let landed = player.grounded && !player.was_grounded;
    player.was_grounded = player.grounded;
    landed
}

fn check_hazards(world: &WorldState) -> Option<DeathCause> {
    let player = &world.player.rect;
    world
        .hazards
        .iter()
        .any(|h| player.overlaps(&h.rect))
        .then_some(DeathCause::Hazard)
}

fn check_enemies(world: &WorldState) -> Option<DeathCause> {
    let player = &world.player.rect;
    world
        .enemies
        .iter()
        .any(|e| player.overlaps(&e.rect))
        .then_some(DeathCause::Enemy)
}

fn check_fall(world: &WorldState) -> Option<DeathCause> {
    (world.player.rect.top() > FALL_DEATH_Y).then_some(DeathCause::Fall)
}

/// Test every live bullet against orbs, then enemies.
///
/// A target is destroyed by at most one bullet per frame; it is only marked
/// here and removed by [`WorldState::compact`]. Returns the coins granted.
pub fn resolve_bullet_impacts(
    world: &mut WorldState,
    coin_multiplier: u32,
    events: &mut Vec<GameEvent>,
) -> u32 {
    let mut coins = 0;
    let bullets = std::mem::take(&mut world.bullets);
    let mut survivors = Vec::with_capacity(bullets.len());

    for bullet in bullets {
        let hazard = world
            .hazards
            .iter_mut()
            .find(|h| h.is_shootable() && !h.hit && bullet.rect.overlaps(&h.rect));
        let (target, base_reward) = if let Some(h) = hazard {
            h.hit = true;
            (KillTarget::Hazard { id: h.id }, h.reward())
        } else if let Some(e) = world
            .enemies
            .iter_mut()
            .find(|e| !e.hit && bullet.rect.overlaps(&e.rect))
        {
            e.hit = true;
            (KillTarget::Enemy { id: e.id }, e.reward)
        } else {
            survivors.push(bullet);
            continue;
        };

        let base_reward = if base_reward == 0 { bullet.reward } else { base_reward };
        let reward = base_reward * coin_multiplier;
        coins += reward;
        events.push(GameEvent::BulletKill { target, reward });
    }

    world.bullets = survivors;
    coins
}
