//! Per-frame simulation step
//!
//! Advances the session by one variable time delta: player integration,
//! entity animation, collision resolution, then camera follow. Portal
//! completion hands control back to the session for the next level.

use glam::Vec2;

use super::collision;
use super::envelope::MovementEnvelope;
use super::events::GameEvent;
use super::geom::Aabb;
use super::session::Game;
use super::state::{Bullet, GamePhase, WorldState};
use crate::Loadout;
use crate::consts::*;

/// Gap between the player's right edge and a fresh bullet
const MUZZLE_OFFSET_X: f32 = 4.0;

/// Input sampled for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Move left held (wins over right)
    pub left: bool,
    /// Move right held
    pub right: bool,
    /// Jump held
    pub jump: bool,
    /// Fire held
    pub shoot: bool,
    /// Pause held; toggles on the press edge
    pub pause: bool,
}

/// Advance the session by one frame, returning the events it produced
pub fn advance(game: &mut Game, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    let pause_pressed = input.pause && !game.pause_held;
    game.pause_held = input.pause;
    if pause_pressed {
        game.toggle_pause();
        if game.phase == GamePhase::Paused {
            return events;
        }
    }

    // Paused and finished sessions are frozen
    if game.phase != GamePhase::Playing {
        return events;
    }

    let dt = clamp_dt(dt);
    if game.mode.is_timed() {
        game.round_time += dt;
        game.total_time += dt;
    }

    step_world(
        &mut game.world,
        &game.loadout,
        &game.envelope,
        input,
        dt,
        &mut events,
    );

    let outcome = collision::resolve(
        &mut game.world,
        game.loadout.coin_multiplier(),
        &mut events,
    );
    game.coins_earned += outcome.coins as u64;

    let focus = game.world.player.rect.center();
    game.world.camera.follow(focus);

    if outcome.portal_reached {
        game.complete_level(&mut events);
    }

    game.world.normalize_order();
    events
}

/// Clamp a frame delta into `[0, MAX_FRAME_DT]`; garbage becomes zero
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    }
}

/// Move everything in the world by `dt` seconds, without resolving contacts
pub fn step_world(
    world: &mut WorldState,
    loadout: &Loadout,
    envelope: &MovementEnvelope,
    input: &TickInput,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    world.time += dt;

    apply_jump(world, loadout, envelope, input.jump, events);

    world.gun_cooldown = (world.gun_cooldown - dt).max(0.0);
    if input.shoot && world.gun_cooldown <= 0.0 {
        fire(world, loadout, events);
    }

    let player = &mut world.player;
    player.vel.x = if input.left {
        -envelope.horizontal_speed
    } else if input.right {
        envelope.horizontal_speed
    } else {
        0.0
    };
    player.prev_bottom = player.rect.bottom();
    player.vel.y += GRAVITY * TICK_SCALE * dt;
    player.rect.pos += player.vel * TICK_SCALE * dt;

    let time = world.time;
    for platform in &mut world.platforms {
        platform.animate(time);
    }
    for hazard in &mut world.hazards {
        hazard.animate(time);
    }
    for enemy in &mut world.enemies {
        enemy.animate(time, dt, &mut world.motion_rng);
    }

    let min_x = world.camera.pos.x - BULLET_CULL_MARGIN;
    let max_x = world.camera.pos.x + VIEW_WIDTH + BULLET_CULL_MARGIN;
    world.bullets.retain_mut(|b| {
        b.rect.pos += b.vel * TICK_SCALE * dt;
        b.rect.left() >= min_x && b.rect.left() <= max_x
    });
}

/// Ground jump on a press edge; one weaker mid-air jump per airborne phase
fn apply_jump(
    world: &mut WorldState,
    loadout: &Loadout,
    envelope: &MovementEnvelope,
    jump: bool,
    events: &mut Vec<GameEvent>,
) {
    let player = &mut world.player;
    let pressed = jump && !player.last_jump_held;
    player.last_jump_held = jump;

    if !pressed {
        return;
    }

    if player.grounded {
        player.vel.y = -envelope.jump_velocity;
        player.grounded = false;
        player.can_double_jump = true;
        events.push(GameEvent::Jumped { double: false });
    } else if player.can_double_jump && loadout.double_jump_active() {
        player.vel.y = -envelope.jump_velocity * DOUBLE_JUMP_FACTOR;
        player.can_double_jump = false;
        events.push(GameEvent::Jumped { double: true });
    }
}

/// Spawn the equipped weapon's volley and restart its cooldown
fn fire(world: &mut WorldState, loadout: &Loadout, events: &mut Vec<GameEvent>) {
    let Some(spec) = loadout.weapon_spec() else {
        return;
    };

    let origin = Vec2::new(
        world.player.rect.right() + MUZZLE_OFFSET_X,
        world.player.rect.center().y - BULLET_HEIGHT / 2.0,
    );
    let center = (spec.ammo as f32 - 1.0) / 2.0;
    for i in 0..spec.ammo {
        let offset = (i as f32 - center) * spec.spread;
        let id = world.next_entity_id();
        world.bullets.push(Bullet {
            id,
            rect: Aabb::new(origin.x, origin.y, BULLET_WIDTH, BULLET_HEIGHT),
            vel: Vec2::new(spec.speed, offset * spec.speed),
            reward: spec.reward,
        });
    }

    world.gun_cooldown = spec.cooldown;
    events.push(GameEvent::Shot { bullets: spec.ammo });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::WeaponKind;
    use crate::sim::events::DeathCause;

    const DT: f32 = 1.0 / 60.0;

    fn standing_game(loadout: Loadout) -> Game {
        let mut game = Game::classic(loadout, 1, BTreeMap::new(), 99);
        game.world.hazards.clear();
        game.world.enemies.clear();
        // Settle onto the spawn platform
        for _ in 0..30 {
            advance(&mut game, &TickInput::default(), DT);
        }
        assert!(game.world.player.grounded);
        game
    }

    fn jump_count(events: &[GameEvent], double: bool) -> usize {
        events
            .iter()
            .filter(|e| **e == GameEvent::Jumped { double })
            .count()
    }

    #[test]
    fn test_player_settles_on_spawn() {
        let game = standing_game(Loadout::default());
        let spawn = game.world.platforms[0].rect;
        assert_eq!(game.world.player.rect.bottom(), spawn.top());
        assert_eq!(game.world.player.vel.y, 0.0);
    }

    #[test]
    fn test_jump_is_edge_triggered() {
        let mut game = standing_game(Loadout::default());
        let held = TickInput {
            jump: true,
            ..Default::default()
        };
        let mut events = advance(&mut game, &held, DT);
        assert_eq!(jump_count(&events, false), 1);
        assert!(game.world.player.vel.y < 0.0);

        // Holding through the landing must not re-jump
        for _ in 0..240 {
            events.extend(advance(&mut game, &held, DT));
        }
        assert!(game.world.player.grounded);
        assert_eq!(jump_count(&events, false), 1);
    }

    #[test]
    fn test_double_jump_once_per_airborne_phase() {
        let loadout = Loadout {
            double_jump_owned: true,
            ..Default::default()
        };
        let mut game = standing_game(loadout);
        let press = TickInput {
            jump: true,
            ..Default::default()
        };
        let release = TickInput::default();

        let mut events = advance(&mut game, &press, DT);
        events.extend(advance(&mut game, &release, DT));
        events.extend(advance(&mut game, &press, DT));
        let vy = game.world.player.vel.y;
        let expected =
            -game.envelope.jump_velocity * DOUBLE_JUMP_FACTOR + GRAVITY * TICK_SCALE * DT;
        assert!((vy - expected).abs() < 1e-4);

        events.extend(advance(&mut game, &release, DT));
        events.extend(advance(&mut game, &press, DT));
        assert_eq!(jump_count(&events, false), 1);
        assert_eq!(jump_count(&events, true), 1);
    }

    #[test]
    fn test_double_jump_needs_upgrade_enabled() {
        let loadout = Loadout {
            double_jump_owned: true,
            double_jump_enabled: false,
            ..Default::default()
        };
        let mut game = standing_game(loadout);
        let press = TickInput {
            jump: true,
            ..Default::default()
        };
        let mut events = advance(&mut game, &press, DT);
        events.extend(advance(&mut game, &TickInput::default(), DT));
        events.extend(advance(&mut game, &press, DT));
        assert_eq!(jump_count(&events, true), 0);
    }

    #[test]
    fn test_weapon_cooldown_gates_fire() {
        let loadout = Loadout {
            weapon: Some(WeaponKind::Pulse),
            ..Default::default()
        };
        let mut game = standing_game(loadout);
        let shoot = TickInput {
            shoot: true,
            ..Default::default()
        };

        let mut shots = 0;
        // 0.5 s of held fire at a 0.22 s cooldown
        for _ in 0..30 {
            let events = advance(&mut game, &shoot, DT);
            shots += events
                .iter()
                .filter(|e| matches!(e, GameEvent::Shot { .. }))
                .count();
        }
        assert_eq!(shots, 3);
    }

    #[test]
    fn test_unarmed_shooting_is_ignored() {
        let mut game = standing_game(Loadout::default());
        let shoot = TickInput {
            shoot: true,
            ..Default::default()
        };
        let events = advance(&mut game, &shoot, DT);
        assert!(events.is_empty());
        assert!(game.world.bullets.is_empty());
    }

    #[test]
    fn test_scatter_spread_is_symmetric() {
        let loadout = Loadout {
            weapon: Some(WeaponKind::Scatter),
            ..Default::default()
        };
        let mut game = standing_game(loadout);
        let mut events = Vec::new();
        fire(&mut game.world, &game.loadout, &mut events);

        assert_eq!(events, vec![GameEvent::Shot { bullets: 3 }]);
        let vys: Vec<f32> = game.world.bullets.iter().map(|b| b.vel.y).collect();
        let spec = WeaponKind::Scatter.spec();
        assert_eq!(vys, vec![-spec.spread * spec.speed, 0.0, spec.spread * spec.speed]);
        assert!(game.world.bullets.iter().all(|b| b.vel.x == spec.speed));
        assert_eq!(game.world.gun_cooldown, spec.cooldown);

        let player = game.world.player.rect;
        let b = game.world.bullets[0].rect;
        assert_eq!(b.left(), player.right() + MUZZLE_OFFSET_X);
        assert_eq!(b.center().y, player.center().y);
    }

    #[test]
    fn test_bullets_culled_past_view() {
        let loadout = Loadout {
            weapon: Some(WeaponKind::Rapid),
            ..Default::default()
        };
        let mut game = standing_game(loadout);
        let shoot = TickInput {
            shoot: true,
            ..Default::default()
        };
        advance(&mut game, &shoot, DT);
        assert_eq!(game.world.bullets.len(), 1);

        // 15 px per tick clears the view in well under 200 frames
        for _ in 0..200 {
            advance(&mut game, &TickInput::default(), DT);
        }
        assert!(game.world.bullets.is_empty());
    }

    #[test]
    fn test_pause_freezes_world() {
        let mut game = standing_game(Loadout::default());
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        advance(&mut game, &pause, DT);
        assert_eq!(game.phase, GamePhase::Paused);

        let frozen = serde_json::to_string(&game.world).unwrap();
        let run = TickInput {
            right: true,
            jump: true,
            ..Default::default()
        };
        for _ in 0..20 {
            assert!(advance(&mut game, &run, DT).is_empty());
        }
        assert_eq!(serde_json::to_string(&game.world).unwrap(), frozen);

        advance(&mut game, &pause, DT);
        assert_eq!(game.phase, GamePhase::Playing);
    }

    #[test]
    fn test_held_pause_toggles_once() {
        let mut game = standing_game(Loadout::default());
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        for _ in 0..5 {
            advance(&mut game, &pause, DT);
            assert_eq!(game.phase, GamePhase::Paused);
        }
        advance(&mut game, &TickInput::default(), DT);
        assert_eq!(game.phase, GamePhase::Paused);
        advance(&mut game, &pause, DT);
        assert_eq!(game.phase, GamePhase::Playing);
    }

    #[test]
    fn test_zero_dt_frame_keeps_footing() {
        let mut game = standing_game(Loadout::default());
        for dt in [0.0, f32::NAN, -1.0] {
            let events = advance(&mut game, &TickInput::default(), dt);
            assert!(game.world.player.grounded);
            assert!(events.is_empty());
        }

        let press = TickInput {
            jump: true,
            ..Default::default()
        };
        let events = advance(&mut game, &press, DT);
        assert_eq!(events, vec![GameEvent::Jumped { double: false }]);
        assert!(game.world.player.vel.y < 0.0);
    }

    #[test]
    fn test_full_envelope_drop_lands_at_low_frame_rate() {
        for tier in [0, 5] {
            let loadout = Loadout {
                jump_tier: tier,
                speed_tier: tier,
                ..Default::default()
            };
            for k in 0..10 {
                let mut game = Game::classic(loadout.clone(), 1, BTreeMap::new(), 99);
                game.world.hazards.clear();
                game.world.enemies.clear();
                let target = game.world.platforms[1].rect;
                let drop = game.envelope.max_up + game.envelope.max_down - 7.0 * k as f32;
                let start = Vec2::new(
                    target.center().x - PLAYER_WIDTH / 2.0,
                    target.top() - drop - PLAYER_HEIGHT,
                );
                game.world.player.teleport(start);
                game.world.player.vel = Vec2::ZERO;

                let mut events = Vec::new();
                for _ in 0..200 {
                    events.extend(advance(&mut game, &TickInput::default(), MAX_FRAME_DT));
                    if game.world.player.grounded {
                        break;
                    }
                }
                assert!(
                    !events.iter().any(|e| matches!(e, GameEvent::Died { .. })),
                    "tier {} drop {} fell through",
                    tier,
                    drop
                );
                assert!(game.world.player.grounded);
                assert!((game.world.player.rect.bottom() - target.top()).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_dt_is_clamped() {
        assert_eq!(clamp_dt(1.0), MAX_FRAME_DT);
        assert_eq!(clamp_dt(-0.5), 0.0);
        assert_eq!(clamp_dt(f32::NAN), 0.0);
        assert_eq!(clamp_dt(f32::INFINITY), 0.0);

        let mut game = standing_game(Loadout::default());
        let before = game.world.time;
        advance(&mut game, &TickInput::default(), 10.0);
        assert_eq!(game.world.time, before + MAX_FRAME_DT);
    }

    #[test]
    fn test_running_moves_at_envelope_speed() {
        let mut game = standing_game(Loadout::default());
        let x = game.world.player.rect.pos.x;
        let run = TickInput {
            right: true,
            ..Default::default()
        };
        advance(&mut game, &run, DT);
        let dx = game.world.player.rect.pos.x - x;
        assert!((dx - game.envelope.horizontal_speed * TICK_SCALE * DT).abs() < 1e-3);

        let both = TickInput {
            left: true,
            right: true,
            ..Default::default()
        };
        advance(&mut game, &both, DT);
        assert!(game.world.player.vel.x < 0.0);
    }

    #[test]
    fn test_falling_off_resets_to_spawn() {
        let mut game = standing_game(Loadout::default());
        game.world.player.teleport(Vec2::new(-500.0, 0.0));
        game.world.player.vel = Vec2::ZERO;

        let mut died = false;
        for _ in 0..600 {
            let events = advance(&mut game, &TickInput::default(), DT);
            if events.contains(&GameEvent::Died {
                cause: DeathCause::Fall,
            }) {
                died = true;
                break;
            }
        }
        assert!(died);
        assert_eq!(game.world.player.rect.pos, game.world.spawn_point());
    }

    #[test]
    fn test_portal_completes_classic_level() {
        let mut game = standing_game(Loadout::default());
        let portal = game.world.portal;
        game.world.player.teleport(portal.pos + Vec2::new(5.0, 5.0));
        game.world.player.vel = Vec2::ZERO;

        let events = advance(&mut game, &TickInput::default(), DT);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::LevelComplete { level: 1, .. })));
        assert_eq!(game.level, 2);
        assert_eq!(game.world.time, 0.0);
        assert_eq!(game.world.player.rect.pos, game.world.spawn_point());
    }

    #[test]
    fn test_race_runs_to_completion() {
        let mut game = Game::race(Loadout::default(), 3);
        let mut finished = None;
        let mut coins = 0;

        for round in 0..3 {
            assert_eq!(game.world.seed, 12_345 + round);
            for _ in 0..5 {
                advance(&mut game, &TickInput::default(), DT);
            }
            let portal = game.world.portal;
            game.world.hazards.clear();
            game.world.enemies.clear();
            game.world.player.teleport(portal.pos + Vec2::new(5.0, 5.0));
            game.world.player.vel = Vec2::ZERO;
            for event in advance(&mut game, &TickInput::default(), DT) {
                coins += event.coins() as u64;
                if let GameEvent::RaceComplete { total_time, rounds, .. } = event {
                    finished = Some((total_time, rounds));
                }
            }
        }

        let (total_time, rounds) = finished.unwrap();
        assert_eq!(rounds, 3);
        assert!((total_time - 18.0 * DT).abs() < 1e-4);
        assert_eq!(game.phase, GamePhase::Finished);
        assert_eq!(game.coins_earned, 15);
        assert_eq!(coins, game.coins_earned);

        // Finished sessions ignore further input
        assert!(advance(&mut game, &TickInput::default(), DT).is_empty());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let script = |frame: u32| TickInput {
            right: frame % 90 < 70,
            jump: frame % 40 < 3,
            shoot: frame % 15 == 0,
            ..Default::default()
        };
        let loadout = Loadout {
            weapon: Some(WeaponKind::Scatter),
            double_jump_owned: true,
            ..Default::default()
        };
        let run = || {
            let mut game = Game::classic(loadout.clone(), 45, BTreeMap::new(), 2024);
            let mut log = Vec::new();
            for frame in 0..900 {
                log.extend(advance(&mut game, &script(frame), DT));
            }
            (serde_json::to_string(&game.world).unwrap(), log)
        };
        assert_eq!(run(), run());
    }
}
