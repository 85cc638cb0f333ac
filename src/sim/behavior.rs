//! Per-archetype behavior state machines
//!
//! Each enemy archetype advances its own small state machine off the shared
//! frame clock: drifters seek, spikes telegraph and dash, sentries hold
//! position and fire, and the boss cycles burst / charge phases. Updates may
//! move the enemy and fire projectiles; they never touch other entities.

use glam::Vec2;

use crate::sim::clock::clamp_duration;
use crate::sim::entity::{
    Aabb, BehaviorState, BossPhase, DashPhase, EntityKind, Faction, Group, Shot,
};
use crate::sim::events::GameEvent;
use crate::sim::registry::Registry;
use crate::tuning::{ShotTuning, Tuning};
use crate::unit_toward;

/// A projectile requested by a behavior update, spawned after the pass
#[derive(Debug, Clone, Copy)]
pub struct FiredShot {
    pub body: Aabb,
    pub vel: Vec2,
    pub shot: Shot,
}

impl FiredShot {
    /// Straight shot from `from` toward `dir` using a projectile template
    fn new(from: Vec2, dir: Vec2, tuning: &ShotTuning) -> Self {
        Self {
            body: Aabb::from_center(from, Vec2::new(tuning.width, tuning.height)),
            vel: dir * tuning.speed,
            shot: Shot {
                faction: Faction::Hostile,
                damage: tuning.damage,
            },
        }
    }
}

/// Advance every enemy's behavior for this frame
///
/// Runs after the spawn director and before steering and collision, per the
/// fixed frame order. `player_center` is the position sampled at frame start;
/// all archetypes aim at it rather than re-reading mid-pass.
pub fn update(
    reg: &mut Registry,
    now: u64,
    dt: f32,
    player_center: Vec2,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) {
    let mut fired: Vec<FiredShot> = Vec::new();

    for id in reg.member_ids(Group::Enemies) {
        let Some(entity) = reg.get_mut(id) else {
            continue;
        };
        let center = entity.body.center();
        let EntityKind::Enemy(enemy) = &mut entity.kind else {
            continue;
        };

        match &mut enemy.state {
            BehaviorState::Seek => {
                let dir = unit_toward(center, player_center, Vec2::ZERO);
                entity.body.pos += dir * enemy.speed * dt;
            }

            BehaviorState::Dash { phase, cooldown } => match *phase {
                DashPhase::Seeking => {
                    if cooldown.ready(now) {
                        *phase = DashPhase::Pausing {
                            until_ms: now + clamp_duration(tuning.spike.dash.pause_ms),
                        };
                    } else {
                        let dir = unit_toward(center, player_center, Vec2::ZERO);
                        entity.body.pos += dir * enemy.speed * dt;
                    }
                }
                DashPhase::Pausing { until_ms } => {
                    // Telegraph: hold still, then lock onto where the player
                    // is right now. The dash is never re-aimed.
                    if now >= until_ms {
                        *phase = DashPhase::Dashing {
                            until_ms: now + clamp_duration(tuning.spike.dash.duration_ms),
                            target: player_center,
                        };
                    }
                }
                DashPhase::Dashing { until_ms, target } => {
                    if now >= until_ms {
                        *phase = DashPhase::Seeking;
                        cooldown.arm(now);
                    } else {
                        let dir = unit_toward(center, target, Vec2::ZERO);
                        entity.body.pos += dir * tuning.spike.dash.dash_speed * dt;
                    }
                }
            },

            BehaviorState::Sentry { fire } => {
                if fire.fire(now) {
                    let dir = unit_toward(center, player_center, Vec2::new(0.0, -1.0));
                    fired.push(FiredShot::new(center, dir, &tuning.sentry.shot));
                }
            }

            BehaviorState::Boss {
                phase,
                phase_started_ms,
                shots_fired,
            } => {
                let boss = &tuning.boss;
                match *phase {
                    BossPhase::Entering => {
                        let dock_x = tuning.arena.width - boss.dock_margin - boss.width;
                        entity.body.pos.x -= boss.entry_speed * dt;
                        if entity.body.pos.x <= dock_x {
                            entity.body.pos.x = dock_x;
                            *phase = BossPhase::Burst;
                            *phase_started_ms = now;
                            *shots_fired = 0;
                            events.push(GameEvent::BossArrived);
                        }
                    }
                    BossPhase::Burst => {
                        let window = clamp_duration(boss.burst_window_ms);
                        let elapsed = now - *phase_started_ms;
                        // Shots are spread evenly across the burst window
                        let due =
                            window * (*shots_fired as u64 + 1) / (boss.burst_shots as u64 + 1);
                        if *shots_fired < boss.burst_shots && elapsed >= due {
                            let spread =
                                (*shots_fired as f32 - (boss.burst_shots as f32 - 1.0) / 2.0)
                                    * 15.0;
                            let muzzle =
                                Vec2::new(entity.body.pos.x, entity.body.center().y + spread);
                            fired.push(FiredShot::new(
                                muzzle,
                                Vec2::new(-1.0, 0.0),
                                &boss.burst_shot,
                            ));
                            *shots_fired += 1;
                        }
                        if elapsed >= window {
                            *phase = BossPhase::ChargePause;
                            *phase_started_ms = now;
                            *shots_fired = 0;
                        }
                    }
                    BossPhase::ChargePause => {
                        if now - *phase_started_ms >= clamp_duration(boss.charge_pause_ms) {
                            *phase = BossPhase::Charging;
                            *phase_started_ms = now;
                        }
                    }
                    BossPhase::Charging => {
                        // Telegraphed heavy shot, then back to the burst phase
                        if now - *phase_started_ms >= clamp_duration(boss.charge_ms) {
                            let muzzle =
                                Vec2::new(entity.body.pos.x, entity.body.center().y);
                            fired.push(FiredShot::new(
                                muzzle,
                                Vec2::new(-1.0, 0.0),
                                &boss.heavy_shot,
                            ));
                            *phase = BossPhase::Burst;
                            *phase_started_ms = now;
                        }
                    }
                }
            }
        }
    }

    for shot in fired {
        events.push(GameEvent::ShotFired(Faction::Hostile));
        reg.spawn(shot.body, shot.vel, EntityKind::Shot(shot.shot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::clock::Timer;
    use crate::sim::entity::{Archetype, Enemy};

    fn spawn_spike(reg: &mut Registry, tuning: &Tuning, pos: Vec2) {
        let spike = &tuning.spike;
        reg.spawn(
            Aabb::new(pos, Vec2::new(spike.body.width, spike.body.height)),
            Vec2::ZERO,
            EntityKind::Enemy(Enemy {
                archetype: Archetype::Spike,
                health: spike.body.hp,
                max_health: spike.body.hp,
                touch_damage: spike.body.touch_damage,
                speed: spike.body.speed,
                kamikaze: spike.body.kamikaze,
                state: BehaviorState::Dash {
                    phase: DashPhase::Seeking,
                    cooldown: Timer::new(0, spike.dash.cooldown_ms),
                },
            }),
        );
    }

    fn dash_phase(reg: &Registry) -> DashPhase {
        let entity = reg.members(Group::Enemies).next().expect("spike");
        match entity.as_enemy().expect("enemy").state {
            BehaviorState::Dash { phase, .. } => phase,
            _ => panic!("not a dash enemy"),
        }
    }

    #[test]
    fn test_dash_sequence_timing() {
        // Cooldown 4000ms, pause 300ms, dash 250ms, driven at 1ms per frame
        // over an 8000ms window: one pause-then-dash pair completes and the
        // spike spends exactly 550ms outside its seeking state.
        let tuning = Tuning::default();
        let mut reg = Registry::new();
        let mut events = Vec::new();
        spawn_spike(&mut reg, &tuning, Vec2::new(100.0, 100.0));
        let player = Vec2::new(640.0, 360.0);

        let mut non_seeking_ms = 0u64;
        let mut dashes_completed = 0u32;
        let mut was_dashing = false;
        for now in 1..=8000u64 {
            update(&mut reg, now, 0.001, player, &tuning, &mut events);
            let phase = dash_phase(&reg);
            let dashing = matches!(phase, DashPhase::Dashing { .. });
            if !matches!(phase, DashPhase::Seeking) {
                non_seeking_ms += 1;
            }
            if was_dashing && !dashing {
                dashes_completed += 1;
            }
            was_dashing = dashing;
        }

        assert_eq!(non_seeking_ms, 550);
        assert_eq!(dashes_completed, 1);
        assert!(matches!(dash_phase(&reg), DashPhase::Seeking));
    }

    #[test]
    fn test_dash_target_is_captured_at_pause_end() {
        let tuning = Tuning::default();
        let mut reg = Registry::new();
        let mut events = Vec::new();
        spawn_spike(&mut reg, &tuning, Vec2::new(100.0, 100.0));

        // Run to the pause with the player in one place...
        let mut now = 0;
        while !matches!(dash_phase(&reg), DashPhase::Pausing { .. }) {
            now += 1;
            update(
                &mut reg,
                now,
                0.001,
                Vec2::new(200.0, 200.0),
                &tuning,
                &mut events,
            );
            assert!(now < 5000, "never paused");
        }

        // ...then move the player before the pause ends. The dash must aim at
        // the position seen when the pause expires, and keep it afterwards.
        let late_pos = Vec2::new(900.0, 500.0);
        while !matches!(dash_phase(&reg), DashPhase::Dashing { .. }) {
            now += 1;
            update(&mut reg, now, 0.001, late_pos, &tuning, &mut events);
        }
        let DashPhase::Dashing { target, .. } = dash_phase(&reg) else {
            unreachable!()
        };
        assert_eq!(target, late_pos);

        now += 1;
        update(
            &mut reg,
            now,
            0.001,
            Vec2::new(10.0, 10.0),
            &tuning,
            &mut events,
        );
        let DashPhase::Dashing { target, .. } = dash_phase(&reg) else {
            panic!("dash ended too soon")
        };
        assert_eq!(target, late_pos, "dash must not re-aim");
    }

    #[test]
    fn test_sentry_fires_on_cooldown_toward_player() {
        let tuning = Tuning::default();
        let mut reg = Registry::new();
        let mut events = Vec::new();
        let sentry = &tuning.sentry;
        reg.spawn(
            Aabb::new(
                Vec2::new(600.0, 300.0),
                Vec2::new(sentry.body.width, sentry.body.height),
            ),
            Vec2::ZERO,
            EntityKind::Enemy(Enemy {
                archetype: Archetype::Sentry,
                health: sentry.body.hp,
                max_health: sentry.body.hp,
                touch_damage: sentry.body.touch_damage,
                speed: sentry.body.speed,
                kamikaze: sentry.body.kamikaze,
                state: BehaviorState::Sentry {
                    fire: Timer::new(0, sentry.fire_interval_ms),
                },
            }),
        );

        let player = Vec2::new(100.0, 300.0);
        update(&mut reg, sentry.fire_interval_ms, 0.016, player, &tuning, &mut events);
        assert_eq!(reg.count(Group::EnemyShots), 0, "cooldown not yet elapsed");

        update(
            &mut reg,
            sentry.fire_interval_ms + 1,
            0.016,
            player,
            &tuning,
            &mut events,
        );
        assert_eq!(reg.count(Group::EnemyShots), 1);
        let shot = reg.members(Group::EnemyShots).next().expect("shot");
        assert!(shot.vel.x < 0.0, "aimed toward the player on the left");
        assert!(shot.vel.y.abs() < 1e-3);

        // Sentries hold position
        let body = reg.members(Group::Enemies).next().expect("sentry").body;
        assert_eq!(body.pos, Vec2::new(600.0, 300.0));
    }

    #[test]
    fn test_boss_cycle_shot_pattern() {
        // Burst 2000ms / pause 3000ms / charge 1000ms: one full cycle fires
        // exactly three burst shots and one heavy shot.
        let tuning = Tuning::default();
        let mut reg = Registry::new();
        let mut events = Vec::new();
        let boss = &tuning.boss;
        reg.spawn(
            Aabb::new(
                Vec2::new(
                    tuning.arena.width - boss.dock_margin - boss.width,
                    (tuning.arena.height - boss.height) / 2.0,
                ),
                Vec2::new(boss.width, boss.height),
            ),
            Vec2::ZERO,
            EntityKind::Enemy(Enemy {
                archetype: Archetype::Warden,
                health: boss.hp,
                max_health: boss.hp,
                touch_damage: boss.touch_damage,
                speed: 0.0,
                kamikaze: false,
                state: BehaviorState::Boss {
                    phase: BossPhase::Burst,
                    phase_started_ms: 0,
                    shots_fired: 0,
                },
            }),
        );

        let player = Vec2::new(100.0, 360.0);
        for now in 1..=6000u64 {
            update(&mut reg, now, 0.001, player, &tuning, &mut events);
        }

        let shots: Vec<_> = reg.members(Group::EnemyShots).collect();
        assert_eq!(shots.len(), 4);
        let heavies = shots
            .iter()
            .filter(|s| s.body.size.x >= boss.heavy_shot.width)
            .count();
        assert_eq!(heavies, 1);

        // The cycle loops: phase is back in Burst
        let entity = reg.members(Group::Enemies).next().expect("boss");
        assert!(matches!(
            entity.as_enemy().expect("enemy").state,
            BehaviorState::Boss {
                phase: BossPhase::Burst,
                ..
            }
        ));
    }

    #[test]
    fn test_boss_docks_then_announces() {
        let tuning = Tuning::default();
        let mut reg = Registry::new();
        let mut events = Vec::new();
        let boss = &tuning.boss;
        reg.spawn(
            Aabb::new(
                Vec2::new(tuning.arena.width, 285.0),
                Vec2::new(boss.width, boss.height),
            ),
            Vec2::ZERO,
            EntityKind::Enemy(Enemy {
                archetype: Archetype::Warden,
                health: boss.hp,
                max_health: boss.hp,
                touch_damage: boss.touch_damage,
                speed: 0.0,
                kamikaze: false,
                state: BehaviorState::Boss {
                    phase: BossPhase::Entering,
                    phase_started_ms: 0,
                    shots_fired: 0,
                },
            }),
        );

        let player = Vec2::new(100.0, 360.0);
        let mut now = 0;
        // Entering is damage-immune
        let entity = reg.members(Group::Enemies).next().expect("boss");
        assert!(!entity.as_enemy().expect("enemy").damageable());

        while !events.contains(&GameEvent::BossArrived) {
            now += 16;
            update(&mut reg, now, 0.016, player, &tuning, &mut events);
            assert!(now < 60_000, "boss never docked");
        }
        let entity = reg.members(Group::Enemies).next().expect("boss");
        assert!(entity.as_enemy().expect("enemy").damageable());
        let dock_x = tuning.arena.width - boss.dock_margin - boss.width;
        assert!((entity.body.pos.x - dock_x).abs() < 1e-3);
    }
}
