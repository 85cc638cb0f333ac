//! Many-to-many collision resolution
//!
//! One routine processes a declarative table of (actor group, opponent,
//! effect) rules in a fixed order: player offense before player defense, so
//! an enemy killed this frame can never also deal contact damage this frame.
//! The order alone is not trusted - every application re-checks liveness
//! against the registry, and a consumed projectile never reaches a second
//! target.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::dist_sq;
use crate::sim::entity::{
    Aabb, Archetype, Entity, EntityId, EntityKind, Group, Pickup, PickupKind,
};
use crate::sim::events::GameEvent;
use crate::sim::player::{Player, PlayerStats};
use crate::sim::registry::Registry;
use crate::tuning::Tuning;

/// What an actor group is tested against
#[derive(Debug, Clone, Copy)]
pub enum Opponent {
    Group(Group),
    Player,
}

/// What an intersection does
#[derive(Debug, Clone, Copy)]
pub enum EffectKind {
    /// Damage the target; optionally consume the actor on contact
    Damage { consume_actor: bool },
    /// Body contact damage to the player; kamikaze actors also die
    Contact,
    /// Radius-based pickup collection
    Collect,
    /// Both projectiles destroy each other
    CancelBoth,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub actors: Group,
    pub against: Opponent,
    pub effect: EffectKind,
}

/// The interaction table. Adding a projectile type is one new entry here,
/// not new control flow.
pub const RULES: [Rule; 7] = [
    Rule {
        actors: Group::PlayerShots,
        against: Opponent::Group(Group::Enemies),
        effect: EffectKind::Damage {
            consume_actor: true,
        },
    },
    Rule {
        actors: Group::Wisps,
        against: Opponent::Group(Group::Enemies),
        effect: EffectKind::Damage {
            consume_actor: true,
        },
    },
    Rule {
        actors: Group::Feathers,
        against: Opponent::Group(Group::Enemies),
        effect: EffectKind::Damage {
            consume_actor: false,
        },
    },
    Rule {
        actors: Group::Enemies,
        against: Opponent::Player,
        effect: EffectKind::Contact,
    },
    Rule {
        actors: Group::EnemyShots,
        against: Opponent::Player,
        effect: EffectKind::Damage {
            consume_actor: true,
        },
    },
    Rule {
        actors: Group::Pickups,
        against: Opponent::Player,
        effect: EffectKind::Collect,
    },
    Rule {
        actors: Group::PlayerShots,
        against: Opponent::Group(Group::EnemyShots),
        effect: EffectKind::CancelBoth,
    },
];

/// Run every interaction pass for this frame. Returns experience gained
/// from collected gems.
pub fn resolve(
    reg: &mut Registry,
    player: &mut Player,
    now: u64,
    rng: &mut Pcg32,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) -> u32 {
    let mut xp = 0;

    for rule in RULES {
        match rule.against {
            Opponent::Group(target_group) => {
                let actor_ids = reg.member_ids(rule.actors);
                let target_ids = reg.member_ids(target_group);
                for actor_id in actor_ids {
                    for &target_id in &target_ids {
                        let (Some(actor), Some(target)) =
                            (reg.get(actor_id), reg.get(target_id))
                        else {
                            continue;
                        };
                        if !actor.body.intersects(&target.body) {
                            continue;
                        }
                        match rule.effect {
                            EffectKind::Damage { consume_actor } => {
                                let damage = actor_damage(actor, &player.stats);
                                damage_enemy(reg, target_id, damage, now, rng, tuning, events);
                                if consume_actor {
                                    reg.remove(actor_id);
                                    break;
                                }
                            }
                            EffectKind::CancelBoth => {
                                reg.remove(actor_id);
                                reg.remove(target_id);
                                break;
                            }
                            EffectKind::Contact | EffectKind::Collect => {}
                        }
                    }
                }
            }

            Opponent::Player => {
                for actor_id in reg.member_ids(rule.actors) {
                    let Some(actor) = reg.get(actor_id) else {
                        continue;
                    };
                    match rule.effect {
                        EffectKind::Contact => {
                            if !actor.body.intersects(&player.body) {
                                continue;
                            }
                            let Some(enemy) = actor.as_enemy() else {
                                continue;
                            };
                            let (touch, kamikaze) = (enemy.touch_damage, enemy.kamikaze);
                            player.take_hit(touch, now, tuning, events);
                            if kamikaze {
                                // Body damage is independent of enemy survival
                                damage_enemy(
                                    reg,
                                    actor_id,
                                    i32::MAX,
                                    now,
                                    rng,
                                    tuning,
                                    events,
                                );
                            }
                        }
                        EffectKind::Damage { consume_actor } => {
                            if !actor.body.intersects(&player.body) {
                                continue;
                            }
                            let damage = actor_damage(actor, &player.stats);
                            player.take_hit(damage, now, tuning, events);
                            if consume_actor {
                                reg.remove(actor_id);
                            }
                        }
                        EffectKind::Collect => {
                            let radius = player.stats.pickup_radius;
                            if dist_sq(actor.body.center(), player.center()) >= radius * radius {
                                continue;
                            }
                            let EntityKind::Pickup(pickup) = actor.kind else {
                                continue;
                            };
                            player.apply_pickup(pickup.kind, now, tuning);
                            if let PickupKind::Gem { value } = pickup.kind {
                                xp += value;
                            }
                            events.push(GameEvent::PickupCollected(pickup.kind));
                            reg.remove(actor_id);
                        }
                        EffectKind::CancelBoth => {}
                    }
                }
            }
        }
    }

    xp
}

/// Damage an offensive actor deals on contact
fn actor_damage(actor: &Entity, stats: &PlayerStats) -> i32 {
    match &actor.kind {
        EntityKind::Shot(shot) => shot.damage,
        EntityKind::Wisp(wisp) => wisp.damage,
        // Feather damage lives on the player so upgrades apply instantly
        EntityKind::Feather(_) => stats.feather_damage,
        _ => 0,
    }
}

/// Apply damage to an enemy, removing it and emitting drops on death
///
/// Health is clamped at zero and the enemy leaves the registry within the
/// same pass, so it can never be damaged again this frame. Hits on a
/// not-yet-damageable boss are silently ignored (the projectile is still
/// consumed by the caller).
fn damage_enemy(
    reg: &mut Registry,
    target_id: EntityId,
    damage: i32,
    now: u64,
    rng: &mut Pcg32,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) {
    let Some(target) = reg.get_mut(target_id) else {
        return;
    };
    let pos = target.body.center();
    let Some(enemy) = target.as_enemy_mut() else {
        return;
    };
    if !enemy.damageable() {
        return;
    }
    let damage = if damage < 0 {
        log::warn!("negative damage {damage} clamped to 0");
        0
    } else {
        damage
    };
    enemy.health = enemy.health.saturating_sub(damage).max(0);
    let archetype = enemy.archetype;
    events.push(GameEvent::EnemyHit { archetype });

    if enemy.health == 0 {
        reg.remove(target_id);
        events.push(GameEvent::EnemyDied { archetype, pos });
        if archetype == Archetype::Warden {
            events.push(GameEvent::BossDefeated);
            return;
        }
        spawn_drops(reg, pos, now, rng, tuning);
    }
}

/// Emit an XP gem (and occasionally a rapid-fire pickup) at a death position
fn spawn_drops(reg: &mut Registry, pos: Vec2, now: u64, rng: &mut Pcg32, tuning: &Tuning) {
    let pickups = &tuning.pickups;
    reg.spawn(
        Aabb::from_center(pos, Vec2::splat(pickups.gem_size)),
        Vec2::ZERO,
        EntityKind::Pickup(Pickup {
            kind: PickupKind::Gem {
                value: pickups.gem_value,
            },
            expires_at_ms: now + pickups.lifetime_ms,
        }),
    );
    if rng.random::<f32>() < pickups.rapid_drop_chance {
        reg.spawn(
            Aabb::from_center(pos + Vec2::new(16.0, 0.0), Vec2::splat(pickups.rapid_size)),
            Vec2::ZERO,
            EntityKind::Pickup(Pickup {
                kind: PickupKind::RapidFire,
                expires_at_ms: now + pickups.lifetime_ms,
            }),
        );
    }
}
