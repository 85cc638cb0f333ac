//! Homing and orbital steering
//!
//! Wisps pursue the nearest live enemy with a velocity blend that caps their
//! turn rate, so they curve instead of snapping onto targets. Feather
//! satellites are not simulated at all: their positions are recomputed every
//! frame from the player's shared orbit angle.

use glam::Vec2;
use std::f32::consts::TAU;

use crate::consts::WISP_OFFSCREEN_MARGIN;
use crate::sim::entity::{Aabb, EntityId, EntityKind, Feather, Group};
use crate::sim::registry::Registry;
use crate::tuning::Tuning;
use crate::{dist_sq, unit_toward};

/// Advance all homing wisps by one frame
pub fn update_wisps(reg: &mut Registry, now: u64, dt: f32, tuning: &Tuning) {
    // Snapshot of live enemy centers; wisp updates never mutate enemies
    let enemies: Vec<(EntityId, Vec2)> = reg
        .members(Group::Enemies)
        .map(|e| (e.id, e.body.center()))
        .collect();

    let mut expired: Vec<EntityId> = Vec::new();

    for id in reg.member_ids(Group::Wisps) {
        let Some(entity) = reg.get_mut(id) else {
            continue;
        };
        let center = entity.body.center();
        let EntityKind::Wisp(wisp) = &mut entity.kind else {
            continue;
        };

        // Drop a stale target, then rebind to the nearest live enemy
        if let Some(target) = wisp.target {
            if !enemies.iter().any(|(eid, _)| *eid == target) {
                wisp.target = None;
            }
        }
        if wisp.target.is_none() {
            wisp.target = enemies
                .iter()
                .min_by(|(_, a), (_, b)| {
                    dist_sq(*a, center)
                        .partial_cmp(&dist_sq(*b, center))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(eid, _)| *eid);
        }

        match wisp.target {
            Some(target) => {
                wisp.target_lost_ms = 0;
                let target_center = enemies
                    .iter()
                    .find(|(eid, _)| *eid == target)
                    .map(|(_, c)| *c)
                    .unwrap_or(center);
                let desired = unit_toward(center, target_center, Vec2::X) * wisp.speed;
                // Blend then renormalize: constant speed, bounded turn rate
                let blended = entity.vel.lerp(desired, wisp.turn_rate);
                entity.vel = if blended.length_squared() > f32::EPSILON {
                    blended.normalize() * wisp.speed
                } else {
                    desired
                };
            }
            None => {
                // Inertial flight with a bounded lifetime
                if wisp.target_lost_ms == 0 {
                    wisp.target_lost_ms = now.max(1);
                } else if now.saturating_sub(wisp.target_lost_ms)
                    > tuning.player.wisp.no_target_lifetime_ms
                {
                    expired.push(id);
                    continue;
                }
            }
        }

        entity.body.pos += entity.vel * dt;
        if entity.body.outside(
            tuning.arena.width,
            tuning.arena.height,
            WISP_OFFSCREEN_MARGIN,
        ) {
            expired.push(id);
        }
    }

    for id in expired {
        reg.remove(id);
    }
}

/// Recompute every feather's position from the shared orbit angle
pub fn update_feathers(reg: &mut Registry, player_center: Vec2, orbit_angle: f32, radius: f32) {
    for entity in reg.iter_mut() {
        if let EntityKind::Feather(feather) = &entity.kind {
            let theta = orbit_angle + feather.angle_offset;
            let center = player_center + radius * Vec2::new(theta.cos(), theta.sin());
            entity.body.set_center(center);
        }
    }
}

/// Tear down and respawn all satellites, evenly spaced
///
/// Called whenever an upgrade changes the count, radius or damage; offsets
/// are `2π / count` apart so the ring stays balanced. `radius` comes from
/// the player's stats, which upgrades may have grown past the tuned base.
pub fn rebuild_feathers(
    reg: &mut Registry,
    count: u32,
    player_center: Vec2,
    orbit_angle: f32,
    radius: f32,
    tuning: &Tuning,
) {
    reg.remove_where(|e| matches!(e.kind, EntityKind::Feather(_)));
    if count == 0 {
        return;
    }
    let feather = &tuning.player.feather;
    let step = TAU / count as f32;
    for i in 0..count {
        let offset = i as f32 * step;
        let theta = orbit_angle + offset;
        let center = player_center + radius * Vec2::new(theta.cos(), theta.sin());
        reg.spawn(
            Aabb::from_center(center, Vec2::new(feather.width, feather.height)),
            Vec2::ZERO,
            EntityKind::Feather(Feather {
                angle_offset: offset,
            }),
        );
    }
}
