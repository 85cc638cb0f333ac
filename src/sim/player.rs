//! Player physics, stats and weapon firing
//!
//! Flap-driven movement under gravity, clamped to the arena. Weapons run off
//! timers: the peck autofires, wisps volley once unlocked, and the feather
//! ring advances a shared orbit angle. Progression mutates [`PlayerStats`];
//! nothing else in the simulation may reach into it.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::sim::clock::Timer;
use crate::sim::entity::{Aabb, EntityKind, Faction, PickupKind, Shot, Wisp};
use crate::sim::events::GameEvent;
use crate::sim::registry::Registry;
use crate::tuning::Tuning;

/// Every stat the progression system may mutate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStats {
    pub max_hp: i32,
    pub peck_damage: i32,
    pub peck_count: u32,
    pub gravity_factor: f32,
    pub pickup_radius: f32,
    pub feathers_unlocked: bool,
    pub feather_count: u32,
    pub feather_damage: i32,
    pub feather_radius: f32,
    pub wisps_unlocked: bool,
    pub wisp_damage: i32,
    pub wisp_speed: f32,
    pub wisp_count: u32,
    pub has_shield: bool,
}

impl PlayerStats {
    pub fn new(tuning: &Tuning) -> Self {
        let p = &tuning.player;
        Self {
            max_hp: p.max_hp,
            peck_damage: p.peck.damage,
            peck_count: 1,
            gravity_factor: 1.0,
            pickup_radius: p.pickup_radius,
            feathers_unlocked: false,
            feather_count: 0,
            feather_damage: p.feather.damage,
            feather_radius: p.feather.radius,
            wisps_unlocked: false,
            wisp_damage: p.wisp.damage,
            wisp_speed: p.wisp.speed,
            wisp_count: 1,
            has_shield: false,
        }
    }
}

#[derive(Debug)]
pub struct Player {
    pub body: Aabb,
    pub vel: Vec2,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub hp: i32,
    pub stats: PlayerStats,
    pub orbit_angle: f32,
    peck: Timer,
    wisp: Timer,
    /// One charge; consumed by the next hit, then recharges
    shield_ready: bool,
    shield_recharge: Timer,
    /// Rapid-fire buff deadline, when active
    rapid_until_ms: Option<u64>,
    /// Hits are ignored until this time passes
    invuln_until_ms: u64,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        let p = &tuning.player;
        let stats = PlayerStats::new(tuning);
        Self {
            body: Aabb::from_center(
                Vec2::new(tuning.arena.width / 2.0, tuning.arena.height - 100.0),
                Vec2::new(p.width, p.height),
            ),
            vel: Vec2::ZERO,
            facing: 1.0,
            hp: stats.max_hp,
            stats,
            orbit_angle: 0.0,
            peck: Timer::new(0, p.peck.interval_ms),
            wisp: Timer::new(0, p.wisp.interval_ms),
            shield_ready: false,
            shield_recharge: Timer::new(0, p.shield_recharge_ms),
            rapid_until_ms: None,
            invuln_until_ms: 0,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.body.center()
    }

    pub fn alive(&self) -> bool {
        self.hp > 0
    }

    pub fn shield_ready(&self) -> bool {
        self.shield_ready
    }

    pub fn rapid_active(&self, now: u64) -> bool {
        self.rapid_until_ms.is_some_and(|until| now < until)
    }

    /// Flap: upward impulse plus a horizontal kick toward facing
    pub fn flap(&mut self, tuning: &Tuning) {
        self.vel.y = tuning.player.flap_impulse;
        self.vel.x = tuning.player.flap_kick * self.facing;
    }

    pub fn turn_left(&mut self) {
        self.facing = -1.0;
    }

    pub fn turn_right(&mut self) {
        self.facing = 1.0;
    }

    /// Advance physics, weapon timers and the shield for one frame
    pub fn update(
        &mut self,
        reg: &mut Registry,
        now: u64,
        dt: f32,
        shoot_intent: bool,
        rng: &mut Pcg32,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) {
        let p = &tuning.player;

        // Buff expiry restores the original cadence
        if self.rapid_until_ms.is_some_and(|until| now >= until) {
            self.rapid_until_ms = None;
        }
        let peck_interval = if self.rapid_active(now) {
            (p.peck.interval_ms / 2).max(1)
        } else {
            p.peck.interval_ms
        };
        self.peck.set_interval(peck_interval);

        if (p.peck.autofire || shoot_intent) && self.peck.fire(now) {
            self.fire_pecks(reg, tuning, events);
        }
        if self.stats.wisps_unlocked && self.wisp.fire(now) {
            self.fire_wisps(reg, rng, tuning, events);
        }
        if self.stats.feathers_unlocked {
            self.orbit_angle =
                (self.orbit_angle + p.feather.angular_speed * dt).rem_euclid(std::f32::consts::TAU);
        }

        // Flappy physics: gravity, damped horizontal drift
        self.vel.y += p.gravity * self.stats.gravity_factor * dt;
        self.body.pos += self.vel * dt;
        self.vel.x *= p.horizontal_damping.powf(dt * 60.0);
        if self.vel.x.abs() < 30.0 {
            self.vel.x = 0.0;
        }

        // Arena clamp kills the velocity component into the wall
        let (w, h) = (tuning.arena.width, tuning.arena.height);
        if self.body.pos.y < 0.0 {
            self.body.pos.y = 0.0;
            self.vel.y = 0.0;
        }
        if self.body.pos.y + self.body.size.y > h {
            self.body.pos.y = h - self.body.size.y;
            self.vel.y = 0.0;
        }
        if self.body.pos.x < 0.0 {
            self.body.pos.x = 0.0;
            self.vel.x = 0.0;
        }
        if self.body.pos.x + self.body.size.x > w {
            self.body.pos.x = w - self.body.size.x;
            self.vel.x = 0.0;
        }

        if self.stats.has_shield && !self.shield_ready && self.shield_recharge.ready(now) {
            self.shield_ready = true;
        }
    }

    fn fire_pecks(&mut self, reg: &mut Registry, tuning: &Tuning, events: &mut Vec<GameEvent>) {
        let p = &tuning.player;
        let muzzle = Vec2::new(
            self.center().x
                + self.facing * (self.body.size.x / 2.0 + p.peck.width / 2.0 + p.peck.muzzle_gap),
            self.center().y,
        );
        for _ in 0..self.stats.peck_count {
            reg.spawn(
                Aabb::from_center(muzzle, Vec2::new(p.peck.width, p.peck.height)),
                Vec2::new(self.facing * p.peck.speed, 0.0),
                EntityKind::Shot(Shot {
                    faction: Faction::Ally,
                    damage: self.stats.peck_damage,
                }),
            );
        }
        events.push(GameEvent::ShotFired(Faction::Ally));
    }

    fn fire_wisps(
        &mut self,
        reg: &mut Registry,
        rng: &mut Pcg32,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) {
        let w = &tuning.player.wisp;
        for _ in 0..self.stats.wisp_count {
            // Launch roughly toward facing with a random vertical wobble
            let mut vel = Vec2::new(
                self.facing * self.stats.wisp_speed * 0.5,
                rng.random_range(-0.5..0.5) * self.stats.wisp_speed * 0.5,
            );
            if vel.length_squared() < f32::EPSILON {
                vel.x = self.facing * 0.1;
            }
            let vel = vel.normalize() * self.stats.wisp_speed;
            reg.spawn(
                Aabb::from_center(self.center(), Vec2::splat(w.size)),
                vel,
                EntityKind::Wisp(Wisp {
                    damage: self.stats.wisp_damage,
                    speed: self.stats.wisp_speed,
                    turn_rate: w.turn_rate,
                    target: None,
                    target_lost_ms: 0,
                }),
            );
        }
        events.push(GameEvent::ShotFired(Faction::Ally));
    }

    /// Apply incoming damage; the shield absorbs one hit, then brief
    /// invulnerability prevents same-overlap re-hits. Returns true when
    /// damage actually landed.
    pub fn take_hit(
        &mut self,
        amount: i32,
        now: u64,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if now < self.invuln_until_ms {
            return false;
        }
        let amount = if amount < 0 {
            log::warn!("negative damage {amount} clamped to 0");
            0
        } else {
            amount
        };
        if self.shield_ready {
            self.shield_ready = false;
            self.shield_recharge.arm(now);
            events.push(GameEvent::ShieldBlocked);
            return false;
        }
        self.hp = (self.hp - amount).max(0);
        self.invuln_until_ms = now + tuning.player.invuln_ms;
        events.push(GameEvent::PlayerHit { damage: amount });
        true
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount).min(self.stats.max_hp);
    }

    /// Grant the shield ability with a ready charge
    pub fn grant_shield(&mut self, now: u64) {
        self.stats.has_shield = true;
        self.shield_ready = true;
        self.shield_recharge.arm(now);
    }

    /// Apply a collected pickup's immediate effect (XP is granted by the
    /// progression step from the collection event)
    pub fn apply_pickup(&mut self, kind: PickupKind, now: u64, tuning: &Tuning) {
        match kind {
            PickupKind::Gem { .. } => {}
            PickupKind::RapidFire => {
                self.rapid_until_ms = Some(now + tuning.pickups.rapid_duration_ms);
            }
        }
    }
}
