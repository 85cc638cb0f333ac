//! Per-frame orchestration
//!
//! `World::frame` is the single entry point the host calls. Within one
//! playing frame the order is fixed and observable: spawn director, player,
//! enemy behaviors, steering, projectile motion, collision, progression,
//! terminal transitions. The clock advances only in the playing state, so
//! menus, pauses and upgrade choices freeze every timer at once.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::SHOT_OFFSCREEN_MARGIN;
use crate::sim::behavior;
use crate::sim::clock::Clock;
use crate::sim::collision;
use crate::sim::entity::EntityKind;
use crate::sim::events::GameEvent;
use crate::sim::player::Player;
use crate::sim::progression::{
    CATALOG, Progression, UpgradeEffect, UpgradeId, apply_effect, find_def, validate_catalog,
};
use crate::sim::registry::Registry;
use crate::sim::session::{Mode, Session};
use crate::sim::spawn::{self, SpawnDirector};
use crate::sim::steering;
use crate::tuning::{Tuning, TuningError};

/// Discrete intents for one frame, already decoded from raw input
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Leave the menu and begin a run
    pub start: bool,
    pub flap: bool,
    pub shoot: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub pause: bool,
    /// Index into the offered upgrade candidates
    pub select_upgrade: Option<usize>,
}

/// The complete simulation
pub struct World {
    pub tuning: Tuning,
    pub clock: Clock,
    pub session: Session,
    pub player: Player,
    pub registry: Registry,
    pub director: SpawnDirector,
    pub progression: Progression,
    choices: Vec<UpgradeId>,
    pending_choices: u32,
    rng: Pcg32,
    events: Vec<GameEvent>,
}

impl World {
    /// Validate configuration and build a fresh world
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        validate_catalog(CATALOG)?;
        let player = Player::new(&tuning);
        let progression = Progression::new(tuning.session.xp_threshold);
        let director = SpawnDirector::new(0, &tuning);
        Ok(Self {
            tuning,
            clock: Clock::new(),
            session: Session::new(),
            player,
            registry: Registry::new(),
            director,
            progression,
            choices: Vec::new(),
            pending_choices: 0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        })
    }

    /// Candidates currently offered to the upgrade UI
    pub fn choices(&self) -> &[UpgradeId] {
        &self.choices
    }

    /// Hand the accumulated events to the host (audio, UI)
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the session by one frame of `dt_ms` wall time
    pub fn frame(&mut self, input: &FrameInput, dt_ms: u64) {
        match self.session.mode {
            Mode::Menu => {
                if input.start {
                    self.begin_intro(0);
                }
            }
            Mode::Intro { remaining_ms } => {
                let remaining = remaining_ms.saturating_sub(dt_ms);
                if remaining == 0 {
                    self.begin_playing();
                } else {
                    self.session.mode = Mode::Intro {
                        remaining_ms: remaining,
                    };
                }
            }
            Mode::Paused => {
                if input.pause {
                    self.session.mode = Mode::Playing;
                }
            }
            Mode::Choosing => {
                if let Some(index) = input.select_upgrade {
                    self.select_upgrade(index);
                }
            }
            Mode::Cleared { remaining_ms } => {
                let remaining = remaining_ms.saturating_sub(dt_ms);
                if remaining > 0 {
                    self.session.mode = Mode::Cleared {
                        remaining_ms: remaining,
                    };
                } else if self.session.is_last_level(&self.tuning) {
                    log::info!("all levels complete");
                    self.session.mode = Mode::Won;
                    self.events.push(GameEvent::GameWon);
                } else {
                    self.begin_intro(self.session.level + 1);
                }
            }
            Mode::Won | Mode::Lost => {}
            Mode::Playing => self.play_frame(input, dt_ms),
        }
    }

    fn begin_intro(&mut self, level: u32) {
        log::info!("level {} intro", level + 1);
        self.clear_combat_entities();
        self.session.level = level;
        self.session.boss_spawned = false;
        self.session.mode = Mode::Intro {
            remaining_ms: self.tuning.session.intro_ms,
        };
    }

    fn begin_playing(&mut self) {
        let now = self.clock.now();
        self.session.level_started_ms = now;
        self.session.mode = Mode::Playing;
        self.director = SpawnDirector::new(now, &self.tuning);
    }

    fn play_frame(&mut self, input: &FrameInput, dt_ms: u64) {
        if input.pause {
            self.session.mode = Mode::Paused;
            return;
        }

        self.clock.advance(dt_ms);
        let now = self.clock.now();
        let dt = self.clock.frame_dt();
        let frame_events_start = self.events.len();

        // The enemy phase ends and the boss enters when the level timer runs out
        let duration = self.session.level_duration_ms(&self.tuning);
        if !self.session.boss_spawned
            && now.saturating_sub(self.session.level_started_ms) >= duration
        {
            self.director.halt();
            spawn::spawn_boss(&mut self.registry, &self.tuning);
            self.session.boss_spawned = true;
        }

        self.director
            .update(&mut self.registry, now, &mut self.rng, &self.tuning);

        if input.turn_left {
            self.player.turn_left();
        }
        if input.turn_right {
            self.player.turn_right();
        }
        if input.flap {
            self.player.flap(&self.tuning);
        }
        self.player.update(
            &mut self.registry,
            now,
            dt,
            input.shoot,
            &mut self.rng,
            &self.tuning,
            &mut self.events,
        );

        let player_center = self.player.center();
        behavior::update(
            &mut self.registry,
            now,
            dt,
            player_center,
            &self.tuning,
            &mut self.events,
        );
        steering::update_wisps(&mut self.registry, now, dt, &self.tuning);
        steering::update_feathers(
            &mut self.registry,
            player_center,
            self.player.orbit_angle,
            self.player.stats.feather_radius,
        );
        self.update_projectiles(now, dt);

        let xp = collision::resolve(
            &mut self.registry,
            &mut self.player,
            now,
            &mut self.rng,
            &self.tuning,
            &mut self.events,
        );

        let levels = self.progression.grant_xp(xp);
        for gained in 1..=levels {
            self.events.push(GameEvent::LeveledUp {
                level: self.progression.level - levels + gained,
            });
        }
        self.pending_choices += levels;

        // Terminal transitions; a lethal hit beats everything else
        if !self.player.alive() {
            log::info!("player down");
            self.session.mode = Mode::Lost;
            self.events.push(GameEvent::GameLost);
            return;
        }
        if self.events[frame_events_start..].contains(&GameEvent::BossDefeated) {
            let level = self.session.level;
            log::info!("level {} complete", level + 1);
            self.events.push(GameEvent::LevelComplete { level });
            self.clear_combat_entities();
            self.session.mode = Mode::Cleared {
                remaining_ms: self.tuning.session.banner_ms,
            };
            return;
        }
        if self.pending_choices > 0 {
            self.enter_choosing();
        }
    }

    /// Move straight shots, cull off-screen projectiles, expire pickups
    fn update_projectiles(&mut self, now: u64, dt: f32) {
        for entity in self.registry.iter_mut() {
            if matches!(entity.kind, EntityKind::Shot(_)) {
                entity.body.pos += entity.vel * dt;
            }
        }
        let (w, h) = (self.tuning.arena.width, self.tuning.arena.height);
        self.registry.remove_where(|e| match &e.kind {
            EntityKind::Shot(_) => e.body.outside(w, h, SHOT_OFFSCREEN_MARGIN),
            EntityKind::Pickup(pickup) => {
                now >= pickup.expires_at_ms || e.body.outside(w, h, 0.0)
            }
            _ => false,
        });
    }

    /// Present the next pending upgrade choice, or resume play when the
    /// pool has nothing left to offer
    fn enter_choosing(&mut self) {
        while self.pending_choices > 0 {
            let rolled = self
                .progression
                .roll_choices(CATALOG, &self.player.stats, &mut self.rng);
            if rolled.is_empty() {
                log::info!("upgrade pool exhausted; skipping choice");
                self.pending_choices -= 1;
                continue;
            }
            self.choices = rolled;
            self.events
                .push(GameEvent::ChoicesOffered(self.choices.clone()));
            self.session.mode = Mode::Choosing;
            return;
        }
        self.session.mode = Mode::Playing;
    }

    /// Apply the selected candidate; out-of-range indices are ignored and
    /// the choice stays open
    fn select_upgrade(&mut self, index: usize) {
        let Some(&id) = self.choices.get(index) else {
            return;
        };
        let Some(def) = find_def(CATALOG, id) else {
            return;
        };
        self.progression.record(def);
        apply_effect(&mut self.player.stats, def.effect);

        // Entity-level side effects the pure stat change can't express
        match def.effect {
            UpgradeEffect::MaxHealth(amount) => self.player.heal(amount),
            UpgradeEffect::EnergyShield => self.player.grant_shield(self.clock.now()),
            UpgradeEffect::UnlockFeathers
            | UpgradeEffect::FeatherCount(_)
            | UpgradeEffect::FeatherDamage(_)
            | UpgradeEffect::FeatherRadius(_) => {
                steering::rebuild_feathers(
                    &mut self.registry,
                    self.player.stats.feather_count,
                    self.player.center(),
                    self.player.orbit_angle,
                    self.player.stats.feather_radius,
                    &self.tuning,
                );
            }
            _ => {}
        }

        log::info!("applied upgrade {:?}", id);
        self.events.push(GameEvent::UpgradeApplied(id));
        self.pending_choices = self.pending_choices.saturating_sub(1);
        self.choices.clear();
        self.enter_choosing();
    }

    /// Wipe enemies, projectiles and pickups between levels; the feather
    /// ring is part of the player's build and survives
    fn clear_combat_entities(&mut self) {
        self.registry
            .remove_where(|e| !matches!(e.kind, EntityKind::Feather(_)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT_MS;
    use crate::sim::entity::{Aabb, Faction, Group, Pickup, PickupKind, Shot};
    use glam::Vec2;

    fn world() -> World {
        World::new(Tuning::default(), 7).expect("default world")
    }

    /// Drive from the menu into the playing state
    fn start(world: &mut World) {
        world.frame(
            &FrameInput {
                start: true,
                ..FrameInput::default()
            },
            FRAME_DT_MS,
        );
        while !world.session.updating() {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
    }

    #[test]
    fn test_menu_waits_for_start() {
        let mut world = world();
        for _ in 0..100 {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
        assert_eq!(world.session.mode, Mode::Menu);
        assert_eq!(world.clock.now(), 0, "menu frames never advance the clock");
    }

    #[test]
    fn test_intro_then_play_spawns_waves() {
        let mut world = world();
        start(&mut world);
        assert_eq!(world.clock.now(), 0, "intro froze the clock");

        // Past the first drifter interval something must have spawned
        let interval = world.tuning.spawn.drifter.base_interval_ms;
        let frames = interval / FRAME_DT_MS + 2;
        for _ in 0..frames {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
        assert!(world.registry.count(Group::Enemies) > 0);
    }

    #[test]
    fn test_pause_freezes_clock_and_timers() {
        let mut world = world();
        start(&mut world);
        for _ in 0..10 {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
        let frozen_at = world.clock.now();
        let enemies = world.registry.count(Group::Enemies);

        world.frame(
            &FrameInput {
                pause: true,
                ..FrameInput::default()
            },
            FRAME_DT_MS,
        );
        assert_eq!(world.session.mode, Mode::Paused);
        for _ in 0..1000 {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
        assert_eq!(world.clock.now(), frozen_at);
        assert_eq!(world.registry.count(Group::Enemies), enemies);

        // Resume picks up exactly where it left off
        world.frame(
            &FrameInput {
                pause: true,
                ..FrameInput::default()
            },
            FRAME_DT_MS,
        );
        assert_eq!(world.session.mode, Mode::Playing);
        world.frame(&FrameInput::default(), FRAME_DT_MS);
        assert_eq!(world.clock.now(), frozen_at + FRAME_DT_MS);
    }

    #[test]
    fn test_level_up_blocks_until_selection() {
        let mut world = world();
        start(&mut world);

        // A gem worth a whole threshold forces a level-up on collection
        let threshold = world.progression.threshold();
        world.registry.spawn(
            Aabb::from_center(world.player.center(), Vec2::splat(12.0)),
            Vec2::ZERO,
            EntityKind::Pickup(Pickup {
                kind: PickupKind::Gem { value: threshold },
                expires_at_ms: u64::MAX,
            }),
        );
        world.frame(&FrameInput::default(), FRAME_DT_MS);
        assert_eq!(world.session.mode, Mode::Choosing);
        assert!(!world.choices().is_empty());
        let offered = world.choices().to_vec();
        let clock_at_choice = world.clock.now();

        // Frames without a selection stay blocked and frozen
        for _ in 0..50 {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
        assert_eq!(world.session.mode, Mode::Choosing);
        assert_eq!(world.clock.now(), clock_at_choice);

        world.frame(
            &FrameInput {
                select_upgrade: Some(0),
                ..FrameInput::default()
            },
            FRAME_DT_MS,
        );
        assert_eq!(world.session.mode, Mode::Playing);
        assert_eq!(world.progression.applied(offered[0]), 1);
    }

    #[test]
    fn test_boss_kill_completes_final_level() {
        let mut tuning = Tuning::default();
        tuning.session.level_durations_ms = vec![64];
        tuning.session.intro_ms = 32;
        tuning.session.banner_ms = 32;
        tuning.boss.hp = 1;
        let mut world = World::new(tuning, 3).expect("world");
        start(&mut world);

        // Run the short enemy phase until the boss appears
        while !world.session.boss_spawned {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
        let boss = world
            .registry
            .members(Group::Enemies)
            .find(|e| e.as_enemy().is_some())
            .expect("boss")
            .id;

        // Walk the boss to its dock so it becomes damageable
        while world
            .registry
            .get(boss)
            .and_then(|e| e.as_enemy())
            .is_some_and(|enemy| !enemy.damageable())
        {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }

        // One overlapping shot fells the 1hp boss
        let boss_center = world.registry.get(boss).expect("boss").body.center();
        world.registry.spawn(
            Aabb::from_center(boss_center, Vec2::new(10.0, 6.0)),
            Vec2::ZERO,
            EntityKind::Shot(Shot {
                faction: Faction::Ally,
                damage: 5,
            }),
        );
        world.frame(&FrameInput::default(), FRAME_DT_MS);
        assert!(matches!(world.session.mode, Mode::Cleared { .. }));

        // The banner runs out on the only level: victory
        for _ in 0..4 {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
        assert_eq!(world.session.mode, Mode::Won);
        assert!(world.drain_events().contains(&GameEvent::GameWon));
    }

    #[test]
    fn test_player_death_loses_run() {
        let mut world = world();
        start(&mut world);
        world.player.hp = 1;
        world.registry.spawn(
            Aabb::from_center(world.player.center(), Vec2::splat(10.0)),
            Vec2::ZERO,
            EntityKind::Shot(Shot {
                faction: Faction::Hostile,
                damage: 50,
            }),
        );
        world.frame(&FrameInput::default(), FRAME_DT_MS);
        assert_eq!(world.session.mode, Mode::Lost);
        assert!(world.drain_events().contains(&GameEvent::GameLost));
    }

    #[test]
    fn test_freshly_spawned_entity_collides_same_frame() {
        // An entity added before the collision pass is eligible that frame:
        // the registry state after spawn is what collision consumes.
        let mut world = world();
        start(&mut world);
        world.registry.spawn(
            Aabb::from_center(world.player.center(), Vec2::splat(10.0)),
            Vec2::ZERO,
            EntityKind::Shot(Shot {
                faction: Faction::Hostile,
                damage: 3,
            }),
        );
        let hp = world.player.hp;
        world.frame(&FrameInput::default(), FRAME_DT_MS);
        assert_eq!(world.player.hp, hp - 3);
    }

    #[test]
    fn test_gem_expires_after_lifetime() {
        let mut world = world();
        start(&mut world);
        let lifetime = world.tuning.pickups.lifetime_ms;
        let gem = world.registry.spawn(
            // Far from the player so it cannot be collected
            Aabb::from_center(Vec2::new(1200.0, 50.0), Vec2::splat(12.0)),
            Vec2::ZERO,
            EntityKind::Pickup(Pickup {
                kind: PickupKind::Gem { value: 1 },
                expires_at_ms: world.clock.now() + lifetime,
            }),
        );
        let frames = lifetime / FRAME_DT_MS + 2;
        for _ in 0..frames {
            world.frame(&FrameInput::default(), FRAME_DT_MS);
        }
        assert!(world.registry.get(gem).is_none());
    }
}
