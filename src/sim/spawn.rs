//! Timer-gated wave spawner
//!
//! Each archetype has its own spawn timer, an unlock threshold and a decay
//! schedule. The effective interval is a pure function of session-elapsed
//! time: one decay step per base interval elapsed past the archetype's
//! checkpoint, clamped to the floor. Tying decay to the clock instead of to
//! spawn events keeps the difficulty ramp independent of spawn history.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::sim::clock::Timer;
use crate::sim::entity::{
    Aabb, Archetype, BehaviorState, BossPhase, DashPhase, Enemy, EntityKind,
};
use crate::sim::registry::Registry;
use crate::tuning::{EnemyTuning, SpawnSchedule, Tuning};

/// Interval for an archetype at a given session-elapsed time
pub fn effective_interval(schedule: &SpawnSchedule, elapsed_ms: u64) -> u64 {
    if elapsed_ms <= schedule.decay_checkpoint_ms {
        return schedule.base_interval_ms;
    }
    let steps = (elapsed_ms - schedule.decay_checkpoint_ms) / schedule.base_interval_ms;
    schedule
        .base_interval_ms
        .saturating_sub(schedule.decay_step_ms * steps)
        .max(schedule.floor_ms)
}

/// Schedules enemy arrivals for one level's enemy phase
#[derive(Debug)]
pub struct SpawnDirector {
    started_ms: u64,
    drifter: Timer,
    spike: Timer,
    sentry: Timer,
    /// Cleared when the boss enters; no further waves spawn
    active: bool,
}

impl SpawnDirector {
    pub fn new(now: u64, tuning: &Tuning) -> Self {
        Self {
            started_ms: now,
            drifter: Timer::new(now, tuning.spawn.drifter.base_interval_ms),
            spike: Timer::new(now, tuning.spawn.spike.base_interval_ms),
            sentry: Timer::new(now, tuning.spawn.sentry.base_interval_ms),
            active: true,
        }
    }

    /// Session-elapsed play time
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.started_ms)
    }

    /// Stop spawning waves (boss phase)
    pub fn halt(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Spawn any due enemies at screen-edge positions
    pub fn update(&mut self, reg: &mut Registry, now: u64, rng: &mut Pcg32, tuning: &Tuning) {
        if !self.active {
            return;
        }
        let elapsed = self.elapsed(now);

        for archetype in [Archetype::Drifter, Archetype::Spike, Archetype::Sentry] {
            let schedule = match archetype {
                Archetype::Drifter => &tuning.spawn.drifter,
                Archetype::Spike => &tuning.spawn.spike,
                Archetype::Sentry => &tuning.spawn.sentry,
                Archetype::Warden => unreachable!(),
            };
            if elapsed < schedule.unlock_ms {
                continue;
            }
            let timer = match archetype {
                Archetype::Drifter => &mut self.drifter,
                Archetype::Spike => &mut self.spike,
                Archetype::Sentry => &mut self.sentry,
                Archetype::Warden => unreachable!(),
            };
            timer.set_interval(effective_interval(schedule, elapsed));
            if timer.fire(now) {
                spawn_at_edge(reg, archetype, now, rng, tuning);
            }
        }
    }
}

/// Place a fresh enemy fully off-screen on a uniformly chosen edge
fn spawn_at_edge(
    reg: &mut Registry,
    archetype: Archetype,
    now: u64,
    rng: &mut Pcg32,
    tuning: &Tuning,
) {
    let (body_tuning, state) = archetype_parts(archetype, now, rng, tuning);
    let size = Vec2::new(body_tuning.width, body_tuning.height);
    let (w, h) = (tuning.arena.width, tuning.arena.height);

    let pos = match rng.random_range(0..4u8) {
        0 => Vec2::new(rng.random_range(0.0..(w - size.x).max(1.0)), -size.y),
        1 => Vec2::new(rng.random_range(0.0..(w - size.x).max(1.0)), h),
        2 => Vec2::new(-size.x, rng.random_range(0.0..(h - size.y).max(1.0))),
        _ => Vec2::new(w, rng.random_range(0.0..(h - size.y).max(1.0))),
    };

    reg.spawn(
        Aabb::new(pos, size),
        Vec2::ZERO,
        EntityKind::Enemy(Enemy {
            archetype,
            health: body_tuning.hp,
            max_health: body_tuning.hp,
            touch_damage: body_tuning.touch_damage,
            speed: body_tuning.speed,
            kamikaze: body_tuning.kamikaze,
            state,
        }),
    );
    log::debug!("spawned {archetype:?} at {pos:?}");
}

/// Body stats and initial behavior state for a wave archetype
fn archetype_parts(
    archetype: Archetype,
    now: u64,
    rng: &mut Pcg32,
    tuning: &Tuning,
) -> (EnemyTuning, BehaviorState) {
    match archetype {
        Archetype::Drifter => (tuning.drifter, BehaviorState::Seek),
        Archetype::Spike => {
            // Jittered so spikes spawned together don't dash in sync
            let jitter = rng.random_range(0..tuning.spike.dash.cooldown_ms.max(1));
            (
                tuning.spike.body,
                BehaviorState::Dash {
                    phase: DashPhase::Seeking,
                    cooldown: Timer::with_offset(now, tuning.spike.dash.cooldown_ms, jitter),
                },
            )
        }
        Archetype::Sentry => {
            let jitter = rng.random_range(0..tuning.sentry.fire_interval_ms.max(1));
            (
                tuning.sentry.body,
                BehaviorState::Sentry {
                    fire: Timer::with_offset(now, tuning.sentry.fire_interval_ms, jitter),
                },
            )
        }
        Archetype::Warden => unreachable!("the boss is not a wave archetype"),
    }
}

/// Spawn the level boss just past the right edge, entering toward its dock
pub fn spawn_boss(reg: &mut Registry, tuning: &Tuning) {
    let boss = &tuning.boss;
    let pos = Vec2::new(
        tuning.arena.width,
        (tuning.arena.height - boss.height) / 2.0,
    );
    reg.spawn(
        Aabb::new(pos, Vec2::new(boss.width, boss.height)),
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
    log::info!("boss entering");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Group;
    use rand::SeedableRng;

    fn archetype_count(reg: &Registry, archetype: Archetype) -> usize {
        reg.members(Group::Enemies)
            .filter(|e| e.as_enemy().is_some_and(|enemy| enemy.archetype == archetype))
            .count()
    }

    #[test]
    fn test_interval_decays_once_past_checkpoint() {
        // Base 3000ms, step 100ms, checkpoint 20000ms, floor 1000ms:
        // one step has been applied by t=25000ms.
        let schedule = SpawnSchedule {
            base_interval_ms: 3000,
            unlock_ms: 0,
            decay_checkpoint_ms: 20_000,
            decay_step_ms: 100,
            floor_ms: 1000,
        };
        assert_eq!(effective_interval(&schedule, 10_000), 3000);
        assert_eq!(effective_interval(&schedule, 20_000), 3000);
        assert_eq!(effective_interval(&schedule, 25_000), 2900);
        assert_eq!(effective_interval(&schedule, 26_000), 2800);
    }

    #[test]
    fn test_interval_clamps_at_floor() {
        let schedule = SpawnSchedule {
            base_interval_ms: 3000,
            unlock_ms: 0,
            decay_checkpoint_ms: 20_000,
            decay_step_ms: 100,
            floor_ms: 1000,
        };
        assert_eq!(effective_interval(&schedule, 10_000_000), 1000);
    }

    #[test]
    fn test_archetypes_unlock_by_checkpoint() {
        let tuning = Tuning::default();
        let mut reg = Registry::new();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut director = SpawnDirector::new(0, &tuning);

        for now in (0..20_000u64).step_by(16) {
            director.update(&mut reg, now, &mut rng, &tuning);
        }
        assert!(archetype_count(&reg, Archetype::Drifter) > 0);
        assert_eq!(archetype_count(&reg, Archetype::Spike), 0);
        assert_eq!(archetype_count(&reg, Archetype::Sentry), 0);

        for now in (20_000..40_000u64).step_by(16) {
            director.update(&mut reg, now, &mut rng, &tuning);
        }
        assert!(archetype_count(&reg, Archetype::Spike) > 0);
        assert_eq!(archetype_count(&reg, Archetype::Sentry), 0);

        for now in (40_000..60_000u64).step_by(16) {
            director.update(&mut reg, now, &mut rng, &tuning);
        }
        assert!(archetype_count(&reg, Archetype::Sentry) > 0);
    }

    #[test]
    fn test_spawns_start_fully_off_screen() {
        let tuning = Tuning::default();
        let mut reg = Registry::new();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut director = SpawnDirector::new(0, &tuning);

        for now in (0..120_000u64).step_by(16) {
            director.update(&mut reg, now, &mut rng, &tuning);
        }
        assert!(reg.count(Group::Enemies) > 10);

        // Placement rule: a fresh spawn never overlaps the play field
        let mut fresh = Registry::new();
        for _ in 0..200 {
            spawn_at_edge(&mut fresh, Archetype::Drifter, 0, &mut rng, &tuning);
        }
        for entity in fresh.iter() {
            let b = &entity.body;
            let inside = b.pos.x < tuning.arena.width
                && b.pos.x + b.size.x > 0.0
                && b.pos.y < tuning.arena.height
                && b.pos.y + b.size.y > 0.0;
            assert!(!inside, "spawned overlapping the field: {b:?}");
        }
    }

    #[test]
    fn test_halted_director_spawns_nothing() {
        let tuning = Tuning::default();
        let mut reg = Registry::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut director = SpawnDirector::new(0, &tuning);
        director.halt();
        assert!(!director.is_active());
        for now in (0..30_000u64).step_by(16) {
            director.update(&mut reg, now, &mut rng, &tuning);
        }
        assert!(reg.is_empty());
    }
}
