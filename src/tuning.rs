//! Data-driven game balance
//!
//! Every gameplay constant lives here so designers can iterate without
//! touching simulation code. A partial JSON file can override any subset of
//! the defaults. Validation runs once at startup and is fatal: a broken
//! tuning file is a build-time data mistake, not a runtime condition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("arena dimensions must be positive (got {width}x{height})")]
    BadArena { width: f32, height: f32 },
    #[error("{name} must be a positive duration")]
    ZeroDuration { name: &'static str },
    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f32 },
    #[error("spawn schedule floor {floor_ms}ms exceeds base interval {base_ms}ms")]
    FloorAboveBase { base_ms: u64, floor_ms: u64 },
    #[error("no levels configured")]
    NoLevels,
    #[error("boss burst must fire at least one shot")]
    EmptyBurst,
    #[error("duplicate upgrade definition '{0}'")]
    DuplicateUpgrade(&'static str),
    #[error("upgrade '{id}' requires '{requires}', which is not in the catalog")]
    MissingPrerequisite {
        id: &'static str,
        requires: &'static str,
    },
    #[error("upgrade '{0}' has a maximum application count of zero")]
    ZeroMaxLevel(&'static str),
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Play-field dimensions in pixels, top-left origin, +y down
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// A straight projectile template
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotTuning {
    /// Speed in px/s
    pub speed: f32,
    pub damage: i32,
    pub width: f32,
    pub height: f32,
}

impl Default for ShotTuning {
    fn default() -> Self {
        Self {
            speed: 900.0,
            damage: 1,
            width: 10.0,
            height: 6.0,
        }
    }
}

/// Shared enemy body stats
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub hp: i32,
    /// Seek speed in px/s (0 = stationary)
    pub speed: f32,
    pub touch_damage: i32,
    pub width: f32,
    pub height: f32,
    /// Dies on body contact with the player, dropping its pickup
    pub kamikaze: bool,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            hp: 5,
            speed: 120.0,
            touch_damage: 10,
            width: 30.0,
            height: 30.0,
            kamikaze: true,
        }
    }
}

/// Dash-attacker timing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DashTuning {
    pub cooldown_ms: u64,
    /// Telegraph pause before the dash (the player's reaction window)
    pub pause_ms: u64,
    pub duration_ms: u64,
    pub dash_speed: f32,
}

impl Default for DashTuning {
    fn default() -> Self {
        Self {
            cooldown_ms: 4000,
            pause_ms: 300,
            duration_ms: 250,
            dash_speed: 720.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeTuning {
    pub body: EnemyTuning,
    pub dash: DashTuning,
}

impl Default for SpikeTuning {
    fn default() -> Self {
        Self {
            body: EnemyTuning {
                hp: 8,
                speed: 150.0,
                touch_damage: 15,
                width: 25.0,
                height: 25.0,
                kamikaze: true,
            },
            dash: DashTuning::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SentryTuning {
    pub body: EnemyTuning,
    pub fire_interval_ms: u64,
    pub shot: ShotTuning,
}

impl Default for SentryTuning {
    fn default() -> Self {
        Self {
            body: EnemyTuning {
                hp: 15,
                speed: 0.0,
                touch_damage: 5,
                width: 40.0,
                height: 40.0,
                kamikaze: true,
            },
            fire_interval_ms: 3500,
            shot: ShotTuning {
                speed: 240.0,
                damage: 8,
                width: 10.0,
                height: 10.0,
            },
        }
    }
}

/// Boss phase-cycle timing and firepower
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub hp: i32,
    pub touch_damage: i32,
    pub width: f32,
    pub height: f32,
    /// Entry slide speed toward the dock position, px/s
    pub entry_speed: f32,
    /// Distance from the right arena edge to the docked boss
    pub dock_margin: f32,
    /// Window over which the burst shots are spread
    pub burst_window_ms: u64,
    pub burst_shots: u32,
    /// Idle delay between the burst and the charge telegraph
    pub charge_pause_ms: u64,
    /// Telegraph duration before the heavy shot fires
    pub charge_ms: u64,
    pub burst_shot: ShotTuning,
    pub heavy_shot: ShotTuning,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            hp: 100,
            touch_damage: 20,
            width: 80.0,
            height: 150.0,
            entry_speed: 120.0,
            dock_margin: 100.0,
            burst_window_ms: 2000,
            burst_shots: 3,
            charge_pause_ms: 3000,
            charge_ms: 1000,
            burst_shot: ShotTuning {
                speed: 420.0,
                damage: 10,
                width: 15.0,
                height: 5.0,
            },
            heavy_shot: ShotTuning {
                speed: 180.0,
                damage: 25,
                width: 40.0,
                height: 40.0,
            },
        }
    }
}

/// Per-archetype spawn pacing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSchedule {
    pub base_interval_ms: u64,
    /// Session-elapsed time before this archetype spawns at all
    pub unlock_ms: u64,
    /// Session-elapsed time before the interval starts decaying
    pub decay_checkpoint_ms: u64,
    pub decay_step_ms: u64,
    pub floor_ms: u64,
}

impl Default for SpawnSchedule {
    fn default() -> Self {
        Self {
            base_interval_ms: 3000,
            unlock_ms: 0,
            decay_checkpoint_ms: 20_000,
            decay_step_ms: 100,
            floor_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub drifter: SpawnSchedule,
    pub spike: SpawnSchedule,
    pub sentry: SpawnSchedule,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            drifter: SpawnSchedule::default(),
            spike: SpawnSchedule {
                base_interval_ms: 5000,
                unlock_ms: 20_000,
                decay_checkpoint_ms: 45_000,
                decay_step_ms: 150,
                floor_ms: 2500,
            },
            sentry: SpawnSchedule {
                base_interval_ms: 8000,
                unlock_ms: 40_000,
                decay_checkpoint_ms: 70_000,
                decay_step_ms: 200,
                floor_ms: 5000,
            },
        }
    }
}

/// Auto-fired forward projectile ("peck")
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PeckTuning {
    pub interval_ms: u64,
    pub damage: i32,
    pub speed: f32,
    pub width: f32,
    pub height: f32,
    /// Gap between the player's beak and the spawn point
    pub muzzle_gap: f32,
    /// Fire on cooldown without a shoot intent
    pub autofire: bool,
}

impl Default for PeckTuning {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            damage: 1,
            speed: 900.0,
            width: 10.0,
            height: 6.0,
            muzzle_gap: 5.0,
            autofire: true,
        }
    }
}

/// Homing wisp volley
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WispTuning {
    pub interval_ms: u64,
    pub damage: i32,
    pub speed: f32,
    /// Per-update velocity interpolation factor toward the target
    pub turn_rate: f32,
    pub size: f32,
    /// How long a wisp coasts without a live target before expiring
    pub no_target_lifetime_ms: u64,
}

impl Default for WispTuning {
    fn default() -> Self {
        Self {
            interval_ms: 2200,
            damage: 4,
            speed: 210.0,
            turn_rate: 0.07,
            size: 12.0,
            no_target_lifetime_ms: 2500,
        }
    }
}

/// Orbiting feather satellites
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatherTuning {
    pub damage: i32,
    pub radius: f32,
    /// Shared orbit angle advance, radians/s
    pub angular_speed: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for FeatherTuning {
    fn default() -> Self {
        Self {
            damage: 3,
            radius: 60.0,
            angular_speed: 3.0,
            width: 20.0,
            height: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub width: f32,
    pub height: f32,
    pub max_hp: i32,
    /// Downward acceleration, px/s²
    pub gravity: f32,
    /// Upward flap impulse, px/s (negative = up)
    pub flap_impulse: f32,
    /// Horizontal kick applied on flap toward facing, px/s
    pub flap_kick: f32,
    /// Horizontal velocity retained per nominal frame
    pub horizontal_damping: f32,
    pub peck: PeckTuning,
    pub wisp: WispTuning,
    pub feather: FeatherTuning,
    pub pickup_radius: f32,
    pub shield_recharge_ms: u64,
    /// Grace window after a hit before the player can be hit again
    pub invuln_ms: u64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 30.0,
            max_hp: 100,
            gravity: 2880.0,
            flap_impulse: -720.0,
            flap_kick: 480.0,
            horizontal_damping: 0.8,
            peck: PeckTuning::default(),
            wisp: WispTuning::default(),
            feather: FeatherTuning::default(),
            pickup_radius: 40.0,
            shield_recharge_ms: 30_000,
            invuln_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    pub gem_value: u32,
    pub gem_size: f32,
    /// Uncollected pickups expire after this long
    pub lifetime_ms: u64,
    /// Chance an enemy death also drops a rapid-fire pickup
    pub rapid_drop_chance: f32,
    pub rapid_duration_ms: u64,
    pub rapid_size: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            gem_value: 1,
            gem_size: 12.0,
            lifetime_ms: 10_000,
            rapid_drop_chance: 0.05,
            rapid_duration_ms: 10_000,
            rapid_size: 25.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Enemy-phase duration per level; the boss enters when it elapses
    pub level_durations_ms: Vec<u64>,
    pub intro_ms: u64,
    /// "Level complete" banner duration
    pub banner_ms: u64,
    /// Experience required for the first level-up
    pub xp_threshold: u32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            level_durations_ms: vec![60_000, 75_000, 90_000],
            intro_ms: 3000,
            banner_ms: 3000,
            xp_threshold: 10,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub drifter: EnemyTuning,
    pub spike: SpikeTuning,
    pub sentry: SentryTuning,
    pub boss: BossTuning,
    pub spawn: SpawnTuning,
    pub pickups: PickupTuning,
    pub session: SessionTuning,
}

impl Tuning {
    /// Load tuning from a JSON file, falling back to defaults for absent keys
    pub fn load(path: &std::path::Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        let tuning: Tuning = serde_json::from_str(&json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check cross-field consistency; fatal before the simulation loop begins
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.arena.width <= 0.0 || self.arena.height <= 0.0 {
            return Err(TuningError::BadArena {
                width: self.arena.width,
                height: self.arena.height,
            });
        }

        for (name, ms) in [
            ("player.peck.interval_ms", self.player.peck.interval_ms),
            ("player.wisp.interval_ms", self.player.wisp.interval_ms),
            ("player.shield_recharge_ms", self.player.shield_recharge_ms),
            ("spike.dash.cooldown_ms", self.spike.dash.cooldown_ms),
            ("spike.dash.pause_ms", self.spike.dash.pause_ms),
            ("spike.dash.duration_ms", self.spike.dash.duration_ms),
            ("sentry.fire_interval_ms", self.sentry.fire_interval_ms),
            ("boss.burst_window_ms", self.boss.burst_window_ms),
            ("boss.charge_pause_ms", self.boss.charge_pause_ms),
            ("boss.charge_ms", self.boss.charge_ms),
            ("pickups.lifetime_ms", self.pickups.lifetime_ms),
            ("session.intro_ms", self.session.intro_ms),
            ("session.banner_ms", self.session.banner_ms),
        ] {
            if ms == 0 {
                return Err(TuningError::ZeroDuration { name });
            }
        }

        for schedule in [&self.spawn.drifter, &self.spawn.spike, &self.spawn.sentry] {
            if schedule.base_interval_ms == 0 {
                return Err(TuningError::ZeroDuration {
                    name: "spawn.base_interval_ms",
                });
            }
            if schedule.floor_ms > schedule.base_interval_ms {
                return Err(TuningError::FloorAboveBase {
                    base_ms: schedule.base_interval_ms,
                    floor_ms: schedule.floor_ms,
                });
            }
        }

        if self.session.level_durations_ms.is_empty() {
            return Err(TuningError::NoLevels);
        }
        if self.session.level_durations_ms.contains(&0) {
            return Err(TuningError::ZeroDuration {
                name: "session.level_durations_ms",
            });
        }
        if self.session.xp_threshold == 0 {
            return Err(TuningError::NonPositive {
                name: "session.xp_threshold",
                value: 0.0,
            });
        }
        if self.boss.burst_shots == 0 {
            return Err(TuningError::EmptyBurst);
        }

        for (name, value) in [
            ("player.peck.speed", self.player.peck.speed),
            ("player.wisp.speed", self.player.wisp.speed),
            ("boss.burst_shot.speed", self.boss.burst_shot.speed),
            ("boss.heavy_shot.speed", self.boss.heavy_shot.speed),
            ("player.pickup_radius", self.player.pickup_radius),
        ] {
            if value <= 0.0 {
                return Err(TuningError::NonPositive { name, value });
            }
        }

        Ok(())
    }
}
