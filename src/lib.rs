//! Skyflock - a flap-and-shoot arena survivor
//!
//! Core modules:
//! - `sim`: Deterministic simulation (behaviors, collisions, progression)
//! - `tuning`: Data-driven game balance with startup validation
//!
//! Rendering, audio playback and raw input live outside this crate; the
//! simulation communicates with them through [`sim::GameEvent`] and
//! [`sim::FrameInput`].

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Structural constants that are not balance knobs
pub mod consts {
    /// Nominal frame duration driven by the host loop (ms)
    pub const FRAME_DT_MS: u64 = 16;
    /// Margin beyond the arena before homing projectiles self-destruct
    pub const WISP_OFFSCREEN_MARGIN: f32 = 50.0;
    /// Margin beyond the arena before straight shots self-destruct
    pub const SHOT_OFFSCREEN_MARGIN: f32 = 20.0;
    /// Number of upgrade candidates offered per level-up
    pub const UPGRADE_CHOICES: usize = 3;
}

/// Unit vector from `from` toward `to`, or `fallback` when the points coincide
#[inline]
pub fn unit_toward(from: Vec2, to: Vec2, fallback: Vec2) -> Vec2 {
    let delta = to - from;
    if delta.length_squared() > f32::EPSILON {
        delta.normalize()
    } else {
        fallback
    }
}

/// Squared distance between two points (radius tests never need the root)
#[inline]
pub fn dist_sq(a: Vec2, b: Vec2) -> f32 {
    (a - b).length_squared()
}
