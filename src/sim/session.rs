//! Coarse game states
//!
//! The session gates which subsystems run each frame. Anything other than
//! `Playing` freezes the simulation clock, so every timer in the game
//! resumes exactly where it left off; rendering of the frozen state is the
//! host's business.

use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Menu,
    /// Level banner before play begins
    Intro { remaining_ms: u64 },
    Playing,
    Paused,
    /// Blocked on an upgrade choice from the UI
    Choosing,
    /// "Level complete" banner after the boss falls
    Cleared { remaining_ms: u64 },
    Won,
    Lost,
}

#[derive(Debug)]
pub struct Session {
    pub mode: Mode,
    /// 0-based level index
    pub level: u32,
    /// Simulation time when the current level's play phase began
    pub level_started_ms: u64,
    pub boss_spawned: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            mode: Mode::Menu,
            level: 0,
            level_started_ms: 0,
            boss_spawned: false,
        }
    }

    /// Whether entity and timer updates run this frame
    pub fn updating(&self) -> bool {
        matches!(self.mode, Mode::Playing)
    }

    pub fn terminal(&self) -> bool {
        matches!(self.mode, Mode::Won | Mode::Lost)
    }

    /// Enemy-phase duration of the current level
    pub fn level_duration_ms(&self, tuning: &Tuning) -> u64 {
        let durations = &tuning.session.level_durations_ms;
        durations
            .get(self.level as usize)
            .or(durations.last())
            .copied()
            .unwrap_or(60_000)
    }

    pub fn is_last_level(&self, tuning: &Tuning) -> bool {
        self.level as usize + 1 >= tuning.session.level_durations_ms.len()
    }
}
