//! Frame events for external collaborators
//!
//! The simulation never calls audio or UI code directly; it appends events
//! here and the host drains them after each frame. Delivery is
//! fire-and-forget: dropping the whole batch is harmless to the simulation.

use glam::Vec2;

use crate::sim::entity::{Archetype, Faction, PickupKind};
use crate::sim::progression::UpgradeId;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ShotFired(Faction),
    EnemyHit {
        archetype: Archetype,
    },
    EnemyDied {
        archetype: Archetype,
        pos: Vec2,
    },
    PlayerHit {
        damage: i32,
    },
    /// The energy shield absorbed a hit and began recharging
    ShieldBlocked,
    PickupCollected(PickupKind),
    LeveledUp {
        level: u32,
    },
    /// Candidates presented to the upgrade-choice UI
    ChoicesOffered(Vec<UpgradeId>),
    UpgradeApplied(UpgradeId),
    BossArrived,
    BossDefeated,
    LevelComplete {
        level: u32,
    },
    GameWon,
    GameLost,
}
