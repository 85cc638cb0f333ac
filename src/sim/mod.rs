//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - One clock sample per frame, shared by every timer
//! - Seeded RNG only
//! - Fixed subsystem order within a frame
//! - No rendering, audio or platform dependencies

pub mod behavior;
pub mod clock;
pub mod collision;
pub mod entity;
pub mod events;
pub mod player;
pub mod progression;
pub mod registry;
pub mod session;
pub mod spawn;
pub mod steering;
pub mod tick;

pub use clock::{Clock, Timer};
pub use entity::{
    Aabb, Archetype, BehaviorState, BossPhase, DashPhase, Entity, EntityId, EntityKind, Faction,
    Group, PickupKind,
};
pub use events::GameEvent;
pub use player::{Player, PlayerStats};
pub use progression::{CATALOG, Progression, UpgradeDef, UpgradeEffect, UpgradeId};
pub use registry::Registry;
pub use session::{Mode, Session};
pub use spawn::SpawnDirector;
pub use tick::{FrameInput, World};
