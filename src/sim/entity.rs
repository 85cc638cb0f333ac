//! Entity data model
//!
//! Every live simulation object except the player is an [`Entity`]: a body,
//! a velocity and a closed tagged kind. Role groups are derived from the
//! kind, never assigned by callers, so a pickup can never end up in the
//! enemy group.

use glam::Vec2;

use crate::sim::clock::Timer;

/// Stable identity of a registry entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Axis-aligned bounding box, top-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            pos: center - size * 0.5,
            size,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.pos = center - self.size * 0.5;
    }

    /// Interval-overlap intersection test
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && other.pos.x < self.pos.x + self.size.x
            && self.pos.y < other.pos.y + other.size.y
            && other.pos.y < self.pos.y + self.size.y
    }

    /// True when the box lies fully outside a `width`x`height` field grown by
    /// `margin` on every side
    pub fn outside(&self, width: f32, height: f32, margin: f32) -> bool {
        self.pos.x + self.size.x < -margin
            || self.pos.x > width + margin
            || self.pos.y + self.size.y < -margin
            || self.pos.y > height + margin
    }
}

/// Role groups for targeted iteration and collision testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Enemies,
    PlayerShots,
    EnemyShots,
    Wisps,
    Feathers,
    Pickups,
}

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Ally,
    Hostile,
}

/// Closed set of enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    /// Drifts straight at the player
    Drifter,
    /// Seeks, then telegraphs and dashes
    Spike,
    /// Holds position and fires aimed shots
    Sentry,
    /// Level boss with a multi-phase attack cycle
    Warden,
}

/// Dash-attacker phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashPhase {
    Seeking,
    /// Telegraph; the dash target is captured when this phase ends
    Pausing { until_ms: u64 },
    /// Aimed at the position captured at pause end, never re-aimed
    Dashing { until_ms: u64, target: Vec2 },
}

/// Boss attack-cycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossPhase {
    /// Sliding toward the dock position, damage-immune
    Entering,
    Burst,
    ChargePause,
    Charging,
}

/// Per-archetype behavior state; exactly one variant is live per enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorState {
    Seek,
    Dash {
        phase: DashPhase,
        cooldown: Timer,
    },
    Sentry {
        fire: Timer,
    },
    Boss {
        phase: BossPhase,
        /// Reset on every phase transition
        phase_started_ms: u64,
        shots_fired: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enemy {
    pub archetype: Archetype,
    pub health: i32,
    pub max_health: i32,
    pub touch_damage: i32,
    pub speed: f32,
    pub kamikaze: bool,
    pub state: BehaviorState,
}

impl Enemy {
    /// True once the enemy can be damaged (the boss is immune while entering)
    pub fn damageable(&self) -> bool {
        !matches!(
            self.state,
            BehaviorState::Boss {
                phase: BossPhase::Entering,
                ..
            }
        )
    }
}

/// Straight-flying projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub faction: Faction,
    pub damage: i32,
}

/// Homing projectile; curves toward the nearest live enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wisp {
    pub damage: i32,
    pub speed: f32,
    pub turn_rate: f32,
    pub target: Option<EntityId>,
    /// When the wisp last lost its target (0 = has one)
    pub target_lost_ms: u64,
}

/// Orbiting satellite; position is computed from the player's orbit angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feather {
    /// Fixed angular offset from the shared orbit angle
    pub angle_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    /// Experience gem
    Gem { value: u32 },
    /// Temporarily halves the peck cooldown
    RapidFire,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    pub expires_at_ms: u64,
}

/// Closed tagged entity payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    Enemy(Enemy),
    Shot(Shot),
    Wisp(Wisp),
    Feather(Feather),
    Pickup(Pickup),
}

/// A live simulation object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub body: Aabb,
    pub vel: Vec2,
    pub kind: EntityKind,
}

impl Entity {
    /// Role group, derived from the kind
    pub fn group(&self) -> Group {
        match &self.kind {
            EntityKind::Enemy(_) => Group::Enemies,
            EntityKind::Shot(shot) => match shot.faction {
                Faction::Ally => Group::PlayerShots,
                Faction::Hostile => Group::EnemyShots,
            },
            EntityKind::Wisp(_) => Group::Wisps,
            EntityKind::Feather(_) => Group::Feathers,
            EntityKind::Pickup(_) => Group::Pickups,
        }
    }

    pub fn as_enemy(&self) -> Option<&Enemy> {
        match &self.kind {
            EntityKind::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match &mut self.kind {
            EntityKind::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_intersects() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        let c = Aabb::new(Vec2::new(20.0, 0.0), Vec2::new(5.0, 5.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_aabb_touching_edges_do_not_intersect() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_aabb_outside_margin() {
        let boxed = Aabb::new(Vec2::new(-40.0, 10.0), Vec2::new(10.0, 10.0));
        assert!(boxed.outside(100.0, 100.0, 20.0));
        assert!(!boxed.outside(100.0, 100.0, 50.0));
    }

    #[test]
    fn test_group_derivation() {
        let shot = Entity {
            id: EntityId(1),
            body: Aabb::new(Vec2::ZERO, Vec2::ONE),
            vel: Vec2::ZERO,
            kind: EntityKind::Shot(Shot {
                faction: Faction::Hostile,
                damage: 1,
            }),
        };
        assert_eq!(shot.group(), Group::EnemyShots);
    }
}
