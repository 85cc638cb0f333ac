//! Experience, level-ups and the upgrade catalog
//!
//! Upgrades are immutable templates identified by a closed enum; the
//! progression tracks how often each has been applied. Candidate selection
//! filters by application count and prerequisites, then draws a random
//! subset without replacement. Applying an effect is a pure mutation of
//! [`PlayerStats`]; entity side effects (healing, satellite rebuilds) are the
//! caller's job.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand_pcg::Pcg32;

use crate::consts::UPGRADE_CHOICES;
use crate::sim::player::PlayerStats;
use crate::tuning::TuningError;

/// Closed set of upgrade identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpgradeId {
    PeckDamage,
    PeckCount,
    UnlockFeathers,
    FeatherCount,
    FeatherDamage,
    FeatherRadius,
    UnlockWisps,
    WispDamage,
    WispSpeed,
    WispCount,
    EnergyShield,
    HeartyMeal,
    LighterBones,
    GemMagnet,
}

/// What applying an upgrade does to the player's stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpgradeEffect {
    PeckDamage(i32),
    PeckCount(u32),
    UnlockFeathers,
    FeatherCount(u32),
    FeatherDamage(i32),
    FeatherRadius(f32),
    UnlockWisps,
    WispDamage(i32),
    WispSpeed(f32),
    WispCount(u32),
    EnergyShield,
    /// Raises the cap and heals by the same amount
    MaxHealth(i32),
    /// Multiplicative, stacks by repeated application
    GravityFactor(f32),
    PickupRadius(f32),
}

/// Immutable upgrade template
#[derive(Debug, Clone, Copy)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: &'static str,
    pub description: &'static str,
    pub effect: UpgradeEffect,
    /// Maximum application count
    pub max_level: u32,
    pub requires: Option<UpgradeId>,
}

/// The full upgrade pool
pub const CATALOG: &[UpgradeDef] = &[
    UpgradeDef {
        id: UpgradeId::PeckDamage,
        name: "Peck Power+",
        description: "Increases Peck damage by 2.",
        effect: UpgradeEffect::PeckDamage(2),
        max_level: 5,
        requires: None,
    },
    UpgradeDef {
        id: UpgradeId::PeckCount,
        name: "Multi-Peck+",
        description: "Fire an additional Peck projectile.",
        effect: UpgradeEffect::PeckCount(1),
        max_level: 3,
        requires: None,
    },
    UpgradeDef {
        id: UpgradeId::UnlockFeathers,
        name: "Feather Orbit",
        description: "Summons 1 orbiting feather.",
        effect: UpgradeEffect::UnlockFeathers,
        max_level: 1,
        requires: None,
    },
    UpgradeDef {
        id: UpgradeId::FeatherCount,
        name: "Extra Feather",
        description: "Adds another orbiting feather.",
        effect: UpgradeEffect::FeatherCount(1),
        max_level: 4,
        requires: Some(UpgradeId::UnlockFeathers),
    },
    UpgradeDef {
        id: UpgradeId::FeatherDamage,
        name: "Sharper Feathers",
        description: "Increases feather damage by 2.",
        effect: UpgradeEffect::FeatherDamage(2),
        max_level: 5,
        requires: Some(UpgradeId::UnlockFeathers),
    },
    UpgradeDef {
        id: UpgradeId::FeatherRadius,
        name: "Wider Orbit",
        description: "Increases orbit radius by 15.",
        effect: UpgradeEffect::FeatherRadius(15.0),
        max_level: 3,
        requires: Some(UpgradeId::UnlockFeathers),
    },
    UpgradeDef {
        id: UpgradeId::UnlockWisps,
        name: "Homing Spirit",
        description: "Fires a wisp that seeks enemies.",
        effect: UpgradeEffect::UnlockWisps,
        max_level: 1,
        requires: None,
    },
    UpgradeDef {
        id: UpgradeId::WispDamage,
        name: "Spirit Power+",
        description: "Increases Homing Spirit damage by 2.",
        effect: UpgradeEffect::WispDamage(2),
        max_level: 5,
        requires: Some(UpgradeId::UnlockWisps),
    },
    UpgradeDef {
        id: UpgradeId::WispSpeed,
        name: "Swift Spirit",
        description: "Increases Homing Spirit speed.",
        effect: UpgradeEffect::WispSpeed(30.0),
        max_level: 4,
        requires: Some(UpgradeId::UnlockWisps),
    },
    UpgradeDef {
        id: UpgradeId::WispCount,
        name: "Spirit Swarm",
        description: "Fires an additional Homing Spirit.",
        effect: UpgradeEffect::WispCount(1),
        max_level: 2,
        requires: Some(UpgradeId::UnlockWisps),
    },
    UpgradeDef {
        id: UpgradeId::EnergyShield,
        name: "Energy Shield",
        description: "Blocks one hit (30s cooldown).",
        effect: UpgradeEffect::EnergyShield,
        max_level: 1,
        requires: None,
    },
    UpgradeDef {
        id: UpgradeId::HeartyMeal,
        name: "Hearty Meal",
        description: "Increases Max HP by 20. Heals 20 HP.",
        effect: UpgradeEffect::MaxHealth(20),
        max_level: 5,
        requires: None,
    },
    UpgradeDef {
        id: UpgradeId::LighterBones,
        name: "Lighter Bones",
        description: "Reduces gravity effect by 15%.",
        effect: UpgradeEffect::GravityFactor(0.85),
        max_level: 3,
        requires: None,
    },
    UpgradeDef {
        id: UpgradeId::GemMagnet,
        name: "Gem Magnet",
        description: "Increases XP gem pickup radius.",
        effect: UpgradeEffect::PickupRadius(50.0),
        max_level: 3,
        requires: None,
    },
];

/// Startup check for catalog consistency; a broken catalog is fatal
pub fn validate_catalog(catalog: &[UpgradeDef]) -> Result<(), TuningError> {
    for (i, def) in catalog.iter().enumerate() {
        if catalog[..i].iter().any(|other| other.id == def.id) {
            return Err(TuningError::DuplicateUpgrade(def.name));
        }
        if def.max_level == 0 {
            return Err(TuningError::ZeroMaxLevel(def.name));
        }
        if let Some(requires) = def.requires {
            let Some(prereq) = catalog.iter().find(|other| other.id == requires) else {
                return Err(TuningError::MissingPrerequisite {
                    id: def.name,
                    requires: "<unregistered>",
                });
            };
            if prereq.id == def.id {
                return Err(TuningError::MissingPrerequisite {
                    id: def.name,
                    requires: def.name,
                });
            }
        }
    }
    Ok(())
}

/// Look up a definition by id
pub fn find_def(catalog: &[UpgradeDef], id: UpgradeId) -> Option<&UpgradeDef> {
    catalog.iter().find(|def| def.id == id)
}

/// Experience, level and per-upgrade application counts
#[derive(Debug, Clone)]
pub struct Progression {
    pub xp: u32,
    pub level: u32,
    threshold: u32,
    applied: BTreeMap<UpgradeId, u32>,
}

impl Progression {
    pub fn new(first_threshold: u32) -> Self {
        Self {
            xp: 0,
            level: 1,
            threshold: first_threshold.max(1),
            applied: BTreeMap::new(),
        }
    }

    /// Experience required for the next level-up
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn applied(&self, id: UpgradeId) -> u32 {
        self.applied.get(&id).copied().unwrap_or(0)
    }

    /// Add experience, returning how many levels were gained
    ///
    /// A single large grant can cross several thresholds; each crossing
    /// subtracts the old threshold and scales the next by x1.5, truncated.
    pub fn grant_xp(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut levels = 0;
        while self.xp >= self.threshold {
            self.xp -= self.threshold;
            self.level += 1;
            self.threshold = ((self.threshold * 3) / 2).max(1);
            levels += 1;
        }
        levels
    }

    /// Record one application, clamped at the definition's maximum
    pub fn record(&mut self, def: &UpgradeDef) {
        let count = self.applied.entry(def.id).or_insert(0);
        if *count >= def.max_level {
            log::warn!("upgrade {:?} already at max level {}", def.id, def.max_level);
            return;
        }
        *count += 1;
    }

    /// All currently offerable upgrade definitions
    pub fn eligible<'a>(
        &self,
        catalog: &'a [UpgradeDef],
        stats: &PlayerStats,
    ) -> Vec<&'a UpgradeDef> {
        catalog
            .iter()
            .filter(|def| self.applied(def.id) < def.max_level)
            .filter(|def| {
                def.requires
                    .is_none_or(|requires| self.applied(requires) > 0)
            })
            .filter(|def| match def.effect {
                // Unlocks are one-shot even if granted by other means
                UpgradeEffect::UnlockFeathers => !stats.feathers_unlocked,
                UpgradeEffect::UnlockWisps => !stats.wisps_unlocked,
                UpgradeEffect::EnergyShield => !stats.has_shield,
                _ => true,
            })
            .collect()
    }

    /// Draw up to three candidates without replacement
    pub fn roll_choices(
        &self,
        catalog: &[UpgradeDef],
        stats: &PlayerStats,
        rng: &mut Pcg32,
    ) -> Vec<UpgradeId> {
        let mut pool = self.eligible(catalog, stats);
        pool.shuffle(rng);
        pool.into_iter()
            .take(UPGRADE_CHOICES)
            .map(|def| def.id)
            .collect()
    }
}

/// Apply an upgrade effect to the player's stats
pub fn apply_effect(stats: &mut PlayerStats, effect: UpgradeEffect) {
    match effect {
        UpgradeEffect::PeckDamage(v) => stats.peck_damage += v,
        UpgradeEffect::PeckCount(v) => stats.peck_count += v,
        UpgradeEffect::UnlockFeathers => {
            stats.feathers_unlocked = true;
            stats.feather_count = stats.feather_count.max(1);
        }
        UpgradeEffect::FeatherCount(v) => stats.feather_count += v,
        UpgradeEffect::FeatherDamage(v) => stats.feather_damage += v,
        UpgradeEffect::FeatherRadius(v) => stats.feather_radius += v,
        UpgradeEffect::UnlockWisps => stats.wisps_unlocked = true,
        UpgradeEffect::WispDamage(v) => stats.wisp_damage += v,
        UpgradeEffect::WispSpeed(v) => stats.wisp_speed += v,
        UpgradeEffect::WispCount(v) => stats.wisp_count += v,
        UpgradeEffect::EnergyShield => stats.has_shield = true,
        UpgradeEffect::MaxHealth(v) => stats.max_hp += v,
        UpgradeEffect::GravityFactor(v) => stats.gravity_factor *= v,
        UpgradeEffect::PickupRadius(v) => stats.pickup_radius += v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn stats() -> PlayerStats {
        PlayerStats::new(&Tuning::default())
    }

    #[test]
    fn test_catalog_validates() {
        validate_catalog(CATALOG).expect("shipping catalog must be valid");
    }

    #[test]
    fn test_unregistered_prerequisite_rejected() {
        let broken = [UpgradeDef {
            id: UpgradeId::FeatherCount,
            name: "Extra Feather",
            description: "",
            effect: UpgradeEffect::FeatherCount(1),
            max_level: 4,
            requires: Some(UpgradeId::UnlockFeathers),
        }];
        assert!(matches!(
            validate_catalog(&broken),
            Err(TuningError::MissingPrerequisite { .. })
        ));
    }

    #[test]
    fn test_zero_max_level_rejected() {
        let broken = [UpgradeDef {
            id: UpgradeId::PeckDamage,
            name: "Peck Power+",
            description: "",
            effect: UpgradeEffect::PeckDamage(2),
            max_level: 0,
            requires: None,
        }];
        assert!(matches!(
            validate_catalog(&broken),
            Err(TuningError::ZeroMaxLevel(_))
        ));
    }

    #[test]
    fn test_threshold_sequence() {
        let mut prog = Progression::new(10);
        assert_eq!(prog.grant_xp(10), 1);
        assert_eq!(prog.threshold(), 15);
        assert_eq!(prog.grant_xp(15), 1);
        assert_eq!(prog.threshold(), 22);
        assert_eq!(prog.grant_xp(22), 1);
        assert_eq!(prog.threshold(), 33);
    }

    #[test]
    fn test_overshooting_grant_levels_twice() {
        let mut prog = Progression::new(10);
        // 10 + 15 = 25 crosses two thresholds in one grant
        assert_eq!(prog.grant_xp(27), 2);
        assert_eq!(prog.level, 3);
        assert_eq!(prog.xp, 2);
    }

    #[test]
    fn test_xp_never_negative_after_level() {
        let mut prog = Progression::new(10);
        prog.grant_xp(9);
        assert_eq!(prog.grant_xp(1), 1);
        assert_eq!(prog.xp, 0);
    }

    #[test]
    fn test_prerequisite_gates_candidates() {
        let prog = Progression::new(10);
        let stats = stats();
        let pool = prog.eligible(CATALOG, &stats);
        assert!(pool.iter().any(|d| d.id == UpgradeId::UnlockFeathers));
        assert!(
            !pool.iter().any(|d| d.id == UpgradeId::FeatherCount),
            "locked weapon's stat upgrades must not be offered"
        );
    }

    #[test]
    fn test_unlock_excluded_once_taken() {
        let mut prog = Progression::new(10);
        let mut stats = stats();
        let def = find_def(CATALOG, UpgradeId::UnlockFeathers).expect("def");
        prog.record(def);
        apply_effect(&mut stats, def.effect);

        let pool = prog.eligible(CATALOG, &stats);
        assert!(!pool.iter().any(|d| d.id == UpgradeId::UnlockFeathers));
        // ...and its dependents open up
        assert!(pool.iter().any(|d| d.id == UpgradeId::FeatherCount));
    }

    #[test]
    fn test_applied_count_clamped_at_max() {
        let mut prog = Progression::new(10);
        let def = find_def(CATALOG, UpgradeId::PeckCount).expect("def");
        for _ in 0..10 {
            prog.record(def);
        }
        assert_eq!(prog.applied(UpgradeId::PeckCount), def.max_level);
    }

    #[test]
    fn test_roll_draws_without_replacement() {
        let prog = Progression::new(10);
        let stats = stats();
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..50 {
            let choices = prog.roll_choices(CATALOG, &stats, &mut rng);
            assert!(choices.len() <= UPGRADE_CHOICES);
            let mut unique = choices.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), choices.len());
        }
    }

    #[test]
    fn test_gravity_factor_stacks_multiplicatively() {
        let mut stats = stats();
        apply_effect(&mut stats, UpgradeEffect::GravityFactor(0.85));
        apply_effect(&mut stats, UpgradeEffect::GravityFactor(0.85));
        assert!((stats.gravity_factor - 0.7225).abs() < 1e-6);
    }

    proptest! {
        /// Thresholds only ever grow, and leftover xp stays below the next one
        #[test]
        fn prop_thresholds_monotonic(grants in proptest::collection::vec(0u32..200, 1..40)) {
            let mut prog = Progression::new(10);
            let mut last_threshold = prog.threshold();
            for amount in grants {
                prog.grant_xp(amount);
                prop_assert!(prog.threshold() >= last_threshold);
                prop_assert!(prog.xp < prog.threshold());
                last_threshold = prog.threshold();
            }
        }
    }
}
