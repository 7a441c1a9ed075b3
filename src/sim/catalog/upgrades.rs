//! Permanent castle upgrades

use serde::{Deserialize, Serialize};

use super::Rarity;
use crate::sim::stats::{Ability, StatField};

/// Upgrade category (display grouping only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Weapon,
    Defense,
    Magic,
    Utility,
}

/// One stat mutation applied when an upgrade is earned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatEffect {
    /// Multiply a stat
    Scale(StatField, f64),
    /// Add to a stat
    Add(StatField, f64),
    /// Add to a stat, never exceeding `cap`
    AddCapped {
        field: StatField,
        amount: f64,
        cap: f64,
    },
    /// Turn on an ability flag
    Unlock(Ability),
    AddProjectiles(u32),
    AddRicochet(u32),
    /// One more permanent garrison guard
    AddGarrison,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpgradeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    pub kind: UpgradeKind,
    pub rarity: Rarity,
    pub repeatable: bool,
    pub effects: &'static [StatEffect],
}

macro_rules! upgrade {
    ($id:literal, $name:literal, $desc:literal, $kind:ident, $rarity:ident, $rep:literal, [$($effect:expr),+ $(,)?]) => {
        UpgradeDef {
            id: $id,
            name: $name,
            desc: $desc,
            kind: UpgradeKind::$kind,
            rarity: Rarity::$rarity,
            repeatable: $rep,
            effects: &[$($effect),+],
        }
    };
}

use StatEffect::*;
use StatField::*;

/// The full upgrade catalog
pub static UPGRADES: &[UpgradeDef] = &[
    // Common
    upgrade!("damage_c", "Sharp Arrows", "+15% arrow damage", Weapon, Common, true, [Scale(Damage, 1.15)]),
    upgrade!("attackSpeed_c", "Quick Hands", "+12% attack speed", Weapon, Common, true, [Scale(AttackSpeed, 1.12)]),
    upgrade!("health_c", "Wooden Planks", "+20 max health", Defense, Common, true, [Add(MaxHealth, 20.0)]),
    upgrade!("armor_c", "Leather Padding", "-8% damage taken", Defense, Common, true, [Add(Armor, 0.08)]),
    upgrade!("slow_c", "Chilling Touch", "15% chance to slow enemies", Magic, Common, true, [AddCapped { field: FreezeChance, amount: 0.15, cap: 0.6 }]),
    upgrade!("gold_find_c", "Gold Finder", "+15% gold from kills", Utility, Common, true, [Scale(GoldMultiplier, 1.15)]),
    upgrade!("range_c", "Long Bow", "+20% attack range", Weapon, Common, true, [Scale(AttackRange, 1.2)]),
    // Uncommon
    upgrade!("damage_u", "Steel Tips", "+25% arrow damage", Weapon, Uncommon, true, [Scale(Damage, 1.25)]),
    upgrade!("attackSpeed_u", "Quick Draw", "+20% attack speed", Weapon, Uncommon, true, [Scale(AttackSpeed, 1.2)]),
    upgrade!("critChance_u", "Keen Eye", "+8% critical chance", Weapon, Uncommon, true, [Add(CritChance, 0.08)]),
    upgrade!("health_u", "Fortify Walls", "+40 max health", Defense, Uncommon, true, [Add(MaxHealth, 40.0)]),
    upgrade!("armor_u", "Iron Plates", "-12% damage taken", Defense, Uncommon, true, [Add(Armor, 0.12)]),
    upgrade!("regen_u", "Healing Moss", "Regenerate 0.8 HP/sec", Defense, Uncommon, true, [Add(Regen, 0.8)]),
    upgrade!("ricochet_u", "Ricochet", "Arrows bounce to +1 enemy", Magic, Uncommon, true, [AddRicochet(1)]),
    upgrade!("poison_u", "Poison Tips", "Arrows deal +8 poison damage over 3s", Magic, Uncommon, true, [Add(PoisonDamage, 8.0)]),
    upgrade!("dodge_u", "Reinforced Gates", "8% chance to dodge attacks", Defense, Uncommon, true, [Add(DodgeChance, 0.08)]),
    upgrade!("gold_find_u", "Treasure Hunter", "+25% gold from kills", Utility, Uncommon, true, [Scale(GoldMultiplier, 1.25)]),
    // Rare
    upgrade!("damage_r", "Enchanted Arrows", "+45% arrow damage", Weapon, Rare, true, [Scale(Damage, 1.45)]),
    upgrade!("attackSpeed_r", "Rapid Fire", "+30% attack speed", Weapon, Rare, true, [Scale(AttackSpeed, 1.3)]),
    upgrade!("critChance_r", "Deadly Aim", "+12% critical chance", Weapon, Rare, true, [Add(CritChance, 0.12)]),
    upgrade!("critDamage_r", "Brutal Force", "+50% critical damage", Weapon, Rare, true, [Add(CritDamage, 0.5)]),
    upgrade!("multishot_r", "Multi-Shot", "Fire +1 arrow at once", Weapon, Rare, true, [AddProjectiles(1)]),
    upgrade!("health_r", "Stone Walls", "+65 max health", Defense, Rare, true, [Add(MaxHealth, 65.0)]),
    upgrade!("armor_r", "Steel Fortress", "-18% damage taken", Defense, Rare, true, [Add(Armor, 0.18)]),
    upgrade!("regen_r", "Healing Aura", "Regenerate 1.5 HP/sec", Defense, Rare, true, [Add(Regen, 1.5)]),
    upgrade!("thorns_r", "Thorns", "Deal 20 damage when hit", Defense, Rare, true, [Add(Thorns, 20.0)]),
    upgrade!("fireball_r", "Fireball", "Unlock explosive fireballs", Magic, Rare, false, [Unlock(Ability::Fireball)]),
    upgrade!("freeze_r", "Frost Nova", "35% chance to slow enemies", Magic, Rare, false, [AddCapped { field: FreezeChance, amount: 0.35, cap: 0.7 }]),
    upgrade!("splash_r", "Splash Damage", "Arrows deal 40% damage to nearby enemies", Magic, Rare, false, [Add(SplashDamage, 0.4)]),
    upgrade!("execute_r", "Execute", "Deal +75% damage to enemies below 25% HP", Weapon, Rare, false, [Add(ExecuteDamage, 0.75)]),
    upgrade!("reflect_r", "Magic Mirror", "Reflect 30% of ranged damage", Defense, Rare, false, [Add(ReflectDamage, 0.3)]),
    // Epic
    upgrade!("damage_e", "Dragon Arrows", "+65% arrow damage", Weapon, Epic, true, [Scale(Damage, 1.65)]),
    upgrade!("critChance_e", "Assassin's Mark", "+18% critical chance", Weapon, Epic, true, [Add(CritChance, 0.18)]),
    upgrade!("critDamage_e", "Executioner", "+100% critical damage", Weapon, Epic, true, [Add(CritDamage, 1.0)]),
    upgrade!("health_e", "Titan Walls", "+100 max health", Defense, Epic, true, [Add(MaxHealth, 100.0)]),
    upgrade!("lifeSteal_e", "Vampiric Arrows", "Heal 8% of damage dealt", Defense, Epic, false, [Add(LifeSteal, 0.08)]),
    upgrade!("lightning_e", "Chain Lightning", "Lightning chains between enemies", Magic, Epic, false, [Unlock(Ability::Lightning)]),
    upgrade!("explosion_e", "Explosive Arrows", "Arrows explode on impact", Magic, Epic, false, [Unlock(Ability::ExplosiveArrows)]),
    upgrade!("berserker_e", "Berserker", "+1.5% damage per 1% missing health", Weapon, Epic, false, [Unlock(Ability::Berserker)]),
    upgrade!("guardian_e", "Guardian Angel", "Survive lethal damage once per wave", Defense, Epic, false, [Unlock(Ability::Guardian)]),
    upgrade!("gold_rush_e", "Midas Touch", "+65% gold from all sources", Utility, Epic, false, [Scale(GoldMultiplier, 1.65)]),
    upgrade!("garrison_e", "Castle Garrison", "A guard permanently defends your castle", Defense, Epic, true, [AddGarrison]),
    // Legendary
    upgrade!("damage_l", "Divine Arrows", "+125% arrow damage", Weapon, Legendary, false, [Scale(Damage, 2.25)]),
    upgrade!("multishot_l", "Arrow Storm", "Fire +4 arrows at once", Weapon, Legendary, false, [AddProjectiles(4)]),
    upgrade!("invincible_l", "Divine Shield", "25% chance to block all damage", Defense, Legendary, false, [Add(BlockChance, 0.25)]),
    upgrade!("health_l", "Eternal Fortress", "+200 max health", Defense, Legendary, false, [Add(MaxHealth, 200.0)]),
    upgrade!("meteor_l", "Meteor Strike", "Meteors rain on enemies", Magic, Legendary, false, [Unlock(Ability::Meteor)]),
    upgrade!("vortex_l", "Void Vortex", "Pull enemies together", Magic, Legendary, false, [Unlock(Ability::Vortex)]),
    upgrade!("infinity_l", "Infinity", "Every 4th arrow deals triple damage", Weapon, Legendary, false, [Unlock(Ability::Infinity)]),
    upgrade!("phoenix_l", "Phoenix Heart", "Revive once with 75% health when killed", Defense, Legendary, false, [Unlock(Ability::Phoenix)]),
    upgrade!("time_lord_l", "Time Lord", "Enemies move 35% slower permanently", Magic, Legendary, false, [Scale(EnemySlowAura, 0.65)]),
    // Mythic (golden box only)
    upgrade!("godslayer_m", "Godslayer", "+250% damage, +60% crit chance", Weapon, Mythic, false, [Scale(Damage, 3.5), Add(CritChance, 0.6)]),
    upgrade!("immortal_m", "Immortal", "+400 max HP, regenerate 8 HP per second", Defense, Mythic, false, [Add(MaxHealth, 400.0), Add(Regen, 8.0)]),
    upgrade!("archmage_m", "Archmage", "All magic effects deal 2.5x damage", Magic, Mythic, false, [Scale(MagicDamageMultiplier, 2.5)]),
    upgrade!("golden_god_m", "Golden God", "+150% gold, enemies drop bonus gold on death", Utility, Mythic, false, [Scale(GoldMultiplier, 2.5), Add(BonusGoldOnKill, 15.0)]),
    upgrade!("omega_m", "Omega", "Fire 6 extra projectiles, +150% fire rate", Weapon, Mythic, false, [AddProjectiles(6), Scale(AttackSpeed, 2.5)]),
    upgrade!("world_ender_m", "World Ender", "Enemies explode on death dealing 65% of their max HP to nearby", Magic, Mythic, false, [Unlock(Ability::DeathExplosion)]),
];

/// Look up an upgrade by id
pub fn upgrade(id: &str) -> Option<&'static UpgradeDef> {
    UPGRADES.iter().find(|u| u.id == id)
}

impl UpgradeDef {
    /// Whether this upgrade may still be offered given what has been earned
    pub fn is_available(&self, earned: &[String]) -> bool {
        self.repeatable || !earned.iter().any(|id| id == self.id)
    }

    /// Grants a garrison guard (relevant when earned entries are removed)
    pub fn grants_garrison(&self) -> bool {
        self.effects.contains(&StatEffect::AddGarrison)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let mut seen = HashSet::new();
        for upgrade in UPGRADES {
            assert!(seen.insert(upgrade.id), "duplicate id {}", upgrade.id);
        }
    }

    #[test]
    fn test_mythics_are_not_repeatable() {
        assert!(
            UPGRADES
                .iter()
                .filter(|u| u.rarity == Rarity::Mythic)
                .all(|u| !u.repeatable)
        );
        assert_eq!(
            UPGRADES.iter().filter(|u| u.rarity == Rarity::Mythic).count(),
            6
        );
    }

    #[test]
    fn test_availability_respects_repeatable() {
        let earned = vec!["fireball_r".to_string(), "damage_c".to_string()];
        assert!(!upgrade("fireball_r").is_some_and(|u| u.is_available(&earned)));
        assert!(upgrade("damage_c").is_some_and(|u| u.is_available(&earned)));
        assert!(upgrade("garrison_e").is_some_and(|u| u.grants_garrison()));
        assert!(upgrade("nope").is_none());
    }
}
