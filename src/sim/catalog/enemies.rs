//! Enemy archetypes

use serde::{Deserialize, Serialize};

/// Static stats for one archetype (before wave/difficulty scaling)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyDef {
    pub name: &'static str,
    pub base_health: f64,
    pub base_damage: f64,
    /// Movement per 60 Hz tick
    pub speed: f64,
    /// Gold value before multipliers
    pub value: f64,
    /// Attack reach for ranged archetypes; melee enemies use `MELEE_RANGE`
    pub ranged_reach: Option<f64>,
    pub is_boss: bool,
    /// Render scale
    pub size: f64,
    /// Damage ramps in over the first fifteen waves
    pub damage_ramps: bool,
}

impl EnemyDef {
    const fn melee(name: &'static str, health: f64, damage: f64, speed: f64, value: f64) -> Self {
        Self {
            name,
            base_health: health,
            base_damage: damage,
            speed,
            value,
            ranged_reach: None,
            is_boss: false,
            size: 1.0,
            damage_ramps: false,
        }
    }

    const fn ranged(self, reach: f64) -> Self {
        Self {
            ranged_reach: Some(reach),
            ..self
        }
    }

    const fn boss(self, size: f64) -> Self {
        Self {
            is_boss: true,
            size,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnemyKind {
    Orc,
    Goblin,
    Troll,
    Ogre,
    DarkMage,
    Skeleton,
    Dragon,
    /// Orc Warlord, the first boss
    Boss,
    Vampire,
    Ghost,
    Demon,
    Necromancer,
    Golem,
    Assassin,
    Witch,
    Zombie,
    Bat,
    Spider,
    Wolf,
    Bear,
    Snake,
    OrcChampion,
    TrollKing,
    ElderDragon,
    LichLord,
    DemonLord,
    Titan,
    WorldEater,
}

const ORC: EnemyDef = EnemyDef {
    damage_ramps: true,
    ..EnemyDef::melee("Orc", 20.0, 2.0, 1.2, 1.0)
};
const GOBLIN: EnemyDef = EnemyDef::melee("Goblin Archer", 12.0, 3.0, 1.6, 1.0).ranged(150.0);
const TROLL: EnemyDef = EnemyDef::melee("Troll", 50.0, 8.0, 0.7, 3.0);
const OGRE: EnemyDef = EnemyDef::melee("Ogre", 65.0, 10.0, 0.6, 4.0);
const DARK_MAGE: EnemyDef = EnemyDef::melee("Dark Mage", 28.0, 7.0, 0.9, 3.0).ranged(200.0);
const SKELETON: EnemyDef = EnemyDef::melee("Skeleton Warrior", 16.0, 5.0, 1.5, 2.0);
const DRAGON: EnemyDef = EnemyDef::melee("Young Dragon", 120.0, 15.0, 0.8, 8.0);
const WARLORD: EnemyDef = EnemyDef::melee("Orc Warlord", 150.0, 12.0, 0.5, 10.0);
const VAMPIRE: EnemyDef = EnemyDef::melee("Vampire", 35.0, 6.0, 1.3, 4.0);
const GHOST: EnemyDef = EnemyDef::melee("Wraith", 22.0, 5.0, 1.8, 3.0);
const DEMON: EnemyDef = EnemyDef::melee("Demon", 80.0, 14.0, 0.9, 6.0);
const NECROMANCER: EnemyDef = EnemyDef::melee("Necromancer", 40.0, 9.0, 0.7, 5.0).ranged(180.0);
const GOLEM: EnemyDef = EnemyDef::melee("Stone Golem", 150.0, 18.0, 0.4, 7.0);
const ASSASSIN: EnemyDef = EnemyDef::melee("Shadow Assassin", 18.0, 12.0, 2.0, 4.0);
const WITCH: EnemyDef = EnemyDef::melee("Swamp Witch", 32.0, 8.0, 0.85, 4.0).ranged(170.0);
const ZOMBIE: EnemyDef = EnemyDef::melee("Undead Horde", 25.0, 4.0, 0.6, 2.0);
const BAT: EnemyDef = EnemyDef::melee("Giant Bat", 14.0, 3.0, 2.2, 2.0);
const SPIDER: EnemyDef = EnemyDef::melee("Giant Spider", 20.0, 6.0, 1.7, 3.0);
const WOLF: EnemyDef = EnemyDef::melee("Dire Wolf", 35.0, 7.0, 1.8, 3.0);
const BEAR: EnemyDef = EnemyDef::melee("Cave Bear", 90.0, 12.0, 0.7, 5.0);
const SNAKE: EnemyDef = EnemyDef::melee("Serpent", 18.0, 10.0, 1.5, 3.0);
const ORC_CHAMPION: EnemyDef = EnemyDef::melee("Orc Champion", 250.0, 18.0, 0.55, 15.0).boss(1.5);
const TROLL_KING: EnemyDef = EnemyDef::melee("Troll King", 400.0, 25.0, 0.45, 25.0).boss(1.8);
const ELDER_DRAGON: EnemyDef = EnemyDef::melee("Elder Dragon", 600.0, 35.0, 0.5, 40.0).boss(2.2);
const LICH_LORD: EnemyDef = EnemyDef::melee("Lich Lord", 350.0, 20.0, 0.4, 30.0)
    .boss(1.6)
    .ranged(200.0);
const DEMON_LORD: EnemyDef = EnemyDef::melee("Demon Lord", 800.0, 40.0, 0.35, 50.0).boss(2.5);
const TITAN: EnemyDef = EnemyDef::melee("Ancient Titan", 1500.0, 60.0, 0.25, 100.0).boss(3.0);
const WORLD_EATER: EnemyDef = EnemyDef::melee("World Eater", 2000.0, 80.0, 0.3, 150.0).boss(3.5);

impl EnemyKind {
    pub fn def(self) -> &'static EnemyDef {
        match self {
            EnemyKind::Orc => &ORC,
            EnemyKind::Goblin => &GOBLIN,
            EnemyKind::Troll => &TROLL,
            EnemyKind::Ogre => &OGRE,
            EnemyKind::DarkMage => &DARK_MAGE,
            EnemyKind::Skeleton => &SKELETON,
            EnemyKind::Dragon => &DRAGON,
            EnemyKind::Boss => &WARLORD,
            EnemyKind::Vampire => &VAMPIRE,
            EnemyKind::Ghost => &GHOST,
            EnemyKind::Demon => &DEMON,
            EnemyKind::Necromancer => &NECROMANCER,
            EnemyKind::Golem => &GOLEM,
            EnemyKind::Assassin => &ASSASSIN,
            EnemyKind::Witch => &WITCH,
            EnemyKind::Zombie => &ZOMBIE,
            EnemyKind::Bat => &BAT,
            EnemyKind::Spider => &SPIDER,
            EnemyKind::Wolf => &WOLF,
            EnemyKind::Bear => &BEAR,
            EnemyKind::Snake => &SNAKE,
            EnemyKind::OrcChampion => &ORC_CHAMPION,
            EnemyKind::TrollKing => &TROLL_KING,
            EnemyKind::ElderDragon => &ELDER_DRAGON,
            EnemyKind::LichLord => &LICH_LORD,
            EnemyKind::DemonLord => &DEMON_LORD,
            EnemyKind::Titan => &TITAN,
            EnemyKind::WorldEater => &WORLD_EATER,
        }
    }

    /// Kills of these play the heavier kill cue
    pub fn is_heavy(self) -> bool {
        matches!(self, EnemyKind::Boss | EnemyKind::Dragon) || self.def().is_boss
    }

    /// Main boss for a boss wave
    pub fn wave_boss(wave: u32) -> EnemyKind {
        match wave {
            100.. => EnemyKind::WorldEater,
            75.. => EnemyKind::Titan,
            50.. => EnemyKind::DemonLord,
            40.. => EnemyKind::LichLord,
            30.. => EnemyKind::ElderDragon,
            20.. => EnemyKind::TrollKing,
            10.. => EnemyKind::OrcChampion,
            _ => EnemyKind::Boss,
        }
    }

    /// Escort bosses added every fifteen waves
    pub fn escort_boss(wave: u32) -> EnemyKind {
        match wave {
            45.. => EnemyKind::TrollKing,
            30.. => EnemyKind::OrcChampion,
            _ => EnemyKind::Boss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boss_tiers_follow_wave_thresholds() {
        assert_eq!(EnemyKind::wave_boss(5), EnemyKind::Boss);
        assert_eq!(EnemyKind::wave_boss(10), EnemyKind::OrcChampion);
        assert_eq!(EnemyKind::wave_boss(35), EnemyKind::ElderDragon);
        assert_eq!(EnemyKind::wave_boss(75), EnemyKind::Titan);
        assert_eq!(EnemyKind::wave_boss(120), EnemyKind::WorldEater);
        assert_eq!(EnemyKind::escort_boss(15), EnemyKind::Boss);
        assert_eq!(EnemyKind::escort_boss(45), EnemyKind::TrollKing);
    }

    #[test]
    fn ranged_archetypes_carry_reach() {
        assert_eq!(EnemyKind::Goblin.def().ranged_reach, Some(150.0));
        assert_eq!(EnemyKind::LichLord.def().ranged_reach, Some(200.0));
        assert!(EnemyKind::LichLord.def().is_boss);
        assert!(EnemyKind::Orc.def().damage_ramps);
        assert_eq!(EnemyKind::Troll.def().ranged_reach, None);
    }
}
