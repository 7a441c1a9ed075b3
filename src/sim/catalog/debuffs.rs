//! Curses: timed stat overlays and one-shot penalties

use serde::{Deserialize, Serialize};

use crate::sim::stats::StatKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Devastating,
}

/// One-shot penalties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InstantDebuff {
    /// Lower max health (floored at 50) and clamp current health
    ReduceMaxHealth(f64),
    /// Keep only this fraction of current gold (rounded down)
    KeepGold(f64),
    /// Direct castle damage that can never kill (floored at 1)
    Damage(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DebuffEffect {
    /// Composed into the overlay for `waves` completed waves, then reversed
    Overlay { key: StatKey, value: f64, waves: u32 },
    Instant(InstantDebuff),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebuffDef {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    pub severity: Severity,
    pub effect: DebuffEffect,
}

impl DebuffDef {
    pub fn is_instant(&self) -> bool {
        matches!(self.effect, DebuffEffect::Instant(_))
    }

    /// Remaining-wave count for timed curses
    pub fn wave_duration(&self) -> Option<u32> {
        match self.effect {
            DebuffEffect::Overlay { waves, .. } => Some(waves),
            DebuffEffect::Instant(_) => None,
        }
    }
}

const fn overlay(key: StatKey, value: f64, waves: u32) -> DebuffEffect {
    DebuffEffect::Overlay { key, value, waves }
}

/// Curses offered in place of end-of-wave upgrades
pub static DEBUFFS: &[DebuffDef] = &[
    DebuffDef {
        id: "rusty_arrows",
        name: "Rusty Arrows",
        desc: "-15% arrow damage (8 waves)",
        severity: Severity::Minor,
        effect: overlay(StatKey::DamageDebuffMult, 0.85, 8),
    },
    DebuffDef {
        id: "sluggish",
        name: "Sluggish",
        desc: "-12% attack speed (8 waves)",
        severity: Severity::Minor,
        effect: overlay(StatKey::AttackSpeedDebuffMult, 0.88, 8),
    },
    DebuffDef {
        id: "cracked_walls",
        name: "Cracked Walls",
        desc: "-20 max health",
        severity: Severity::Minor,
        effect: DebuffEffect::Instant(InstantDebuff::ReduceMaxHealth(20.0)),
    },
    DebuffDef {
        id: "weak_armor",
        name: "Weak Armor",
        desc: "+8% damage taken (8 waves)",
        severity: Severity::Minor,
        effect: overlay(StatKey::ArmorDebuff, 0.08, 8),
    },
    DebuffDef {
        id: "blurry_vision",
        name: "Blurry Vision",
        desc: "-8% critical chance (8 waves)",
        severity: Severity::Minor,
        effect: overlay(StatKey::CritChanceDebuff, 0.08, 8),
    },
    DebuffDef {
        id: "enemy_haste",
        name: "Enemy Haste",
        desc: "Enemies move 20% faster (5 waves)",
        severity: Severity::Moderate,
        effect: overlay(StatKey::EnemySpeedDebuff, 1.2, 5),
    },
    DebuffDef {
        id: "gold_tax",
        name: "Gold Tax",
        desc: "Lose 30% of current gold",
        severity: Severity::Moderate,
        effect: DebuffEffect::Instant(InstantDebuff::KeepGold(0.7)),
    },
    DebuffDef {
        id: "frail_castle",
        name: "Frail Castle",
        desc: "-40 max health",
        severity: Severity::Moderate,
        effect: DebuffEffect::Instant(InstantDebuff::ReduceMaxHealth(40.0)),
    },
    DebuffDef {
        id: "dull_blades",
        name: "Dull Blades",
        desc: "-25% arrow damage (5 waves)",
        severity: Severity::Moderate,
        effect: overlay(StatKey::DamageDebuffMult, 0.75, 5),
    },
    DebuffDef {
        id: "slow_reflexes",
        name: "Slow Reflexes",
        desc: "-20% attack speed (5 waves)",
        severity: Severity::Moderate,
        effect: overlay(StatKey::AttackSpeedDebuffMult, 0.8, 5),
    },
];

/// Curses that only come out of mystery boxes
pub static DEVASTATING_DEBUFFS: &[DebuffDef] = &[
    DebuffDef {
        id: "cursed_gold",
        name: "Cursed Gold",
        desc: "Lose 70% of all gold",
        severity: Severity::Devastating,
        effect: DebuffEffect::Instant(InstantDebuff::KeepGold(0.3)),
    },
    DebuffDef {
        id: "shattered_walls",
        name: "Shattered Walls",
        desc: "-100 max health",
        severity: Severity::Devastating,
        effect: DebuffEffect::Instant(InstantDebuff::ReduceMaxHealth(100.0)),
    },
    DebuffDef {
        id: "weakened_arms",
        name: "Weakened Arms",
        desc: "-50% arrow damage (3 waves)",
        severity: Severity::Devastating,
        effect: overlay(StatKey::DamageDebuffMult, 0.5, 3),
    },
    DebuffDef {
        id: "broken_bow",
        name: "Broken Bow",
        desc: "-45% attack speed (3 waves)",
        severity: Severity::Devastating,
        effect: overlay(StatKey::AttackSpeedDebuffMult, 0.55, 3),
    },
    DebuffDef {
        id: "enemy_fury",
        name: "Enemy Fury",
        desc: "Enemies deal +40% damage (3 waves)",
        severity: Severity::Devastating,
        effect: overlay(StatKey::EnemyDamageDebuff, 1.4, 3),
    },
    DebuffDef {
        id: "doom_curse",
        name: "Doom Curse",
        desc: "Take 70 damage immediately",
        severity: Severity::Devastating,
        effect: DebuffEffect::Instant(InstantDebuff::Damage(70.0)),
    },
];

/// Look up a curse in either pool
pub fn debuff(id: &str) -> Option<&'static DebuffDef> {
    DEBUFFS
        .iter()
        .chain(DEVASTATING_DEBUFFS)
        .find(|d| d.id == id)
}
