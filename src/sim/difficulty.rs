//! Difficulty scaling
//!
//! Pure functions of castle stats, wave number and the difficulty slider.
//! The compositions below are multiplicative and order-sensitive; keep them
//! exactly as written.

use serde::{Deserialize, Serialize};

use super::catalog::{EnemyDef, upgrade};
use super::stats::CastleStats;
use crate::is_boss_wave;
use crate::settings::Difficulty;

/// Raw power of a fresh castle
pub const BASE_POWER: f64 = 219.0;

/// Raw power contributed per held action card
pub const CARD_POWER: f64 = 15.0;

/// Raw power for earned upgrades whose id is not in the catalog
pub const UNKNOWN_UPGRADE_POWER: f64 = 8.0;

/// Weight for the magic multiplier term. Kept at zero: the power formula this
/// balance was tuned against never counted the magic multiplier.
const MAGIC_POWER_WEIGHT: f64 = 0.0;

fn flag(on: bool, weight: f64) -> f64 {
    if on { weight } else { 0.0 }
}

/// Weighted sum of every stat plus held cards and earned upgrades, floored
pub fn raw_power(stats: &CastleStats, earned: &[String], deck_len: usize) -> f64 {
    let mut power = 0.0;

    // Offense
    power += stats.damage * 2.0;
    power += stats.attack_speed * 30.0;
    power += f64::from(stats.projectiles) * 25.0;
    power += stats.crit_chance * 100.0;
    power += (stats.crit_damage - 1.0) * 50.0;
    power += (stats.damage_multiplier - 1.0) * 100.0;
    power += flag(stats.has_fireball, 50.0);
    power += flag(stats.has_lightning, 60.0);
    power += flag(stats.has_meteor, 80.0);
    power += stats.freeze_chance * 80.0;
    power += flag(stats.explosive_arrows, 40.0);
    power += stats.splash_damage * 60.0;
    power += (stats.magic_damage_multiplier - 1.0) * MAGIC_POWER_WEIGHT;
    power += flag(stats.death_explosion, 100.0);

    // Defense
    power += stats.max_health * 0.5;
    power += stats.armor * 10.0;
    power += stats.regen * 20.0;
    power += stats.thorns * 15.0;
    power += stats.dodge_chance * 80.0;
    power += stats.reflect_damage * 50.0;
    power += stats.life_steal * 100.0;

    // Economy and range
    power += (stats.gold_multiplier - 1.0) * 30.0;
    power += stats.bonus_gold_on_kill * 15.0;
    power += (stats.attack_range - 1.0) * 40.0;

    power += deck_len as f64 * CARD_POWER;
    for id in earned {
        power += upgrade(id).map_or(UNKNOWN_UPGRADE_POWER, |u| u.rarity.power_weight());
    }

    power.floor()
}

/// Displayed power: 1 at session start, +1 per 15 raw power
pub fn display_power(raw: f64) -> u32 {
    (((raw - BASE_POWER) / 15.0).floor() + 1.0).max(1.0) as u32
}

/// Raw power relative to a fresh castle, clamped to [0.5, 5]
pub fn power_ratio(raw: f64) -> f64 {
    (raw / BASE_POWER).clamp(0.5, 5.0)
}

/// Enemy and economy multipliers for one wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyMultipliers {
    pub enemy_health: f64,
    pub enemy_damage: f64,
    pub gold_reward: f64,
    /// Informational; spawn spacing does not read it
    pub spawn_rate: f64,
    pub wave_scaling: f64,
    pub power_ratio: f64,
    pub boss_late_game: f64,
}

impl DifficultyMultipliers {
    pub fn compute(wave: u32, difficulty: Difficulty, power_ratio: f64) -> Self {
        let w = f64::from(wave);
        let wave_scaling = 1.0 + ((w - 1.0) * 0.015).min(0.6);
        let slider = difficulty.slider_factor();

        // How strongly enemies track player power
        let power_scale = 0.15 + slider * 0.85;
        let capped_ratio = if power_ratio <= 2.5 {
            power_ratio
        } else {
            2.5 + (power_ratio - 2.5) * 0.4
        };
        let power_mult = 1.0 + (capped_ratio - 1.0) * power_scale;

        let boss_late_game = if is_boss_wave(wave) {
            1.0 + f64::from(wave / 10) * 0.12
        } else {
            1.0
        };
        let easy_catch_up = if difficulty.is_easy() && wave > 15 {
            1.0 + (w - 15.0) * 0.008
        } else {
            1.0
        };

        Self {
            enemy_health: (0.4 + slider * 0.5)
                * wave_scaling
                * power_mult
                * boss_late_game
                * easy_catch_up,
            enemy_damage: (0.32 + slider * 0.35)
                * wave_scaling
                * power_mult
                * boss_late_game.sqrt()
                * easy_catch_up,
            gold_reward: 1.8 - slider * 0.5,
            spawn_rate: 1.35 - slider * 0.4,
            wave_scaling,
            power_ratio,
            boss_late_game,
        }
    }
}

/// Repair price multiplier, steps every 10 waves
pub fn shop_price_multiplier(wave: u32) -> f64 {
    1.5_f64.powi((wave / 10) as i32)
}

/// Box price multiplier, steps every 5 waves and softly tracks power
pub fn box_price_multiplier(wave: u32, power_ratio: f64) -> f64 {
    1.25_f64.powi((wave / 5) as i32) * power_ratio.powf(0.35)
}

/// Concrete stats for one enemy spawned on `wave`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledEnemy {
    pub health: f64,
    pub damage: f64,
    pub speed: f64,
}

pub fn scale_enemy(def: &EnemyDef, wave: u32, mult: &DifficultyMultipliers) -> ScaledEnemy {
    let w = f64::from(wave);
    let health_scale = (1.0 + (w - 1.0) * 0.15 + w.powf(1.3) * 0.02) * mult.enemy_health;
    let mut damage_scale = (1.0 + (w - 1.0) * 0.1 + w.powf(1.2) * 0.015) * mult.enemy_damage;
    if def.damage_ramps {
        damage_scale *= ((w - 1.0) / 14.0).clamp(0.3, 1.0);
    }
    let speed_scale = 1.0 + (w * 0.02).min(0.5);
    ScaledEnemy {
        health: def.base_health * health_scale,
        damage: def.base_damage * damage_scale,
        speed: def.speed * speed_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::catalog::EnemyKind;
    use crate::sim::stats::StatField;
    use proptest::prelude::*;

    fn diff(v: u8) -> Difficulty {
        Difficulty::new(v).expect("valid difficulty")
    }

    #[test]
    fn test_fresh_castle_is_base_power() {
        let raw = raw_power(&CastleStats::default(), &[], 0);
        assert_eq!(raw, BASE_POWER);
        assert_eq!(display_power(raw), 1);
        assert_eq!(power_ratio(raw), 1.0);
    }

    #[test]
    fn test_cards_and_upgrades_add_power() {
        let earned = vec!["damage_c".to_string(), "unknown".to_string()];
        let raw = raw_power(&CastleStats::default(), &earned, 2);
        assert_eq!(raw, BASE_POWER + 30.0 + 3.0 + 8.0);
        assert_eq!(display_power(raw), 3);
    }

    #[test]
    fn test_neutral_multipliers_at_wave_one() {
        let m = DifficultyMultipliers::compute(1, diff(1), 1.0);
        assert!((m.enemy_health - 0.4).abs() < 1e-12);
        assert!((m.enemy_damage - 0.32).abs() < 1e-12);
        assert!((m.gold_reward - 1.8).abs() < 1e-12);
        let hard = DifficultyMultipliers::compute(1, diff(10), 1.0);
        assert!((hard.enemy_health - 0.9).abs() < 1e-12);
        assert!((hard.gold_reward - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_boss_and_catch_up_multipliers() {
        let m = DifficultyMultipliers::compute(20, diff(2), 1.0);
        assert!((m.boss_late_game - 1.24).abs() < 1e-12);
        let wave_scaling = 1.0 + 19.0 * 0.015;
        let slider = 1.0 / 9.0;
        let expected = (0.4 + slider * 0.5) * wave_scaling * 1.24 * (1.0 + 5.0 * 0.008);
        assert!((m.enemy_health - expected).abs() < 1e-9);
    }

    #[test]
    fn test_power_ratio_soft_cap() {
        let m = DifficultyMultipliers::compute(1, diff(10), 5.0);
        // capped ratio 3.5, full power scale
        assert!((m.enemy_health - 0.9 * 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_price_multipliers() {
        assert_eq!(shop_price_multiplier(9), 1.0);
        assert_eq!(shop_price_multiplier(25), 2.25);
        assert!((box_price_multiplier(10, 1.0) - 1.5625).abs() < 1e-12);
        assert!(box_price_multiplier(4, 2.0) > 1.0);
    }

    #[test]
    fn test_orc_damage_ramps() {
        let m = DifficultyMultipliers::compute(1, diff(5), 1.0);
        let orc = scale_enemy(EnemyKind::Orc.def(), 1, &m);
        let troll = scale_enemy(EnemyKind::Troll.def(), 1, &m);
        assert!((orc.damage - 2.0 * 1.015 * m.enemy_damage * 0.3).abs() < 1e-9);
        assert!((troll.damage - 8.0 * 1.015 * m.enemy_damage).abs() < 1e-9);
        assert!((orc.speed - 1.2 * 1.02).abs() < 1e-12);
    }

    fn positive_field() -> impl Strategy<Value = StatField> {
        prop::sample::select(vec![
            StatField::Damage,
            StatField::AttackSpeed,
            StatField::CritChance,
            StatField::CritDamage,
            StatField::MaxHealth,
            StatField::Armor,
            StatField::Regen,
            StatField::Thorns,
            StatField::FreezeChance,
            StatField::SplashDamage,
            StatField::GoldMultiplier,
            StatField::BonusGoldOnKill,
            StatField::AttackRange,
            StatField::DodgeChance,
            StatField::ReflectDamage,
            StatField::LifeSteal,
        ])
    }

    proptest! {
        #[test]
        fn prop_display_power_is_monotonic(
            field in positive_field(),
            a in 0.0f64..50.0,
            b in 0.0f64..50.0,
        ) {
            use crate::sim::catalog::StatEffect;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let mut low = CastleStats::default();
            low.apply_effect(&StatEffect::Add(field, lo));
            let mut high = CastleStats::default();
            high.apply_effect(&StatEffect::Add(field, hi));
            let p_low = display_power(raw_power(&low, &[], 0));
            let p_high = display_power(raw_power(&high, &[], 0));
            prop_assert!(p_low <= p_high);
            prop_assert!(p_low >= 1);
        }
    }
}
