//! Castle stat model
//!
//! Base stats are mutated in place when upgrades are earned. Curses never touch
//! them: they compose into a separate [`DebuffOverlay`] that is read at the
//! point of use, so removing a curse divides/subtracts exactly what it applied.
//! Transient buffs go through `damage_multiplier` (and `invincible`).

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::catalog::StatEffect;
use crate::consts::{CASTLE_RANGE_FRACTION, CASTLE_START_HEALTH};

/// Overlay values within this distance of neutral snap back to neutral
pub const OVERLAY_SNAP: f64 = 0.01;

/// Numeric castle stats an upgrade can scale or add to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatField {
    MaxHealth,
    Damage,
    AttackSpeed,
    AttackRange,
    CritChance,
    CritDamage,
    Armor,
    Regen,
    Thorns,
    FreezeChance,
    SplashDamage,
    GoldMultiplier,
    BonusGoldOnKill,
    MagicDamageMultiplier,
    LifeSteal,
    BlockChance,
    DodgeChance,
    ReflectDamage,
    EnemySlowAura,
    PoisonDamage,
    ExecuteDamage,
}

/// Boolean unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Fireball,
    Lightning,
    Meteor,
    ExplosiveArrows,
    Vortex,
    Infinity,
    Phoenix,
    Guardian,
    Berserker,
    DeathExplosion,
}

/// Overlay slot a timed curse writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKey {
    DamageDebuffMult,
    AttackSpeedDebuffMult,
    ArmorDebuff,
    CritChanceDebuff,
    EnemySpeedDebuff,
    EnemyDamageDebuff,
}

impl StatKey {
    /// Multiplicative keys compose by product, the rest by sum
    pub fn is_multiplicative(self) -> bool {
        !matches!(self, StatKey::ArmorDebuff | StatKey::CritChanceDebuff)
    }

    pub fn neutral(self) -> f64 {
        if self.is_multiplicative() { 1.0 } else { 0.0 }
    }
}

/// Composed curse modifiers, all neutral by default
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebuffOverlay {
    pub damage_debuff_mult: f64,
    pub attack_speed_debuff_mult: f64,
    pub armor_debuff: f64,
    pub crit_chance_debuff: f64,
    pub enemy_speed_debuff: f64,
    pub enemy_damage_debuff: f64,
}

impl Default for DebuffOverlay {
    fn default() -> Self {
        Self {
            damage_debuff_mult: 1.0,
            attack_speed_debuff_mult: 1.0,
            armor_debuff: 0.0,
            crit_chance_debuff: 0.0,
            enemy_speed_debuff: 1.0,
            enemy_damage_debuff: 1.0,
        }
    }
}

impl DebuffOverlay {
    pub fn get(&self, key: StatKey) -> f64 {
        match key {
            StatKey::DamageDebuffMult => self.damage_debuff_mult,
            StatKey::AttackSpeedDebuffMult => self.attack_speed_debuff_mult,
            StatKey::ArmorDebuff => self.armor_debuff,
            StatKey::CritChanceDebuff => self.crit_chance_debuff,
            StatKey::EnemySpeedDebuff => self.enemy_speed_debuff,
            StatKey::EnemyDamageDebuff => self.enemy_damage_debuff,
        }
    }

    fn slot(&mut self, key: StatKey) -> &mut f64 {
        match key {
            StatKey::DamageDebuffMult => &mut self.damage_debuff_mult,
            StatKey::AttackSpeedDebuffMult => &mut self.attack_speed_debuff_mult,
            StatKey::ArmorDebuff => &mut self.armor_debuff,
            StatKey::CritChanceDebuff => &mut self.crit_chance_debuff,
            StatKey::EnemySpeedDebuff => &mut self.enemy_speed_debuff,
            StatKey::EnemyDamageDebuff => &mut self.enemy_damage_debuff,
        }
    }

    /// Compose a curse value into its slot
    pub fn apply(&mut self, key: StatKey, value: f64) {
        let slot = self.slot(key);
        if key.is_multiplicative() {
            *slot *= value;
        } else {
            *slot += value;
        }
    }

    /// Reverse exactly what `apply` did with the same stored value
    pub fn remove(&mut self, key: StatKey, value: f64) {
        let neutral = key.neutral();
        let slot = self.slot(key);
        if key.is_multiplicative() {
            if value != 0.0 {
                *slot /= value;
            }
        } else {
            *slot = (*slot - value).max(0.0);
        }
        if (*slot - neutral).abs() < OVERLAY_SNAP {
            *slot = neutral;
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// All castle stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastleStats {
    pub max_health: f64,
    pub damage: f64,
    /// Shots per second
    pub attack_speed: f64,
    /// Multiplier on the base targeting radius
    pub attack_range: f64,
    pub projectiles: u32,
    pub crit_chance: f64,
    pub crit_damage: f64,
    /// Fraction of incoming damage removed
    pub armor: f64,
    /// Health per second
    pub regen: f64,
    pub thorns: f64,
    pub freeze_chance: f64,
    pub has_fireball: bool,
    pub has_lightning: bool,
    pub has_meteor: bool,
    pub explosive_arrows: bool,
    pub has_vortex: bool,
    pub has_infinity: bool,
    pub has_phoenix: bool,
    pub has_guardian: bool,
    pub has_berserker: bool,
    pub death_explosion: bool,
    pub ricochet: u32,
    pub splash_damage: f64,
    pub gold_multiplier: f64,
    pub bonus_gold_on_kill: f64,
    pub magic_damage_multiplier: f64,
    pub life_steal: f64,
    pub block_chance: f64,
    pub dodge_chance: f64,
    pub reflect_damage: f64,
    /// Permanent enemy speed multiplier
    pub enemy_slow_aura: f64,
    pub poison_damage: f64,
    pub execute_damage: f64,
    pub garrison_count: u32,
    /// Transient buff multiplier (battle cry, phoenix rebirth)
    pub damage_multiplier: f64,
    /// Transient divine shield
    pub invincible: bool,
    pub overlay: DebuffOverlay,
}

impl Default for CastleStats {
    fn default() -> Self {
        Self {
            max_health: CASTLE_START_HEALTH,
            damage: 25.0,
            attack_speed: 1.3,
            attack_range: 1.0,
            projectiles: 1,
            crit_chance: 0.05,
            crit_damage: 1.5,
            armor: 0.0,
            regen: 0.0,
            thorns: 0.0,
            freeze_chance: 0.0,
            has_fireball: false,
            has_lightning: false,
            has_meteor: false,
            explosive_arrows: false,
            has_vortex: false,
            has_infinity: false,
            has_phoenix: false,
            has_guardian: false,
            has_berserker: false,
            death_explosion: false,
            ricochet: 0,
            splash_damage: 0.0,
            gold_multiplier: 1.0,
            bonus_gold_on_kill: 0.0,
            magic_damage_multiplier: 1.0,
            life_steal: 0.0,
            block_chance: 0.0,
            dodge_chance: 0.0,
            reflect_damage: 0.0,
            enemy_slow_aura: 1.0,
            poison_damage: 0.0,
            execute_damage: 0.0,
            garrison_count: 0,
            damage_multiplier: 1.0,
            invincible: false,
            overlay: DebuffOverlay::default(),
        }
    }
}

impl CastleStats {
    pub fn get(&self, field: StatField) -> f64 {
        match field {
            StatField::MaxHealth => self.max_health,
            StatField::Damage => self.damage,
            StatField::AttackSpeed => self.attack_speed,
            StatField::AttackRange => self.attack_range,
            StatField::CritChance => self.crit_chance,
            StatField::CritDamage => self.crit_damage,
            StatField::Armor => self.armor,
            StatField::Regen => self.regen,
            StatField::Thorns => self.thorns,
            StatField::FreezeChance => self.freeze_chance,
            StatField::SplashDamage => self.splash_damage,
            StatField::GoldMultiplier => self.gold_multiplier,
            StatField::BonusGoldOnKill => self.bonus_gold_on_kill,
            StatField::MagicDamageMultiplier => self.magic_damage_multiplier,
            StatField::LifeSteal => self.life_steal,
            StatField::BlockChance => self.block_chance,
            StatField::DodgeChance => self.dodge_chance,
            StatField::ReflectDamage => self.reflect_damage,
            StatField::EnemySlowAura => self.enemy_slow_aura,
            StatField::PoisonDamage => self.poison_damage,
            StatField::ExecuteDamage => self.execute_damage,
        }
    }

    fn field_mut(&mut self, field: StatField) -> &mut f64 {
        match field {
            StatField::MaxHealth => &mut self.max_health,
            StatField::Damage => &mut self.damage,
            StatField::AttackSpeed => &mut self.attack_speed,
            StatField::AttackRange => &mut self.attack_range,
            StatField::CritChance => &mut self.crit_chance,
            StatField::CritDamage => &mut self.crit_damage,
            StatField::Armor => &mut self.armor,
            StatField::Regen => &mut self.regen,
            StatField::Thorns => &mut self.thorns,
            StatField::FreezeChance => &mut self.freeze_chance,
            StatField::SplashDamage => &mut self.splash_damage,
            StatField::GoldMultiplier => &mut self.gold_multiplier,
            StatField::BonusGoldOnKill => &mut self.bonus_gold_on_kill,
            StatField::MagicDamageMultiplier => &mut self.magic_damage_multiplier,
            StatField::LifeSteal => &mut self.life_steal,
            StatField::BlockChance => &mut self.block_chance,
            StatField::DodgeChance => &mut self.dodge_chance,
            StatField::ReflectDamage => &mut self.reflect_damage,
            StatField::EnemySlowAura => &mut self.enemy_slow_aura,
            StatField::PoisonDamage => &mut self.poison_damage,
            StatField::ExecuteDamage => &mut self.execute_damage,
        }
    }

    pub fn has(&self, ability: Ability) -> bool {
        match ability {
            Ability::Fireball => self.has_fireball,
            Ability::Lightning => self.has_lightning,
            Ability::Meteor => self.has_meteor,
            Ability::ExplosiveArrows => self.explosive_arrows,
            Ability::Vortex => self.has_vortex,
            Ability::Infinity => self.has_infinity,
            Ability::Phoenix => self.has_phoenix,
            Ability::Guardian => self.has_guardian,
            Ability::Berserker => self.has_berserker,
            Ability::DeathExplosion => self.death_explosion,
        }
    }

    fn unlock(&mut self, ability: Ability) {
        let flag = match ability {
            Ability::Fireball => &mut self.has_fireball,
            Ability::Lightning => &mut self.has_lightning,
            Ability::Meteor => &mut self.has_meteor,
            Ability::ExplosiveArrows => &mut self.explosive_arrows,
            Ability::Vortex => &mut self.has_vortex,
            Ability::Infinity => &mut self.has_infinity,
            Ability::Phoenix => &mut self.has_phoenix,
            Ability::Guardian => &mut self.has_guardian,
            Ability::Berserker => &mut self.has_berserker,
            Ability::DeathExplosion => &mut self.death_explosion,
        };
        *flag = true;
    }

    /// Apply one upgrade effect to the base stats
    pub fn apply_effect(&mut self, effect: &StatEffect) {
        match *effect {
            StatEffect::Scale(field, factor) => *self.field_mut(field) *= factor,
            StatEffect::Add(field, amount) => *self.field_mut(field) += amount,
            StatEffect::AddCapped { field, amount, cap } => {
                let slot = self.field_mut(field);
                *slot = (*slot + amount).min(cap);
            }
            StatEffect::Unlock(ability) => self.unlock(ability),
            StatEffect::AddProjectiles(n) => self.projectiles += n,
            StatEffect::AddRicochet(n) => self.ricochet += n,
            StatEffect::AddGarrison => self.garrison_count += 1,
        }
    }

    /// Arrow damage: base × curse overlay × transient buff
    pub fn effective_damage(&self) -> f64 {
        self.damage * self.overlay.damage_debuff_mult * self.damage_multiplier
    }

    pub fn effective_attack_speed(&self) -> f64 {
        self.attack_speed * self.overlay.attack_speed_debuff_mult
    }

    /// Milliseconds between volleys
    pub fn attack_interval_ms(&self) -> f64 {
        1000.0 / self.effective_attack_speed()
    }

    pub fn effective_armor(&self) -> f64 {
        (self.armor - self.overlay.armor_debuff).max(0.0)
    }

    pub fn effective_crit_chance(&self) -> f64 {
        (self.crit_chance - self.overlay.crit_chance_debuff).max(0.0)
    }

    /// Multiplier on every enemy's movement
    pub fn enemy_speed_factor(&self) -> f64 {
        self.overlay.enemy_speed_debuff * self.enemy_slow_aura
    }

    pub fn enemy_damage_factor(&self) -> f64 {
        self.overlay.enemy_damage_debuff
    }

    /// Targeting radius for an arena of the given size
    pub fn attack_range_px(&self, arena: DVec2) -> f64 {
        arena.x.min(arena.y) * CASTLE_RANGE_FRACTION * self.attack_range
    }

    /// +1.5% damage per 1% missing health when berserker is unlocked
    pub fn berserker_multiplier(&self, health: f64) -> f64 {
        if !self.has_berserker || self.max_health <= 0.0 {
            return 1.0;
        }
        let missing = (1.0 - health / self.max_health).clamp(0.0, 1.0);
        1.0 + missing * 1.5
    }
}
