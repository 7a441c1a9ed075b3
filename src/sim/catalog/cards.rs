//! One-shot action cards

use serde::{Deserialize, Serialize};

use super::Rarity;

/// What an action card does when played
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CardEffect {
    /// Fire this many arrows at random live enemies
    ArrowVolley(u32),
    Heal(f64),
    /// Push every enemy away from the castle and slow it
    ShieldBash,
    /// Fireballs at the nearest enemies
    MultiFireball(u32),
    FreezeAll { ms: f64 },
    /// Double-damage strikes on the first enemies in the arena
    LightningStorm(u32),
    DragonBreath(f64),
    Invincibility { ms: f64 },
    TimeWarp { ms: f64 },
    Apocalypse(f64),
    PhoenixRebirth,
    GoldRush(u32),
    BattleCry { ms: f64, multiplier: f64 },
    PoisonCloud { per_second: f64, ms: f64 },
    SummonKnight { ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionCardDef {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    pub rarity: Rarity,
    pub effect: CardEffect,
}

const fn card(
    id: &'static str,
    name: &'static str,
    desc: &'static str,
    rarity: Rarity,
    effect: CardEffect,
) -> ActionCardDef {
    ActionCardDef {
        id,
        name,
        desc,
        rarity,
        effect,
    }
}

pub static ACTION_CARDS: &[ActionCardDef] = &[
    card("arrow_volley_c", "Arrow Volley", "Fire 10 arrows at random enemies", Rarity::Common, CardEffect::ArrowVolley(10)),
    card("quick_heal_c", "Quick Heal", "Instantly heal 20 HP", Rarity::Common, CardEffect::Heal(20.0)),
    card("gold_rush_c", "Gold Rush", "Gain 30 gold instantly", Rarity::Common, CardEffect::GoldRush(30)),
    card("arrow_storm_u", "Arrow Storm", "Fire 20 arrows at random enemies", Rarity::Uncommon, CardEffect::ArrowVolley(20)),
    card("shield_bash_u", "Shield Bash", "Push all enemies back and stun for 2s", Rarity::Uncommon, CardEffect::ShieldBash),
    card("heal_wave_u", "Healing Wave", "Heal 40 HP instantly", Rarity::Uncommon, CardEffect::Heal(40.0)),
    card("battle_cry_u", "Battle Cry", "+30% damage for 8 seconds", Rarity::Uncommon, CardEffect::BattleCry { ms: 8000.0, multiplier: 1.3 }),
    card("flame_burst_r", "Flame Burst", "Unleash 5 fireballs at nearest enemies", Rarity::Rare, CardEffect::MultiFireball(5)),
    card("ice_storm_r", "Ice Storm", "Freeze all enemies for 3 seconds", Rarity::Rare, CardEffect::FreezeAll { ms: 3000.0 }),
    card("lightning_storm_r", "Lightning Storm", "Strike 8 enemies with lightning", Rarity::Rare, CardEffect::LightningStorm(8)),
    card("poison_cloud_r", "Poison Cloud", "Poison all enemies for 5 damage/sec over 5s", Rarity::Rare, CardEffect::PoisonCloud { per_second: 5.0, ms: 5000.0 }),
    card("dragons_breath_e", "Dragon's Breath", "Massive fire wave dealing 150 damage to all", Rarity::Epic, CardEffect::DragonBreath(150.0)),
    card("divine_shield_e", "Divine Shield", "Become invincible for 5 seconds", Rarity::Epic, CardEffect::Invincibility { ms: 5000.0 }),
    card("time_warp_e", "Time Warp", "Slow all enemies by 80% for 5 seconds", Rarity::Epic, CardEffect::TimeWarp { ms: 5000.0 }),
    card("summon_knight_e", "Summon Knight", "A knight fights for you for 10 seconds", Rarity::Epic, CardEffect::SummonKnight { ms: 10000.0 }),
    card("apocalypse_l", "Apocalypse", "Rain meteors dealing 300 damage to all enemies", Rarity::Legendary, CardEffect::Apocalypse(300.0)),
    card("phoenix_rebirth_l", "Phoenix Rebirth", "Fully heal and gain 50% damage boost for 10s", Rarity::Legendary, CardEffect::PhoenixRebirth),
];

pub fn action_card(id: &str) -> Option<&'static ActionCardDef> {
    ACTION_CARDS.iter().find(|c| c.id == id)
}
