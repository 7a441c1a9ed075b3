//! Static content: enemy archetypes, upgrades, action cards, curses and shop
//! stock, plus the wave-tiered rarity roulette used to draft rewards.
//!
//! Effects are tagged data interpreted by `CastleStats::apply_effect` and the
//! card/debuff dispatchers, so every entry is inspectable and serializable.

pub mod cards;
pub mod debuffs;
pub mod enemies;
pub mod shop;
pub mod upgrades;

pub use cards::{ACTION_CARDS, ActionCardDef, CardEffect, action_card};
pub use debuffs::{
    DEBUFFS, DEVASTATING_DEBUFFS, DebuffDef, DebuffEffect, InstantDebuff, Severity, debuff,
};
pub use enemies::{EnemyDef, EnemyKind};
pub use shop::ShopItem;
pub use upgrades::{StatEffect, UPGRADES, UpgradeDef, UpgradeKind, upgrade};

use serde::{Deserialize, Serialize};

use super::rng::SimRng;

/// Reward rarity tiers, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    /// Only obtainable from golden boxes
    Mythic,
}

impl Rarity {
    /// Rarities reachable through end-of-wave drafting, in fallback order
    pub const DRAFTABLE: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "MYTHIC",
        }
    }

    /// Contribution of one earned upgrade of this rarity to castle power
    pub fn power_weight(self) -> f64 {
        match self {
            Rarity::Common => 3.0,
            Rarity::Uncommon => 6.0,
            Rarity::Rare => 12.0,
            Rarity::Epic => 20.0,
            Rarity::Legendary => 35.0,
            Rarity::Mythic => 60.0,
        }
    }

    /// Rarities to try when nothing is left at `self`, nearest first,
    /// lower before higher at equal distance
    pub fn fallback_order(self) -> Vec<Rarity> {
        let order = Self::DRAFTABLE;
        let Some(idx) = order.iter().position(|&r| r == self) else {
            return order.to_vec();
        };
        let mut out = Vec::with_capacity(order.len());
        for offset in 1..order.len() {
            if let Some(lower) = idx.checked_sub(offset) {
                out.push(order[lower]);
            }
            if let Some(&higher) = order.get(idx + offset) {
                out.push(higher);
            }
        }
        out
    }
}

/// Draft weights for each rarity by wave band (common-heavy early)
pub fn rarity_weights(wave: u32) -> [(Rarity, u32); 5] {
    use Rarity::*;
    match wave {
        0..=3 => [(Common, 70), (Uncommon, 25), (Rare, 5), (Epic, 0), (Legendary, 0)],
        4..=6 => [(Common, 45), (Uncommon, 40), (Rare, 12), (Epic, 3), (Legendary, 0)],
        7..=10 => [(Common, 27), (Uncommon, 36), (Rare, 28), (Epic, 8), (Legendary, 1)],
        11..=15 => [(Common, 12), (Uncommon, 28), (Rare, 35), (Epic, 21), (Legendary, 4)],
        _ => [(Common, 8), (Uncommon, 18), (Rare, 32), (Epic, 32), (Legendary, 10)],
    }
}

/// Cumulative-weight roulette over `rarity_weights(wave)`
pub fn pick_rarity(wave: u32, rng: &mut SimRng) -> Rarity {
    let weights = rarity_weights(wave);
    let total: u32 = weights.iter().map(|&(_, w)| w).sum();
    let mut remaining = rng.roll() * f64::from(total);
    for (rarity, weight) in weights {
        remaining -= f64::from(weight);
        if remaining <= 0.0 {
            return rarity;
        }
    }
    Rarity::Common
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_waves_never_draft_epic() {
        let mut rng = SimRng::new(3);
        for _ in 0..500 {
            let rarity = pick_rarity(2, &mut rng);
            assert!(rarity <= Rarity::Rare, "got {rarity:?}");
        }
    }

    #[test]
    fn roulette_walks_cumulative_weights() {
        let mut rng = SimRng::new(0);
        // wave 16+: 8 / 18 / 32 / 32 / 10 out of 100
        rng.force([0.0, 0.07, 0.09, 0.5, 0.95]);
        assert_eq!(pick_rarity(20, &mut rng), Rarity::Common);
        assert_eq!(pick_rarity(20, &mut rng), Rarity::Common);
        assert_eq!(pick_rarity(20, &mut rng), Rarity::Uncommon);
        assert_eq!(pick_rarity(20, &mut rng), Rarity::Rare);
        assert_eq!(pick_rarity(20, &mut rng), Rarity::Legendary);
    }

    #[test]
    fn fallback_searches_outward() {
        assert_eq!(
            Rarity::Rare.fallback_order(),
            vec![
                Rarity::Uncommon,
                Rarity::Epic,
                Rarity::Common,
                Rarity::Legendary
            ]
        );
        assert_eq!(
            Rarity::Legendary.fallback_order(),
            vec![Rarity::Epic, Rarity::Rare, Rarity::Uncommon, Rarity::Common]
        );
    }
}
