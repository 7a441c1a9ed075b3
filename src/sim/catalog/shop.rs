//! Shop stock

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShopItem {
    SmallRepair,
    MediumRepair,
    FullRepair,
    MysteryBox,
    GoldenBox,
}

impl ShopItem {
    pub const ALL: [ShopItem; 5] = [
        ShopItem::SmallRepair,
        ShopItem::MediumRepair,
        ShopItem::FullRepair,
        ShopItem::MysteryBox,
        ShopItem::GoldenBox,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShopItem::SmallRepair => "Small Repair",
            ShopItem::MediumRepair => "Medium Repair",
            ShopItem::FullRepair => "Full Repair",
            ShopItem::MysteryBox => "Mystery Box",
            ShopItem::GoldenBox => "Golden Box",
        }
    }

    /// Price before wave scaling
    pub fn base_price(self) -> f64 {
        match self {
            ShopItem::SmallRepair => 25.0,
            ShopItem::MediumRepair => 50.0,
            ShopItem::FullRepair => 100.0,
            ShopItem::MysteryBox => 75.0,
            ShopItem::GoldenBox => 300.0,
        }
    }

    pub fn is_repair(self) -> bool {
        matches!(
            self,
            ShopItem::SmallRepair | ShopItem::MediumRepair | ShopItem::FullRepair
        )
    }

    /// Health restored by a repair; `None` means a full repair
    pub fn heal_amount(self) -> Option<f64> {
        match self {
            ShopItem::SmallRepair => Some(25.0),
            ShopItem::MediumRepair => Some(50.0),
            _ => None,
        }
    }

    /// Final price: repairs follow the wave multiplier, boxes the box multiplier
    pub fn price(self, shop_multiplier: f64, box_multiplier: f64) -> u64 {
        let multiplier = if self.is_repair() {
            shop_multiplier
        } else {
            box_multiplier
        };
        (self.base_price() * multiplier).round() as u64
    }
}
