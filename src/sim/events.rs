//! Discrete cues for the audio/visual layer
//!
//! The session appends events as things happen; the presentation layer drains
//! them once per frame. Nothing in the core waits on them.

use serde::Serialize;

use super::catalog::{EnemyKind, Rarity, ShopItem};
use super::state::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    WaveStarted { wave: u32, boss: bool },
    WaveComplete { wave: u32 },
    EnemySpawned { id: EntityId, kind: EnemyKind },
    EnemyHit { id: EntityId, damage: f64, crit: bool },
    EnemyKilled { id: EntityId, kind: EnemyKind, gold: u64 },
    BossKilled { id: EntityId, kind: EnemyKind },
    DeathExplosion { id: EntityId, damage: f64 },
    CastleHit { damage: f64 },
    Blocked,
    Dodged,
    CastleDestroyed,
    GuardianSaved,
    PhoenixRevived,
    ArrowFired { target: EntityId },
    FireballCast { target: EntityId },
    LightningCast { targets: Vec<EntityId> },
    MeteorIncoming { target: EntityId },
    Upgrade { id: String, rarity: Rarity },
    LegendaryUpgrade { id: String },
    CardAdded { id: String },
    CardUsed { id: String },
    CardDiscarded { id: String },
    DebuffApplied { id: String },
    DebuffExpired { id: String },
    Purchase { item: ShopItem, price: u64 },
    BoxOpened { item: ShopItem, reward: String },
    Catastrophe { name: String },
    /// A command was refused; carries the user-facing message
    Error { message: String },
    GameOver { wave: u32 },
}
