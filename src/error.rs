//! Rejection reasons surfaced to the presentation layer
//!
//! A rejected command never mutates the session. The `Display` text doubles as
//! the transient message shown next to the shop or card deck.

use thiserror::Error;

/// Why a player command was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Not enough gold!")]
    InsufficientGold,
    #[error("Health is already full!")]
    HealthFull,
    #[error("Max 3 mystery boxes per wave!")]
    MysteryBoxLimit,
    #[error("Golden box is only sold on boss waves!")]
    GoldenBoxUnavailable,
    #[error("Golden box already purchased this wave!")]
    GoldenBoxAlreadyBought,
    #[error("No reward is waiting to be chosen")]
    NoRewardPending,
    #[error("That option is not on offer")]
    NotOffered,
    #[error("Resolve the pending card first")]
    CardPending,
    #[error("No card is waiting to be placed")]
    NoCardPending,
    #[error("No card in that slot")]
    InvalidCardIndex,
    #[error("The session is not running")]
    SessionNotActive,
    #[error("The shop is closed")]
    ShopClosed,
    #[error("Difficulty must be between 1 and 10")]
    InvalidDifficulty,
    #[error("Unknown item")]
    UnknownItem,
}

/// Failure to read a settings document
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("difficulty {0} is outside 1..=10")]
    Difficulty(u8),
}
