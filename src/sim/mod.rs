//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, time comes from the session scheduler
//! - Seeded RNG only
//! - Stable iteration order (entities kept in spawn order)
//! - No rendering, audio or platform dependencies

pub mod cards;
pub mod catalog;
pub mod combat;
pub mod commands;
pub mod difficulty;
pub mod events;
pub mod progression;
pub mod rng;
pub mod schedule;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod tick;
pub mod wave;

pub use cards::{AddCardOutcome, Deck};
pub use catalog::{EnemyKind, Rarity, ShopItem};
pub use commands::{Command, apply};
pub use events::GameEvent;
pub use progression::{CardResolution, Catastrophe};
pub use rng::SimRng;
pub use schedule::{Scheduler, TimedAction};
pub use snapshot::Snapshot;
pub use state::{
    CardContext, Enemy, EntityId, GameSession, PendingCard, RewardOffer, RewardOption,
    SessionSummary,
};
pub use stats::CastleStats;
pub use tick::{TickInput, tick};
pub use wave::WavePhase;
