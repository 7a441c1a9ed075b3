//! Kingdom Siege - simulation core of a wave-survival castle defense game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (combat, waves, progression, session state)
//! - `settings`: Difficulty slider, arena size and debug overrides
//! - `records`: In-memory best-wave record
//! - `error`: Rejection reasons for player commands
//!
//! Rendering, audio synthesis, input capture and persistence live outside this
//! crate. The core exposes state snapshots and discrete events, and accepts
//! validated commands.

pub mod error;
pub mod records;
pub mod settings;
pub mod sim;

pub use error::{CommandError, SettingsError};
pub use records::WaveRecord;
pub use settings::{DebugOverrides, Difficulty, Settings};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const TICK_HZ: f64 = 60.0;
    /// Milliseconds per fixed tick
    pub const TICK_MS: f64 = 1000.0 / TICK_HZ;

    /// Default arena dimensions (castle sits at the center)
    pub const DEFAULT_ARENA_WIDTH: f64 = 1200.0;
    pub const DEFAULT_ARENA_HEIGHT: f64 = 800.0;
    /// Reference width for spawn pacing; narrower arenas spawn slower
    pub const SPAWN_REFERENCE_WIDTH: f64 = 1200.0;
    /// Enemies spawn this far inside the arena edge
    pub const SPAWN_MARGIN: f64 = 50.0;

    /// Castle defaults
    pub const CASTLE_START_HEALTH: f64 = 150.0;
    /// Castle base range as a fraction of the smaller arena dimension
    pub const CASTLE_RANGE_FRACTION: f64 = 0.6;

    /// Enemy melee reach
    pub const MELEE_RANGE: f64 = 60.0;
    /// Enemy attack cooldown
    pub const ENEMY_ATTACK_COOLDOWN_MS: f64 = 1000.0;
    /// Movement multiplier while slowed/frozen
    pub const SLOWED_SPEED_FACTOR: f64 = 0.7;
    /// Movement multiplier while time-warped
    pub const TIME_WARP_SPEED_FACTOR: f64 = 0.2;
    /// Slow duration from a freeze proc
    pub const FREEZE_DURATION_MS: f64 = 2000.0;

    /// Projectile tuning (speeds are per 60 Hz tick)
    pub const ARROW_SPEED: f64 = 10.0;
    pub const FIREBALL_SPEED: f64 = 6.0;
    pub const RICOCHET_SPEED: f64 = 14.0;
    pub const PROJECTILE_HIT_RADIUS: f64 = 20.0;
    /// Ricochet arrows keep this fraction of the parent's damage
    pub const RICOCHET_DAMAGE_FACTOR: f64 = 0.85;

    /// Splash radii
    pub const EXPLOSIVE_ARROW_RADIUS: f64 = 80.0;
    pub const FIREBALL_RADIUS: f64 = 100.0;
    pub const SPLASH_STAT_RADIUS: f64 = 60.0;
    pub const METEOR_RADIUS: f64 = 80.0;
    pub const DEATH_EXPLOSION_RADIUS: f64 = 80.0;
    /// Fraction of hit damage dealt by impact splash
    pub const IMPACT_SPLASH_FACTOR: f64 = 0.5;
    /// Fraction of max health released by a death explosion
    pub const DEATH_EXPLOSION_FACTOR: f64 = 0.65;

    /// Ability cooldowns
    pub const FIREBALL_COOLDOWN_MS: f64 = 3000.0;
    pub const LIGHTNING_COOLDOWN_MS: f64 = 4000.0;
    pub const METEOR_COOLDOWN_MS: f64 = 5000.0;
    pub const LIGHTNING_CHAIN_RADIUS: f64 = 150.0;
    pub const LIGHTNING_CHAIN_LINKS: usize = 2;
    pub const METEOR_TARGETS: usize = 3;

    /// Wave pacing
    pub const WAVE_ANNOUNCE_MS: f64 = 2000.0;

    /// Deck and shop limits
    pub const MAX_DECK_SIZE: usize = 6;
    pub const MYSTERY_BOX_LIMIT: u32 = 3;
    pub const BOSS_WAVE_INTERVAL: u32 = 5;

    /// Garrison guards
    pub const GARRISON_DAMAGE: f64 = 18.0;
    pub const GARRISON_OFFSET: f64 = 60.0;
    pub const GARRISON_STEP_MS: f64 = 50.0;
    pub const GUARD_REACH: f64 = 50.0;
    pub const GARRISON_LEASH: f64 = 200.0;

    /// Summoned knight
    pub const KNIGHT_DAMAGE: f64 = 25.0;
    pub const KNIGHT_SPEED: f64 = 5.0;
}

/// True on boss waves (every fifth wave)
#[inline]
pub fn is_boss_wave(wave: u32) -> bool {
    wave > 0 && wave % consts::BOSS_WAVE_INTERVAL == 0
}

/// Step `from` toward `to` by at most `step`, without overshooting
#[inline]
pub fn step_toward(from: DVec2, to: DVec2, step: f64) -> DVec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= step || dist == 0.0 {
        to
    } else {
        from + delta / dist * step
    }
}
