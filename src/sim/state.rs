//! Game state types
//!
//! All state needed for deterministic simulation of one session.

use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::cards::Deck;
use super::catalog::EnemyKind;
use super::difficulty::{self, DifficultyMultipliers, ScaledEnemy};
use super::events::GameEvent;
use super::rng::SimRng;
use super::schedule::Scheduler;
use super::stats::{CastleStats, StatKey};
use super::wave::{WaveController, WavePhase};
use crate::settings::Settings;

/// Entity identifier, unique within a session
pub type EntityId = u32;

/// Enemy lifecycle; transitions only ever move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyLife {
    Alive,
    /// Health hit zero; kill rewards are queued but not yet paid
    Dying,
    /// Rewards paid; swept from the arena at the next phase boundary
    Dead,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: DVec2,
    pub health: f64,
    pub max_health: f64,
    pub damage: f64,
    /// Units per 60 Hz tick
    pub speed: f64,
    pub value: f64,
    pub ranged: bool,
    /// Distance at which the enemy stops and attacks
    pub range: f64,
    pub is_boss: bool,
    pub size: f64,
    pub last_attack_ms: Option<f64>,
    pub slowed_until_ms: f64,
    pub warped_until_ms: f64,
    pub life: EnemyLife,
}

impl Enemy {
    pub fn spawn(id: EntityId, kind: EnemyKind, pos: DVec2, scaled: ScaledEnemy) -> Self {
        let def = kind.def();
        Self {
            id,
            kind,
            pos,
            health: scaled.health,
            max_health: scaled.health,
            damage: scaled.damage,
            speed: scaled.speed,
            value: def.value,
            ranged: def.ranged_reach.is_some(),
            range: def.ranged_reach.unwrap_or(crate::consts::MELEE_RANGE),
            is_boss: def.is_boss,
            size: def.size,
            last_attack_ms: None,
            slowed_until_ms: 0.0,
            warped_until_ms: 0.0,
            life: EnemyLife::Alive,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life == EnemyLife::Alive
    }

    pub fn is_slowed(&self, now_ms: f64) -> bool {
        now_ms < self.slowed_until_ms
    }

    pub fn is_warped(&self, now_ms: f64) -> bool {
        now_ms < self.warped_until_ms
    }

    /// Slow the enemy until at least `until_ms`
    pub fn slow_until(&mut self, until_ms: f64) {
        self.slowed_until_ms = self.slowed_until_ms.max(until_ms);
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectileKind {
    Arrow,
    Fireball,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: DVec2,
    pub target: EntityId,
    pub kind: ProjectileKind,
    /// Units per 60 Hz tick
    pub speed: f64,
    /// Fully resolved at fire time
    pub damage: f64,
    pub bounces: u32,
    /// Enemies already struck by this ricochet chain
    pub hit_enemies: Vec<EntityId>,
    pub is_ricochet: bool,
}

impl Projectile {
    pub fn new(id: EntityId, pos: DVec2, target: EntityId, kind: ProjectileKind, damage: f64) -> Self {
        let speed = match kind {
            ProjectileKind::Arrow => crate::consts::ARROW_SPEED,
            ProjectileKind::Fireball => crate::consts::FIREBALL_SPEED,
        };
        Self {
            id,
            pos,
            target,
            kind,
            speed,
            damage,
            bounces: 0,
            hit_enemies: Vec::new(),
            is_ricochet: false,
        }
    }
}

/// Upgrade-granted defender posted around the castle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Garrison {
    pub id: EntityId,
    pub home: DVec2,
    pub pos: DVec2,
    /// Captured from the damage multiplier at spawn
    pub damage: f64,
}

/// Temporary defender from the summon card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Knight {
    pub id: EntityId,
    pub pos: DVec2,
    pub damage: f64,
    pub expires_at_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Castle {
    pub pos: DVec2,
    pub health: f64,
}

/// A timed curse still in force; stores the exact value it applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveDebuff {
    pub id: String,
    pub remaining_waves: u32,
    pub key: StatKey,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum RewardOption {
    Upgrade(String),
    Card(String),
}

impl RewardOption {
    pub fn id(&self) -> &str {
        match self {
            RewardOption::Upgrade(id) | RewardOption::Card(id) => id,
        }
    }
}

/// What the end-of-wave modal is showing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RewardOffer {
    Rewards(Vec<RewardOption>),
    Curses(Vec<String>),
}

/// Where a card that found the deck full came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardContext {
    /// End-of-wave reward; resolving it advances the wave
    Reward,
    /// Mystery or golden box; resolving it leaves the shop open
    Box,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCard {
    pub card_id: String,
    pub context: CardContext,
}

/// Final numbers for a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub wave: u32,
    pub kills: u32,
    pub total_gold_earned: u64,
}

/// Complete session state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameSession {
    pub settings: Settings,
    /// Arena dimensions
    pub arena: DVec2,
    pub rng: SimRng,
    /// Simulation clock and deferred actions
    pub scheduler: Scheduler,
    pub is_running: bool,
    pub is_paused: bool,
    pub game_over: bool,
    /// Current wave (1-based once started)
    pub wave: u32,
    pub kills: u32,
    pub gold: u64,
    pub total_gold_earned: u64,
    pub castle: Castle,
    pub stats: CastleStats,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub garrisons: Vec<Garrison>,
    pub knights: Vec<Knight>,
    /// Earned upgrade ids in pick order (duplicates for repeatables)
    pub earned_upgrades: Vec<String>,
    pub active_debuffs: Vec<ActiveDebuff>,
    /// Every curse ever applied, for the pause menu
    pub applied_debuffs: Vec<String>,
    pub deck: Deck,
    pub pending_card: Option<PendingCard>,
    pub offer: Option<RewardOffer>,
    pub waves: WaveController,
    pub manual_target: Option<DVec2>,
    pub mystery_boxes_bought: u32,
    pub golden_box_bought: bool,
    /// Operator override: sell the golden box this wave
    pub force_golden_box: bool,
    /// `None` means the cooldown is ready
    pub last_attack_ms: Option<f64>,
    pub last_fireball_ms: Option<f64>,
    pub last_lightning_ms: Option<f64>,
    pub last_meteor_ms: Option<f64>,
    pub arrows_fired: u64,
    pub guardian_used: bool,
    pub phoenix_used: bool,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) death_queue: VecDeque<EntityId>,
    pub(crate) resolving_deaths: bool,
    /// Time banked toward the next 50 ms guard step
    pub(crate) guard_step_ms: f64,
    next_id: EntityId,
}

impl GameSession {
    /// Fresh session; call [`GameSession::start`] to begin wave 1
    pub fn new(settings: Settings) -> Self {
        let arena = DVec2::new(settings.arena_width, settings.arena_height);
        let stats = CastleStats::default();
        let force_golden_box = settings.debug.force_golden_box;
        Self {
            rng: SimRng::new(settings.seed),
            settings,
            arena,
            scheduler: Scheduler::new(),
            is_running: false,
            is_paused: false,
            game_over: false,
            wave: 0,
            kills: 0,
            gold: 0,
            total_gold_earned: 0,
            castle: Castle {
                pos: arena / 2.0,
                health: stats.max_health,
            },
            stats,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            garrisons: Vec::new(),
            knights: Vec::new(),
            earned_upgrades: Vec::new(),
            active_debuffs: Vec::new(),
            applied_debuffs: Vec::new(),
            deck: Deck::default(),
            pending_card: None,
            offer: None,
            waves: WaveController::default(),
            manual_target: None,
            mystery_boxes_bought: 0,
            golden_box_bought: false,
            force_golden_box,
            last_attack_ms: None,
            last_fireball_ms: None,
            last_lightning_ms: None,
            last_meteor_ms: None,
            arrows_fired: 0,
            guardian_used: false,
            phoenix_used: false,
            events: Vec::new(),
            death_queue: VecDeque::new(),
            resolving_deaths: false,
            guard_step_ms: 0.0,
            next_id: 1,
        }
    }

    /// Begin play at wave 1
    pub fn start(&mut self) {
        if self.is_running || self.game_over {
            return;
        }
        log::info!(
            "Session start (seed {}, difficulty {})",
            self.rng.seed(),
            self.settings.difficulty.get()
        );
        self.is_running = true;
        self.wave = 1;
        super::wave::start_wave(self);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Simulation time in milliseconds
    #[inline]
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.enemy(id).is_some_and(Enemy::is_alive)
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_alive()).count()
    }

    /// Drop enemies whose death has been fully resolved
    pub fn sweep_dead(&mut self) {
        self.enemies.retain(|e| e.life != EnemyLife::Dead);
    }

    pub fn raw_power(&self) -> f64 {
        difficulty::raw_power(&self.stats, &self.earned_upgrades, self.deck.len())
    }

    pub fn display_power(&self) -> u32 {
        difficulty::display_power(self.raw_power())
    }

    pub fn power_ratio(&self) -> f64 {
        difficulty::power_ratio(self.raw_power())
    }

    /// Enemy and economy multipliers for the current wave
    pub fn multipliers(&self) -> DifficultyMultipliers {
        DifficultyMultipliers::compute(
            self.wave.max(1),
            self.settings.difficulty,
            self.power_ratio(),
        )
    }

    pub fn heal(&mut self, amount: f64) {
        self.castle.health = (self.castle.health + amount).min(self.stats.max_health);
    }

    pub fn add_gold(&mut self, amount: u64) {
        self.gold += amount;
        self.total_gold_earned += amount;
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every cue raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            wave: self.wave,
            kills: self.kills,
            total_gold_earned: self.total_gold_earned,
        }
    }

    /// Stop play and drop everything in flight
    fn teardown(&mut self) {
        self.is_running = false;
        self.is_paused = false;
        self.scheduler.clear();
        self.enemies.clear();
        self.projectiles.clear();
        self.knights.clear();
        self.death_queue.clear();
        self.waves.pending.clear();
        self.waves.started = false;
        self.waves.phase = WavePhase::Idle;
    }

    /// Tear the session down after the castle falls
    pub fn end_game(&mut self) {
        if self.game_over {
            return;
        }
        self.teardown();
        self.game_over = true;
        log::info!(
            "Game over on wave {} ({} kills, {} gold earned)",
            self.wave,
            self.kills,
            self.total_gold_earned
        );
        self.emit(GameEvent::CastleDestroyed);
        self.emit(GameEvent::GameOver { wave: self.wave });
    }

    /// Abandon the run (back to the menu); no game-over cues
    pub fn quit(&mut self) {
        self.teardown();
        self.offer = None;
        self.pending_card = None;
        log::info!("Session quit on wave {}", self.wave);
    }

    /// Whether a run is in progress (fighting or choosing a reward)
    pub fn is_active(&self) -> bool {
        self.wave > 0 && !self.game_over && self.waves.phase != WavePhase::Idle
    }
}
