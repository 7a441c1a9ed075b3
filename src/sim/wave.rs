//! Wave lifecycle
//!
//! Idle -> Announcing -> Spawning -> InProgress -> RewardSelection -> next wave.
//! Spawns are queued on the session scheduler, so a paused session defers them
//! without dropping any.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::catalog::EnemyKind;
use super::difficulty::scale_enemy;
use super::events::GameEvent;
use super::progression;
use super::rng::SimRng;
use super::schedule::TimedAction;
use super::state::{Enemy, EntityId, GameSession};
use super::tick;
use crate::consts::{SPAWN_MARGIN, SPAWN_REFERENCE_WIDTH, WAVE_ANNOUNCE_MS};
use crate::error::CommandError;
use crate::is_boss_wave;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WavePhase {
    #[default]
    Idle,
    Announcing,
    Spawning,
    InProgress,
    RewardSelection,
}

/// One scheduled spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSpawn {
    pub kind: EnemyKind,
    pub delay_ms: f64,
    pub spawned: bool,
}

/// Spawn bookkeeping for the current wave
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaveController {
    pub phase: WavePhase,
    pub pending: Vec<PendingSpawn>,
    /// Fixed when the spawn schedule is built
    pub expected_enemies: u32,
    pub wave_kills: u32,
    pub started: bool,
}

impl WaveController {
    pub fn all_spawned(&self) -> bool {
        self.pending.iter().all(|s| s.spawned)
    }

    /// True while enemies are (or will be) on the field
    pub fn in_combat(&self) -> bool {
        matches!(
            self.phase,
            WavePhase::Announcing | WavePhase::Spawning | WavePhase::InProgress
        )
    }
}

/// Wave tier used for count and pacing growth (caps at wave 25)
fn wave_tier(wave: u32) -> i32 {
    (wave / 5).min(5) as i32
}

fn regular_kind(wave: u32, roll: f64) -> EnemyKind {
    use EnemyKind::*;

    // Unlocks are checked in order; later matches win
    const UNLOCKS: [(u32, f64, EnemyKind); 13] = [
        (2, 0.65, Goblin),
        (3, 0.7, Zombie),
        (4, 0.75, Troll),
        (5, 0.72, Bat),
        (6, 0.78, Spider),
        (7, 0.8, Ogre),
        (8, 0.82, DarkMage),
        (9, 0.76, Wolf),
        (10, 0.7, Skeleton),
        (11, 0.84, Witch),
        (12, 0.88, Dragon),
        (13, 0.79, Snake),
        (14, 0.83, Bear),
    ];
    const LATE: [(u32, &[(f64, EnemyKind)]); 3] = [
        (
            15,
            &[
                (0.5, Skeleton),
                (0.6, Wolf),
                (0.7, Ogre),
                (0.8, Vampire),
                (0.85, DarkMage),
                (0.9, Necromancer),
                (0.95, Dragon),
            ],
        ),
        (
            20,
            &[
                (0.4, Troll),
                (0.5, Bear),
                (0.6, Ogre),
                (0.7, Ghost),
                (0.75, Demon),
                (0.8, Golem),
                (0.88, Dragon),
            ],
        ),
        (
            30,
            &[
                (0.35, Demon),
                (0.5, Golem),
                (0.65, Necromancer),
                (0.8, Dragon),
                (0.9, Assassin),
            ],
        ),
    ];

    let mut kind = Orc;
    for (min_wave, threshold, unlocked) in UNLOCKS {
        if wave >= min_wave && roll > threshold {
            kind = unlocked;
        }
    }
    for (min_wave, table) in LATE {
        if wave < min_wave {
            continue;
        }
        for &(threshold, late) in table {
            if roll > threshold {
                kind = late;
            }
        }
    }
    kind
}

fn boss_minion_kind(wave: u32, roll: f64) -> EnemyKind {
    let mut kind = EnemyKind::Orc;
    if wave >= 10 && roll > 0.7 {
        kind = EnemyKind::Troll;
    }
    if wave >= 15 && roll > 0.75 {
        kind = EnemyKind::Ogre;
    }
    if wave >= 20 && roll > 0.8 {
        kind = EnemyKind::Demon;
    }
    if wave >= 25 && roll > 0.85 {
        kind = EnemyKind::Golem;
    }
    kind
}

/// Ordered spawn list `(kind, delay_ms)` for a wave
pub fn compose_wave(wave: u32, arena_width: f64, rng: &mut SimRng) -> Vec<(EnemyKind, f64)> {
    let w = f64::from(wave);
    let tier = wave_tier(wave);
    let count_scale = 1.12_f64.powi(tier);
    let pacing = (SPAWN_REFERENCE_WIDTH / arena_width).max(1.0) * (1.0 + f64::from(tier) * 0.1);
    let mut out = Vec::new();

    if is_boss_wave(wave) {
        out.push((EnemyKind::wave_boss(wave), 0.0));

        let extras = wave / 15;
        for b in 0..extras {
            let delay = (1000.0 + f64::from(b) * 600.0) * pacing;
            out.push((EnemyKind::escort_boss(wave), delay));
        }
        if wave >= 15 {
            let dragon = if wave >= 40 {
                EnemyKind::ElderDragon
            } else {
                EnemyKind::Dragon
            };
            for d in 0..extras {
                out.push((dragon, (1200.0 + f64::from(d) * 700.0) * pacing));
            }
        }

        let minions = ((f64::from(wave * 6 / 10) + 2.0) * count_scale).floor() as u32;
        for i in 0..minions {
            let kind = boss_minion_kind(wave, rng.roll());
            out.push((kind, (600.0 + f64::from(i) * 300.0) * pacing));
        }
    } else {
        let count = ((3.0 + (w * 1.5).floor()) * count_scale).floor() as u32;
        let spacing = (400.0 - w * 10.0).max(150.0);
        for i in 0..count {
            let kind = regular_kind(wave, rng.roll());
            out.push((kind, f64::from(i) * spacing * pacing));
        }
    }
    out
}

/// Announce the current wave; spawning begins after the announcement
pub fn start_wave(session: &mut GameSession) {
    let wave = session.wave;
    let boss = is_boss_wave(wave);
    session.waves.phase = WavePhase::Announcing;
    session.waves.started = false;
    session.waves.pending.clear();
    session.waves.expected_enemies = 0;
    session.guardian_used = false;
    log::info!("Wave {wave} starting{}", if boss { " (boss)" } else { "" });
    session.emit(GameEvent::WaveStarted { wave, boss });
    session
        .scheduler
        .schedule_in(WAVE_ANNOUNCE_MS, TimedAction::BeginSpawning);
}

/// Build and queue the spawn schedule
pub fn begin_spawning(session: &mut GameSession) {
    if !session.is_running {
        return;
    }
    let schedule = if session.settings.debug.no_enemies {
        Vec::new()
    } else {
        compose_wave(session.wave, session.arena.x, &mut session.rng)
    };
    let fast = session.settings.debug.fast_waves;

    session.waves.pending = schedule
        .into_iter()
        .map(|(kind, delay_ms)| PendingSpawn {
            kind,
            delay_ms,
            spawned: false,
        })
        .collect();
    session.waves.expected_enemies = session.waves.pending.len() as u32;
    session.waves.started = true;
    session.waves.phase = if session.waves.pending.is_empty() {
        WavePhase::InProgress
    } else {
        WavePhase::Spawning
    };
    log::debug!(
        "Wave {} schedules {} enemies",
        session.wave,
        session.waves.expected_enemies
    );

    for slot in 0..session.waves.pending.len() {
        let delay = if fast {
            0.0
        } else {
            session.waves.pending[slot].delay_ms
        };
        session
            .scheduler
            .schedule_in(delay, TimedAction::Spawn { slot });
    }
}

/// Materialize one pending spawn, at most once
pub fn spawn_slot(session: &mut GameSession, slot: usize) {
    if !session.is_running {
        return;
    }
    let Some(pending) = session.waves.pending.get_mut(slot) else {
        return;
    };
    if pending.spawned {
        return;
    }
    pending.spawned = true;
    let kind = pending.kind;
    spawn_enemy(session, kind);
    if session.waves.all_spawned() {
        session.waves.phase = WavePhase::InProgress;
    }
}

fn spawn_position(arena: DVec2, rng: &mut SimRng) -> DVec2 {
    match rng.index(4) {
        0 => DVec2::new(SPAWN_MARGIN, rng.roll() * arena.y),
        1 => DVec2::new(arena.x - SPAWN_MARGIN, rng.roll() * arena.y),
        2 => DVec2::new(rng.roll() * arena.x, SPAWN_MARGIN),
        _ => DVec2::new(rng.roll() * arena.x, arena.y - SPAWN_MARGIN),
    }
}

/// Place one enemy of `kind` on a random arena edge, scaled for this wave
pub fn spawn_enemy(session: &mut GameSession, kind: EnemyKind) -> EntityId {
    let mult = session.multipliers();
    let scaled = scale_enemy(kind.def(), session.wave.max(1), &mult);
    let pos = spawn_position(session.arena, &mut session.rng);
    let id = session.next_entity_id();
    session.enemies.push(Enemy::spawn(id, kind, pos, scaled));
    log::debug!("Spawned {:?} #{id} at ({:.0}, {:.0})", kind, pos.x, pos.y);
    session.emit(GameEvent::EnemySpawned { id, kind });
    id
}

/// Every completion condition at once
pub fn is_wave_complete(session: &GameSession) -> bool {
    let waves = &session.waves;
    waves.started
        && waves.in_combat()
        && session.is_running
        && !session.settings.debug.manual_wave_end
        && session.live_enemy_count() == 0
        && waves.all_spawned()
        && waves.wave_kills >= waves.expected_enemies
}

/// Complete the wave if every gate is open; returns whether it did
pub fn check_completion(session: &mut GameSession) -> bool {
    if !is_wave_complete(session) {
        return false;
    }
    complete_wave(session);
    true
}

fn complete_wave(session: &mut GameSession) {
    session.is_running = false;
    session.waves.started = false;
    session.projectiles.clear();
    settle_timers(session);
    tick_down_debuffs(session);
    log::info!(
        "Wave {} complete ({} kills this wave)",
        session.wave,
        session.waves.wave_kills
    );
    session.emit(GameEvent::WaveComplete { wave: session.wave });
    session.waves.phase = WavePhase::RewardSelection;
    progression::open_offer(session);
}

/// Buffs run out with the wave; strikes still in flight are dropped
fn settle_timers(session: &mut GameSession) {
    for action in session.scheduler.drain_all() {
        if action.is_buff_expiry() {
            tick::run_timed(session, action);
        }
    }
    session.knights.clear();
}

/// Count every timed curse down by one wave, reversing the ones that run out
pub fn tick_down_debuffs(session: &mut GameSession) {
    let mut expired = Vec::new();
    session.active_debuffs.retain_mut(|d| {
        d.remaining_waves = d.remaining_waves.saturating_sub(1);
        if d.remaining_waves == 0 {
            expired.push(d.clone());
            false
        } else {
            true
        }
    });
    for debuff in expired {
        session.stats.overlay.remove(debuff.key, debuff.value);
        log::debug!("Curse {} lifted", debuff.id);
        session.emit(GameEvent::DebuffExpired { id: debuff.id });
    }
}

/// Operator escape hatch: drop the wave without kill credit and go to rewards
pub fn force_end_wave(session: &mut GameSession) -> Result<(), CommandError> {
    if !session.is_running || !session.waves.in_combat() {
        return Err(CommandError::SessionNotActive);
    }
    let cancelled = session.scheduler.cancel_where(TimedAction::is_spawn);
    settle_timers(session);
    session.enemies.clear();
    session.projectiles.clear();
    session.death_queue.clear();
    session.waves.pending.clear();
    session.waves.started = false;
    session.is_running = false;
    log::info!(
        "Wave {} force-ended ({cancelled} spawns cancelled)",
        session.wave
    );
    session.waves.phase = WavePhase::RewardSelection;
    progression::open_offer(session);
    Ok(())
}

/// Move on to the next wave once the reward is settled
pub fn advance_wave(session: &mut GameSession) {
    session.wave += 1;
    session.waves.wave_kills = 0;
    session.mystery_boxes_bought = 0;
    session.golden_box_bought = false;
    session.force_golden_box = false;
    session.offer = None;
    session.is_running = true;
    start_wave(session);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn running_session() -> GameSession {
        let mut session = GameSession::new(Settings::default());
        session.start();
        session
    }

    #[test]
    fn test_regular_wave_count_and_pacing() {
        let mut rng = SimRng::new(1);
        let wave = compose_wave(1, 1200.0, &mut rng);
        assert_eq!(wave.len(), 4);
        let delays: Vec<f64> = wave.iter().map(|&(_, d)| d).collect();
        assert_eq!(delays, vec![0.0, 390.0, 780.0, 1170.0]);
        assert!(wave.iter().all(|&(k, _)| k == EnemyKind::Orc));
    }

    #[test]
    fn test_narrow_arena_spreads_spawns() {
        let mut rng = SimRng::new(1);
        let wave = compose_wave(1, 600.0, &mut rng);
        assert_eq!(wave[1].1, 780.0);
    }

    #[test]
    fn test_tiered_wave_count() {
        let mut rng = SimRng::new(1);
        // tier 1: floor((3 + 10) * 1.12) = 14
        assert_eq!(compose_wave(7, 1200.0, &mut rng).len(), 14);
        // tier capped at 5 from wave 25
        let tier5 = 1.12_f64.powi(5);
        let expected = ((3.0 + (31.0_f64 * 1.5).floor()) * tier5).floor() as usize;
        assert_eq!(compose_wave(31, 1200.0, &mut rng).len(), expected);
    }

    #[test]
    fn test_boss_wave_composition() {
        let mut rng = SimRng::new(1);
        let wave = compose_wave(15, 1200.0, &mut rng);
        assert_eq!(wave[0], (EnemyKind::Boss, 0.0));
        // pacing at tier 3 is 1.3
        assert_eq!(wave[1].0, EnemyKind::Boss);
        assert!((wave[1].1 - 1300.0).abs() < 1e-6);
        assert_eq!(wave[2].0, EnemyKind::Dragon);
        assert!((wave[2].1 - 1560.0).abs() < 1e-6);
        let minions = ((9.0 + 2.0) * 1.12_f64.powi(3)).floor() as usize;
        assert_eq!(wave.len(), 3 + minions);

        let wave = compose_wave(45, 1200.0, &mut rng);
        assert_eq!(wave[0].0, EnemyKind::LichLord);
        assert_eq!(wave[1].0, EnemyKind::TrollKing);
        assert!(wave.iter().any(|&(k, _)| k == EnemyKind::ElderDragon));
    }

    #[test]
    fn test_late_rolls_override_unlocks() {
        assert_eq!(regular_kind(3, 0.71), EnemyKind::Zombie);
        assert_eq!(regular_kind(14, 0.99), EnemyKind::Bear);
        assert_eq!(regular_kind(15, 0.99), EnemyKind::Dragon);
        assert_eq!(regular_kind(30, 0.95), EnemyKind::Assassin);
        assert_eq!(regular_kind(30, 0.1), EnemyKind::Orc);
        assert_eq!(boss_minion_kind(25, 0.9), EnemyKind::Golem);
    }

    #[test]
    fn test_start_announces_then_schedules() {
        let mut session = running_session();
        assert_eq!(session.waves.phase, WavePhase::Announcing);
        assert_eq!(
            session.scheduler.pending().collect::<Vec<_>>(),
            vec![&TimedAction::BeginSpawning]
        );
        begin_spawning(&mut session);
        assert_eq!(session.waves.phase, WavePhase::Spawning);
        assert_eq!(session.waves.expected_enemies, 4);
        assert_eq!(session.scheduler.len(), 4 + 1);
    }

    #[test]
    fn test_completion_requires_every_gate() {
        let mut session = running_session();
        session.scheduler.clear();
        session.waves.phase = WavePhase::InProgress;
        session.waves.started = true;
        session.waves.expected_enemies = 5;
        session.waves.pending = (0..5)
            .map(|i| PendingSpawn {
                kind: EnemyKind::Orc,
                delay_ms: 0.0,
                spawned: i < 4,
            })
            .collect();
        session.waves.wave_kills = 4;
        assert!(!is_wave_complete(&session));

        // fifth spawns but is still alive
        session.waves.pending[4].spawned = true;
        let id = spawn_enemy(&mut session, EnemyKind::Orc);
        assert!(!is_wave_complete(&session));

        // killed without credit: still short one kill
        session.enemies.retain(|e| e.id != id);
        assert!(!is_wave_complete(&session));

        session.waves.wave_kills = 5;
        assert!(check_completion(&mut session));
        assert!(!session.is_running);
        assert_eq!(session.waves.phase, WavePhase::RewardSelection);
        assert!(session.offer.is_some());
    }

    #[test]
    fn test_manual_wave_end_blocks_completion() {
        let mut session = running_session();
        session.settings.debug.manual_wave_end = true;
        session.waves.phase = WavePhase::InProgress;
        session.waves.started = true;
        assert!(!is_wave_complete(&session));
        assert!(force_end_wave(&mut session).is_ok());
        assert_eq!(session.waves.phase, WavePhase::RewardSelection);
    }

    #[test]
    fn test_force_end_cancels_spawns_without_credit() {
        let mut session = running_session();
        begin_spawning(&mut session);
        spawn_slot(&mut session, 0);
        assert_eq!(session.enemies.len(), 1);
        assert!(force_end_wave(&mut session).is_ok());
        assert!(session.enemies.is_empty());
        assert_eq!(session.kills, 0);
        assert!(session.scheduler.pending().all(|a| !a.is_spawn()));
        assert_eq!(
            force_end_wave(&mut session),
            Err(CommandError::SessionNotActive)
        );
    }

    #[test]
    fn test_wave_end_expires_buffs_and_drops_strikes() {
        use crate::sim::state::Knight;

        let mut settings = Settings::default();
        settings.debug.no_enemies = true;
        let mut session = GameSession::new(settings);
        session.start();
        begin_spawning(&mut session);

        session.stats.damage_multiplier = 1.3;
        session.stats.invincible = true;
        session
            .scheduler
            .schedule_in(8000.0, TimedAction::RestoreDamageMultiplier(1.0));
        session
            .scheduler
            .schedule_in(5000.0, TimedAction::EndInvincibility);
        session.scheduler.schedule_in(
            1000.0,
            TimedAction::PoisonCloudPulse {
                per_second: 5.0,
                remaining: 3,
            },
        );
        session.knights.push(Knight {
            id: 99,
            pos: session.castle.pos,
            damage: 25.0,
            expires_at_ms: 10_000.0,
        });

        assert!(check_completion(&mut session));
        assert_eq!(session.stats.damage_multiplier, 1.0);
        assert!(!session.stats.invincible);
        assert!(session.knights.is_empty());
        assert!(session.scheduler.is_empty());
    }

    #[test]
    fn test_force_end_expires_buffs() {
        let mut session = running_session();
        session.stats.damage_multiplier = 1.5;
        session
            .scheduler
            .schedule_in(10_000.0, TimedAction::RestoreDamageMultiplier(1.0));
        assert!(force_end_wave(&mut session).is_ok());
        assert_eq!(session.stats.damage_multiplier, 1.0);
        assert!(session.scheduler.is_empty());
    }

    #[test]
    fn test_spawn_slot_fires_once() {
        let mut session = running_session();
        begin_spawning(&mut session);
        spawn_slot(&mut session, 1);
        spawn_slot(&mut session, 1);
        assert_eq!(session.enemies.len(), 1);
        assert!(!session.waves.all_spawned());
    }

    #[test]
    fn test_no_enemies_wave_completes_immediately() {
        let mut settings = Settings::default();
        settings.debug.no_enemies = true;
        let mut session = GameSession::new(settings);
        session.start();
        begin_spawning(&mut session);
        assert_eq!(session.waves.expected_enemies, 0);
        assert!(check_completion(&mut session));
    }

    #[test]
    fn test_debuffs_expire_and_reverse() {
        use crate::sim::state::ActiveDebuff;
        use crate::sim::stats::StatKey;

        let mut session = running_session();
        session.stats.overlay.apply(StatKey::DamageDebuffMult, 0.5);
        session.active_debuffs.push(ActiveDebuff {
            id: "weakened_arms".into(),
            remaining_waves: 2,
            key: StatKey::DamageDebuffMult,
            value: 0.5,
        });
        tick_down_debuffs(&mut session);
        assert_eq!(session.active_debuffs[0].remaining_waves, 1);
        assert_eq!(session.stats.overlay.damage_debuff_mult, 0.5);
        tick_down_debuffs(&mut session);
        assert!(session.active_debuffs.is_empty());
        assert!(session.stats.overlay.is_neutral());
    }
}
