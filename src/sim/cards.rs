//! Action card deck and card effects
//!
//! Cards are one-shot plays held in a deck of at most six. A card arriving at
//! a full deck is parked as pending until the player swaps, discards, or (for
//! rewards) backs out; see [`super::progression::resolve_pending_card`].

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::catalog::{CardEffect, action_card};
use super::combat;
use super::events::GameEvent;
use super::schedule::TimedAction;
use super::state::{CardContext, EntityId, GameSession, Knight, PendingCard, ProjectileKind};
use super::tick::run_or_schedule;
use crate::consts::{KNIGHT_DAMAGE, MAX_DECK_SIZE};
use crate::error::CommandError;

const VOLLEY_STAGGER_MS: f64 = 50.0;
const FIREBALL_STAGGER_MS: f64 = 100.0;
const STORM_STAGGER_MS: f64 = 80.0;
const BREATH_STAGGER_MS: f64 = 50.0;
const APOCALYPSE_DELAY_MS: f64 = 600.0;
const SHIELD_BASH_PUSH: f64 = 150.0;
const SHIELD_BASH_SLOW_MS: f64 = 2000.0;
/// Enemies pushed by a shield bash stay this far inside the arena edge
const ARENA_INSET: f64 = 50.0;
const PHOENIX_REBIRTH_MULTIPLIER: f64 = 1.5;
const PHOENIX_REBIRTH_MS: f64 = 10_000.0;
const POISON_CLOUD_INTERVAL_MS: f64 = 1000.0;

/// The player's held action cards, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<String>,
}

impl Deck {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cards.len() >= MAX_DECK_SIZE
    }

    pub fn cards(&self) -> &[String] {
        &self.cards
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.cards.get(index).map(String::as_str)
    }

    pub(crate) fn push(&mut self, id: String) {
        self.cards.push(id);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.cards.len()).then(|| self.cards.remove(index))
    }

    /// Put `id` in slot `index`, returning the card it displaced
    pub(crate) fn replace(&mut self, index: usize, id: String) -> Option<String> {
        self.cards
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddCardOutcome {
    Added,
    /// Deck was full; the card waits in `pending_card`
    Pending,
}

pub fn add_action_card(session: &mut GameSession, id: &str, context: CardContext) -> AddCardOutcome {
    if session.deck.is_full() {
        log::debug!("Deck full, parking {id}");
        session.pending_card = Some(PendingCard {
            card_id: id.to_string(),
            context,
        });
        return AddCardOutcome::Pending;
    }
    session.deck.push(id.to_string());
    session.emit(GameEvent::CardAdded { id: id.to_string() });
    AddCardOutcome::Added
}

/// Play the card at `index`; only allowed mid-wave and unpaused
pub fn use_card(session: &mut GameSession, index: usize) -> Result<(), CommandError> {
    if !session.is_running || session.is_paused {
        return Err(CommandError::SessionNotActive);
    }
    let id = session
        .deck
        .get(index)
        .map(str::to_string)
        .ok_or(CommandError::InvalidCardIndex)?;
    let def = action_card(&id).ok_or(CommandError::UnknownItem)?;

    session.deck.remove(index);
    log::info!("Card played: {}", def.name);
    session.emit(GameEvent::CardUsed { id });
    play_effect(session, def.effect);
    Ok(())
}

fn live_ids(session: &GameSession) -> Vec<EntityId> {
    session
        .enemies
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| e.id)
        .collect()
}

/// Multiplier for card magic: transient buff × magic stat
fn magic_scale(session: &GameSession) -> f64 {
    session.stats.damage_multiplier * session.stats.magic_damage_multiplier
}

fn play_effect(session: &mut GameSession, effect: CardEffect) {
    let now = session.now();
    match effect {
        CardEffect::ArrowVolley(count) => {
            let candidates = live_ids(session);
            if candidates.is_empty() {
                return;
            }
            for i in 0..count {
                run_or_schedule(
                    session,
                    f64::from(i) * VOLLEY_STAGGER_MS,
                    TimedAction::VolleyArrow {
                        candidates: candidates.clone(),
                    },
                );
            }
        }
        CardEffect::Heal(amount) => session.heal(amount),
        CardEffect::ShieldBash => shield_bash(session),
        CardEffect::MultiFireball(count) => {
            let targets = combat::find_targets(session, count as usize);
            for (i, target) in targets.into_iter().enumerate() {
                run_or_schedule(
                    session,
                    i as f64 * FIREBALL_STAGGER_MS,
                    TimedAction::Fireball { target },
                );
            }
        }
        CardEffect::FreezeAll { ms } => {
            for enemy in session.enemies.iter_mut().filter(|e| e.is_alive()) {
                enemy.slow_until(now + ms);
            }
        }
        CardEffect::LightningStorm(count) => {
            let damage = session.stats.effective_damage() * 2.0 * session.stats.magic_damage_multiplier;
            let targets: Vec<_> = live_ids(session).into_iter().take(count as usize).collect();
            for (i, target) in targets.into_iter().enumerate() {
                run_or_schedule(
                    session,
                    i as f64 * STORM_STAGGER_MS,
                    TimedAction::LightningHit { target, damage },
                );
            }
        }
        CardEffect::DragonBreath(base) => {
            let damage = base * magic_scale(session);
            for (i, target) in live_ids(session).into_iter().enumerate() {
                run_or_schedule(
                    session,
                    i as f64 * BREATH_STAGGER_MS,
                    TimedAction::BreathHit { target, damage },
                );
            }
        }
        CardEffect::Invincibility { ms } => {
            session.stats.invincible = true;
            session
                .scheduler
                .cancel_where(|a| *a == TimedAction::EndInvincibility);
            session.scheduler.schedule_in(ms, TimedAction::EndInvincibility);
        }
        CardEffect::TimeWarp { ms } => {
            for enemy in session.enemies.iter_mut().filter(|e| e.is_alive()) {
                enemy.warped_until_ms = enemy.warped_until_ms.max(now + ms);
            }
        }
        CardEffect::Apocalypse(base) => {
            let damage = base * magic_scale(session);
            session
                .scheduler
                .schedule_in(APOCALYPSE_DELAY_MS, TimedAction::ApocalypseImpact { damage });
        }
        CardEffect::PhoenixRebirth => {
            session.castle.health = session.stats.max_health;
            session.stats.damage_multiplier = PHOENIX_REBIRTH_MULTIPLIER;
            session
                .scheduler
                .schedule_in(PHOENIX_REBIRTH_MS, TimedAction::RestoreDamageMultiplier(1.0));
        }
        CardEffect::GoldRush(amount) => session.add_gold(u64::from(amount)),
        CardEffect::BattleCry { ms, multiplier } => {
            let prior = session.stats.damage_multiplier;
            session.stats.damage_multiplier *= multiplier;
            session
                .scheduler
                .schedule_in(ms, TimedAction::RestoreDamageMultiplier(prior));
        }
        CardEffect::PoisonCloud { per_second, ms } => {
            let pulses = (ms / POISON_CLOUD_INTERVAL_MS).round().max(1.0) as u32;
            session.scheduler.schedule_in(
                POISON_CLOUD_INTERVAL_MS,
                TimedAction::PoisonCloudPulse {
                    per_second,
                    remaining: pulses - 1,
                },
            );
        }
        CardEffect::SummonKnight { ms } => {
            let id = session.next_entity_id();
            let knight = Knight {
                id,
                pos: session.castle.pos,
                damage: KNIGHT_DAMAGE * session.stats.damage_multiplier,
                expires_at_ms: now + ms,
            };
            session.knights.push(knight);
        }
    }
}

fn shield_bash(session: &mut GameSession) {
    let castle = session.castle.pos;
    let lo = DVec2::splat(ARENA_INSET);
    let hi = session.arena - DVec2::splat(ARENA_INSET);
    let until = session.now() + SHIELD_BASH_SLOW_MS;
    for enemy in session.enemies.iter_mut().filter(|e| e.is_alive()) {
        let away = enemy.pos - castle;
        if away.length() > 0.0 {
            enemy.pos = (enemy.pos + away.normalize() * SHIELD_BASH_PUSH).clamp(lo, hi.max(lo));
        }
        enemy.slow_until(until);
    }
}

/// One volley arrow at a random candidate; a dead pick is a wasted arrow
pub fn volley_arrow(session: &mut GameSession, candidates: &[EntityId]) {
    let Some(&target) = session.rng.pick(candidates) else {
        return;
    };
    if session.is_alive(target) {
        combat::fire_projectile(session, target, ProjectileKind::Arrow);
    }
}

pub fn card_fireball(session: &mut GameSession, target: EntityId) {
    if session.is_alive(target) {
        combat::fire_projectile(session, target, ProjectileKind::Fireball);
    }
}

pub fn apocalypse_impact(session: &mut GameSession, damage: f64) {
    for id in live_ids(session) {
        combat::damage_enemy(session, id, damage);
    }
}

pub fn poison_cloud_pulse(session: &mut GameSession, per_second: f64, remaining: u32) {
    let damage = per_second * magic_scale(session);
    for id in live_ids(session) {
        combat::damage_enemy(session, id, damage);
    }
    if remaining > 0 {
        session.scheduler.schedule_in(
            POISON_CLOUD_INTERVAL_MS,
            TimedAction::PoisonCloudPulse {
                per_second,
                remaining: remaining - 1,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::catalog::EnemyKind;
    use crate::sim::difficulty::ScaledEnemy;
    use crate::sim::state::Enemy;
    use crate::sim::tick::run_timed;

    fn session() -> GameSession {
        let mut session = GameSession::new(Settings::default());
        session.is_running = true;
        session.wave = 1;
        session
    }

    fn place(session: &mut GameSession, offset: DVec2, health: f64) -> EntityId {
        let id = session.next_entity_id();
        let scaled = ScaledEnemy {
            health,
            damage: 5.0,
            speed: 1.0,
        };
        let pos = session.castle.pos + offset;
        session
            .enemies
            .push(Enemy::spawn(id, EnemyKind::Orc, pos, scaled));
        id
    }

    fn run_until(session: &mut GameSession, ms: f64) {
        let mut elapsed = 0.0;
        while elapsed < ms {
            session.scheduler.advance(10.0);
            elapsed += 10.0;
            while let Some(action) = session.scheduler.pop_due() {
                run_timed(session, action);
            }
        }
    }

    fn hold(session: &mut GameSession, id: &str) {
        session.deck.push(id.to_string());
    }

    #[test]
    fn test_full_deck_parks_the_card() {
        let mut s = session();
        for _ in 0..MAX_DECK_SIZE {
            assert_eq!(
                add_action_card(&mut s, "quick_heal_c", CardContext::Box),
                AddCardOutcome::Added
            );
        }
        assert_eq!(
            add_action_card(&mut s, "apocalypse_l", CardContext::Reward),
            AddCardOutcome::Pending
        );
        assert_eq!(s.deck.len(), MAX_DECK_SIZE);
        assert_eq!(
            s.pending_card,
            Some(PendingCard {
                card_id: "apocalypse_l".into(),
                context: CardContext::Reward,
            })
        );
    }

    #[test]
    fn test_cards_only_play_mid_wave() {
        let mut s = session();
        hold(&mut s, "quick_heal_c");
        s.is_paused = true;
        assert_eq!(use_card(&mut s, 0), Err(CommandError::SessionNotActive));
        s.is_paused = false;
        assert_eq!(use_card(&mut s, 3), Err(CommandError::InvalidCardIndex));
        s.castle.health = 100.0;
        assert_eq!(use_card(&mut s, 0), Ok(()));
        assert_eq!(s.castle.health, 120.0);
        assert!(s.deck.is_empty());
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut s = session();
        hold(&mut s, "heal_wave_u");
        s.castle.health = 140.0;
        use_card(&mut s, 0).unwrap();
        assert_eq!(s.castle.health, 150.0);
    }

    #[test]
    fn test_volley_fires_staggered_arrows() {
        let mut s = session();
        place(&mut s, DVec2::new(100.0, 0.0), 1e6);
        hold(&mut s, "arrow_volley_c");
        use_card(&mut s, 0).unwrap();
        assert_eq!(s.projectiles.len(), 1);
        run_until(&mut s, 500.0);
        assert_eq!(s.projectiles.len(), 10);
    }

    #[test]
    fn test_battle_cry_restores_prior_multiplier() {
        let mut s = session();
        s.stats.damage_multiplier = 1.5;
        hold(&mut s, "battle_cry_u");
        use_card(&mut s, 0).unwrap();
        assert!((s.stats.damage_multiplier - 1.95).abs() < 1e-9);
        run_until(&mut s, 8000.0);
        assert_eq!(s.stats.damage_multiplier, 1.5);
    }

    #[test]
    fn test_lightning_storm_damage_is_fixed_at_cast() {
        let mut s = session();
        s.stats.damage_multiplier = 1.5;
        s.stats.magic_damage_multiplier = 1.2;
        let first = place(&mut s, DVec2::new(100.0, 0.0), 1000.0);
        let second = place(&mut s, DVec2::new(0.0, 100.0), 1000.0);
        hold(&mut s, "lightning_storm_r");
        use_card(&mut s, 0).unwrap();

        let expected = 25.0 * 1.5 * 2.0 * 1.2;
        let health = |s: &GameSession, id| s.enemies.iter().find(|e| e.id == id).unwrap().health;
        assert!((health(&s, first) - (1000.0 - expected)).abs() < 1e-9);
        assert_eq!(health(&s, second), 1000.0);

        s.stats.damage_multiplier = 1.0;
        run_until(&mut s, STORM_STAGGER_MS);
        assert!((health(&s, second) - (1000.0 - expected)).abs() < 1e-9);
    }

    #[test]
    fn test_divine_shield_refreshes() {
        let mut s = session();
        hold(&mut s, "divine_shield_e");
        hold(&mut s, "divine_shield_e");
        use_card(&mut s, 0).unwrap();
        run_until(&mut s, 4000.0);
        use_card(&mut s, 0).unwrap();
        run_until(&mut s, 2000.0);
        assert!(s.stats.invincible);
        run_until(&mut s, 3000.0);
        assert!(!s.stats.invincible);
    }

    #[test]
    fn test_shield_bash_pushes_and_clamps() {
        let mut s = session();
        let near = place(&mut s, DVec2::new(100.0, 0.0), 100.0);
        let edge = place(&mut s, DVec2::new(0.0, 300.0), 100.0);
        hold(&mut s, "shield_bash_u");
        use_card(&mut s, 0).unwrap();
        let castle = s.castle.pos;
        assert!(s.enemy(near).is_some_and(|e| (e.pos - (castle + DVec2::new(250.0, 0.0))).length() < 1e-9));
        assert!(s.enemy(edge).is_some_and(|e| e.pos.y == 750.0 && e.is_slowed(0.0)));
    }

    #[test]
    fn test_poison_cloud_pulses_five_times() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(200.0, 0.0), 100.0);
        hold(&mut s, "poison_cloud_r");
        use_card(&mut s, 0).unwrap();
        run_until(&mut s, 10_000.0);
        assert!(s.enemy(id).is_some_and(|e| (e.health - 75.0).abs() < 1e-9));
    }

    #[test]
    fn test_apocalypse_lands_after_delay() {
        let mut s = session();
        let a = place(&mut s, DVec2::new(200.0, 0.0), 250.0);
        let b = place(&mut s, DVec2::new(-200.0, 0.0), 500.0);
        hold(&mut s, "apocalypse_l");
        use_card(&mut s, 0).unwrap();
        run_until(&mut s, 590.0);
        assert!(s.is_alive(a));
        run_until(&mut s, 20.0);
        assert!(!s.is_alive(a));
        assert!(s.enemy(b).is_some_and(|e| e.health == 200.0));
    }

    #[test]
    fn test_phoenix_rebirth_heals_and_boosts() {
        let mut s = session();
        s.castle.health = 10.0;
        hold(&mut s, "phoenix_rebirth_l");
        use_card(&mut s, 0).unwrap();
        assert_eq!(s.castle.health, 150.0);
        assert_eq!(s.stats.damage_multiplier, 1.5);
        run_until(&mut s, 10_000.0);
        assert_eq!(s.stats.damage_multiplier, 1.0);
    }

    #[test]
    fn test_summoned_knight_expires() {
        let mut s = session();
        hold(&mut s, "summon_knight_e");
        use_card(&mut s, 0).unwrap();
        assert_eq!(s.knights.len(), 1);
        s.scheduler.advance(10_000.0);
        combat::update_defenders(&mut s, 50.0);
        assert!(s.knights.is_empty());
    }
}
