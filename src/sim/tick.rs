//! Fixed timestep simulation tick
//!
//! One call advances a session by `dt_ms` of simulated time in a fixed order:
//! clock and regeneration, due timed actions, enemy movement, projectiles,
//! castle fire, defenders, then the wave completion check. Given the same seed
//! and the same input stream the result is bit-for-bit reproducible.

use super::cards;
use super::combat;
use super::schedule::TimedAction;
use super::state::GameSession;
use super::wave;

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Toggle the pause state
    pub pause: bool,
    /// Debug: end the current wave immediately
    pub force_end_wave: bool,
}

/// Advance the session by one step
pub fn tick(session: &mut GameSession, input: &TickInput, dt_ms: f64) {
    if input.pause && session.is_running && !session.game_over {
        session.is_paused = !session.is_paused;
        log::debug!("Paused: {}", session.is_paused);
    }

    if input.force_end_wave {
        if let Err(err) = wave::force_end_wave(session) {
            log::debug!("Force end ignored: {err}");
        }
    }

    if session.game_over || !session.is_running || session.is_paused {
        return;
    }

    session.scheduler.advance(dt_ms);
    combat::regenerate(session, dt_ms);

    // Actions queued while draining (zero-delay follow-ups) run this tick too
    while let Some(action) = session.scheduler.pop_due() {
        run_timed(session, action);
        if !session.is_running {
            return;
        }
    }

    combat::update_enemies(session, dt_ms);
    if !session.is_running {
        return;
    }
    session.sweep_dead();

    combat::update_projectiles(session, dt_ms);
    combat::castle_attack(session);
    combat::update_defenders(session, dt_ms);
    session.sweep_dead();

    wave::check_completion(session);
}

/// Carry out one deferred action
pub fn run_timed(session: &mut GameSession, action: TimedAction) {
    match action {
        TimedAction::BeginSpawning => wave::begin_spawning(session),
        TimedAction::Spawn { slot } => wave::spawn_slot(session, slot),
        TimedAction::VolleyArrow { candidates } => cards::volley_arrow(session, &candidates),
        TimedAction::Fireball { target } => cards::card_fireball(session, target),
        TimedAction::LightningHit { target, damage } | TimedAction::BreathHit { target, damage } => {
            combat::strike(session, target, damage)
        }
        TimedAction::MeteorFall { target, damage } => combat::meteor_fall(session, target, damage),
        TimedAction::MeteorImpact { target, damage } => {
            combat::meteor_impact(session, target, damage)
        }
        TimedAction::ApocalypseImpact { damage } => cards::apocalypse_impact(session, damage),
        TimedAction::PoisonCloudPulse {
            per_second,
            remaining,
        } => cards::poison_cloud_pulse(session, per_second, remaining),
        TimedAction::PoisonTick {
            target,
            damage,
            remaining,
        } => combat::poison_tick(session, target, damage, remaining),
        TimedAction::EndInvincibility => session.stats.invincible = false,
        TimedAction::RestoreDamageMultiplier(value) => session.stats.damage_multiplier = value,
    }
}

/// Run `action` now when `delay_ms` is zero, otherwise queue it
pub fn run_or_schedule(session: &mut GameSession, delay_ms: f64, action: TimedAction) {
    if delay_ms <= 0.0 {
        run_timed(session, action);
    } else {
        session.scheduler.schedule_in(delay_ms, action);
    }
}
