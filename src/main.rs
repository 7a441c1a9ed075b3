//! Kingdom Siege headless runner
//!
//! Drives a session at the fixed tick rate with a simple auto-player, which is
//! handy for balance checks and for reproducing a seed from a bug report.
//!
//! Usage: `kingdom-siege [--seed N] [--difficulty 1-10] [--waves N] [--settings FILE] [--cards]`

use std::error::Error;

use kingdom_siege::consts::TICK_MS;
use kingdom_siege::sim::{
    CardResolution, Command, GameEvent, GameSession, RewardOffer, ShopItem, Snapshot, TickInput,
    WavePhase, apply, tick,
};
use kingdom_siege::{Difficulty, Settings, WaveRecord};

/// Give up after this much simulated time regardless of progress
const MAX_SIM_MINUTES: f64 = 120.0;
/// Buy repairs below this share of max health
const REPAIR_BELOW: f64 = 0.6;
/// Play a card once this many enemies are on the field
const CARD_CROWD: usize = 6;

#[derive(Debug, Clone)]
struct Options {
    settings: Settings,
    max_waves: u32,
    play_cards: bool,
}

fn parse_args() -> Result<Options, Box<dyn Error>> {
    let mut settings = Settings::default();
    let mut seed = None;
    let mut difficulty = None;
    let mut max_waves = 20;
    let mut play_cards = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => seed = Some(next_value(&mut args, &arg)?.parse::<u64>()?),
            "--difficulty" => difficulty = Some(next_value(&mut args, &arg)?.parse::<u8>()?),
            "--waves" => max_waves = next_value(&mut args, &arg)?.parse()?,
            "--settings" => {
                let path = next_value(&mut args, &arg)?;
                settings = Settings::from_json(&std::fs::read_to_string(path)?)?;
            }
            "--cards" => play_cards = true,
            other => return Err(format!("unknown argument: {other}").into()),
        }
    }

    if let Some(seed) = seed {
        settings = settings.with_seed(seed);
    }
    if let Some(level) = difficulty {
        let difficulty =
            Difficulty::new(level).ok_or_else(|| format!("difficulty {level} is outside 1..=10"))?;
        settings = settings.with_difficulty(difficulty);
    }

    Ok(Options {
        settings,
        max_waves,
        play_cards,
    })
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, Box<dyn Error>> {
    args.next()
        .ok_or_else(|| format!("{flag} needs a value").into())
}

/// Send an auto-player command; a refusal is logged and play goes on
fn submit(session: &mut GameSession, command: Command) -> bool {
    match apply(session, &command) {
        Ok(()) => true,
        Err(err) => {
            log::debug!("Auto-player {command:?} refused: {err}");
            false
        }
    }
}

/// Settle the end-of-wave screen: repair, clear a pending card, take the first option
fn shop_and_choose(session: &mut GameSession) {
    let max_health = session.stats.max_health;
    if session.pending_card.is_some() {
        submit(
            session,
            Command::ResolveCard {
                resolution: CardResolution::Discard,
            },
        );
    }

    for item in [ShopItem::FullRepair, ShopItem::MediumRepair, ShopItem::SmallRepair] {
        if session.castle.health >= max_health * REPAIR_BELOW {
            break;
        }
        submit(session, Command::Purchase { item });
    }

    let command = match &session.offer {
        Some(RewardOffer::Rewards(options)) => options.first().map(|option| Command::SelectReward {
            option: option.clone(),
        }),
        Some(RewardOffer::Curses(options)) => {
            options.first().map(|id| Command::SelectCurse { id: id.clone() })
        }
        None => None,
    };
    if let Some(command) = command {
        submit(session, command);
    }
    // A reward card that found the deck full
    if session.pending_card.is_some() {
        submit(
            session,
            Command::ResolveCard {
                resolution: CardResolution::Discard,
            },
        );
    }
}

fn log_events(session: &mut GameSession) {
    for event in session.drain_events() {
        match event {
            GameEvent::WaveComplete { wave } => log::info!("Cleared wave {wave}"),
            GameEvent::BossKilled { kind, .. } => log::info!("Boss down: {kind:?}"),
            GameEvent::Catastrophe { name } => log::warn!("Catastrophe: {name}"),
            GameEvent::Upgrade { id, rarity } => log::info!("Upgrade {id} ({rarity:?})"),
            GameEvent::DebuffApplied { id } => log::info!("Cursed with {id}"),
            GameEvent::Error { message } => log::debug!("Refused: {message}"),
            _ => {}
        }
    }
}

fn run(options: &Options) -> Result<(), Box<dyn Error>> {
    let mut session = GameSession::new(options.settings.clone());
    let mut record = WaveRecord::new();
    apply(&mut session, &Command::Start)?;

    let input = TickInput::default();
    let max_ticks = (MAX_SIM_MINUTES * 60_000.0 / TICK_MS) as u64;
    let mut ticks = 0u64;

    while !session.game_over && session.wave <= options.max_waves && ticks < max_ticks {
        tick(&mut session, &input, TICK_MS);
        ticks += 1;

        if session.waves.phase == WavePhase::RewardSelection {
            log_events(&mut session);
            if session.wave >= options.max_waves {
                break;
            }
            shop_and_choose(&mut session);
        } else if options.play_cards
            && !session.deck.is_empty()
            && session.live_enemy_count() >= CARD_CROWD
        {
            submit(&mut session, Command::UseCard { index: 0 });
        }
        log_events(&mut session);
    }

    let summary = session.summary();
    log::info!(
        "Finished: wave {}, {} kills, {} gold earned, power {}, {:.1} min simulated",
        summary.wave,
        summary.kills,
        summary.total_gold_earned,
        session.display_power(),
        session.now() / 60_000.0
    );
    if record.submit(&summary) {
        log::info!("Best wave this run: {}", record.best_wave());
    }
    println!("{}", Snapshot::capture(&session).to_json()?);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Kingdom Siege (headless) starting...");

    let result = parse_args().and_then(|options| run(&options));
    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kingdom_siege::consts::WAVE_ANNOUNCE_MS;

    #[test]
    fn test_refused_command_reports_false() {
        let mut session = GameSession::new(Settings::default());
        assert!(!submit(
            &mut session,
            Command::Purchase {
                item: ShopItem::SmallRepair
            }
        ));
        assert!(
            session
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::Error { .. }))
        );
    }

    #[test]
    fn test_auto_player_clears_the_reward_screen() {
        let mut settings = Settings::default().with_seed(4);
        settings.debug.no_enemies = true;
        let mut session = GameSession::new(settings);
        assert!(submit(&mut session, Command::Start));
        let input = TickInput::default();
        for _ in 0..((WAVE_ANNOUNCE_MS / TICK_MS).ceil() as usize + 1) {
            tick(&mut session, &input, TICK_MS);
        }
        assert_eq!(session.waves.phase, WavePhase::RewardSelection);

        shop_and_choose(&mut session);
        assert_eq!(session.wave, 2);
        assert!(session.offer.is_none());
        assert!(session.pending_card.is_none());
    }
}
