//! Player and operator commands
//!
//! Every mutation the presentation layer can request goes through [`apply`].
//! A rejected command leaves the session untouched and raises a
//! [`GameEvent::Error`] carrying the message to show.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::cards;
use super::catalog::ShopItem;
use super::events::GameEvent;
use super::progression::{self, CardResolution};
use super::state::{GameSession, RewardOption};
use super::wave;
use crate::error::CommandError;
use crate::settings::Difficulty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Start,
    /// Aim the castle at a point, or clear the manual target
    SetManualTarget { target: Option<DVec2> },
    SelectReward { option: RewardOption },
    SelectCurse { id: String },
    ResolveCard { resolution: CardResolution },
    Purchase { item: ShopItem },
    UseCard { index: usize },
    TogglePause,
    SetDifficulty { level: u8 },
    /// Debug: end the current wave without kill credit
    ForceEndWave,
    /// Abandon the run and return to the menu
    Quit,
}

/// Apply one command to the session
pub fn apply(session: &mut GameSession, command: &Command) -> Result<(), CommandError> {
    let result = dispatch(session, command);
    if let Err(err) = result {
        log::debug!("Rejected {command:?}: {err}");
        session.emit(GameEvent::Error {
            message: err.to_string(),
        });
    }
    result
}

fn dispatch(session: &mut GameSession, command: &Command) -> Result<(), CommandError> {
    match command {
        Command::Start => {
            if session.is_running || session.game_over || session.wave > 0 {
                return Err(CommandError::SessionNotActive);
            }
            session.start();
            Ok(())
        }
        Command::SetManualTarget { target } => {
            if session.game_over {
                return Err(CommandError::SessionNotActive);
            }
            session.manual_target = *target;
            Ok(())
        }
        Command::SelectReward { option } => progression::select_reward(session, option),
        Command::SelectCurse { id } => progression::select_curse(session, id),
        Command::ResolveCard { resolution } => {
            progression::resolve_pending_card(session, *resolution)
        }
        Command::Purchase { item } => progression::purchase(session, *item),
        Command::UseCard { index } => cards::use_card(session, *index),
        Command::TogglePause => {
            if !session.is_running || session.game_over {
                return Err(CommandError::SessionNotActive);
            }
            session.is_paused = !session.is_paused;
            log::debug!("Paused: {}", session.is_paused);
            Ok(())
        }
        Command::SetDifficulty { level } => {
            let difficulty = Difficulty::new(*level).ok_or(CommandError::InvalidDifficulty)?;
            session.settings.difficulty = difficulty;
            log::info!("Difficulty set to {} ({})", level, difficulty.as_str());
            Ok(())
        }
        Command::ForceEndWave => wave::force_end_wave(session),
        Command::Quit => {
            if !session.is_active() {
                return Err(CommandError::SessionNotActive);
            }
            session.quit();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn errors(session: &mut GameSession) -> Vec<String> {
        session
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::Error { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_only_once() {
        let mut session = GameSession::new(Settings::default());
        assert_eq!(apply(&mut session, &Command::Start), Ok(()));
        assert_eq!(session.wave, 1);
        assert_eq!(
            apply(&mut session, &Command::Start),
            Err(CommandError::SessionNotActive)
        );
    }

    #[test]
    fn test_rejection_raises_error_event() {
        let mut session = GameSession::new(Settings::default());
        session.start();
        session.drain_events();
        let result = apply(
            &mut session,
            &Command::Purchase {
                item: ShopItem::SmallRepair,
            },
        );
        assert_eq!(result, Err(CommandError::ShopClosed));
        assert_eq!(errors(&mut session), vec!["The shop is closed".to_string()]);
    }

    #[test]
    fn test_toggle_pause_requires_running() {
        let mut session = GameSession::new(Settings::default());
        assert_eq!(
            apply(&mut session, &Command::TogglePause),
            Err(CommandError::SessionNotActive)
        );
        session.start();
        apply(&mut session, &Command::TogglePause).unwrap();
        assert!(session.is_paused);
        apply(&mut session, &Command::TogglePause).unwrap();
        assert!(!session.is_paused);
    }

    #[test]
    fn test_set_difficulty_bounds() {
        let mut session = GameSession::new(Settings::default());
        apply(&mut session, &Command::SetDifficulty { level: 9 }).unwrap();
        assert_eq!(session.settings.difficulty.get(), 9);
        assert_eq!(
            apply(&mut session, &Command::SetDifficulty { level: 11 }),
            Err(CommandError::InvalidDifficulty)
        );
        assert_eq!(session.settings.difficulty.get(), 9);
        assert_eq!(
            errors(&mut session),
            vec!["Difficulty must be between 1 and 10".to_string()]
        );
    }

    #[test]
    fn test_manual_target_set_and_cleared() {
        let mut session = GameSession::new(Settings::default());
        session.start();
        let point = DVec2::new(100.0, 200.0);
        apply(
            &mut session,
            &Command::SetManualTarget {
                target: Some(point),
            },
        )
        .unwrap();
        assert_eq!(session.manual_target, Some(point));
        apply(&mut session, &Command::SetManualTarget { target: None }).unwrap();
        assert_eq!(session.manual_target, None);
    }

    #[test]
    fn test_commands_parse_from_json() {
        let cmd: Command =
            serde_json::from_str(r#"{"type":"purchase","item":"smallRepair"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Purchase {
                item: ShopItem::SmallRepair
            }
        );

        let cmd: Command = serde_json::from_str(
            r#"{"type":"selectReward","option":{"kind":"upgrade","id":"sharp_arrows"}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::SelectReward {
                option: RewardOption::Upgrade("sharp_arrows".into())
            }
        );

        let cmd: Command =
            serde_json::from_str(r#"{"type":"resolveCard","resolution":{"swap":2}}"#).unwrap();
        assert_eq!(
            cmd,
            Command::ResolveCard {
                resolution: CardResolution::Swap(2)
            }
        );
    }

    #[test]
    fn test_quit_during_reward_selection() {
        let mut session = GameSession::new(Settings::default());
        session.settings.debug.no_enemies = true;
        session.start();
        wave::begin_spawning(&mut session);
        wave::check_completion(&mut session);
        assert!(session.offer.is_some());
        session.drain_events();

        apply(&mut session, &Command::Quit).unwrap();
        assert!(session.offer.is_none());
        assert!(!session.is_running);
        assert!(!session.game_over);
        assert!(session.drain_events().is_empty());
        assert_eq!(
            apply(&mut session, &Command::Quit),
            Err(CommandError::SessionNotActive)
        );
        assert_eq!(
            apply(
                &mut session,
                &Command::Purchase {
                    item: ShopItem::SmallRepair
                }
            ),
            Err(CommandError::ShopClosed)
        );
    }

    #[test]
    fn test_force_end_outside_combat_rejected() {
        let mut session = GameSession::new(Settings::default());
        assert_eq!(
            apply(&mut session, &Command::ForceEndWave),
            Err(CommandError::SessionNotActive)
        );
    }
}
