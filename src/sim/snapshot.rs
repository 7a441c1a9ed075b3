//! Read-only view of a session for the presentation layer

use glam::DVec2;
use serde::Serialize;

use super::catalog::EnemyKind;
use super::state::{EntityId, GameSession, ProjectileKind, RewardOffer};
use super::wave::WavePhase;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyView {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: DVec2,
    /// 0..=1
    pub health_pct: f64,
    pub boss: bool,
    pub slowed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileView {
    pub id: EntityId,
    pub kind: ProjectileKind,
    pub pos: DVec2,
    pub ricochet: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseView {
    pub id: String,
    pub remaining_waves: u32,
}

/// Everything a frame needs to draw
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub wave: u32,
    pub phase: WavePhase,
    pub running: bool,
    pub paused: bool,
    pub game_over: bool,
    pub gold: u64,
    pub kills: u32,
    pub power: u32,
    pub castle_pos: DVec2,
    pub castle_health: f64,
    pub castle_max_health: f64,
    pub castle_health_pct: f64,
    pub invincible: bool,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub garrisons: Vec<DVec2>,
    pub knights: Vec<DVec2>,
    pub deck: Vec<String>,
    pub curses: Vec<CurseView>,
    pub offer: Option<RewardOffer>,
    pub pending_card: Option<String>,
    pub manual_target: Option<DVec2>,
}

impl Snapshot {
    pub fn capture(session: &GameSession) -> Self {
        let now = session.now();
        let max_health = session.stats.max_health;
        let castle_health_pct = if max_health > 0.0 {
            (session.castle.health / max_health).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            wave: session.wave,
            phase: session.waves.phase,
            running: session.is_running,
            paused: session.is_paused,
            game_over: session.game_over,
            gold: session.gold,
            kills: session.kills,
            power: session.display_power(),
            castle_pos: session.castle.pos,
            castle_health: session.castle.health,
            castle_max_health: max_health,
            castle_health_pct,
            invincible: session.stats.invincible,
            enemies: session
                .enemies
                .iter()
                .filter(|e| e.is_alive())
                .map(|e| EnemyView {
                    id: e.id,
                    kind: e.kind,
                    pos: e.pos,
                    health_pct: e.health_fraction(),
                    boss: e.is_boss,
                    slowed: e.is_slowed(now),
                })
                .collect(),
            projectiles: session
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    kind: p.kind,
                    pos: p.pos,
                    ricochet: p.is_ricochet,
                })
                .collect(),
            garrisons: session.garrisons.iter().map(|g| g.pos).collect(),
            knights: session.knights.iter().map(|k| k.pos).collect(),
            deck: session.deck.cards().to_vec(),
            curses: session
                .active_debuffs
                .iter()
                .map(|d| CurseView {
                    id: d.id.clone(),
                    remaining_waves: d.remaining_waves,
                })
                .collect(),
            offer: session.offer.clone(),
            pending_card: session.pending_card.as_ref().map(|p| p.card_id.clone()),
            manual_target: session.manual_target,
        }
    }

    /// Serialize for debug tooling
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
