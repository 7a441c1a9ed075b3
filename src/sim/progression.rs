//! Between-wave progression
//!
//! Drafting the end-of-wave offer (rewards or curses), applying the choice,
//! the full-deck swap gate, and the shop with its two reward boxes. Nothing
//! here advances the wave until every pending decision is settled.

use serde::{Deserialize, Serialize};

use super::cards::{self, AddCardOutcome};
use super::catalog::{
    ACTION_CARDS, DEBUFFS, DEVASTATING_DEBUFFS, DebuffEffect, InstantDebuff, Rarity, ShopItem,
    UPGRADES, debuff, pick_rarity, upgrade,
};
use super::combat;
use super::difficulty::{box_price_multiplier, shop_price_multiplier};
use super::events::GameEvent;
use super::state::{
    ActiveDebuff, CardContext, GameSession, RewardOffer, RewardOption,
};
use super::wave::{self, WavePhase};
use crate::consts::MYSTERY_BOX_LIMIT;
use crate::error::CommandError;
use crate::is_boss_wave;

const OFFER_SIZE: usize = 3;
const CURSE_OFFER_CHANCE: f64 = 0.15;
/// Curses are never offered up to and including this wave
const CURSE_GRACE_WAVES: u32 = 5;
const CARD_SLOT_CHANCE: f64 = 0.25;
const CATASTROPHE_CHANCE: f64 = 0.05;
const MYSTERY_CARD_CHANCE: f64 = 0.3;
const GOLDEN_MYTHIC_CHANCE: f64 = 0.2;
const GOLDEN_CARD_CHANCE: f64 = 0.3;
const MIN_MAX_HEALTH: f64 = 50.0;

// ---------------------------------------------------------------------------
// End-of-wave offer
// ---------------------------------------------------------------------------

/// Draft the end-of-wave offer and hold the session on it
pub fn open_offer(session: &mut GameSession) {
    let wave = session.wave;
    let offer = if wave > CURSE_GRACE_WAVES
        && !is_boss_wave(wave)
        && session.rng.chance(CURSE_OFFER_CHANCE)
    {
        RewardOffer::Curses(draft_curses(session))
    } else {
        RewardOffer::Rewards(draft_rewards(session))
    };
    log::info!("Wave {wave} offer: {offer:?}");
    session.offer = Some(offer);
}

fn draft_curses(session: &mut GameSession) -> Vec<String> {
    let mut picked: Vec<String> = Vec::with_capacity(OFFER_SIZE);
    while picked.len() < OFFER_SIZE.min(DEBUFFS.len()) {
        let Some(def) = session.rng.pick(DEBUFFS) else {
            break;
        };
        if !picked.iter().any(|id| id == def.id) {
            picked.push(def.id.to_string());
        }
    }
    picked
}

fn is_offered(offered: &[RewardOption], id: &str) -> bool {
    offered.iter().any(|o| o.id() == id)
}

/// `rarity` first, then the fallback tiers in order
fn rarity_search(rarity: Rarity) -> impl Iterator<Item = Rarity> {
    std::iter::once(rarity).chain(rarity.fallback_order())
}

fn draft_card(session: &mut GameSession, rarity: Rarity, offered: &[RewardOption]) -> Option<String> {
    for tier in rarity_search(rarity) {
        let pool: Vec<&'static str> = ACTION_CARDS
            .iter()
            .filter(|c| c.rarity == tier && !is_offered(offered, c.id))
            .map(|c| c.id)
            .collect();
        if let Some(id) = session.rng.pick(&pool) {
            return Some(id.to_string());
        }
    }
    None
}

fn draft_upgrade(
    session: &mut GameSession,
    rarity: Rarity,
    offered: &[RewardOption],
) -> Option<String> {
    for tier in rarity_search(rarity) {
        let pool: Vec<&'static str> = UPGRADES
            .iter()
            .filter(|u| {
                u.rarity == tier
                    && u.is_available(&session.earned_upgrades)
                    && !is_offered(offered, u.id)
            })
            .map(|u| u.id)
            .collect();
        if let Some(id) = session.rng.pick(&pool) {
            return Some(id.to_string());
        }
    }
    None
}

fn draft_rewards(session: &mut GameSession) -> Vec<RewardOption> {
    let wave = session.wave;
    let mut offered: Vec<RewardOption> = Vec::with_capacity(OFFER_SIZE);

    for _ in 0..OFFER_SIZE {
        let wants_card = session.rng.chance(CARD_SLOT_CHANCE);
        let rarity = pick_rarity(wave, &mut session.rng);
        if wants_card {
            if let Some(id) = draft_card(session, rarity, &offered) {
                offered.push(RewardOption::Card(id));
                continue;
            }
        }
        if let Some(id) = draft_upgrade(session, rarity, &offered) {
            offered.push(RewardOption::Upgrade(id));
        }
    }

    while offered.len() < OFFER_SIZE {
        let pool = filler_pool(&offered);
        let Some(id) = session.rng.pick(&pool) else {
            break;
        };
        offered.push(RewardOption::Upgrade(id.to_string()));
    }
    offered
}

/// Repeatable upgrades not yet on the offer; tops up a short draft
fn filler_pool(offered: &[RewardOption]) -> Vec<&'static str> {
    UPGRADES
        .iter()
        .filter(|u| u.repeatable && !is_offered(offered, u.id))
        .map(|u| u.id)
        .collect()
}

/// Take one option from the open reward offer
pub fn select_reward(session: &mut GameSession, option: &RewardOption) -> Result<(), CommandError> {
    if session.pending_card.is_some() {
        return Err(CommandError::CardPending);
    }
    let Some(RewardOffer::Rewards(options)) = &session.offer else {
        return Err(CommandError::NoRewardPending);
    };
    if !options.contains(option) {
        return Err(CommandError::NotOffered);
    }

    match option {
        RewardOption::Card(id) => {
            if cards::add_action_card(session, id, CardContext::Reward) == AddCardOutcome::Pending {
                return Ok(());
            }
        }
        RewardOption::Upgrade(id) => apply_upgrade(session, id),
    }
    wave::advance_wave(session);
    Ok(())
}

/// Take one curse from an open curse offer
pub fn select_curse(session: &mut GameSession, id: &str) -> Result<(), CommandError> {
    if session.pending_card.is_some() {
        return Err(CommandError::CardPending);
    }
    let Some(RewardOffer::Curses(options)) = &session.offer else {
        return Err(CommandError::NoRewardPending);
    };
    if !options.iter().any(|o| o == id) {
        return Err(CommandError::NotOffered);
    }
    apply_debuff_with_tracking(session, id);
    wave::advance_wave(session);
    Ok(())
}

/// How the player settles a card that arrived at a full deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardResolution {
    /// Replace the card in this deck slot
    Swap(usize),
    /// Throw the new card away
    Discard,
    /// Reward cards only: return to the offer and choose again
    Back,
}

pub fn resolve_pending_card(
    session: &mut GameSession,
    resolution: CardResolution,
) -> Result<(), CommandError> {
    let Some(pending) = session.pending_card.clone() else {
        return Err(CommandError::NoCardPending);
    };
    match resolution {
        CardResolution::Swap(index) => {
            let replaced = session
                .deck
                .replace(index, pending.card_id.clone())
                .ok_or(CommandError::InvalidCardIndex)?;
            log::debug!("Swapped {replaced} for {}", pending.card_id);
            session.emit(GameEvent::CardDiscarded { id: replaced });
            session.emit(GameEvent::CardAdded {
                id: pending.card_id,
            });
        }
        CardResolution::Discard => {
            session.emit(GameEvent::CardDiscarded {
                id: pending.card_id,
            });
        }
        CardResolution::Back => {
            if pending.context != CardContext::Reward {
                return Err(CommandError::NotOffered);
            }
            session.pending_card = None;
            return Ok(());
        }
    }
    session.pending_card = None;
    if pending.context == CardContext::Reward {
        wave::advance_wave(session);
    }
    Ok(())
}

/// Earn an upgrade: mutate base stats and record it
pub fn apply_upgrade(session: &mut GameSession, id: &str) {
    let Some(def) = upgrade(id) else {
        log::warn!("Unknown upgrade {id}");
        return;
    };
    for effect in def.effects {
        session.stats.apply_effect(effect);
    }
    session.earned_upgrades.push(def.id.to_string());
    if def.grants_garrison() {
        combat::sync_garrisons(session);
    }
    log::info!("Upgrade earned: {} ({})", def.name, def.rarity.as_str());
    session.emit(GameEvent::Upgrade {
        id: def.id.to_string(),
        rarity: def.rarity,
    });
    if def.rarity >= Rarity::Legendary {
        session.emit(GameEvent::LegendaryUpgrade {
            id: def.id.to_string(),
        });
    }
}

/// Apply a curse and remember it (timed curses also go on the expiry list)
pub fn apply_debuff_with_tracking(session: &mut GameSession, id: &str) {
    let Some(def) = debuff(id) else {
        log::warn!("Unknown curse {id}");
        return;
    };
    match def.effect {
        DebuffEffect::Overlay { key, value, waves } => {
            session.stats.overlay.apply(key, value);
            session.active_debuffs.push(ActiveDebuff {
                id: def.id.to_string(),
                remaining_waves: waves,
                key,
                value,
            });
        }
        DebuffEffect::Instant(instant) => apply_instant(session, instant),
    }
    session.applied_debuffs.push(def.id.to_string());
    log::info!("Curse applied: {}", def.name);
    session.emit(GameEvent::DebuffApplied {
        id: def.id.to_string(),
    });
}

fn apply_instant(session: &mut GameSession, instant: InstantDebuff) {
    match instant {
        InstantDebuff::ReduceMaxHealth(amount) => {
            session.stats.max_health = (session.stats.max_health - amount).max(MIN_MAX_HEALTH);
            session.castle.health = session.castle.health.min(session.stats.max_health);
        }
        InstantDebuff::KeepGold(fraction) => {
            session.gold = (session.gold as f64 * fraction).floor() as u64;
        }
        InstantDebuff::Damage(amount) => {
            session.castle.health = (session.castle.health - amount).max(1.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

/// Current price of a shop item
pub fn item_price(session: &GameSession, item: ShopItem) -> u64 {
    item.price(
        shop_price_multiplier(session.wave),
        box_price_multiplier(session.wave, session.power_ratio()),
    )
}

/// Whether the golden box is on sale this wave
pub fn golden_box_available(session: &GameSession) -> bool {
    is_boss_wave(session.wave) || session.force_golden_box
}

pub fn purchase(session: &mut GameSession, item: ShopItem) -> Result<(), CommandError> {
    if session.game_over || session.waves.phase != WavePhase::RewardSelection {
        return Err(CommandError::ShopClosed);
    }
    if session.pending_card.is_some() {
        return Err(CommandError::CardPending);
    }
    if item.is_repair() && session.castle.health >= session.stats.max_health {
        return Err(CommandError::HealthFull);
    }
    match item {
        ShopItem::MysteryBox if session.mystery_boxes_bought >= MYSTERY_BOX_LIMIT => {
            return Err(CommandError::MysteryBoxLimit);
        }
        ShopItem::GoldenBox if !golden_box_available(session) => {
            return Err(CommandError::GoldenBoxUnavailable);
        }
        ShopItem::GoldenBox if session.golden_box_bought => {
            return Err(CommandError::GoldenBoxAlreadyBought);
        }
        _ => {}
    }

    let price = item_price(session, item);
    let free = session.settings.debug.infinite_gold;
    if !free {
        if session.gold < price {
            return Err(CommandError::InsufficientGold);
        }
        session.gold -= price;
    }
    log::info!("Bought {} for {price} gold", item.name());
    session.emit(GameEvent::Purchase { item, price });

    match item {
        ShopItem::SmallRepair | ShopItem::MediumRepair | ShopItem::FullRepair => {
            match item.heal_amount() {
                Some(amount) => session.heal(amount),
                None => session.castle.health = session.stats.max_health,
            }
        }
        ShopItem::MysteryBox => {
            session.mystery_boxes_bought += 1;
            open_mystery_box(session);
        }
        ShopItem::GoldenBox => {
            session.golden_box_bought = true;
            open_golden_box(session);
        }
    }
    Ok(())
}

/// Bad outcomes a box can roll instead of its reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Catastrophe {
    /// Mystery box: a devastating curse
    Curse(&'static str),
    /// Golden box: half of the earned upgrades are destroyed
    ShatteredDreams,
    /// Golden box: castle health drops to 1
    DeathsTouch,
}

impl Catastrophe {
    pub fn name(self) -> &'static str {
        match self {
            Catastrophe::Curse(id) => debuff(id).map_or(id, |d| d.name),
            Catastrophe::ShatteredDreams => "Shattered Dreams",
            Catastrophe::DeathsTouch => "Death's Touch",
        }
    }
}

/// The shared 5% catastrophe roll; ineligible boxes never roll
fn catastrophe_strikes(session: &mut GameSession, eligible: bool) -> bool {
    eligible && session.rng.chance(CATASTROPHE_CHANCE)
}

fn befall(session: &mut GameSession, catastrophe: Catastrophe) {
    log::info!("Catastrophe: {}", catastrophe.name());
    session.emit(GameEvent::Catastrophe {
        name: catastrophe.name().to_string(),
    });
    match catastrophe {
        Catastrophe::Curse(id) => apply_debuff_with_tracking(session, id),
        Catastrophe::ShatteredDreams => {
            let to_remove = session.earned_upgrades.len() / 2;
            let mut garrisons_lost = 0;
            for _ in 0..to_remove {
                let idx = session.rng.index(session.earned_upgrades.len());
                let removed = session.earned_upgrades.remove(idx);
                if upgrade(&removed).is_some_and(|u| u.grants_garrison()) {
                    garrisons_lost += 1;
                }
            }
            if garrisons_lost > 0 {
                session.stats.garrison_count = session.stats.garrison_count.saturating_sub(garrisons_lost);
                combat::sync_garrisons(session);
            }
        }
        Catastrophe::DeathsTouch => session.castle.health = 1.0,
    }
}

fn box_opened(session: &mut GameSession, item: ShopItem, reward: &str) {
    log::info!("{} opened: {reward}", item.name());
    session.emit(GameEvent::BoxOpened {
        item,
        reward: reward.to_string(),
    });
}

fn open_mystery_box(session: &mut GameSession) {
    let eligible = session.wave > CURSE_GRACE_WAVES;
    if catastrophe_strikes(session, eligible) {
        if let Some(def) = session.rng.pick(DEVASTATING_DEBUFFS) {
            befall(session, Catastrophe::Curse(def.id));
        }
        return;
    }

    if session.rng.chance(MYSTERY_CARD_CHANCE) {
        if let Some(card) = session.rng.pick(ACTION_CARDS) {
            box_opened(session, ShopItem::MysteryBox, card.id);
            cards::add_action_card(session, card.id, CardContext::Box);
        }
        return;
    }

    let pool: Vec<&'static str> = UPGRADES
        .iter()
        .filter(|u| u.rarity != Rarity::Mythic && u.is_available(&session.earned_upgrades))
        .map(|u| u.id)
        .collect();
    if let Some(&id) = session.rng.pick(&pool) {
        box_opened(session, ShopItem::MysteryBox, id);
        apply_upgrade(session, id);
    }
}

fn open_golden_box(session: &mut GameSession) {
    if catastrophe_strikes(session, true) {
        let catastrophe = if session.rng.chance(0.5) {
            Catastrophe::ShatteredDreams
        } else {
            Catastrophe::DeathsTouch
        };
        befall(session, catastrophe);
        return;
    }

    let mythic = session.rng.chance(GOLDEN_MYTHIC_CHANCE);
    let wants_card = session.rng.chance(GOLDEN_CARD_CHANCE);
    if wants_card && !mythic {
        let legendary: Vec<&'static str> = ACTION_CARDS
            .iter()
            .filter(|c| c.rarity == Rarity::Legendary)
            .map(|c| c.id)
            .collect();
        if let Some(&id) = session.rng.pick(&legendary) {
            box_opened(session, ShopItem::GoldenBox, id);
            cards::add_action_card(session, id, CardContext::Box);
            return;
        }
    }

    let (target, fallback) = if mythic {
        (Rarity::Mythic, Rarity::Legendary)
    } else {
        (Rarity::Legendary, Rarity::Epic)
    };
    for tier in [target, fallback] {
        let pool: Vec<&'static str> = UPGRADES
            .iter()
            .filter(|u| u.rarity == tier && u.is_available(&session.earned_upgrades))
            .map(|u| u.id)
            .collect();
        if let Some(&id) = session.rng.pick(&pool) {
            box_opened(session, ShopItem::GoldenBox, id);
            apply_upgrade(session, id);
            return;
        }
    }
}
