//! Combat resolution
//!
//! Enemy movement and attacks, castle targeting and firing, projectile travel
//! and hit effects, damage and the kill pipeline, and the autonomous
//! defenders. Deaths are queued and resolved one at a time so a chain of
//! explosions can never pay out or explode the same enemy twice.

use glam::DVec2;

use super::events::GameEvent;
use super::schedule::TimedAction;
use super::state::{
    EnemyLife, EntityId, GameSession, Garrison, Projectile, ProjectileKind,
};
use super::tick::run_or_schedule;
use crate::consts::*;
use crate::step_toward;

/// Guards idle within this distance of their post
const HOME_TOLERANCE: f64 = 5.0;
const GARRISON_CHASE_STEP: f64 = 3.0;
const GARRISON_RETURN_STEP: f64 = 2.0;
/// Enemies under this health fraction take the execute bonus
const EXECUTE_THRESHOLD: f64 = 0.25;
const POISON_PULSES: u32 = 3;
const POISON_INTERVAL_MS: f64 = 1000.0;
const LIGHTNING_STAGGER_MS: f64 = 100.0;
const LIGHTNING_FALLOFF: f64 = 0.2;
const METEOR_STAGGER_MS: f64 = 200.0;
const METEOR_FALL_MS: f64 = 600.0;
const INFINITY_EVERY: u64 = 4;

#[inline]
fn tick_scale(dt_ms: f64) -> f64 {
    dt_ms / TICK_MS
}

#[inline]
fn cooldown_ready(last: Option<f64>, now: f64, cooldown_ms: f64) -> bool {
    last.is_none_or(|t| now - t > cooldown_ms)
}

/// Castle passive regeneration (per second, scaled by the step)
pub fn regenerate(session: &mut GameSession, dt_ms: f64) {
    if session.settings.debug.infinite_health {
        session.castle.health = session.stats.max_health;
        return;
    }
    if session.stats.regen > 0.0 {
        session.heal(session.stats.regen * dt_ms / 1000.0);
    }
}

/// Live enemies within `radius` of `center`, collected before any damage lands
pub fn enemies_within(
    session: &GameSession,
    center: DVec2,
    radius: f64,
    exclude: Option<EntityId>,
) -> Vec<EntityId> {
    session
        .enemies
        .iter()
        .filter(|e| e.is_alive() && Some(e.id) != exclude && e.pos.distance(center) < radius)
        .map(|e| e.id)
        .collect()
}

fn closest_alive(session: &GameSession, from: DVec2) -> Option<(EntityId, DVec2, f64)> {
    session
        .enemies
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| (e.id, e.pos, e.pos.distance(from)))
        .min_by(|a, b| a.2.total_cmp(&b.2))
}

fn is_targeted(session: &GameSession, id: EntityId, skip: Option<usize>) -> bool {
    session
        .projectiles
        .iter()
        .enumerate()
        .any(|(j, p)| Some(j) != skip && p.target == id)
}

// ---------------------------------------------------------------------------
// Enemies
// ---------------------------------------------------------------------------

/// Move every live enemy toward the castle, or attack once in reach
pub fn update_enemies(session: &mut GameSession, dt_ms: f64) {
    let now = session.now();
    let castle = session.castle.pos;
    let speed_factor = session.stats.enemy_speed_factor();
    let scale = tick_scale(dt_ms);

    for idx in 0..session.enemies.len() {
        if !session.is_running {
            break;
        }
        let Some(enemy) = session.enemies.get_mut(idx) else {
            break;
        };
        if !enemy.is_alive() {
            continue;
        }

        let dist = enemy.pos.distance(castle);
        if dist > enemy.range {
            let mut speed = enemy.speed * speed_factor;
            if enemy.is_slowed(now) {
                speed *= SLOWED_SPEED_FACTOR;
            }
            if enemy.is_warped(now) {
                speed *= TIME_WARP_SPEED_FACTOR;
            }
            enemy.pos = step_toward(enemy.pos, castle, speed * scale);
        } else if cooldown_ready(enemy.last_attack_ms, now, ENEMY_ATTACK_COOLDOWN_MS) {
            enemy.last_attack_ms = Some(now);
            let (id, damage, ranged) = (enemy.id, enemy.damage, enemy.ranged);
            attack_castle(session, id, damage, ranged);
        }
    }
}

/// One enemy attack against the castle
pub fn attack_castle(session: &mut GameSession, attacker: EntityId, damage: f64, ranged: bool) {
    if session.stats.invincible {
        session.emit(GameEvent::Blocked);
        return;
    }
    let block = session.stats.block_chance;
    if block > 0.0 && session.rng.chance(block) {
        session.emit(GameEvent::Blocked);
        return;
    }
    let dodge = session.stats.dodge_chance;
    if dodge > 0.0 && session.rng.chance(dodge) {
        session.emit(GameEvent::Dodged);
        return;
    }
    if session.settings.debug.infinite_health {
        session.castle.health = session.stats.max_health;
        return;
    }

    let dealt = damage
        * session.stats.enemy_damage_factor()
        * (1.0 - session.stats.effective_armor()).max(0.0);
    session.castle.health -= dealt;
    session.emit(GameEvent::CastleHit { damage: dealt });

    let (reflect, thorns) = (session.stats.reflect_damage, session.stats.thorns);
    if ranged && reflect > 0.0 {
        damage_enemy(session, attacker, dealt * reflect);
    }
    if thorns > 0.0 {
        damage_enemy(session, attacker, thorns);
    }

    if session.castle.health <= 0.0 {
        castle_down(session);
    }
}

fn castle_down(session: &mut GameSession) {
    if session.stats.has_guardian && !session.guardian_used {
        session.guardian_used = true;
        session.castle.health = 1.0;
        log::info!("Guardian Angel holds the castle at 1 HP");
        session.emit(GameEvent::GuardianSaved);
    } else if session.stats.has_phoenix && !session.phoenix_used {
        session.phoenix_used = true;
        session.castle.health = session.stats.max_health * 0.75;
        log::info!("Phoenix Heart revives the castle");
        session.emit(GameEvent::PhoenixRevived);
    } else {
        session.end_game();
    }
}

// ---------------------------------------------------------------------------
// Damage and death
// ---------------------------------------------------------------------------

/// Apply damage to a live enemy; returns the damage that landed
pub fn damage_enemy(session: &mut GameSession, id: EntityId, amount: f64) -> f64 {
    if amount <= 0.0 {
        return 0.0;
    }
    let Some(enemy) = session.enemy_mut(id) else {
        return 0.0;
    };
    if !enemy.is_alive() {
        return 0.0;
    }
    enemy.health -= amount;
    if enemy.health <= 0.0 {
        enemy.life = EnemyLife::Dying;
        session.death_queue.push_back(id);
        if !session.resolving_deaths {
            resolve_deaths(session);
        }
    }
    amount
}

fn resolve_deaths(session: &mut GameSession) {
    session.resolving_deaths = true;
    while let Some(id) = session.death_queue.pop_front() {
        kill_enemy(session, id);
    }
    session.resolving_deaths = false;
}

fn kill_enemy(session: &mut GameSession, id: EntityId) {
    let Some(enemy) = session.enemy_mut(id) else {
        return;
    };
    if enemy.life != EnemyLife::Dying {
        return;
    }
    enemy.life = EnemyLife::Dead;
    let (kind, pos, value, max_health) = (enemy.kind, enemy.pos, enemy.value, enemy.max_health);

    session.kills += 1;
    session.waves.wave_kills += 1;

    let gold_reward = session.multipliers().gold_reward;
    let base = (value * 5.0 * gold_reward).round();
    let gold = ((base * session.stats.gold_multiplier).round() + session.stats.bonus_gold_on_kill)
        .max(0.0) as u64;
    session.add_gold(gold);
    log::debug!("Killed {kind:?} #{id} for {gold} gold");
    session.emit(GameEvent::EnemyKilled { id, kind, gold });
    if kind.is_heavy() {
        session.emit(GameEvent::BossKilled { id, kind });
    }

    if session.stats.death_explosion {
        let damage =
            ((max_health * DEATH_EXPLOSION_FACTOR).round() * session.stats.magic_damage_multiplier)
                .round();
        let targets = enemies_within(session, pos, DEATH_EXPLOSION_RADIUS, Some(id));
        session.emit(GameEvent::DeathExplosion { id, damage });
        for target in targets {
            damage_enemy(session, target, damage);
        }
    }
}

fn splash(session: &mut GameSession, center: DVec2, radius: f64, exclude: Option<EntityId>, damage: f64) {
    for id in enemies_within(session, center, radius, exclude) {
        damage_enemy(session, id, damage);
    }
}

// ---------------------------------------------------------------------------
// Castle targeting and firing
// ---------------------------------------------------------------------------

/// Up to `count` in-range targets for the castle
///
/// With a manual target the nearest enemies to that point win. Otherwise the
/// nearest enemies to the castle win, preferring ones nothing is flying at.
pub fn find_targets(session: &GameSession, count: usize) -> Vec<EntityId> {
    let castle = session.castle.pos;
    let range = session.stats.attack_range_px(session.arena);
    let in_range: Vec<(EntityId, DVec2)> = session
        .enemies
        .iter()
        .filter(|e| e.is_alive() && e.pos.distance(castle) <= range)
        .map(|e| (e.id, e.pos))
        .collect();

    let (mut pool, anchor) = match session.manual_target {
        Some(point) => (in_range, point),
        None => {
            let untargeted: Vec<_> = in_range
                .iter()
                .copied()
                .filter(|&(id, _)| !is_targeted(session, id, None))
                .collect();
            if untargeted.is_empty() {
                (in_range, castle)
            } else {
                (untargeted, castle)
            }
        }
    };
    pool.sort_by(|a, b| a.1.distance(anchor).total_cmp(&b.1.distance(anchor)));
    pool.into_iter().take(count).map(|(id, _)| id).collect()
}

/// Damage for the next castle arrow, counting it toward Infinity
fn next_arrow_damage(session: &mut GameSession) -> f64 {
    let stats = &session.stats;
    let mut damage = stats.effective_damage() * stats.berserker_multiplier(session.castle.health);
    session.arrows_fired += 1;
    if stats.has_infinity && session.arrows_fired % INFINITY_EVERY == 0 {
        damage *= 3.0;
    }
    damage
}

/// Launch a projectile from the castle with fully resolved damage
pub fn fire_projectile(session: &mut GameSession, target: EntityId, kind: ProjectileKind) {
    let damage = match kind {
        ProjectileKind::Arrow => next_arrow_damage(session),
        ProjectileKind::Fireball => {
            let stats = &session.stats;
            stats.effective_damage()
                * 2.0
                * stats.magic_damage_multiplier
                * stats.berserker_multiplier(session.castle.health)
        }
    };
    let id = session.next_entity_id();
    let origin = session.castle.pos;
    session
        .projectiles
        .push(Projectile::new(id, origin, target, kind, damage));
    match kind {
        ProjectileKind::Arrow => session.emit(GameEvent::ArrowFired { target }),
        ProjectileKind::Fireball => session.emit(GameEvent::FireballCast { target }),
    }
}

/// Castle auto-attack plus the unlocked abilities, gated by the arrow cooldown
pub fn castle_attack(session: &mut GameSession) {
    let now = session.now();
    let interval = session.stats.attack_interval_ms();
    if session.last_attack_ms.is_some_and(|t| now - t < interval) {
        return;
    }
    if session.live_enemy_count() == 0 {
        return;
    }
    session.last_attack_ms = Some(now);

    for target in find_targets(session, session.stats.projectiles as usize) {
        fire_projectile(session, target, ProjectileKind::Arrow);
    }

    if session.stats.has_fireball && cooldown_ready(session.last_fireball_ms, now, FIREBALL_COOLDOWN_MS) {
        if let Some(&target) = find_targets(session, 1).first() {
            fire_projectile(session, target, ProjectileKind::Fireball);
            session.last_fireball_ms = Some(now);
        }
    }
    if session.stats.has_lightning
        && cooldown_ready(session.last_lightning_ms, now, LIGHTNING_COOLDOWN_MS)
    {
        if let Some(&target) = find_targets(session, 1).first() {
            chain_lightning(session, target);
            session.last_lightning_ms = Some(now);
        }
    }
    if session.stats.has_meteor && cooldown_ready(session.last_meteor_ms, now, METEOR_COOLDOWN_MS) {
        let targets = find_targets(session, METEOR_TARGETS);
        if !targets.is_empty() {
            cast_meteors(session, &targets);
            session.last_meteor_ms = Some(now);
        }
    }
}

/// Lightning on `first` and up to two more enemies, each near the last
pub fn chain_lightning(session: &mut GameSession, first: EntityId) {
    let Some(mut last_pos) = session.enemy(first).map(|e| e.pos) else {
        return;
    };
    let mut chain = vec![first];
    for _ in 0..LIGHTNING_CHAIN_LINKS {
        let next = session.enemies.iter().find(|e| {
            e.is_alive() && !chain.contains(&e.id) && e.pos.distance(last_pos) < LIGHTNING_CHAIN_RADIUS
        });
        let Some(next) = next else { break };
        last_pos = next.pos;
        chain.push(next.id);
    }

    let base = session.stats.effective_damage() * session.stats.magic_damage_multiplier;
    session.emit(GameEvent::LightningCast {
        targets: chain.clone(),
    });
    for (i, target) in chain.into_iter().enumerate() {
        let damage = base * (1.0 - LIGHTNING_FALLOFF * i as f64);
        run_or_schedule(
            session,
            i as f64 * LIGHTNING_STAGGER_MS,
            TimedAction::LightningHit { target, damage },
        );
    }
}

pub fn cast_meteors(session: &mut GameSession, targets: &[EntityId]) {
    let damage = session.stats.effective_damage() * 3.0 * session.stats.magic_damage_multiplier;
    for (i, &target) in targets.iter().enumerate() {
        run_or_schedule(
            session,
            i as f64 * METEOR_STAGGER_MS,
            TimedAction::MeteorFall { target, damage },
        );
    }
}

/// Damage a single enemy if it is still standing (staggered strikes)
pub fn strike(session: &mut GameSession, target: EntityId, damage: f64) {
    if !session.is_alive(target) {
        return;
    }
    let dealt = damage_enemy(session, target, damage);
    session.emit(GameEvent::EnemyHit {
        id: target,
        damage: dealt,
        crit: false,
    });
}

pub fn meteor_fall(session: &mut GameSession, target: EntityId, damage: f64) {
    if !session.is_alive(target) {
        return;
    }
    session.emit(GameEvent::MeteorIncoming { target });
    session
        .scheduler
        .schedule_in(METEOR_FALL_MS, TimedAction::MeteorImpact { target, damage });
}

pub fn meteor_impact(session: &mut GameSession, target: EntityId, damage: f64) {
    let Some(center) = session.enemy(target).filter(|e| e.is_alive()).map(|e| e.pos) else {
        return;
    };
    let splash_targets = enemies_within(session, center, METEOR_RADIUS, Some(target));
    strike(session, target, damage);
    for id in splash_targets {
        damage_enemy(session, id, damage * IMPACT_SPLASH_FACTOR);
    }
}

pub fn poison_tick(session: &mut GameSession, target: EntityId, damage: f64, remaining: u32) {
    if !session.is_alive(target) {
        return;
    }
    damage_enemy(session, target, damage);
    if remaining > 1 && session.is_alive(target) {
        session.scheduler.schedule_in(
            POISON_INTERVAL_MS,
            TimedAction::PoisonTick {
                target,
                damage,
                remaining: remaining - 1,
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Projectiles
// ---------------------------------------------------------------------------

/// Closest-to-castle enemy a bouncing arrow may take next
fn ricochet_target(
    session: &GameSession,
    skip: usize,
    hit: &[EntityId],
    claimed: &[EntityId],
    spawned: &[Projectile],
) -> Option<EntityId> {
    let castle = session.castle.pos;
    session
        .enemies
        .iter()
        .filter(|e| e.is_alive() && !hit.contains(&e.id) && !claimed.contains(&e.id))
        .filter(|e| !is_targeted(session, e.id, Some(skip)))
        .filter(|e| !spawned.iter().any(|p| p.target == e.id))
        .min_by(|a, b| a.pos.distance(castle).total_cmp(&b.pos.distance(castle)))
        .map(|e| e.id)
}

/// Advance every projectile; resolve hits; spawn ricochets after the pass
pub fn update_projectiles(session: &mut GameSession, dt_ms: f64) {
    let scale = tick_scale(dt_ms);
    let ricochet_stat = session.stats.ricochet;
    let count = session.projectiles.len();
    let mut spent = vec![false; count];
    let mut claimed: Vec<EntityId> = Vec::new();
    let mut spawned: Vec<Projectile> = Vec::new();

    for i in 0..count {
        let Some(p) = session.projectiles.get(i) else {
            break;
        };
        let mut target = p.target;

        if !session.is_alive(target) {
            let can_bounce =
                p.is_ricochet || (p.kind == ProjectileKind::Arrow && ricochet_stat > 0);
            let next = if can_bounce {
                ricochet_target(session, i, &p.hit_enemies, &claimed, &spawned)
            } else {
                None
            };
            match next {
                Some(id) => {
                    log::debug!("Projectile #{} retargets to #{id}", p.id);
                    claimed.push(id);
                    session.projectiles[i].target = id;
                    target = id;
                }
                None => {
                    spent[i] = true;
                    continue;
                }
            }
        }

        let Some(target_pos) = session.enemy(target).map(|e| e.pos) else {
            spent[i] = true;
            continue;
        };
        let p = &mut session.projectiles[i];
        if p.pos.distance(target_pos) < PROJECTILE_HIT_RADIUS {
            spent[i] = true;
            let projectile = p.clone();
            resolve_hit(session, i, &projectile, &mut claimed, &mut spawned);
        } else {
            p.pos = step_toward(p.pos, target_pos, p.speed * scale);
        }
    }

    if session.projectiles.len() != count {
        // Session was torn down mid-pass
        return;
    }
    let mut idx = 0;
    session.projectiles.retain(|_| {
        let keep = !spent[idx];
        idx += 1;
        keep
    });
    for p in spawned {
        if session.is_alive(p.target) {
            session.projectiles.push(p);
        }
    }
}

fn resolve_hit(
    session: &mut GameSession,
    index: usize,
    p: &Projectile,
    claimed: &mut Vec<EntityId>,
    spawned: &mut Vec<Projectile>,
) {
    let target = p.target;
    let Some((impact, health, max_health)) = session
        .enemy(target)
        .map(|e| (e.pos, e.health, e.max_health))
    else {
        return;
    };

    let mut damage = p.damage;
    let crit = session.rng.chance(session.stats.effective_crit_chance());
    if crit {
        damage *= session.stats.crit_damage;
    }
    if session.stats.execute_damage > 0.0 && health < max_health * EXECUTE_THRESHOLD {
        damage *= 1.0 + session.stats.execute_damage;
    }

    let dealt = damage_enemy(session, target, damage);
    session.emit(GameEvent::EnemyHit {
        id: target,
        damage: dealt,
        crit,
    });
    if session.stats.life_steal > 0.0 && dealt > 0.0 {
        session.heal(dealt * session.stats.life_steal);
    }

    match p.kind {
        ProjectileKind::Arrow if session.stats.explosive_arrows => splash(
            session,
            impact,
            EXPLOSIVE_ARROW_RADIUS,
            Some(target),
            damage * IMPACT_SPLASH_FACTOR,
        ),
        ProjectileKind::Fireball => splash(
            session,
            impact,
            FIREBALL_RADIUS,
            None,
            damage * IMPACT_SPLASH_FACTOR,
        ),
        ProjectileKind::Arrow => {}
    }
    if p.kind == ProjectileKind::Arrow && session.stats.splash_damage > 0.0 {
        let amount = damage * session.stats.splash_damage;
        splash(session, impact, SPLASH_STAT_RADIUS, Some(target), amount);
    }

    let freeze = session.stats.freeze_chance;
    if freeze > 0.0 && session.rng.chance(freeze) {
        let until = session.now() + FREEZE_DURATION_MS;
        if let Some(enemy) = session.enemy_mut(target) {
            enemy.slow_until(until);
        }
    }

    if session.stats.poison_damage > 0.0 && session.is_alive(target) {
        session.scheduler.schedule_in(
            POISON_INTERVAL_MS,
            TimedAction::PoisonTick {
                target,
                damage: session.stats.poison_damage / f64::from(POISON_PULSES),
                remaining: POISON_PULSES,
            },
        );
    }

    if p.kind == ProjectileKind::Arrow && p.bounces < session.stats.ricochet {
        let mut hit = p.hit_enemies.clone();
        if !hit.contains(&target) {
            hit.push(target);
        }
        if let Some(next) = ricochet_target(session, index, &hit, claimed, spawned) {
            claimed.push(next);
            let id = session.next_entity_id();
            log::debug!("Ricochet {} -> #{next}", p.bounces + 1);
            spawned.push(Projectile {
                id,
                pos: impact,
                target: next,
                kind: ProjectileKind::Arrow,
                speed: RICOCHET_SPEED,
                damage: p.damage * RICOCHET_DAMAGE_FACTOR,
                bounces: p.bounces + 1,
                hit_enemies: hit,
                is_ricochet: true,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Garrison guards and summoned knights
// ---------------------------------------------------------------------------

/// Add or remove guards until they match the garrison count
pub fn sync_garrisons(session: &mut GameSession) {
    let wanted = session.stats.garrison_count as usize;
    if session.garrisons.len() > wanted {
        session.garrisons.truncate(wanted);
    }
    while session.garrisons.len() < wanted {
        let n = session.garrisons.len() as f64;
        let angle = n * std::f64::consts::FRAC_PI_3;
        let home = session.castle.pos + DVec2::new(angle.cos(), angle.sin()) * GARRISON_OFFSET;
        let id = session.next_entity_id();
        session.garrisons.push(Garrison {
            id,
            home,
            pos: home,
            damage: GARRISON_DAMAGE * session.stats.damage_multiplier,
        });
        log::debug!("Garrison guard #{id} posted");
    }
}

/// Run the 50 ms defender steps owed for this tick
pub fn update_defenders(session: &mut GameSession, dt_ms: f64) {
    session.guard_step_ms += dt_ms;
    while session.guard_step_ms >= GARRISON_STEP_MS {
        session.guard_step_ms -= GARRISON_STEP_MS;
        step_garrisons(session);
        step_knights(session);
    }
}

fn step_garrisons(session: &mut GameSession) {
    for i in 0..session.garrisons.len() {
        let Some(guard) = session.garrisons.get(i) else {
            break;
        };
        let (pos, home, damage) = (guard.pos, guard.home, guard.damage);
        let next_pos = match closest_alive(session, pos) {
            Some((target, _, dist)) if dist < GUARD_REACH => {
                damage_enemy(session, target, damage);
                pos
            }
            Some((_, target_pos, dist)) if dist < GARRISON_LEASH => {
                step_toward(pos, target_pos, GARRISON_CHASE_STEP)
            }
            _ if pos.distance(home) > HOME_TOLERANCE => {
                step_toward(pos, home, GARRISON_RETURN_STEP)
            }
            _ => pos,
        };
        if let Some(guard) = session.garrisons.get_mut(i) {
            guard.pos = next_pos;
        }
    }
}

fn step_knights(session: &mut GameSession) {
    let now = session.now();
    session.knights.retain(|k| now < k.expires_at_ms);
    for i in 0..session.knights.len() {
        let Some(knight) = session.knights.get(i) else {
            break;
        };
        let (pos, damage) = (knight.pos, knight.damage);
        let next_pos = match closest_alive(session, pos) {
            Some((target, _, dist)) if dist < GUARD_REACH => {
                damage_enemy(session, target, damage);
                pos
            }
            Some((_, target_pos, _)) => step_toward(pos, target_pos, KNIGHT_SPEED),
            None => pos,
        };
        if let Some(knight) = session.knights.get_mut(i) {
            knight.pos = next_pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::catalog::EnemyKind;
    use crate::sim::difficulty::ScaledEnemy;
    use crate::sim::state::Enemy;
    use proptest::prelude::*;

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
            damage: 10.0,
            speed: 1.0,
        };
        let pos = session.castle.pos + offset;
        session
            .enemies
            .push(Enemy::spawn(id, EnemyKind::Orc, pos, scaled));
        id
    }

    fn hits(events: &[GameEvent]) -> Vec<EntityId> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::EnemyHit { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_enemy_walks_then_attacks() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(200.0, 0.0), 50.0);
        update_enemies(&mut s, TICK_MS);
        let dist = s.enemy(id).map(|e| e.pos.distance(s.castle.pos));
        assert!(dist.is_some_and(|d| (d - 199.0).abs() < 1e-9));

        let close = place(&mut s, DVec2::new(30.0, 0.0), 50.0);
        update_enemies(&mut s, TICK_MS);
        assert_eq!(s.castle.health, 140.0);
        assert!(s.enemy(close).is_some_and(|e| e.last_attack_ms.is_some()));

        // cooldown holds the next swing
        update_enemies(&mut s, TICK_MS);
        assert_eq!(s.castle.health, 140.0);
    }

    #[test]
    fn test_slow_and_warp_stack() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(300.0, 0.0), 50.0);
        if let Some(e) = s.enemy_mut(id) {
            e.slowed_until_ms = 1000.0;
            e.warped_until_ms = 1000.0;
        }
        update_enemies(&mut s, TICK_MS);
        let dist = s.enemy(id).map(|e| e.pos.distance(s.castle.pos));
        assert!(dist.is_some_and(|d| (d - (300.0 - 0.7 * 0.2)).abs() < 1e-9));
    }

    #[test]
    fn test_armor_and_curse_compose_on_castle_damage() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(30.0, 0.0), 50.0);
        s.stats.armor = 0.3;
        s.stats.overlay.armor_debuff = 0.1;
        s.stats.overlay.enemy_damage_debuff = 1.5;
        attack_castle(&mut s, id, 10.0, false);
        assert!((s.castle.health - (150.0 - 10.0 * 1.5 * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_block_negates_and_invincible_ignores() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(30.0, 0.0), 50.0);
        s.stats.block_chance = 0.5;
        s.rng.force([0.1]);
        attack_castle(&mut s, id, 10.0, false);
        assert_eq!(s.castle.health, 150.0);
        assert!(s.drain_events().contains(&GameEvent::Blocked));

        s.stats.invincible = true;
        attack_castle(&mut s, id, 1000.0, false);
        assert_eq!(s.castle.health, 150.0);
    }

    #[test]
    fn test_thorns_can_kill_the_attacker() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(30.0, 0.0), 5.0);
        s.stats.thorns = 10.0;
        attack_castle(&mut s, id, 1.0, false);
        assert_eq!(s.kills, 1);
        assert!(!s.is_alive(id));
    }

    #[test]
    fn test_guardian_then_phoenix_then_game_over() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(30.0, 0.0), 50.0);
        s.stats.has_guardian = true;
        s.stats.has_phoenix = true;
        attack_castle(&mut s, id, 500.0, false);
        assert_eq!(s.castle.health, 1.0);
        attack_castle(&mut s, id, 500.0, false);
        assert_eq!(s.castle.health, 150.0 * 0.75);
        attack_castle(&mut s, id, 500.0, false);
        assert!(s.game_over);
        assert!(!s.is_running);
    }

    #[test]
    fn test_kill_pays_gold_once() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(100.0, 0.0), 10.0);
        let reward = s.multipliers().gold_reward;
        let value = s.enemy(id).map_or(0.0, |e| e.value);
        damage_enemy(&mut s, id, 50.0);
        damage_enemy(&mut s, id, 50.0);
        assert_eq!(s.kills, 1);
        assert_eq!(s.waves.wave_kills, 1);
        assert_eq!(s.gold, (value * 5.0 * reward).round() as u64);
        assert_eq!(s.total_gold_earned, s.gold);
        s.sweep_dead();
        assert!(s.enemies.is_empty());
    }

    #[test]
    fn test_death_explosions_never_repeat() {
        let mut s = session();
        s.stats.death_explosion = true;
        let ids: Vec<_> = (0..5)
            .map(|i| place(&mut s, DVec2::new(100.0 + i as f64 * 5.0, 0.0), 5.0))
            .collect();
        damage_enemy(&mut s, ids[0], 100.0);
        let events = s.drain_events();
        let mut exploded: Vec<EntityId> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::DeathExplosion { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(exploded.len(), 5);
        exploded.sort_unstable();
        exploded.dedup();
        assert_eq!(exploded.len(), 5);
        assert_eq!(s.kills, 5);
        assert!(!s.resolving_deaths);
        assert!(s.death_queue.is_empty());
    }

    #[test]
    fn test_targeting_prefers_untargeted_nearest() {
        let mut s = session();
        let near = place(&mut s, DVec2::new(50.0, 0.0), 10.0);
        let mid = place(&mut s, DVec2::new(100.0, 0.0), 10.0);
        let _far = place(&mut s, DVec2::new(400.0, 0.0), 10.0);
        // out of range: 800 * 0.6 = 480
        let _outside = place(&mut s, DVec2::new(0.0, 500.0), 10.0);
        assert_eq!(find_targets(&s, 2), vec![near, mid]);

        fire_projectile(&mut s, near, ProjectileKind::Arrow);
        assert_eq!(find_targets(&s, 1), vec![mid]);
    }

    #[test]
    fn test_manual_target_ranks_by_point_within_range() {
        let mut s = session();
        let _near = place(&mut s, DVec2::new(50.0, 0.0), 10.0);
        let far = place(&mut s, DVec2::new(400.0, 0.0), 10.0);
        s.manual_target = Some(s.castle.pos + DVec2::new(450.0, 0.0));
        assert_eq!(find_targets(&s, 1), vec![far]);
        s.manual_target = Some(s.castle.pos + DVec2::new(0.0, 2000.0));
        assert_eq!(find_targets(&s, 5).len(), 2);
    }

    #[test]
    fn test_castle_fires_and_respects_cooldown() {
        let mut s = session();
        place(&mut s, DVec2::new(100.0, 0.0), 1000.0);
        castle_attack(&mut s);
        assert_eq!(s.projectiles.len(), 1);
        castle_attack(&mut s);
        assert_eq!(s.projectiles.len(), 1);
        s.scheduler.advance(s.stats.attack_interval_ms());
        castle_attack(&mut s);
        assert_eq!(s.projectiles.len(), 2);
    }

    #[test]
    fn test_abilities_fire_on_their_own_cooldowns() {
        let mut s = session();
        place(&mut s, DVec2::new(100.0, 0.0), 10_000.0);
        s.stats.has_fireball = true;
        s.stats.has_lightning = true;
        castle_attack(&mut s);
        assert_eq!(
            s.projectiles
                .iter()
                .filter(|p| p.kind == ProjectileKind::Fireball)
                .count(),
            1
        );
        assert!(s.last_lightning_ms.is_some());
        s.scheduler.advance(1000.0);
        castle_attack(&mut s);
        assert_eq!(
            s.projectiles
                .iter()
                .filter(|p| p.kind == ProjectileKind::Fireball)
                .count(),
            1
        );
    }

    #[test]
    fn test_arrow_travels_and_hits() {
        let mut s = session();
        let id = place(&mut s, DVec2::new(100.0, 0.0), 1000.0);
        s.rng.force([0.99]);
        fire_projectile(&mut s, id, ProjectileKind::Arrow);
        for _ in 0..20 {
            update_projectiles(&mut s, TICK_MS);
        }
        assert!(s.projectiles.is_empty());
        assert!(s.enemy(id).is_some_and(|e| (e.health - 975.0).abs() < 1e-9));
    }

    #[test]
    fn test_non_ricochet_arrow_drops_when_target_dies() {
        let mut s = session();
        let a = place(&mut s, DVec2::new(100.0, 0.0), 1000.0);
        let _b = place(&mut s, DVec2::new(120.0, 0.0), 1000.0);
        fire_projectile(&mut s, a, ProjectileKind::Arrow);
        damage_enemy(&mut s, a, 5000.0);
        update_projectiles(&mut s, TICK_MS);
        assert!(s.projectiles.is_empty());

        s.stats.ricochet = 1;
        let c = place(&mut s, DVec2::new(140.0, 0.0), 1000.0);
        fire_projectile(&mut s, c, ProjectileKind::Arrow);
        damage_enemy(&mut s, c, 5000.0);
        update_projectiles(&mut s, TICK_MS);
        assert_eq!(s.projectiles.len(), 1);
    }

    #[test]
    fn test_fireball_splash_includes_target() {
        let mut s = session();
        let a = place(&mut s, DVec2::new(100.0, 0.0), 1000.0);
        let b = place(&mut s, DVec2::new(150.0, 0.0), 1000.0);
        s.rng.force([0.99]);
        fire_projectile(&mut s, a, ProjectileKind::Fireball);
        for _ in 0..30 {
            update_projectiles(&mut s, TICK_MS);
        }
        // 25 * 2 = 50 on hit, then 25 splash on both
        assert!(s.enemy(a).is_some_and(|e| (e.health - 925.0).abs() < 1e-9));
        assert!(s.enemy(b).is_some_and(|e| (e.health - 975.0).abs() < 1e-9));
    }

    #[test]
    fn test_garrison_posts_and_fights() {
        let mut s = session();
        s.stats.garrison_count = 2;
        sync_garrisons(&mut s);
        assert_eq!(s.garrisons.len(), 2);
        assert!((s.garrisons[0].home - (s.castle.pos + DVec2::new(60.0, 0.0))).length() < 1e-9);

        let id = place(&mut s, DVec2::new(90.0, 0.0), 100.0);
        update_defenders(&mut s, GARRISON_STEP_MS);
        assert!(s.enemy(id).is_some_and(|e| e.health < 100.0));

        s.stats.garrison_count = 1;
        sync_garrisons(&mut s);
        assert_eq!(s.garrisons.len(), 1);
    }

    #[test]
    fn test_ricochet_target_claimed_once_per_pass() {
        let mut s = session();
        s.stats.ricochet = 1;
        let a = place(&mut s, DVec2::new(15.0, 0.0), 1.0);
        let b = place(&mut s, DVec2::new(-15.0, 0.0), 1.0);
        let spare = place(&mut s, DVec2::new(0.0, 200.0), 1e6);
        fire_projectile(&mut s, a, ProjectileKind::Arrow);
        fire_projectile(&mut s, b, ProjectileKind::Arrow);

        update_projectiles(&mut s, TICK_MS);
        assert!(!s.is_alive(a));
        assert!(!s.is_alive(b));
        let chasing: Vec<_> = s.projectiles.iter().filter(|p| p.target == spare).collect();
        assert_eq!(chasing.len(), 1);
        assert!(chasing[0].is_ricochet);
        assert_eq!(s.projectiles.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_ricochet_chain_never_repeats(
            bounces in 0u32..6,
            offsets in prop::collection::vec((-300.0f64..300.0, -300.0f64..300.0), 1..8),
        ) {
            let mut s = session();
            s.stats.ricochet = bounces;
            s.stats.crit_chance = 0.0;
            let ids: Vec<_> = offsets
                .iter()
                .map(|&(x, y)| place(&mut s, DVec2::new(x, y), 1e9))
                .collect();
            fire_projectile(&mut s, ids[0], ProjectileKind::Arrow);
            for _ in 0..2000 {
                if s.projectiles.is_empty() {
                    break;
                }
                update_projectiles(&mut s, TICK_MS);
            }
            let hit = hits(&s.drain_events());
            let mut unique = hit.clone();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(unique.len(), hit.len());
            prop_assert!(hit.len() as u32 <= bounces + 1);
            prop_assert_eq!(hit.len(), ids.len().min(bounces as usize + 1));
        }
    }
}
