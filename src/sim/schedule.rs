//! Logical event queue keyed by simulation time
//!
//! Everything the game does "later" (spawn slots, staggered ability hits,
//! buff expiry) is a tagged [`TimedAction`] queued here. The clock only moves
//! when the tick driver advances it, so pausing freezes every pending action
//! in place and nothing ever fires early.

use serde::{Deserialize, Serialize};

use super::state::EntityId;

/// Deferred work, interpreted by the tick driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimedAction {
    /// Announcement finished; build the spawn schedule
    BeginSpawning,
    /// Materialize one pending spawn slot
    Spawn { slot: usize },
    /// One arrow of a volley, aimed at a random surviving candidate
    VolleyArrow { candidates: Vec<EntityId> },
    /// Card-launched fireball
    Fireball { target: EntityId },
    /// Chain or storm lightning strike
    LightningHit { target: EntityId, damage: f64 },
    /// Meteor starts falling on a target
    MeteorFall { target: EntityId, damage: f64 },
    /// Meteor lands
    MeteorImpact { target: EntityId, damage: f64 },
    BreathHit { target: EntityId, damage: f64 },
    ApocalypseImpact { damage: f64 },
    /// Area poison pulse; `remaining` counts pulses left after this one
    PoisonCloudPulse { per_second: f64, remaining: u32 },
    /// Per-enemy poison from arrow hits
    PoisonTick {
        target: EntityId,
        damage: f64,
        remaining: u32,
    },
    EndInvincibility,
    /// Put the transient damage multiplier back to a saved value
    RestoreDamageMultiplier(f64),
}

impl TimedAction {
    pub fn is_spawn(&self) -> bool {
        matches!(self, TimedAction::BeginSpawning | TimedAction::Spawn { .. })
    }

    /// Ends a transient castle buff
    pub fn is_buff_expiry(&self) -> bool {
        matches!(
            self,
            TimedAction::EndInvincibility | TimedAction::RestoreDamageMultiplier(_)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scheduled {
    at_ms: f64,
    seq: u64,
    action: TimedAction,
}

/// Simulation clock plus the actions waiting on it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    now_ms: f64,
    next_seq: u64,
    entries: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time in milliseconds
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub fn advance(&mut self, dt_ms: f64) {
        self.now_ms += dt_ms.max(0.0);
    }

    pub fn schedule_in(&mut self, delay_ms: f64, action: TimedAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Scheduled {
            at_ms: self.now_ms + delay_ms.max(0.0),
            seq,
            action,
        });
    }

    /// Remove and return the earliest due action (insertion order breaks ties)
    pub fn pop_due(&mut self) -> Option<TimedAction> {
        let now = self.now_ms;
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.at_ms <= now)
            .min_by(|(_, a), (_, b)| a.at_ms.total_cmp(&b.at_ms).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;
        Some(self.entries.remove(idx).action)
    }

    /// Drop every pending action matching `pred`; returns how many were dropped
    pub fn cancel_where<F: FnMut(&TimedAction) -> bool>(&mut self, mut pred: F) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.action));
        before - self.entries.len()
    }

    /// Remove every pending action, returned in the order it would have fired
    pub fn drain_all(&mut self) -> Vec<TimedAction> {
        let mut entries = std::mem::take(&mut self.entries);
        entries.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms).then(a.seq.cmp(&b.seq)));
        entries.into_iter().map(|e| e.action).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &TimedAction> {
        self.entries.iter().map(|e| &e.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_fires_before_its_time() {
        let mut sched = Scheduler::new();
        sched.schedule_in(100.0, TimedAction::EndInvincibility);
        sched.advance(99.0);
        assert!(sched.pop_due().is_none());
        sched.advance(1.0);
        assert_eq!(sched.pop_due(), Some(TimedAction::EndInvincibility));
        assert!(sched.is_empty());
    }

    #[test]
    fn test_due_actions_come_out_in_time_then_insertion_order() {
        let mut sched = Scheduler::new();
        sched.schedule_in(50.0, TimedAction::Spawn { slot: 2 });
        sched.schedule_in(10.0, TimedAction::Spawn { slot: 0 });
        sched.schedule_in(10.0, TimedAction::Spawn { slot: 1 });
        sched.advance(60.0);
        let order: Vec<_> = std::iter::from_fn(|| sched.pop_due()).collect();
        assert_eq!(
            order,
            vec![
                TimedAction::Spawn { slot: 0 },
                TimedAction::Spawn { slot: 1 },
                TimedAction::Spawn { slot: 2 },
            ]
        );
    }

    #[test]
    fn test_cancel_only_spawns() {
        let mut sched = Scheduler::new();
        sched.schedule_in(0.0, TimedAction::BeginSpawning);
        sched.schedule_in(5.0, TimedAction::Spawn { slot: 0 });
        sched.schedule_in(5.0, TimedAction::RestoreDamageMultiplier(1.0));
        assert_eq!(sched.cancel_where(TimedAction::is_spawn), 2);
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn test_clock_does_not_run_backwards() {
        let mut sched = Scheduler::new();
        sched.advance(-10.0);
        assert_eq!(sched.now(), 0.0);
    }
}
