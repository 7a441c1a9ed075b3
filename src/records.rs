//! Best-wave record
//!
//! Lives in process memory only and resets when the process restarts.

use serde::{Deserialize, Serialize};

use crate::sim::SessionSummary;

/// Best wave reached across sessions in this process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveRecord {
    best_wave: u32,
}

impl WaveRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_wave(&self) -> u32 {
        self.best_wave
    }

    /// Check if a wave would beat the record
    pub fn qualifies(&self, wave: u32) -> bool {
        wave > self.best_wave
    }

    /// Record a finished session; returns true when it set a new record
    pub fn submit(&mut self, summary: &SessionSummary) -> bool {
        if !self.qualifies(summary.wave) {
            return false;
        }
        log::info!("New wave record: {} (was {})", summary.wave, self.best_wave);
        self.best_wave = summary.wave;
        true
    }
}
