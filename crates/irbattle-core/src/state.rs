//! Battle state snapshot — the complete visible state produced each tick.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::BattleEvent;
use crate::types::LoopTime;

/// Complete controller state reported after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub time: LoopTime,
    /// Cumulative damage, 0..=100.
    pub damage_percent: f32,
    pub destroyed: bool,
    /// Hit reception currently blanked (post-hit filter, transmission, or
    /// recovery).
    pub invulnerable: bool,
    pub repair_ongoing: bool,
    pub cannon_hits_taken: u8,
    pub mg_hits_taken: u8,
    /// Cannon ready to fire again.
    pub cannon_reloaded: bool,
    /// Protocol of the last hit that survived filtering.
    pub last_hit_protocol: Option<Protocol>,
    /// Team of the last hit (for protocols that encode one).
    pub last_hit_team: Team,
    /// Current notification lamp brightness, 0..=255.
    pub lamp_level: u8,
    /// Timers currently live in the pool.
    pub active_timers: usize,
    /// Cumulative count of dropped schedule requests (pool full).
    pub timer_exhaustions: u64,
    pub events: Vec<BattleEvent>,
}

impl BattleSnapshot {
    /// Health remaining as a percentage, the complement of damage.
    pub fn health_percent(&self) -> f32 {
        (100.0 - self.damage_percent).clamp(0.0, 100.0)
    }
}
