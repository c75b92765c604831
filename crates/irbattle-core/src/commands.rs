//! Operator commands queued for processing at the next tick boundary.

use serde::{Deserialize, Serialize};

/// All possible operator actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Pull the trigger. For a combat unit this fires the cannon (IR, recoil,
    /// muzzle flash, reload); for a repair unit it starts a repair operation.
    /// Ignored while a repair is ongoing; callers gate on `cannon_reloaded`.
    Fire,
    /// Failsafe: abort an ongoing repair without restoring health.
    StopRepair,
}
