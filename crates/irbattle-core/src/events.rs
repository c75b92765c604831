//! Events emitted by the controller for sound/telemetry feedback.

use serde::{Deserialize, Serialize};

use crate::enums::*;

/// Battle events drained into each snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BattleEvent {
    /// Cannon fired (combat unit).
    CannonFired,
    /// Repair signal transmitted (repair unit trigger or repair-on-hit).
    RepairSignalSent,
    /// A hit survived disambiguation and was applied.
    HitTaken {
        kind: HitKind,
        protocol: Protocol,
        team: Team,
    },
    /// A team-tagged hit from our own team was discarded.
    FriendlyFireIgnored { team: Team },
    /// Damage reached 100%.
    Destroyed,
    /// The destroyed-inoperative window elapsed; health reset, recovery
    /// blanking begins.
    RecoveryStarted,
    /// Recovery blanking elapsed; the unit is vulnerable again.
    RecoveryComplete,
    /// An incoming repair operation began.
    RepairStarted,
    /// A repair was cancelled by enemy fire before completion.
    RepairCancelled,
    /// A repair ran to completion and restored one cannon hit of health.
    RepairComplete,
    /// The cannon reload timer completed.
    ReloadComplete,
    /// A timer could not be scheduled because the pool was full. The
    /// associated deferred action was dropped.
    TimerPoolExhausted { action: String },
}
