//! Battle configuration, immutable after setup.
//!
//! Settings are chosen at build/configuration time (there is no runtime
//! protocol negotiation); `resolve()` normalizes them once before the
//! controller starts.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{Protocol, Team, UnitRole, WeightClass};

/// Numeric bundle resolved from the weight class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSettings {
    /// Cannon reload time (ms).
    pub reload_ms: u64,
    /// Recovery (invulnerability) time after regenerating (ms).
    pub recovery_ms: u64,
    /// Cannon hits sustained before destruction.
    pub max_cannon_hits: u8,
    /// Machine-gun hits sustained before destruction. Only meaningful for
    /// custom classes with MG damage enabled.
    pub max_mg_hits: u8,
}

impl ClassSettings {
    /// The preset bundle for a named Tamiya class. `Custom` (and anything
    /// unrecognized upstream) falls back to Medium.
    pub fn for_class(class: WeightClass) -> ClassSettings {
        match class {
            WeightClass::Light => ClassSettings {
                reload_ms: LIGHT_RELOAD_MS,
                recovery_ms: LIGHT_RECOVERY_MS,
                max_cannon_hits: LIGHT_MAX_HITS,
                max_mg_hits: DEFAULT_MAX_MG_HITS,
            },
            WeightClass::Heavy => ClassSettings {
                reload_ms: HEAVY_RELOAD_MS,
                recovery_ms: HEAVY_RECOVERY_MS,
                max_cannon_hits: HEAVY_MAX_HITS,
                max_mg_hits: DEFAULT_MAX_MG_HITS,
            },
            WeightClass::Medium | WeightClass::Custom => ClassSettings {
                reload_ms: MEDIUM_RELOAD_MS,
                recovery_ms: MEDIUM_RECOVERY_MS,
                max_cannon_hits: MEDIUM_MAX_HITS,
                max_mg_hits: DEFAULT_MAX_MG_HITS,
            },
        }
    }
}

impl Default for ClassSettings {
    fn default() -> Self {
        ClassSettings::for_class(WeightClass::Medium)
    }
}

/// Recoil actuator configuration, forwarded to the servo at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoilConfig {
    /// Time the servo takes to kick at full speed (ms).
    pub recoil_ms: u16,
    /// Time the servo takes to return to rest (ms).
    pub return_ms: u16,
    /// Reverse the servo direction.
    pub reversed: bool,
    /// Servo end-point limits in microseconds.
    pub endpoint_min: u16,
    pub endpoint_max: u16,
}

impl Default for RecoilConfig {
    fn default() -> Self {
        RecoilConfig {
            recoil_ms: 200,
            return_ms: 1000,
            reversed: false,
            endpoint_min: 1000,
            endpoint_max: 2000,
        }
    }
}

/// The full battle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSettings {
    pub weight_class: WeightClass,
    /// Resolved class numbers. For `Custom` these are the user overrides;
    /// for named classes they are replaced by the presets in `resolve()`.
    pub class: ClassSettings,
    /// Outgoing cannon protocol, also the primary incoming match.
    /// `None` disables cannon IR entirely.
    pub fire_protocol: Option<Protocol>,
    /// Optional alternate incoming cannon protocol.
    pub alt_hit_protocol: Option<Protocol>,
    /// Repair protocol in use.
    pub repair_protocol: Option<Protocol>,
    /// Machine-gun protocol in use.
    pub mg_protocol: Option<Protocol>,
    /// Team affiliation. Only meaningful when the fire protocol encodes
    /// teams; forced to `Team::None` otherwise.
    pub team: Team,
    /// Whether machine-gun fire inflicts damage on this unit.
    pub accept_mg_damage: bool,
    /// Combat unit or repair unit.
    pub role: UnitRole,
    /// Repair emplacements may answer incoming hits with a repair signal.
    pub repair_on_hit: bool,
    /// Blink the notification lamp when the reload timer completes.
    pub reload_notify: bool,
    pub recoil: RecoilConfig,
}

impl Default for BattleSettings {
    fn default() -> Self {
        BattleSettings {
            weight_class: WeightClass::Medium,
            class: ClassSettings::default(),
            fire_protocol: Some(Protocol::Tamiya),
            alt_hit_protocol: Some(Protocol::HengLong),
            repair_protocol: Some(Protocol::RprClark),
            mg_protocol: Some(Protocol::MgClark),
            team: Team::None,
            accept_mg_damage: false,
            role: UnitRole::Combat,
            repair_on_hit: false,
            reload_notify: false,
            recoil: RecoilConfig::default(),
        }
    }
}

impl BattleSettings {
    /// Normalize the configuration: named weight classes take their preset
    /// numbers, a team affiliation is dropped unless the fire protocol
    /// supports teams, and custom hit budgets are clamped to at least one
    /// hit so damage increments stay finite.
    pub fn resolve(mut self) -> BattleSettings {
        if self.weight_class != WeightClass::Custom {
            self.class = ClassSettings::for_class(self.weight_class);
        }
        self.class.max_cannon_hits = self.class.max_cannon_hits.max(1);
        self.class.max_mg_hits = self.class.max_mg_hits.max(1);

        let teams_supported = self
            .fire_protocol
            .map(Protocol::supports_teams)
            .unwrap_or(false);
        if !teams_supported {
            self.team = Team::None;
        }
        self
    }

    /// True when any incoming protocol is configured; with everything
    /// disabled the unit cannot be hit at all.
    pub fn ir_enabled(&self) -> bool {
        self.fire_protocol.is_some() || self.mg_protocol.is_some()
    }
}
