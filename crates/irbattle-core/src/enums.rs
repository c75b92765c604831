//! Enumeration types used throughout the battle controller.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Infrared encoding standard. Each protocol is a distinct bit timing and
/// carrier frequency; the categories (cannon / machine gun / repair) decide
/// which stage of the hit-disambiguation pipeline may match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Standard Tamiya 1/16 battle protocol.
    Tamiya,
    /// Tamiya 2-shot kill code. Superset encoding of `Tamiya`; a hit
    /// inflicts double damage.
    Tamiya2Shot,
    /// Tamiya 1/35 scale protocol.
    Tamiya35,
    /// Heng Long protocol.
    HengLong,
    /// Taigen V1 motherboards.
    TaigenV1,
    /// Taigen V2/V3 motherboards.
    Taigen,
    /// Forces of Valor 1/24 scale. The only cannon protocol that encodes a
    /// team value.
    Fov,
    /// VsTank 1/24 scale protocol.
    VsTank,
    /// Clark TK-20/22/60 repair signal.
    RprClark,
    /// Italian Battle Unit repair signal.
    RprIbu,
    /// RC Tanks Australia repair signal.
    RprRcta,
    /// Clark machine-gun protocol (Sony encoding).
    MgClark,
    /// RCTA machine-gun protocol.
    MgRcta,
}

impl Protocol {
    /// True for cannon (fire) protocols.
    pub fn is_cannon(self) -> bool {
        matches!(
            self,
            Protocol::Tamiya
                | Protocol::Tamiya2Shot
                | Protocol::Tamiya35
                | Protocol::HengLong
                | Protocol::TaigenV1
                | Protocol::Taigen
                | Protocol::Fov
                | Protocol::VsTank
        )
    }

    /// True for repair protocols.
    pub fn is_repair(self) -> bool {
        matches!(self, Protocol::RprClark | Protocol::RprIbu | Protocol::RprRcta)
    }

    /// True for machine-gun protocols.
    pub fn is_mg(self) -> bool {
        matches!(self, Protocol::MgClark | Protocol::MgRcta)
    }

    /// Whether this protocol carries a team value in its payload.
    pub fn supports_teams(self) -> bool {
        matches!(self, Protocol::Fov)
    }
}

/// Team affiliation. Only meaningful for protocols that encode teams
/// (currently FOV); FOV team 1 is the free-for-all value and is treated
/// as "no team" everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    /// No team: hits everyone, takes hits from everyone.
    #[default]
    None,
    Fov2,
    Fov3,
    Fov4,
}

impl Team {
    /// Map a decoded FOV payload value to a team. Team 1 maps to `None`.
    pub fn from_fov_value(value: u16) -> Option<Team> {
        match value {
            FOV_TEAM_1_VALUE => Some(Team::None),
            FOV_TEAM_2_VALUE => Some(Team::Fov2),
            FOV_TEAM_3_VALUE => Some(Team::Fov3),
            FOV_TEAM_4_VALUE => Some(Team::Fov4),
            _ => None,
        }
    }

    /// The FOV payload value to transmit for this team, if any.
    pub fn fov_value(self) -> Option<u16> {
        match self {
            Team::None => None,
            Team::Fov2 => Some(FOV_TEAM_2_VALUE),
            Team::Fov3 => Some(FOV_TEAM_3_VALUE),
            Team::Fov4 => Some(FOV_TEAM_4_VALUE),
        }
    }
}

/// Weight class: a named bundle of reload time, recovery time, and max hits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightClass {
    /// User-supplied numeric overrides.
    Custom,
    /// Tamiya lightweight spec.
    Light,
    /// Tamiya medium spec.
    #[default]
    Medium,
    /// Tamiya heavy spec.
    Heavy,
}

/// Kind of hit registered by the disambiguation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitKind {
    Cannon,
    MachineGun,
    Repair,
}

/// Whether this unit fights or repairs. Selected at configuration time;
/// a repair unit's trigger transmits the repair signal instead of cannon
/// fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitRole {
    #[default]
    Combat,
    Repair,
}
