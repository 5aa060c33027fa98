use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ROCKET_COST, SATELLITE_COST};

/// Faction token. Ownership is plain equality on the RGB triple; ordering is
/// lexicographic and drives turn rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactionColor(pub u8, pub u8, pub u8);

impl fmt::Display for FactionColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanetId(pub u32);

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "planet_{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Satellite,
    Rocket,
}

impl CardKind {
    pub fn cost(self) -> i32 {
        match self {
            Self::Satellite => SATELLITE_COST,
            Self::Rocket => ROCKET_COST,
        }
    }

    /// Card slot order in the card bar.
    pub fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(Self::Satellite),
            1 => Some(Self::Rocket),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetTextures {
    pub base: u8,
    pub noise: u8,
    pub light: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchOutcome {
    Won { faction: FactionColor },
    Lost { faction: FactionColor },
}

impl MatchOutcome {
    pub fn faction(self) -> FactionColor {
        match self {
            Self::Won { faction } | Self::Lost { faction } => faction,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlanetView {
    pub id: PlanetId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: FactionColor,
    pub value: i32,
    #[serde(rename = "rocketUpgrade")]
    pub rocket_upgrade: u8,
    #[serde(rename = "satelliteUpgrade")]
    pub satellite_upgrade: u8,
    pub selected: bool,
    #[serde(rename = "applyBlackSurface")]
    pub apply_black_surface: bool,
    pub textures: PlanetTextures,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct RocketView {
    pub x: f32,
    pub y: f32,
    pub payload: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConnectionView {
    pub from: PlanetId,
    pub to: PlanetId,
    pub rockets: Vec<RocketView>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    TurnChanged {
        color: FactionColor,
        year: i32,
    },
    CardDragCancelled,
    UpgradeApplied {
        planet: PlanetId,
        card: CardKind,
        level: u8,
        #[serde(rename = "byAi")]
        by_ai: bool,
    },
    ConnectionCreated {
        from: PlanetId,
        to: PlanetId,
        #[serde(rename = "byAi")]
        by_ai: bool,
    },
    ConnectionDeleted {
        from: PlanetId,
        to: PlanetId,
    },
    PlanetCaptured {
        planet: PlanetId,
        previous: FactionColor,
        owner: FactionColor,
    },
    MatchEnded {
        outcome: MatchOutcome,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "currentTicks")]
    pub current_ticks: u64,
    pub year: i32,
    pub level: u32,
    #[serde(rename = "currentTurnColor")]
    pub current_turn_color: FactionColor,
    #[serde(rename = "turnTimeLeft")]
    pub turn_time_left_fraction: f32,
    pub planets: Vec<PlanetView>,
    pub connections: Vec<ConnectionView>,
    pub events: Vec<GameEvent>,
}
