use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    ADD_VALUE_EVERY_MS, MAX_LEVEL, MAX_ROCKET_UPGRADE, MAX_SATELLITE_UPGRADE,
    MIN_ROCKET_UPGRADE, PLANET_RADIUS, SEND_ROCKET_EVERY_MS,
};
use crate::engine::{GameEngine, GameEngineOptions, MatchHeader};
use crate::rng::Rng;
use crate::types::{CardKind, FactionColor, PlanetId, PlanetTextures};
use crate::world::{random_textures, Connection, Planet, Rocket};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse saved match: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read saved match from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("duplicate planet id `{0}`")]
    DuplicatePlanet(PlanetId),
    #[error("connection references unknown planet `{0}`")]
    UnknownPlanet(PlanetId),
    #[error("connection from `{0}` to itself")]
    SelfConnection(PlanetId),
    #[error("duplicate connection `{from}` -> `{to}`")]
    DuplicateConnection { from: PlanetId, to: PlanetId },
    #[error("planet `{planet}` has {card:?} level {level} out of range")]
    UpgradeOutOfRange {
        planet: PlanetId,
        card: CardKind,
        level: u8,
    },
    #[error("planet `{0}` has a non-positive radius")]
    InvalidRadius(PlanetId),
    #[error("level {0} is outside 1..={max}", max = MAX_LEVEL)]
    LevelOutOfRange(u32),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedRocket {
    pub payload: i32,
    #[serde(alias = "current_time")]
    pub elapsed_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedConnection {
    pub planet: PlanetId,
    pub other_planet: PlanetId,
    #[serde(default)]
    pub last_ticks: u64,
    #[serde(default = "default_send_rocket_every")]
    pub send_rocket_every: u64,
    #[serde(default)]
    pub rockets: Vec<SavedRocket>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedPlanet {
    /// Missing in index-based saves; the planet's position is used instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PlanetId>,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
    pub color: FactionColor,
    pub value: i32,
    #[serde(default = "default_rocket_upgrade")]
    pub rocket_upgrade: u8,
    #[serde(default)]
    pub satellite_upgrade: u8,
    #[serde(default)]
    pub value_start: u64,
    #[serde(default = "default_add_value_every")]
    pub add_value_every: u64,
    #[serde(default = "default_send_rocket_every")]
    pub send_rocket_every: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textures: Option<PlanetTextures>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedMatch {
    #[serde(rename = "p1color")]
    pub p1_color: FactionColor,
    #[serde(rename = "p2color", default)]
    pub p2_color: Option<FactionColor>,
    pub year: i32,
    pub year_start: i32,
    pub level: u32,
    pub current_turn_color: FactionColor,
    #[serde(default)]
    pub current_turn_start: u64,
    #[serde(default)]
    pub current_ticks: u64,
    pub planets: Vec<SavedPlanet>,
    #[serde(default)]
    pub connections: Vec<SavedConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

fn default_radius() -> f32 {
    PLANET_RADIUS
}

fn default_rocket_upgrade() -> u8 {
    MIN_ROCKET_UPGRADE
}

fn default_add_value_every() -> u64 {
    ADD_VALUE_EVERY_MS
}

fn default_send_rocket_every() -> u64 {
    SEND_ROCKET_EVERY_MS
}

impl SavedMatch {
    pub fn from_engine(engine: &GameEngine) -> Self {
        let header = engine.header();
        let planets = engine
            .planets()
            .iter()
            .map(|planet| SavedPlanet {
                id: Some(planet.id),
                x: planet.x,
                y: planet.y,
                radius: planet.radius,
                color: planet.color,
                value: planet.value,
                rocket_upgrade: planet.rocket_upgrade,
                satellite_upgrade: planet.satellite_upgrade,
                value_start: planet.value_start,
                add_value_every: planet.add_value_every,
                send_rocket_every: planet.send_rocket_every,
                textures: Some(planet.textures),
            })
            .collect();
        let connections = engine
            .connections()
            .iter()
            .map(|connection| SavedConnection {
                planet: connection.from,
                other_planet: connection.to,
                last_ticks: connection.last_ticks,
                send_rocket_every: connection.send_rocket_every,
                rockets: connection
                    .rockets
                    .iter()
                    .map(|rocket| SavedRocket {
                        payload: rocket.payload,
                        elapsed_ms: rocket.elapsed_ms,
                    })
                    .collect(),
            })
            .collect();

        Self {
            p1_color: header.p1_color,
            p2_color: header.p2_color,
            year: header.year,
            year_start: header.year_start,
            level: header.level,
            current_turn_color: header.current_turn_color,
            current_turn_start: header.current_turn_start,
            current_ticks: header.current_ticks,
            planets,
            connections,
            saved_at: None,
        }
    }

    pub fn into_engine(self, options: GameEngineOptions) -> Result<GameEngine, LoadError> {
        if !(1..=MAX_LEVEL).contains(&self.level) {
            return Err(LoadError::LevelOutOfRange(self.level));
        }
        let mut rng = Rng::new(options.seed ^ 0x5a5a_5a5a);
        let mut ids = BTreeSet::new();
        let mut planets = Vec::with_capacity(self.planets.len());
        for (idx, saved) in self.planets.into_iter().enumerate() {
            let id = saved.id.unwrap_or(PlanetId(idx as u32));
            if !ids.insert(id) {
                return Err(LoadError::DuplicatePlanet(id));
            }
            if saved.radius <= 0.0 || !saved.radius.is_finite() {
                return Err(LoadError::InvalidRadius(id));
            }
            if !(MIN_ROCKET_UPGRADE..=MAX_ROCKET_UPGRADE).contains(&saved.rocket_upgrade) {
                return Err(LoadError::UpgradeOutOfRange {
                    planet: id,
                    card: CardKind::Rocket,
                    level: saved.rocket_upgrade,
                });
            }
            if saved.satellite_upgrade > MAX_SATELLITE_UPGRADE {
                return Err(LoadError::UpgradeOutOfRange {
                    planet: id,
                    card: CardKind::Satellite,
                    level: saved.satellite_upgrade,
                });
            }

            let mut planet = Planet::new(id, saved.x, saved.y, saved.color, saved.value);
            planet.radius = saved.radius;
            planet.rocket_upgrade = saved.rocket_upgrade;
            planet.satellite_upgrade = saved.satellite_upgrade;
            planet.value_start = saved.value_start;
            planet.add_value_every = saved.add_value_every;
            planet.send_rocket_every = saved.send_rocket_every;
            planet.textures = match saved.textures {
                Some(textures) => textures,
                None => random_textures(&mut rng),
            };
            planets.push(planet);
        }

        let mut pairs = BTreeSet::new();
        let mut connections = Vec::with_capacity(self.connections.len());
        for saved in self.connections {
            let (from, to) = (saved.planet, saved.other_planet);
            if from == to {
                return Err(LoadError::SelfConnection(from));
            }
            let source = planets
                .iter()
                .find(|planet| planet.id == from)
                .ok_or(LoadError::UnknownPlanet(from))?;
            let target = planets
                .iter()
                .find(|planet| planet.id == to)
                .ok_or(LoadError::UnknownPlanet(to))?;
            if !pairs.insert((from, to)) {
                return Err(LoadError::DuplicateConnection { from, to });
            }

            connections.push(Connection {
                from,
                to,
                last_ticks: saved.last_ticks,
                send_rocket_every: saved.send_rocket_every,
                rockets: saved
                    .rockets
                    .iter()
                    .map(|rocket| Rocket::resume(source, target, rocket.payload, rocket.elapsed_ms))
                    .collect(),
            });
        }

        let header = MatchHeader {
            p1_color: self.p1_color,
            p2_color: self.p2_color,
            level: self.level,
            year: self.year,
            year_start: self.year_start,
            current_turn_color: self.current_turn_color,
            current_turn_start: self.current_turn_start,
            current_ticks: self.current_ticks,
        };
        tracing::info!(
            level = header.level,
            planets = planets.len(),
            connections = connections.len(),
            "saved match restored"
        );
        Ok(GameEngine::restore(header, planets, connections, options))
    }
}

pub fn decode_match(text: &str, options: GameEngineOptions) -> Result<GameEngine, LoadError> {
    let saved: SavedMatch = serde_json::from_str(text)?;
    saved.into_engine(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PLAYER2_COLOR, PLAYER_COLOR, TICK_MS};

    fn played_engine() -> GameEngine {
        let options = GameEngineOptions {
            seed: 77,
            autoplay_humans: true,
            ..GameEngineOptions::default()
        };
        let mut engine = GameEngine::new(PLAYER_COLOR, Some(PLAYER2_COLOR), 2, options);
        let ids: Vec<PlanetId> = engine.planets().iter().map(|p| p.id).collect();
        assert!(engine.create_connection(None, ids[0], ids[1]));
        assert!(engine.create_connection(None, ids[2], ids[3]));
        for _ in 0..60 {
            engine.step(TICK_MS);
        }
        engine
    }

    #[test]
    fn round_trip_keeps_board_connections_and_clock() {
        let engine = played_engine();
        let text =
            serde_json::to_string(&SavedMatch::from_engine(&engine)).expect("match should encode");
        let restored =
            decode_match(&text, engine.options().clone()).expect("match should decode");

        assert_eq!(restored.header(), engine.header());
        assert_eq!(restored.planets().len(), engine.planets().len());
        for (a, b) in restored.planets().iter().zip(engine.planets()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.color, b.color);
            assert_eq!(a.value, b.value);
            assert_eq!(a.rocket_upgrade, b.rocket_upgrade);
            assert_eq!(a.satellite_upgrade, b.satellite_upgrade);
            assert_eq!(a.textures, b.textures);
        }
        let pairs = |engine: &GameEngine| -> Vec<(PlanetId, PlanetId, usize, u64)> {
            engine
                .connections()
                .iter()
                .map(|c| (c.from, c.to, c.rockets.len(), c.last_ticks))
                .collect()
        };
        assert_eq!(pairs(&restored), pairs(&engine));
    }

    #[test]
    fn index_based_save_gets_positional_ids() {
        let raw = r#"{
  "p1color": [0, 120, 72],
  "p2color": null,
  "year": 2103,
  "year_start": 2100,
  "level": 1,
  "current_turn_color": [0, 120, 72],
  "current_turn_start": 4000,
  "current_ticks": 5000,
  "planets": [
    {"x": 100, "y": 100, "radius": 60, "color": [0, 120, 72], "value": 12, "rocket_upgrade": 2, "satellite_upgrade": 1},
    {"x": 400, "y": 100, "radius": 60, "color": [129, 131, 128], "value": 7, "rocket_upgrade": 1, "satellite_upgrade": 0}
  ],
  "connections": [
    {"planet": 0, "other_planet": 1, "last_ticks": 4500, "rockets": [{"payload": 2, "current_time": 100}]}
  ]
}"#;
        let engine = decode_match(raw, GameEngineOptions::default()).expect("legacy save loads");
        assert_eq!(engine.year, 2103);
        assert_eq!(engine.current_ticks, 5000);
        assert_eq!(engine.planets()[1].id, PlanetId(1));
        let connection = &engine.connections()[0];
        assert_eq!((connection.from, connection.to), (PlanetId(0), PlanetId(1)));
        assert_eq!(connection.rockets[0].elapsed_ms, 100);
        assert_eq!(connection.rockets[0].payload, 2);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = decode_match("{\"p1color\": ", GameEngineOptions::default())
            .expect_err("truncated save must fail");
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn invalid_references_are_rejected() {
        let mut saved = SavedMatch::from_engine(&played_engine());
        saved.connections[0].other_planet = PlanetId(999);
        let err = saved
            .into_engine(GameEngineOptions::default())
            .expect_err("dangling connection must fail");
        assert!(matches!(err, LoadError::UnknownPlanet(PlanetId(999))));

        let mut saved = SavedMatch::from_engine(&played_engine());
        saved.connections[1].planet = saved.connections[0].planet;
        saved.connections[1].other_planet = saved.connections[0].other_planet;
        let err = saved
            .into_engine(GameEngineOptions::default())
            .expect_err("duplicate connection must fail");
        assert!(matches!(err, LoadError::DuplicateConnection { .. }));

        let mut saved = SavedMatch::from_engine(&played_engine());
        saved.connections[0].other_planet = saved.connections[0].planet;
        let err = saved
            .into_engine(GameEngineOptions::default())
            .expect_err("self connection must fail");
        assert!(matches!(err, LoadError::SelfConnection(_)));
    }

    #[test]
    fn invalid_planets_are_rejected() {
        let mut saved = SavedMatch::from_engine(&played_engine());
        saved.planets[1].id = saved.planets[0].id;
        assert!(matches!(
            saved.into_engine(GameEngineOptions::default()),
            Err(LoadError::DuplicatePlanet(_))
        ));

        let mut saved = SavedMatch::from_engine(&played_engine());
        saved.planets[0].satellite_upgrade = MAX_SATELLITE_UPGRADE + 1;
        assert!(matches!(
            saved.into_engine(GameEngineOptions::default()),
            Err(LoadError::UpgradeOutOfRange {
                card: CardKind::Satellite,
                ..
            })
        ));

        let mut saved = SavedMatch::from_engine(&played_engine());
        saved.planets[0].rocket_upgrade = 0;
        assert!(matches!(
            saved.into_engine(GameEngineOptions::default()),
            Err(LoadError::UpgradeOutOfRange {
                card: CardKind::Rocket,
                ..
            })
        ));

        let mut saved = SavedMatch::from_engine(&played_engine());
        saved.planets[0].radius = 0.0;
        assert!(matches!(
            saved.into_engine(GameEngineOptions::default()),
            Err(LoadError::InvalidRadius(_))
        ));
    }

    #[test]
    fn level_outside_playable_range_is_rejected() {
        for level in [0, MAX_LEVEL + 1, u32::MAX] {
            let mut saved = SavedMatch::from_engine(&played_engine());
            saved.level = level;
            assert!(matches!(
                saved.into_engine(GameEngineOptions::default()),
                Err(LoadError::LevelOutOfRange(rejected)) if rejected == level
            ));
        }

        let mut saved = SavedMatch::from_engine(&played_engine());
        saved.level = MAX_LEVEL;
        let engine = saved
            .into_engine(GameEngineOptions::default())
            .expect("top level loads");
        assert_eq!(engine.next_level().level, MAX_LEVEL);
    }
}
