use std::collections::BTreeSet;

use crate::constants::{
    ai_connect_chance, AI_UPGRADE_CHANCE, MAX_LEVEL, MAX_ROCKET_UPGRADE,
    MAX_SATELLITE_UPGRADE, NEUTRAL_COLOR, START_YEAR, TURN_TIME_MS,
};
use crate::rng::Rng;
use crate::types::{
    CardKind, ConnectionView, FactionColor, GameEvent, MatchOutcome, PlanetId, Snapshot,
};
use crate::world::{generate_board, Connection, Planet, Rocket};

mod ai_system;
mod combat_system;
mod turn_system;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpgradePick {
    #[default]
    Uniform,
    Strongest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetPick {
    #[default]
    Uniform,
    Weakest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AiProfile {
    pub upgrade_pick: UpgradePick,
    pub target_pick: TargetPick,
    /// Never aim new connections at planets of the same faction.
    pub spare_allies: bool,
}

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub seed: u32,
    pub ai: AiProfile,
    pub ai_enabled: bool,
    /// Let the AI play the human seats too (headless simulation).
    pub autoplay_humans: bool,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            ai: AiProfile::default(),
            ai_enabled: true,
            autoplay_humans: false,
        }
    }
}

/// Scalar match state, shared by persistence and engine construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchHeader {
    pub p1_color: FactionColor,
    pub p2_color: Option<FactionColor>,
    pub level: u32,
    pub year: i32,
    pub year_start: i32,
    pub current_turn_color: FactionColor,
    pub current_turn_start: u64,
    pub current_ticks: u64,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub p1_color: FactionColor,
    pub p2_color: Option<FactionColor>,
    pub level: u32,
    pub year: i32,
    pub year_start: i32,
    pub current_turn_color: FactionColor,
    pub current_turn_start: u64,
    pub current_ticks: u64,

    options: GameEngineOptions,
    rng: Rng,
    planets: Vec<Planet>,
    connections: Vec<Connection>,
    events: Vec<GameEvent>,
    dragging_card: Option<CardKind>,
    ai_turn_done: bool,
    outcome: Option<MatchOutcome>,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(
        p1_color: FactionColor,
        p2_color: Option<FactionColor>,
        level: u32,
        options: GameEngineOptions,
    ) -> Self {
        let mut rng = Rng::new(options.seed);
        let planets = generate_board(level, p1_color, p2_color, &mut rng);
        let header = MatchHeader {
            p1_color,
            p2_color,
            level,
            year: START_YEAR,
            year_start: START_YEAR,
            current_turn_color: p1_color,
            current_turn_start: 0,
            current_ticks: 0,
        };
        Self::with_rng(header, planets, Vec::new(), options, rng)
    }

    pub fn restore(
        header: MatchHeader,
        planets: Vec<Planet>,
        connections: Vec<Connection>,
        options: GameEngineOptions,
    ) -> Self {
        let rng = Rng::new(options.seed);
        Self::with_rng(header, planets, connections, options, rng)
    }

    fn with_rng(
        header: MatchHeader,
        planets: Vec<Planet>,
        connections: Vec<Connection>,
        options: GameEngineOptions,
        rng: Rng,
    ) -> Self {
        Self {
            p1_color: header.p1_color,
            p2_color: header.p2_color,
            level: header.level,
            year: header.year,
            year_start: header.year_start,
            current_turn_color: header.current_turn_color,
            current_turn_start: header.current_turn_start,
            current_ticks: header.current_ticks,
            options,
            rng,
            planets,
            connections,
            events: Vec::new(),
            dragging_card: None,
            ai_turn_done: false,
            outcome: None,
            tick_counter: 0,
        }
    }

    /// Fresh, harder board with the same factions; the calendar carries over.
    /// Past `MAX_LEVEL` the last level is replayed.
    pub fn next_level(&self) -> Self {
        let level = self.level.saturating_add(1).min(MAX_LEVEL);
        let options = GameEngineOptions {
            seed: self.options.seed.wrapping_add(level.wrapping_mul(7_919)),
            ..self.options.clone()
        };
        let mut engine = Self::new(self.p1_color, self.p2_color, level, options);
        engine.year = self.year;
        engine.year_start = self.year_start;
        engine
    }

    pub fn header(&self) -> MatchHeader {
        MatchHeader {
            p1_color: self.p1_color,
            p2_color: self.p2_color,
            level: self.level,
            year: self.year,
            year_start: self.year_start,
            current_turn_color: self.current_turn_color,
            current_turn_start: self.current_turn_start,
            current_ticks: self.current_ticks,
        }
    }

    pub fn options(&self) -> &GameEngineOptions {
        &self.options
    }

    pub fn set_ai_enabled(&mut self, enabled: bool) {
        self.options.ai_enabled = enabled;
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.iter().find(|planet| planet.id == id)
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn dragging_card(&self) -> Option<CardKind> {
        self.dragging_card
    }

    pub fn is_human(&self, color: FactionColor) -> bool {
        color == self.p1_color || Some(color) == self.p2_color
    }

    pub fn is_ai_faction(&self, color: FactionColor) -> bool {
        color != NEUTRAL_COLOR && (self.options.autoplay_humans || !self.is_human(color))
    }

    pub fn turn_time_left_fraction(&self) -> f32 {
        let elapsed = self.current_ticks.saturating_sub(self.current_turn_start);
        (1.0 - elapsed as f32 / TURN_TIME_MS as f32).clamp(0.0, 1.0)
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.outcome.is_some() {
            return;
        }
        self.tick_counter += 1;
        self.current_ticks = self.current_ticks.saturating_add(dt_ms);

        self.grow_planets();
        self.launch_rockets();
        self.advance_rockets(dt_ms);
        if self.check_match_end() {
            return;
        }
        self.rotate_turn_if_due();
        if self.options.ai_enabled {
            self.run_ai_turn();
            self.run_ai_continuous(dt_ms);
        }
        self.refresh_drag_hints();
    }

    pub fn create_connection(
        &mut self,
        actor: Option<FactionColor>,
        from: PlanetId,
        to: PlanetId,
    ) -> bool {
        if from == to {
            return false;
        }
        let (Some(source_idx), Some(_)) = (self.planet_index(from), self.planet_index(to)) else {
            tracing::debug!(%from, %to, "connection rejected: unknown planet");
            return false;
        };
        if actor.is_some_and(|actor| self.planets[source_idx].color != actor) {
            tracing::debug!(%from, %to, "connection rejected: source not owned by actor");
            return false;
        }
        self.insert_connection(source_idx, to, false)
    }

    pub fn delete_connection(
        &mut self,
        actor: Option<FactionColor>,
        from: PlanetId,
        to: PlanetId,
    ) -> bool {
        let Some(conn_idx) = self
            .connections
            .iter()
            .position(|connection| connection.from == from && connection.to == to)
        else {
            return false;
        };
        if let Some(actor) = actor {
            let owned = self
                .planet(from)
                .map(|planet| planet.color == actor)
                .unwrap_or(false);
            if !owned {
                tracing::debug!(%from, %to, "delete rejected: source not owned by actor");
                return false;
            }
        }
        self.connections.remove(conn_idx);
        self.events.push(GameEvent::ConnectionDeleted { from, to });
        tracing::info!(%from, %to, "connection deleted");
        true
    }

    pub fn drop_card(
        &mut self,
        actor: Option<FactionColor>,
        card: CardKind,
        planet: PlanetId,
    ) -> bool {
        let Some(idx) = self.planet_index(planet) else {
            return false;
        };
        if let Some(actor) = actor {
            let owner = self.planets[idx].color;
            if owner != actor || owner != self.current_turn_color {
                tracing::debug!(%planet, ?card, "card rejected: not this faction's turn");
                return false;
            }
        }
        self.apply_upgrade(idx, card, false)
    }

    pub fn begin_card_drag(&mut self, card: CardKind) {
        self.dragging_card = Some(card);
        self.refresh_drag_hints();
    }

    pub fn end_card_drag(&mut self) {
        self.dragging_card = None;
        self.refresh_drag_hints();
    }

    pub fn select_planet(&mut self, id: Option<PlanetId>) {
        for planet in &mut self.planets {
            planet.selected = Some(planet.id) == id;
        }
    }

    pub fn selected_planet(&self) -> Option<PlanetId> {
        self.planets
            .iter()
            .find(|planet| planet.selected)
            .map(|planet| planet.id)
    }

    pub fn planet_at(&self, x: f32, y: f32) -> Option<PlanetId> {
        self.planets
            .iter()
            .find(|planet| planet.contains(x, y))
            .map(|planet| planet.id)
    }

    pub fn connection_at(&self, x: f32, y: f32) -> Option<(PlanetId, PlanetId)> {
        self.connections
            .iter()
            .find(|connection| {
                let (Some(from), Some(to)) = (self.planet(connection.from), self.planet(connection.to))
                else {
                    return false;
                };
                connection.is_hit(from.center(), to.center(), x, y)
            })
            .map(|connection| (connection.from, connection.to))
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            current_ticks: self.current_ticks,
            year: self.year,
            level: self.level,
            current_turn_color: self.current_turn_color,
            turn_time_left_fraction: self.turn_time_left_fraction(),
            planets: self.planets.iter().map(Planet::view).collect(),
            connections: self
                .connections
                .iter()
                .map(|connection| ConnectionView {
                    from: connection.from,
                    to: connection.to,
                    rockets: connection.rockets.iter().map(|r| r.view()).collect(),
                })
                .collect(),
            events: if include_events {
                self.drain_events()
            } else {
                Vec::new()
            },
        }
    }

    /// Distinct owner tokens across all planets, neutral included.
    pub fn owner_set(&self) -> BTreeSet<FactionColor> {
        self.planets.iter().map(|planet| planet.color).collect()
    }

    fn planet_index(&self, id: PlanetId) -> Option<usize> {
        index_of(&self.planets, id)
    }

    fn insert_connection(&mut self, source_idx: usize, to: PlanetId, by_ai: bool) -> bool {
        let from = self.planets[source_idx].id;
        if self
            .connections
            .iter()
            .any(|connection| connection.from == from && connection.to == to)
        {
            tracing::debug!(%from, %to, "connection rejected: already exists");
            return false;
        }
        self.connections
            .push(Connection::new(&self.planets[source_idx], to));
        self.events
            .push(GameEvent::ConnectionCreated { from, to, by_ai });
        tracing::info!(%from, %to, by_ai, "connection created");
        true
    }

    fn refresh_drag_hints(&mut self) {
        let turn = self.current_turn_color;
        let dragging = self.dragging_card;
        for planet in &mut self.planets {
            planet.apply_black_surface = match dragging {
                Some(card) => !(planet.color == turn && planet.value > card.cost()),
                None => false,
            };
        }
    }
}

fn index_of(planets: &[Planet], id: PlanetId) -> Option<usize> {
    planets.iter().position(|planet| planet.id == id)
}
