use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::constants::{
    FULL_SYNC_INTERVAL_MS, PLAYER2_COLOR, PLAYER_COLOR, TICK_SYNC_INTERVAL_MS,
};
use crate::engine::{GameEngine, GameEngineOptions};
use crate::protocol::NetMessage;
use crate::save::SavedMatch;
use crate::types::{CardKind, FactionColor, GameEvent, MatchOutcome, PlanetId, Snapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    SinglePlayer,
    LocalTwoPlayer,
    Host,
    Client,
}

#[derive(Clone, Debug)]
pub struct InboundMessage {
    /// Seat of the peer that sent it; `None` for spectators.
    pub sender: Option<FactionColor>,
    pub message: NetMessage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    CreateConnection { from: PlanetId, to: PlanetId },
    DeleteConnection { from: PlanetId, to: PlanetId },
    DropCard { card: CardKind, planet: PlanetId },
}

impl PlayerAction {
    fn into_message(self, request: bool) -> NetMessage {
        match self {
            Self::CreateConnection { from, to } => NetMessage::ConnectionCreated { request, from, to },
            Self::DeleteConnection { from, to } => NetMessage::ConnectionDeleted { request, from, to },
            Self::DropCard { card, planet } => NetMessage::CardDropped {
                request,
                card,
                planet,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    LevelCleared { level: u32 },
    Ended(MatchOutcome),
}

#[derive(Clone, Debug)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub events: Vec<GameEvent>,
}

pub fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub struct Session {
    mode: SessionMode,
    engine: GameEngine,
    inbox_tx: UnboundedSender<InboundMessage>,
    inbox_rx: UnboundedReceiver<InboundMessage>,
    outbound: Vec<NetMessage>,
    last_tick_sync: u64,
    last_full_sync: u64,
    clock: fn() -> u64,
}

impl Session {
    pub fn new(mode: SessionMode, mut engine: GameEngine) -> Self {
        if mode == SessionMode::Client {
            engine.set_ai_enabled(false);
        }
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let mut outbound = Vec::new();
        if mode == SessionMode::Client {
            outbound.push(NetMessage::FullSync {
                request: true,
                state: None,
            });
        }
        let synced_at = engine.current_ticks;
        tracing::info!(?mode, level = engine.level, "session started");
        Self {
            mode,
            engine,
            inbox_tx,
            inbox_rx,
            outbound,
            last_tick_sync: synced_at,
            last_full_sync: synced_at,
            clock: wall_clock_ms,
        }
    }

    pub fn new_match(mode: SessionMode, level: u32, seed: u32) -> Self {
        let p2 = match mode {
            SessionMode::SinglePlayer => None,
            _ => Some(PLAYER2_COLOR),
        };
        let options = GameEngineOptions {
            seed,
            ..GameEngineOptions::default()
        };
        Self::new(mode, GameEngine::new(PLAYER_COLOR, p2, level, options))
    }

    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Handle for the I/O side; it only enqueues, `tick` applies.
    pub fn inbox(&self) -> UnboundedSender<InboundMessage> {
        self.inbox_tx.clone()
    }

    pub fn take_outbound(&mut self) -> Vec<NetMessage> {
        std::mem::take(&mut self.outbound)
    }

    pub fn snapshot(&mut self) -> Snapshot {
        self.engine.build_snapshot(false)
    }

    /// Faction driven by local input right now, if any.
    pub fn local_faction(&self) -> Option<FactionColor> {
        match self.mode {
            SessionMode::SinglePlayer | SessionMode::Host => Some(self.engine.p1_color),
            SessionMode::Client => self.engine.p2_color,
            SessionMode::LocalTwoPlayer => {
                let turn = self.engine.current_turn_color;
                self.engine.is_human(turn).then_some(turn)
            }
        }
    }

    pub fn submit_local(&mut self, action: PlayerAction) -> bool {
        let Some(actor) = self.local_faction() else {
            return false;
        };
        if self.mode == SessionMode::Client {
            self.outbound.push(action.into_message(true));
            return true;
        }
        let applied = self.apply(Some(actor), action);
        if applied && self.mode == SessionMode::Host {
            self.outbound.push(action.into_message(false));
        }
        applied
    }

    pub fn tick(&mut self, dt_ms: u64) -> TickReport {
        while let Ok(inbound) = self.inbox_rx.try_recv() {
            self.handle_inbound(inbound);
        }

        self.engine.step(dt_ms);
        let events = self.engine.drain_events();
        if self.mode == SessionMode::Host {
            self.broadcast_ai_moves(&events);
            self.emit_syncs();
        }

        let outcome = match self.engine.outcome() {
            None => TickOutcome::Running,
            Some(MatchOutcome::Won { .. }) if self.mode == SessionMode::SinglePlayer => {
                let next = self.engine.next_level();
                let level = next.level;
                tracing::info!(level, year = next.year, "level cleared");
                self.engine = next;
                TickOutcome::LevelCleared { level }
            }
            Some(outcome) => TickOutcome::Ended(outcome),
        };
        TickReport { outcome, events }
    }

    /// Select / connect / deselect on planets, delete on connections.
    pub fn click_board(&mut self, x: f32, y: f32) -> bool {
        let Some(actor) = self.local_faction() else {
            return false;
        };

        if let Some(clicked) = self.engine.planet_at(x, y) {
            match self.engine.selected_planet() {
                None => {
                    let selectable = self
                        .engine
                        .planet(clicked)
                        .map(|planet| planet.color == actor && planet.value >= 1)
                        .unwrap_or(false);
                    if selectable {
                        self.engine.select_planet(Some(clicked));
                    }
                }
                Some(selected) if selected != clicked => {
                    self.engine.select_planet(None);
                    self.submit_local(PlayerAction::CreateConnection {
                        from: selected,
                        to: clicked,
                    });
                }
                Some(_) => self.engine.select_planet(None),
            }
            return true;
        }

        if let Some((from, to)) = self.engine.connection_at(x, y) {
            let owned = self
                .engine
                .planet(from)
                .map(|planet| planet.color == actor)
                .unwrap_or(false);
            if owned {
                self.submit_local(PlayerAction::DeleteConnection { from, to });
            }
            return true;
        }
        false
    }

    pub fn begin_card_drag(&mut self, card: CardKind) -> bool {
        if self.local_faction() != Some(self.engine.current_turn_color) {
            return false;
        }
        self.engine.begin_card_drag(card);
        true
    }

    /// Releases the dragged card over `(x, y)`; the drag ends either way.
    pub fn drop_card_at(&mut self, x: f32, y: f32) -> bool {
        let Some(card) = self.engine.dragging_card() else {
            return false;
        };
        let applied = match self.engine.planet_at(x, y) {
            Some(planet) => self.submit_local(PlayerAction::DropCard { card, planet }),
            None => false,
        };
        self.engine.end_card_drag();
        applied
    }

    pub fn end_card_drag(&mut self) {
        self.engine.end_card_drag();
    }

    fn apply(&mut self, actor: Option<FactionColor>, action: PlayerAction) -> bool {
        match action {
            PlayerAction::CreateConnection { from, to } => {
                self.engine.create_connection(actor, from, to)
            }
            PlayerAction::DeleteConnection { from, to } => {
                self.engine.delete_connection(actor, from, to)
            }
            PlayerAction::DropCard { card, planet } => self.engine.drop_card(actor, card, planet),
        }
    }

    fn handle_inbound(&mut self, inbound: InboundMessage) {
        let InboundMessage { sender, message } = inbound;
        match self.mode {
            SessionMode::Host => self.handle_request(sender, message),
            SessionMode::Client => self.handle_update(message),
            SessionMode::SinglePlayer | SessionMode::LocalTwoPlayer => {
                tracing::debug!(?message, "ignoring network message in offline session");
            }
        }
    }

    fn handle_request(&mut self, sender: Option<FactionColor>, message: NetMessage) {
        if !message.is_request() {
            tracing::debug!(?message, "host ignores non-request message");
            return;
        }
        let action = match message {
            NetMessage::CardDropped { card, planet, .. } => PlayerAction::DropCard { card, planet },
            NetMessage::ConnectionCreated { from, to, .. } => {
                PlayerAction::CreateConnection { from, to }
            }
            NetMessage::ConnectionDeleted { from, to, .. } => {
                PlayerAction::DeleteConnection { from, to }
            }
            NetMessage::FullSync { .. } => {
                self.push_full_sync();
                return;
            }
            NetMessage::TickSync { .. } | NetMessage::SeatAssigned { .. } => return,
        };
        let Some(sender) = sender else {
            tracing::debug!(?action, "request from spectator ignored");
            return;
        };
        if self.apply(Some(sender), action) {
            self.outbound.push(message.into_update());
        }
    }

    fn handle_update(&mut self, message: NetMessage) {
        if message.is_request() {
            return;
        }
        match message {
            NetMessage::CardDropped { card, planet, .. } => {
                self.apply(None, PlayerAction::DropCard { card, planet });
            }
            NetMessage::ConnectionCreated { from, to, .. } => {
                self.apply(None, PlayerAction::CreateConnection { from, to });
            }
            NetMessage::ConnectionDeleted { from, to, .. } => {
                self.apply(None, PlayerAction::DeleteConnection { from, to });
            }
            NetMessage::TickSync { ticks, sent_at, .. } => {
                let latency = (self.clock)().saturating_sub(sent_at);
                self.engine.current_ticks = ticks.saturating_add(latency);
            }
            NetMessage::FullSync { state, .. } => {
                let Some(state) = state else {
                    return;
                };
                match state.into_engine(self.engine.options().clone()) {
                    Ok(engine) => {
                        self.engine = engine;
                        tracing::info!(level = self.engine.level, "full sync applied");
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "full sync rejected, keeping current state");
                    }
                }
            }
            NetMessage::SeatAssigned { faction } => {
                tracing::info!(?faction, "seat assigned");
            }
        }
    }

    fn broadcast_ai_moves(&mut self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::ConnectionCreated {
                    from,
                    to,
                    by_ai: true,
                } => self.outbound.push(NetMessage::ConnectionCreated {
                    request: false,
                    from,
                    to,
                }),
                GameEvent::UpgradeApplied {
                    planet,
                    card,
                    by_ai: true,
                    ..
                } => self.outbound.push(NetMessage::CardDropped {
                    request: false,
                    card,
                    planet,
                }),
                _ => {}
            }
        }
    }

    fn emit_syncs(&mut self) {
        let ticks = self.engine.current_ticks;
        if ticks.saturating_sub(self.last_full_sync) >= FULL_SYNC_INTERVAL_MS {
            self.last_full_sync = ticks;
            self.push_full_sync();
        }
        if ticks.saturating_sub(self.last_tick_sync) >= TICK_SYNC_INTERVAL_MS {
            self.last_tick_sync = ticks;
            self.outbound.push(NetMessage::TickSync {
                request: false,
                ticks,
                sent_at: (self.clock)(),
            });
        }
    }

    fn push_full_sync(&mut self) {
        self.outbound.push(NetMessage::FullSync {
            request: false,
            state: Some(Box::new(SavedMatch::from_engine(&self.engine))),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NEUTRAL_COLOR, START_YEAR, TICK_MS};
    use crate::engine::MatchHeader;
    use crate::world::Planet;

    fn header(p2: Option<FactionColor>) -> MatchHeader {
        MatchHeader {
            p1_color: PLAYER_COLOR,
            p2_color: p2,
            level: 1,
            year: START_YEAR,
            year_start: START_YEAR,
            current_turn_color: PLAYER_COLOR,
            current_turn_start: 0,
            current_ticks: 0,
        }
    }

    fn planet(id: u32, x: f32, color: FactionColor, value: i32) -> Planet {
        Planet::new(PlanetId(id), x, 0.0, color, value)
    }

    fn board(mode: SessionMode, planets: Vec<Planet>) -> Session {
        let p2 = match mode {
            SessionMode::SinglePlayer => None,
            _ => Some(PLAYER2_COLOR),
        };
        let options = GameEngineOptions {
            ai_enabled: false,
            ..GameEngineOptions::default()
        };
        let engine = GameEngine::restore(header(p2), planets, Vec::new(), options);
        Session::new(mode, engine)
    }

    fn duel(mode: SessionMode) -> Session {
        board(
            mode,
            vec![
                planet(0, 0.0, PLAYER_COLOR, 20),
                planet(1, 300.0, PLAYER2_COLOR, 20),
                planet(2, 600.0, NEUTRAL_COLOR, 5),
            ],
        )
    }

    fn fixed_clock() -> u64 {
        10_000
    }

    #[test]
    fn single_player_win_loads_next_level() {
        let mut session = board(
            SessionMode::SinglePlayer,
            vec![
                planet(0, 0.0, PLAYER_COLOR, 10),
                planet(1, 180.0, FactionColor(90, 90, 90), 1),
            ],
        );
        assert!(session.submit_local(PlayerAction::CreateConnection {
            from: PlanetId(0),
            to: PlanetId(1),
        }));

        let mut cleared = None;
        for _ in 0..40 {
            if let TickOutcome::LevelCleared { level } = session.tick(TICK_MS).outcome {
                cleared = Some(level);
                break;
            }
        }
        assert_eq!(cleared, Some(2));
        assert_eq!(session.engine().level, 2);
        assert_eq!(session.engine().planets().len(), 8);
        assert!(!session.engine().is_ended());
    }

    #[test]
    fn single_player_loss_ends_match() {
        let enemy = FactionColor(90, 90, 90);
        let mut session = board(
            SessionMode::SinglePlayer,
            vec![planet(0, 0.0, enemy, 10), planet(1, 300.0, enemy, 1)],
        );
        let report = session.tick(TICK_MS);
        assert_eq!(
            report.outcome,
            TickOutcome::Ended(MatchOutcome::Lost { faction: enemy })
        );
        assert!(report
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::MatchEnded { .. })));
    }

    #[test]
    fn local_two_player_acts_for_turn_holder() {
        let mut session = duel(SessionMode::LocalTwoPlayer);
        assert_eq!(session.local_faction(), Some(PLAYER_COLOR));
        assert!(!session.submit_local(PlayerAction::CreateConnection {
            from: PlanetId(1),
            to: PlanetId(0),
        }));
        assert!(session.submit_local(PlayerAction::CreateConnection {
            from: PlanetId(0),
            to: PlanetId(1),
        }));
    }

    #[test]
    fn host_applies_remote_requests_as_sender() {
        let mut session = duel(SessionMode::Host);
        let inbox = session.inbox();
        inbox
            .send(InboundMessage {
                sender: Some(PLAYER2_COLOR),
                message: NetMessage::ConnectionCreated {
                    request: true,
                    from: PlanetId(0),
                    to: PlanetId(1),
                },
            })
            .expect("inbox open");
        inbox
            .send(InboundMessage {
                sender: Some(PLAYER2_COLOR),
                message: NetMessage::ConnectionCreated {
                    request: true,
                    from: PlanetId(1),
                    to: PlanetId(0),
                },
            })
            .expect("inbox open");
        inbox
            .send(InboundMessage {
                sender: None,
                message: NetMessage::ConnectionCreated {
                    request: true,
                    from: PlanetId(1),
                    to: PlanetId(2),
                },
            })
            .expect("inbox open");
        session.tick(TICK_MS);

        let connections: Vec<(PlanetId, PlanetId)> = session
            .engine()
            .connections()
            .iter()
            .map(|c| (c.from, c.to))
            .collect();
        assert_eq!(connections, vec![(PlanetId(1), PlanetId(0))]);
        let outbound = session.take_outbound();
        assert_eq!(outbound.len(), 1);
        assert!(matches!(
            outbound[0],
            NetMessage::ConnectionCreated {
                request: false,
                from: PlanetId(1),
                to: PlanetId(0),
            }
        ));
    }

    #[test]
    fn host_answers_full_sync_and_emits_periodic_syncs() {
        let mut session = duel(SessionMode::Host).with_clock(fixed_clock);
        session
            .inbox()
            .send(InboundMessage {
                sender: Some(PLAYER2_COLOR),
                message: NetMessage::FullSync {
                    request: true,
                    state: None,
                },
            })
            .expect("inbox open");
        session.tick(TICK_MS);
        let outbound = session.take_outbound();
        assert!(matches!(
            outbound.as_slice(),
            [NetMessage::FullSync {
                request: false,
                state: Some(_)
            }]
        ));

        for _ in 0..20 {
            session.tick(TICK_MS);
        }
        let outbound = session.take_outbound();
        assert!(outbound.iter().any(|message| matches!(
            message,
            NetMessage::TickSync {
                ticks: 1_000,
                sent_at: 10_000,
                ..
            }
        )));
    }

    #[test]
    fn host_pushes_full_sync_every_interval() {
        let mut session = duel(SessionMode::Host);
        let mut synced_at = Vec::new();
        for _ in 0..2 * FULL_SYNC_INTERVAL_MS / TICK_MS {
            session.tick(TICK_MS);
            for message in session.take_outbound() {
                if let NetMessage::FullSync {
                    request: false,
                    state: Some(state),
                } = message
                {
                    synced_at.push(state.current_ticks);
                }
            }
        }
        assert_eq!(
            synced_at,
            vec![FULL_SYNC_INTERVAL_MS, 2 * FULL_SYNC_INTERVAL_MS]
        );
    }

    #[test]
    fn host_broadcasts_ai_moves_as_updates() {
        let enemy = FactionColor(90, 90, 90);
        let mut opening = header(Some(PLAYER2_COLOR));
        opening.current_turn_color = enemy;
        let engine = GameEngine::restore(
            opening,
            vec![
                planet(0, 0.0, PLAYER_COLOR, 1_000),
                planet(1, 300.0, PLAYER2_COLOR, 1_000),
                planet(2, 600.0, enemy, 500),
                planet(3, 900.0, enemy, 500),
            ],
            Vec::new(),
            GameEngineOptions {
                seed: 8,
                ..GameEngineOptions::default()
            },
        );
        let mut session = Session::new(SessionMode::Host, engine);

        let mut ai_updates = Vec::new();
        for _ in 0..2_000 {
            session.tick(TICK_MS);
            ai_updates.extend(session.take_outbound().into_iter().filter(|message| {
                matches!(
                    message,
                    NetMessage::ConnectionCreated { request: false, .. }
                        | NetMessage::CardDropped { request: false, .. }
                )
            }));
            if !ai_updates.is_empty() {
                break;
            }
        }

        assert!(!ai_updates.is_empty());
        for update in &ai_updates {
            match *update {
                NetMessage::ConnectionCreated { from, .. } => {
                    let source = session.engine().planet(from).expect("source exists");
                    assert_eq!(source.color, enemy);
                }
                NetMessage::CardDropped { planet, .. } => {
                    let planet = session.engine().planet(planet).expect("planet exists");
                    assert_eq!(planet.color, enemy);
                    assert!(planet.satellite_upgrade + planet.rocket_upgrade > 1);
                }
                _ => unreachable!("filtered to action updates"),
            }
        }
    }

    #[test]
    fn client_sends_requests_without_mutating() {
        let mut session = duel(SessionMode::Client);
        assert!(!session.engine().options().ai_enabled);
        let hello = session.take_outbound();
        assert!(matches!(
            hello.as_slice(),
            [NetMessage::FullSync {
                request: true,
                state: None
            }]
        ));

        assert!(session.submit_local(PlayerAction::CreateConnection {
            from: PlanetId(1),
            to: PlanetId(0),
        }));
        assert!(session.engine().connections().is_empty());
        let outbound = session.take_outbound();
        assert!(matches!(
            outbound.as_slice(),
            [NetMessage::ConnectionCreated { request: true, .. }]
        ));

        session
            .inbox()
            .send(InboundMessage {
                sender: None,
                message: NetMessage::ConnectionCreated {
                    request: false,
                    from: PlanetId(1),
                    to: PlanetId(0),
                },
            })
            .expect("inbox open");
        session.tick(TICK_MS);
        assert_eq!(session.engine().connections().len(), 1);
    }

    #[test]
    fn client_corrects_clock_from_tick_sync() {
        let mut session = duel(SessionMode::Client).with_clock(fixed_clock);
        session
            .inbox()
            .send(InboundMessage {
                sender: None,
                message: NetMessage::TickSync {
                    request: false,
                    ticks: 5_000,
                    sent_at: 9_900,
                },
            })
            .expect("inbox open");
        session.tick(TICK_MS);
        assert_eq!(session.engine().current_ticks, 5_000 + 100 + TICK_MS);
    }

    #[test]
    fn failed_full_sync_keeps_previous_state() {
        let mut session = duel(SessionMode::Client);
        let mut broken = SavedMatch::from_engine(session.engine());
        broken.planets[1].id = broken.planets[0].id;
        broken.current_ticks = 99_999;
        session
            .inbox()
            .send(InboundMessage {
                sender: None,
                message: NetMessage::FullSync {
                    request: false,
                    state: Some(Box::new(broken)),
                },
            })
            .expect("inbox open");
        session.tick(TICK_MS);
        assert_eq!(session.engine().current_ticks, TICK_MS);
        assert_eq!(session.engine().planets().len(), 3);
    }

    #[test]
    fn full_sync_replaces_client_state() {
        let mut host = duel(SessionMode::Host);
        assert!(host.submit_local(PlayerAction::CreateConnection {
            from: PlanetId(0),
            to: PlanetId(2),
        }));
        for _ in 0..10 {
            host.tick(TICK_MS);
        }
        let mut client = duel(SessionMode::Client);
        client
            .inbox()
            .send(InboundMessage {
                sender: None,
                message: NetMessage::FullSync {
                    request: false,
                    state: Some(Box::new(SavedMatch::from_engine(host.engine()))),
                },
            })
            .expect("inbox open");
        client.tick(TICK_MS);
        assert_eq!(client.engine().connections().len(), 1);
        assert_eq!(client.engine().current_ticks, host.engine().current_ticks + TICK_MS);
        assert!(!client.engine().options().ai_enabled);
    }

    #[test]
    fn clicks_select_connect_and_delete() {
        let mut session = duel(SessionMode::SinglePlayer);
        // Enemy planets cannot be selected.
        assert!(session.click_board(360.0, 60.0));
        assert_eq!(session.engine().selected_planet(), None);

        assert!(session.click_board(60.0, 60.0));
        assert_eq!(session.engine().selected_planet(), Some(PlanetId(0)));
        assert!(session.click_board(360.0, 60.0));
        assert_eq!(session.engine().selected_planet(), None);
        assert_eq!(session.engine().connections().len(), 1);

        assert!(session.click_board(60.0, 60.0));
        assert!(session.click_board(60.0, 60.0));
        assert_eq!(session.engine().selected_planet(), None);

        assert!(session.click_board(210.0, 62.0));
        assert!(session.engine().connections().is_empty());
        assert!(!session.click_board(400.0, 900.0));
    }

    #[test]
    fn card_drag_and_drop_upgrades_planet() {
        let mut session = duel(SessionMode::SinglePlayer);
        assert!(session.begin_card_drag(CardKind::Satellite));
        let hints: Vec<bool> = session
            .engine()
            .planets()
            .iter()
            .map(|p| p.apply_black_surface)
            .collect();
        assert_eq!(hints, vec![false, true, true]);

        assert!(session.drop_card_at(60.0, 60.0));
        let planet = session.engine().planet(PlanetId(0)).expect("planet exists");
        assert_eq!(planet.satellite_upgrade, 1);
        assert_eq!(planet.value, 10);
        assert_eq!(session.engine().dragging_card(), None);
        assert!(session.engine().planets().iter().all(|p| !p.apply_black_surface));

        assert!(session.begin_card_drag(CardKind::Rocket));
        assert!(!session.drop_card_at(360.0, 60.0));
        assert!(!session.drop_card_at(60.0, 60.0));
    }
}
