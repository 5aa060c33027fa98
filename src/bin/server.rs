use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use planet_conqueror_server::constants::{PLAYER2_COLOR, PLAYER_COLOR, TICK_MS};
use planet_conqueror_server::engine::GameEngineOptions;
use planet_conqueror_server::protocol::{encode_net_message, parse_net_message, NetMessage};
use planet_conqueror_server::save::SavedMatch;
use planet_conqueror_server::save_store::SaveStore;
use planet_conqueror_server::session::{InboundMessage, Session, SessionMode, TickOutcome};
use planet_conqueror_server::types::FactionColor;
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};

static NEXT_CLIENT: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

type ClientId = u64;

/// One connected peer. `seat` is `None` for spectators.
struct Peer {
    outbox: mpsc::Sender<Message>,
    seat: Option<FactionColor>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    peers: HashMap<ClientId, Peer>,
    session: Session,
    inbox: UnboundedSender<InboundMessage>,
    saves: SaveStore,
}

impl ServerState {
    fn new(saves: SaveStore) -> Self {
        let session = new_host_session();
        let inbox = session.inbox();
        Self {
            peers: HashMap::new(),
            session,
            inbox,
            saves,
        }
    }

    fn replace_session(&mut self, session: Session) {
        self.inbox = session.inbox();
        self.session = session;
        let full_sync = full_sync_message(&self.session);
        broadcast(self, &full_sync, QueuePolicy::DisconnectOnFull);
    }

    fn free_seat(&self) -> Option<FactionColor> {
        [PLAYER_COLOR, PLAYER2_COLOR]
            .into_iter()
            .find(|seat| self.peers.values().all(|peer| peer.seat != Some(*seat)))
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let saves_dir = std::env::var("SAVES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/saves"));

    let state = Arc::new(Mutex::new(ServerState::new(SaveStore::new(saves_dir))));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/saves", get(list_saves_handler))
        .route("/api/saves/{slot}", post(save_handler))
        .route("/api/saves/{slot}/load", post(load_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        tracing::info!(root = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        tracing::warn!("static file root not found, serving api only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(port, "listening");
    axum::serve(listener, app).await
}

fn new_host_session() -> Session {
    Session::new_match(SessionMode::Host, 1, rand::random::<u32>())
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("static")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn list_saves_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({ "saves": guard.saves.list() }))
}

async fn save_handler(
    State(state): State<SharedState>,
    Path(slot): Path<String>,
) -> impl IntoResponse {
    let guard = state.lock().await;
    match guard.saves.save(&slot, guard.session.engine()) {
        Ok(_) => (StatusCode::OK, Json(json!({ "ok": true, "slot": slot }))),
        Err(error) => {
            tracing::warn!(slot = %slot, error = %error, "save failed");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": error.to_string() })),
            )
        }
    }
}

async fn load_handler(
    State(state): State<SharedState>,
    Path(slot): Path<String>,
) -> impl IntoResponse {
    let mut guard = state.lock().await;
    let options = GameEngineOptions {
        seed: rand::random::<u32>(),
        ..GameEngineOptions::default()
    };
    match guard.saves.load(&slot, options) {
        Ok(engine) => {
            guard.replace_session(Session::new(SessionMode::Host, engine));
            (StatusCode::OK, Json(json!({ "ok": true, "slot": slot })))
        }
        Err(error) => {
            tracing::warn!(slot = %slot, error = %error, "load failed, keeping current match");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": error.to_string() })),
            )
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client = NEXT_CLIENT.fetch_add(1, Ordering::Relaxed);
    let (outbox, mut outgoing) = mpsc::channel::<Message>(256);

    {
        let mut guard = state.lock().await;
        let seat = guard.free_seat();
        guard.peers.insert(
            client,
            Peer {
                outbox: outbox.clone(),
                seat,
            },
        );
        tracing::info!(client, seat = ?seat, "peer joined");
        let full_sync = full_sync_message(&guard.session);
        for message in [NetMessage::SeatAssigned { faction: seat }, full_sync] {
            send_to_peer(&mut guard, client, &message, QueuePolicy::DisconnectOnFull);
        }
    }

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(message) = outgoing.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        let text = match frame {
            Message::Text(text) => text.as_str().to_owned(),
            Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    reject(&state, client, "binary frame is not utf8").await;
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };
        enqueue_request(&state, client, &text).await;
    }

    state.lock().await.peers.remove(&client);
    tracing::info!(client, "peer left");
    drop(outbox);
    let _ = writer.await;
}

/// Only enqueues; the tick loop applies requests inside `Session::tick`.
async fn enqueue_request(state: &SharedState, client: ClientId, raw: &str) {
    let Some(message) = parse_net_message(raw) else {
        reject(state, client, "invalid message").await;
        return;
    };
    if !message.is_request() {
        reject(state, client, "only requests are accepted").await;
        return;
    }

    let guard = state.lock().await;
    let sender = guard.peers.get(&client).and_then(|peer| peer.seat);
    if guard.inbox.send(InboundMessage { sender, message }).is_err() {
        tracing::warn!(client, "session inbox closed");
    }
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    let report = state.session.tick(TICK_MS);
    for message in state.session.take_outbound() {
        let policy = match message {
            NetMessage::TickSync { .. } => QueuePolicy::DropOnFull,
            _ => QueuePolicy::DisconnectOnFull,
        };
        broadcast(state, &message, policy);
    }

    if let TickOutcome::Ended(outcome) = report.outcome {
        tracing::info!(?outcome, "match over, starting a new one");
        let notice = json!({ "type": "match_over", "outcome": outcome });
        broadcast_text(state, notice.to_string(), QueuePolicy::DisconnectOnFull);
        state.replace_session(new_host_session());
    }
}

fn full_sync_message(session: &Session) -> NetMessage {
    NetMessage::FullSync {
        request: false,
        state: Some(Box::new(SavedMatch::from_engine(session.engine()))),
    }
}

fn send_to_peer(
    state: &mut ServerState,
    client: ClientId,
    message: &NetMessage,
    policy: QueuePolicy,
) {
    let payload = match encode_net_message(message) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::error!(error = %error, "failed to encode message");
            return;
        }
    };
    let overflowed = state
        .peers
        .get(&client)
        .is_some_and(|peer| peer.outbox.try_send(Message::Text(payload.into())).is_err());
    if overflowed && policy == QueuePolicy::DisconnectOnFull {
        tracing::warn!(client, "outbound queue full, dropping peer");
        state.peers.remove(&client);
    }
}

fn broadcast(state: &mut ServerState, message: &NetMessage, policy: QueuePolicy) {
    match encode_net_message(message) {
        Ok(payload) => broadcast_text(state, payload, policy),
        Err(error) => tracing::error!(error = %error, "failed to encode broadcast"),
    }
}

fn broadcast_text(state: &mut ServerState, payload: String, policy: QueuePolicy) {
    let overflowed: Vec<ClientId> = state
        .peers
        .iter()
        .filter(|(_, peer)| {
            peer.outbox
                .try_send(Message::Text(payload.clone().into()))
                .is_err()
        })
        .map(|(client, _)| *client)
        .collect();
    if policy == QueuePolicy::DropOnFull {
        return;
    }
    for client in overflowed {
        tracing::warn!(client, "outbound queue full, dropping peer");
        state.peers.remove(&client);
    }
}

async fn reject(state: &SharedState, client: ClientId, reason: &str) {
    let guard = state.lock().await;
    if let Some(peer) = guard.peers.get(&client) {
        let payload = json!({ "type": "error", "message": reason }).to_string();
        let _ = peer.outbox.try_send(Message::Text(payload.into()));
    }
}
