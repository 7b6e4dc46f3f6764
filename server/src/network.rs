//! Transport layer: WebSocket endpoint, room-scoped fanout and the QR
//! join-link endpoint.
//!
//! Each WebSocket connection gets a writer task fed by an unbounded
//! channel; the sender half is registered in the [`RoomRegistry`] under
//! the session the connection joins, which is all the bookkeeping room
//! broadcast needs. The receive loop parses JSON frames into
//! [`shared::ClientEvent`]s and drives the protocol handler; malformed
//! frames are logged and dropped.

use crate::protocol::{self, ConnContext, Outbound};
use crate::session::SessionStore;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::{SinkExt, StreamExt};
use log::{error, info, warn};
use qrcode::render::svg;
use qrcode::QrCode;
use serde_json::json;
use shared::ServerEvent;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tower_http::services::ServeDir;

/// Runtime knobs shared by the handlers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Reveal-pacing delay forwarded verbatim with each draw.
    pub animation_delay_ms: u64,
    /// Root of the static asset tree.
    pub static_dir: PathBuf,
}

/// Shared handles for every connection and HTTP request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<SessionStore>>,
    pub rooms: Arc<RwLock<RoomRegistry>>,
    pub config: ServerConfig,
}

/// Connection senders grouped by session room.
///
/// Membership mirrors the connection/session binding: a connection is
/// added when it joins a session and removed when it rebinds or closes.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, HashMap<u32, mpsc::UnboundedSender<Message>>>,
    next_conn_id: u32,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            next_conn_id: 1,
        }
    }

    /// Hands out the next connection id.
    pub fn next_conn_id(&mut self) -> u32 {
        let id = self.next_conn_id;
        self.next_conn_id += 1;
        id
    }

    /// Adds a connection's sender to a session room.
    pub fn join(&mut self, session_id: &str, conn_id: u32, tx: mpsc::UnboundedSender<Message>) {
        self.rooms
            .entry(session_id.to_string())
            .or_default()
            .insert(conn_id, tx);
    }

    /// Drops a connection from a room, removing the room once empty.
    pub fn leave(&mut self, session_id: &str, conn_id: u32) {
        if let Some(members) = self.rooms.get_mut(session_id) {
            members.remove(&conn_id);
            if members.is_empty() {
                self.rooms.remove(session_id);
            }
        }
    }

    /// Number of connections currently in a room.
    pub fn room_len(&self, session_id: &str) -> usize {
        self.rooms.get(session_id).map_or(0, |m| m.len())
    }

    /// Delivers an event to every connection in a room, the actor
    /// included. Send failures mean the peer is already going away and
    /// are ignored; its own cleanup removes it.
    pub fn broadcast(&self, session_id: &str, event: &ServerEvent) {
        let Some(members) = self.rooms.get(session_id) else {
            return;
        };
        let Some(message) = encode(event) else {
            return;
        };
        for tx in members.values() {
            let _ = tx.send(message.clone());
        }
    }
}

fn encode(event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            error!("Failed to encode event: {}", e);
            None
        }
    }
}

/// Builds the full application router: WebSocket endpoint, QR endpoint
/// and static asset fallback.
pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/api/qr/{session_id}", get(qr_code))
        .fallback_service(assets)
        .with_state(state)
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs one connection: writer task + receive loop + disconnect cleanup.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    let conn_id = state.rooms.write().await.next_conn_id();
    info!("Client {} connected", conn_id);
    let mut ctx = ConnContext::new(conn_id);

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let event = match serde_json::from_str(&text) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping malformed frame from client {}: {}", conn_id, e);
                continue;
            }
        };

        let bound_before = ctx.session_id.clone();
        let replies = {
            let mut store = state.store.write().await;
            protocol::handle_event(
                &mut store,
                &mut ctx,
                event,
                state.config.animation_delay_ms,
                &mut rand::thread_rng(),
            )
        };

        if ctx.session_id != bound_before {
            let mut rooms = state.rooms.write().await;
            if let Some(old) = &bound_before {
                rooms.leave(old, conn_id);
            }
            if let Some(new) = &ctx.session_id {
                rooms.join(new, conn_id, tx.clone());
            }
        }

        deliver(&state, &ctx, &tx, replies).await;
    }

    let replies = {
        let mut store = state.store.write().await;
        protocol::handle_disconnect(&mut store, &ctx)
    };
    deliver(&state, &ctx, &tx, replies).await;

    if let Some(session_id) = &ctx.session_id {
        state.rooms.write().await.leave(session_id, conn_id);
    }
    info!("Client {} disconnected", conn_id);

    drop(tx);
    let _ = writer.await;
}

/// Executes the protocol handler's outbound actions.
async fn deliver(
    state: &AppState,
    ctx: &ConnContext,
    tx: &mpsc::UnboundedSender<Message>,
    replies: Vec<Outbound>,
) {
    for reply in replies {
        match reply {
            Outbound::Private(event) => {
                if let Some(message) = encode(&event) {
                    let _ = tx.send(message);
                }
            }
            Outbound::Room(event) => {
                if let Some(session_id) = &ctx.session_id {
                    state.rooms.read().await.broadcast(session_id, &event);
                }
            }
        }
    }
}

/// `GET /api/qr/{session_id}` — QR code for the player join page, as a
/// data URI, plus the encoded URL itself.
async fn qr_code(Path(session_id): Path<String>, headers: HeaderMap) -> impl IntoResponse {
    let url = join_url(&headers, &session_id);

    match render_qr_data_uri(&url) {
        Ok(qr) => (StatusCode::OK, Json(json!({ "qrCode": qr, "url": url }))),
        Err(e) => {
            error!("QR encoding failed for session {}: {:?}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to encode QR code" })),
            )
        }
    }
}

/// Player-facing join URL for a session. The scheme honors
/// `X-Forwarded-Proto` so the link stays reachable behind a
/// TLS-terminating proxy; without it plain `http` is assumed.
fn join_url(headers: &HeaderMap, session_id: &str) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}/player.html?session={}", scheme, host, session_id)
}

fn render_qr_data_uri(url: &str) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(url.as_bytes())?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .build();
    Ok(format!(
        "data:image/svg+xml;base64,{}",
        BASE64.encode(image)
    ))
}
