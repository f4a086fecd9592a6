//! WebRTC signaling relay.
//!
//! Peers join a call room (at most two per room) and exchange opaque signal
//! payloads through the server until their direct connection is up.

pub mod messages;
pub mod roster;

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::state::AppState;
use messages::{ClientMessage, ServerMessage};
use roster::{JoinOutcome, PeerId, RoomRoster};

pub fn router() -> Router<AppState> {
    Router::new().route("/signaling", get(signaling_ws))
}

#[instrument(skip_all)]
pub async fn signaling_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let roster = state.rooms.clone();
    ws.on_upgrade(move |socket| serve_peer(socket, roster))
}

/// Applies one client frame on behalf of `peer`.
pub fn dispatch(roster: &RoomRoster, peer: PeerId, msg: ClientMessage) {
    match msg {
        ClientMessage::JoinRoom { room_id } => match roster.join(&room_id, peer) {
            JoinOutcome::Joined(users) => {
                info!(%peer, room_id = %room_id, peers = users.len(), "peer joined room");
                roster.send(peer, ServerMessage::AllUsers { users });
            }
            JoinOutcome::Full => {
                warn!(%peer, room_id = %room_id, "room full");
                roster.send(peer, ServerMessage::RoomFull);
            }
        },
        ClientMessage::SendingSignal {
            user_to_signal,
            caller_id,
            signal,
        } => {
            if !roster.send(user_to_signal, ServerMessage::UserJoined { signal, caller_id }) {
                debug!(%peer, to = %user_to_signal, "signal target gone");
            }
        }
        ClientMessage::ReturningSignal { caller_id, signal } => {
            if !roster.send(caller_id, ServerMessage::ReceivingReturnedSignal { signal, id: peer }) {
                debug!(%peer, to = %caller_id, "signal target gone");
            }
        }
    }
}

async fn serve_peer(socket: WebSocket, roster: Arc<RoomRoster>) {
    let peer = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    roster.register(peer, tx);
    roster.send(peer, ServerMessage::Connected { id: peer });
    debug!(%peer, "signaling peer connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "could not encode signaling frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let inbound = roster.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = stream.next().await {
            match frame {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => dispatch(&inbound, peer, msg),
                    Err(e) => debug!(%peer, error = %e, "ignoring malformed frame"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    roster.leave(peer);
    debug!(%peer, open_rooms = roster.room_count(), "signaling peer disconnected");
}
