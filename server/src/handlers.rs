use std::borrow::Cow;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use doodleguess_shared::{decode_stroke, ChannelKind, ChatEvent};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::{AuthError, Participant, TokenVerifier};
use crate::room::RoomCommand;
use crate::rooms::normalize_room_name;
use crate::state::AppState;

pub const INVALID_TOKEN_REASON: &str = "Invalid token.";

#[derive(Debug, Default, Deserialize)]
pub struct RoomQuery {
    room: Option<String>,
}

pub async fn draw_ws_handler(
    Query(query): Query<RoomQuery>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade(ws, state, query, ChannelKind::Draw)
}

pub async fn chat_ws_handler(
    Query(query): Query<RoomQuery>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade(ws, state, query, ChannelKind::Chat)
}

fn upgrade(
    ws: WebSocketUpgrade,
    state: AppState,
    query: RoomQuery,
    kind: ChannelKind,
) -> axum::response::Response {
    let Some(room) = normalize_room_name(query.room.as_deref()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, room, kind))
}

pub async fn scoreboard_handler(
    Query(query): Query<RoomQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let Some(room) = normalize_room_name(query.room.as_deref()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    Json(state.rooms.scoreboard(&room).await).into_response()
}

/// Waits for the first data frame and checks it as a raw token.
pub async fn authenticate<S>(
    receiver: &mut S,
    verifier: &dyn TokenVerifier,
    timeout: Duration,
) -> Result<Participant, AuthError>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let first = tokio::time::timeout(timeout, first_data_frame(receiver))
        .await
        .map_err(|_| AuthError::Timeout)?;
    match first {
        Some(Message::Text(token)) => verifier.verify(&token),
        Some(_) => Err(AuthError::NotText),
        None => Err(AuthError::Closed),
    }
}

async fn first_data_frame<S>(receiver: &mut S) -> Option<Message>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return None,
            other => return Some(other),
        }
    }
    None
}

/// Turns one inbound text frame into a room command, or `None` if it is
/// malformed.
pub fn inbound_command(kind: ChannelKind, connection: Uuid, text: &str) -> Option<RoomCommand> {
    match kind {
        ChannelKind::Draw => match decode_stroke(text) {
            Ok(stroke) => Some(RoomCommand::Stroke { connection, stroke }),
            Err(error) => {
                warn!("dropping draw frame conn={connection}: {error}");
                None
            }
        },
        ChannelKind::Chat => match ChatEvent::decode(text) {
            Ok(event) => Some(RoomCommand::Chat { connection, event }),
            Err(error) => {
                warn!("dropping chat frame conn={connection}: {error}");
                None
            }
        },
    }
}

/// Close frame sent when the first frame is not a valid token.
pub fn rejection() -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::UNSUPPORTED,
        reason: Cow::from(INVALID_TOKEN_REASON),
    }))
}

async fn handle_socket(socket: WebSocket, state: AppState, room_name: String, kind: ChannelKind) {
    let (socket_sender, socket_receiver) = socket.split();
    serve_connection(socket_sender, socket_receiver, state, room_name, kind).await;
}

/// Runs one channel from handshake to disconnect. Only an authenticated
/// connection is registered with its room.
pub async fn serve_connection<Si, St>(
    mut socket_sender: Si,
    mut socket_receiver: St,
    state: AppState,
    room_name: String,
    kind: ChannelKind,
) where
    Si: Sink<Message> + Unpin + Send + 'static,
    St: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let participant = match authenticate(
        &mut socket_receiver,
        state.tokens.as_ref(),
        state.handshake_timeout,
    )
    .await
    {
        Ok(participant) => participant,
        Err(error) => {
            warn!("WS {kind} handshake failed room={room_name}: {error}");
            let _ = socket_sender.send(rejection()).await;
            return;
        }
    };

    let connection_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    info!(
        "WS {kind} authenticated room={room_name} conn={connection_id} user={}",
        participant.username
    );
    let room = state
        .rooms
        .join(
            &room_name,
            RoomCommand::Join {
                connection: connection_id,
                channel: kind,
                participant,
                peer: tx,
            },
        )
        .await;

    let send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if socket_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut close_frame = None;

    while let Some(Ok(message)) = socket_receiver.next().await {
        match message {
            Message::Text(text) => {
                if let Some(command) = inbound_command(kind, connection_id, &text) {
                    room.send(command);
                }
            }
            Message::Binary(data) => {
                debug!(
                    "ignoring {} byte binary frame conn={connection_id}",
                    data.len()
                );
            }
            Message::Close(frame) => {
                close_frame = frame;
                break;
            }
            _ => {}
        }
    }

    room.send(RoomCommand::Leave {
        connection: connection_id,
        channel: kind,
    });
    info!("WS {kind} disconnected room={room_name} conn={connection_id}");
    if let Some(frame) = &close_frame {
        info!(
            "WS close frame room={room_name} conn={connection_id} code={} reason={:?}",
            frame.code, frame.reason
        );
    }
    send_task.abort();
    if state.rooms.remove_if_idle(&room_name).await {
        debug!("{} rooms open", state.rooms.len().await);
    }
}
