//! Per-connection WebSocket handling: parse inbound frames into
//! [ClientRequest]s, push [ServerEvent]s out, and tell the exchange when the
//! connection ends.

use axum::extract::ws::{Message as WsMessage, WebSocket};
use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use partyline::wire::{ClientRequest, ServerEvent};

use crate::exchange::{ClientHandle, Command};

#[tracing::instrument(skip(socket, commands))]
pub async fn client_handler(mut socket: WebSocket, id: String, commands: mpsc::Sender<Command>) {
    let (event_tx, mut events) = mpsc::channel::<ServerEvent>(32);
    let shutdown = CancellationToken::new();
    let handle = ClientHandle::new(event_tx, shutdown.clone());
    if commands
        .send(Command::Connect {
            id: id.clone(),
            handle,
        })
        .await
        .is_err()
    {
        tracing::error!(%id, "exchange is gone, dropping the connection");
        return;
    }

    loop {
        select! {
            _ = shutdown.cancelled() => {
                // superseded by a reconnect with the same identity; the
                // registry entry belongs to the new connection now, so no
                // disconnect is reported for it
                tracing::info!(%id, "connection superseded");
                let _ = socket.send(WsMessage::Close(None)).await;
                return;
            },
            event = events.recv() => {
                let Some(event) = event else { return };
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(error) = socket.send(WsMessage::Text(text)).await {
                            tracing::warn!(%id, ?error, "failed to push an event");
                            break;
                        }
                    }
                    Err(error) => tracing::error!(%id, ?error, "unserializable event"),
                }
            },
            msg = socket.recv() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(error)) => {
                        tracing::warn!(%id, ?error, "socket was closed with an error");
                        break;
                    },
                    None => {
                        tracing::info!(%id, "socket was closed without close message");
                        break;
                    },
                };
                match msg {
                    WsMessage::Close(_) => {
                        tracing::info!(%id, "socket was closed");
                        break;
                    },
                    WsMessage::Ping(payload) => {
                        if socket.send(WsMessage::Pong(payload)).await.is_err() {
                            break;
                        }
                    },
                    WsMessage::Pong(_) => {},
                    WsMessage::Binary(_) => {
                        tracing::warn!(%id, "received binary data instead of textual data");
                    },
                    WsMessage::Text(text) => match serde_json::from_str::<ClientRequest>(&text) {
                        Ok(request) => {
                            tracing::trace!(%id, ?request, "received request");
                            if commands.send(Command::Request { id: id.clone(), request }).await.is_err() {
                                break;
                            }
                        }
                        // reject just this frame; the connection and every
                        // other session are unaffected
                        Err(error) => tracing::warn!(%id, %text, ?error, "unrecognized request, ignoring"),
                    },
                }
            },
        }
    }

    let _ = commands.send(Command::Disconnect { id }).await;
}
