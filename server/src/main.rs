use std::net::SocketAddr;

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

use partyline_board::PhoneBoard;

use crate::exchange::{Command, Exchange};

mod communication;
mod config;
mod exchange;
mod net;

#[derive(Clone)]
struct AppState {
    commands: mpsc::Sender<Command>,
    status: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = config::Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let phone_config = args.hardware_rev.phone_config();
    if let Err(error) = phone_config.validate() {
        tracing::error!(%error, "invalid hardware configuration");
        return;
    }
    if let (Some(cert), Some(key)) = (&args.cert, &args.key) {
        tracing::info!(
            cert = %cert.display(),
            key = %key.display(),
            "TLS material configured; termination happens in the transport layer",
        );
    }

    let cancellation_token = CancellationToken::new();

    let (write_tx, write_rx) = mpsc::channel(64);
    let (line_tx, mut line_rx) = mpsc::channel(64);
    let board = PhoneBoard::open(&args.hardware_rev.board_config(), line_tx);

    let (exchange, commands) = Exchange::new(phone_config, board.is_ok().then_some(write_tx));

    match board {
        Ok(board) => {
            tracing::info!("phone hardware ready");
            tokio::spawn(board.run(write_rx, cancellation_token.child_token()));
            let line_commands = commands.clone();
            tokio::spawn(async move {
                while let Some(event) = line_rx.recv().await {
                    if line_commands.send(Command::Line(event)).await.is_err() {
                        break;
                    }
                }
            });
        }
        Err(error) => {
            tracing::warn!(%error, "phone hardware unavailable, continuing in chat-only mode");
        }
    }

    let app = Router::new()
        .route("/", get(index))
        .route("/websocket", get(websocket))
        .with_state(AppState {
            commands: commands.clone(),
            status: format!("Listening at http://localhost:{}", args.port),
        });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .unwrap();

    println!("Listening at http://localhost:{}", args.port);
    if !args.production {
        if let Some(ip) = net::local_ip() {
            println!("On the network at http://{}:{}", ip, args.port);
        }
    }

    tokio::join!(
        async {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(cancellation_token.clone().cancelled_owned())
            .await
            .expect("stopped serving");
        },
        async {
            exchange.run(cancellation_token.clone()).await;
        },
        async {
            if let Err(sigint_error) = tokio::signal::ctrl_c().await {
                tracing::error!(?sigint_error, "could not listen for the shutdown signal");
            }
            tracing::info!("stopping");
            cancellation_token.cancel();
        },
    );
}

async fn index(State(state): State<AppState>) -> String {
    state.status
}

#[derive(Debug, Deserialize)]
struct ConnectQuery {
    id: String,
}

#[tracing::instrument(skip(ws, state))]
async fn websocket(
    ConnectInfo(peer_address): ConnectInfo<SocketAddr>,
    Query(query): Query<ConnectQuery>,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    tracing::info!(%peer_address, id = %query.id, "new websocket connection");
    ws.on_upgrade(move |socket| communication::client_handler(socket, query.id, state.commands))
}
