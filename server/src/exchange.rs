//! The exchange: one task that owns every piece of mutable state — decoder,
//! handset, registry, conversation — and processes commands strictly one at
//! a time. No locks anywhere; concurrency enters only through the command
//! channel and leaves only through per-session event channels.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use partyline::broadcast;
use partyline::config::{PhoneConfig, RingConfig};
use partyline::conversation::{ConversationLog, Message};
use partyline::dial::PulseDecoder;
use partyline::events::{InputLine, LineEvent, PinWrite};
use partyline::handset::HandsetTracker;
use partyline::ring::{RingSession, RingStep};
use partyline::session::{SessionLink, SessionRegistry};
use partyline::wire::{ClientRequest, ServerEvent};

/// Everything that can happen, serialized onto the exchange task.
#[derive(Debug)]
pub enum Command {
    /// An edge on one of the physical switches.
    Line(LineEvent),
    Connect { id: String, handle: ClientHandle },
    Disconnect { id: String },
    Request { id: String, request: ClientRequest },
}

/// The exchange's end of one client connection.
#[derive(Clone, Debug)]
pub struct ClientHandle {
    events: mpsc::Sender<ServerEvent>,
    shutdown: CancellationToken,
}

impl ClientHandle {
    pub fn new(events: mpsc::Sender<ServerEvent>, shutdown: CancellationToken) -> Self {
        Self { events, shutdown }
    }
}

impl SessionLink for ClientHandle {
    fn deliver(&self, event: ServerEvent) {
        // never block the exchange on a slow client
        if let Err(error) = self.events.try_send(event) {
            tracing::warn!(?error, "dropping event for a slow or closed client");
        }
    }

    fn close(&self) {
        self.shutdown.cancel();
    }
}

pub struct Exchange {
    decoder: PulseDecoder,
    handset: HandsetTracker,
    registry: SessionRegistry<ClientHandle>,
    conversation: ConversationLog,
    /// Live handset state for the ring driver's per-tick cancellation check.
    handset_tx: watch::Sender<bool>,
    ring_config: RingConfig,
    ring_task: Option<JoinHandle<()>>,
    /// `None` when the board failed to open; the exchange then runs
    /// session/chat-only and ring requests are ignored.
    pin_writes: Option<mpsc::Sender<PinWrite>>,
    commands: mpsc::Receiver<Command>,
}

impl Exchange {
    pub fn new(
        config: PhoneConfig,
        pin_writes: Option<mpsc::Sender<PinWrite>>,
    ) -> (Self, mpsc::Sender<Command>) {
        let (command_tx, commands) = mpsc::channel(64);
        let exchange = Self {
            decoder: PulseDecoder::new(config.dial),
            handset: HandsetTracker::new(config.handset),
            registry: SessionRegistry::new(),
            conversation: ConversationLog::new(),
            handset_tx: watch::Sender::new(false),
            ring_config: config.ring,
            ring_task: None,
            pin_writes,
            commands,
        };
        (exchange, command_tx)
    }

    pub async fn run(mut self, cancellation_token: CancellationToken) {
        loop {
            tokio::select! {
                Some(command) = self.commands.recv() => self.handle(command, &cancellation_token),
                _ = cancellation_token.cancelled() => {
                    if let Some(task) = self.ring_task.take() {
                        let _ = task.await;
                    }
                    return;
                },
                else => return,
            }
        }
    }

    fn handle(&mut self, command: Command, cancellation_token: &CancellationToken) {
        match command {
            Command::Line(event) => self.on_line(event),
            Command::Connect { id, handle } => {
                self.registry.connect(id, handle);
                // the snapshot reaches the new session before anything else,
                // and reminds everyone else of the shared state
                broadcast::snapshot(&self.registry, &self.conversation);
            }
            Command::Disconnect { id } => self.registry.disconnect(&id),
            Command::Request { id, request } => self.on_request(id, request, cancellation_token),
        }
    }

    fn on_line(&mut self, event: LineEvent) {
        match event.line {
            InputLine::DialRead => self.decoder.on_dial_read_edge(event.edge),
            InputLine::Dialing => {
                if let Some(digit) = self.decoder.on_dialing_edge(event.edge) {
                    tracing::info!(digit, "dialed");
                    broadcast::dialed_digit(&self.registry, digit);
                }
            }
            InputLine::Receiver => {
                let is_up = self.handset.on_receiver_edge(event.edge);
                tracing::info!(is_up, "receiver moved");
                self.handset_tx.send_replace(is_up);
                broadcast::handset_changed(&self.registry, is_up);
            }
        }
    }

    fn on_request(&mut self, id: String, request: ClientRequest, cancel: &CancellationToken) {
        match request {
            ClientRequest::Ring => self.start_ring(cancel),
            ClientRequest::SendMessage { content } => {
                tracing::info!(%id, "message");
                let message = Message { content };
                self.conversation.append(message.clone());
                broadcast::message(&self.registry, &id, &message);
            }
            ClientRequest::ResetConversation => {
                tracing::info!(%id, "conversation reset");
                self.conversation.reset();
                broadcast::snapshot(&self.registry, &self.conversation);
            }
            ClientRequest::SetRole { role } => self.registry.set_role(&id, role),
            ClientRequest::StopPairing => {
                tracing::info!(%id, "pairing stopped");
                self.registry.clear_role(&id);
            }
        }
    }

    fn start_ring(&mut self, cancel: &CancellationToken) {
        if self.ring_task.as_ref().is_some_and(|task| !task.is_finished()) {
            tracing::debug!("ring requested while already ringing, ignoring");
            return;
        }
        let Some(writes) = self.pin_writes.clone() else {
            tracing::debug!("ring requested without phone hardware, ignoring");
            return;
        };
        let handset_up = *self.handset_tx.borrow();
        let Some(session) = RingSession::start(self.ring_config.clone(), handset_up, Instant::now())
        else {
            tracing::debug!("ring requested while the handset is up, ignoring");
            return;
        };
        tracing::info!("ring");
        self.ring_task = Some(tokio::spawn(drive_ring(
            session,
            self.ring_config.tick_interval,
            self.handset_tx.subscribe(),
            writes,
            cancel.child_token(),
        )));
    }
}

/// The only construct that spans scheduler turns: a bounded periodic task
/// that re-checks the handset and its cancellation token on every tick.
async fn drive_ring(
    mut session: RingSession,
    tick: Duration,
    handset: watch::Receiver<bool>,
    writes: mpsc::Sender<PinWrite>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                for write in session.teardown_writes() {
                    let _ = writes.send(write).await;
                }
                return;
            },
            _ = ticker.tick() => {
                let handset_state = *handset.borrow();
                match session.tick(Instant::now(), handset_state) {
                    RingStep::Silent => {}
                    RingStep::Drive { writes: pin_writes, finished } => {
                        for write in pin_writes {
                            if writes.send(write).await.is_err() {
                                return;
                            }
                        }
                        if finished {
                            tracing::debug!("ring finished");
                            return;
                        }
                    }
                    RingStep::Cancelled { writes: pin_writes } => {
                        for write in pin_writes {
                            let _ = writes.send(write).await;
                        }
                        tracing::debug!("ring cancelled by handset pickup");
                        return;
                    }
                }
            },
        }
    }
}
