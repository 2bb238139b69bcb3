use std::sync::Arc;

use collab_core::OutboundHandle;
use collab_types::WireMessage;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backoff::{LinkState, ReconnectPolicy};
use crate::connector::{Connector, Link, LinkEvent};

const INBOUND_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
enum Command {
    Connect { url: String, user_id: String },
    Disconnect,
    Send(WireMessage),
}

/// One logical, self-healing connection to the collaboration server.
///
/// The public surface is fire-and-forget: `connect`, `disconnect`, and
/// `send` push commands to a background supervisor task that owns the
/// socket and the reconnect state machine. Inbound frames come back on a
/// typed broadcast channel; dropping a receiver unsubscribes it.
///
/// Delivery is at-most-once: frames sent while the link is anything but
/// open are dropped, never buffered.
pub struct RealtimeSync {
    cmd_tx: mpsc::UnboundedSender<Command>,
    out_tx: mpsc::UnboundedSender<WireMessage>,
    inbound_tx: broadcast::Sender<WireMessage>,
    state_rx: watch::Receiver<LinkState>,
    supervisor: JoinHandle<()>,
    forwarder: JoinHandle<()>,
}

impl RealtimeSync {
    pub fn spawn<C: Connector>(connector: C, policy: ReconnectPolicy) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (inbound_tx, _) = broadcast::channel(INBOUND_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);

        let supervisor = tokio::spawn(run_supervisor(
            Arc::new(connector),
            policy,
            cmd_rx,
            state_tx,
            inbound_tx.clone(),
        ));

        // Adapter so the store can hold a plain outbound handle without
        // knowing about transport commands.
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WireMessage>();
        let forward_cmd_tx = cmd_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                if forward_cmd_tx.send(Command::Send(message)).is_err() {
                    break;
                }
            }
        });

        Self {
            cmd_tx,
            out_tx,
            inbound_tx,
            state_rx,
            supervisor,
            forwarder,
        }
    }

    /// Open the channel. Idempotent while already connected; when parked
    /// after exhausting retries this resets the attempt counter and starts
    /// over. The `auth` handshake frame is sent as soon as the link opens.
    pub fn connect(&self, url: impl Into<String>, user_id: impl Into<String>) {
        let _ = self.cmd_tx.send(Command::Connect {
            url: url.into(),
            user_id: user_id.into(),
        });
    }

    /// Deliberate close: suppresses reconnection and resets the attempt
    /// counter.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }

    /// Queue a frame for the wire. Dropped silently if the link is not
    /// open by the time the supervisor sees it.
    pub fn send(&self, message: WireMessage) {
        let _ = self.cmd_tx.send(Command::Send(message));
    }

    /// Best-effort outbound handle for the collaboration store.
    pub fn outbound_handle(&self) -> OutboundHandle {
        OutboundHandle::new(self.out_tx.clone())
    }

    /// Subscribe to decoded inbound frames. Dropping the receiver is the
    /// unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<WireMessage> {
        self.inbound_tx.subscribe()
    }

    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    /// Watch link state transitions (used by UIs and tests).
    pub fn state_watch(&self) -> watch::Receiver<LinkState> {
        self.state_rx.clone()
    }

    pub fn shutdown(self) {
        self.supervisor.abort();
        self.forwarder.abort();
    }
}

async fn run_supervisor<C: Connector>(
    connector: Arc<C>,
    policy: ReconnectPolicy,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<LinkState>,
    inbound_tx: broadcast::Sender<WireMessage>,
) {
    'parked: loop {
        let _ = state_tx.send(LinkState::Disconnected);

        // Parked: only an explicit connect gets us moving again.
        let (mut url, mut user_id) = loop {
            match cmd_rx.recv().await {
                Some(Command::Connect { url, user_id }) => break (url, user_id),
                Some(Command::Send(_)) => debug!("link closed, dropping frame"),
                Some(Command::Disconnect) => {}
                None => return,
            }
        };

        // Consecutive failed attempts; reset by a successful open or an
        // explicit connect/disconnect.
        let mut attempt: u32 = 0;

        'session: loop {
            let _ = state_tx.send(LinkState::Connecting);

            match connector.connect(&url).await {
                Ok(link) => {
                    attempt = 0;
                    info!("connected to {url}");
                    let _ = state_tx.send(LinkState::Connected);

                    match pump_link(link, &user_id, &mut cmd_rx, &inbound_tx).await {
                        PumpExit::UnexpectedClose => {}
                        PumpExit::Disconnected => continue 'parked,
                        PumpExit::Reconnect { url: u, user_id: uid } => {
                            url = u;
                            user_id = uid;
                            continue 'session;
                        }
                        PumpExit::Shutdown => return,
                    }
                }
                Err(e) => warn!("connect failed: {e}"),
            }

            attempt += 1;
            let Some(delay) = policy.delay_for(attempt) else {
                warn!(
                    max_attempts = policy.max_attempts,
                    "reconnect limit reached, parking"
                );
                continue 'parked;
            };

            info!(
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "reconnecting"
            );
            let _ = state_tx.send(LinkState::Reconnecting);

            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    cmd = cmd_rx.recv() => match cmd {
                        Some(Command::Send(_)) => debug!("link down, dropping frame"),
                        Some(Command::Disconnect) => continue 'parked,
                        Some(Command::Connect { url: u, user_id: uid }) => {
                            // Explicit connect restarts the cycle fresh.
                            url = u;
                            user_id = uid;
                            attempt = 0;
                            break;
                        }
                        None => return,
                    }
                }
            }
        }
    }
}

enum PumpExit {
    UnexpectedClose,
    Disconnected,
    Reconnect { url: String, user_id: String },
    Shutdown,
}

/// Drive one open link: auth handshake first, then shuttle frames until
/// something ends the session.
async fn pump_link(
    mut link: Link,
    user_id: &str,
    cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
    inbound_tx: &broadcast::Sender<WireMessage>,
) -> PumpExit {
    let auth = WireMessage::Auth {
        user_id: user_id.to_string(),
    };
    if write_frame(&link, &auth).is_err() {
        warn!("link closed during auth handshake");
        return PumpExit::UnexpectedClose;
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Send(message)) => {
                    if write_frame(&link, &message).is_err() {
                        warn!("link closed mid-send");
                        return PumpExit::UnexpectedClose;
                    }
                }
                Some(Command::Disconnect) => {
                    info!("disconnecting");
                    return PumpExit::Disconnected;
                }
                Some(Command::Connect { url, user_id }) => {
                    // Already connected: a repeat connect to force a new
                    // endpoint tears this link down and dials fresh.
                    return PumpExit::Reconnect { url, user_id };
                }
                None => return PumpExit::Shutdown,
            },
            event = link.inbound.recv() => match event {
                Some(LinkEvent::Frame(text)) => {
                    match serde_json::from_str::<WireMessage>(&text) {
                        Ok(message) => {
                            // No receivers is fine; frames just fall on
                            // the floor until someone subscribes.
                            let _ = inbound_tx.send(message);
                        }
                        Err(e) => warn!("malformed frame swallowed: {e}"),
                    }
                }
                Some(LinkEvent::Closed) | None => {
                    warn!("connection closed unexpectedly");
                    return PumpExit::UnexpectedClose;
                }
            }
        }
    }
}

fn write_frame(link: &Link, message: &WireMessage) -> Result<(), ()> {
    let frame = match serde_json::to_string(message) {
        Ok(frame) => frame,
        Err(e) => {
            // Should be unreachable for our own types; drop rather than
            // kill the link.
            warn!("failed to encode frame: {e}");
            return Ok(());
        }
    };
    link.outbound.send(frame).map_err(|_| ())
}
