use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use collab_client::{
    Connector, Link, LinkEvent, LinkState, RealtimeSync, ReconnectPolicy, TransportError,
};
use collab_types::{PresenceStatus, WireMessage};
use tokio::sync::mpsc;
use uuid::Uuid;

/// What the test sees of one established link: everything the client
/// wrote, and a sender to push frames or a close at it.
struct ServerSide {
    from_client: mpsc::UnboundedReceiver<String>,
    to_client: mpsc::UnboundedSender<LinkEvent>,
}

enum Outcome {
    Succeed,
    Fail,
}

/// Scripted connector: consumes one outcome per dial, fails once the
/// script runs out.
struct MockConnector {
    outcomes: Mutex<VecDeque<Outcome>>,
    dials: AtomicU32,
    sides_tx: mpsc::UnboundedSender<ServerSide>,
}

impl MockConnector {
    fn new(outcomes: Vec<Outcome>) -> (std::sync::Arc<Self>, mpsc::UnboundedReceiver<ServerSide>) {
        let (sides_tx, sides_rx) = mpsc::unbounded_channel();
        let connector = std::sync::Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            dials: AtomicU32::new(0),
            sides_tx,
        });
        (connector, sides_rx)
    }

    fn dials(&self) -> u32 {
        self.dials.load(Ordering::SeqCst)
    }

    fn push_outcome(&self, outcome: Outcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &str) -> Result<Link, TransportError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Outcome::Succeed) => {
                let (out_tx, out_rx) = mpsc::unbounded_channel();
                let (in_tx, in_rx) = mpsc::unbounded_channel();
                let _ = self.sides_tx.send(ServerSide {
                    from_client: out_rx,
                    to_client: in_tx,
                });
                Ok(Link {
                    outbound: out_tx,
                    inbound: in_rx,
                })
            }
            Some(Outcome::Fail) | None => {
                Err(TransportError::ConnectFailed("refused".to_string()))
            }
        }
    }
}

fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy::new(5, Duration::from_millis(2000))
}

async fn wait_for_state(sync: &RealtimeSync, wanted: LinkState) {
    let mut watch = sync.state_watch();
    watch
        .wait_for(|state| *state == wanted)
        .await
        .expect("supervisor gone");
}

#[tokio::test(start_paused = true)]
async fn test_auth_handshake_sent_on_open() {
    let (connector, mut sides) = MockConnector::new(vec![Outcome::Succeed]);
    let sync = RealtimeSync::spawn(connector, fast_policy());

    sync.connect("ws://test", "user-42");
    wait_for_state(&sync, LinkState::Connected).await;

    let mut server = sides.recv().await.unwrap();
    let frame = server.from_client.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["type"], "auth");
    assert_eq!(parsed["user_id"], "user-42");

    sync.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_send_while_closed_is_dropped() {
    let (connector, mut sides) = MockConnector::new(vec![Outcome::Succeed]);
    let sync = RealtimeSync::spawn(connector, fast_policy());

    // Queued before connect: must not be buffered for later delivery.
    sync.send(WireMessage::AchievementLiked {
        share_id: Uuid::new_v4(),
    });

    sync.connect("ws://test", "user-1");
    wait_for_state(&sync, LinkState::Connected).await;

    sync.send(WireMessage::FriendRequestAccepted {
        request_id: Uuid::new_v4(),
    });

    let mut server = sides.recv().await.unwrap();
    let first: serde_json::Value =
        serde_json::from_str(&server.from_client.recv().await.unwrap()).unwrap();
    let second: serde_json::Value =
        serde_json::from_str(&server.from_client.recv().await.unwrap()).unwrap();

    // The pre-connect frame is gone; only auth and the post-open frame
    // made it to the wire.
    assert_eq!(first["type"], "auth");
    assert_eq!(second["type"], "friend_request_accepted");

    sync.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_inbound_frames_are_decoded_and_broadcast() {
    let (connector, mut sides) = MockConnector::new(vec![Outcome::Succeed]);
    let sync = RealtimeSync::spawn(connector, fast_policy());
    let mut inbound = sync.subscribe();

    sync.connect("ws://test", "user-1");
    wait_for_state(&sync, LinkState::Connected).await;
    let server = sides.recv().await.unwrap();

    let user_id = Uuid::new_v4();
    server
        .to_client
        .send(LinkEvent::Frame(format!(
            r#"{{"type":"presence","user_id":"{user_id}","status":"away","activity":null}}"#
        )))
        .unwrap();

    let message = inbound.recv().await.unwrap();
    assert_eq!(
        message,
        WireMessage::Presence {
            user_id,
            status: PresenceStatus::Away,
            activity: None,
        }
    );

    sync.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frame_is_swallowed() {
    let (connector, mut sides) = MockConnector::new(vec![Outcome::Succeed]);
    let sync = RealtimeSync::spawn(connector, fast_policy());
    let mut inbound = sync.subscribe();

    sync.connect("ws://test", "user-1");
    wait_for_state(&sync, LinkState::Connected).await;
    let server = sides.recv().await.unwrap();

    server
        .to_client
        .send(LinkEvent::Frame("{not json at all".to_string()))
        .unwrap();
    server
        .to_client
        .send(LinkEvent::Frame(
            r#"{"type":"auth","user_id":"after-garbage"}"#.to_string(),
        ))
        .unwrap();

    // The bad frame is logged and dropped; the link stays up and the
    // next frame arrives normally.
    let message = inbound.recv().await.unwrap();
    assert_eq!(
        message,
        WireMessage::Auth {
            user_id: "after-garbage".to_string()
        }
    );
    assert_eq!(sync.state(), LinkState::Connected);

    sync.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_parks_after_five_failures_and_connect_resets() {
    // One good link, then every dial is refused.
    let (connector, mut sides) = MockConnector::new(vec![Outcome::Succeed]);
    let sync = RealtimeSync::spawn(connector.clone(), fast_policy());

    sync.connect("ws://test", "user-1");
    wait_for_state(&sync, LinkState::Connected).await;
    let server = sides.recv().await.unwrap();

    // Unexpected close: the supervisor retries with linear backoff until
    // the ceiling, then parks.
    server.to_client.send(LinkEvent::Closed).unwrap();
    wait_for_state(&sync, LinkState::Disconnected).await;

    // 1 successful dial + exactly 5 failed retries, no 6th.
    assert_eq!(connector.dials(), 6);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.dials(), 6);

    // An explicit connect resets the attempt counter and dials again.
    connector.push_outcome(Outcome::Succeed);
    sync.connect("ws://test", "user-1");
    wait_for_state(&sync, LinkState::Connected).await;
    assert_eq!(connector.dials(), 7);

    sync.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_deliberate_disconnect_suppresses_reconnect() {
    let (connector, mut sides) = MockConnector::new(vec![Outcome::Succeed]);
    let sync = RealtimeSync::spawn(connector.clone(), fast_policy());

    sync.connect("ws://test", "user-1");
    wait_for_state(&sync, LinkState::Connected).await;
    let _server = sides.recv().await.unwrap();

    sync.disconnect();
    wait_for_state(&sync, LinkState::Disconnected).await;

    // No reconnect is ever scheduled for a deliberate close.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.dials(), 1);

    sync.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_connect_failure_also_counts_toward_ceiling() {
    // Never connects at all: the initial dial plus retries hit the
    // ceiling and park.
    let (connector, _sides) = MockConnector::new(vec![]);
    let sync = RealtimeSync::spawn(connector.clone(), fast_policy());

    sync.connect("ws://test", "user-1");

    // Initial attempt + 5 backoff retries, then nothing more.
    while connector.dials() < 6 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(connector.dials(), 6);
    assert_eq!(sync.state(), LinkState::Disconnected);

    sync.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_outbound_handle_feeds_the_wire() {
    let (connector, mut sides) = MockConnector::new(vec![Outcome::Succeed]);
    let sync = RealtimeSync::spawn(connector, fast_policy());
    let handle = sync.outbound_handle();

    sync.connect("ws://test", "user-1");
    wait_for_state(&sync, LinkState::Connected).await;
    let mut server = sides.recv().await.unwrap();

    // auth first
    let _ = server.from_client.recv().await.unwrap();

    handle.send(WireMessage::AchievementLiked {
        share_id: Uuid::new_v4(),
    });
    let frame: serde_json::Value =
        serde_json::from_str(&server.from_client.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], "achievement_liked");

    sync.shutdown();
}
