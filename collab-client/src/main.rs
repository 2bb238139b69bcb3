use std::sync::{Arc, Mutex};

use collab_core::{
    ActivityKind, CollaborationStore, PresenceTracker, SnapshotStore,
};
use tokio::signal;
use tracing::{info, warn};

use collab_client::{Config, RealtimeSync, WsConnector, spawn_inbound_bridge};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting collaboration sync client...");

    let config = Config::new();
    let snapshots = SnapshotStore::new(&config.snapshot_path);

    // A corrupt snapshot is reported, then we start fresh rather than die.
    let store = match snapshots.load() {
        Ok(Some(snapshot)) => CollaborationStore::from_snapshot(snapshot),
        Ok(None) => CollaborationStore::new(),
        Err(e) => {
            warn!("ignoring unreadable snapshot: {e:#}");
            CollaborationStore::new()
        }
    };
    let store = Arc::new(Mutex::new(store));

    let sync = RealtimeSync::spawn(WsConnector, config.reconnect_policy());
    store.lock().unwrap().attach_outbound(sync.outbound_handle());
    let bridge = spawn_inbound_bridge(sync.subscribe(), store.clone());

    let user = store
        .lock()
        .unwrap()
        .join_room("lobby", "demo-user", None);
    info!("joined lobby as {} ({})", user.name, user.id);

    sync.connect(&config.server_url, user.id.to_string());

    // Presence transitions flow into the store, which echoes them over
    // the transport best-effort.
    let presence_store = store.clone();
    let tracker = PresenceTracker::spawn(config.idle_timeout(), move |status, activity| {
        if let Ok(mut store) = presence_store.lock() {
            store.update_presence(status, activity.map(str::to_string));
        }
    });

    // Stand-in for real input wiring: one activity report at startup.
    tracker.report(ActivityKind::PointerDown);

    signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
    info!("Received Ctrl+C, shutting down gracefully...");

    tracker.shutdown();
    sync.disconnect();
    sync.shutdown();
    bridge.abort();

    let snapshot = store.lock().unwrap().snapshot();
    if let Err(e) = snapshots.save(&snapshot) {
        warn!("failed to save snapshot: {e:#}");
    }
    info!("Shutdown complete.");
}
