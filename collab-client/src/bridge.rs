use std::sync::{Arc, Mutex};

use collab_core::CollaborationStore;
use collab_types::WireMessage;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

/// Forward decoded inbound frames into the store until the transport goes
/// away. The store mutex is held only for the synchronous mutation, never
/// across an await.
pub fn spawn_inbound_bridge(
    mut inbound: broadcast::Receiver<WireMessage>,
    store: Arc<Mutex<CollaborationStore>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match inbound.recv().await {
                Ok(message) => match store.lock() {
                    Ok(mut store) => store.apply_remote(message),
                    Err(_) => {
                        warn!("collaboration store poisoned, stopping inbound bridge");
                        break;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "inbound bridge lagged, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
