use std::env;
use std::time::Duration;

use crate::backoff::ReconnectPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_backoff_ms: u64,
    pub presence_idle_timeout_secs: u64,
    pub snapshot_path: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_url: env::var("COLLAB_SERVER_URL")
                .unwrap_or_else(|_| "ws://127.0.0.1:8080/ws".to_string()),
            max_reconnect_attempts: env::var("RECONNECT_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("Invalid RECONNECT_MAX_ATTEMPTS"),
            reconnect_backoff_ms: env::var("RECONNECT_BACKOFF_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .expect("Invalid RECONNECT_BACKOFF_MS"),
            presence_idle_timeout_secs: env::var("PRESENCE_IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid PRESENCE_IDLE_TIMEOUT_SECS"),
            snapshot_path: env::var("COLLAB_SNAPSHOT_PATH")
                .unwrap_or_else(|_| "./collab-snapshot.json".to_string()),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            self.max_reconnect_attempts,
            Duration::from_millis(self.reconnect_backoff_ms),
        )
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.presence_idle_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
