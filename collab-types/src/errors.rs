use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Recoverable domain faults, always returned as values, never panicked.
///
/// Transport faults do not appear here; they are absorbed by the reconnect
/// machinery and never surface to domain callers.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CollabError {
    #[error("Session is full")]
    SessionFull,
    #[error("Session not found")]
    SessionNotFound,
    #[error("No current user; join a room first")]
    NoCurrentUser,
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Shared achievement not found")]
    ShareNotFound,
}
