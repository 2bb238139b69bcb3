use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ParticipantId;

/// A user's activity classification, independent of any room or session.
///
/// `Active` is the connected-and-interacting state; the idle tracker flips
/// between `Active` and `Away`. `Offline` is only ever assigned to friend
/// records mirroring a disconnected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PresenceStatus {
    Active,
    Away,
    Busy,
    Offline,
}

/// A user as seen inside a room or team session.
///
/// The id is minted when the user joins a room and is stable for the
/// lifetime of the browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub avatar: String,
    pub joined_at: String, // ISO 8601 string
    pub status: PresenceStatus,
    pub activity: Option<String>,
    pub last_active: Option<String>, // ISO 8601 string
}

/// A durable friend record. Survives reloads via the snapshot store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Friend {
    pub id: ParticipantId,
    pub name: String,
    pub avatar: String,
    pub added_at: String, // ISO 8601 string
    pub status: PresenceStatus,
}
