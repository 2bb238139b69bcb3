use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{ParticipantId, RequestId, SessionId, ShareId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// An open friend request. Terminal requests (accepted or rejected) are
/// removed from the pending collection, not retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FriendRequest {
    pub id: RequestId,
    pub from_id: ParticipantId,
    pub from_name: String,
    pub to_id: ParticipantId,
    pub to_name: String,
    pub status: RequestStatus,
    pub sent_at: String, // ISO 8601 string
}

/// An invitation for a friend to join a team session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionInvitation {
    pub id: RequestId,
    pub from_id: ParticipantId,
    pub from_name: String,
    pub to_id: ParticipantId,
    pub session_id: SessionId,
    pub status: RequestStatus,
    pub sent_at: String, // ISO 8601 string
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AchievementComment {
    pub id: ShareId,
    pub user_id: ParticipantId,
    pub user_name: String,
    pub text: String,
    pub timestamp: String, // ISO 8601 string
}

/// An achievement posted to the public feed. Likes and comments only ever
/// grow; there is no retraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SharedAchievement {
    pub id: ShareId,
    pub user_id: ParticipantId,
    pub user_name: String,
    pub achievement_id: String,
    pub achievement_name: String,
    pub achievement_icon: String,
    pub shared_at: String, // ISO 8601 string
    pub likes: u32,
    pub comments: Vec<AchievementComment>,
}
