use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::session::{Difficulty, ScoreBoard};
use crate::social::{AchievementComment, FriendRequest, SessionInvitation, SharedAchievement};
use crate::user::PresenceStatus;
use crate::{ParticipantId, RequestId, RoomId, SessionId, ShareId};

/// One JSON text frame, both directions: `{ "type": "...", ...payload }`.
///
/// The same shape doubles as the domain event recorded in the local event
/// log, so everything the client does on the wire is also observable
/// locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum WireMessage {
    Auth {
        user_id: String,
    },
    Presence {
        user_id: ParticipantId,
        status: PresenceStatus,
        activity: Option<String>,
    },
    UserJoined {
        user_id: ParticipantId,
        user_name: String,
        room_id: RoomId,
    },
    UserLeft {
        user_id: ParticipantId,
        user_name: String,
        room_id: RoomId,
    },
    TeamSessionJoined {
        session_id: SessionId,
        user_id: ParticipantId,
        user_name: String,
    },
    TeamSessionLeft {
        session_id: SessionId,
        user_id: ParticipantId,
    },
    ScoreUpdated {
        session_id: SessionId,
        user_id: ParticipantId,
        score: i32,
    },
    TeamSessionStarted {
        session_id: SessionId,
        topic: String,
        difficulty: Difficulty,
    },
    TeamSessionCompleted {
        session_id: SessionId,
        winner_id: Option<ParticipantId>,
        scores: ScoreBoard,
    },
    FriendRequestSent {
        request: FriendRequest,
    },
    FriendRequestAccepted {
        request_id: RequestId,
    },
    FriendRequestRejected {
        request_id: RequestId,
    },
    AchievementShared {
        share: SharedAchievement,
    },
    AchievementLiked {
        share_id: ShareId,
    },
    AchievementCommented {
        share_id: ShareId,
        comment: AchievementComment,
    },
    SessionInvitationSent {
        invitation: SessionInvitation,
    },
}

impl WireMessage {
    /// The wire-level tag, matching the serialized `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Auth { .. } => "auth",
            WireMessage::Presence { .. } => "presence",
            WireMessage::UserJoined { .. } => "user_joined",
            WireMessage::UserLeft { .. } => "user_left",
            WireMessage::TeamSessionJoined { .. } => "team_session_joined",
            WireMessage::TeamSessionLeft { .. } => "team_session_left",
            WireMessage::ScoreUpdated { .. } => "score_updated",
            WireMessage::TeamSessionStarted { .. } => "team_session_started",
            WireMessage::TeamSessionCompleted { .. } => "team_session_completed",
            WireMessage::FriendRequestSent { .. } => "friend_request_sent",
            WireMessage::FriendRequestAccepted { .. } => "friend_request_accepted",
            WireMessage::FriendRequestRejected { .. } => "friend_request_rejected",
            WireMessage::AchievementShared { .. } => "achievement_shared",
            WireMessage::AchievementLiked { .. } => "achievement_liked",
            WireMessage::AchievementCommented { .. } => "achievement_commented",
            WireMessage::SessionInvitationSent { .. } => "session_invitation_sent",
        }
    }
}
