use collab_types::{
    AchievementComment, CollabError, Difficulty, Friend, FriendRequest, Participant,
    ParticipantId, PresenceStatus, RequestId, RequestStatus, RoomId, SessionId,
    SessionInvitation, SessionStatus, ShareId, SharedAchievement, TeamSession, WireMessage,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event_log::{CollabEvent, EventLog, SubscriptionId};
use crate::snapshot::CollabSnapshot;

const DEFAULT_AVATAR: &str = "👤";
const DEFAULT_SESSION_CAPACITY: usize = 10;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Best-effort handle into the transport's outbound queue.
///
/// Sending never fails from the store's perspective; frames queued while
/// the transport is gone are dropped.
#[derive(Debug, Clone)]
pub struct OutboundHandle {
    tx: mpsc::UnboundedSender<WireMessage>,
}

impl OutboundHandle {
    pub fn new(tx: mpsc::UnboundedSender<WireMessage>) -> Self {
        Self { tx }
    }

    pub fn send(&self, message: WireMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("transport gone, dropping outbound frame");
        }
    }
}

/// Single source of truth for this client's collaboration state.
///
/// Constructed once per application instance and passed by reference; all
/// room, session, friend, and social operations flow through it. Methods
/// are synchronous and mutate atomically with respect to each other.
pub struct CollaborationStore {
    current_user: Option<Participant>,
    active_room: Option<RoomId>,
    participants: Vec<Participant>,
    team_sessions: Vec<TeamSession>,
    active_team_session: Option<SessionId>,
    friends: Vec<Friend>,
    friend_requests: Vec<FriendRequest>,
    shared_achievements: Vec<SharedAchievement>,
    event_log: EventLog,
    outbound: Option<OutboundHandle>,
}

impl CollaborationStore {
    pub fn new() -> Self {
        Self::from_snapshot(CollabSnapshot::default())
    }

    /// Rebuild from the durable snapshot. Everything not in the snapshot
    /// (room, roster, pending requests, event log) starts empty.
    pub fn from_snapshot(snapshot: CollabSnapshot) -> Self {
        Self {
            current_user: None,
            active_room: None,
            participants: Vec::new(),
            team_sessions: snapshot.team_sessions,
            active_team_session: None,
            friends: snapshot.friends,
            friend_requests: Vec::new(),
            shared_achievements: Vec::new(),
            event_log: EventLog::new(),
            outbound: None,
        }
    }

    /// Wire up the network echo. Until this is called every emit is
    /// local-only, which is also the offline behavior.
    pub fn attach_outbound(&mut self, handle: OutboundHandle) {
        self.outbound = Some(handle);
    }

    /// Append to the event log and best-effort echo over the transport.
    fn record(&mut self, message: WireMessage) -> CollabEvent {
        let event = self.event_log.append(message.clone());
        if let Some(outbound) = &self.outbound {
            outbound.send(message);
        }
        event
    }

    // ── Rooms ───────────────────────────────────────────────────────

    pub fn set_current_user(&mut self, user: Participant) {
        self.current_user = Some(user);
    }

    /// Join a room, minting a fresh participant identity for this session.
    ///
    /// Joining while already in a room replaces the room without emitting
    /// `user_left` for the previous one. Callers that want a clean exit
    /// must call `leave_room` first.
    pub fn join_room(
        &mut self,
        room_id: impl Into<RoomId>,
        user_name: impl Into<String>,
        avatar: Option<String>,
    ) -> Participant {
        let room_id = room_id.into();
        let user = Participant {
            id: Uuid::new_v4(),
            name: user_name.into(),
            avatar: avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            joined_at: now(),
            status: PresenceStatus::Active,
            activity: None,
            last_active: None,
        };

        self.active_room = Some(room_id.clone());
        self.current_user = Some(user.clone());

        self.record(WireMessage::UserJoined {
            user_id: user.id,
            user_name: user.name.clone(),
            room_id,
        });

        user
    }

    pub fn leave_room(&mut self) {
        if let (Some(room_id), Some(user)) = (self.active_room.clone(), self.current_user.clone())
        {
            self.record(WireMessage::UserLeft {
                user_id: user.id,
                user_name: user.name,
                room_id,
            });
        }

        self.active_room = None;
        self.participants.clear();
    }

    pub fn update_participants(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }

    pub fn add_participant(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    pub fn remove_participant(&mut self, participant_id: ParticipantId) {
        self.participants.retain(|p| p.id != participant_id);
    }

    pub fn update_participant_status(
        &mut self,
        participant_id: ParticipantId,
        status: PresenceStatus,
    ) {
        if let Some(participant) = self.participants.iter_mut().find(|p| p.id == participant_id)
        {
            participant.status = status;
        }
    }

    // ── Team sessions ───────────────────────────────────────────────

    pub fn create_team_session(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        max_participants: Option<usize>,
    ) -> Result<TeamSession, CollabError> {
        let creator = self
            .current_user
            .clone()
            .ok_or(CollabError::NoCurrentUser)?;

        let session = TeamSession {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            max_participants: max_participants.unwrap_or(DEFAULT_SESSION_CAPACITY),
            participants: vec![creator],
            status: SessionStatus::Waiting,
            topic: None,
            difficulty: Difficulty::Medium,
            scores: Default::default(),
            created_at: now(),
            started_at: None,
            completed_at: None,
        };

        self.team_sessions.push(session.clone());
        self.active_team_session = Some(session.id);

        Ok(session)
    }

    /// Join an existing session. Capacity faults come back as values, not
    /// panics, and a full session is left untouched.
    pub fn join_team_session(
        &mut self,
        session_id: SessionId,
    ) -> Result<TeamSession, CollabError> {
        let user = self
            .current_user
            .clone()
            .ok_or(CollabError::NoCurrentUser)?;

        let session = self
            .team_sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(CollabError::SessionNotFound)?;

        if session.is_full() {
            return Err(CollabError::SessionFull);
        }

        session.participants.push(user.clone());
        let joined = session.clone();
        self.active_team_session = Some(session_id);

        self.record(WireMessage::TeamSessionJoined {
            session_id,
            user_id: user.id,
            user_name: user.name,
        });

        Ok(joined)
    }

    /// Remove the current user from a session. Missing session or missing
    /// current user is a silent no-op.
    pub fn leave_team_session(&mut self, session_id: SessionId) {
        let Some(user) = self.current_user.clone() else {
            return;
        };
        let Some(session) = self.team_sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };

        session.participants.retain(|p| p.id != user.id);
        self.active_team_session = None;

        self.record(WireMessage::TeamSessionLeft {
            session_id,
            user_id: user.id,
        });
    }

    /// Overwrite (not accumulate) a participant's score.
    pub fn update_team_session_score(
        &mut self,
        session_id: SessionId,
        user_id: ParticipantId,
        score: i32,
    ) {
        let Some(session) = self.team_sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };

        session.scores.insert(user_id, score);

        self.record(WireMessage::ScoreUpdated {
            session_id,
            user_id,
            score,
        });
    }

    /// Transition `Waiting -> Active`. Any other starting state is
    /// rejected; the lifecycle only moves forward.
    pub fn start_team_session(
        &mut self,
        session_id: SessionId,
        topic: impl Into<String>,
        difficulty: Difficulty,
    ) -> Result<(), CollabError> {
        let session = self
            .team_sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(CollabError::SessionNotFound)?;

        if session.status != SessionStatus::Waiting {
            return Err(CollabError::InvalidTransition {
                from: format!("{:?}", session.status),
                to: "Active".to_string(),
            });
        }

        let topic = topic.into();
        session.status = SessionStatus::Active;
        session.topic = Some(topic.clone());
        session.difficulty = difficulty;
        session.started_at = Some(now());

        self.record(WireMessage::TeamSessionStarted {
            session_id,
            topic,
            difficulty,
        });

        Ok(())
    }

    /// Transition `Active -> Completed`, freezing scores and selecting the
    /// winner: highest score, ties resolved to the first-scored entry.
    pub fn complete_team_session(&mut self, session_id: SessionId) -> Result<(), CollabError> {
        let session = self
            .team_sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(CollabError::SessionNotFound)?;

        if session.status != SessionStatus::Active {
            return Err(CollabError::InvalidTransition {
                from: format!("{:?}", session.status),
                to: "Completed".to_string(),
            });
        }

        session.status = SessionStatus::Completed;
        session.completed_at = Some(now());

        let winner_id = session.winner();
        let scores = session.scores.clone();

        self.record(WireMessage::TeamSessionCompleted {
            session_id,
            winner_id,
            scores,
        });

        Ok(())
    }

    // ── Friends ─────────────────────────────────────────────────────

    /// Add a friend directly to the durable list. Independent of the
    /// request path below; accepting a request does not call this.
    pub fn add_friend(
        &mut self,
        friend_id: ParticipantId,
        name: impl Into<String>,
        avatar: Option<String>,
    ) -> Friend {
        let friend = Friend {
            id: friend_id,
            name: name.into(),
            avatar: avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            added_at: now(),
            status: PresenceStatus::Offline,
        };

        self.friends.push(friend.clone());
        friend
    }

    pub fn remove_friend(&mut self, friend_id: ParticipantId) {
        self.friends.retain(|f| f.id != friend_id);
    }

    pub fn update_friend_status(&mut self, friend_id: ParticipantId, status: PresenceStatus) {
        if let Some(friend) = self.friends.iter_mut().find(|f| f.id == friend_id) {
            friend.status = status;
        }
    }

    /// Emit a friend request. Mutates neither friend list; the server
    /// routes the request to the recipient.
    pub fn send_friend_request(
        &mut self,
        to_id: ParticipantId,
        to_name: impl Into<String>,
    ) -> Result<FriendRequest, CollabError> {
        let user = self
            .current_user
            .clone()
            .ok_or(CollabError::NoCurrentUser)?;

        let request = FriendRequest {
            id: Uuid::new_v4(),
            from_id: user.id,
            from_name: user.name,
            to_id,
            to_name: to_name.into(),
            status: RequestStatus::Pending,
            sent_at: now(),
        };

        self.record(WireMessage::FriendRequestSent {
            request: request.clone(),
        });

        Ok(request)
    }

    /// Ingest a request addressed to this user (the inbound counterpart of
    /// `send_friend_request`).
    pub fn receive_friend_request(&mut self, request: FriendRequest) {
        if self.friend_requests.iter().any(|r| r.id == request.id) {
            return;
        }
        self.friend_requests.push(request);
    }

    /// Accept removes the pending request only. It does not add the
    /// requester to the friends list; that remains a separate
    /// `add_friend` call made by the UI.
    pub fn accept_friend_request(&mut self, request_id: RequestId) {
        self.friend_requests.retain(|r| r.id != request_id);
        self.record(WireMessage::FriendRequestAccepted { request_id });
    }

    pub fn reject_friend_request(&mut self, request_id: RequestId) {
        self.friend_requests.retain(|r| r.id != request_id);
        self.record(WireMessage::FriendRequestRejected { request_id });
    }

    // ── Social sharing ──────────────────────────────────────────────

    pub fn share_achievement(
        &mut self,
        achievement_id: impl Into<String>,
        achievement_name: impl Into<String>,
        achievement_icon: impl Into<String>,
    ) -> Result<SharedAchievement, CollabError> {
        let user = self
            .current_user
            .clone()
            .ok_or(CollabError::NoCurrentUser)?;

        let share = SharedAchievement {
            id: Uuid::new_v4(),
            user_id: user.id,
            user_name: user.name,
            achievement_id: achievement_id.into(),
            achievement_name: achievement_name.into(),
            achievement_icon: achievement_icon.into(),
            shared_at: now(),
            likes: 0,
            comments: Vec::new(),
        };

        self.shared_achievements.push(share.clone());
        self.record(WireMessage::AchievementShared {
            share: share.clone(),
        });

        Ok(share)
    }

    /// Increment unconditionally; there is no per-user de-duplication, so
    /// the same caller can like an item any number of times.
    pub fn like_shared_achievement(&mut self, share_id: ShareId) {
        let Some(share) = self
            .shared_achievements
            .iter_mut()
            .find(|s| s.id == share_id)
        else {
            return;
        };

        share.likes += 1;
        self.record(WireMessage::AchievementLiked { share_id });
    }

    pub fn comment_on_shared_achievement(
        &mut self,
        share_id: ShareId,
        text: impl Into<String>,
    ) -> Result<AchievementComment, CollabError> {
        let user = self
            .current_user
            .clone()
            .ok_or(CollabError::NoCurrentUser)?;

        let comment = AchievementComment {
            id: Uuid::new_v4(),
            user_id: user.id,
            user_name: user.name,
            text: text.into(),
            timestamp: now(),
        };

        let share = self
            .shared_achievements
            .iter_mut()
            .find(|s| s.id == share_id)
            .ok_or(CollabError::ShareNotFound)?;

        share.comments.push(comment.clone());
        self.record(WireMessage::AchievementCommented {
            share_id,
            comment: comment.clone(),
        });

        Ok(comment)
    }

    // ── Invitations ─────────────────────────────────────────────────

    pub fn invite_to_session(
        &mut self,
        friend_id: ParticipantId,
        session_id: SessionId,
    ) -> Result<SessionInvitation, CollabError> {
        let user = self
            .current_user
            .clone()
            .ok_or(CollabError::NoCurrentUser)?;

        let invitation = SessionInvitation {
            id: Uuid::new_v4(),
            from_id: user.id,
            from_name: user.name,
            to_id: friend_id,
            session_id,
            status: RequestStatus::Pending,
            sent_at: now(),
        };

        self.record(WireMessage::SessionInvitationSent {
            invitation: invitation.clone(),
        });

        Ok(invitation)
    }

    // ── Presence ────────────────────────────────────────────────────

    /// Update the current user's presence and best-effort echo it. Never
    /// fails; with no current user or no transport this degrades to a
    /// local-only or no-op update.
    pub fn update_presence(&mut self, status: PresenceStatus, activity: Option<String>) {
        let Some(user) = self.current_user.as_mut() else {
            return;
        };

        user.status = status;
        user.activity = activity.clone();
        user.last_active = Some(now());
        let user_id = user.id;

        self.record(WireMessage::Presence {
            user_id,
            status,
            activity,
        });
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Record an arbitrary domain event. Local mutation plus best-effort
    /// network echo, same as every built-in operation.
    pub fn emit_event(&mut self, message: WireMessage) -> CollabEvent {
        self.record(message)
    }

    pub fn subscribe_to_events<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&CollabEvent) + Send + 'static,
    {
        self.event_log.subscribe(callback)
    }

    pub fn unsubscribe_from_events(&mut self, id: SubscriptionId) -> bool {
        self.event_log.unsubscribe(id)
    }

    // ── Inbound application ─────────────────────────────────────────

    /// Apply a frame received from the server to local state. Inbound
    /// frames mutate only; they are not re-echoed to the network and the
    /// server remains authoritative on conflicts.
    pub fn apply_remote(&mut self, message: WireMessage) {
        match message {
            WireMessage::Auth { .. } => {}
            WireMessage::Presence {
                user_id,
                status,
                activity: _,
            } => {
                self.update_participant_status(user_id, status);
                self.update_friend_status(user_id, status);
            }
            WireMessage::UserJoined {
                user_id,
                user_name,
                room_id,
            } => {
                if self.active_room.as_deref() != Some(room_id.as_str()) {
                    return;
                }
                if self.participants.iter().any(|p| p.id == user_id) {
                    return;
                }
                self.participants.push(Participant {
                    id: user_id,
                    name: user_name,
                    avatar: DEFAULT_AVATAR.to_string(),
                    joined_at: now(),
                    status: PresenceStatus::Active,
                    activity: None,
                    last_active: None,
                });
            }
            WireMessage::UserLeft { user_id, .. } => {
                self.remove_participant(user_id);
            }
            WireMessage::TeamSessionJoined {
                session_id,
                user_id,
                user_name,
            } => {
                let Some(session) =
                    self.team_sessions.iter_mut().find(|s| s.id == session_id)
                else {
                    return;
                };
                if session.has_participant(user_id) || session.is_full() {
                    return;
                }
                session.participants.push(Participant {
                    id: user_id,
                    name: user_name,
                    avatar: DEFAULT_AVATAR.to_string(),
                    joined_at: now(),
                    status: PresenceStatus::Active,
                    activity: None,
                    last_active: None,
                });
            }
            WireMessage::TeamSessionLeft {
                session_id,
                user_id,
            } => {
                if let Some(session) =
                    self.team_sessions.iter_mut().find(|s| s.id == session_id)
                {
                    session.participants.retain(|p| p.id != user_id);
                }
            }
            WireMessage::ScoreUpdated {
                session_id,
                user_id,
                score,
            } => {
                if let Some(session) =
                    self.team_sessions.iter_mut().find(|s| s.id == session_id)
                {
                    session.scores.insert(user_id, score);
                }
            }
            WireMessage::TeamSessionStarted {
                session_id,
                topic,
                difficulty,
            } => {
                let Some(session) =
                    self.team_sessions.iter_mut().find(|s| s.id == session_id)
                else {
                    return;
                };
                if session.status != SessionStatus::Waiting {
                    return;
                }
                session.status = SessionStatus::Active;
                session.topic = Some(topic);
                session.difficulty = difficulty;
                session.started_at = Some(now());
            }
            WireMessage::TeamSessionCompleted { session_id, .. } => {
                let Some(session) =
                    self.team_sessions.iter_mut().find(|s| s.id == session_id)
                else {
                    return;
                };
                if session.status != SessionStatus::Active {
                    return;
                }
                session.status = SessionStatus::Completed;
                session.completed_at = Some(now());
            }
            WireMessage::FriendRequestSent { request } => {
                let addressed_to_us = self
                    .current_user
                    .as_ref()
                    .is_some_and(|u| u.id == request.to_id);
                if addressed_to_us {
                    self.receive_friend_request(request);
                }
            }
            WireMessage::FriendRequestAccepted { request_id }
            | WireMessage::FriendRequestRejected { request_id } => {
                self.friend_requests.retain(|r| r.id != request_id);
            }
            WireMessage::AchievementShared { share } => {
                if !self.shared_achievements.iter().any(|s| s.id == share.id) {
                    self.shared_achievements.push(share);
                }
            }
            WireMessage::AchievementLiked { share_id } => {
                if let Some(share) = self
                    .shared_achievements
                    .iter_mut()
                    .find(|s| s.id == share_id)
                {
                    share.likes += 1;
                }
            }
            WireMessage::AchievementCommented { share_id, comment } => {
                if let Some(share) = self
                    .shared_achievements
                    .iter_mut()
                    .find(|s| s.id == share_id)
                {
                    share.comments.push(comment);
                }
            }
            WireMessage::SessionInvitationSent { .. } => {
                // Invitations surface in the UI straight from the event
                // stream; nothing to fold into store state.
            }
        }
    }

    // ── Persistence ─────────────────────────────────────────────────

    pub fn snapshot(&self) -> CollabSnapshot {
        CollabSnapshot {
            friends: self.friends.clone(),
            team_sessions: self.team_sessions.clone(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn current_user(&self) -> Option<&Participant> {
        self.current_user.as_ref()
    }

    pub fn active_room(&self) -> Option<&str> {
        self.active_room.as_deref()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn team_sessions(&self) -> &[TeamSession] {
        &self.team_sessions
    }

    pub fn session(&self, session_id: SessionId) -> Option<&TeamSession> {
        self.team_sessions.iter().find(|s| s.id == session_id)
    }

    pub fn active_team_session(&self) -> Option<&TeamSession> {
        self.active_team_session.and_then(|id| self.session(id))
    }

    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    pub fn friend_requests(&self) -> &[FriendRequest] {
        &self.friend_requests
    }

    pub fn shared_achievements(&self) -> &[SharedAchievement] {
        &self.shared_achievements
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }
}

impl Default for CollaborationStore {
    fn default() -> Self {
        Self::new()
    }
}
