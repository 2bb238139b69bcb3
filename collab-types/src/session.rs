use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::user::Participant;
use crate::{ParticipantId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SessionStatus {
    Waiting,   // Created, accepting participants
    Active,    // Session in progress
    Completed, // Session finished, scores frozen
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Per-participant scores, keyed by participant id.
///
/// Insertion order is significant: ties at completion time resolve to the
/// first-scored participant, so the map must iterate in insertion order.
pub type ScoreBoard = IndexMap<ParticipantId, i32>;

/// A bounded-capacity, staged collaborative activity.
///
/// Status only ever moves forward: Waiting -> Active -> Completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TeamSession {
    pub id: SessionId,
    pub name: String,
    pub description: String,
    pub max_participants: usize,
    pub participants: Vec<Participant>,
    pub status: SessionStatus,
    pub topic: Option<String>,
    pub difficulty: Difficulty,
    pub scores: ScoreBoard,
    pub created_at: String, // ISO 8601 string
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

impl TeamSession {
    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants
    }

    pub fn has_participant(&self, id: ParticipantId) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    /// Participant with the highest score. Ties resolve to the entry that
    /// was scored first; an empty score board has no winner.
    pub fn winner(&self) -> Option<ParticipantId> {
        let mut best: Option<(ParticipantId, i32)> = None;
        for (&id, &score) in &self.scores {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((id, score)),
            }
        }
        best.map(|(id, _)| id)
    }
}
