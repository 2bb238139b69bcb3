pub mod errors;
pub mod messages;
pub mod session;
pub mod social;
pub mod user;

// Re-export all types
pub use errors::*;
pub use messages::*;
pub use session::*;
pub use social::*;
pub use user::*;

use uuid::Uuid;

pub type ParticipantId = Uuid;
pub type SessionId = Uuid;
pub type RequestId = Uuid;
pub type ShareId = Uuid;
pub type RoomId = String;
