pub mod event_log;
pub mod presence;
pub mod snapshot;
pub mod store;

// Re-export main components
pub use event_log::*;
pub use presence::*;
pub use snapshot::*;
pub use store::*;
