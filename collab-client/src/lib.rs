pub mod backoff;
pub mod bridge;
pub mod config;
pub mod connector;
pub mod transport;

// Re-export main components
pub use backoff::*;
pub use bridge::*;
pub use config::*;
pub use connector::*;
pub use transport::*;
