mod connection_manager;
mod events;

// Re-export types from submodules
pub use connection_manager::{ConnectionManager, ConnectionState};
pub use events::{ConnectionEvent, WireMessage};
