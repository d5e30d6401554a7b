//! Player presence tracking for quizduel.
//!
//! A duel only moves forward while both players keep polling. This crate
//! records those polls as heartbeats so the room layer can tell a slow
//! opponent from one who has left.
//!
//! # How it fits in the stack
//!
//! ```text
//! Service (above)   ← stamps a heartbeat on every request, asks is_present()
//!     ↕
//! Presence (this crate)  ← last-seen timestamps, explicit departures
//!     ↕
//! Protocol (below)  ← provides PlayerId
//! ```

mod error;
mod manager;
mod session;

pub use error::PresenceError;
pub use manager::PresenceTracker;
pub use session::{Presence, PresenceConfig, PresenceState};
