//! Matchmaking and duel rooms for quizduel.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! [`DuelState`]. Everything else talks to it through a [`RoomHandle`].
//!
//! # Key types
//!
//! - [`DuelState`]: the per-room state machine (selection, answering, turns)
//! - [`RoomHandle`]: send commands to a running room, read its snapshot
//! - [`RoomStore`]: creates, looks up, and evicts rooms
//! - [`MatchQueue`] and [`Lobby`]: FIFO pairing of waiting players
//! - [`QuestionSource`] / [`ScoreSink`]: the collaborators a duel needs
//! - [`settle`]: credits final scores and decides the winner

mod config;
mod error;
mod lobby;
mod logic;
mod queue;
mod room;
mod settlement;
mod state;
mod store;

pub use config::{DuelConfig, QUESTIONS_PER_ROUND, RoomPhase};
pub use error::{AnswerRejection, RoomError, SelectionRejection};
pub use lobby::{Lobby, MatchAttempt};
pub use logic::{QuestionSource, ScoreSink, SharedQuestionSource, SharedScoreSink};
pub use queue::MatchQueue;
pub use room::RoomHandle;
pub use settlement::{decide, settle};
pub use state::{DuelState, RoomSnapshot};
pub use store::RoomStore;
