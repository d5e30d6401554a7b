//! # quizduel
//!
//! Head-to-head quiz duels: two players are paired from a waiting list,
//! take turns choosing a topic and difficulty, answer the same three
//! questions each round at their own pace, and after six rounds the higher
//! score wins.
//!
//! A presentation layer drives everything through [`DuelService`]: it
//! enqueues players, polls for a [`StatusReport`](quizduel_protocol::StatusReport)
//! to decide what to show, and submits selections and answers. Questions
//! come from a [`QuestionSource`](quizduel_room::QuestionSource) and final
//! scores go to a [`ScoreSink`](quizduel_room::ScoreSink);
//! [`QuestionCatalog`] and [`ScoreLedger`] are in-memory versions of both.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quizduel::prelude::*;
//!
//! # async fn run() -> Result<(), DuelError> {
//! let service = DuelService::builder()
//!     .questions(Arc::new(QuestionCatalog::from_path("questions.json")?))
//!     .scores(Arc::new(ScoreLedger::new()))
//!     .build()?;
//!
//! let alice = PlayerId::new("alice");
//! service.enqueue(&alice).await?;
//! let status = service.check_match_status(&alice).await?;
//! # Ok(())
//! # }
//! ```

mod catalog;
mod error;
mod ledger;
mod service;

pub use catalog::QuestionCatalog;
pub use error::DuelError;
pub use ledger::ScoreLedger;
pub use service::{DuelService, DuelServiceBuilder, SharedDuelService};

/// Re-exports of commonly used types.
pub mod prelude {
    pub use crate::{
        DuelError, DuelService, DuelServiceBuilder, QuestionCatalog,
        ScoreLedger, SharedDuelService,
    };
    pub use quizduel_protocol::{
        AnswerOutcome, AnswerProgress, BONUS_LEVEL, Codec, JsonCodec,
        LevelChoice, MatchOutcome, MatchResult, NextAction, PlayerId,
        QuestionRecord, QuestionView, RoomId, RoundStarted, SelectionMenu,
        Standing, StatusReport, TopicChoice,
    };
    pub use quizduel_room::{
        DuelConfig, QUESTIONS_PER_ROUND, QuestionSource, RoomError, RoomPhase,
        RoomSnapshot, ScoreSink,
    };
    pub use quizduel_session::PresenceConfig;
}
