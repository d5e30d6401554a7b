//! `DuelService` builder and request surface.
//!
//! This is the entry point a presentation layer calls. It ties together
//! the layers: presence → lobby (queue + room store) → room actors.
//! Every method is one request from one player, and every request counts
//! as that player's heartbeat.

use std::sync::Arc;
use std::time::Duration;

use quizduel_protocol::{
    AnswerOutcome, Codec, JsonCodec, MatchResult, PlayerId, QuestionView,
    RoomId, RoundStarted, SelectionMenu, StatusReport,
};
use quizduel_room::{
    DuelConfig, Lobby, MatchAttempt, RoomHandle, RoomSnapshot, RoomStore,
    SharedQuestionSource, SharedScoreSink,
};
use quizduel_session::{PresenceConfig, PresenceTracker};
use serde::Serialize;
use tokio::sync::{Mutex, watch};

use crate::DuelError;

/// Builder for configuring a [`DuelService`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use quizduel::prelude::*;
///
/// let service = DuelService::builder()
///     .questions(Arc::new(QuestionCatalog::from_path("questions.json")?))
///     .scores(Arc::new(ScoreLedger::new()))
///     .build()?;
/// ```
pub struct DuelServiceBuilder {
    config: DuelConfig,
    presence_config: PresenceConfig,
    questions: Option<SharedQuestionSource>,
    scores: Option<SharedScoreSink>,
}

impl DuelServiceBuilder {
    /// Creates a new builder with default settings and no collaborators.
    pub fn new() -> Self {
        Self {
            config: DuelConfig::default(),
            presence_config: PresenceConfig::default(),
            questions: None,
            scores: None,
        }
    }

    /// Sets the duel rules.
    pub fn config(mut self, config: DuelConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how long a silent player counts as present.
    pub fn presence_config(mut self, config: PresenceConfig) -> Self {
        self.presence_config = config;
        self
    }

    /// Sets where questions come from. Required.
    pub fn questions(mut self, source: SharedQuestionSource) -> Self {
        self.questions = Some(source);
        self
    }

    /// Sets where finished duels are credited. Required.
    pub fn scores(mut self, sink: SharedScoreSink) -> Self {
        self.scores = Some(sink);
        self
    }

    /// Builds the service with `JsonCodec`.
    pub fn build(self) -> Result<DuelService<JsonCodec>, DuelError> {
        self.build_with_codec(JsonCodec)
    }

    /// Builds the service with a custom codec for [`DuelService::encode`].
    ///
    /// # Errors
    /// [`DuelError::Config`] if a collaborator is missing or the rules
    /// can't produce a playable duel.
    pub fn build_with_codec<C: Codec>(
        self,
        codec: C,
    ) -> Result<DuelService<C>, DuelError> {
        let questions = self
            .questions
            .ok_or_else(|| DuelError::Config("question source not set".into()))?;
        let scores = self
            .scores
            .ok_or_else(|| DuelError::Config("score sink not set".into()))?;
        if self.config.total_rounds == 0 {
            return Err(DuelError::Config("total_rounds must be at least 1".into()));
        }
        if self.config.channel_size == 0 {
            return Err(DuelError::Config("channel_size must be at least 1".into()));
        }

        tracing::info!(
            total_rounds = self.config.total_rounds,
            room_ttl_secs = self.config.room_ttl.as_secs(),
            presence_timeout_secs = self.presence_config.timeout_secs,
            "duel service configured"
        );

        let store = RoomStore::new(self.config, questions, scores.clone());
        Ok(DuelService {
            lobby: Mutex::new(Lobby::new(store)),
            presence: Mutex::new(PresenceTracker::new(self.presence_config)),
            scores,
            codec,
        })
    }
}

impl Default for DuelServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The matchmaking and gameplay surface.
///
/// Share it as `Arc<DuelService>` between request handlers. The lobby and
/// the presence tracker each sit behind their own mutex and are never held
/// together; gameplay runs inside each room's actor.
pub struct DuelService<C: Codec = JsonCodec> {
    lobby: Mutex<Lobby>,
    presence: Mutex<PresenceTracker>,
    scores: SharedScoreSink,
    codec: C,
}

impl DuelService<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DuelServiceBuilder {
        DuelServiceBuilder::new()
    }
}

impl<C: Codec> DuelService<C> {
    async fn touch(&self, player: &PlayerId) {
        self.presence.lock().await.heartbeat(player);
    }

    async fn room(
        &self,
        room_id: RoomId,
        player: &PlayerId,
    ) -> Result<RoomHandle, DuelError> {
        Ok(self.lobby.lock().await.room(room_id, player)?)
    }

    /// Records that `player` is still around without asking anything.
    pub async fn heartbeat(&self, player: &PlayerId) {
        self.touch(player).await;
    }

    // -- Matchmaking --------------------------------------------------------

    /// Enters matchmaking. Idempotent; a finished duel is released first.
    ///
    /// Returns `true` if the player was newly queued.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`](quizduel_room::RoomError::AlreadyInRoom)
    /// while the player's current duel is still running.
    pub async fn enqueue(&self, player: &PlayerId) -> Result<bool, DuelError> {
        self.touch(player).await;
        Ok(self.lobby.lock().await.enqueue(player)?)
    }

    /// Leaves the waiting list. Returns `true` if the player was queued.
    pub async fn cancel(&self, player: &PlayerId) -> bool {
        self.touch(player).await;
        self.lobby.lock().await.cancel(player)
    }

    /// Polls matchmaking: `Waiting`, or `FoundMatch` with where to go next.
    ///
    /// Re-polling after a match returns the same room.
    pub async fn check_match_status(
        &self,
        player: &PlayerId,
    ) -> Result<StatusReport, DuelError> {
        self.touch(player).await;
        let attempt = self.lobby.lock().await.try_match(player)?;

        Ok(match attempt {
            MatchAttempt::Waiting => StatusReport::Waiting,
            MatchAttempt::Matched(handle) => {
                let snapshot = handle.snapshot();
                match snapshot.next_action_for(player) {
                    Some(next_action) => StatusReport::FoundMatch {
                        room_id: handle.room_id(),
                        next_action,
                    },
                    None => StatusReport::RoomNotFoundOrNotMember,
                }
            }
        })
    }

    /// Logs a player out: leaves the queue and counts as absent at once,
    /// so an opponent's next poll ends any running duel.
    ///
    /// # Errors
    /// [`PresenceError::NotFound`](quizduel_session::PresenceError::NotFound)
    /// if the player was never seen.
    pub async fn leave(&self, player: &PlayerId) -> Result<(), DuelError> {
        self.lobby.lock().await.cancel(player);
        self.presence.lock().await.depart(player)?;
        Ok(())
    }

    // -- Gameplay -----------------------------------------------------------

    /// What `player` should be doing in `room_id` right now.
    ///
    /// If the opponent has gone silent past the presence timeout plus the
    /// allowance of the question they last fetched (or logged out) and the
    /// duel isn't over, the duel is finished as
    /// abandoned and settled before the status is computed. Lookup
    /// failures of every kind report `RoomNotFoundOrNotMember`.
    pub async fn round_status(
        &self,
        room_id: RoomId,
        player: &PlayerId,
    ) -> StatusReport {
        self.touch(player).await;
        let handle = match self.room(room_id, player).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::debug!(%room_id, %player, error = %err, "status lookup failed");
                return StatusReport::RoomNotFoundOrNotMember;
            }
        };

        if !handle.phase().is_terminal() {
            if let Some(opponent) = handle.opponent_of(player) {
                let present = self.presence.lock().await.is_present(opponent);
                if !present {
                    tracing::info!(
                        %room_id,
                        %player,
                        %opponent,
                        "opponent absent, finishing duel"
                    );
                    if let Err(err) = handle.abandon(opponent).await {
                        tracing::warn!(%room_id, error = %err, "abandon failed");
                    }
                }
            }
        }

        handle.status_for(player)
    }

    /// The topic screen for the next round.
    pub async fn selection_menu(
        &self,
        room_id: RoomId,
        player: &PlayerId,
    ) -> Result<SelectionMenu, DuelError> {
        self.touch(player).await;
        let handle = self.room(room_id, player).await?;
        Ok(handle.selection_menu(player).await?)
    }

    /// Picks the next round's topic and level. Only the turn holder may.
    pub async fn select_topic(
        &self,
        room_id: RoomId,
        player: &PlayerId,
        topic: &str,
        level: u8,
    ) -> Result<RoundStarted, DuelError> {
        self.touch(player).await;
        let handle = self.room(room_id, player).await?;
        Ok(handle.select_topic(player, topic, level).await?)
    }

    /// The caller's next unanswered question, if a round is running.
    ///
    /// Handing out a question also grants the caller its time allowance
    /// on top of the presence timeout, so an opponent's poll doesn't end
    /// the duel while they are still thinking.
    pub async fn current_question(
        &self,
        room_id: RoomId,
        player: &PlayerId,
    ) -> Result<Option<QuestionView>, DuelError> {
        self.touch(player).await;
        let handle = self.room(room_id, player).await?;
        let question = handle.current_question(player).await?;
        if let Some(view) = &question {
            let allowance = Duration::from_secs(u64::from(view.time_limit_secs));
            self.presence
                .lock()
                .await
                .heartbeat_with_grace(player, allowance);
        }
        Ok(question)
    }

    /// Answers the caller's next question with `option` (0-based).
    pub async fn submit_answer(
        &self,
        room_id: RoomId,
        player: &PlayerId,
        option: usize,
    ) -> Result<AnswerOutcome, DuelError> {
        self.touch(player).await;
        let handle = self.room(room_id, player).await?;
        Ok(handle.submit_answer(player, option).await?)
    }

    /// The settled result, once the duel is finished.
    pub async fn match_result(
        &self,
        room_id: RoomId,
        player: &PlayerId,
    ) -> Result<Option<MatchResult>, DuelError> {
        self.touch(player).await;
        let handle = self.room(room_id, player).await?;
        Ok(handle.snapshot().result)
    }

    /// A receiver that wakes whenever the room changes, for callers that
    /// would rather wait than poll.
    pub async fn subscribe(
        &self,
        room_id: RoomId,
        player: &PlayerId,
    ) -> Result<watch::Receiver<RoomSnapshot>, DuelError> {
        self.touch(player).await;
        let handle = self.room(room_id, player).await?;
        Ok(handle.subscribe())
    }

    // -- Scores and housekeeping --------------------------------------------

    /// The player's lifetime score from the score sink.
    pub fn cumulative_score(&self, player: &PlayerId) -> u64 {
        self.scores.total(player)
    }

    /// Encodes any payload with the service's codec.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, DuelError> {
        Ok(self.codec.encode(value)?)
    }

    /// Expires silent players, drops them from the waiting list, and
    /// evicts rooms past their TTL.
    ///
    /// Returns the players expired by this call.
    pub async fn maintain(&self) -> Vec<PlayerId> {
        let expired = {
            let mut presence = self.presence.lock().await;
            let expired = presence.expire_stale();
            presence.cleanup_expired();
            expired
        };

        let mut lobby = self.lobby.lock().await;
        for player in &expired {
            lobby.cancel(player);
        }
        let evicted = lobby.store_mut().evict_expired(tokio::time::Instant::now());

        if !expired.is_empty() || !evicted.is_empty() {
            tracing::info!(
                players = expired.len(),
                rooms = evicted.len(),
                "maintenance sweep"
            );
        }
        expired
    }

    /// Number of rooms currently held.
    pub async fn room_count(&self) -> usize {
        self.lobby.lock().await.store().len()
    }

    /// Number of players in the waiting list.
    pub async fn waiting_count(&self) -> usize {
        self.lobby.lock().await.queue().len()
    }
}

/// Convenience for sharing one service between tasks.
pub type SharedDuelService<C = JsonCodec> = Arc<DuelService<C>>;
