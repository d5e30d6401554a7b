//! Room actor: an isolated Tokio task that owns one duel.
//!
//! The actor is the only owner of its [`DuelState`]. Every mutation arrives
//! as a [`RoomCommand`] on a bounded mpsc channel and is applied in arrival
//! order, so two players answering at the same instant are serialized
//! without any lock around the game itself.
//!
//! After each successful mutation the actor settles the duel if it just
//! finished, then publishes a fresh [`RoomSnapshot`] on a `watch` channel,
//! and only then replies. A caller that gets a reply therefore always sees
//! its own change in the next snapshot.

use quizduel_protocol::{
    AnswerOutcome, PlayerId, QuestionView, RoomId, RoundStarted, SelectionMenu,
    StatusReport,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::settlement::settle;
use crate::{
    DuelState, RoomError, RoomPhase, RoomSnapshot, SharedQuestionSource,
    SharedScoreSink,
};

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Commands sent to a room actor through its channel.
///
/// Each variant carries a reply channel; the caller awaits the actor's
/// answer on it.
pub(crate) enum RoomCommand {
    SelectTopic {
        player: PlayerId,
        topic: String,
        level: u8,
        reply: Reply<RoundStarted>,
    },

    SubmitAnswer {
        player: PlayerId,
        option: usize,
        reply: Reply<AnswerOutcome>,
    },

    /// Finish the duel because `player` went silent.
    Abandon {
        player: PlayerId,
        reply: Reply<bool>,
    },

    Menu {
        player: PlayerId,
        reply: Reply<SelectionMenu>,
    },

    Question {
        player: PlayerId,
        reply: Reply<Option<QuestionView>>,
    },

    /// Stop the actor.
    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone: an `mpsc::Sender`, a `watch::Receiver`, and the room's
/// fixed metadata. The [`RoomStore`](crate::RoomStore) holds one per room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    players: [PlayerId; 2],
    created_at: Instant,
    sender: mpsc::Sender<RoomCommand>,
    snapshot: watch::Receiver<RoomSnapshot>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Both players in seat order.
    pub fn players(&self) -> &[PlayerId; 2] {
        &self.players
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.players.contains(player)
    }

    /// The other player, if `player` is in the room.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        match &self.players {
            [a, b] if a == player => Some(b),
            [a, b] if b == player => Some(a),
            _ => None,
        }
    }

    /// The most recently published snapshot. Never waits on the actor.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn phase(&self) -> RoomPhase {
        self.snapshot.borrow().phase
    }

    /// What `player` should be doing, from the latest snapshot.
    pub fn status_for(&self, player: &PlayerId) -> StatusReport {
        self.snapshot.borrow().status_for(player)
    }

    /// A receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshot.clone()
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    pub async fn select_topic(
        &self,
        player: &PlayerId,
        topic: &str,
        level: u8,
    ) -> Result<RoundStarted, RoomError> {
        self.request(|reply| RoomCommand::SelectTopic {
            player: player.clone(),
            topic: topic.to_string(),
            level,
            reply,
        })
        .await
    }

    pub async fn submit_answer(
        &self,
        player: &PlayerId,
        option: usize,
    ) -> Result<AnswerOutcome, RoomError> {
        self.request(|reply| RoomCommand::SubmitAnswer {
            player: player.clone(),
            option,
            reply,
        })
        .await
    }

    /// Finishes the duel with `player` as the one who left. Returns
    /// `false` if the duel was already over.
    pub async fn abandon(&self, player: &PlayerId) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::Abandon {
            player: player.clone(),
            reply,
        })
        .await
    }

    pub async fn selection_menu(
        &self,
        player: &PlayerId,
    ) -> Result<SelectionMenu, RoomError> {
        self.request(|reply| RoomCommand::Menu {
            player: player.clone(),
            reply,
        })
        .await
    }

    pub async fn current_question(
        &self,
        player: &PlayerId,
    ) -> Result<Option<QuestionView>, RoomError> {
        self.request(|reply| RoomCommand::Question {
            player: player.clone(),
            reply,
        })
        .await
    }

    /// Asks the actor to stop without waiting for channel capacity.
    ///
    /// If the channel is full the request is dropped; the actor still
    /// stops once every handle is gone.
    pub fn close(&self) {
        let _ = self.sender.try_send(RoomCommand::Shutdown);
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    state: DuelState,
    questions: SharedQuestionSource,
    scores: SharedScoreSink,
    receiver: mpsc::Receiver<RoomCommand>,
    publisher: watch::Sender<RoomSnapshot>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown or until
    /// every handle is dropped.
    async fn run(mut self) {
        let room_id = self.state.room_id();
        tracing::info!(%room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::SelectTopic {
                    player,
                    topic,
                    level,
                    reply,
                } => {
                    let result = self.state.select_topic(
                        &player,
                        &topic,
                        level,
                        self.questions.as_ref(),
                        &mut rand::rng(),
                    );
                    self.finish_command(reply, result);
                }
                RoomCommand::SubmitAnswer {
                    player,
                    option,
                    reply,
                } => {
                    let result = self.state.submit_answer(&player, option);
                    self.finish_command(reply, result);
                }
                RoomCommand::Abandon { player, reply } => {
                    let result = self.state.abandon(&player);
                    self.finish_command(reply, result);
                }
                RoomCommand::Menu { player, reply } => {
                    let menu = self
                        .state
                        .selection_menu(&player, self.questions.as_ref());
                    let _ = reply.send(menu);
                }
                RoomCommand::Question { player, reply } => {
                    let _ = reply.send(self.state.current_question(&player));
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    /// Settles and publishes after a successful mutation, then replies.
    fn finish_command<T>(&mut self, reply: Reply<T>, result: Result<T, RoomError>) {
        match &result {
            Ok(_) => {
                if self.state.needs_settlement() {
                    let settled = settle(&self.state, self.scores.as_ref());
                    self.state.record_result(settled);
                }
                self.publisher.send_replace(self.state.snapshot());
            }
            Err(err) => {
                tracing::debug!(
                    room_id = %self.state.room_id(),
                    error = %err,
                    "command rejected"
                );
            }
        }
        let _ = reply.send(result);
    }
}

/// Spawns a room actor for `state` and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room(
    state: DuelState,
    questions: SharedQuestionSource,
    scores: SharedScoreSink,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let (publisher, snapshot) = watch::channel(state.snapshot());

    let handle = RoomHandle {
        room_id: state.room_id(),
        players: state.players(),
        created_at: state.created_at(),
        sender: tx,
        snapshot,
    };

    let actor = RoomActor {
        state,
        questions,
        scores,
        receiver: rx,
        publisher,
    };
    tokio::spawn(actor.run());

    handle
}
