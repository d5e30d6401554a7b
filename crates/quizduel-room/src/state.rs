//! The duel state machine.
//!
//! [`DuelState`] is the whole game for one room: who holds the turn, which
//! questions are live, how far each player has got, and which topic
//! combinations are spent. It is plain data with synchronous methods. The
//! room actor owns one and is the only thing that mutates it, which is what
//! keeps two players' concurrent submissions from interleaving.
//!
//! Every method validates before it mutates, so a rejected call leaves the
//! state exactly as it was.

use std::collections::HashSet;

use quizduel_protocol::{
    AnswerOutcome, AnswerProgress, BONUS_LEVEL, LevelChoice, MatchResult,
    NextAction, PlayerId, QuestionRecord, QuestionView, RoomId, RoundStarted,
    SelectionMenu, Standing, StatusReport, TopicChoice,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use tokio::time::Instant;

use crate::{
    AnswerRejection, DuelConfig, QUESTIONS_PER_ROUND, QuestionSource,
    RoomError, RoomPhase, SelectionRejection,
};

/// One player's side of the room.
#[derive(Debug, Clone)]
struct Seat {
    player: PlayerId,
    score: u32,
    /// Cursor into the round's questions: how many this player has
    /// answered so far.
    answered: usize,
    used_combinations: HashSet<(String, u8)>,
    used_bonus: bool,
}

impl Seat {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            score: 0,
            answered: 0,
            used_combinations: HashSet::new(),
            used_bonus: false,
        }
    }
}

/// The round currently being answered.
#[derive(Debug, Clone)]
struct ActiveRound {
    topic: String,
    level: u8,
    is_bonus: bool,
    questions: [QuestionRecord; QUESTIONS_PER_ROUND],
    started_at: Instant,
}

/// The complete state of one duel.
#[derive(Debug, Clone)]
pub struct DuelState {
    room_id: RoomId,
    /// Fixed at creation, never reordered.
    seats: [Seat; 2],
    /// Index into `seats` of the player who selects next.
    turn: usize,
    current_round: u32,
    phase: RoomPhase,
    round: Option<ActiveRound>,
    abandoned_by: Option<PlayerId>,
    result: Option<MatchResult>,
    created_at: Instant,
    config: DuelConfig,
}

impl DuelState {
    /// Creates a room's state with seat `first_turn` (0 or 1) selecting
    /// first.
    ///
    /// # Errors
    /// [`RoomError::SamePlayer`] if both players are the same.
    pub fn new(
        room_id: RoomId,
        players: [PlayerId; 2],
        first_turn: usize,
        config: DuelConfig,
    ) -> Result<Self, RoomError> {
        let [first, second] = players;
        if first == second {
            return Err(RoomError::SamePlayer(first));
        }

        Ok(Self {
            room_id,
            seats: [Seat::new(first), Seat::new(second)],
            turn: first_turn % 2,
            current_round: 0,
            phase: RoomPhase::WaitingForTopicSelection,
            round: None,
            abandoned_by: None,
            result: None,
            created_at: Instant::now(),
            config,
        })
    }

    // -- Accessors ----------------------------------------------------------

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn total_rounds(&self) -> u32 {
        self.config.total_rounds
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Both players in seat order.
    pub fn players(&self) -> [PlayerId; 2] {
        [self.seats[0].player.clone(), self.seats[1].player.clone()]
    }

    /// The player who selects the next topic.
    pub fn turn(&self) -> &PlayerId {
        &self.seats[self.turn].player
    }

    pub fn score_of(&self, player: &PlayerId) -> Option<u32> {
        self.seat(player).map(|s| s.score)
    }

    pub fn answered_by(&self, player: &PlayerId) -> Option<usize> {
        self.seat(player).map(|s| s.answered)
    }

    /// Whether `player` already spent the (topic, level) combination.
    pub fn has_used(&self, player: &PlayerId, topic: &str, level: u8) -> bool {
        self.seat(player).is_some_and(|s| {
            s.used_combinations.contains(&(topic.to_string(), level))
        })
    }

    pub fn bonus_used(&self, player: &PlayerId) -> bool {
        self.seat(player).is_some_and(|s| s.used_bonus)
    }

    /// When the live round's questions were drawn.
    pub fn round_started_at(&self) -> Option<Instant> {
        self.round.as_ref().map(|r| r.started_at)
    }

    pub fn abandoned_by(&self) -> Option<&PlayerId> {
        self.abandoned_by.as_ref()
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    fn seat(&self, player: &PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| &s.player == player)
    }

    fn seat_of(&self, player: &PlayerId) -> Result<usize, RoomError> {
        self.seats
            .iter()
            .position(|s| &s.player == player)
            .ok_or_else(|| RoomError::NotMember(player.clone(), self.room_id))
    }

    fn invalid_phase(&self, operation: &'static str) -> RoomError {
        RoomError::InvalidPhase {
            room_id: self.room_id,
            phase: self.phase,
            operation,
        }
    }

    fn transition(&mut self, target: RoomPhase) {
        debug_assert!(
            self.phase.can_transition_to(target),
            "illegal transition {} -> {}",
            self.phase,
            target
        );
        tracing::debug!(
            room_id = %self.room_id,
            from = %self.phase,
            to = %target,
            "phase transition"
        );
        self.phase = target;
    }

    // -- Topic selection ----------------------------------------------------

    /// Starts the next round on `topic`/`level`, drawing its questions from
    /// `source` without replacement.
    ///
    /// For the bonus topic the submitted level is ignored and
    /// [`BONUS_LEVEL`] is used instead.
    ///
    /// # Errors
    /// - [`RoomError::NotMember`], [`RoomError::NotYourTurn`],
    ///   [`RoomError::InvalidPhase`]
    /// - [`RoomError::InvalidSelection`] for an unknown topic or level, a
    ///   spent combination or bonus pick, or a pool smaller than a round
    pub fn select_topic<R: Rng + ?Sized>(
        &mut self,
        player: &PlayerId,
        topic: &str,
        level: u8,
        source: &dyn QuestionSource,
        rng: &mut R,
    ) -> Result<RoundStarted, RoomError> {
        let seat = self.seat_of(player)?;
        if !self.phase.is_accepting_selection() {
            return Err(self.invalid_phase("select a topic"));
        }
        if seat != self.turn {
            return Err(RoomError::NotYourTurn(player.clone(), self.room_id));
        }

        let is_bonus = self.config.is_bonus_topic(topic);
        let level = if is_bonus { BONUS_LEVEL } else { level };

        if !source.list_topics().contains(topic) {
            return Err(SelectionRejection::UnknownTopic(topic.to_string()).into());
        }
        if !source.list_levels(topic).contains(&level) {
            return Err(SelectionRejection::UnknownLevel {
                topic: topic.to_string(),
                level,
            }
            .into());
        }

        let combination = (topic.to_string(), level);
        if is_bonus {
            if self.seats[seat].used_bonus {
                return Err(SelectionRejection::BonusUsed.into());
            }
        } else if self.seats[seat].used_combinations.contains(&combination) {
            return Err(SelectionRejection::CombinationUsed {
                topic: topic.to_string(),
                level,
            }
            .into());
        }

        let pool = source.find(topic, level);
        let insufficient = || SelectionRejection::InsufficientQuestions {
            topic: topic.to_string(),
            level,
            available: pool.len(),
            required: QUESTIONS_PER_ROUND,
        };
        if pool.len() < QUESTIONS_PER_ROUND {
            return Err(insufficient().into());
        }
        let drawn: Vec<QuestionRecord> = pool
            .choose_multiple(rng, QUESTIONS_PER_ROUND)
            .cloned()
            .collect();
        let questions: [QuestionRecord; QUESTIONS_PER_ROUND] =
            drawn.try_into().map_err(|_| insufficient())?;

        // Everything validated; commit.
        self.current_round += 1;
        for s in &mut self.seats {
            s.answered = 0;
        }
        if is_bonus {
            self.seats[seat].used_bonus = true;
        } else {
            self.seats[seat].used_combinations.insert(combination);
        }
        self.round = Some(ActiveRound {
            topic: topic.to_string(),
            level,
            is_bonus,
            questions,
            started_at: Instant::now(),
        });
        self.transition(RoomPhase::InProgress);

        tracing::info!(
            room_id = %self.room_id,
            %player,
            topic,
            level,
            round = self.current_round,
            "round started"
        );

        Ok(RoundStarted {
            round: self.current_round,
            topic: topic.to_string(),
            level,
        })
    }

    // -- Answering ----------------------------------------------------------

    /// Answers `player`'s next unanswered question with `option`.
    ///
    /// A correct answer is worth the question's level, or the configured
    /// bonus points in a bonus round. When this answer is the last one
    /// outstanding for both players, the round closes: the turn passes to
    /// the other seat, or the duel finishes after the final round.
    ///
    /// # Errors
    /// - [`RoomError::NotMember`], [`RoomError::InvalidPhase`]
    /// - [`RoomError::InvalidAnswer`] for an out-of-range option or when
    ///   the player has nothing left to answer
    pub fn submit_answer(
        &mut self,
        player: &PlayerId,
        option: usize,
    ) -> Result<AnswerOutcome, RoomError> {
        let seat = self.seat_of(player)?;
        if !self.phase.is_answering() {
            return Err(self.invalid_phase("answer"));
        }
        let round = self
            .round
            .as_ref()
            .ok_or_else(|| self.invalid_phase("answer"))?;

        let cursor = self.seats[seat].answered;
        let question = round
            .questions
            .get(cursor)
            .ok_or(AnswerRejection::NothingToAnswer)?;
        if option >= question.options.len() {
            return Err(AnswerRejection::OptionOutOfRange {
                option,
                options: question.options.len(),
            }
            .into());
        }

        let correct = question.is_correct(option);
        let correct_option = question.correct;
        let points_awarded = match (correct, round.is_bonus) {
            (false, _) => 0,
            (true, true) => self.config.bonus_points,
            (true, false) => u32::from(question.level),
        };

        let me = &mut self.seats[seat];
        me.score += points_awarded;
        me.answered += 1;
        let score = me.score;
        let mine_done = me.answered >= QUESTIONS_PER_ROUND;

        tracing::debug!(
            room_id = %self.room_id,
            %player,
            question = cursor,
            correct,
            points_awarded,
            "answer recorded"
        );

        let progress = if self
            .seats
            .iter()
            .all(|s| s.answered >= QUESTIONS_PER_ROUND)
        {
            self.complete_round()
        } else if mine_done {
            AnswerProgress::WaitingForOpponent
        } else {
            AnswerProgress::MoreQuestions
        };

        Ok(AnswerOutcome {
            correct,
            correct_option,
            points_awarded,
            score,
            progress,
        })
    }

    fn complete_round(&mut self) -> AnswerProgress {
        if self.current_round < self.config.total_rounds {
            self.turn = 1 - self.turn;
            self.transition(RoomPhase::WaitingForTopicSelection);
            tracing::info!(
                room_id = %self.room_id,
                round = self.current_round,
                next_selector = %self.seats[self.turn].player,
                "round complete"
            );
            AnswerProgress::RoundComplete
        } else {
            self.transition(RoomPhase::Finished);
            tracing::info!(
                room_id = %self.room_id,
                rounds = self.current_round,
                "duel finished"
            );
            AnswerProgress::MatchFinished
        }
    }

    // -- Abandonment and settlement -----------------------------------------

    /// Ends the duel because `absent` stopped responding.
    ///
    /// Returns `true` if this call finished the room, `false` if it was
    /// already finished.
    ///
    /// # Errors
    /// [`RoomError::NotMember`] if `absent` isn't in the room.
    pub fn abandon(&mut self, absent: &PlayerId) -> Result<bool, RoomError> {
        self.seat_of(absent)?;
        if self.phase.is_terminal() {
            return Ok(false);
        }
        self.abandoned_by = Some(absent.clone());
        self.transition(RoomPhase::Finished);
        tracing::warn!(
            room_id = %self.room_id,
            player = %absent,
            round = self.current_round,
            "duel abandoned"
        );
        Ok(true)
    }

    /// Returns `true` when the duel is over but no result is recorded yet.
    pub fn needs_settlement(&self) -> bool {
        self.phase.is_terminal() && self.result.is_none()
    }

    /// Both players' room scores in seat order.
    pub fn standings(&self) -> [Standing; 2] {
        self.seats.clone().map(|s| Standing {
            player: s.player,
            score: s.score,
        })
    }

    /// Stores the settled result. A second result is ignored.
    pub fn record_result(&mut self, result: MatchResult) {
        if self.result.is_none() {
            self.result = Some(result);
        }
    }

    // -- Views --------------------------------------------------------------

    /// Builds the topic screen for `player`: every topic and level in
    /// `source`, with question counts and the caller's spent picks.
    ///
    /// # Errors
    /// [`RoomError::NotMember`], or [`RoomError::InvalidPhase`] once the
    /// duel is finished.
    pub fn selection_menu(
        &self,
        player: &PlayerId,
        source: &dyn QuestionSource,
    ) -> Result<SelectionMenu, RoomError> {
        let seat = self.seat_of(player)?;
        if self.phase.is_terminal() {
            return Err(self.invalid_phase("open the topic menu"));
        }
        let me = &self.seats[seat];

        let topics = source
            .list_topics()
            .into_iter()
            .map(|topic| {
                let is_bonus = self.config.is_bonus_topic(&topic);
                let levels = source
                    .list_levels(&topic)
                    .into_iter()
                    .filter(|level| !is_bonus || *level == BONUS_LEVEL)
                    .map(|level| LevelChoice {
                        level,
                        question_count: source.find(&topic, level).len(),
                        used: if is_bonus {
                            me.used_bonus
                        } else {
                            me.used_combinations
                                .contains(&(topic.clone(), level))
                        },
                    })
                    .collect();
                TopicChoice {
                    topic,
                    is_bonus,
                    levels,
                }
            })
            .collect();

        Ok(SelectionMenu {
            room_id: self.room_id,
            round: self.current_round + 1,
            total_rounds: self.config.total_rounds,
            turn: self.turn().clone(),
            is_my_turn: seat == self.turn,
            bonus_used: me.used_bonus,
            topics,
        })
    }

    /// The next question `player` has to answer, or `None` if no round is
    /// running or they have answered everything in it.
    ///
    /// # Errors
    /// [`RoomError::NotMember`].
    pub fn current_question(
        &self,
        player: &PlayerId,
    ) -> Result<Option<QuestionView>, RoomError> {
        let seat = self.seat_of(player)?;
        let round = match &self.round {
            Some(round) if self.phase.is_answering() => round,
            _ => return Ok(None),
        };
        let cursor = self.seats[seat].answered;

        Ok(round.questions.get(cursor).map(|q| QuestionView {
            round: self.current_round,
            number: cursor + 1,
            of: QUESTIONS_PER_ROUND,
            topic: round.topic.clone(),
            level: round.level,
            text: q.text.clone(),
            options: q.options.clone(),
            time_limit_secs: q.time_limit_secs,
        }))
    }

    /// A read-only copy of everything a poller may look at.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id,
            players: self.players(),
            scores: [self.seats[0].score, self.seats[1].score],
            answered: [self.seats[0].answered, self.seats[1].answered],
            turn: self.turn().clone(),
            phase: self.phase,
            current_round: self.current_round,
            total_rounds: self.config.total_rounds,
            current_topic: self.round.as_ref().map(|r| r.topic.clone()),
            current_level: self.round.as_ref().map(|r| r.level),
            abandoned_by: self.abandoned_by.clone(),
            result: self.result.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomSnapshot
// ---------------------------------------------------------------------------

/// A point-in-time copy of a room, published after every change.
///
/// Status polls are answered from the latest snapshot, so they never wait
/// on the room actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub players: [PlayerId; 2],
    pub scores: [u32; 2],
    pub answered: [usize; 2],
    pub turn: PlayerId,
    pub phase: RoomPhase,
    pub current_round: u32,
    pub total_rounds: u32,
    pub current_topic: Option<String>,
    pub current_level: Option<u8>,
    pub abandoned_by: Option<PlayerId>,
    pub result: Option<MatchResult>,
}

impl RoomSnapshot {
    fn seat_of(&self, player: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p == player)
    }

    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.seat_of(player).is_some()
    }

    /// The other player, if `player` is in the room.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        self.seat_of(player).map(|seat| &self.players[1 - seat])
    }

    pub fn score_of(&self, player: &PlayerId) -> Option<u32> {
        self.seat_of(player).map(|seat| self.scores[seat])
    }

    /// What `player` should be doing right now.
    pub fn status_for(&self, player: &PlayerId) -> StatusReport {
        let Some(seat) = self.seat_of(player) else {
            return StatusReport::RoomNotFoundOrNotMember;
        };

        match self.phase {
            RoomPhase::Finished => StatusReport::MatchFinished,
            RoomPhase::WaitingForTopicSelection if &self.turn == player => {
                StatusReport::MyTurnToSelect
            }
            RoomPhase::WaitingForTopicSelection => {
                StatusReport::WaitingForOpponentToSelect
            }
            // The answer that fills both cursors also closes the round, so
            // a snapshot never shows InProgress with both players done.
            // RoundComplete reaches the closing player via AnswerOutcome.
            RoomPhase::InProgress if self.answered[seat] < QUESTIONS_PER_ROUND => {
                StatusReport::GoToQuestions
            }
            RoomPhase::InProgress => StatusReport::WaitingForOpponentToAnswer,
        }
    }

    /// Where a freshly matched `player` should be sent.
    pub fn next_action_for(&self, player: &PlayerId) -> Option<NextAction> {
        self.seat_of(player)?;
        Some(match self.phase {
            RoomPhase::WaitingForTopicSelection if &self.turn == player => {
                NextAction::SelectTopic
            }
            RoomPhase::WaitingForTopicSelection => NextAction::WaitForSelection,
            RoomPhase::InProgress => NextAction::AnswerQuestions,
            RoomPhase::Finished => NextAction::ViewResult,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `DuelState`.
    //!
    //! Every question in the test catalog has option 0 correct, so the
    //! random draw never changes which answers score.

    use std::collections::{BTreeSet, HashMap};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const BONUS: &str = "10-Point Question";

    /// Question pools keyed by (topic, level). Records keep whatever level
    /// they were built with, so a test can file a record under a level it
    /// doesn't declare.
    #[derive(Default)]
    struct MemorySource {
        pools: HashMap<(String, u8), Vec<QuestionRecord>>,
    }

    impl MemorySource {
        fn with_pool(mut self, topic: &str, level: u8, count: usize) -> Self {
            self.add(topic, level, level, count);
            self
        }

        fn add(&mut self, topic: &str, level: u8, record_level: u8, count: usize) {
            let pool = self.pools.entry((topic.to_string(), level)).or_default();
            for i in 0..count {
                pool.push(QuestionRecord {
                    text: format!("{topic} L{level} #{i}"),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct: 0,
                    level: record_level,
                    category: topic.to_string(),
                    time_limit_secs: 60,
                });
            }
        }
    }

    impl QuestionSource for MemorySource {
        fn list_topics(&self) -> BTreeSet<String> {
            self.pools.keys().map(|(t, _)| t.clone()).collect()
        }

        fn list_levels(&self, topic: &str) -> BTreeSet<u8> {
            self.pools
                .keys()
                .filter(|(t, _)| t == topic)
                .map(|(_, l)| *l)
                .collect()
        }

        fn find(&self, topic: &str, level: u8) -> Vec<QuestionRecord> {
            self.pools
                .get(&(topic.to_string(), level))
                .cloned()
                .unwrap_or_default()
        }
    }

    fn source() -> MemorySource {
        MemorySource::default()
            .with_pool("Geography", 1, 5)
            .with_pool("Geography", 2, 3)
            .with_pool("Geography", 3, 3)
            .with_pool("History", 4, 2)
            .with_pool(BONUS, BONUS_LEVEL, 3)
    }

    fn pid(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    /// Alice in seat 0 selects first.
    fn duel() -> DuelState {
        DuelState::new(
            RoomId(1),
            [pid("alice"), pid("bob")],
            0,
            DuelConfig::default(),
        )
        .unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    /// Answers all three questions for `player`, the first `correct` of
    /// them correctly.
    fn answer_round(state: &mut DuelState, player: &str, correct: usize) {
        for i in 0..QUESTIONS_PER_ROUND {
            let option = if i < correct { 0 } else { 1 };
            state.submit_answer(&pid(player), option).unwrap();
        }
    }

    // =====================================================================
    // new()
    // =====================================================================

    #[test]
    fn test_new_same_player_twice_returns_error() {
        let result = DuelState::new(
            RoomId(1),
            [pid("alice"), pid("alice")],
            0,
            DuelConfig::default(),
        );
        assert!(matches!(result, Err(RoomError::SamePlayer(_))));
    }

    #[test]
    fn test_new_starts_waiting_with_zeroed_counters() {
        let state = duel();
        assert_eq!(state.phase(), RoomPhase::WaitingForTopicSelection);
        assert_eq!(state.current_round(), 0);
        assert_eq!(state.turn(), &pid("alice"));
        assert_eq!(state.score_of(&pid("bob")), Some(0));
        assert_eq!(state.answered_by(&pid("alice")), Some(0));
        assert!(!state.bonus_used(&pid("alice")));
    }

    #[test]
    fn test_new_first_turn_selects_seat() {
        let state = DuelState::new(
            RoomId(1),
            [pid("alice"), pid("bob")],
            1,
            DuelConfig::default(),
        )
        .unwrap();
        assert_eq!(state.turn(), &pid("bob"));
    }

    // =====================================================================
    // select_topic()
    // =====================================================================

    #[test]
    fn test_select_topic_valid_starts_round() {
        let mut state = duel();

        let started = state
            .select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng())
            .expect("should succeed");

        assert_eq!(started.round, 1);
        assert_eq!(started.level, 1);
        assert_eq!(state.phase(), RoomPhase::InProgress);
        assert_eq!(state.current_round(), 1);
        assert!(state.has_used(&pid("alice"), "Geography", 1));
        assert!(!state.has_used(&pid("bob"), "Geography", 1));
        assert!(state.round_started_at().is_some());
    }

    #[test]
    fn test_select_topic_draws_distinct_questions() {
        let mut state = duel();
        state
            .select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng())
            .unwrap();

        let round = state.round.as_ref().unwrap();
        let texts: HashSet<&str> =
            round.questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts.len(), QUESTIONS_PER_ROUND);
        assert!(round.questions.iter().all(|q| q.category == "Geography"));
    }

    #[test]
    fn test_select_topic_not_your_turn_rejected() {
        let mut state = duel();

        let result =
            state.select_topic(&pid("bob"), "Geography", 1, &source(), &mut rng());

        assert!(matches!(result, Err(RoomError::NotYourTurn(ref p, _)) if *p == pid("bob")));
        assert_eq!(state.phase(), RoomPhase::WaitingForTopicSelection);
        assert_eq!(state.current_round(), 0);
    }

    #[test]
    fn test_select_topic_non_member_rejected() {
        let mut state = duel();
        let result =
            state.select_topic(&pid("eve"), "Geography", 1, &source(), &mut rng());
        assert!(matches!(result, Err(RoomError::NotMember(..))));
    }

    #[test]
    fn test_select_topic_unknown_topic_and_level_rejected() {
        let mut state = duel();
        let src = source();

        let topic = state.select_topic(&pid("alice"), "Cooking", 1, &src, &mut rng());
        assert!(matches!(
            topic,
            Err(RoomError::InvalidSelection(SelectionRejection::UnknownTopic(_)))
        ));

        let level = state.select_topic(&pid("alice"), "Geography", 9, &src, &mut rng());
        assert!(matches!(
            level,
            Err(RoomError::InvalidSelection(SelectionRejection::UnknownLevel { level: 9, .. }))
        ));
        assert_eq!(state.phase(), RoomPhase::WaitingForTopicSelection);
    }

    #[test]
    fn test_select_topic_insufficient_pool_rejected_without_side_effects() {
        let mut state = duel();

        let result =
            state.select_topic(&pid("alice"), "History", 4, &source(), &mut rng());

        assert!(matches!(
            result,
            Err(RoomError::InvalidSelection(
                SelectionRejection::InsufficientQuestions { available: 2, required: 3, .. }
            ))
        ));
        assert_eq!(state.current_round(), 0);
        assert_eq!(state.turn(), &pid("alice"));
        assert!(!state.has_used(&pid("alice"), "History", 4));
    }

    #[test]
    fn test_select_topic_reused_combination_rejected() {
        let mut state = duel();
        let src = source();
        // Round 1 by alice, round 2 by bob, then alice again.
        state.select_topic(&pid("alice"), "Geography", 1, &src, &mut rng()).unwrap();
        answer_round(&mut state, "alice", 0);
        answer_round(&mut state, "bob", 0);
        state.select_topic(&pid("bob"), "Geography", 1, &src, &mut rng()).unwrap();
        answer_round(&mut state, "alice", 0);
        answer_round(&mut state, "bob", 0);

        let result = state.select_topic(&pid("alice"), "Geography", 1, &src, &mut rng());

        assert!(matches!(
            result,
            Err(RoomError::InvalidSelection(SelectionRejection::CombinationUsed { .. }))
        ));
        assert_eq!(state.phase(), RoomPhase::WaitingForTopicSelection);
        assert_eq!(state.current_round(), 2);
        assert_eq!(state.turn(), &pid("alice"));
    }

    #[test]
    fn test_select_topic_bonus_forces_level_and_spends_pick() {
        let mut state = duel();

        let started = state
            .select_topic(&pid("alice"), BONUS, 3, &source(), &mut rng())
            .unwrap();

        assert_eq!(started.level, BONUS_LEVEL);
        assert!(state.bonus_used(&pid("alice")));
        assert!(!state.has_used(&pid("alice"), BONUS, BONUS_LEVEL));
    }

    #[test]
    fn test_select_topic_bonus_twice_rejected() {
        let mut state = duel();
        let src = source();
        state.select_topic(&pid("alice"), BONUS, 0, &src, &mut rng()).unwrap();
        answer_round(&mut state, "alice", 0);
        answer_round(&mut state, "bob", 0);
        state.select_topic(&pid("bob"), "Geography", 2, &src, &mut rng()).unwrap();
        answer_round(&mut state, "alice", 0);
        answer_round(&mut state, "bob", 0);

        let result = state.select_topic(&pid("alice"), BONUS, 7, &src, &mut rng());

        assert!(matches!(
            result,
            Err(RoomError::InvalidSelection(SelectionRejection::BonusUsed))
        ));
    }

    // =====================================================================
    // submit_answer()
    // =====================================================================

    #[test]
    fn test_submit_answer_before_selection_is_invalid_phase() {
        let mut state = duel();
        let result = state.submit_answer(&pid("alice"), 0);
        assert!(matches!(result, Err(RoomError::InvalidPhase { .. })));
    }

    #[test]
    fn test_submit_answer_correct_adds_level() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 2, &source(), &mut rng()).unwrap();

        let outcome = state.submit_answer(&pid("bob"), 0).unwrap();

        assert!(outcome.correct);
        assert_eq!(outcome.points_awarded, 2);
        assert_eq!(outcome.score, 2);
        assert_eq!(outcome.progress, AnswerProgress::MoreQuestions);
        assert_eq!(state.score_of(&pid("bob")), Some(2));
        assert_eq!(state.answered_by(&pid("bob")), Some(1));
        assert_eq!(state.answered_by(&pid("alice")), Some(0));
    }

    #[test]
    fn test_submit_answer_wrong_adds_nothing() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 2, &source(), &mut rng()).unwrap();

        let outcome = state.submit_answer(&pid("alice"), 3).unwrap();

        assert!(!outcome.correct);
        assert_eq!(outcome.correct_option, 0);
        assert_eq!(outcome.points_awarded, 0);
        assert_eq!(state.answered_by(&pid("alice")), Some(1));
    }

    #[test]
    fn test_submit_answer_bonus_awards_fixed_points_whatever_the_record_level() {
        let mut src = MemorySource::default();
        // Filed under the bonus level but declaring level 1.
        src.add(BONUS, BONUS_LEVEL, 1, 3);
        let mut state = duel();
        state.select_topic(&pid("alice"), BONUS, 0, &src, &mut rng()).unwrap();

        let outcome = state.submit_answer(&pid("alice"), 0).unwrap();

        assert_eq!(outcome.points_awarded, 10);
    }

    #[test]
    fn test_submit_answer_out_of_range_leaves_state_unchanged() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng()).unwrap();

        let result = state.submit_answer(&pid("alice"), 4);

        assert!(matches!(
            result,
            Err(RoomError::InvalidAnswer(
                AnswerRejection::OptionOutOfRange { option: 4, options: 4 }
            ))
        ));
        assert_eq!(state.answered_by(&pid("alice")), Some(0));
        assert_eq!(state.score_of(&pid("alice")), Some(0));
    }

    #[test]
    fn test_submit_answer_past_last_question_rejected() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng()).unwrap();
        answer_round(&mut state, "alice", 3);

        let result = state.submit_answer(&pid("alice"), 0);

        assert!(matches!(
            result,
            Err(RoomError::InvalidAnswer(AnswerRejection::NothingToAnswer))
        ));
        assert_eq!(state.score_of(&pid("alice")), Some(3));
    }

    #[test]
    fn test_submit_answer_players_progress_independently() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng()).unwrap();

        state.submit_answer(&pid("bob"), 0).unwrap();
        state.submit_answer(&pid("bob"), 0).unwrap();
        let last = state.submit_answer(&pid("bob"), 0).unwrap();

        assert_eq!(last.progress, AnswerProgress::WaitingForOpponent);
        assert_eq!(state.phase(), RoomPhase::InProgress);
        assert_eq!(state.answered_by(&pid("alice")), Some(0));
    }

    #[test]
    fn test_round_complete_flips_turn_and_waits_for_selection() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng()).unwrap();
        answer_round(&mut state, "alice", 2);
        state.submit_answer(&pid("bob"), 0).unwrap();
        state.submit_answer(&pid("bob"), 1).unwrap();

        let outcome = state.submit_answer(&pid("bob"), 1).unwrap();

        assert_eq!(outcome.progress, AnswerProgress::RoundComplete);
        assert_eq!(state.phase(), RoomPhase::WaitingForTopicSelection);
        assert_eq!(state.turn(), &pid("bob"));
        assert_eq!(state.current_round(), 1);
        assert_eq!(state.score_of(&pid("alice")), Some(2));
        assert_eq!(state.score_of(&pid("bob")), Some(1));
    }

    #[test]
    fn test_status_for_after_round_closes_points_at_next_selection() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng()).unwrap();
        answer_round(&mut state, "alice", 0);
        let waiting = state.snapshot();
        answer_round(&mut state, "bob", 0);

        let closed = state.snapshot();

        assert_eq!(waiting.status_for(&pid("alice")), StatusReport::WaitingForOpponentToAnswer);
        assert_eq!(waiting.status_for(&pid("bob")), StatusReport::GoToQuestions);
        assert_eq!(closed.status_for(&pid("bob")), StatusReport::MyTurnToSelect);
        assert_eq!(closed.status_for(&pid("alice")), StatusReport::WaitingForOpponentToSelect);
    }

    #[test]
    fn test_full_duel_alternates_selectors_and_finishes() {
        let mut state = duel();
        let src = source();
        let mut selections = HashMap::<PlayerId, u32>::new();

        for round in 1..=6u32 {
            let selector = state.turn().clone();
            let level = ((round + 1) / 2) as u8; // 1,1,2,2,3,3
            state
                .select_topic(&selector, "Geography", level, &src, &mut rng())
                .unwrap();
            *selections.entry(selector).or_default() += 1;
            answer_round(&mut state, "alice", 1);
            answer_round(&mut state, "bob", 0);
        }

        assert_eq!(state.phase(), RoomPhase::Finished);
        assert_eq!(state.current_round(), 6);
        assert_eq!(selections[&pid("alice")], 3);
        assert_eq!(selections[&pid("bob")], 3);
        assert!(state.needs_settlement());
        // One correct answer per round at levels 1,1,2,2,3,3.
        assert_eq!(state.score_of(&pid("alice")), Some(12));
        assert_eq!(state.score_of(&pid("bob")), Some(0));
    }

    #[test]
    fn test_finished_room_rejects_selection_and_answers() {
        let mut state = duel();
        state.abandon(&pid("bob")).unwrap();

        let select =
            state.select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng());
        let answer = state.submit_answer(&pid("alice"), 0);

        assert!(matches!(select, Err(RoomError::InvalidPhase { phase: RoomPhase::Finished, .. })));
        assert!(matches!(answer, Err(RoomError::InvalidPhase { phase: RoomPhase::Finished, .. })));
    }

    // =====================================================================
    // abandon() / settlement bookkeeping
    // =====================================================================

    #[test]
    fn test_abandon_finishes_once() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng()).unwrap();

        assert!(state.abandon(&pid("bob")).unwrap());
        assert!(!state.abandon(&pid("bob")).unwrap());
        assert_eq!(state.phase(), RoomPhase::Finished);
        assert_eq!(state.abandoned_by(), Some(&pid("bob")));
    }

    #[test]
    fn test_abandon_non_member_rejected() {
        let mut state = duel();
        assert!(matches!(state.abandon(&pid("eve")), Err(RoomError::NotMember(..))));
        assert_eq!(state.phase(), RoomPhase::WaitingForTopicSelection);
    }

    #[test]
    fn test_record_result_keeps_first() {
        let mut state = duel();
        state.abandon(&pid("bob")).unwrap();
        let result = MatchResult {
            room_id: RoomId(1),
            standings: state.standings(),
            outcome: quizduel_protocol::MatchOutcome::Draw,
            rounds_played: 0,
            total_rounds: 6,
            abandoned_by: Some(pid("bob")),
        };

        state.record_result(result.clone());
        let mut second = result.clone();
        second.rounds_played = 99;
        state.record_result(second);

        assert!(!state.needs_settlement());
        assert_eq!(state.result(), Some(&result));
    }

    // =====================================================================
    // selection_menu() / current_question()
    // =====================================================================

    #[test]
    fn test_selection_menu_reports_counts_and_used_picks() {
        let mut state = duel();
        let src = source();
        state.select_topic(&pid("alice"), "Geography", 1, &src, &mut rng()).unwrap();

        let menu = state.selection_menu(&pid("alice"), &src).unwrap();

        assert_eq!(menu.round, 2);
        assert!(menu.is_my_turn);
        assert!(!menu.bonus_used);
        let geo = menu.topics.iter().find(|t| t.topic == "Geography").unwrap();
        let l1 = geo.levels.iter().find(|l| l.level == 1).unwrap();
        assert_eq!(l1.question_count, 5);
        assert!(l1.used);
        let history = menu.topics.iter().find(|t| t.topic == "History").unwrap();
        assert_eq!(history.levels[0].question_count, 2);
        let bonus = menu.topics.iter().find(|t| t.topic == BONUS).unwrap();
        assert!(bonus.is_bonus);

        let bobs = state.selection_menu(&pid("bob"), &src).unwrap();
        assert!(!bobs.is_my_turn);
        assert_eq!(bobs.turn, pid("alice"));
    }

    #[test]
    fn test_current_question_follows_player_cursor() {
        let mut state = duel();
        state.select_topic(&pid("alice"), "Geography", 2, &source(), &mut rng()).unwrap();
        state.submit_answer(&pid("alice"), 0).unwrap();

        let alice_q = state.current_question(&pid("alice")).unwrap().unwrap();
        let bob_q = state.current_question(&pid("bob")).unwrap().unwrap();

        assert_eq!(alice_q.number, 2);
        assert_eq!(bob_q.number, 1);
        assert_eq!(alice_q.of, 3);
        assert_eq!(alice_q.topic, "Geography");
        assert_eq!(alice_q.level, 2);
        assert_eq!(alice_q.options.len(), 4);
    }

    #[test]
    fn test_current_question_none_when_not_answering() {
        let state = duel();
        assert_eq!(state.current_question(&pid("alice")).unwrap(), None);
    }

    // =====================================================================
    // RoomSnapshot::status_for()
    // =====================================================================

    #[test]
    fn test_status_for_tracks_every_phase() {
        let mut state = duel();
        let snap = state.snapshot();
        assert_eq!(snap.status_for(&pid("alice")), StatusReport::MyTurnToSelect);
        assert_eq!(snap.status_for(&pid("bob")), StatusReport::WaitingForOpponentToSelect);
        assert_eq!(snap.status_for(&pid("eve")), StatusReport::RoomNotFoundOrNotMember);
        assert_eq!(snap.next_action_for(&pid("alice")), Some(NextAction::SelectTopic));
        assert_eq!(snap.next_action_for(&pid("bob")), Some(NextAction::WaitForSelection));

        state.select_topic(&pid("alice"), "Geography", 1, &source(), &mut rng()).unwrap();
        answer_round(&mut state, "alice", 0);
        let snap = state.snapshot();
        assert_eq!(snap.status_for(&pid("alice")), StatusReport::WaitingForOpponentToAnswer);
        assert_eq!(snap.status_for(&pid("bob")), StatusReport::GoToQuestions);
        assert_eq!(snap.next_action_for(&pid("bob")), Some(NextAction::AnswerQuestions));
        assert_eq!(snap.current_topic.as_deref(), Some("Geography"));

        state.abandon(&pid("bob")).unwrap();
        let snap = state.snapshot();
        assert_eq!(snap.status_for(&pid("alice")), StatusReport::MatchFinished);
        assert_eq!(snap.next_action_for(&pid("alice")), Some(NextAction::ViewResult));
        assert_eq!(snap.opponent_of(&pid("alice")), Some(&pid("bob")));
    }
}
