//! Two bots play one duel against an in-process `DuelService`.
//!
//! Usage: `quiz-duel-sim [questions.json]`. Without an argument the bundled
//! catalog is used. Set `RUST_LOG=debug` to watch every room transition.

use std::sync::Arc;
use std::time::Duration;

use quizduel::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing_subscriber::EnvFilter;

const BUNDLED_CATALOG: &str = include_str!("../questions.json");

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a waiting bot blocks on room updates before polling anyway.
const WAIT_SLICE: Duration = Duration::from_millis(500);

/// Ways a simulated duel can go wrong.
#[derive(Debug, thiserror::Error)]
enum SimError {
    #[error(transparent)]
    Duel(#[from] DuelError),

    #[error("{0} has nothing left to pick")]
    NothingToPick(PlayerId),

    #[error("{0} finished without a result")]
    NoResult(RoomId),

    #[error("bot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

/// A scripted player: queues, picks random playable topics, and answers at
/// random.
struct Bot {
    id: PlayerId,
    rng: StdRng,
    /// Chance of spending the bonus pick when it is on the menu.
    bonus_appetite: f64,
}

impl Bot {
    fn new(name: &str, seed: u64) -> Self {
        Self {
            id: PlayerId::new(name),
            rng: StdRng::seed_from_u64(seed),
            bonus_appetite: 0.4,
        }
    }

    async fn find_match(
        &self,
        service: &DuelService,
    ) -> Result<RoomId, SimError> {
        service.enqueue(&self.id).await?;
        loop {
            match service.check_match_status(&self.id).await? {
                StatusReport::FoundMatch {
                    room_id,
                    next_action,
                } => {
                    tracing::info!(
                        player = %self.id,
                        %room_id,
                        ?next_action,
                        "matched"
                    );
                    return Ok(room_id);
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }

    fn choose(&mut self, menu: &SelectionMenu) -> Option<(String, u8)> {
        let playable: Vec<(&TopicChoice, u8)> = menu
            .topics
            .iter()
            .flat_map(|t| {
                t.levels
                    .iter()
                    .filter(|l| {
                        !l.used && l.question_count >= QUESTIONS_PER_ROUND
                    })
                    .map(move |l| (t, l.level))
            })
            .filter(|(t, _)| !(t.is_bonus && menu.bonus_used))
            .collect();

        let wants_bonus = self.rng.random_bool(self.bonus_appetite);
        let bonus = playable.iter().find(|(t, _)| t.is_bonus);
        let pick = match bonus {
            Some(choice) if wants_bonus => Some(choice),
            _ => {
                let normal: Vec<_> =
                    playable.iter().filter(|(t, _)| !t.is_bonus).collect();
                normal.choose(&mut self.rng).copied()
            }
        };
        pick.map(|(t, level)| (t.topic.clone(), *level))
    }

    async fn play(
        mut self,
        service: Arc<DuelService>,
    ) -> Result<MatchResult, SimError> {
        let room = self.find_match(&service).await?;
        let mut updates = service.subscribe(room, &self.id).await?;

        loop {
            match service.round_status(room, &self.id).await {
                StatusReport::MyTurnToSelect => {
                    let menu = service.selection_menu(room, &self.id).await?;
                    let (topic, level) = self
                        .choose(&menu)
                        .ok_or_else(|| SimError::NothingToPick(self.id.clone()))?;
                    let started = service
                        .select_topic(room, &self.id, &topic, level)
                        .await?;
                    tracing::info!(
                        player = %self.id,
                        round = started.round,
                        topic = %started.topic,
                        level = started.level,
                        "topic selected"
                    );
                }
                StatusReport::GoToQuestions => {
                    while let Some(question) =
                        service.current_question(room, &self.id).await?
                    {
                        let option =
                            self.rng.random_range(0..question.options.len());
                        let outcome = service
                            .submit_answer(room, &self.id, option)
                            .await?;
                        tracing::debug!(
                            player = %self.id,
                            round = question.round,
                            number = question.number,
                            correct = outcome.correct,
                            score = outcome.score,
                            "answered"
                        );
                    }
                }
                StatusReport::MatchFinished => {
                    return service
                        .match_result(room, &self.id)
                        .await?
                        .ok_or(SimError::NoResult(room));
                }
                StatusReport::RoomNotFoundOrNotMember => {
                    return Err(DuelError::from(RoomError::NotFound(room)).into());
                }
                _ => {
                    // Either the opponent wakes us or we poll again to stay present.
                    let _ =
                        tokio::time::timeout(WAIT_SLICE, updates.changed()).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn build_service(
    catalog: QuestionCatalog,
    ledger: Arc<ScoreLedger>,
) -> Result<DuelService, DuelError> {
    DuelService::builder()
        .questions(Arc::new(catalog))
        .scores(ledger)
        .build()
}

async fn run_duel(
    service: Arc<DuelService>,
    seeds: [u64; 2],
) -> Result<[MatchResult; 2], SimError> {
    let alice = tokio::spawn(Bot::new("alice", seeds[0]).play(service.clone()));
    let bob = tokio::spawn(Bot::new("bob", seeds[1]).play(service.clone()));

    let (alice, bob) = tokio::join!(alice, bob);
    Ok([alice??, bob??])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let catalog = match std::env::args().nth(1) {
        Some(path) => QuestionCatalog::from_path(path)?,
        None => QuestionCatalog::from_json(BUNDLED_CATALOG.as_bytes())?,
    };

    let ledger = Arc::new(ScoreLedger::new());
    let service = Arc::new(build_service(catalog, ledger.clone())?);

    let sweeper = {
        let service = service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(5));
            loop {
                interval.tick().await;
                service.maintain().await;
            }
        })
    };

    let seeds = [rand::rng().random(), rand::rng().random()];
    let [result, _] = run_duel(service.clone(), seeds).await?;
    sweeper.abort();

    let json = service.encode(&result)?;
    println!("{}", String::from_utf8_lossy(&json));
    for (player, total) in ledger.leaderboard(10) {
        println!("{player}: {total}");
    }
    Ok(())
}
