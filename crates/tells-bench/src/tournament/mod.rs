mod seating;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use tells_bot::{MemoryEngine, Personality, ProfileError, ThinkingDelay};
use tells_core::game::action::ActionKind;
use tells_core::game::challenge::{Challenge, Judgment, Response};
use tells_core::game::event::Observation;
use tells_core::game::match_state::{ActionOutcome, MatchState};
use tells_core::model::board::BoardSnapshot;
use tells_core::model::seat::Seat;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use crate::config::{AgentConfig, BenchmarkConfig, ResolvedOutputs};

pub use seating::SeatRotation;

/// Upper bound on one paced engine call, well above the pacing ceiling.
const DECISION_TIMEOUT: Duration = Duration::from_secs(30);

/// Mixed into the match seed so the two engines never share a stream.
const SEAT_SALT: [u64; 2] = [0x9E37_79B9_7F4A_7C15, 0xC2B2_AE3D_27D4_EB4F];

/// Primary entry point for running a two-engine series.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    rotation: SeatRotation,
    pacing: ThinkingDelay,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub matches_played: usize,
    pub draws: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub analytics: AnalyticsSummary,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        if agents.len() != Seat::BOTH.len() {
            return Err(RunnerError::SeatCount {
                found: agents.len(),
            });
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            rotation: SeatRotation::new(config.matches.alternate_seats),
            pacing: config.pacing.delay(),
            config,
            outputs,
            agents,
        })
    }

    /// Play every configured match, streaming one JSONL row per match to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.matches.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(&self.config);
        let mut rows_written = 0usize;
        let mut draws = 0usize;

        for match_index in 0..self.config.matches.count {
            let match_seed = rng.next_u64();
            let seating = self.rotation.seating(match_index);
            let outcome = runtime.block_on(self.play_match(match_index, match_seed, seating))?;

            if outcome.winner.is_none() {
                draws += 1;
            }
            analytics.record_match(&outcome)?;
            write_match_row(&mut writer, &self.config.run_id, &outcome)?;
            rows_written += 1;
        }

        writer.flush()?;

        let analytics = analytics.finalize();
        analytics.write_markdown(&self.outputs.summary_md)?;

        Ok(RunSummary {
            matches_played: self.config.matches.count,
            draws,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            analytics,
        })
    }

    async fn play_match(
        &self,
        match_index: usize,
        match_seed: u64,
        seating: [usize; 2],
    ) -> Result<MatchOutcome, RunnerError> {
        let mut state = MatchState::with_seed(Seat::North, match_seed)
            .with_target_score(self.config.matches.target_score);
        let mut seats = Seat::BOTH.map(|seat| {
            SeatState::new(
                seat,
                &self.agents[seating[seat.index()]],
                match_seed ^ SEAT_SALT[seat.index()],
                self.pacing,
            )
        });

        if let Some(opening) = state.opening() {
            for seat in &mut seats {
                seat.pending.push(opening);
            }
        }

        let mut turns = 0usize;
        while !state.is_finished() && turns < self.config.matches.max_turns {
            turns += 1;
            let mover = state.to_move();
            let defender = mover.opponent();
            let view = state.view();

            let decision = {
                let seat = &mut seats[mover.index()];
                let events = std::mem::take(&mut seat.pending);
                let start = Instant::now();
                let decision = tokio::time::timeout(
                    DECISION_TIMEOUT,
                    seat.engine.take_turn_paced(&view, &events),
                )
                .await
                .map_err(|_| RunnerError::Stalled {
                    agent: seat.agent_name.clone(),
                })?;
                let elapsed_ms = seat.metrics.record(start.elapsed());
                seat.tally.note_decision(decision.kind());

                if self.logging_enabled && tracing::enabled!(Level::DEBUG) {
                    event!(
                        target: "tells_bench::turn",
                        Level::DEBUG,
                        run_id = %self.config.run_id,
                        match_index = match_index as u32,
                        turn = turns as u32,
                        seat = seat_label(mover),
                        agent = %seat.agent_name,
                        decision = %decision,
                        elapsed_ms
                    );
                }

                decision
            };

            let outcome = state.apply(mover, &decision).map_err(|err| {
                RunnerError::game(format!("illegal {decision} from {mover}: {err:?}"))
            })?;

            let broadcast = match outcome {
                ActionOutcome::Applied(broadcast) => broadcast,
                ActionOutcome::AwaitingAnswer { slot } => {
                    let answer = seats[defender.index()]
                        .answer(&view, Challenge::Identify { slot })
                        .await?
                        .stone()
                        .ok_or_else(|| {
                            RunnerError::game(format!(
                                "{defender} answered the challenge on slot {slot} without a stone"
                            ))
                        })?;
                    let result = state
                        .resolve_challenge(mover, slot, answer)
                        .map_err(|err| {
                            RunnerError::game(format!("challenge resolution failed: {err:?}"))
                        })?;
                    seats[mover.index()]
                        .tally
                        .note_challenge(result.scorer == mover);
                    seats[defender.index()].tally.note_answer(result.correct);
                    result.broadcast
                }
                ActionOutcome::AwaitingJudgment => {
                    let judgment = seats[defender.index()]
                        .answer(&view, Challenge::Boast)
                        .await?
                        .judgment()
                        .ok_or_else(|| {
                            RunnerError::game(format!("{defender} judged a boast without a verdict"))
                        })?;
                    let recital = seats[mover.index()].engine.recite(&view);
                    let result = state
                        .resolve_boast(mover, judgment, &recital)
                        .map_err(|err| {
                            RunnerError::game(format!("boast resolution failed: {err:?}"))
                        })?;
                    let upheld =
                        judgment == Judgment::Believe || result.recital_correct == Some(true);
                    seats[mover.index()].tally.note_boast(upheld);
                    result.broadcast
                }
            };

            for seat in &mut seats {
                seat.pending.extend_from_slice(broadcast.for_seat(seat.seat));
            }
        }

        let scores = state.scores();
        let winner_seat = state.winner();
        let winner = winner_seat.map(|seat| seats[seat.index()].agent_name.clone());
        let seating = seats
            .iter()
            .map(|seat| SeatSnapshot {
                seat: seat_label(seat.seat).to_string(),
                bot: seat.agent_name.clone(),
            })
            .collect();

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "tells_bench::match",
                Level::INFO,
                run_id = %self.config.run_id,
                match_index = match_index as u32,
                match_seed,
                winner = winner.as_deref().unwrap_or("<draw>"),
                north_score = u32::from(scores[Seat::North.index()]),
                south_score = u32::from(scores[Seat::South.index()]),
                turns = turns as u32
            );
        }

        let seat_results = seats
            .into_iter()
            .map(|seat| SeatResult {
                score: scores[seat.seat.index()],
                won: winner_seat == Some(seat.seat),
                personality: seat.engine.personality().name.clone(),
                agent_name: seat.agent_name,
                seat: seat.seat,
                metrics: seat.metrics.finalize(),
                tally: seat.tally,
            })
            .collect();

        Ok(MatchOutcome {
            match_index,
            seed: match_seed,
            seating,
            seat_results,
            winner,
            turns,
            finished: state.is_finished(),
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_match_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    outcome: &MatchOutcome,
) -> Result<(), RunnerError> {
    let agents = outcome
        .seat_results
        .iter()
        .map(|result| AgentLogRow {
            agent: &result.agent_name,
            personality: &result.personality,
            seat: seat_label(result.seat),
            score: result.score,
            won: result.won,
            decisions: result.metrics.decisions,
            speed_ms_turn: result.metrics.avg_ms_per_decision,
            decision_kinds: &result.tally.decision_kinds,
            challenges: result.tally.challenges,
            challenge_accuracy: result.tally.challenge_accuracy(),
            answers: result.tally.answers,
            answers_correct: result.tally.answers_correct,
            boasts: result.tally.boasts,
            boasts_upheld: result.tally.boasts_upheld,
        })
        .collect();

    let row = MatchLogRow {
        run_id,
        match_id: format!("M{:05}", outcome.match_index),
        match_index: outcome.match_index,
        match_seed: outcome.seed,
        seating: &outcome.seating,
        winner: outcome.winner.as_deref(),
        turns: outcome.turns,
        finished: outcome.finished,
        agents,
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn seat_label(seat: Seat) -> &'static str {
    match seat {
        Seat::North => "north",
        Seat::South => "south",
    }
}

struct SeatState {
    seat: Seat,
    agent_name: String,
    engine: MemoryEngine,
    pending: Vec<Observation>,
    metrics: DecisionMetrics,
    tally: SeatTally,
}

impl SeatState {
    fn new(seat: Seat, agent: &AgentBlueprint, seed: u64, delay: ThinkingDelay) -> Self {
        Self {
            seat,
            agent_name: agent.name.clone(),
            engine: MemoryEngine::new(seat, agent.personality.clone(), seed).with_delay(delay),
            pending: Vec::new(),
            metrics: DecisionMetrics::default(),
            tally: SeatTally::default(),
        }
    }

    /// Catch up on pending events, then answer out of turn.
    async fn answer(
        &mut self,
        snapshot: &BoardSnapshot,
        challenge: Challenge,
    ) -> Result<Response, RunnerError> {
        let events = std::mem::take(&mut self.pending);
        self.engine.observe(snapshot, &events);
        tokio::time::timeout(
            DECISION_TIMEOUT,
            self.engine.respond_paced(snapshot, challenge),
        )
        .await
        .map_err(|_| RunnerError::Stalled {
            agent: self.agent_name.clone(),
        })
    }
}

pub struct MatchOutcome {
    pub match_index: usize,
    pub seed: u64,
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
    /// Agent name; `None` when the turn limit ran out first.
    pub winner: Option<String>,
    pub turns: usize,
    pub finished: bool,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: String,
    pub bot: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub personality: String,
    pub seat: Seat,
    pub score: u8,
    pub won: bool,
    pub metrics: DecisionSummary,
    pub tally: SeatTally,
}

/// What one seat did over a match, beyond timing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeatTally {
    pub decision_kinds: BTreeMap<&'static str, u32>,
    pub challenges: u32,
    pub challenges_won: u32,
    pub answers: u32,
    pub answers_correct: u32,
    pub boasts: u32,
    pub boasts_upheld: u32,
}

impl SeatTally {
    fn note_decision(&mut self, kind: ActionKind) {
        *self.decision_kinds.entry(kind.as_str()).or_insert(0) += 1;
    }

    fn note_challenge(&mut self, won: bool) {
        self.challenges += 1;
        if won {
            self.challenges_won += 1;
        }
    }

    fn note_answer(&mut self, correct: bool) {
        self.answers += 1;
        if correct {
            self.answers_correct += 1;
        }
    }

    fn note_boast(&mut self, upheld: bool) {
        self.boasts += 1;
        if upheld {
            self.boasts_upheld += 1;
        }
    }

    /// Share of issued challenges that scored; `None` before the first one.
    pub fn challenge_accuracy(&self) -> Option<f64> {
        if self.challenges == 0 {
            None
        } else {
            Some(f64::from(self.challenges_won) / f64::from(self.challenges))
        }
    }
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct MatchLogRow<'a> {
    run_id: &'a str,
    match_id: String,
    match_index: usize,
    match_seed: u64,
    seating: &'a [SeatSnapshot],
    winner: Option<&'a str>,
    turns: usize,
    finished: bool,
    agents: Vec<AgentLogRow<'a>>,
}

#[derive(Serialize)]
struct AgentLogRow<'a> {
    agent: &'a str,
    personality: &'a str,
    seat: &'static str,
    score: u8,
    won: bool,
    decisions: u32,
    speed_ms_turn: f64,
    decision_kinds: &'a BTreeMap<&'static str, u32>,
    challenges: u32,
    challenge_accuracy: Option<f64>,
    answers: u32,
    answers_correct: u32,
    boasts: u32,
    boasts_upheld: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("agent '{agent}' has an invalid personality: {source}")]
    Profile {
        agent: String,
        #[source]
        source: ProfileError,
    },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("match execution failed: {message}")]
    Game { message: String },
    #[error("agent '{agent}' did not answer within the decision timeout")]
    Stalled { agent: String },
    #[error("configuration requires exactly 2 agents but found {found}")]
    SeatCount { found: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: impl Into<String>) -> Self {
        RunnerError::Game {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct AgentBlueprint {
    name: String,
    personality: Personality,
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, RunnerError> {
        configs
            .iter()
            .map(|config| {
                let personality =
                    config
                        .resolve_personality()
                        .map_err(|source| RunnerError::Profile {
                            agent: config.name.clone(),
                            source,
                        })?;
                Ok(Self {
                    name: config.name.clone(),
                    personality,
                })
            })
            .collect()
    }
}
