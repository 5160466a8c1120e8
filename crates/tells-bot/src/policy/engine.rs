use super::{Policy, ThinkingDelay};
use crate::bot::{
    BeliefStore, BotContext, ChallengeResponder, DecayReport, Decision, DecisionPlanner,
    DecisionReason, ObservationProcessor, ObserveSummary, Personality, decay,
};
use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use tells_core::game::challenge::{Challenge, Response};
use tells_core::game::event::Observation;
use tells_core::model::board::BoardSnapshot;
use tells_core::model::seat::Seat;
use tells_core::model::stone::Stone;
use tracing::{Level, event};

/// Mixed into the engine seed to derive the pacing jitter stream.
const PACER_SALT: u64 = 0x5851_F42D_4C95_7F2D;

/// A non-human player: one seat, one personality and one private memory.
///
/// Each engine owns its beliefs exclusively; the host hands it snapshot copies
/// and never sees the memory.
#[derive(Debug, Clone)]
pub struct MemoryEngine<R = StdRng> {
    seat: Seat,
    personality: Personality,
    beliefs: BeliefStore,
    rng: R,
    delay: ThinkingDelay,
    /// Jitter source for pacing, kept apart so delays never shift `rng`.
    pacer: SmallRng,
}

impl MemoryEngine<StdRng> {
    pub fn new(seat: Seat, personality: Personality, seed: u64) -> Self {
        Self::with_rng(seat, personality, StdRng::seed_from_u64(seed)).with_pacer_seed(seed)
    }
}

impl<R: Rng> MemoryEngine<R> {
    pub fn with_rng(seat: Seat, personality: Personality, rng: R) -> Self {
        Self {
            seat,
            personality,
            beliefs: BeliefStore::default(),
            rng,
            delay: ThinkingDelay::NONE,
            pacer: SmallRng::seed_from_u64(PACER_SALT),
        }
    }

    /// Reseeds the pacing jitter; the decision stream is untouched.
    pub fn with_pacer_seed(mut self, seed: u64) -> Self {
        self.pacer = SmallRng::seed_from_u64(seed ^ PACER_SALT);
        self
    }

    pub fn with_delay(mut self, delay: ThinkingDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn beliefs(&self) -> &BeliefStore {
        &self.beliefs
    }

    pub fn delay(&self) -> ThinkingDelay {
        self.delay
    }

    pub fn observe(&mut self, snapshot: &BoardSnapshot, events: &[Observation]) -> ObserveSummary {
        let processor = ObservationProcessor::new(self.seat, &self.personality);
        let summary = processor.apply_all(&mut self.beliefs, snapshot, events);
        if !events.is_empty() && tracing::enabled!(Level::DEBUG) {
            event!(
                target: "tells_bot::memory",
                Level::DEBUG,
                seat = %self.seat,
                events = events.len(),
                applied = summary.applied,
                ignored = summary.ignored,
                known = self.beliefs.known_count(),
            );
        }
        summary
    }

    pub fn take_turn(&mut self, snapshot: &BoardSnapshot, events: &[Observation]) -> Decision {
        self.observe(snapshot, events);
        let report = decay(&mut self.beliefs, &self.personality, &mut self.rng);
        log_memory(self.seat, &self.beliefs, report);

        let ctx = BotContext::new(self.seat, snapshot, &self.beliefs, &self.personality);
        let (decision, reason) = DecisionPlanner::choose(&ctx, &mut self.rng);
        log_decision(&ctx, decision, reason);
        decision
    }

    pub fn respond(&mut self, snapshot: &BoardSnapshot, challenge: Challenge) -> Response {
        let ctx = BotContext::new(self.seat, snapshot, &self.beliefs, &self.personality);
        let response = ChallengeResponder::respond(&ctx, challenge, &mut self.rng);
        if tracing::enabled!(Level::INFO) {
            let slot = match challenge {
                Challenge::Identify { slot } => Some(slot),
                Challenge::Boast => None,
            };
            event!(
                target: "tells_bot::respond",
                Level::INFO,
                seat = %self.seat,
                personality = %self.personality.name,
                challenge = ?challenge,
                slot = ?slot,
                confidence = slot.map(|s| self.beliefs.confidence(s)).unwrap_or(0.0),
                response = ?response,
            );
        }
        response
    }

    pub fn recite(&mut self, snapshot: &BoardSnapshot) -> Vec<(usize, Stone)> {
        let ctx = BotContext::new(self.seat, snapshot, &self.beliefs, &self.personality);
        ChallengeResponder::recite(&ctx, &mut self.rng)
    }

    /// Replaces the personality and wipes memory in the same step.
    pub fn reset_personality(&mut self, personality: Personality) {
        self.personality = personality;
        self.beliefs.clear_all();
    }

    pub fn reset_match(&mut self) {
        self.beliefs.clear_all();
    }

    /// Same decision as [`take_turn`](Self::take_turn), delivered after a thinking delay.
    ///
    /// The delay is drawn once the decision is made, from a separate jitter
    /// source, so pacing never changes this or any later decision.
    pub async fn take_turn_paced(
        &mut self,
        snapshot: &BoardSnapshot,
        events: &[Observation],
    ) -> Decision {
        let decision = self.take_turn(snapshot, events);
        self.pause().await;
        decision
    }

    pub async fn respond_paced(
        &mut self,
        snapshot: &BoardSnapshot,
        challenge: Challenge,
    ) -> Response {
        let response = self.respond(snapshot, challenge);
        self.pause().await;
        response
    }

    async fn pause(&mut self) {
        let wait = self.delay.draw(&mut self.pacer);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

impl<R: Rng + Send> Policy for MemoryEngine<R> {
    fn seat(&self) -> Seat {
        self.seat
    }

    fn observe(&mut self, snapshot: &BoardSnapshot, events: &[Observation]) {
        MemoryEngine::observe(self, snapshot, events);
    }

    fn take_turn(&mut self, snapshot: &BoardSnapshot, events: &[Observation]) -> Decision {
        MemoryEngine::take_turn(self, snapshot, events)
    }

    fn respond(&mut self, snapshot: &BoardSnapshot, challenge: Challenge) -> Response {
        MemoryEngine::respond(self, snapshot, challenge)
    }

    fn recite(&mut self, snapshot: &BoardSnapshot) -> Vec<(usize, Stone)> {
        MemoryEngine::recite(self, snapshot)
    }

    fn reset_match(&mut self) {
        MemoryEngine::reset_match(self);
    }
}

fn memory_logging_enabled() -> bool {
    std::env::var("TELLS_MEMORY_DETAILS")
        .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false)
}

fn log_memory(seat: Seat, beliefs: &BeliefStore, report: DecayReport) {
    if !tracing::enabled!(Level::DEBUG) || !memory_logging_enabled() {
        return;
    }

    let mut entries = Vec::with_capacity(beliefs.len());
    beliefs.for_each(|slot, belief| {
        if let Some(stone) = belief.guess() {
            entries.push(format!("{slot}:{stone}@{:.2}", belief.confidence()));
        }
    });

    event!(
        target: "tells_bot::memory",
        Level::DEBUG,
        seat = %seat,
        aged = report.aged,
        faded = report.faded,
        forgotten = report.forgotten,
        beliefs = %entries.join(","),
    );
}

fn log_decision(ctx: &BotContext<'_>, decision: Decision, reason: DecisionReason) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let hidden = ctx.snapshot.face_down_slots();
    event!(
        target: "tells_bot::decide",
        Level::INFO,
        seat = %ctx.seat,
        personality = %ctx.personality.name,
        reason = reason.as_str(),
        decision = %decision,
        hidden = hidden.len(),
        mean_hidden_confidence = ctx.beliefs.mean_confidence(&hidden),
        reserve = ctx.snapshot.reserve.len(),
        known = ctx.beliefs.known_count(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tells_core::model::board::{BOARD_SLOTS, SlotView};

    fn hidden_line() -> BoardSnapshot {
        let mut slots = [SlotView::Empty; BOARD_SLOTS];
        for slot in 2..=4 {
            slots[slot] = SlotView::FaceDown;
        }
        BoardSnapshot::new(slots, Vec::new(), true)
    }

    #[test]
    fn fresh_engine_treats_memory_as_empty() {
        let mut engine = MemoryEngine::new(Seat::North, Personality::cautious(), 1);
        assert_eq!(engine.beliefs().known_count(), 0);
        let response = engine.respond(&hidden_line(), Challenge::Identify { slot: 3 });
        assert!(response.stone().is_some());
    }

    #[test]
    fn turn_observes_then_decays_then_decides() {
        let personality = Personality {
            retention: 0.9,
            ..Personality::cautious()
        };
        let mut engine = MemoryEngine::new(Seat::North, personality, 7);
        let snapshot = hidden_line();
        let decision = engine.take_turn(
            &snapshot,
            &[Observation::Peeked {
                slot: 3,
                by: Seat::North,
                stone: Some(Stone::Espada),
            }],
        );
        // 1.0 after the peek, one decay pass leaves 0.9 > 0.85.
        assert!((engine.beliefs().confidence(3) - 0.9).abs() < 1e-6);
        assert_eq!(decision, Decision::Challenge { slot: 3 });
    }

    #[test]
    fn ground_truth_overrides_prior_memory() {
        let mut engine = MemoryEngine::new(Seat::South, Personality::balanced(), 3);
        let snapshot = hidden_line();
        engine.observe(
            &snapshot,
            &[Observation::Placed {
                slot: 2,
                stone: Stone::Corona,
                by: Seat::North,
            }],
        );
        engine.observe(
            &snapshot,
            &[Observation::Revealed {
                slot: 2,
                stone: Stone::Bandera,
            }],
        );
        let belief = engine.beliefs().get(2);
        assert_eq!(belief.guess(), Some(Stone::Bandera));
        assert_eq!(belief.confidence(), 1.0);
    }

    #[test]
    fn personality_swap_clears_memory() {
        let mut engine = MemoryEngine::new(Seat::North, Personality::balanced(), 5);
        engine.observe(
            &hidden_line(),
            &[Observation::Placed {
                slot: 4,
                stone: Stone::Escudo,
                by: Seat::North,
            }],
        );
        assert_eq!(engine.beliefs().known_count(), 1);
        engine.reset_personality(Personality::shuffler());
        assert_eq!(engine.personality(), &Personality::shuffler());
        assert_eq!(engine.beliefs().known_count(), 0);
    }

    #[test]
    fn same_seed_same_turns() {
        let snapshot = hidden_line();
        let events = [Observation::Placed {
            slot: 2,
            stone: Stone::Martillo,
            by: Seat::South,
        }];
        let mut a = MemoryEngine::new(Seat::North, Personality::reckless(), 99);
        let mut b = MemoryEngine::new(Seat::North, Personality::reckless(), 99);
        for _ in 0..5 {
            assert_eq!(a.take_turn(&snapshot, &events), b.take_turn(&snapshot, &events));
        }
        assert_eq!(a.beliefs(), b.beliefs());
    }

    #[tokio::test(start_paused = true)]
    async fn paced_turn_matches_unpaced_decision() {
        let snapshot = hidden_line();
        let mut plain = MemoryEngine::new(Seat::North, Personality::balanced(), 12);
        let mut paced = MemoryEngine::new(Seat::North, Personality::balanced(), 12)
            .with_delay(ThinkingDelay::between(200, 800));

        let start = tokio::time::Instant::now();
        let expected = plain.take_turn(&snapshot, &[]);
        let decision = paced.take_turn_paced(&snapshot, &[]).await;
        assert_eq!(decision, expected);
        assert!(start.elapsed() >= std::time::Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_leaves_later_turns_untouched() {
        let snapshot = hidden_line();
        let events = [Observation::Placed {
            slot: 3,
            stone: Stone::Caballero,
            by: Seat::South,
        }];
        let mut plain = MemoryEngine::new(Seat::North, Personality::shuffler(), 31);
        let mut paced = MemoryEngine::new(Seat::North, Personality::shuffler(), 31)
            .with_delay(ThinkingDelay::between(10, 50));

        for _ in 0..6 {
            let expected = plain.take_turn(&snapshot, &events);
            assert_eq!(paced.take_turn_paced(&snapshot, &events).await, expected);
        }
        assert_eq!(plain.beliefs(), paced.beliefs());
    }

    #[tokio::test(start_paused = true)]
    async fn same_seed_waits_the_same() {
        async fn waits(seed: u64) -> Vec<std::time::Duration> {
            let snapshot = hidden_line();
            let mut engine = MemoryEngine::new(Seat::North, Personality::balanced(), seed)
                .with_delay(ThinkingDelay::between(10, 100_000));
            let mut waits = Vec::new();
            for _ in 0..4 {
                let start = tokio::time::Instant::now();
                engine.take_turn_paced(&snapshot, &[]).await;
                waits.push(start.elapsed());
            }
            waits
        }

        let first = waits(7).await;
        assert_eq!(first, waits(7).await);
        assert_ne!(first, waits(8).await);
        assert!(first.iter().all(|wait| *wait >= std::time::Duration::from_millis(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn paced_response_resolves() {
        let snapshot = hidden_line();
        let mut engine = MemoryEngine::new(Seat::South, Personality::balanced(), 4)
            .with_delay(ThinkingDelay::fixed(300));
        let response = engine.respond_paced(&snapshot, Challenge::Boast).await;
        assert!(response.judgment().is_some());
    }
}
