mod belief;
mod decay;
mod decide;
mod observer;
mod personality;
mod respond;

pub use belief::{Belief, BeliefStore, CERTAIN};
pub use decay::{DecayReport, FORGET_CUTOFF, FORGET_PROBABILITY, decay};
pub use decide::{DecisionPlanner, DecisionReason, LOW_CONFIDENCE};
pub use observer::{IgnoreReason, ObservationEffect, ObservationProcessor, ObserveSummary};
pub use personality::{ActionWeights, Personality, PersonalityKind, ProfileError};
pub use respond::{AnswerSource, ChallengeResponder, MIN_ANSWER_CONFIDENCE};
pub use tells_core::game::action::Action as Decision;

use tells_core::model::board::BoardSnapshot;
use tells_core::model::seat::Seat;

/// Everything a planner may read at one decision point. Nothing here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct BotContext<'a> {
    pub seat: Seat,
    pub snapshot: &'a BoardSnapshot,
    pub beliefs: &'a BeliefStore,
    pub personality: &'a Personality,
}

impl<'a> BotContext<'a> {
    pub fn new(
        seat: Seat,
        snapshot: &'a BoardSnapshot,
        beliefs: &'a BeliefStore,
        personality: &'a Personality,
    ) -> Self {
        Self {
            seat,
            snapshot,
            beliefs,
            personality,
        }
    }

    pub fn belief(&self, slot: usize) -> Belief {
        self.beliefs.get(slot)
    }

    pub fn confidence(&self, slot: usize) -> f32 {
        self.beliefs.confidence(slot)
    }
}
