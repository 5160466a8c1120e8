pub mod bot;
pub mod policy;

pub use bot::{
    ActionWeights, Belief, BeliefStore, BotContext, ChallengeResponder, Decision,
    DecisionPlanner, DecisionReason, ObservationProcessor, Personality, PersonalityKind,
    ProfileError,
};
pub use policy::{MemoryEngine, Policy, ThinkingDelay};
