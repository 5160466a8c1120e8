mod engine;
mod pacing;

pub use engine::MemoryEngine;
pub use pacing::ThinkingDelay;

use crate::bot::Decision;
use tells_core::game::challenge::{Challenge, Response};
use tells_core::game::event::Observation;
use tells_core::model::board::BoardSnapshot;
use tells_core::model::seat::Seat;
use tells_core::model::stone::Stone;

/// Interface the host turn loop drives, once per decision point.
pub trait Policy: Send {
    fn seat(&self) -> Seat;

    /// Reconcile events without acting (the engine is not the mover).
    fn observe(&mut self, snapshot: &BoardSnapshot, events: &[Observation]);

    /// Reconcile events, age memory, then choose exactly one action.
    fn take_turn(&mut self, snapshot: &BoardSnapshot, events: &[Observation]) -> Decision;

    /// Answer a challenge or judge a boast aimed at this seat.
    fn respond(&mut self, snapshot: &BoardSnapshot, challenge: Challenge) -> Response;

    /// Name every hidden stone to back up a doubted boast.
    fn recite(&mut self, snapshot: &BoardSnapshot) -> Vec<(usize, Stone)>;

    /// Forget everything before a new match.
    fn reset_match(&mut self) {}
}
