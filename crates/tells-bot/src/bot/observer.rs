//! Turns witnessed game events into belief-store mutations.

use super::belief::{BeliefStore, CERTAIN};
use super::personality::Personality;
use tells_core::game::event::Observation;
use tells_core::model::board::BoardSnapshot;
use tells_core::model::seat::Seat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationEffect {
    /// Ground truth written at full confidence.
    Learned,
    /// Existing guess re-confirmed at full confidence.
    Reinforced,
    /// Records exchanged and blurred by swap confusion.
    Exchanged,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Slot outside the board or empty on the authoritative snapshot.
    StaleSlot,
    /// Opponent peeks are private; nothing can be learned from them.
    PrivatePeek,
    /// Hiding a slot the engine holds no memory of.
    NothingToReinforce,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveSummary {
    pub applied: usize,
    pub ignored: usize,
}

/// Applies observations for the engine sitting at `seat`, strictly in order.
pub struct ObservationProcessor<'a> {
    seat: Seat,
    personality: &'a Personality,
}

impl<'a> ObservationProcessor<'a> {
    pub fn new(seat: Seat, personality: &'a Personality) -> Self {
        Self { seat, personality }
    }

    pub fn apply_all(
        &self,
        store: &mut BeliefStore,
        snapshot: &BoardSnapshot,
        events: &[Observation],
    ) -> ObserveSummary {
        let mut summary = ObserveSummary::default();
        for event in events {
            match self.apply(store, snapshot, event) {
                ObservationEffect::Ignored(_) => summary.ignored += 1,
                _ => summary.applied += 1,
            }
        }
        summary
    }

    pub fn apply(
        &self,
        store: &mut BeliefStore,
        snapshot: &BoardSnapshot,
        event: &Observation,
    ) -> ObservationEffect {
        match *event {
            Observation::Placed { slot, stone, .. } => {
                if !snapshot.is_occupied(slot) {
                    return ObservationEffect::Ignored(IgnoreReason::StaleSlot);
                }
                store.set(slot, stone, CERTAIN);
                ObservationEffect::Learned
            }
            Observation::Hidden { slot, .. } => {
                if !snapshot.is_occupied(slot) {
                    return ObservationEffect::Ignored(IgnoreReason::StaleSlot);
                }
                match store.get(slot).guess() {
                    Some(stone) => {
                        store.set(slot, stone, CERTAIN);
                        ObservationEffect::Reinforced
                    }
                    None => ObservationEffect::Ignored(IgnoreReason::NothingToReinforce),
                }
            }
            Observation::Swapped { first, second, .. } => {
                if first == second
                    || !snapshot.is_occupied(first)
                    || !snapshot.is_occupied(second)
                {
                    return ObservationEffect::Ignored(IgnoreReason::StaleSlot);
                }
                store.swap(first, second);
                let keep = self.personality.swap_keep_factor();
                for slot in [first, second] {
                    let belief = store.get(slot);
                    if let Some(stone) = belief.guess() {
                        store.set(slot, stone, belief.confidence() * keep);
                    }
                }
                ObservationEffect::Exchanged
            }
            Observation::Peeked { slot, by, stone } => {
                if !snapshot.is_occupied(slot) {
                    return ObservationEffect::Ignored(IgnoreReason::StaleSlot);
                }
                match stone {
                    Some(stone) if by == self.seat => {
                        store.set(slot, stone, CERTAIN);
                        ObservationEffect::Learned
                    }
                    _ => ObservationEffect::Ignored(IgnoreReason::PrivatePeek),
                }
            }
            Observation::Revealed { slot, stone } => {
                if !snapshot.is_occupied(slot) {
                    return ObservationEffect::Ignored(IgnoreReason::StaleSlot);
                }
                store.set(slot, stone, CERTAIN);
                ObservationEffect::Learned
            }
        }
    }
}
