//! Time-driven erosion of beliefs with a probabilistic forgetting tail.

use super::belief::BeliefStore;
use super::personality::Personality;
use rand::Rng;

/// Below this confidence a belief becomes eligible for sudden forgetting.
pub const FORGET_CUTOFF: f32 = 0.2;

/// Chance per pass that a belief under [`FORGET_CUTOFF`] is dropped.
pub const FORGET_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayReport {
    pub aged: usize,
    pub faded: usize,
    pub forgotten: usize,
}

/// Ages every remembered slot by `1 - retention`.
///
/// A belief that fades to zero is cleared; one that lands under
/// [`FORGET_CUTOFF`] is discarded with probability [`FORGET_PROBABILITY`].
pub fn decay<R: Rng + ?Sized>(
    store: &mut BeliefStore,
    personality: &Personality,
    rng: &mut R,
) -> DecayReport {
    let loss = personality.retention_loss();
    let mut report = DecayReport::default();

    store.for_each_mut(|_, belief| {
        if !belief.is_known() {
            return;
        }
        report.aged += 1;
        belief.set_confidence(belief.confidence() - loss);
        if !belief.is_known() {
            report.faded += 1;
            return;
        }
        if belief.confidence() < FORGET_CUTOFF && rng.gen_bool(FORGET_PROBABILITY) {
            belief.forget();
            report.forgotten += 1;
        }
    });

    report
}
