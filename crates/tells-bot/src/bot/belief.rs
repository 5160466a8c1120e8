//! Per-slot synthetic memory: what the engine thinks sits on each slot and how sure it is.

use tells_core::model::board::BOARD_SLOTS;
use tells_core::model::stone::Stone;

/// Confidence reserved for ground-truth observations.
pub const CERTAIN: f32 = 1.0;

/// Remembered identity of one slot.
///
/// No guess always pairs with zero confidence ("no memory").
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Belief {
    guess: Option<Stone>,
    confidence: f32,
}

impl Belief {
    pub const UNKNOWN: Belief = Belief {
        guess: None,
        confidence: 0.0,
    };

    pub fn new(guess: Stone, confidence: f32) -> Self {
        let confidence = clamp_confidence(confidence);
        if confidence <= 0.0 {
            return Self::UNKNOWN;
        }
        Self {
            guess: Some(guess),
            confidence,
        }
    }

    pub fn guess(&self) -> Option<Stone> {
        self.guess
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn is_known(&self) -> bool {
        self.guess.is_some()
    }

    /// Sets confidence, dropping the guess entirely once nothing is left of it.
    pub fn set_confidence(&mut self, confidence: f32) {
        if self.guess.is_none() {
            return;
        }
        self.confidence = clamp_confidence(confidence);
        if self.confidence <= 0.0 {
            self.forget();
        }
    }

    pub fn forget(&mut self) {
        *self = Self::UNKNOWN;
    }
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, CERTAIN)
}

/// The engine's entire memory of the board, one [`Belief`] per slot.
///
/// Confidence of [`CERTAIN`] must only be written from ground-truth paths
/// (witnessed placement, own peek, public reveal); the store does not check.
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefStore {
    beliefs: Vec<Belief>,
}

impl BeliefStore {
    pub fn new(slots: usize) -> Self {
        Self {
            beliefs: vec![Belief::UNKNOWN; slots],
        }
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    /// Out-of-range slots read as no memory.
    pub fn get(&self, slot: usize) -> Belief {
        self.beliefs.get(slot).copied().unwrap_or(Belief::UNKNOWN)
    }

    pub fn confidence(&self, slot: usize) -> f32 {
        self.get(slot).confidence()
    }

    pub fn set(&mut self, slot: usize, stone: Stone, confidence: f32) {
        if let Some(belief) = self.beliefs.get_mut(slot) {
            *belief = Belief::new(stone, confidence);
        }
    }

    pub fn clear(&mut self, slot: usize) {
        if let Some(belief) = self.beliefs.get_mut(slot) {
            belief.forget();
        }
    }

    pub fn clear_all(&mut self) {
        self.beliefs.fill(Belief::UNKNOWN);
    }

    /// Exchanges the records of two slots. Out-of-range pairs are ignored.
    pub fn swap(&mut self, first: usize, second: usize) {
        if first < self.beliefs.len() && second < self.beliefs.len() {
            self.beliefs.swap(first, second);
        }
    }

    pub fn for_each(&self, mut f: impl FnMut(usize, &Belief)) {
        for (slot, belief) in self.beliefs.iter().enumerate() {
            f(slot, belief);
        }
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(usize, &mut Belief)) {
        for (slot, belief) in self.beliefs.iter_mut().enumerate() {
            f(slot, belief);
        }
    }

    pub fn known_count(&self) -> usize {
        self.beliefs.iter().filter(|belief| belief.is_known()).count()
    }

    /// Mean confidence over the given slots; unknown slots count as zero.
    pub fn mean_confidence(&self, slots: &[usize]) -> f32 {
        if slots.is_empty() {
            return 0.0;
        }
        slots.iter().map(|&slot| self.confidence(slot)).sum::<f32>() / slots.len() as f32
    }
}

impl Default for BeliefStore {
    fn default() -> Self {
        Self::new(BOARD_SLOTS)
    }
}
