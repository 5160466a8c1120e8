use super::BotContext;
use rand::Rng;
use rand::seq::SliceRandom;
use tells_core::game::challenge::{Challenge, Judgment, Response};
use tells_core::model::stone::Stone;

/// Memories at or below this are treated as no memory when answering.
pub const MIN_ANSWER_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Remembered,
    Guessed,
}

/// Answers challenges and boasts from partial memory.
pub struct ChallengeResponder;

impl ChallengeResponder {
    pub fn respond<R: Rng + ?Sized>(
        ctx: &BotContext<'_>,
        challenge: Challenge,
        rng: &mut R,
    ) -> Response {
        match challenge {
            Challenge::Identify { slot } => Response::Identify(Self::identify(ctx, slot, rng).0),
            Challenge::Boast => Response::Judge(Self::judge_boast(ctx, rng)),
        }
    }

    /// Names the stone on `slot`. Weak or missing memory, an empty slot, or an
    /// out-of-range index all get a uniform draw from the full catalog.
    pub fn identify<R: Rng + ?Sized>(
        ctx: &BotContext<'_>,
        slot: usize,
        rng: &mut R,
    ) -> (Stone, AnswerSource) {
        let belief = ctx.belief(slot);
        if ctx.snapshot.is_occupied(slot) && belief.confidence() > MIN_ANSWER_CONFIDENCE {
            if let Some(stone) = belief.guess() {
                return (stone, AnswerSource::Remembered);
            }
        }
        (random_stone(rng), AnswerSource::Guessed)
    }

    /// Doubts with the profile's fixed probability; memory is not consulted.
    pub fn judge_boast<R: Rng + ?Sized>(ctx: &BotContext<'_>, rng: &mut R) -> Judgment {
        if rng.gen_bool(probability(ctx.personality.boast_doubt_probability)) {
            Judgment::Doubt
        } else {
            Judgment::Believe
        }
    }

    /// Names every hidden slot, slot by slot, as if each were challenged.
    pub fn recite<R: Rng + ?Sized>(ctx: &BotContext<'_>, rng: &mut R) -> Vec<(usize, Stone)> {
        ctx.snapshot
            .face_down_slots()
            .into_iter()
            .map(|slot| (slot, Self::identify(ctx, slot, rng).0))
            .collect()
    }
}

fn random_stone<R: Rng + ?Sized>(rng: &mut R) -> Stone {
    Stone::ALL.choose(rng).copied().unwrap_or(Stone::Corona)
}

fn probability(value: f32) -> f64 {
    if value.is_finite() {
        f64::from(value.clamp(0.0, 1.0))
    } else {
        0.0
    }
}
