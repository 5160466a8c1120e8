use super::{BotContext, Decision};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use tells_core::game::action::ActionKind;

/// Hidden slots remembered below this are worth a peek.
pub const LOW_CONFIDENCE: f32 = 0.5;

/// Which branch of the policy produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    WinAttempt,
    BlindChallenge,
    Development,
    Information,
    Fallback,
}

impl DecisionReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionReason::WinAttempt => "win_attempt",
            DecisionReason::BlindChallenge => "blind_challenge",
            DecisionReason::Development => "development",
            DecisionReason::Information => "information",
            DecisionReason::Fallback => "fallback",
        }
    }
}

/// Stateless turn policy: the first branch that yields a legal action wins.
pub struct DecisionPlanner;

impl DecisionPlanner {
    pub fn choose<R: Rng + ?Sized>(ctx: &BotContext<'_>, rng: &mut R) -> (Decision, DecisionReason) {
        if let Some(choice) = Self::win_attempt(ctx, rng) {
            return choice;
        }

        if let Some(decision) = Self::develop_board(ctx, rng) {
            return (decision, DecisionReason::Development);
        }

        if let Some(decision) = Self::information_action(ctx, rng) {
            return (decision, DecisionReason::Information);
        }

        (Decision::Pass, DecisionReason::Fallback)
    }

    /// Hidden slots this engine would challenge right now.
    pub fn challenge_candidates(ctx: &BotContext<'_>) -> Vec<usize> {
        let personality = ctx.personality;
        ctx.snapshot
            .face_down_slots()
            .into_iter()
            .filter(|&slot| {
                personality.allow_blind_challenge
                    || ctx.confidence(slot) > personality.challenge_confidence_threshold
            })
            .collect()
    }

    fn win_attempt<R: Rng + ?Sized>(
        ctx: &BotContext<'_>,
        rng: &mut R,
    ) -> Option<(Decision, DecisionReason)> {
        let candidates = Self::challenge_candidates(ctx);
        let slot = *candidates.choose(rng)?;
        let reason = if ctx.confidence(slot) > ctx.personality.challenge_confidence_threshold {
            DecisionReason::WinAttempt
        } else {
            DecisionReason::BlindChallenge
        };
        Some((Decision::Challenge { slot }, reason))
    }

    fn develop_board<R: Rng + ?Sized>(ctx: &BotContext<'_>, rng: &mut R) -> Option<Decision> {
        let snapshot = ctx.snapshot;
        if snapshot.reserve.is_empty() || !snapshot.aligned {
            return None;
        }
        let frontier = snapshot.placement_frontier();
        let slot = *frontier.choose(rng)?;
        let stone = *snapshot.reserve.choose(rng)?;
        Some(Decision::Place { slot, stone })
    }

    /// Legal information moves paired with their profile weight.
    pub fn information_candidates(ctx: &BotContext<'_>) -> Vec<(ActionKind, f32)> {
        let snapshot = ctx.snapshot;
        let weights = ctx.personality.action_weights;
        let hidden = snapshot.face_down_slots();
        let mut candidates = Vec::with_capacity(4);

        if !snapshot.face_up_slots().is_empty() {
            candidates.push((ActionKind::Hide, weights.place));
        }
        if hidden.iter().any(|&slot| ctx.confidence(slot) < LOW_CONFIDENCE) {
            candidates.push((ActionKind::Peek, weights.peek));
        }
        if snapshot.occupied_slots().len() >= 2 {
            candidates.push((ActionKind::Swap, weights.swap));
        }
        if !hidden.is_empty()
            && hidden
                .iter()
                .all(|&slot| ctx.confidence(slot) > ctx.personality.boast_confidence)
        {
            candidates.push((ActionKind::Boast, weights.challenge));
        }

        candidates
    }

    fn information_action<R: Rng + ?Sized>(
        ctx: &BotContext<'_>,
        rng: &mut R,
    ) -> Option<Decision> {
        let candidates = Self::information_candidates(ctx);
        let kind = draw_weighted(&candidates, rng)?;
        Self::target(kind, ctx, rng)
    }

    fn target<R: Rng + ?Sized>(
        kind: ActionKind,
        ctx: &BotContext<'_>,
        rng: &mut R,
    ) -> Option<Decision> {
        let snapshot = ctx.snapshot;
        match kind {
            ActionKind::Hide => {
                let slot = *snapshot.face_up_slots().choose(rng)?;
                Some(Decision::Hide { slot })
            }
            ActionKind::Peek => {
                let unsure: Vec<usize> = snapshot
                    .face_down_slots()
                    .into_iter()
                    .filter(|&slot| ctx.confidence(slot) < LOW_CONFIDENCE)
                    .collect();
                let slot = *unsure.choose(rng)?;
                Some(Decision::Peek { slot })
            }
            ActionKind::Swap => {
                let occupied = snapshot.occupied_slots();
                let mut pair = occupied.choose_multiple(rng, 2).copied();
                let (first, second) = (pair.next()?, pair.next()?);
                Some(Decision::Swap {
                    first: first.min(second),
                    second: first.max(second),
                })
            }
            ActionKind::Boast => Some(Decision::Boast),
            ActionKind::Place | ActionKind::Challenge | ActionKind::Pass => None,
        }
    }
}

/// Weighted draw over legal candidates; all-zero weights fall back to a uniform pick.
fn draw_weighted<R: Rng + ?Sized>(candidates: &[(ActionKind, f32)], rng: &mut R) -> Option<ActionKind> {
    if candidates.is_empty() {
        return None;
    }
    let weights = candidates.iter().map(|&(_, weight)| {
        if weight.is_finite() {
            weight.max(0.0)
        } else {
            0.0
        }
    });
    match WeightedIndex::new(weights) {
        Ok(dist) => Some(candidates[dist.sample(rng)].0),
        Err(_) => candidates.choose(rng).map(|(kind, _)| *kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{BeliefStore, Personality};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tells_core::model::board::{BOARD_SLOTS, BoardSnapshot, CENTER_SLOT, SlotView};
    use tells_core::model::seat::Seat;
    use tells_core::model::stone::Stone;

    fn board(slots: &[(usize, SlotView)], reserve: Vec<Stone>) -> BoardSnapshot {
        let mut views = [SlotView::Empty; BOARD_SLOTS];
        for (idx, view) in slots {
            views[*idx] = *view;
        }
        BoardSnapshot::new(views, reserve, true)
    }

    fn decide(
        snapshot: &BoardSnapshot,
        beliefs: &BeliefStore,
        personality: &Personality,
        seed: u64,
    ) -> (Decision, DecisionReason) {
        let ctx = BotContext::new(Seat::North, snapshot, beliefs, personality);
        DecisionPlanner::choose(&ctx, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn confident_hidden_slot_is_challenged() {
        let snapshot = board(
            &[(3, SlotView::FaceDown), (4, SlotView::FaceUp(Stone::Corona))],
            vec![Stone::Balanza],
        );
        let mut beliefs = BeliefStore::default();
        beliefs.set(3, Stone::Espada, 0.9);
        let (decision, reason) = decide(&snapshot, &beliefs, &Personality::cautious(), 1);
        assert_eq!(decision, Decision::Challenge { slot: 3 });
        assert_eq!(reason, DecisionReason::WinAttempt);
    }

    #[test]
    fn confidence_equal_to_threshold_does_not_challenge() {
        let snapshot = board(&[(3, SlotView::FaceDown)], Vec::new());
        let mut beliefs = BeliefStore::default();
        beliefs.set(3, Stone::Espada, 0.85);
        let personality = Personality::cautious();
        for seed in 0..32 {
            let (decision, _) = decide(&snapshot, &beliefs, &personality, seed);
            assert!(!matches!(decision, Decision::Challenge { .. }), "seed {seed}");
        }
    }

    #[test]
    fn blind_profile_challenges_without_memory() {
        let snapshot = board(&[(1, SlotView::FaceDown), (2, SlotView::FaceDown)], Vec::new());
        let beliefs = BeliefStore::default();
        let (decision, reason) = decide(&snapshot, &beliefs, &Personality::reckless(), 3);
        assert!(matches!(decision, Decision::Challenge { slot } if slot == 1 || slot == 2));
        assert_eq!(reason, DecisionReason::BlindChallenge);
    }

    #[test]
    fn threshold_of_one_is_unreachable() {
        let snapshot = board(&[(0, SlotView::FaceDown)], Vec::new());
        let mut beliefs = BeliefStore::default();
        beliefs.set(0, Stone::Escudo, 1.0);
        let personality = Personality {
            challenge_confidence_threshold: 1.0,
            ..Personality::cautious()
        };
        let (decision, _) = decide(&snapshot, &beliefs, &personality, 0);
        assert!(!matches!(decision, Decision::Challenge { .. }));
    }

    #[test]
    fn empty_board_places_on_center() {
        let snapshot = board(&[], vec![Stone::Martillo]);
        let beliefs = BeliefStore::default();
        let (decision, reason) = decide(&snapshot, &beliefs, &Personality::balanced(), 9);
        assert_eq!(
            decision,
            Decision::Place {
                slot: CENTER_SLOT,
                stone: Stone::Martillo
            }
        );
        assert_eq!(reason, DecisionReason::Development);
    }

    #[test]
    fn placement_stays_on_the_frontier() {
        let snapshot = board(
            &[(3, SlotView::FaceUp(Stone::Corona)), (4, SlotView::FaceUp(Stone::Escudo))],
            vec![Stone::Bandera, Stone::Balanza],
        );
        let beliefs = BeliefStore::default();
        for seed in 0..16 {
            match decide(&snapshot, &beliefs, &Personality::balanced(), seed).0 {
                Decision::Place { slot, stone } => {
                    assert!(slot == 2 || slot == 5);
                    assert!(snapshot.reserve.contains(&stone));
                }
                other => panic!("expected placement, got {other:?}"),
            }
        }
    }

    #[test]
    fn unaligned_board_is_not_developed() {
        let mut snapshot = board(&[], vec![Stone::Martillo]);
        snapshot.aligned = false;
        let beliefs = BeliefStore::default();
        let (decision, _) = decide(&snapshot, &beliefs, &Personality::balanced(), 1);
        assert_eq!(decision, Decision::Pass);
    }

    #[test]
    fn empty_reserve_never_places() {
        let snapshot = board(&[], Vec::new());
        let beliefs = BeliefStore::default();
        let (decision, reason) = decide(&snapshot, &beliefs, &Personality::balanced(), 4);
        assert_eq!(decision, Decision::Pass);
        assert_eq!(reason, DecisionReason::Fallback);
    }

    #[test]
    fn information_actions_follow_weights() {
        let snapshot = board(
            &[(2, SlotView::FaceUp(Stone::Corona)), (3, SlotView::FaceDown)],
            Vec::new(),
        );
        let beliefs = BeliefStore::default();
        let mut personality = Personality::balanced();
        personality.action_weights.place = 0.0;
        personality.action_weights.swap = 0.0;
        personality.action_weights.peek = 1.0;
        for seed in 0..16 {
            let (decision, reason) = decide(&snapshot, &beliefs, &personality, seed);
            assert_eq!(decision, Decision::Peek { slot: 3 });
            assert_eq!(reason, DecisionReason::Information);
        }
    }

    #[test]
    fn heavier_weight_is_drawn_proportionally_more() {
        let snapshot = board(
            &[(2, SlotView::FaceUp(Stone::Corona)), (3, SlotView::FaceUp(Stone::Espada))],
            Vec::new(),
        );
        let beliefs = BeliefStore::default();
        let mut personality = Personality::balanced();
        personality.action_weights.place = 1.0;
        personality.action_weights.swap = 3.0;
        let ctx = BotContext::new(Seat::North, &snapshot, &beliefs, &personality);

        let mut rng = StdRng::seed_from_u64(2024);
        let (mut hides, mut swaps) = (0u32, 0u32);
        for _ in 0..1000 {
            match DecisionPlanner::choose(&ctx, &mut rng).0 {
                Decision::Hide { .. } => hides += 1,
                Decision::Swap { .. } => swaps += 1,
                other => panic!("unexpected {other:?}"),
            }
        }
        let ratio = f64::from(swaps) / f64::from(hides);
        assert!((2.3..4.0).contains(&ratio), "swaps {swaps}, hides {hides}");
    }

    #[test]
    fn zero_weights_still_make_progress() {
        let snapshot = board(
            &[(2, SlotView::FaceUp(Stone::Corona)), (3, SlotView::FaceUp(Stone::Espada))],
            Vec::new(),
        );
        let beliefs = BeliefStore::default();
        let mut personality = Personality::balanced();
        personality.action_weights.place = 0.0;
        personality.action_weights.swap = 0.0;
        personality.action_weights.peek = 0.0;
        personality.action_weights.challenge = 0.0;
        let mut seen_hide = false;
        let mut seen_swap = false;
        for seed in 0..64 {
            match decide(&snapshot, &beliefs, &personality, seed).0 {
                Decision::Hide { slot } => {
                    assert!(slot == 2 || slot == 3);
                    seen_hide = true;
                }
                Decision::Swap { first, second } => {
                    assert_eq!((first, second), (2, 3));
                    seen_swap = true;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(seen_hide && seen_swap);
    }

    #[test]
    fn boasts_when_every_hidden_slot_is_known() {
        let snapshot = board(&[(2, SlotView::FaceDown), (3, SlotView::FaceDown)], Vec::new());
        let mut beliefs = BeliefStore::default();
        beliefs.set(2, Stone::Corona, 0.8);
        beliefs.set(3, Stone::Espada, 0.8);
        let mut personality = Personality::cautious();
        personality.action_weights.swap = 0.0;
        personality.action_weights.challenge = 1.0;
        let (decision, _) = decide(&snapshot, &beliefs, &personality, 5);
        // 0.8 is below the challenge bar and not strictly above the boast bar.
        assert_eq!(personality.boast_confidence, 0.8);
        assert_ne!(decision, Decision::Boast);

        personality.boast_confidence = 0.7;
        let (decision, _) = decide(&snapshot, &beliefs, &personality, 5);
        assert_eq!(decision, Decision::Boast);
    }

    #[test]
    fn identical_inputs_and_seed_give_identical_decisions() {
        let snapshot = board(
            &[
                (1, SlotView::FaceDown),
                (2, SlotView::FaceUp(Stone::Corona)),
                (3, SlotView::FaceDown),
            ],
            vec![Stone::Bandera, Stone::Caballero],
        );
        let mut beliefs = BeliefStore::default();
        beliefs.set(1, Stone::Espada, 0.4);
        for personality in [Personality::balanced(), Personality::reckless(), Personality::shuffler()] {
            for seed in 0..8 {
                assert_eq!(
                    decide(&snapshot, &beliefs, &personality, seed),
                    decide(&snapshot, &beliefs, &personality, seed)
                );
            }
        }
    }
}
