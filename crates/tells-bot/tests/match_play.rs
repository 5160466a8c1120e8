use tells_bot::{MemoryEngine, Personality};
use tells_core::game::challenge::{Challenge, Judgment};
use tells_core::game::event::Observation;
use tells_core::game::match_state::{ActionOutcome, MatchState};
use tells_core::model::seat::Seat;
use tells_core::model::stone::Stone;

const MAX_TURNS: usize = 400;

/// Drives two engines against the reference host; panics on any illegal action.
fn play(seed: u64, north: Personality, south: Personality) -> MatchState {
    let mut state = MatchState::with_seed(Seat::North, seed);
    let mut engines = [
        MemoryEngine::new(Seat::North, north, seed ^ 0x5eed),
        MemoryEngine::new(Seat::South, south, seed.rotate_left(17)),
    ];
    let mut pending: [Vec<Observation>; 2] = Default::default();
    if let Some(opening) = state.opening() {
        for stream in &mut pending {
            stream.push(opening);
        }
    }

    for _ in 0..MAX_TURNS {
        if state.is_finished() {
            break;
        }
        let mover = state.to_move();
        let defender = mover.opponent();
        let view = state.view();
        let events = std::mem::take(&mut pending[mover.index()]);
        let decision = engines[mover.index()].take_turn(&view, &events);

        let outcome = state
            .apply(mover, &decision)
            .unwrap_or_else(|err| panic!("illegal {decision:?} from {mover}: {err:?}"));
        let broadcast = match outcome {
            ActionOutcome::Applied(broadcast) => broadcast,
            ActionOutcome::AwaitingAnswer { slot } => {
                let events = std::mem::take(&mut pending[defender.index()]);
                let engine = &mut engines[defender.index()];
                engine.observe(&view, &events);
                let answer = engine
                    .respond(&view, Challenge::Identify { slot })
                    .stone()
                    .unwrap_or(Stone::Corona);
                state
                    .resolve_challenge(mover, slot, answer)
                    .expect("challenge resolves")
                    .broadcast
            }
            ActionOutcome::AwaitingJudgment => {
                let events = std::mem::take(&mut pending[defender.index()]);
                let engine = &mut engines[defender.index()];
                engine.observe(&view, &events);
                let judgment = engine
                    .respond(&view, Challenge::Boast)
                    .judgment()
                    .unwrap_or(Judgment::Doubt);
                let recital = engines[mover.index()].recite(&view);
                state
                    .resolve_boast(mover, judgment, &recital)
                    .expect("boast resolves")
                    .broadcast
            }
        };
        for seat in Seat::BOTH {
            pending[seat.index()].extend_from_slice(broadcast.for_seat(seat));
        }
    }

    state
}

#[test]
fn engines_only_emit_legal_actions() {
    let presets = [
        Personality::cautious(),
        Personality::balanced(),
        Personality::reckless(),
        Personality::shuffler(),
    ];
    for seed in 0..12u64 {
        for north in &presets {
            for south in &presets {
                play(seed, north.clone(), south.clone());
            }
        }
    }
}

#[test]
fn reckless_mirror_reaches_a_result() {
    let state = play(3, Personality::reckless(), Personality::reckless());
    assert!(state.is_finished());
    assert!(state.winner().is_some());
}

#[test]
fn matches_replay_identically_under_seed() {
    let a = play(42, Personality::balanced(), Personality::shuffler());
    let b = play(42, Personality::balanced(), Personality::shuffler());
    assert_eq!(a.scores(), b.scores());
    assert_eq!(a.winner(), b.winner());
    assert_eq!(a.turn(), b.turn());
    assert_eq!(a.view(), b.view());
}
