use crate::game::action::Action;
use crate::game::challenge::Judgment;
use crate::game::event::Observation;
use crate::model::board::{BOARD_SLOTS, BoardSnapshot, CENTER_SLOT, PlacedStone, SlotView};
use crate::model::seat::Seat;
use crate::model::stone::Stone;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const DEFAULT_TARGET_SCORE: u8 = 3;

/// Authoritative match state for the reference rules.
///
/// The host owns this; seats only ever receive [`BoardSnapshot`] views and
/// per-seat [`Observation`] streams built from it.
#[derive(Debug, Clone)]
pub struct MatchState {
    board: [Option<PlacedStone>; BOARD_SLOTS],
    reserve: Vec<Stone>,
    aligned: bool,
    scores: [u8; 2],
    to_move: Seat,
    target_score: u8,
    winner: Option<Seat>,
    turn: u32,
    opening: Option<Observation>,
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleError {
    MatchOver,
    OutOfTurn { expected: Seat, actual: Seat },
    NotAligned,
    SlotOutOfRange(usize),
    SlotOccupied(usize),
    SlotEmpty(usize),
    NotAdjacent(usize),
    StoneNotInReserve(Stone),
    NotFaceUp(usize),
    NotFaceDown(usize),
    SameSlot(usize),
    NothingHidden,
}

/// Observations produced by one host step, split per receiving seat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Broadcast {
    streams: [Vec<Observation>; 2],
}

impl Broadcast {
    fn public(event: Observation) -> Self {
        Self {
            streams: [vec![event], vec![event]],
        }
    }

    fn push_public(&mut self, event: Observation) {
        for stream in &mut self.streams {
            stream.push(event);
        }
    }

    pub fn for_seat(&self, seat: Seat) -> &[Observation] {
        &self.streams[seat.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied(Broadcast),
    AwaitingAnswer { slot: usize },
    AwaitingJudgment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResult {
    pub slot: usize,
    pub stone: Stone,
    pub correct: bool,
    pub scorer: Seat,
    pub broadcast: Broadcast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoastResult {
    pub judgment: Judgment,
    /// Set when a doubted boast is settled by the recital.
    pub recital_correct: Option<bool>,
    pub broadcast: Broadcast,
}

impl MatchState {
    pub fn new(starting_player: Seat) -> Self {
        let seed: u64 = rand::random();
        Self::with_seed(starting_player, seed)
    }

    /// Deals a fresh line: the full catalog in reserve, then one random stone
    /// aligned face-up on the center slot.
    pub fn with_seed(starting_player: Seat, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut reserve = Stone::ALL.to_vec();
        reserve.shuffle(&mut rng);
        let mut board = [None; BOARD_SLOTS];
        let opening = reserve.pop().map(|stone| {
            board[CENTER_SLOT] = Some(PlacedStone::face_up(stone));
            Observation::Placed {
                slot: CENTER_SLOT,
                stone,
                by: starting_player,
            }
        });
        reserve.sort();

        Self {
            board,
            reserve,
            aligned: true,
            scores: [0; 2],
            to_move: starting_player,
            target_score: DEFAULT_TARGET_SCORE,
            winner: None,
            turn: 0,
            opening,
            seed,
        }
    }

    pub fn with_target_score(mut self, target: u8) -> Self {
        self.target_score = target.max(1);
        self
    }

    pub(crate) fn from_parts(
        board: [Option<PlacedStone>; BOARD_SLOTS],
        reserve: Vec<Stone>,
        aligned: bool,
        scores: [u8; 2],
        to_move: Seat,
        target_score: u8,
        winner: Option<Seat>,
        turn: u32,
        seed: u64,
    ) -> Self {
        Self {
            board,
            reserve,
            aligned,
            scores,
            to_move,
            target_score: target_score.max(1),
            winner,
            turn,
            opening: None,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn scores(&self) -> [u8; 2] {
        self.scores
    }

    pub fn score(&self, seat: Seat) -> u8 {
        self.scores[seat.index()]
    }

    pub fn target_score(&self) -> u8 {
        self.target_score
    }

    pub fn to_move(&self) -> Seat {
        self.to_move
    }

    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn aligned(&self) -> bool {
        self.aligned
    }

    pub fn reserve(&self) -> &[Stone] {
        &self.reserve
    }

    pub fn board(&self) -> &[Option<PlacedStone>; BOARD_SLOTS] {
        &self.board
    }

    pub fn stone_at(&self, slot: usize) -> Option<PlacedStone> {
        self.board.get(slot).copied().flatten()
    }

    /// The aligning placement made during setup, for seats to observe first.
    pub fn opening(&self) -> Option<Observation> {
        self.opening
    }

    pub fn view(&self) -> BoardSnapshot {
        let mut slots = [SlotView::Empty; BOARD_SLOTS];
        for (view, placed) in slots.iter_mut().zip(self.board.iter()) {
            if let Some(placed) = placed {
                *view = placed.view();
            }
        }
        BoardSnapshot::new(slots, self.reserve.clone(), self.aligned)
    }

    pub fn apply(&mut self, seat: Seat, action: &Action) -> Result<ActionOutcome, RuleError> {
        self.check_turn(seat)?;

        let outcome = match *action {
            Action::Place { slot, stone } => {
                if !self.aligned {
                    return Err(RuleError::NotAligned);
                }
                self.check_range(slot)?;
                if self.board[slot].is_some() {
                    return Err(RuleError::SlotOccupied(slot));
                }
                if !self.view().placement_frontier().contains(&slot) {
                    return Err(RuleError::NotAdjacent(slot));
                }
                let position = self
                    .reserve
                    .iter()
                    .position(|candidate| *candidate == stone)
                    .ok_or(RuleError::StoneNotInReserve(stone))?;
                self.reserve.remove(position);
                self.board[slot] = Some(PlacedStone::face_up(stone));
                ActionOutcome::Applied(Broadcast::public(Observation::Placed {
                    slot,
                    stone,
                    by: seat,
                }))
            }
            Action::Hide { slot } => {
                let placed = self.occupied(slot)?;
                if placed.face_down {
                    return Err(RuleError::NotFaceUp(slot));
                }
                self.board[slot] = Some(PlacedStone {
                    face_down: true,
                    ..placed
                });
                ActionOutcome::Applied(Broadcast::public(Observation::Hidden { slot, by: seat }))
            }
            Action::Swap { first, second } => {
                if first == second {
                    return Err(RuleError::SameSlot(first));
                }
                self.occupied(first)?;
                self.occupied(second)?;
                self.board.swap(first, second);
                ActionOutcome::Applied(Broadcast::public(Observation::Swapped {
                    first,
                    second,
                    by: seat,
                }))
            }
            Action::Peek { slot } => {
                let placed = self.face_down(slot)?;
                let seen = Observation::Peeked {
                    slot,
                    by: seat,
                    stone: Some(placed.stone),
                };
                let mut streams: [Vec<Observation>; 2] = Default::default();
                for viewer in Seat::BOTH {
                    streams[viewer.index()].push(seen.masked_for(viewer));
                }
                ActionOutcome::Applied(Broadcast { streams })
            }
            Action::Challenge { slot } => {
                self.face_down(slot)?;
                return Ok(ActionOutcome::AwaitingAnswer { slot });
            }
            Action::Boast => {
                if self.hidden_slots().is_empty() {
                    return Err(RuleError::NothingHidden);
                }
                return Ok(ActionOutcome::AwaitingJudgment);
            }
            Action::Pass => ActionOutcome::Applied(Broadcast::default()),
        };

        self.advance();
        Ok(outcome)
    }

    /// Settles a challenge issued by `challenger` on `slot`, given the defender's answer.
    /// The stone is turned face-up and the identity becomes public.
    pub fn resolve_challenge(
        &mut self,
        challenger: Seat,
        slot: usize,
        answer: Stone,
    ) -> Result<ChallengeResult, RuleError> {
        self.check_turn(challenger)?;
        let placed = self.face_down(slot)?;
        self.board[slot] = Some(PlacedStone::face_up(placed.stone));

        let correct = placed.stone == answer;
        let scorer = if correct {
            challenger.opponent()
        } else {
            challenger
        };
        self.award(scorer);
        self.advance();

        Ok(ChallengeResult {
            slot,
            stone: placed.stone,
            correct,
            scorer,
            broadcast: Broadcast::public(Observation::Revealed {
                slot,
                stone: placed.stone,
            }),
        })
    }

    /// Settles a boast. A believed boast scores for the boaster; a doubted one
    /// ends the match on the strength of the recital.
    pub fn resolve_boast(
        &mut self,
        boaster: Seat,
        judgment: Judgment,
        recital: &[(usize, Stone)],
    ) -> Result<BoastResult, RuleError> {
        self.check_turn(boaster)?;
        let hidden = self.hidden_slots();
        if hidden.is_empty() {
            return Err(RuleError::NothingHidden);
        }

        let mut broadcast = Broadcast::default();
        let recital_correct = match judgment {
            Judgment::Believe => {
                self.award(boaster);
                None
            }
            Judgment::Doubt => {
                let correct = hidden.iter().all(|&slot| {
                    let actual = self.board[slot].map(|placed| placed.stone);
                    recital
                        .iter()
                        .any(|(named_slot, named)| *named_slot == slot && Some(*named) == actual)
                });
                for slot in hidden {
                    if let Some(placed) = self.board[slot] {
                        self.board[slot] = Some(PlacedStone::face_up(placed.stone));
                        broadcast.push_public(Observation::Revealed {
                            slot,
                            stone: placed.stone,
                        });
                    }
                }
                self.winner = Some(if correct { boaster } else { boaster.opponent() });
                Some(correct)
            }
        };
        self.advance();

        Ok(BoastResult {
            judgment,
            recital_correct,
            broadcast,
        })
    }

    fn hidden_slots(&self) -> Vec<usize> {
        (0..BOARD_SLOTS)
            .filter(|&slot| self.board[slot].is_some_and(|placed| placed.face_down))
            .collect()
    }

    fn award(&mut self, seat: Seat) {
        let score = &mut self.scores[seat.index()];
        *score = score.saturating_add(1);
        if *score >= self.target_score && self.winner.is_none() {
            self.winner = Some(seat);
        }
    }

    fn advance(&mut self) {
        self.turn += 1;
        self.to_move = self.to_move.opponent();
    }

    fn check_turn(&self, seat: Seat) -> Result<(), RuleError> {
        if self.is_finished() {
            return Err(RuleError::MatchOver);
        }
        if seat != self.to_move {
            return Err(RuleError::OutOfTurn {
                expected: self.to_move,
                actual: seat,
            });
        }
        Ok(())
    }

    fn check_range(&self, slot: usize) -> Result<(), RuleError> {
        if slot >= BOARD_SLOTS {
            return Err(RuleError::SlotOutOfRange(slot));
        }
        Ok(())
    }

    fn occupied(&self, slot: usize) -> Result<PlacedStone, RuleError> {
        self.check_range(slot)?;
        self.board[slot].ok_or(RuleError::SlotEmpty(slot))
    }

    fn face_down(&self, slot: usize) -> Result<PlacedStone, RuleError> {
        let placed = self.occupied(slot)?;
        if !placed.face_down {
            return Err(RuleError::NotFaceDown(slot));
        }
        Ok(placed)
    }
}
