use super::match_state::MatchState;
use crate::model::board::{BOARD_SLOTS, PlacedStone};
use crate::model::seat::Seat;
use crate::model::stone::Stone;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSnapshot {
    pub seed: u64,
    pub turn: u32,
    pub scores: [u8; 2],
    pub to_move: Seat,
    #[serde(default = "default_target_score")]
    pub target_score: u8,
    pub board: Vec<Option<PlacedStone>>,
    pub reserve: Vec<Stone>,
    pub aligned: bool,
    #[serde(default)]
    pub winner: Option<Seat>,
}

fn default_target_score() -> u8 {
    super::match_state::DEFAULT_TARGET_SCORE
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        MatchSnapshot {
            seed: state.seed(),
            turn: state.turn(),
            scores: state.scores(),
            to_move: state.to_move(),
            target_score: state.target_score(),
            board: state.board().to_vec(),
            reserve: state.reserve().to_vec(),
            aligned: state.aligned(),
            winner: state.winner(),
        }
    }

    /// Rebuilds the match. Missing trailing slots read as empty; extra ones are dropped.
    pub fn restore(self) -> MatchState {
        let mut board = [None; BOARD_SLOTS];
        for (slot, placed) in board.iter_mut().zip(self.board) {
            *slot = placed;
        }
        MatchState::from_parts(
            board,
            self.reserve,
            self.aligned,
            self.scores,
            self.to_move,
            self.target_score,
            self.winner,
            self.turn,
            self.seed,
        )
    }

    pub fn to_json(state: &MatchState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
