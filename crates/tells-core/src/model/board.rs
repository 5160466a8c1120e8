use crate::model::stone::Stone;
use serde::{Deserialize, Serialize};

/// Number of slots on the line in the reference rules.
pub const BOARD_SLOTS: usize = 7;

/// The slot the opening stone is aligned on.
pub const CENTER_SLOT: usize = BOARD_SLOTS / 2;

/// A stone sitting on the authoritative board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedStone {
    pub stone: Stone,
    pub face_down: bool,
}

impl PlacedStone {
    pub const fn face_up(stone: Stone) -> Self {
        Self {
            stone,
            face_down: false,
        }
    }

    pub const fn view(self) -> SlotView {
        if self.face_down {
            SlotView::FaceDown
        } else {
            SlotView::FaceUp(self.stone)
        }
    }
}

/// What a seat can see of one slot. Face-down identities are never part of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotView {
    Empty,
    FaceUp(Stone),
    FaceDown,
}

impl SlotView {
    pub const fn is_occupied(self) -> bool {
        !matches!(self, SlotView::Empty)
    }

    pub const fn is_face_down(self) -> bool {
        matches!(self, SlotView::FaceDown)
    }

    pub const fn is_face_up(self) -> bool {
        matches!(self, SlotView::FaceUp(_))
    }
}

/// Read-only copy of the board handed to a seat at each decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub slots: [SlotView; BOARD_SLOTS],
    pub reserve: Vec<Stone>,
    pub aligned: bool,
}

impl BoardSnapshot {
    pub fn new(slots: [SlotView; BOARD_SLOTS], reserve: Vec<Stone>, aligned: bool) -> Self {
        Self {
            slots,
            reserve,
            aligned,
        }
    }

    /// An empty, unaligned board with the full catalog in reserve.
    pub fn opening() -> Self {
        Self::new([SlotView::Empty; BOARD_SLOTS], Stone::ALL.to_vec(), false)
    }

    pub const fn len(&self) -> usize {
        BOARD_SLOTS
    }

    pub fn slot(&self, index: usize) -> Option<SlotView> {
        self.slots.get(index).copied()
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.slot(index).is_some_and(SlotView::is_occupied)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| !slot.is_occupied())
    }

    pub fn face_down_slots(&self) -> Vec<usize> {
        self.indices_where(SlotView::is_face_down)
    }

    pub fn face_up_slots(&self) -> Vec<usize> {
        self.indices_where(SlotView::is_face_up)
    }

    pub fn occupied_slots(&self) -> Vec<usize> {
        self.indices_where(SlotView::is_occupied)
    }

    /// Empty slots touching an occupied neighbour, or the center slot on an empty board.
    pub fn placement_frontier(&self) -> Vec<usize> {
        if self.is_empty() {
            return vec![CENTER_SLOT];
        }
        (0..BOARD_SLOTS)
            .filter(|&idx| !self.is_occupied(idx))
            .filter(|&idx| {
                let left = idx.checked_sub(1).is_some_and(|n| self.is_occupied(n));
                let right = self.is_occupied(idx + 1);
                left || right
            })
            .collect()
    }

    fn indices_where(&self, pred: impl Fn(SlotView) -> bool) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| pred(**slot))
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self::opening()
    }
}
