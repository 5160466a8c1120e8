use crate::model::seat::Seat;
use crate::model::stone::Stone;
use serde::{Deserialize, Serialize};

/// Something a seat witnessed since its last decision point.
///
/// Each kind carries only what that kind needs; a `Peeked` identity is present
/// only in the stream delivered to the seat that peeked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Placed {
        slot: usize,
        stone: Stone,
        by: Seat,
    },
    Hidden {
        slot: usize,
        by: Seat,
    },
    Swapped {
        first: usize,
        second: usize,
        by: Seat,
    },
    Peeked {
        slot: usize,
        by: Seat,
        stone: Option<Stone>,
    },
    Revealed {
        slot: usize,
        stone: Stone,
    },
}

impl Observation {
    /// Party that caused the event; public reveals have none.
    pub const fn actor(&self) -> Option<Seat> {
        match self {
            Observation::Placed { by, .. }
            | Observation::Hidden { by, .. }
            | Observation::Swapped { by, .. }
            | Observation::Peeked { by, .. } => Some(*by),
            Observation::Revealed { .. } => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Observation::Placed { .. } => "placed",
            Observation::Hidden { .. } => "hidden",
            Observation::Swapped { .. } => "swapped",
            Observation::Peeked { .. } => "peeked",
            Observation::Revealed { .. } => "revealed",
        }
    }

    /// Copy of this observation as the given seat is allowed to see it.
    pub fn masked_for(self, viewer: Seat) -> Self {
        match self {
            Observation::Peeked { slot, by, .. } if by != viewer => Observation::Peeked {
                slot,
                by,
                stone: None,
            },
            other => other,
        }
    }
}
