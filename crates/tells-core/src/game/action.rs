use crate::model::stone::Stone;
use core::fmt;
use serde::{Deserialize, Serialize};

/// One move a seat intends to make on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Place { slot: usize, stone: Stone },
    Hide { slot: usize },
    Swap { first: usize, second: usize },
    Peek { slot: usize },
    Challenge { slot: usize },
    Boast,
    Pass,
}

impl Action {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Action::Place { .. } => ActionKind::Place,
            Action::Hide { .. } => ActionKind::Hide,
            Action::Swap { .. } => ActionKind::Swap,
            Action::Peek { .. } => ActionKind::Peek,
            Action::Challenge { .. } => ActionKind::Challenge,
            Action::Boast => ActionKind::Boast,
            Action::Pass => ActionKind::Pass,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place { slot, stone } => write!(f, "place {stone}@{slot}"),
            Action::Hide { slot } => write!(f, "hide {slot}"),
            Action::Swap { first, second } => write!(f, "swap {first}<->{second}"),
            Action::Peek { slot } => write!(f, "peek {slot}"),
            Action::Challenge { slot } => write!(f, "challenge {slot}"),
            Action::Boast => f.write_str("boast"),
            Action::Pass => f.write_str("pass"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Place,
    Hide,
    Swap,
    Peek,
    Challenge,
    Boast,
    Pass,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Place,
        ActionKind::Hide,
        ActionKind::Swap,
        ActionKind::Peek,
        ActionKind::Challenge,
        ActionKind::Boast,
        ActionKind::Pass,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::Place => "place",
            ActionKind::Hide => "hide",
            ActionKind::Swap => "swap",
            ActionKind::Peek => "peek",
            ActionKind::Challenge => "challenge",
            ActionKind::Boast => "boast",
            ActionKind::Pass => "pass",
        }
    }
}
