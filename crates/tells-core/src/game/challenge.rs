use crate::model::stone::Stone;
use serde::{Deserialize, Serialize};

/// A request a seat must answer when it is not the acting party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "challenge", rename_all = "snake_case")]
pub enum Challenge {
    /// Name the stone hidden on `slot`.
    Identify { slot: usize },
    /// The opponent claims to know every hidden stone.
    Boast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    Believe,
    Doubt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Identify(Stone),
    Judge(Judgment),
}

impl Response {
    pub const fn stone(self) -> Option<Stone> {
        match self {
            Response::Identify(stone) => Some(stone),
            Response::Judge(_) => None,
        }
    }

    pub const fn judgment(self) -> Option<Judgment> {
        match self {
            Response::Judge(judgment) => Some(judgment),
            Response::Identify(_) => None,
        }
    }
}
