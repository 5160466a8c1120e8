use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// The seven stones that can be placed on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Stone {
    Corona = 0,
    Escudo = 1,
    Espada = 2,
    Bandera = 3,
    Caballero = 4,
    Martillo = 5,
    Balanza = 6,
}

impl Stone {
    pub const COUNT: usize = 7;

    pub const ALL: [Stone; Stone::COUNT] = [
        Stone::Corona,
        Stone::Escudo,
        Stone::Espada,
        Stone::Bandera,
        Stone::Caballero,
        Stone::Martillo,
        Stone::Balanza,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Stone::Corona),
            1 => Some(Stone::Escudo),
            2 => Some(Stone::Espada),
            3 => Some(Stone::Bandera),
            4 => Some(Stone::Caballero),
            5 => Some(Stone::Martillo),
            6 => Some(Stone::Balanza),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Stone::Corona => "Corona",
            Stone::Escudo => "Escudo",
            Stone::Espada => "Espada",
            Stone::Bandera => "Bandera",
            Stone::Caballero => "Caballero",
            Stone::Martillo => "Martillo",
            Stone::Balanza => "Balanza",
        }
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStone(pub String);

impl fmt::Display for UnknownStone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stone '{}'", self.0)
    }
}

impl std::error::Error for UnknownStone {}

impl FromStr for Stone {
    type Err = UnknownStone;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Stone::ALL
            .iter()
            .copied()
            .find(|stone| stone.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownStone(trimmed.to_string()))
    }
}
