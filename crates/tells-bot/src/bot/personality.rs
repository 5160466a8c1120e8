use core::fmt;
use core::str::FromStr;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relative pull of each action family in the information-action draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionWeights {
    /// Board-shaping moves; also weights hiding a face-up stone.
    pub place: f32,
    pub swap: f32,
    /// Claims of knowledge; weights the boast candidate.
    pub challenge: f32,
    pub peek: f32,
}

impl Default for ActionWeights {
    fn default() -> Self {
        Self {
            place: 1.0,
            swap: 1.0,
            challenge: 1.0,
            peek: 1.0,
        }
    }
}

/// Play style and memory fidelity of one engine.
///
/// Chosen once per match. Replacing it mid-match goes through
/// `MemoryEngine::reset_personality`, which also wipes memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    /// Share of confidence kept per decay pass (1.0 never fades).
    pub retention: f32,
    /// Share of confidence lost on both slots of a witnessed swap.
    pub swap_confusion_penalty: f32,
    pub action_weights: ActionWeights,
    /// Strict lower bound on confidence before a slot is worth challenging.
    pub challenge_confidence_threshold: f32,
    /// Challenge hidden slots with no memory at all.
    pub allow_blind_challenge: bool,
    /// Chance of doubting an opponent's boast.
    #[serde(default = "default_doubt")]
    pub boast_doubt_probability: f32,
    /// Every hidden slot must clear this before the engine boasts itself.
    #[serde(default = "default_boast_confidence")]
    pub boast_confidence: f32,
}

fn default_doubt() -> f32 {
    0.4
}

fn default_boast_confidence() -> f32 {
    0.65
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityKind {
    Cautious,
    Balanced,
    Reckless,
    Shuffler,
}

impl PersonalityKind {
    pub const ALL: [PersonalityKind; 4] = [
        PersonalityKind::Cautious,
        PersonalityKind::Balanced,
        PersonalityKind::Reckless,
        PersonalityKind::Shuffler,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            PersonalityKind::Cautious => "cautious",
            PersonalityKind::Balanced => "balanced",
            PersonalityKind::Reckless => "reckless",
            PersonalityKind::Shuffler => "shuffler",
        }
    }
}

impl fmt::Display for PersonalityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonalityKind {
    type Err = ProfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cautious" | "careful" => Ok(PersonalityKind::Cautious),
            "balanced" | "default" | "normal" => Ok(PersonalityKind::Balanced),
            "reckless" | "blind" => Ok(PersonalityKind::Reckless),
            "shuffler" | "trickster" => Ok(PersonalityKind::Shuffler),
            other => Err(ProfileError::UnknownPreset(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("unknown personality preset '{0}'")]
    UnknownPreset(String),
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f32 },
    #[error("action weight {field} must be finite and non-negative, got {value}")]
    InvalidWeight { field: &'static str, value: f32 },
}

impl Personality {
    pub fn preset(kind: PersonalityKind) -> Self {
        match kind {
            PersonalityKind::Cautious => Self::cautious(),
            PersonalityKind::Balanced => Self::balanced(),
            PersonalityKind::Reckless => Self::reckless(),
            PersonalityKind::Shuffler => Self::shuffler(),
        }
    }

    pub fn cautious() -> Self {
        Self {
            name: PersonalityKind::Cautious.as_str().to_string(),
            retention: 0.95,
            swap_confusion_penalty: 0.25,
            action_weights: ActionWeights {
                place: 1.0,
                swap: 0.5,
                challenge: 0.5,
                peek: 2.0,
            },
            challenge_confidence_threshold: 0.85,
            allow_blind_challenge: false,
            boast_doubt_probability: 0.3,
            boast_confidence: 0.8,
        }
    }

    pub fn balanced() -> Self {
        Self {
            name: PersonalityKind::Balanced.as_str().to_string(),
            retention: 0.9,
            swap_confusion_penalty: 0.3,
            action_weights: ActionWeights::default(),
            challenge_confidence_threshold: 0.7,
            allow_blind_challenge: false,
            boast_doubt_probability: 0.4,
            boast_confidence: 0.65,
        }
    }

    pub fn reckless() -> Self {
        Self {
            name: PersonalityKind::Reckless.as_str().to_string(),
            retention: 0.8,
            swap_confusion_penalty: 0.4,
            action_weights: ActionWeights {
                place: 1.5,
                swap: 1.0,
                challenge: 2.0,
                peek: 0.25,
            },
            challenge_confidence_threshold: 0.0,
            allow_blind_challenge: true,
            boast_doubt_probability: 0.6,
            boast_confidence: 0.3,
        }
    }

    pub fn shuffler() -> Self {
        Self {
            name: PersonalityKind::Shuffler.as_str().to_string(),
            retention: 0.9,
            swap_confusion_penalty: 0.0,
            action_weights: ActionWeights {
                place: 0.75,
                swap: 3.0,
                challenge: 1.0,
                peek: 0.75,
            },
            challenge_confidence_threshold: 0.75,
            allow_blind_challenge: false,
            boast_doubt_probability: 0.5,
            boast_confidence: 0.7,
        }
    }

    /// Picks one of the presets uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let kind = PersonalityKind::ALL
            .choose(rng)
            .copied()
            .unwrap_or(PersonalityKind::Balanced);
        Self::preset(kind)
    }

    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        read("TELLS_PERSONALITY")
            .and_then(|raw| raw.parse::<PersonalityKind>().ok())
            .map(Self::preset)
            .unwrap_or_default()
    }

    pub fn retention_loss(&self) -> f32 {
        (1.0 - self.retention).clamp(0.0, 1.0)
    }

    pub fn swap_keep_factor(&self) -> f32 {
        (1.0 - self.swap_confusion_penalty).clamp(0.0, 1.0)
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        for (field, value) in [
            ("retention", self.retention),
            ("swap_confusion_penalty", self.swap_confusion_penalty),
            (
                "challenge_confidence_threshold",
                self.challenge_confidence_threshold,
            ),
            ("boast_doubt_probability", self.boast_doubt_probability),
            ("boast_confidence", self.boast_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProfileError::OutOfRange { field, value });
            }
        }

        let weights = self.action_weights;
        for (field, value) in [
            ("place", weights.place),
            ("swap", weights.swap),
            ("challenge", weights.challenge),
            ("peek", weights.peek),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProfileError::InvalidWeight { field, value });
            }
        }

        Ok(())
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self::balanced()
    }
}
