use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded random latency put in front of a paced decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThinkingDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl ThinkingDelay {
    pub const NONE: ThinkingDelay = ThinkingDelay {
        min_ms: 0,
        max_ms: 0,
    };

    pub const fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    pub const fn between(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Self { min_ms, max_ms }
        } else {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    pub const fn is_none(&self) -> bool {
        self.max_ms == 0
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.is_none() {
            return Duration::ZERO;
        }
        let low = self.min_ms.min(self.max_ms);
        let high = self.min_ms.max(self.max_ms);
        Duration::from_millis(rng.gen_range(low..=high))
    }
}
