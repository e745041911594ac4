//! Escalation: time-gated, probability-gated behaviours
//!
//! | Gate | Odds per tick | Outcome |
//! |------|---------------|---------|
//! | clock > 20 s | 0.05 | swap the document title |
//! | clock > 30 s | 0.02 | extra page glitch pulse |
//! | clock > 60 s | 0.001 | jump scare |

use super::catalog::odds;
use super::chance::Chance;

pub const TITLE_GATE_MS: u64 = 20_000;
pub const PULSE_GATE_MS: u64 = 30_000;
pub const SCARE_GATE_MS: u64 = 60_000;

/// What one escalation tick decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Escalation {
    pub retitle: bool,
    pub page_pulse: bool,
    pub jump_scare: bool,
}

impl Escalation {
    /// Evaluate every gate for the given session time. A gate that is not yet
    /// open does not consume randomness.
    pub fn evaluate(elapsed_ms: u64, chance: &mut dyn Chance) -> Self {
        Self {
            retitle: elapsed_ms > TITLE_GATE_MS && chance.fires(odds::TITLE_SWAP),
            page_pulse: elapsed_ms > PULSE_GATE_MS && chance.fires(odds::PAGE_PULSE),
            jump_scare: elapsed_ms > SCARE_GATE_MS && chance.fires(odds::JUMP_SCARE),
        }
    }

    pub fn any(&self) -> bool {
        self.retitle || self.page_pulse || self.jump_scare
    }
}
