//! Slot arithmetic.
//!
//! Slots are numbered `1..=N`. Odd slots form the left column, even slots the
//! right column. Each consecutive same-column pair of rows belongs to one
//! phase, cycling A, B, C down the panel:
//!
//! ```text
//!  L   R   phase
//!  1   2   A
//!  3   4   B
//!  5   6   C
//!  7   8   A
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SLOT_COUNT: u32 = 30;

/// Largest panel accepted; big switchboards stop well short of this.
pub const MAX_SLOT_COUNT: u32 = 240;

/// Distance between consecutive slots of one column.
pub const COLUMN_STEP: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn of(slot: u32) -> Side {
        if slot % 2 == 1 {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn first_slot(self) -> u32 {
        match self {
            Side::Left => 1,
            Side::Right => 2,
        }
    }

    pub fn prefix(self) -> char {
        match self {
            Side::Left => 'L',
            Side::Right => 'R',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    A,
    B,
    C,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    pub fn of(slot: u32) -> Phase {
        match (slot.saturating_sub(1) / 2) % 3 {
            0 => Phase::A,
            1 => Phase::B,
            _ => Phase::C,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Phase::A => 0,
            Phase::B => 1,
            Phase::C => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
        };
        f.write_str(s)
    }
}

/// True when `slot` is the first row of a phase-A pair (1, 7, 13… on the
/// left; 2, 8, 14… on the right).
pub fn is_phase_a_boundary(slot: u32) -> bool {
    slot >= 1 && Phase::of(slot) == Phase::A
}

/// Slots a span of `count` arms starting at `start` would occupy, or `None`
/// when the span runs past `u32::MAX`.
pub fn span_slots(start: u32, count: usize) -> Option<Vec<u32>> {
    (0..count)
        .map(|i| {
            u32::try_from(i)
                .ok()?
                .checked_mul(COLUMN_STEP)
                .and_then(|offset| start.checked_add(offset))
        })
        .collect()
}

/// Human label for a span, e.g. `L3` or `R2-4-6`.
pub fn span_label(slots: &[u32]) -> String {
    let Some(&first) = slots.first() else {
        return String::new();
    };
    let numbers: Vec<String> = slots.iter().map(u32::to_string).collect();
    format!("{}{}", Side::of(first).prefix(), numbers.join("-"))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelConfigError {
    #[error("Panel slot count must be even, got {0}")]
    OddSlotCount(u32),
    #[error("Panel needs at least 6 slots to hold a three-phase span, got {0}")]
    TooFewSlots(u32),
    #[error("Panel slot count must be at most {MAX_SLOT_COUNT}, got {0}")]
    TooManySlots(u32),
}

/// Panel geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PanelConfig {
    slots: u32,
}

impl PanelConfig {
    pub fn new(slots: u32) -> Result<Self, PanelConfigError> {
        if slots % 2 != 0 {
            return Err(PanelConfigError::OddSlotCount(slots));
        }
        if slots < 6 {
            return Err(PanelConfigError::TooFewSlots(slots));
        }
        if slots > MAX_SLOT_COUNT {
            return Err(PanelConfigError::TooManySlots(slots));
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn contains(&self, slot: u32) -> bool {
        (1..=self.slots).contains(&slot)
    }

    /// Slots of one column, top to bottom.
    pub fn column(&self, side: Side) -> impl Iterator<Item = u32> {
        (side.first_slot()..=self.slots).step_by(COLUMN_STEP as usize)
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOT_COUNT,
        }
    }
}

impl TryFrom<u32> for PanelConfig {
    type Error = PanelConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PanelConfig> for u32 {
    fn from(value: PanelConfig) -> Self {
        value.slots
    }
}
