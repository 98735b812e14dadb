//! Which slot states count toward an urgent alert.

use serde::{Deserialize, Serialize};

use crate::state::{SlotCounts, SlotState};

/// A named, swappable set of actionable states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionableSlotsPolicy {
    pub name: String,
    pub states: Vec<SlotState>,
}

impl ActionableSlotsPolicy {
    pub fn new(name: impl Into<String>, states: Vec<SlotState>) -> Self {
        let mut deduped: Vec<SlotState> = Vec::with_capacity(states.len());
        for state in states {
            if !deduped.contains(&state) {
                deduped.push(state);
            }
        }
        Self {
            name: name.into(),
            states: deduped,
        }
    }

    /// Only fully open slots trigger an alert.
    pub fn available_only() -> Self {
        Self::new("available-only", vec![SlotState::Available])
    }

    /// Open and nearly-full slots both trigger an alert.
    pub fn available_or_limited() -> Self {
        Self::new(
            "available-or-limited",
            vec![SlotState::Available, SlotState::LimitedAvailability],
        )
    }

    /// Resolve a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "available-only" => Some(Self::available_only()),
            "available-or-limited" => Some(Self::available_or_limited()),
            _ => None,
        }
    }

    pub fn is_actionable(&self, state: SlotState) -> bool {
        self.states.contains(&state)
    }

    /// Sum of the actionable states' counts.
    pub fn actionable_sum(&self, counts: &SlotCounts) -> u64 {
        counts
            .iter()
            .filter(|(state, _)| self.is_actionable(*state))
            .map(|(_, count)| u64::from(count))
            .sum()
    }
}

impl Default for ActionableSlotsPolicy {
    fn default() -> Self {
        Self::available_only()
    }
}
