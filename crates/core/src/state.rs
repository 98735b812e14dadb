//! Slot states and the ordered, per-deployment state set.
//!
//! [`SlotState`] is the closed set of categories a calendar cell can be in.
//! A deployment picks the subset it recognizes (usually three or four) and
//! the order they are reported in; that choice lives in [`StateSet`].

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// Reservation availability category of a single calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Unavailable,
    Full,
    LimitedAvailability,
    Available,
}

impl SlotState {
    /// Stable config key (`unavailable`, `limited_availability`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            SlotState::Unavailable => "unavailable",
            SlotState::Full => "full",
            SlotState::LimitedAvailability => "limited_availability",
            SlotState::Available => "available",
        }
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Unavailable => write!(f, "Unavailable"),
            SlotState::Full => write!(f, "Full"),
            SlotState::LimitedAvailability => write!(f, "LimitedAvailability"),
            SlotState::Available => write!(f, "Available"),
        }
    }
}

impl FromStr for SlotState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "unavailable" => Ok(SlotState::Unavailable),
            "full" => Ok(SlotState::Full),
            "limited_availability" | "limitedavailability" | "limited" => {
                Ok(SlotState::LimitedAvailability)
            }
            "available" => Ok(SlotState::Available),
            other => Err(format!("unknown slot state: '{}'", other)),
        }
    }
}

/// How one configured state is detected and displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpec {
    pub state: SlotState,
    /// Human label used in reports (e.g. "予約可").
    pub label: String,
    /// Per-state glyph shown in front of the label.
    #[serde(default = "default_glyph")]
    pub glyph: String,
    /// Selector whose match count is the state's count on a page.
    pub selector: String,
}

fn default_glyph() -> String {
    "•".to_string()
}

/// Ordered, non-empty, duplicate-free set of configured states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSet {
    specs: Vec<StateSpec>,
}

impl StateSet {
    pub fn new(specs: Vec<StateSpec>) -> Result<Self, MonitorError> {
        if specs.is_empty() {
            return Err(MonitorError::Config(
                "at least one slot state must be configured".to_string(),
            ));
        }
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.state == spec.state) {
                return Err(MonitorError::Config(format!(
                    "slot state '{}' configured twice",
                    spec.state.key()
                )));
            }
            if spec.selector.trim().is_empty() {
                return Err(MonitorError::Config(format!(
                    "slot state '{}' has an empty selector",
                    spec.state.key()
                )));
            }
        }
        Ok(Self { specs })
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateSpec> {
        self.specs.iter()
    }

    pub fn states(&self) -> impl Iterator<Item = SlotState> + '_ {
        self.specs.iter().map(|s| s.state)
    }

    pub fn get(&self, state: SlotState) -> Option<&StateSpec> {
        self.specs.iter().find(|s| s.state == state)
    }

    pub fn contains(&self, state: SlotState) -> bool {
        self.get(state).is_some()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Per-state counts for one period, keyed in configuration order.
///
/// Only constructible through [`SlotCounts::from_set`], which fills every
/// configured state, so a missing key is not representable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotCounts {
    counts: IndexMap<SlotState, u32>,
}

impl SlotCounts {
    /// Zip the state set with resolved counts. States without a value get 0.
    pub fn from_set(states: &StateSet, values: impl IntoIterator<Item = u32>) -> Self {
        let mut values = values.into_iter();
        let counts = states
            .states()
            .map(|state| (state, values.next().unwrap_or(0)))
            .collect();
        Self { counts }
    }

    /// Count for `state`; 0 for a state outside the configured set.
    pub fn get(&self, state: SlotState) -> u32 {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotState, u32)> + '_ {
        self.counts.iter().map(|(s, c)| (*s, *c))
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|c| u64::from(*c)).sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
