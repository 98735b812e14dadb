//! Per-period records and run-level aggregation.

use indexmap::IndexMap;
use serde::Serialize;

use crate::policy::ActionableSlotsPolicy;
use crate::state::{SlotCounts, SlotState, StateSet};

/// Label used when a page shows no readable period heading.
pub const UNKNOWN_PERIOD: &str = "unknown";

/// Immutable statistics for one scanned page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodStatistics {
    label: String,
    counts: SlotCounts,
}

impl PeriodStatistics {
    /// Build a record. Blank labels become [`UNKNOWN_PERIOD`].
    pub fn build(label: impl Into<String>, counts: SlotCounts) -> Self {
        let label = label.into();
        let trimmed = label.trim();
        let label = if trimmed.is_empty() {
            UNKNOWN_PERIOD.to_string()
        } else {
            trimmed.to_string()
        };
        Self { label, counts }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn counts(&self) -> &SlotCounts {
        &self.counts
    }
}

/// Ordered per-period records for one run, in target order.
#[derive(Debug, Clone)]
pub struct RunStatistics {
    states: StateSet,
    periods: Vec<PeriodStatistics>,
}

impl RunStatistics {
    pub fn new(states: StateSet) -> Self {
        Self {
            states,
            periods: Vec::new(),
        }
    }

    pub fn push(&mut self, record: PeriodStatistics) {
        debug_assert!(
            record.counts().len() == self.states.len()
                && self.states.states().all(|s| record.counts().iter().any(|(k, _)| k == s)),
            "record keys must match the configured state set"
        );
        self.periods.push(record);
    }

    pub fn states(&self) -> &StateSet {
        &self.states
    }

    pub fn periods(&self) -> &[PeriodStatistics] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Sum every state across all periods. Compute once per run and share.
    pub fn totals(&self) -> RunTotals {
        let mut per_state: IndexMap<SlotState, u64> =
            self.states.states().map(|s| (s, 0)).collect();
        for period in &self.periods {
            for (state, count) in period.counts().iter() {
                *per_state.entry(state).or_insert(0) += u64::from(count);
            }
        }
        let grand_total = per_state.values().sum();
        RunTotals {
            per_state,
            grand_total,
        }
    }
}

/// Run-wide totals shared by the digest and the alert evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    per_state: IndexMap<SlotState, u64>,
    grand_total: u64,
}

impl RunTotals {
    pub fn state(&self, state: SlotState) -> u64 {
        self.per_state.get(&state).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotState, u64)> + '_ {
        self.per_state.iter().map(|(s, c)| (*s, *c))
    }

    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }

    pub fn actionable(&self, policy: &ActionableSlotsPolicy) -> u64 {
        self.iter()
            .filter(|(state, _)| policy.is_actionable(*state))
            .map(|(_, count)| count)
            .sum()
    }
}
