//! Urgent alert policy: fire only when an actionable state has a slot.
//!
//! The alert text is a terse variant of the digest. It names only the
//! periods that qualify and, within them, only the non-zero actionable
//! states.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset};

use crate::policy::ActionableSlotsPolicy;
use crate::report::display_time;
use crate::stats::{RunStatistics, RunTotals};

/// Outcome of evaluating a run against the alert policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertDecision {
    NoAlert,
    Alert { message: String, actionable_total: u64 },
}

impl AlertDecision {
    pub fn is_alert(&self) -> bool {
        matches!(self, AlertDecision::Alert { .. })
    }
}

/// Decide whether the run warrants an alert and render it if so.
///
/// `totals` is the run's shared [`RunTotals`]; the alert's total is read
/// from it rather than recomputed.
pub fn evaluate(
    run: &RunStatistics,
    totals: &RunTotals,
    policy: &ActionableSlotsPolicy,
    generated_at: &DateTime<FixedOffset>,
) -> AlertDecision {
    let qualifying: Vec<_> = run
        .periods()
        .iter()
        .filter(|p| policy.actionable_sum(p.counts()) > 0)
        .collect();

    if qualifying.is_empty() {
        return AlertDecision::NoAlert;
    }

    let actionable_total = totals.actionable(policy);
    debug_assert_eq!(
        actionable_total,
        qualifying
            .iter()
            .map(|p| policy.actionable_sum(p.counts()))
            .sum::<u64>()
    );

    let mut message = String::new();
    let _ = writeln!(message, "🚨 **Open slots detected!** 🚨");
    let _ = writeln!(message, "🕐 {}", display_time(generated_at));
    message.push('\n');

    for period in &qualifying {
        let mentions: Vec<String> = run
            .states()
            .iter()
            .filter(|spec| policy.is_actionable(spec.state))
            .filter_map(|spec| {
                let count = period.counts().get(spec.state);
                (count > 0).then(|| format!("{} {} ×{}", spec.glyph, spec.label, count))
            })
            .collect();
        let _ = writeln!(message, "🎯 **{}**: {}", period.label(), mentions.join(", "));
    }

    message.push('\n');
    let _ = writeln!(
        message,
        "💥 **{} actionable slots in total!**",
        actionable_total
    );
    let _ = write!(message, "⚡ **Check the reservation site now!**");

    AlertDecision::Alert {
        message,
        actionable_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::at;
    use crate::state::tests::spec;
    use crate::state::{SlotCounts, SlotState, StateSet};
    use crate::stats::tests::scenario_a;
    use crate::stats::PeriodStatistics;

    fn run_of<const N: usize>(states: &StateSet, rows: &[(&str, [u32; N])]) -> RunStatistics {
        let mut run = RunStatistics::new(states.clone());
        for (label, counts) in rows {
            run.push(PeriodStatistics::build(
                *label,
                SlotCounts::from_set(states, *counts),
            ));
        }
        run
    }

    fn four_states() -> StateSet {
        StateSet::new(vec![
            spec(SlotState::Unavailable, "Unavailable", "⚪️"),
            spec(SlotState::Full, "Full", "❌"),
            spec(SlotState::LimitedAvailability, "Limited", "🔺"),
            spec(SlotState::Available, "Available", "✅"),
        ])
        .unwrap()
    }

    /// Sum of every `×N` mention in the alert body.
    fn mentioned_total(message: &str) -> u64 {
        message
            .split('×')
            .skip(1)
            .map(|rest| {
                rest.chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
                    .parse::<u64>()
                    .unwrap()
            })
            .sum()
    }

    #[test]
    fn scenario_a_alerts_on_first_period_only() {
        let run = scenario_a();
        let decision = evaluate(
            &run,
            &run.totals(),
            &ActionableSlotsPolicy::available_only(),
            &at(),
        );
        let AlertDecision::Alert {
            message,
            actionable_total,
        } = decision
        else {
            panic!("expected an alert");
        };
        assert_eq!(actionable_total, 2);
        assert!(message.contains("🎯 **2025年7月**: ✅ Available ×2"));
        assert!(!message.contains("2025年8月"));
        assert!(!message.contains("Unavailable"));
        assert!(message.contains("💥 **2 actionable slots in total!**"));
        assert_eq!(mentioned_total(&message), actionable_total);
    }

    #[test]
    fn scenario_b_no_alert() {
        let states = crate::state::tests::three_states();
        let run = run_of(&states, &[("2025年7月", [15, 13, 0]), ("2025年8月", [23, 8, 0])]);
        let decision = evaluate(
            &run,
            &run.totals(),
            &ActionableSlotsPolicy::available_only(),
            &at(),
        );
        assert_eq!(decision, AlertDecision::NoAlert);
        assert!(!decision.is_alert());
    }

    #[test]
    fn empty_run_no_alert() {
        let run = RunStatistics::new(four_states());
        let decision = evaluate(
            &run,
            &run.totals(),
            &ActionableSlotsPolicy::available_or_limited(),
            &at(),
        );
        assert_eq!(decision, AlertDecision::NoAlert);
    }

    #[test]
    fn only_non_zero_actionable_states_are_listed() {
        let states = four_states();
        let run = run_of(
            &states,
            &[
                ("May", [1, 2, 3, 0]),
                ("June", [0, 0, 0, 0]),
                ("July", [0, 9, 1, 4]),
            ],
        );
        let policy = ActionableSlotsPolicy::available_or_limited();
        let AlertDecision::Alert {
            message,
            actionable_total,
        } = evaluate(&run, &run.totals(), &policy, &at())
        else {
            panic!("expected an alert");
        };
        assert_eq!(actionable_total, 8);
        assert!(message.contains("🎯 **May**: 🔺 Limited ×3\n"));
        assert!(message.contains("🎯 **July**: 🔺 Limited ×1, ✅ Available ×4\n"));
        assert!(!message.contains("June"));
        assert!(!message.contains("Full"));
        assert_eq!(mentioned_total(&message), 8);
    }

    #[test]
    fn limited_is_ignored_by_available_only() {
        let states = four_states();
        let run = run_of(&states, &[("May", [1, 2, 3, 0])]);
        let decision = evaluate(
            &run,
            &run.totals(),
            &ActionableSlotsPolicy::available_only(),
            &at(),
        );
        assert_eq!(decision, AlertDecision::NoAlert);
    }

    #[test]
    fn alert_is_deterministic() {
        let run = scenario_a();
        let totals = run.totals();
        let policy = ActionableSlotsPolicy::available_only();
        assert_eq!(
            evaluate(&run, &totals, &policy, &at()),
            evaluate(&run, &totals, &policy, &at())
        );
    }

    #[test]
    fn alert_does_not_reuse_digest_layout() {
        let run = scenario_a();
        let totals = run.totals();
        let policy = ActionableSlotsPolicy::available_only();
        let digest = crate::report::format_digest(&run, &totals, &policy, &at());
        let AlertDecision::Alert { message, .. } = evaluate(&run, &totals, &policy, &at()) else {
            panic!("expected an alert");
        };
        assert_ne!(digest, message);
        assert!(!message.contains(crate::report::PRESENT_MARKER));
        assert!(!message.contains(crate::report::ABSENT_MARKER));
    }
}
