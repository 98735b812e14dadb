//! Routine digest covering every configured state for every scanned period.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset};

use crate::policy::ActionableSlotsPolicy;
use crate::stats::{RunStatistics, RunTotals};

/// Marker shown before a state line with a non-zero count.
pub const PRESENT_MARKER: &str = "●";
/// Marker shown before a state line with a zero count.
pub const ABSENT_MARKER: &str = "○";

const SUMMARY_RULE: &str = "──────────────";

/// Human-readable timestamp used in digest and alert headers.
pub fn display_time(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y/%m/%d %H:%M:%S").to_string()
}

/// Render the digest for a finished run.
///
/// Pure: the same run, totals, policy and timestamp always yield the same
/// bytes. `totals` must come from `run.totals()` so the digest and the
/// alert report the same figures.
pub fn format_digest(
    run: &RunStatistics,
    totals: &RunTotals,
    policy: &ActionableSlotsPolicy,
    generated_at: &DateTime<FixedOffset>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📊 Slot availability report");
    let _ = writeln!(out, "🕐 {}", display_time(generated_at));
    out.push('\n');

    let last = run.len().saturating_sub(1);
    for (i, period) in run.periods().iter().enumerate() {
        let _ = writeln!(out, "📅 {}", period.label());
        for spec in run.states().iter() {
            let count = period.counts().get(spec.state);
            let marker = if count > 0 { PRESENT_MARKER } else { ABSENT_MARKER };
            let _ = writeln!(out, "{} {} {}: {}", marker, spec.glyph, spec.label, count);
        }
        if i != last {
            out.push('\n');
        }
    }

    let actionable = totals.actionable(policy);
    let _ = writeln!(out, "{}", SUMMARY_RULE);
    let _ = writeln!(
        out,
        "Actionable slots ({}): {}",
        actionable_labels(run, policy),
        actionable
    );
    let _ = writeln!(out, "All slots: {}", totals.grand_total());
    if actionable > 0 {
        let _ = write!(out, "🎉 Open slots found! Check the reservation site.");
    } else {
        let _ = write!(out, "😴 No open slots right now.");
    }
    out
}

/// Labels of the configured actionable states, in configuration order.
fn actionable_labels(run: &RunStatistics, policy: &ActionableSlotsPolicy) -> String {
    let labels: Vec<&str> = run
        .states()
        .iter()
        .filter(|spec| policy.is_actionable(spec.state))
        .map(|spec| spec.label.as_str())
        .collect();
    if labels.is_empty() {
        "none".to_string()
    } else {
        labels.join(", ")
    }
}
