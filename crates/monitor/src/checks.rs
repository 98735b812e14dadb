//! Channel checks that run without touching any page.

use chrono::{DateTime, FixedOffset};

use slotwatch_core::{
    evaluate, AlertDecision, ActionableSlotsPolicy, PeriodStatistics, Result, RunStatistics,
    SlotCounts, SlotState, StateSet, StateSpec,
};
use slotwatch_notify::{Channel, DeliveryResult, Dispatcher, Notification};

use crate::orchestrator::{alert_notification, MessageSettings};

/// Send the fixed test message to the report channel.
pub async fn test_notify(dispatcher: &Dispatcher, messages: &MessageSettings) -> DeliveryResult {
    let notification = Notification::test(&messages.report_username);
    dispatcher.send(Channel::Report, &notification).await
}

/// Two months of sample data: one open slot month, one fully booked.
pub fn sample_run() -> Result<RunStatistics> {
    let spec = |state, label: &str, glyph: &str| StateSpec {
        state,
        label: label.to_string(),
        glyph: glyph.to_string(),
        selector: format!("i[title='{}']", label),
    };
    let states = StateSet::new(vec![
        spec(SlotState::Unavailable, "予約不可", "⚪️"),
        spec(SlotState::Full, "空きなし", "❌"),
        spec(SlotState::Available, "予約可", "✅"),
    ])?;

    let mut run = RunStatistics::new(states.clone());
    for (label, counts) in [("2025年7月", [15, 13, 2]), ("2025年8月", [23, 8, 0])] {
        run.push(PeriodStatistics::build(label, SlotCounts::from_set(&states, counts)));
    }
    Ok(run)
}

/// Evaluate `policy` over [`sample_run`] and dispatch the resulting alert.
///
/// Returns `None` when the policy finds nothing actionable in the sample.
pub async fn test_alert(
    dispatcher: &Dispatcher,
    messages: &MessageSettings,
    policy: &ActionableSlotsPolicy,
    generated_at: &DateTime<FixedOffset>,
) -> Result<Option<DeliveryResult>> {
    let run = sample_run()?;
    let totals = run.totals();
    match evaluate(&run, &totals, policy, generated_at) {
        AlertDecision::NoAlert => {
            tracing::info!(policy = %policy.name, "sample data has no actionable slots");
            Ok(None)
        }
        AlertDecision::Alert { message, .. } => {
            let notification = alert_notification(messages, &message, generated_at);
            Ok(Some(dispatcher.send(Channel::Alert, &notification).await))
        }
    }
}
