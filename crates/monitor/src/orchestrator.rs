//! One monitor run: scan every target, then report, then alert.
//!
//! ```text
//! Idle → Scanning(0) → … → Scanning(n-1) → Reporting → Alerting → Done
//!              └──────────→ Failed → ErrorReporting → Done
//! ```
//!
//! The page session is acquired once, shared by all targets, and closed
//! before leaving the scanning phase whichever way scanning ends.

use chrono::{DateTime, FixedOffset};

use slotwatch_core::config::NotifyConfig;
use slotwatch_core::report::display_time;
use slotwatch_core::{
    evaluate, format_digest, AlertDecision, Deployment, MonitorError, PeriodStatistics, Result,
    RunStatistics, Target,
};
use slotwatch_notify::{Channel, DeliveryResult, Dispatcher, Notification};

use crate::classifier::classify;
use crate::extractor::extract_period_label;
use crate::page::{PageRenderer, PageSession, SessionGuard};

/// States of the run state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Scanning(usize),
    Reporting,
    Alerting,
    Failed,
    ErrorReporting,
    Done,
}

/// Sender names and mention hint used when framing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSettings {
    pub report_username: String,
    pub alert_username: String,
    pub alert_mention: String,
}

impl From<&NotifyConfig> for MessageSettings {
    fn from(config: &NotifyConfig) -> Self {
        Self {
            report_username: config.report_username.clone(),
            alert_username: config.alert_username.clone(),
            alert_mention: config.alert_mention.clone(),
        }
    }
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            report_username: "Slot Monitor".to_string(),
            alert_username: "🚨 Slot Alert 🚨".to_string(),
            alert_mention: "@everyone".to_string(),
        }
    }
}

/// Captured scan failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    pub kind: String,
    pub message: String,
    /// Target being scanned when the failure happened, if any.
    pub target: Option<String>,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub run: RunStatistics,
    pub phases: Vec<RunPhase>,
    pub digest: Option<String>,
    pub decision: Option<AlertDecision>,
    pub failure: Option<RunFailure>,
    pub report_delivery: Option<DeliveryResult>,
    pub alert_delivery: Option<DeliveryResult>,
    pub error_delivery: Option<DeliveryResult>,
}

impl RunOutcome {
    fn new(run: RunStatistics) -> Self {
        Self {
            run,
            phases: vec![RunPhase::Idle],
            digest: None,
            decision: None,
            failure: None,
            report_delivery: None,
            alert_delivery: None,
            error_delivery: None,
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        tracing::debug!(?phase, "run phase");
        self.phases.push(phase);
    }

    pub fn phase(&self) -> RunPhase {
        self.phases.last().copied().unwrap_or(RunPhase::Idle)
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Drives runs over a fixed deployment.
pub struct Monitor<R> {
    renderer: R,
    deployment: Deployment,
    dispatcher: Dispatcher,
    messages: MessageSettings,
}

impl<R: PageRenderer> Monitor<R> {
    pub fn new(
        renderer: R,
        deployment: Deployment,
        dispatcher: Dispatcher,
        messages: MessageSettings,
    ) -> Self {
        Self {
            renderer,
            deployment,
            dispatcher,
            messages,
        }
    }

    /// Execute one full run. Never fails: every path ends in [`RunPhase::Done`].
    pub async fn run(&self, generated_at: DateTime<FixedOffset>) -> RunOutcome {
        let mut outcome = RunOutcome::new(RunStatistics::new(self.deployment.states.clone()));
        tracing::info!(targets = self.deployment.targets.len(), "monitor run started");

        match self.scan(&mut outcome).await {
            Ok(()) => {
                self.report(&mut outcome, &generated_at).await;
            }
            Err((err, target)) => {
                tracing::error!(
                    kind = err.kind(),
                    error = %err,
                    scanned = outcome.run.len(),
                    "scan aborted"
                );
                outcome.enter(RunPhase::Failed);
                outcome.failure = Some(RunFailure {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                    target,
                });
                self.report_error(&mut outcome, &generated_at).await;
            }
        }

        outcome.enter(RunPhase::Done);
        tracing::info!(
            periods = outcome.run.len(),
            failed = !outcome.succeeded(),
            "monitor run finished"
        );
        outcome
    }

    /// Acquire the session, scan all targets, and always release it.
    async fn scan(
        &self,
        outcome: &mut RunOutcome,
    ) -> std::result::Result<(), (MonitorError, Option<String>)> {
        let session = self.renderer.launch().await.map_err(|e| (e, None))?;
        let mut guard = SessionGuard::new(session);
        let scanned = match guard.session() {
            Ok(session) => self.scan_targets(session, outcome).await,
            Err(e) => Err((e, None)),
        };
        guard.release().await;
        scanned
    }

    async fn scan_targets(
        &self,
        session: &mut dyn PageSession,
        outcome: &mut RunOutcome,
    ) -> std::result::Result<(), (MonitorError, Option<String>)> {
        for (i, target) in self.deployment.targets.iter().enumerate() {
            outcome.enter(RunPhase::Scanning(i));
            let record = self
                .scan_target(session, target)
                .await
                .map_err(|e| (e, Some(target.display_name().to_string())))?;
            tracing::info!(
                target = target.display_name(),
                period = record.label(),
                total = record.counts().total(),
                "target scanned"
            );
            outcome.run.push(record);
        }
        Ok(())
    }

    async fn scan_target(
        &self,
        session: &mut dyn PageSession,
        target: &Target,
    ) -> Result<PeriodStatistics> {
        session.goto(&target.url).await?;
        let label = extract_period_label(&*session, &self.deployment.label_selector).await?;
        let counts = classify(&*session, &self.deployment.states).await?;
        Ok(PeriodStatistics::build(label, counts))
    }

    async fn report(&self, outcome: &mut RunOutcome, generated_at: &DateTime<FixedOffset>) {
        let policy = &self.deployment.policy;
        let totals = outcome.run.totals();

        outcome.enter(RunPhase::Reporting);
        let digest = format_digest(&outcome.run, &totals, policy, generated_at);
        let notification = Notification::report(&self.messages.report_username, digest.clone());
        outcome.report_delivery = Some(self.dispatcher.send(Channel::Report, &notification).await);
        outcome.digest = Some(digest);

        outcome.enter(RunPhase::Alerting);
        let decision = evaluate(&outcome.run, &totals, policy, generated_at);
        match &decision {
            AlertDecision::NoAlert => {
                tracing::info!(policy = %policy.name, "no actionable slots, alert not sent");
            }
            AlertDecision::Alert {
                message,
                actionable_total,
            } => {
                tracing::info!(actionable_total, policy = %policy.name, "actionable slots found");
                let notification = alert_notification(&self.messages, message, generated_at);
                outcome.alert_delivery =
                    Some(self.dispatcher.send(Channel::Alert, &notification).await);
            }
        }
        outcome.decision = Some(decision);
    }

    async fn report_error(&self, outcome: &mut RunOutcome, generated_at: &DateTime<FixedOffset>) {
        outcome.enter(RunPhase::ErrorReporting);
        let Some(failure) = &outcome.failure else {
            return;
        };
        let description = error_description(
            failure,
            &outcome.run,
            self.deployment.targets.len(),
            generated_at,
        );
        let notification = Notification::error(
            &self.messages.report_username,
            &failure.kind,
            &description,
            generated_at.to_rfc3339(),
        );
        outcome.error_delivery = Some(self.dispatcher.send(Channel::Report, &notification).await);
    }
}

/// Frame an alert message for the alert channel.
pub fn alert_notification(
    messages: &MessageSettings,
    message: &str,
    generated_at: &DateTime<FixedOffset>,
) -> Notification {
    Notification::alert(
        &messages.alert_username,
        message,
        &messages.alert_mention,
        generated_at.to_rfc3339(),
    )
}

fn error_description(
    failure: &RunFailure,
    run: &RunStatistics,
    total_targets: usize,
    generated_at: &DateTime<FixedOffset>,
) -> String {
    let mut lines = vec![failure.message.clone()];
    if let Some(target) = &failure.target {
        lines.push(format!("Target: {}", target));
    }
    let scanned: Vec<&str> = run.periods().iter().map(|p| p.label()).collect();
    if scanned.is_empty() {
        lines.push(format!("Scanned 0 of {} targets.", total_targets));
    } else {
        lines.push(format!(
            "Scanned {} of {} targets before the failure: {}",
            scanned.len(),
            total_targets,
            scanned.join(", ")
        ));
    }
    lines.push(format!("🕐 {}", display_time(generated_at)));
    lines.join("\n")
}
