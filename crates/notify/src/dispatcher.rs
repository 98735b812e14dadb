//! Routes notifications to the report or alert channel.
//!
//! Either channel may be absent. The dispatcher is the only place that
//! decides between skipping and sending; callers never check presence.

use std::time::Instant;

use slotwatch_core::config::NotifyConfig;

use crate::traits::{DeliveryResult, Notification, Notifier, NotifyError};
use crate::webhook::WebhookNotifier;

/// Which configured destination a notification targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Digest reports and error reports.
    Report,
    /// Urgent alerts.
    Alert,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Report => "report",
            Channel::Alert => "alert",
        }
    }
}

/// Owns the optional report and alert channels for a run.
pub struct Dispatcher {
    report: Option<Box<dyn Notifier>>,
    alert: Option<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(report: Option<Box<dyn Notifier>>, alert: Option<Box<dyn Notifier>>) -> Self {
        Self { report, alert }
    }

    /// Dispatcher with no channels; every send is skipped.
    pub fn empty() -> Self {
        Self::new(None, None)
    }

    /// Build webhook channels from environment config.
    ///
    /// Each channel is built on its own. A channel whose URL is rejected
    /// stays in place and fails every send with the rejection reason.
    pub fn from_config(config: &NotifyConfig) -> Self {
        Self::new(
            webhook_channel(Channel::Report, config.report_webhook.as_deref()),
            webhook_channel(Channel::Alert, config.alert_webhook.as_deref()),
        )
    }

    pub fn is_configured(&self, channel: Channel) -> bool {
        self.channel(channel).is_some()
    }

    fn channel(&self, channel: Channel) -> Option<&dyn Notifier> {
        match channel {
            Channel::Report => self.report.as_deref(),
            Channel::Alert => self.alert.as_deref(),
        }
    }

    /// Send to one channel. Exactly one attempt when configured.
    pub async fn send(&self, channel: Channel, notification: &Notification) -> DeliveryResult {
        deliver(channel.as_str(), self.channel(channel), notification).await
    }
}

fn webhook_channel(channel: Channel, url: Option<&str>) -> Option<Box<dyn Notifier>> {
    let url = url?;
    match WebhookNotifier::new(url) {
        Ok(notifier) => Some(Box::new(notifier)),
        Err(e) => {
            tracing::warn!(
                channel = channel.as_str(),
                error = %e,
                "Invalid webhook url, sends to this channel will fail"
            );
            Some(Box::new(RejectedChannel {
                reason: e.to_string(),
            }))
        }
    }
}

/// Stand-in for a channel whose configuration was rejected.
struct RejectedChannel {
    reason: String,
}

#[async_trait::async_trait]
impl Notifier for RejectedChannel {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Config(self.reason.clone()))
    }

    fn channel_name(&self) -> &str {
        "rejected"
    }
}

/// Deliver through an optional notifier. Absent ⇒ [`DeliveryResult::Skipped`].
pub async fn deliver(
    channel: &str,
    notifier: Option<&dyn Notifier>,
    notification: &Notification,
) -> DeliveryResult {
    let Some(notifier) = notifier else {
        tracing::info!(channel, kind = ?notification.kind, "Channel not configured, skipping notification");
        return DeliveryResult::Skipped;
    };

    let start = Instant::now();
    let result = notifier.send(notification).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            tracing::info!(
                channel,
                transport = notifier.channel_name(),
                kind = ?notification.kind,
                duration_ms,
                "Notification delivered"
            );
            DeliveryResult::Delivered
        }
        Err(e) => {
            tracing::warn!(
                channel,
                transport = notifier.channel_name(),
                kind = ?notification.kind,
                error = %e,
                duration_ms,
                "Notification delivery failed"
            );
            DeliveryResult::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockNotifier {
        send_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
        fn channel_name(&self) -> &str {
            "mock"
        }
    }

    fn mock(count: &Arc<AtomicUsize>, should_fail: bool) -> Box<dyn Notifier> {
        Box::new(MockNotifier {
            send_count: count.clone(),
            should_fail,
        })
    }

    #[tokio::test]
    async fn absent_channel_is_skipped_without_attempt() {
        let alerts = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(None, Some(mock(&alerts, false)));

        let result = dispatcher
            .send(Channel::Report, &Notification::report("bot", "digest"))
            .await;
        assert_eq!(result, DeliveryResult::Skipped);
        assert_eq!(alerts.load(Ordering::SeqCst), 0);
        assert!(!dispatcher.is_configured(Channel::Report));
    }

    #[tokio::test]
    async fn present_channel_gets_exactly_one_attempt() {
        let reports = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(Some(mock(&reports, false)), None);

        let result = dispatcher
            .send(Channel::Report, &Notification::report("bot", "digest"))
            .await;
        assert_eq!(result, DeliveryResult::Delivered);
        assert_eq!(reports.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_reported_not_retried() {
        let alerts = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(None, Some(mock(&alerts, true)));

        let result = dispatcher
            .send(
                Channel::Alert,
                &Notification::alert("bot", "alert", "@everyone", "t"),
            )
            .await;
        assert_eq!(result, DeliveryResult::Failed("Configuration error: mock failure".to_string()));
        assert_eq!(alerts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_dispatcher_skips_everything() {
        let dispatcher = Dispatcher::empty();
        let result = dispatcher
            .send(Channel::Alert, &Notification::test("bot"))
            .await;
        assert_eq!(result, DeliveryResult::Skipped);
    }

    fn notify_config(report: Option<&str>, alert: Option<&str>) -> NotifyConfig {
        NotifyConfig {
            report_webhook: report.map(str::to_string),
            alert_webhook: alert.map(str::to_string),
            report_username: "bot".to_string(),
            alert_username: "alert bot".to_string(),
            alert_mention: "@everyone".to_string(),
        }
    }

    #[test]
    fn from_config_without_urls_has_no_channels() {
        let dispatcher =
            Dispatcher::from_config(&notify_config(None, Some("https://hooks.example.com/alert")));
        assert!(!dispatcher.is_configured(Channel::Report));
        assert!(dispatcher.is_configured(Channel::Alert));
    }

    #[test]
    fn from_config_accepts_uppercase_scheme() {
        let dispatcher = Dispatcher::from_config(&notify_config(
            Some("HTTPS://hooks.example.com/report"),
            Some("https://hooks.example.com/alert"),
        ));
        assert!(dispatcher.is_configured(Channel::Report));
        assert!(dispatcher.is_configured(Channel::Alert));
    }

    #[tokio::test]
    async fn bad_report_url_fails_only_that_channel() {
        let dispatcher = Dispatcher::from_config(&notify_config(
            Some("not a url"),
            Some("https://hooks.example.com/alert"),
        ));
        assert!(dispatcher.is_configured(Channel::Alert));

        let result = dispatcher
            .send(Channel::Report, &Notification::report("bot", "digest"))
            .await;
        match result {
            DeliveryResult::Failed(reason) => assert!(reason.contains("http://")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_report_url_leaves_alert_channel_working() {
        let alerts = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::from_config(&notify_config(Some("ftp://nope"), None));
        dispatcher.alert = Some(mock(&alerts, false));

        let alert = Notification::alert("bot", "alert", "@everyone", "t");
        assert_eq!(dispatcher.send(Channel::Alert, &alert).await, DeliveryResult::Delivered);
        assert_eq!(alerts.load(Ordering::SeqCst), 1);
        assert!(matches!(
            dispatcher
                .send(Channel::Report, &Notification::report("bot", "digest"))
                .await,
            DeliveryResult::Failed(_)
        ));
    }
}
