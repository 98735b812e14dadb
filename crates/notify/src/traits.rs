//! Notifier trait definition and shared error types.

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// What a notification carries. Drives how a channel frames it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Report,
    Alert,
    Error,
    Test,
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    pub kind: MessageKind,
    /// Sender display name.
    pub username: String,
    /// Optional headline shown above the body.
    pub title: Option<String>,
    /// The rendered body content.
    pub body: String,
    /// Broadcast mention hint (alerts only).
    pub mention: Option<String>,
    /// ISO 8601 timestamp attached to rich payloads.
    pub timestamp: Option<String>,
}

impl Notification {
    /// Routine digest.
    pub fn report(username: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Report,
            username: username.into(),
            title: None,
            body: body.into(),
            mention: None,
            timestamp: None,
        }
    }

    /// Urgent alert with a broadcast mention.
    pub fn alert(
        username: impl Into<String>,
        body: impl Into<String>,
        mention: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let mention = mention.into();
        Self {
            kind: MessageKind::Alert,
            username: username.into(),
            title: Some("🚨 Open slot alert!".to_string()),
            body: body.into(),
            mention: (!mention.trim().is_empty()).then_some(mention),
            timestamp: Some(timestamp.into()),
        }
    }

    /// Failure report sent in place of the digest.
    pub fn error(
        username: impl Into<String>,
        kind: &str,
        description: &str,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            kind: MessageKind::Error,
            username: username.into(),
            title: Some("❌ Slot monitor run failed".to_string()),
            body: format!("**{}**\n{}", kind, description),
            mention: None,
            timestamp: Some(timestamp.into()),
        }
    }

    /// Connectivity check.
    pub fn test(username: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Test,
            username: username.into(),
            title: None,
            body: "🧪 Test notification from the slot monitor. The channel is reachable.".to_string(),
            mention: None,
            timestamp: None,
        }
    }
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel. One attempt, no retry.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "webhook").
    fn channel_name(&self) -> &str;
}

/// Outcome of a single `send` against an optional channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// No channel configured; nothing was attempted.
    Skipped,
    Delivered,
    Failed(String),
}
