//! Chat webhook notifier.
//!
//! Posts notifications as JSON to an incoming-webhook URL using the common
//! chat framing: `username`, plain `content`, and optional rich `embeds`.
//! Reports go out as plain content; alerts and errors are wrapped in an
//! embed so they stand out, with the mention hint in `content`.

use serde::Serialize;

use crate::traits::{MessageKind, Notification, Notifier, NotifyError};

/// Chat services reject `content` longer than this.
pub const MAX_CONTENT_CHARS: usize = 2000;
/// Embed descriptions allow more room than content.
pub const MAX_DESCRIPTION_CHARS: usize = 4096;

const ALERT_COLOR: u32 = 0xffa500;
const ERROR_COLOR: u32 = 0xe74c3c;

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl WebhookPayload {
    /// Frame a notification for the webhook.
    pub fn from_notification(notification: &Notification) -> Self {
        match notification.kind {
            MessageKind::Report | MessageKind::Test => Self {
                username: notification.username.clone(),
                content: Some(truncate_chars(&notification.body, MAX_CONTENT_CHARS)),
                embeds: Vec::new(),
            },
            MessageKind::Alert | MessageKind::Error => {
                let (color, footer) = if notification.kind == MessageKind::Alert {
                    (ALERT_COLOR, "Urgent notice from the slot monitor")
                } else {
                    (ERROR_COLOR, "Error report from the slot monitor")
                };
                Self {
                    username: notification.username.clone(),
                    content: notification.mention.clone(),
                    embeds: vec![Embed {
                        title: notification.title.clone().unwrap_or_default(),
                        description: truncate_chars(&notification.body, MAX_DESCRIPTION_CHARS),
                        color,
                        timestamp: notification.timestamp.clone(),
                        footer: EmbedFooter {
                            text: footer.to_string(),
                        },
                    }],
                }
            }
        }
    }
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Delivers notifications as JSON over HTTP POST to a configured endpoint.
#[derive(Debug)]
pub struct WebhookNotifier {
    url: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a new webhook notifier. The URL must be http(s).
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let url = url.into();
        let trimmed = url.trim();
        let scheme = trimmed.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
        if !matches!(scheme.as_deref(), Some("http" | "https")) {
            return Err(NotifyError::Config(
                "webhook url must start with http:// or https://".to_string(),
            ));
        }
        Ok(Self {
            url: trimmed.to_string(),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = WebhookPayload::from_notification(notification);
        let body = serde_json::to_string(&payload)
            .map_err(|e| NotifyError::Serialize(e.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                %status,
                body = %body_text,
                "webhook returned non-2xx status"
            );
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: body_text,
            });
        }

        tracing::debug!(
            kind = ?notification.kind,
            status = %status,
            "webhook notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}
