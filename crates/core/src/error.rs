use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Page access failed for {url}: {message}")]
    PageAccess { url: String, message: String },

    #[error("Page load timed out after {secs}s: {url}")]
    Timeout { url: String, secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    pub fn page_access(url: impl Into<String>, message: impl ToString) -> Self {
        MonitorError::PageAccess {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Stable failure kind name, embedded in error notifications.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::PageAccess { .. } | MonitorError::Timeout { .. } => "PageAccessFailure",
            MonitorError::Io(_) | MonitorError::Yaml(_) | MonitorError::Config(_) => {
                "ConfigurationError"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_counts_as_page_access_failure() {
        let err = MonitorError::Timeout {
            url: "https://example.com".into(),
            secs: 30,
        };
        assert_eq!(err.kind(), "PageAccessFailure");
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn page_access_message() {
        let err = MonitorError::page_access("https://example.com/a", "connection refused");
        assert_eq!(err.kind(), "PageAccessFailure");
        assert_eq!(
            err.to_string(),
            "Page access failed for https://example.com/a: connection refused"
        );
    }
}
