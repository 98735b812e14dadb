//! Page renderer backed by plain HTTP fetches.
//!
//! Fetches the served markup and answers selector queries with the
//! in-crate [`markup`](crate::markup) scanner. Pages that build their
//! calendar client-side need a browser-backed [`PageRenderer`] instead.

use std::time::Duration;

use async_trait::async_trait;

use slotwatch_core::{MonitorError, Result};

use crate::markup::{Document, Selector};
use crate::page::{PageRenderer, PageSession};

const USER_AGENT: &str = concat!("slotwatch/", env!("CARGO_PKG_VERSION"));

/// Launches [`HttpSession`]s sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRenderer {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MonitorError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        tracing::debug!(timeout_secs = self.timeout.as_secs(), "http page session opened");
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            timeout: self.timeout,
            current: None,
        }))
    }
}

struct LoadedPage {
    url: String,
    document: Document,
}

/// One navigable page; holds the most recently loaded document.
pub struct HttpSession {
    client: reqwest::Client,
    timeout: Duration,
    current: Option<LoadedPage>,
}

impl HttpSession {
    fn loaded(&self) -> Result<&LoadedPage> {
        self.current
            .as_ref()
            .ok_or_else(|| MonitorError::page_access("<none>", "no page loaded"))
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MonitorError::page_access(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::page_access(url, format!("HTTP {status}")));
        }
        response
            .text()
            .await
            .map_err(|e| MonitorError::page_access(url, e))
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.current = None;
        let html = tokio::time::timeout(self.timeout, self.fetch(url))
            .await
            .map_err(|_| MonitorError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            })??;
        tracing::debug!(url, bytes = html.len(), "page loaded");
        self.current = Some(LoadedPage {
            url: url.to_string(),
            document: Document::parse(&html),
        });
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let page = self.loaded()?;
        let selector: Selector = selector.parse()?;
        Ok(page.document.count(&selector))
    }

    async fn text(&self, selector: &str) -> Result<Option<String>> {
        let page = self.loaded()?;
        let selector: Selector = selector.parse()?;
        let text = page.document.first_text(&selector);
        if text.is_none() {
            tracing::debug!(url = %page.url, "no element for text selector");
        }
        Ok(text)
    }

    async fn close(self: Box<Self>) {
        tracing::debug!("http page session closed");
    }
}
