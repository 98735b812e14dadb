//! In-memory page stubs for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use slotwatch_core::{MonitorError, Result};

use crate::page::{PageRenderer, PageSession};

#[derive(Debug, Clone, Default)]
pub(crate) struct StubPage {
    label: Option<String>,
    counts: HashMap<String, usize>,
}

impl StubPage {
    pub(crate) fn new(label: Option<&str>, counts: &[(&str, usize)]) -> Self {
        Self {
            label: label.map(str::to_string),
            counts: counts.iter().map(|(s, c)| (s.to_string(), *c)).collect(),
        }
    }
}

pub(crate) struct StubSession {
    pages: HashMap<String, StubPage>,
    failing: HashSet<String>,
    fail_queries: bool,
    current: Option<StubPage>,
    closes: Arc<AtomicUsize>,
}

impl StubSession {
    /// A session with one page already loaded.
    pub(crate) fn single(label: &str, counts: &[(&str, usize)]) -> Self {
        Self {
            pages: HashMap::new(),
            failing: HashSet::new(),
            fail_queries: false,
            current: Some(StubPage::new(Some(label), counts)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn without_label() -> Self {
        let mut session = Self::single("", &[]);
        session.current = Some(StubPage::new(None, &[]));
        session
    }

    pub(crate) fn failing_queries() -> Self {
        let mut session = Self::single("", &[]);
        session.fail_queries = true;
        session
    }
}

#[async_trait]
impl PageSession for StubSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.current = None;
        if self.failing.contains(url) {
            return Err(MonitorError::page_access(url, "net::ERR_CONNECTION_RESET"));
        }
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| MonitorError::page_access(url, "HTTP 404 Not Found"))?;
        self.current = Some(page);
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        if self.fail_queries {
            return Err(MonitorError::page_access("stub", "page crashed"));
        }
        let page = self
            .current
            .as_ref()
            .ok_or_else(|| MonitorError::page_access("stub", "no page loaded"))?;
        Ok(page.counts.get(selector).copied().unwrap_or(0))
    }

    async fn text(&self, _selector: &str) -> Result<Option<String>> {
        let page = self
            .current
            .as_ref()
            .ok_or_else(|| MonitorError::page_access("stub", "no page loaded"))?;
        Ok(page.label.clone())
    }

    async fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Renderer handing out [`StubSession`]s over a fixed url → page map.
#[derive(Default)]
pub(crate) struct StubRenderer {
    pages: HashMap<String, StubPage>,
    failing: HashSet<String>,
    fail_launch: bool,
    pub(crate) launches: Arc<AtomicUsize>,
    pub(crate) closes: Arc<AtomicUsize>,
}

impl StubRenderer {
    pub(crate) fn page(mut self, url: &str, page: StubPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub(crate) fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub(crate) fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }
}

#[async_trait]
impl PageRenderer for StubRenderer {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(MonitorError::page_access("<launch>", "browser failed to start"));
        }
        Ok(Box::new(StubSession {
            pages: self.pages.clone(),
            failing: self.failing.clone(),
            fail_queries: false,
            current: None,
            closes: self.closes.clone(),
        }))
    }
}
