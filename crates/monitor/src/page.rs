//! Page access seam.
//!
//! The scanner only needs two queries against a loaded page: how many
//! elements match a selector, and the text at a selector. Anything that can
//! answer those (a static fetcher, a headless browser, a test stub) plugs in
//! behind these traits.

use async_trait::async_trait;

use slotwatch_core::{MonitorError, Result};

/// Acquires the run-scoped page resource.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Start a session. Called once per run.
    async fn launch(&self) -> Result<Box<dyn PageSession>>;
}

/// One page resource, navigated target by target.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Load `url`, replacing the current page. Bounded by the session timeout.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Number of elements on the current page matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Text of the first element matching `selector`, if any.
    async fn text(&self, selector: &str) -> Result<Option<String>>;

    /// Release the resource.
    async fn close(self: Box<Self>);
}

/// Owns a launched session for the length of a run.
///
/// [`release`](Self::release) closes it in place. A guard dropped without
/// being released (panic, cancelled run) hands the close to the runtime.
pub struct SessionGuard {
    session: Option<Box<dyn PageSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn PageSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn session(&mut self) -> Result<&mut dyn PageSession> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(MonitorError::page_access("<session>", "page session already released")),
        }
    }

    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        tracing::warn!("page session dropped without release, closing in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(session.close());
            }
            Err(_) => tracing::warn!("no runtime to close the page session on"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubPage, StubRenderer};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn release_closes_once() {
        let renderer = StubRenderer::default();
        let closes = renderer.closes.clone();
        let mut guard = SessionGuard::new(renderer.launch().await.unwrap());
        assert!(guard.session().is_ok());
        guard.release().await;
        tokio::task::yield_now().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropped_guard_still_closes() {
        let renderer = StubRenderer::default().page("https://a", StubPage::new(Some("x"), &[]));
        let closes = renderer.closes.clone();
        let guard = SessionGuard::new(renderer.launch().await.unwrap());
        drop(guard);
        tokio::task::yield_now().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_scan_closes_session() {
        let renderer = StubRenderer::default();
        let closes = renderer.closes.clone();
        let scan = async {
            let guard = SessionGuard::new(renderer.launch().await.unwrap());
            std::future::pending::<()>().await;
            guard.release().await;
        };
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), scan).await;
        assert!(timed_out.is_err());
        tokio::task::yield_now().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
