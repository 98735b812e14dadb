//! Per-state element counting for one loaded page.

use futures::future::try_join_all;

use slotwatch_core::{MonitorError, Result, SlotCounts, StateSet};

use crate::page::PageSession;

/// Count elements for every configured state on the current page.
///
/// All selector queries run concurrently and are joined before the counts
/// are assembled, so callers never see a partially filled [`SlotCounts`].
/// Any query failure fails the whole classification.
pub async fn classify(page: &dyn PageSession, states: &StateSet) -> Result<SlotCounts> {
    let queries = states.iter().map(|spec| async move {
        let count = page.count(&spec.selector).await?;
        tracing::debug!(state = %spec.state, selector = %spec.selector, count, "state counted");
        Ok::<_, MonitorError>(u32::try_from(count).unwrap_or(u32::MAX))
    });
    let counts = try_join_all(queries).await?;
    Ok(SlotCounts::from_set(states, counts))
}
