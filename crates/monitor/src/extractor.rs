//! Period label lookup.

use slotwatch_core::{Result, UNKNOWN_PERIOD};

use crate::page::PageSession;

/// Trimmed text at `selector`, or [`UNKNOWN_PERIOD`] when missing or blank.
pub async fn extract_period_label(page: &dyn PageSession, selector: &str) -> Result<String> {
    let text = page.text(selector).await?;
    match text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(label) => Ok(label.to_string()),
        None => {
            tracing::warn!(selector, "period label not found, using placeholder");
            Ok(UNKNOWN_PERIOD.to_string())
        }
    }
}
