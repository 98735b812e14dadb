//! Page scanning and run orchestration for the slot monitor.
//!
//! This crate provides:
//! - `PageRenderer` / `PageSession` traits for page access
//! - An HTTP-backed renderer with a small selector engine
//! - Slot classification and period label extraction per page
//! - The `Monitor` that drives one run end to end

pub mod checks;
pub mod classifier;
pub mod extractor;
pub mod http;
pub mod markup;
pub mod orchestrator;
pub mod page;

#[cfg(test)]
mod testing;

pub use classifier::classify;
pub use extractor::extract_period_label;
pub use http::HttpRenderer;
pub use orchestrator::{MessageSettings, Monitor, RunFailure, RunOutcome, RunPhase};
pub use page::{PageRenderer, PageSession, SessionGuard};
